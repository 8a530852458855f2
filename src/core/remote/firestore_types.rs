//! Firestore REST typed-value encoding.
//!
//! Firestore documents carry `{"fields": {"name": {"stringValue": "..."}}}`
//! rather than plain JSON; these helpers convert in both directions.

use serde::Deserialize;
use serde_json::{Map, Value, json};

pub(super) fn encode_fields(fields: &Map<String, Value>) -> Map<String, Value> {
    fields
        .iter()
        .map(|(key, value)| (key.clone(), encode_value(value)))
        .collect()
}

pub(super) fn encode_value(value: &Value) -> Value {
    match value {
        Value::Null => json!({ "nullValue": null }),
        Value::Bool(b) => json!({ "booleanValue": b }),
        Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                // Firestore wants int64 as a decimal string
                json!({ "integerValue": i.to_string() })
            } else {
                json!({ "doubleValue": n.as_f64().unwrap_or_default() })
            }
        }
        Value::String(s) => json!({ "stringValue": s }),
        Value::Array(items) => {
            json!({ "arrayValue": { "values": items.iter().map(encode_value).collect::<Vec<_>>() } })
        }
        Value::Object(map) => json!({ "mapValue": { "fields": encode_fields(map) } }),
    }
}

pub(super) fn timestamp_value(at: chrono::DateTime<chrono::Utc>) -> Value {
    json!({ "timestampValue": at.to_rfc3339_opts(chrono::SecondsFormat::Millis, true) })
}

pub(super) fn decode_fields(fields: &Map<String, Value>) -> Map<String, Value> {
    fields
        .iter()
        .map(|(key, value)| (key.clone(), decode_value(value)))
        .collect()
}

pub(super) fn decode_value(value: &Value) -> Value {
    let Some((kind, inner)) = value.as_object().and_then(|obj| obj.iter().next()) else {
        return Value::Null;
    };

    match (kind.as_str(), inner) {
        ("stringValue" | "timestampValue" | "referenceValue", Value::String(s)) => {
            Value::String(s.clone())
        }
        ("integerValue", Value::String(s)) => s
            .parse::<i64>()
            .map_or_else(|_| Value::String(s.clone()), Value::from),
        ("integerValue" | "doubleValue" | "booleanValue", other) => other.clone(),
        ("arrayValue", inner) => Value::Array(
            inner
                .get("values")
                .and_then(Value::as_array)
                .map(|values| values.iter().map(decode_value).collect())
                .unwrap_or_default(),
        ),
        ("mapValue", inner) => Value::Object(
            inner
                .get("fields")
                .and_then(Value::as_object)
                .map(decode_fields)
                .unwrap_or_default(),
        ),
        _ => Value::Null,
    }
}

#[derive(Debug, Deserialize)]
pub(super) struct DocumentResponse {
    pub(super) name: String,
    #[serde(default)]
    pub(super) fields: Map<String, Value>,
}

/// One element of a `:runQuery` answer. Elements that only report progress
/// carry no document.
#[derive(Debug, Default, Deserialize)]
pub(super) struct RunQueryItem {
    #[serde(default)]
    pub(super) document: Option<DocumentResponse>,
}

impl DocumentResponse {
    /// Last path segment of `projects/.../documents/users/{uid}/notes/{id}`.
    pub(super) fn id(&self) -> &str {
        self.name.rsplit('/').next().unwrap_or(&self.name)
    }

    /// Plain JSON fields plus the document id under `"id"`.
    pub(super) fn into_record(self) -> Map<String, Value> {
        let mut record = decode_fields(&self.fields);
        record.insert("id".into(), Value::String(self.id().to_string()));
        record
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(super) enum FilterOp {
    Equal,
    AtLeast,
    Below,
}

impl FilterOp {
    fn as_str(self) -> &'static str {
        match self {
            Self::Equal => "EQUAL",
            Self::AtLeast => "GREATER_THAN_OR_EQUAL",
            Self::Below => "LESS_THAN",
        }
    }
}

/// `structuredQuery` over a single collection: AND-ed field filters, one
/// descending order and a limit.
#[derive(Debug, Clone)]
pub(super) struct CollectionQuery {
    collection: String,
    filters: Vec<Value>,
    newest_first_by: Option<String>,
    limit: Option<usize>,
}

impl CollectionQuery {
    pub(super) fn new(collection: impl Into<String>) -> Self {
        Self {
            collection: collection.into(),
            filters: Vec::new(),
            newest_first_by: None,
            limit: None,
        }
    }

    pub(super) fn filter(mut self, field: &str, op: FilterOp, value: Value) -> Self {
        self.filters.push(json!({
            "fieldFilter": {
                "field": { "fieldPath": field },
                "op": op.as_str(),
                "value": value,
            }
        }));
        self
    }

    pub(super) fn newest_first_by(mut self, field: &str) -> Self {
        self.newest_first_by = Some(field.to_string());
        self
    }

    pub(super) fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    pub(super) fn into_body(self) -> Value {
        let mut query = Map::new();
        query.insert(
            "from".into(),
            json!([{ "collectionId": self.collection }]),
        );

        let mut filters = self.filters;
        match filters.len() {
            0 => {}
            1 => {
                query.insert("where".into(), filters.remove(0));
            }
            _ => {
                query.insert(
                    "where".into(),
                    json!({ "compositeFilter": { "op": "AND", "filters": filters } }),
                );
            }
        }

        if let Some(field) = self.newest_first_by {
            query.insert(
                "orderBy".into(),
                json!([{ "field": { "fieldPath": field }, "direction": "DESCENDING" }]),
            );
        }
        if let Some(limit) = self.limit {
            query.insert("limit".into(), json!(limit));
        }

        json!({ "structuredQuery": query })
    }
}
