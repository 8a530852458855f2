//! Firestore REST backend.
//!
//! Documents live under `users/{uid}` (profile), `users/{uid}/notes`,
//! `users/{uid}/diagnostics` and `users/{uid}/recommendations/{YYYY-MM-DD}`.
//! Requests carry the Web API key as a query parameter and, when the session
//! has one, the user's id token as a bearer token.
//!
//! Reads that return several documents go through `:runQuery`, so filtering,
//! ordering and limits happen on the server.

use super::firestore_types::{
    CollectionQuery, DocumentResponse, FilterOp, RunQueryItem, decode_fields, encode_fields,
    timestamp_value,
};
use super::{NoteDraft, RemoteWriter, WriteFuture, build_remote_client};
use crate::core::recovery::ErrorKind;
use crate::error::RemoteWriteError;
use chrono::{DateTime, Utc};
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde_json::{Map, Value, json};

pub const DEFAULT_FIRESTORE_URL: &str = "https://firestore.googleapis.com/v1";
/// `professional.type` of users listed in the help directory.
pub const PROFESSIONAL_TYPE: &str = "profesional";

/// A day's generated recommendation as stored remotely.
#[derive(Debug, Clone, PartialEq)]
pub struct StoredRecommendation {
    pub date: String,
    pub text: String,
    pub meta: Map<String, Value>,
}

pub struct FirestoreClient {
    client: Client,
    base_url: String,
    project_id: String,
    api_key: Option<String>,
    id_token: Option<String>,
}

impl FirestoreClient {
    pub fn new(project_id: impl Into<String>, api_key: Option<&str>, timeout_secs: u64) -> Self {
        Self {
            client: build_remote_client(timeout_secs),
            base_url: DEFAULT_FIRESTORE_URL.to_string(),
            project_id: project_id.into(),
            api_key: api_key.map(String::from),
            id_token: None,
        }
    }

    #[must_use]
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    #[must_use]
    pub fn with_id_token(mut self, id_token: Option<&str>) -> Self {
        self.id_token = id_token.filter(|t| !t.is_empty()).map(String::from);
        self
    }

    fn database_url(&self) -> String {
        format!(
            "{}/projects/{}/databases/(default)/documents",
            self.base_url, self.project_id
        )
    }

    fn documents_url(&self, path: &str) -> String {
        format!("{}/{path}", self.database_url())
    }

    /// `:runQuery` endpoint; an empty `parent` queries top-level collections.
    fn run_query_url(&self, parent: &str) -> String {
        if parent.is_empty() {
            format!("{}:runQuery", self.database_url())
        } else {
            format!("{}:runQuery", self.documents_url(parent))
        }
    }

    fn authorize(&self, request: RequestBuilder) -> RequestBuilder {
        let request = match self.api_key.as_deref() {
            Some(key) => request.query(&[("key", key)]),
            None => request,
        };
        match self.id_token.as_deref() {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }

    async fn dispatch(&self, request: RequestBuilder) -> Result<Response, RemoteWriteError> {
        self.authorize(request)
            .send()
            .await
            .map_err(|e| RemoteWriteError::new(ErrorKind::from_reqwest(&e), e.to_string()))
    }

    async fn decode<T: DeserializeOwned>(response: Response) -> Result<T, RemoteWriteError> {
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(RemoteWriteError::new(
                ErrorKind::from_status(status.as_u16()),
                format!("Firestore API error ({status}): {}", error_message(&body)),
            ));
        }

        response
            .json::<T>()
            .await
            .map_err(|e| RemoteWriteError::new(ErrorKind::MalformedResponse, e.to_string()))
    }

    async fn send<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<T, RemoteWriteError> {
        let response = self.dispatch(request).await?;
        Self::decode(response).await
    }

    /// Like [`send`](Self::send) but a 404 is `None`.
    async fn send_found<T: DeserializeOwned>(
        &self,
        request: RequestBuilder,
    ) -> Result<Option<T>, RemoteWriteError> {
        let response = self.dispatch(request).await?;
        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        Self::decode(response).await.map(Some)
    }

    async fn create_document(
        &self,
        collection: &str,
        fields: Map<String, Value>,
    ) -> Result<String, RemoteWriteError> {
        let url = self.documents_url(collection);
        let body = json!({ "fields": fields });
        let doc: DocumentResponse = self.send(self.client.post(&url).json(&body)).await?;
        Ok(doc.id().to_string())
    }

    /// Writes `fields` into the document at `path`; only the `mask` paths are
    /// touched. `exists` adds a precondition: `Some(true)` only updates,
    /// `Some(false)` only creates. Returns `false` when the precondition
    /// found no document to update.
    async fn patch_document(
        &self,
        path: &str,
        fields: Map<String, Value>,
        mask: &[String],
        exists: Option<bool>,
    ) -> Result<bool, RemoteWriteError> {
        let url = self.documents_url(path);
        let mut query: Vec<(&str, String)> = mask
            .iter()
            .map(|field| ("updateMask.fieldPaths", field.clone()))
            .collect();
        if let Some(exists) = exists {
            query.push(("currentDocument.exists", exists.to_string()));
        }

        let body = json!({ "fields": fields });
        let written: Option<DocumentResponse> = self
            .send_found(self.client.patch(&url).query(&query).json(&body))
            .await?;
        Ok(written.is_some())
    }

    async fn run_query(
        &self,
        parent: &str,
        query: CollectionQuery,
    ) -> Result<Vec<Map<String, Value>>, RemoteWriteError> {
        let url = self.run_query_url(parent);
        let items: Vec<RunQueryItem> = self
            .send(self.client.post(&url).json(&query.into_body()))
            .await?;
        Ok(items
            .into_iter()
            .filter_map(|item| item.document)
            .map(DocumentResponse::into_record)
            .collect())
    }

    // ── Notes ───────────────────────────────────────────────────────────

    pub async fn add_note(&self, owner_id: &str, note: &NoteDraft) -> Result<String, RemoteWriteError> {
        let note = note.normalized();
        let now = Utc::now();
        let mut fields = note_fields(&note);
        fields.insert("createdAt".into(), timestamp_value(now));
        fields.insert("updatedAt".into(), timestamp_value(now));

        let id = self
            .create_document(&format!("users/{owner_id}/notes"), fields)
            .await?;
        tracing::debug!(owner_id, note_id = %id, "note stored");
        Ok(id)
    }

    /// Most recently edited notes first.
    pub async fn list_notes(
        &self,
        owner_id: &str,
        limit: usize,
    ) -> Result<Vec<Map<String, Value>>, RemoteWriteError> {
        let query = CollectionQuery::new("notes")
            .newest_first_by("updatedAt")
            .limit(limit);
        self.run_query(&format!("users/{owner_id}"), query).await
    }

    pub async fn get_note(
        &self,
        owner_id: &str,
        note_id: &str,
    ) -> Result<Option<Map<String, Value>>, RemoteWriteError> {
        let url = self.documents_url(&format!("users/{owner_id}/notes/{note_id}"));
        let doc: Option<DocumentResponse> = self.send_found(self.client.get(&url)).await?;
        Ok(doc.map(DocumentResponse::into_record))
    }

    /// Replaces title and content of an existing note. Returns `false` when
    /// there is no such note; nothing is created then.
    pub async fn update_note(
        &self,
        owner_id: &str,
        note_id: &str,
        note: &NoteDraft,
    ) -> Result<bool, RemoteWriteError> {
        let mut fields = note_fields(&note.normalized());
        fields.insert("updatedAt".into(), timestamp_value(Utc::now()));
        let mask: Vec<String> = fields.keys().cloned().collect();

        self.patch_document(
            &format!("users/{owner_id}/notes/{note_id}"),
            fields,
            &mask,
            Some(true),
        )
        .await
    }

    pub async fn delete_note(&self, owner_id: &str, note_id: &str) -> Result<(), RemoteWriteError> {
        let url = self.documents_url(&format!("users/{owner_id}/notes/{note_id}"));
        let _: Value = self.send(self.client.delete(&url)).await?;
        tracing::debug!(owner_id, note_id, "note deleted");
        Ok(())
    }

    // ── Diagnostics ─────────────────────────────────────────────────────

    pub async fn add_diagnostic(
        &self,
        owner_id: &str,
        payload: &Map<String, Value>,
    ) -> Result<String, RemoteWriteError> {
        let mut fields = encode_fields(payload);
        fields.insert("createdAt".into(), timestamp_value(Utc::now()));

        let id = self
            .create_document(&format!("users/{owner_id}/diagnostics"), fields)
            .await?;
        tracing::debug!(owner_id, diagnostic_id = %id, "diagnostic stored");
        Ok(id)
    }

    pub async fn patch_diagnostic(
        &self,
        owner_id: &str,
        diagnostic_id: &str,
        fields: &Map<String, Value>,
    ) -> Result<(), RemoteWriteError> {
        let mask: Vec<String> = fields.keys().cloned().collect();
        self.patch_document(
            &format!("users/{owner_id}/diagnostics/{diagnostic_id}"),
            encode_fields(fields),
            &mask,
            None,
        )
        .await?;
        Ok(())
    }

    /// Newest check-ins first.
    pub async fn list_diagnostics(
        &self,
        owner_id: &str,
        limit: usize,
    ) -> Result<Vec<Map<String, Value>>, RemoteWriteError> {
        let query = CollectionQuery::new("diagnostics")
            .newest_first_by("createdAt")
            .limit(limit);
        self.run_query(&format!("users/{owner_id}"), query).await
    }

    /// Documents of `users/{uid}/{collection}` whose `field` timestamp lies in
    /// `[start, end)`, newest first, at most `limit` of them.
    pub async fn documents_between(
        &self,
        owner_id: &str,
        collection: &str,
        field: &str,
        (start, end): (DateTime<Utc>, DateTime<Utc>),
        limit: usize,
    ) -> Result<Vec<Map<String, Value>>, RemoteWriteError> {
        let query = CollectionQuery::new(collection)
            .filter(field, FilterOp::AtLeast, timestamp_value(start))
            .filter(field, FilterOp::Below, timestamp_value(end))
            .newest_first_by(field)
            .limit(limit);
        let found = self.run_query(&format!("users/{owner_id}"), query).await?;
        tracing::debug!(owner_id, collection, count = found.len(), "queried documents");
        Ok(found)
    }

    // ── Recommendations ─────────────────────────────────────────────────

    /// Stores (or replaces) the recommendation for `date_key` (`YYYY-MM-DD`).
    /// `createdAt` is written only when the document is first created.
    pub async fn upsert_recommendation(
        &self,
        owner_id: &str,
        date_key: &str,
        text: &str,
        meta: &Map<String, Value>,
    ) -> Result<(), RemoteWriteError> {
        let path = format!("users/{owner_id}/recommendations/{date_key}");
        let now = Utc::now();
        let mut fields = Map::new();
        fields.insert("date".into(), json!({ "stringValue": date_key }));
        fields.insert("text".into(), json!({ "stringValue": text.trim() }));
        fields.insert(
            "meta".into(),
            json!({ "mapValue": { "fields": encode_fields(meta) } }),
        );
        fields.insert("updatedAt".into(), timestamp_value(now));
        let mask: Vec<String> = fields.keys().cloned().collect();

        if self
            .patch_document(&path, fields.clone(), &mask, Some(true))
            .await?
        {
            return Ok(());
        }

        fields.insert("createdAt".into(), timestamp_value(now));
        let mask: Vec<String> = fields.keys().cloned().collect();
        self.patch_document(&path, fields, &mask, Some(false))
            .await?;
        Ok(())
    }

    pub async fn recommendation_for_date(
        &self,
        owner_id: &str,
        date_key: &str,
    ) -> Result<Option<StoredRecommendation>, RemoteWriteError> {
        let url = self.documents_url(&format!("users/{owner_id}/recommendations/{date_key}"));
        let Some(doc) = self
            .send_found::<DocumentResponse>(self.client.get(&url))
            .await?
        else {
            return Ok(None);
        };

        let fields = decode_fields(&doc.fields);
        let text_of = |name: &str| {
            fields
                .get(name)
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_string()
        };

        Ok(Some(StoredRecommendation {
            date: text_of("date"),
            text: text_of("text"),
            meta: fields
                .get("meta")
                .and_then(Value::as_object)
                .cloned()
                .unwrap_or_default(),
        }))
    }

    // ── Profiles ────────────────────────────────────────────────────────

    /// The `users/{uid}` document, if there is one.
    pub async fn user_profile(
        &self,
        owner_id: &str,
    ) -> Result<Option<Map<String, Value>>, RemoteWriteError> {
        let url = self.documents_url(&format!("users/{owner_id}"));
        let doc: Option<DocumentResponse> = self.send_found(self.client.get(&url)).await?;
        Ok(doc.map(DocumentResponse::into_record))
    }

    /// Merges `fields` into the user's `professional` map and marks them as
    /// listed in the directory. Other profile fields are left alone.
    pub async fn update_professional_profile(
        &self,
        owner_id: &str,
        fields: &Map<String, Value>,
    ) -> Result<(), RemoteWriteError> {
        let mut professional = fields.clone();
        professional.insert("type".into(), json!(PROFESSIONAL_TYPE));
        let mask: Vec<String> = professional
            .keys()
            .map(|key| format!("professional.{key}"))
            .collect();

        let mut body = Map::new();
        body.insert(
            "professional".into(),
            json!({ "mapValue": { "fields": encode_fields(&professional) } }),
        );
        self.patch_document(&format!("users/{owner_id}"), body, &mask, None)
            .await?;
        tracing::debug!(owner_id, fields = mask.len(), "professional profile updated");
        Ok(())
    }

    /// Every user whose profile is listed in the help directory.
    pub async fn list_professionals(&self) -> Result<Vec<Map<String, Value>>, RemoteWriteError> {
        let query = CollectionQuery::new("users").filter(
            "professional.type",
            FilterOp::Equal,
            json!({ "stringValue": PROFESSIONAL_TYPE }),
        );
        self.run_query("", query).await
    }
}

fn note_fields(note: &NoteDraft) -> Map<String, Value> {
    let mut fields = Map::new();
    fields.insert("title".into(), json!({ "stringValue": note.title }));
    fields.insert("content".into(), json!({ "stringValue": note.content }));
    fields
}

impl RemoteWriter for FirestoreClient {
    fn name(&self) -> &str {
        "firestore"
    }

    fn create_note<'a>(&'a self, owner_id: &'a str, note: &'a NoteDraft) -> WriteFuture<'a, String> {
        Box::pin(self.add_note(owner_id, note))
    }

    fn create_diagnostic<'a>(
        &'a self,
        owner_id: &'a str,
        payload: &'a Map<String, Value>,
    ) -> WriteFuture<'a, String> {
        Box::pin(self.add_diagnostic(owner_id, payload))
    }

    fn update_diagnostic<'a>(
        &'a self,
        owner_id: &'a str,
        diagnostic_id: &'a str,
        fields: &'a Map<String, Value>,
    ) -> WriteFuture<'a, ()> {
        Box::pin(self.patch_diagnostic(owner_id, diagnostic_id, fields))
    }
}

/// Pulls `error.message` out of a Google API error body, falling back to the
/// raw text.
fn error_message(body: &str) -> String {
    serde_json::from_str::<Value>(body)
        .ok()
        .and_then(|v| v.pointer("/error/message").and_then(Value::as_str).map(String::from))
        .unwrap_or_else(|| body.chars().take(200).collect())
}
