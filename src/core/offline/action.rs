use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{Map, Value};

/// What a queued write does once it is replayed.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ActionKind {
    Note,
    Diagnostic,
    /// Written by a newer or older build; kept verbatim so it is not lost.
    Unknown(String),
}

impl ActionKind {
    pub fn as_str(&self) -> &str {
        match self {
            Self::Note => "note",
            Self::Diagnostic => "diagnostic",
            Self::Unknown(raw) => raw,
        }
    }

    pub fn parse(raw: &str) -> Self {
        match raw {
            "note" => Self::Note,
            "diagnostic" => Self::Diagnostic,
            other => Self::Unknown(other.to_string()),
        }
    }
}

impl std::fmt::Display for ActionKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for ActionKind {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for ActionKind {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Ok(Self::parse(&raw))
    }
}

/// A remote write that could not be committed when it was made.
///
/// Stored as `{"type": ..., "uid": ..., "payload": {...}}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueuedAction {
    #[serde(rename = "type")]
    pub kind: ActionKind,
    #[serde(rename = "uid", default)]
    pub owner_id: String,
    #[serde(default)]
    pub payload: Map<String, Value>,
}

impl QueuedAction {
    pub fn new(kind: ActionKind, owner_id: impl Into<String>, payload: Map<String, Value>) -> Self {
        Self {
            kind,
            owner_id: owner_id.into(),
            payload,
        }
    }

    pub fn note(owner_id: impl Into<String>, title: &str, content: &str) -> Self {
        let mut payload = Map::new();
        payload.insert("title".into(), Value::String(title.to_string()));
        payload.insert("content".into(), Value::String(content.to_string()));
        Self::new(ActionKind::Note, owner_id, payload)
    }

    pub fn diagnostic(owner_id: impl Into<String>, payload: Map<String, Value>) -> Self {
        Self::new(ActionKind::Diagnostic, owner_id, payload)
    }

    pub(crate) fn payload_str(&self, field: &str) -> &str {
        self.payload
            .get(field)
            .and_then(Value::as_str)
            .unwrap_or_default()
    }
}
