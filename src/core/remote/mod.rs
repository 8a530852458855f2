//! Remote document store seam.
//!
//! [`RemoteWriter`] is everything the check-in flows and the offline replay
//! need from the backend. [`FirestoreClient`] is the production
//! implementation over the Firestore REST API.

pub mod firestore;
mod firestore_types;
pub mod http_client;

pub use firestore::FirestoreClient;
pub use http_client::build_remote_client;

use crate::error::RemoteWriteError;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::future::Future;
use std::pin::Pin;

pub const NOTE_TITLE_MAX_CHARS: usize = 80;
pub const NOTE_CONTENT_MAX_CHARS: usize = 4000;
pub const UNTITLED_NOTE: &str = "Sin título";

pub type WriteFuture<'a, T> =
    Pin<Box<dyn Future<Output = Result<T, RemoteWriteError>> + Send + 'a>>;

pub trait RemoteWriter: Send + Sync {
    /// Backend identifier used in logs.
    fn name(&self) -> &str;

    /// Stores a journal note and returns its document id.
    fn create_note<'a>(&'a self, owner_id: &'a str, note: &'a NoteDraft)
    -> WriteFuture<'a, String>;

    /// Stores a scored check-in and returns its document id.
    fn create_diagnostic<'a>(
        &'a self,
        owner_id: &'a str,
        payload: &'a Map<String, Value>,
    ) -> WriteFuture<'a, String>;

    /// Merges `fields` into an existing diagnostic.
    fn update_diagnostic<'a>(
        &'a self,
        owner_id: &'a str,
        diagnostic_id: &'a str,
        fields: &'a Map<String, Value>,
    ) -> WriteFuture<'a, ()>;
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct NoteDraft {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub content: String,
}

impl NoteDraft {
    pub fn new(title: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            content: content.into(),
        }
    }

    pub fn is_blank(&self) -> bool {
        self.title.trim().is_empty() && self.content.trim().is_empty()
    }

    /// Trimmed and length-capped copy, as it is stored remotely.
    pub fn normalized(&self) -> Self {
        let title = truncate_chars(self.title.trim(), NOTE_TITLE_MAX_CHARS);
        Self {
            title: if title.is_empty() {
                UNTITLED_NOTE.to_string()
            } else {
                title
            },
            content: truncate_chars(self.content.trim(), NOTE_CONTENT_MAX_CHARS),
        }
    }
}

/// Parses decoded documents into `T`, skipping the ones that do not fit.
pub fn parse_records<T: DeserializeOwned>(records: Vec<Map<String, Value>>) -> Vec<T> {
    records
        .into_iter()
        .filter_map(|fields| match serde_json::from_value(Value::Object(fields)) {
            Ok(parsed) => Some(parsed),
            Err(e) => {
                tracing::debug!(error = %e, "skipping unreadable document");
                None
            }
        })
        .collect()
}

pub(crate) fn truncate_chars(text: &str, max_chars: usize) -> String {
    text.chars().take(max_chars).collect()
}
