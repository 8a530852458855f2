#![allow(dead_code)]

use moodwell::core::companion::GeminiClient;
use moodwell::core::remote::FirestoreClient;
use serde_json::{Value, json};
use wiremock::MockServer;

pub const PROJECT: &str = "moodwell-test";

/// Installs the TLS provider the binary uses; idempotent.
pub fn init_crypto() {
    let _ = rustls::crypto::ring::default_provider().install_default();
}

pub fn firestore(server: &MockServer) -> FirestoreClient {
    init_crypto();
    FirestoreClient::new(PROJECT, Some("web-key"), 5)
        .with_base_url(server.uri())
        .with_id_token(Some("id-token"))
}

pub fn gemini(server: &MockServer) -> GeminiClient {
    init_crypto();
    GeminiClient::new(Some("gemini-key"), Some("gemini-2.0-flash"), 5).with_base_url(server.uri())
}

pub fn document(collection_path: &str, id: &str, fields: Value) -> Value {
    json!({
        "name": format!("projects/{PROJECT}/databases/(default)/documents/{collection_path}/{id}"),
        "fields": fields,
        "createTime": "2026-03-01T10:00:00.000000Z",
        "updateTime": "2026-03-01T10:00:00.000000Z",
    })
}

pub fn gemini_text(text: &str) -> Value {
    json!({
        "candidates": [{
            "content": { "role": "model", "parts": [{ "text": text }] },
            "finishReason": "STOP"
        }]
    })
}
