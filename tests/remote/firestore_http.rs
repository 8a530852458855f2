use crate::http_harness::{document, firestore, init_crypto};
use chrono::{TimeZone, Utc};
use moodwell::core::recovery::ErrorKind;
use moodwell::core::remote::{FirestoreClient, NoteDraft, RemoteWriter};
use serde_json::{Map, Value, json};
use wiremock::matchers::{body_partial_json, header, method, path_regex, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

#[tokio::test]
async fn note_is_created_with_key_and_bearer_token() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path_regex(r"/documents/users/u1/notes$"))
        .and(query_param("key", "web-key"))
        .and(header("authorization", "Bearer id-token"))
        .and(body_partial_json(json!({
            "fields": {
                "title": { "stringValue": "Sin título" },
                "content": { "stringValue": "Hoy dormí bien" }
            }
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(document(
            "users/u1/notes",
            "note-abc",
            json!({}),
        )))
        .expect(1)
        .mount(&server)
        .await;

    let client = firestore(&server);
    let id = client
        .create_note("u1", &NoteDraft::new("  ", " Hoy dormí bien "))
        .await
        .unwrap();
    assert_eq!(id, "note-abc");
}

#[tokio::test]
async fn diagnostic_payload_is_encoded_as_typed_values() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path_regex(r"/documents/users/u1/diagnostics$"))
        .and(body_partial_json(json!({
            "fields": {
                "score": { "integerValue": "52" },
                "diagnosis": { "stringValue": "Neutral" },
                "emotions": { "arrayValue": { "values": [{ "stringValue": "ansiedad" }] } }
            }
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(document(
            "users/u1/diagnostics",
            "diag-9",
            json!({}),
        )))
        .expect(1)
        .mount(&server)
        .await;

    let mut payload = Map::new();
    payload.insert("score".into(), json!(52));
    payload.insert("diagnosis".into(), json!("Neutral"));
    payload.insert("emotions".into(), json!(["ansiedad"]));

    let id = firestore(&server)
        .create_diagnostic("u1", &payload)
        .await
        .unwrap();
    assert_eq!(id, "diag-9");
}

#[tokio::test]
async fn phrase_annotation_patches_only_listed_fields() {
    let server = MockServer::start().await;

    Mock::given(method("PATCH"))
        .and(path_regex(r"/documents/users/u1/diagnostics/diag-9$"))
        .and(query_param("updateMask.fieldPaths", "phrase"))
        .respond_with(ResponseTemplate::new(200).set_body_json(document(
            "users/u1/diagnostics",
            "diag-9",
            json!({}),
        )))
        .expect(1)
        .mount(&server)
        .await;

    let mut fields = Map::new();
    fields.insert("phrase".into(), json!("Respira."));
    firestore(&server)
        .update_diagnostic("u1", "diag-9", &fields)
        .await
        .unwrap();
}

#[tokio::test]
async fn rejected_token_is_classified_unauthorized() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(403).set_body_json(json!({
            "error": { "code": 403, "message": "Missing or insufficient permissions.", "status": "PERMISSION_DENIED" }
        })))
        .mount(&server)
        .await;

    let err = firestore(&server)
        .create_note("u1", &NoteDraft::new("t", "c"))
        .await
        .unwrap_err();
    assert_eq!(err.kind, ErrorKind::Unauthorized);
    assert!(err.message.contains("insufficient permissions"));
}

#[tokio::test]
async fn server_error_is_rejected_and_garbage_is_malformed() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path_regex(r"/notes$"))
        .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path_regex(r"/diagnostics$"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>proxy</html>"))
        .mount(&server)
        .await;

    let client = firestore(&server);
    let err = client
        .create_note("u1", &NoteDraft::new("t", "c"))
        .await
        .unwrap_err();
    assert_eq!(err.kind, ErrorKind::Rejected);

    let err = client
        .create_diagnostic("u1", &Map::new())
        .await
        .unwrap_err();
    assert_eq!(err.kind, ErrorKind::MalformedResponse);
}

#[tokio::test]
async fn closed_port_is_unreachable() {
    init_crypto();
    let client = FirestoreClient::new("demo", None, 2).with_base_url("http://127.0.0.1:1");
    let err = client
        .create_note("u1", &NoteDraft::new("t", "c"))
        .await
        .unwrap_err();
    assert_eq!(err.kind, ErrorKind::Unreachable);
    assert!(err.kind.is_transient());
}

#[tokio::test]
async fn missing_recommendation_reads_as_none() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path_regex(r"/recommendations/2026-03-01$"))
        .respond_with(ResponseTemplate::new(404).set_body_json(json!({
            "error": { "code": 404, "message": "Document not found", "status": "NOT_FOUND" }
        })))
        .mount(&server)
        .await;

    let found = firestore(&server)
        .recommendation_for_date("u1", "2026-03-01")
        .await
        .unwrap();
    assert!(found.is_none());
}

#[tokio::test]
async fn stored_recommendation_is_decoded() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path_regex(r"/recommendations/2026-03-01$"))
        .respond_with(ResponseTemplate::new(200).set_body_json(document(
            "users/u1/recommendations",
            "2026-03-01",
            json!({
                "date": { "stringValue": "2026-03-01" },
                "text": { "stringValue": "Sal a caminar." },
                "meta": { "mapValue": { "fields": { "notes": { "integerValue": "2" } } } }
            }),
        )))
        .mount(&server)
        .await;

    let stored = firestore(&server)
        .recommendation_for_date("u1", "2026-03-01")
        .await
        .unwrap()
        .unwrap();
    assert_eq!(stored.text, "Sal a caminar.");
    assert_eq!(stored.meta["notes"], json!(2));
}

#[tokio::test]
async fn day_window_is_filtered_and_ordered_by_the_server() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path_regex(r"/documents/users/u1:runQuery$"))
        .and(body_partial_json(json!({
            "structuredQuery": {
                "from": [{ "collectionId": "diagnostics" }],
                "where": { "compositeFilter": { "op": "AND", "filters": [
                    { "fieldFilter": {
                        "field": { "fieldPath": "createdAt" },
                        "op": "GREATER_THAN_OR_EQUAL",
                        "value": { "timestampValue": "2026-03-01T05:00:00.000Z" }
                    } },
                    { "fieldFilter": {
                        "field": { "fieldPath": "createdAt" },
                        "op": "LESS_THAN",
                        "value": { "timestampValue": "2026-03-02T05:00:00.000Z" }
                    } }
                ] } },
                "orderBy": [{ "field": { "fieldPath": "createdAt" }, "direction": "DESCENDING" }],
                "limit": 3
            }
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            { "readTime": "2026-03-01T20:00:00.000000Z" },
            {
                "document": document("users/u1/diagnostics", "d2", json!({
                    "score": { "integerValue": "80" },
                    "createdAt": { "timestampValue": "2026-03-01T19:00:00.000Z" }
                })),
                "readTime": "2026-03-01T20:00:00.000000Z"
            }
        ])))
        .expect(1)
        .mount(&server)
        .await;

    let start = Utc.with_ymd_and_hms(2026, 3, 1, 5, 0, 0).unwrap();
    let end = Utc.with_ymd_and_hms(2026, 3, 2, 5, 0, 0).unwrap();
    let found = firestore(&server)
        .documents_between("u1", "diagnostics", "createdAt", (start, end), 3)
        .await
        .unwrap();

    assert_eq!(found.len(), 1);
    assert_eq!(found[0]["id"], json!("d2"));
    assert_eq!(found[0]["score"], json!(80));
}

#[tokio::test]
async fn refreshing_a_recommendation_keeps_its_creation_time() {
    let server = MockServer::start().await;

    Mock::given(method("PATCH"))
        .and(path_regex(r"/recommendations/2026-03-01$"))
        .and(query_param("currentDocument.exists", "true"))
        .and(query_param("updateMask.fieldPaths", "text"))
        .respond_with(ResponseTemplate::new(200).set_body_json(document(
            "users/u1/recommendations",
            "2026-03-01",
            json!({}),
        )))
        .expect(1)
        .mount(&server)
        .await;

    firestore(&server)
        .upsert_recommendation("u1", "2026-03-01", " Descansa. ", &Map::new())
        .await
        .unwrap();

    let received = server.received_requests().await.unwrap();
    assert_eq!(received.len(), 1);
    assert!(
        !received[0]
            .url
            .query_pairs()
            .any(|(key, value)| key == "updateMask.fieldPaths" && value == "createdAt")
    );
    let body: Value = serde_json::from_slice(&received[0].body).unwrap();
    assert!(body["fields"].get("createdAt").is_none());
    assert_eq!(body["fields"]["text"], json!({ "stringValue": "Descansa." }));
}

#[tokio::test]
async fn first_recommendation_of_the_day_is_created_with_creation_time() {
    let server = MockServer::start().await;

    Mock::given(method("PATCH"))
        .and(path_regex(r"/recommendations/2026-03-01$"))
        .and(query_param("currentDocument.exists", "true"))
        .respond_with(ResponseTemplate::new(404).set_body_json(json!({
            "error": { "code": 404, "message": "No document to update", "status": "NOT_FOUND" }
        })))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("PATCH"))
        .and(path_regex(r"/recommendations/2026-03-01$"))
        .and(query_param("currentDocument.exists", "false"))
        .and(query_param("updateMask.fieldPaths", "createdAt"))
        .respond_with(ResponseTemplate::new(200).set_body_json(document(
            "users/u1/recommendations",
            "2026-03-01",
            json!({}),
        )))
        .expect(1)
        .mount(&server)
        .await;

    firestore(&server)
        .upsert_recommendation("u1", "2026-03-01", "Sal a caminar.", &Map::new())
        .await
        .unwrap();
}
