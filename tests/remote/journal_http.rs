use crate::http_harness::{document, firestore};
use moodwell::core::journal;
use moodwell::core::remote::NoteDraft;
use moodwell::core::session::{SessionContext, SessionUser};
use serde_json::json;
use wiremock::matchers::{body_partial_json, method, path_regex, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn signed_in() -> SessionContext {
    SessionContext::signed_in(SessionUser::new("u1"))
}

fn not_found() -> ResponseTemplate {
    ResponseTemplate::new(404).set_body_json(json!({
        "error": { "code": 404, "message": "Document not found", "status": "NOT_FOUND" }
    }))
}

#[tokio::test]
async fn notes_are_listed_most_recently_edited_first() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path_regex(r"/documents/users/u1:runQuery$"))
        .and(body_partial_json(json!({
            "structuredQuery": {
                "from": [{ "collectionId": "notes" }],
                "orderBy": [{ "field": { "fieldPath": "updatedAt" }, "direction": "DESCENDING" }],
                "limit": journal::NOTES_LIST_LIMIT
            }
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            { "document": document("users/u1/notes", "n2", json!({
                "title": { "stringValue": "Martes" },
                "content": { "stringValue": "Dormí poco" },
                "updatedAt": { "timestampValue": "2026-03-03T09:00:00.000Z" }
            })) },
            { "document": document("users/u1/notes", "n1", json!({
                "title": { "stringValue": "Lunes" },
                "content": { "stringValue": "Buen día" },
                "updatedAt": { "timestampValue": "2026-03-02T09:00:00.000Z" }
            })) }
        ])))
        .expect(1)
        .mount(&server)
        .await;

    let notes = journal::recent_notes(&firestore(&server), &signed_in())
        .await
        .unwrap();

    let ids: Vec<&str> = notes.iter().map(|note| note.id.as_str()).collect();
    assert_eq!(ids, ["n2", "n1"]);
    assert_eq!(notes[0].title, "Martes");
}

#[tokio::test]
async fn missing_note_reads_as_none() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path_regex(r"/documents/users/u1/notes/gone$"))
        .respond_with(not_found())
        .expect(1)
        .mount(&server)
        .await;

    let found = journal::note(&firestore(&server), &signed_in(), "gone")
        .await
        .unwrap();
    assert!(found.is_none());
}

#[tokio::test]
async fn editing_patches_only_an_existing_note() {
    let server = MockServer::start().await;

    Mock::given(method("PATCH"))
        .and(path_regex(r"/documents/users/u1/notes/n1$"))
        .and(query_param("currentDocument.exists", "true"))
        .and(query_param("updateMask.fieldPaths", "title"))
        .and(query_param("updateMask.fieldPaths", "content"))
        .and(query_param("updateMask.fieldPaths", "updatedAt"))
        .and(body_partial_json(json!({
            "fields": { "title": { "stringValue": "Nuevo título" } }
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(document(
            "users/u1/notes",
            "n1",
            json!({}),
        )))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("PATCH"))
        .and(path_regex(r"/documents/users/u1/notes/gone$"))
        .respond_with(not_found())
        .expect(1)
        .mount(&server)
        .await;

    let store = firestore(&server);
    let draft = NoteDraft::new("Nuevo título", "Texto");
    journal::edit_note(&store, &signed_in(), "n1", &draft)
        .await
        .unwrap();

    let err = journal::edit_note(&store, &signed_in(), "gone", &draft)
        .await
        .unwrap_err();
    assert!(err.to_string().contains("there is no note gone"));
}

#[tokio::test]
async fn deleting_a_note_sends_delete() {
    let server = MockServer::start().await;

    Mock::given(method("DELETE"))
        .and(path_regex(r"/documents/users/u1/notes/n1$"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
        .expect(1)
        .mount(&server)
        .await;

    journal::delete_note(&firestore(&server), &signed_in(), "n1")
        .await
        .unwrap();
}

#[tokio::test]
async fn history_lists_check_ins_newest_first() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path_regex(r"/documents/users/u1:runQuery$"))
        .and(body_partial_json(json!({
            "structuredQuery": {
                "from": [{ "collectionId": "diagnostics" }],
                "orderBy": [{ "field": { "fieldPath": "createdAt" }, "direction": "DESCENDING" }],
                "limit": journal::DIAGNOSTICS_LIST_LIMIT
            }
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            { "document": document("users/u1/diagnostics", "d1", json!({
                "mood": { "integerValue": "4" },
                "score": { "integerValue": "76" },
                "diagnosis": { "stringValue": "Bienestar alto" },
                "emotions": { "arrayValue": { "values": [{ "stringValue": "alegría" }] } },
                "createdAt": { "timestampValue": "2026-03-01T19:00:00.000Z" }
            })) },
            { "readTime": "2026-03-01T20:00:00.000000Z" }
        ])))
        .expect(1)
        .mount(&server)
        .await;

    let history = journal::recent_diagnostics(&firestore(&server), &signed_in())
        .await
        .unwrap();

    assert_eq!(history.len(), 1);
    assert_eq!(history[0].id, "d1");
    assert_eq!(history[0].score, 76);
    assert_eq!(history[0].emotions, ["alegría"]);
}
