use crate::http_harness::{document, firestore, init_crypto};
use moodwell::core::checkin::{CheckIn, DiagnosticForm, DiagnosticOutcome};
use moodwell::core::offline::{MemoryKeyValueStore, OfflineQueue, QueuedAction, Replayer};
use moodwell::core::recovery::ErrorKind;
use moodwell::core::remote::{FirestoreClient, RemoteWriter};
use moodwell::core::session::{SessionContext, SessionUser};
use serde_json::json;
use std::sync::Arc;
use wiremock::matchers::{body_partial_json, method, path_regex};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn memory_queue() -> Arc<OfflineQueue> {
    Arc::new(OfflineQueue::new(Arc::new(MemoryKeyValueStore::new())))
}

#[tokio::test]
async fn replay_commits_what_it_can_and_keeps_the_rest() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path_regex(r"/notes$"))
        .and(body_partial_json(json!({ "fields": { "title": { "stringValue": "rechazada" } } })))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({
            "error": { "code": 400, "message": "Invalid argument" }
        })))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path_regex(r"/notes$"))
        .and(body_partial_json(json!({ "fields": { "title": { "stringValue": "aceptada" } } })))
        .respond_with(ResponseTemplate::new(200).set_body_json(document(
            "users/u1/notes",
            "n2",
            json!({}),
        )))
        .expect(1)
        .mount(&server)
        .await;

    let queue = memory_queue();
    queue.enqueue(QueuedAction::note("u1", "rechazada", "x")).unwrap();
    queue.enqueue(QueuedAction::note("u1", "aceptada", "y")).unwrap();

    let client = firestore(&server);
    let report = Replayer::new(queue.clone()).replay(&client).await.unwrap();

    assert_eq!(report.attempted, 2);
    assert_eq!(report.committed, 1);
    assert_eq!(report.requeued, 1);

    let remaining = queue.peek_all().unwrap();
    assert_eq!(remaining.len(), 1);
    assert_eq!(remaining[0].payload["title"], json!("rechazada"));
}

#[tokio::test]
async fn offline_check_in_is_delivered_on_next_sync() {
    init_crypto();
    let session = SessionContext::signed_in(SessionUser::new("u1"));
    let queue = memory_queue();

    let offline: Arc<dyn RemoteWriter> =
        Arc::new(FirestoreClient::new("demo", None, 2).with_base_url("http://127.0.0.1:1"));
    let outcome = CheckIn::new(offline, queue.clone())
        .submit_diagnostic(
            &session,
            DiagnosticForm {
                mood: 5,
                emotions: vec!["alegría".into(), "gratitud".into()],
                day_tags: vec![],
                note: String::new(),
                sleep_hours: 8,
            },
        )
        .await
        .unwrap();
    assert!(matches!(
        outcome,
        DiagnosticOutcome::QueuedOffline {
            reason: ErrorKind::Unreachable,
            ..
        }
    ));
    assert_eq!(outcome.result().score, 100);

    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path_regex(r"/documents/users/u1/diagnostics$"))
        .and(body_partial_json(json!({
            "fields": {
                "score": { "integerValue": "100" },
                "diagnosis": { "stringValue": "Muy positivo" }
            }
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(document(
            "users/u1/diagnostics",
            "d1",
            json!({}),
        )))
        .expect(1)
        .mount(&server)
        .await;

    let report = Replayer::new(queue.clone())
        .replay(&firestore(&server))
        .await
        .unwrap();
    assert_eq!(report.committed, 1);
    assert!(!queue.has_pending().unwrap());
}
