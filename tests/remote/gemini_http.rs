use crate::http_harness::{gemini, gemini_text};
use moodwell::core::companion::{
    Conversation, GenerationOptions, PhraseGenerator, PhraseRequest, conversation::OFFLINE_REPLY,
    recommendation_for_day,
};
use moodwell::core::recovery::ErrorKind;
use moodwell::core::scoring::Diagnosis;
use moodwell::error::CompanionError;
use serde_json::json;
use wiremock::matchers::{body_partial_json, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

const GENERATE_PATH: &str = "/models/gemini-2.0-flash:generateContent";

fn phrase_request() -> PhraseRequest {
    PhraseRequest {
        diagnosis: Diagnosis::Low,
        emotions: vec!["cansancio".into()],
        day_tags: vec!["trabajo".into()],
        note: String::new(),
        max_chars: 20,
    }
}

#[tokio::test]
async fn phrase_is_unquoted_and_capped() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path(GENERATE_PATH))
        .and(query_param("key", "gemini-key"))
        .and(body_partial_json(json!({
            "generationConfig": { "maxOutputTokens": 128 }
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(gemini_text(
            "\"Descansar también es avanzar, date permiso hoy.\"",
        )))
        .expect(1)
        .mount(&server)
        .await;

    let client = gemini(&server);
    let phrase = client
        .phrase_for_diagnostic(&phrase_request())
        .await
        .unwrap();
    assert_eq!(phrase, "Descansar también es");
    assert_eq!(PhraseGenerator::model(&client), "gemini-2.0-flash");
}

#[tokio::test]
async fn api_errors_keep_their_kind() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path(GENERATE_PATH))
        .respond_with(ResponseTemplate::new(403).set_body_json(json!({
            "error": { "code": 403, "message": "API key not valid" }
        })))
        .mount(&server)
        .await;

    let err = gemini(&server)
        .generate(None, "hola", &GenerationOptions::default())
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Unauthorized);
}

#[tokio::test]
async fn empty_candidates_are_a_generation_failure() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path(GENERATE_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "candidates": [] })))
        .mount(&server)
        .await;

    let err = gemini(&server)
        .phrase_for_diagnostic(&phrase_request())
        .await
        .unwrap_err();
    assert!(matches!(err, CompanionError::EmptyResponse));
    assert_eq!(err.kind(), ErrorKind::GenerationFailed);
}

#[tokio::test]
async fn recommendation_uses_tuned_sampling() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path(GENERATE_PATH))
        .and(body_partial_json(json!({
            "generationConfig": { "topK": 40, "maxOutputTokens": 600 }
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(gemini_text(
            "Hoy te propongo una caminata corta.",
        )))
        .expect(1)
        .mount(&server)
        .await;

    let text = recommendation_for_day(&gemini(&server), "Ana", &[], &[], 550)
        .await
        .unwrap();
    assert_eq!(text, "Hoy te propongo una caminata corta.");
}

#[tokio::test]
async fn chat_keeps_history_and_survives_outages() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path(GENERATE_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(gemini_text("Te escucho.")))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path(GENERATE_PATH))
        .respond_with(ResponseTemplate::new(504))
        .mount(&server)
        .await;

    let client = gemini(&server);
    let mut chat = Conversation::with_greeting();

    assert_eq!(chat.send(&client, "Estoy triste").await.unwrap(), "Te escucho.");
    assert_eq!(chat.send(&client, "¿Sigues ahí?").await.unwrap(), OFFLINE_REPLY);
    assert_eq!(chat.history().len(), 5);
}
