use crate::http_harness::{document, firestore};
use moodwell::core::directory::{self, DirectoryFilter, ProfileChanges};
use moodwell::core::session::{SessionContext, SessionUser, UserRole};
use moodwell::error::ProfileError;
use serde_json::{Value, json};
use wiremock::matchers::{body_partial_json, method, path_regex, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn professional() -> SessionContext {
    SessionContext::signed_in(SessionUser {
        role: UserRole::Professional,
        ..SessionUser::new("u1")
    })
}

fn listed(id: &str, username: &str, name: &str, state: &str) -> Value {
    json!({ "document": document("users", id, json!({
        "username": { "stringValue": username },
        "professional": { "mapValue": { "fields": {
            "type": { "stringValue": "profesional" },
            "fullName": { "stringValue": name },
            "specialty": { "stringValue": "Psicología" },
            "state": { "stringValue": state },
            "municipality": { "stringValue": "Centro" }
        } } }
    })) })
}

#[tokio::test]
async fn directory_queries_listed_professionals_and_filters_locally() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path_regex(r"/documents:runQuery$"))
        .and(body_partial_json(json!({
            "structuredQuery": {
                "from": [{ "collectionId": "users" }],
                "where": { "fieldFilter": {
                    "field": { "fieldPath": "professional.type" },
                    "op": "EQUAL",
                    "value": { "stringValue": "profesional" }
                } }
            }
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            listed("u3", "zoe", "Zoe Ruiz", "Jalisco"),
            listed("u2", "beto", "Alberto Paz", "Yucatán"),
            listed("u4", "ana", "Ana López", "jalisco ")
        ])))
        .expect(1)
        .mount(&server)
        .await;

    let filter = DirectoryFilter {
        state: Some("Jalisco".into()),
        ..DirectoryFilter::default()
    };
    let listings = directory::find_professionals(&firestore(&server), &filter)
        .await
        .unwrap();

    let handles: Vec<&str> = listings.iter().map(|l| l.handle.as_str()).collect();
    assert_eq!(handles, ["ana", "zoe"]);
}

#[tokio::test]
async fn profile_update_merges_into_professional_map() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path_regex(r"/documents/users/u1$"))
        .respond_with(ResponseTemplate::new(200).set_body_json(document(
            "users",
            "u1",
            json!({
                "username": { "stringValue": "ana" },
                "professional": { "mapValue": { "fields": {
                    "fullName": { "stringValue": "Ana López" },
                    "specialty": { "stringValue": "Psicología" },
                    "cedula": { "stringValue": "1234567" },
                    "phone": { "stringValue": "3312345678" },
                    "state": { "stringValue": "Jalisco" },
                    "municipality": { "stringValue": "Zapopan" }
                } } }
            }),
        )))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("PATCH"))
        .and(path_regex(r"/documents/users/u1$"))
        .and(query_param("updateMask.fieldPaths", "professional.phone"))
        .and(query_param("updateMask.fieldPaths", "professional.type"))
        .and(body_partial_json(json!({
            "fields": { "professional": { "mapValue": { "fields": {
                "phone": { "stringValue": "3398765432" },
                "fullName": { "stringValue": "Ana López" },
                "type": { "stringValue": "profesional" }
            } } } }
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(document(
            "users",
            "u1",
            json!({}),
        )))
        .expect(1)
        .mount(&server)
        .await;

    let updated = directory::update_my_profile(
        &firestore(&server),
        &professional(),
        ProfileChanges {
            phone: Some("3398765432".into()),
            ..ProfileChanges::default()
        },
    )
    .await
    .unwrap();

    assert_eq!(updated.phone, "3398765432");
    assert_eq!(updated.municipality, "Zapopan");
}

#[tokio::test]
async fn invalid_profile_is_not_written() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path_regex(r"/documents/users/u1$"))
        .respond_with(ResponseTemplate::new(404).set_body_json(json!({
            "error": { "code": 404, "message": "Document not found", "status": "NOT_FOUND" }
        })))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("PATCH"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let err = directory::update_my_profile(
        &firestore(&server),
        &professional(),
        ProfileChanges {
            full_name: Some("Ana López".into()),
            ..ProfileChanges::default()
        },
    )
    .await
    .unwrap_err();

    assert!(matches!(
        err.downcast_ref::<ProfileError>(),
        Some(ProfileError::Invalid(_))
    ));
}

#[tokio::test]
async fn normal_account_cannot_touch_a_profile() {
    let server = MockServer::start().await;
    let session = SessionContext::signed_in(SessionUser::new("u1"));

    let err = directory::update_my_profile(&firestore(&server), &session, ProfileChanges::default())
        .await
        .unwrap_err();

    assert_eq!(
        err.downcast_ref::<ProfileError>(),
        Some(&ProfileError::NotProfessional)
    );
    assert!(server.received_requests().await.unwrap().is_empty());
}
