use serde_json::json;

use crate::helpers::TestApp;

#[tokio::test]
async fn contact_returns_201_for_a_valid_message() {
    let test_app = TestApp::spawn_app().await;

    let response = test_app
        .post_contact(json!({
            "name": "Natalia",
            "email": "natalia@test.com",
            "subject": "Turnos",
            "message": "¿Cuándo habilitan mi IDU?"
        }))
        .await;

    assert_eq!(201, response.status().as_u16());
}

#[tokio::test]
async fn contact_messages_do_not_join_the_mailing_list() {
    let test_app = TestApp::spawn_app().await;

    test_app
        .post_contact(json!({
            "name": "Natalia",
            "email": "natalia@test.com",
            "subject": "Turnos",
            "message": "Hola"
        }))
        .await;

    let subscribers = test_app.submissions.list_active_subscribers().await.unwrap();
    assert!(subscribers.is_empty());
}

#[tokio::test]
async fn contact_returns_400_when_fields_are_invalid() {
    let test_app = TestApp::spawn_app().await;
    let test_cases = vec![
        (
            json!({ "name": "Natalia", "email": "natalia@test.com", "subject": "", "message": "Hola" }),
            "empty subject",
        ),
        (
            json!({ "name": "Natalia", "email": "natalia@test.com", "subject": "Turnos", "message": " " }),
            "blank message",
        ),
        (
            json!({ "name": "Natalia", "email": "nope", "subject": "Turnos", "message": "Hola" }),
            "invalid email",
        ),
        (json!({ "name": "Natalia" }), "missing fields"),
    ];

    for (body, description) in test_cases {
        let response = test_app.post_contact(body).await;

        assert_eq!(
            400,
            response.status().as_u16(),
            "The API did not return a 400 Bad Request when the payload was {}.",
            description
        );
    }
}
