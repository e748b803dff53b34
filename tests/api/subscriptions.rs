use serde_json::{json, Value};

use crate::helpers::TestApp;

#[tokio::test]
async fn subscribe_returns_201_when_body_is_valid() {
    let test_app = TestApp::spawn_app().await;

    let response = test_app
        .post_subscription(json!({
            "name": "Natalia",
            "email": "natalia@test.com",
            "wantsDailyUpdates": true,
            "message": "Gracias!"
        }))
        .await;

    assert_eq!(201, response.status().as_u16());
    let body: Value = response.json().await.unwrap();
    assert!(body["id"].is_string());
}

#[tokio::test]
async fn subscribe_persists_the_new_subscriber() {
    let test_app = TestApp::spawn_app().await;

    test_app
        .post_subscription(json!({
            "name": "Natalia",
            "email": " natalia@test.com ",
            "wantsDailyUpdates": "yes"
        }))
        .await;

    let subscribers = test_app.submissions.list_active_subscribers().await.unwrap();
    assert_eq!(1, subscribers.len());
    assert_eq!("natalia@test.com", subscribers[0].email.as_ref());
    assert!(subscribers[0].wants_daily_updates);
}

#[tokio::test]
async fn missing_preference_means_change_only_updates() {
    let test_app = TestApp::spawn_app().await;

    test_app
        .post_subscription(json!({ "name": "Natalia", "email": "natalia@test.com" }))
        .await;

    let subscribers = test_app.submissions.list_active_subscribers().await.unwrap();
    assert!(!subscribers[0].wants_daily_updates);
}

#[tokio::test]
async fn subscribing_again_replaces_the_preference() {
    let test_app = TestApp::spawn_app().await;

    test_app.subscribe("natalia@test.com", false).await;
    test_app.subscribe("natalia@test.com", true).await;

    let subscribers = test_app.submissions.list_active_subscribers().await.unwrap();
    assert_eq!(1, subscribers.len());
    assert!(subscribers[0].wants_daily_updates);
}

#[tokio::test]
async fn subscribe_returns_400_when_data_is_missing() {
    let test_app = TestApp::spawn_app().await;
    let test_cases = vec![
        (json!({ "name": "Natalia" }), "missing the email"),
        (json!({ "email": "natalia@test.com" }), "missing the name"),
        (json!({}), "missing both name and email"),
    ];

    for (body, error_message) in test_cases {
        let response = test_app.post_subscription(body).await;

        assert_eq!(
            400,
            response.status().as_u16(),
            "The API did not fail with 400 Bad Request when the payload was {}.",
            error_message
        );
    }
}

#[tokio::test]
async fn subscribe_returns_400_when_fields_are_present_but_invalid() {
    let test_app = TestApp::spawn_app().await;
    let test_cases = vec![
        (json!({ "name": "", "email": "natalia@test.com" }), "empty name"),
        (json!({ "name": "Natalia", "email": "" }), "empty email"),
        (
            json!({ "name": "Natalia", "email": "definitely-not-an-email" }),
            "invalid email",
        ),
    ];

    for (body, description) in test_cases {
        let response = test_app.post_subscription(body).await;

        assert_eq!(
            400,
            response.status().as_u16(),
            "The API did not return a 400 Bad Request when the payload was {}.",
            description
        );
    }
}
