use serde_json::{json, Value};

use crate::helpers::{accept_all_emails, date_page, TestApp};

#[tokio::test]
async fn notification_link_unsubscribes_the_recipient() {
    let test_app = TestApp::spawn_app().await;
    test_app.subscribe("ana@test.com", true).await;
    test_app.serve_page(&date_page("20/03/2024")).await;
    accept_all_emails(&test_app.email_server).await;

    test_app.check_date().await;
    let emails = test_app.sent_emails().await;
    let link = test_app.get_unsubscribe_link(&emails[0]);

    let response = reqwest::get(link).await.unwrap();

    assert_eq!(200, response.status().as_u16());
    let subscribers = test_app.submissions.list_active_subscribers().await.unwrap();
    assert!(subscribers.is_empty());
}

#[tokio::test]
async fn unsubscribe_reports_how_many_records_were_marked() {
    let test_app = TestApp::spawn_app().await;
    test_app.subscribe("ana@test.com", true).await;
    test_app.subscribe("ana@test.com", false).await;
    test_app.subscribe("beto@test.com", true).await;

    let response = test_app
        .post_unsubscribe(json!({ "email": "ana@test.com", "message": "Ya tengo mi IDU" }))
        .await;

    assert_eq!(200, response.status().as_u16());
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["unsubscribed"], 2);

    let subscribers = test_app.submissions.list_active_subscribers().await.unwrap();
    assert_eq!(1, subscribers.len());
    assert_eq!("beto@test.com", subscribers[0].email.as_ref());
}

#[tokio::test]
async fn unknown_email_unsubscribes_nothing() {
    let test_app = TestApp::spawn_app().await;

    let response = test_app
        .post_unsubscribe(json!({ "email": "nadie@test.com" }))
        .await;

    assert_eq!(200, response.status().as_u16());
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["unsubscribed"], 0);
}

#[tokio::test]
async fn unsubscribe_returns_400_for_an_invalid_email() {
    let test_app = TestApp::spawn_app().await;

    let post = test_app
        .post_unsubscribe(json!({ "email": "not-an-email" }))
        .await;
    let link = test_app.get("/idu/unsubscribe?email=not-an-email").await;
    let missing = test_app.get("/idu/unsubscribe").await;

    assert_eq!(400, post.status().as_u16());
    assert_eq!(400, link.status().as_u16());
    assert_eq!(400, missing.status().as_u16());
}

#[tokio::test]
async fn unsubscribe_link_covers_every_spelling_of_the_email() {
    let test_app = TestApp::spawn_app().await;
    test_app.subscribe("Ana@Test.com", true).await;
    test_app.subscribe("ana@test.com", true).await;
    test_app.serve_page(&date_page("20/03/2024")).await;
    accept_all_emails(&test_app.email_server).await;

    test_app.check_date().await;
    let emails = test_app.sent_emails().await;
    assert_eq!(1, emails.len());
    let link = test_app.get_unsubscribe_link(&emails[0]);

    reqwest::get(link).await.unwrap();
    test_app.check_date().await;

    assert_eq!(1, test_app.sent_emails().await.len());
}
