use serde_json::Value;
use wiremock::matchers::any;
use wiremock::{Mock, ResponseTemplate};

use crate::helpers::{accept_all_emails, TestApp};
use idu_watch::marker_store::SCHEDULE_MARKER_KEY;

const SCHEDULE_PAGE: &str = r#"
    <html><body>
      <h3>Marzo 2024</h3>
      <p>Se habilitan los IDUs desde el código <b>102345</b> hasta el código <b>104000</b>,
         IDUs registrados hasta el 15/02/2024.</p>
      <h3>Abril de 2024</h3>
      <p>Se habilitan los IDUs desde el código 104001 hasta el código 106500.</p>
    </body></html>"#;

#[tokio::test]
async fn schedule_check_reports_when_nothing_is_published() {
    let test_app = TestApp::spawn_app().await;
    test_app.subscribe("ana@test.com", true).await;
    test_app.serve_page("<html><body>Sin calendario</body></html>").await;

    Mock::given(any())
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&test_app.email_server)
        .await;

    let response = test_app.check_schedule().await;

    assert_eq!(200, response.status().as_u16());
    assert_eq!("No schedule found", response.text().await.unwrap());
}

#[tokio::test]
async fn new_schedule_is_sent_to_everyone_and_remembered() {
    let test_app = TestApp::spawn_app().await;
    test_app.subscribe("ana@test.com", false).await;
    test_app.serve_page(SCHEDULE_PAGE).await;
    accept_all_emails(&test_app.email_server).await;

    let response = test_app.check_schedule().await;

    assert_eq!(200, response.status().as_u16());
    let summary: Value = response.json().await.unwrap();
    assert_eq!(summary["changed"], true);
    assert_eq!(summary["current"][0]["month"], "Marzo 2024");
    assert_eq!(summary["current"][1]["cutoff"], "registrados hasta N/D");

    let emails = test_app.sent_emails().await;
    assert_eq!(1, emails.len());
    assert_eq!(emails[0]["subject"], "Calendario de IDUs: ¡hay novedades!");

    let store = test_app.marker_store.as_ref().unwrap();
    let signature = store.get(SCHEDULE_MARKER_KEY).await.unwrap().unwrap();
    assert_eq!(summary["marker"], signature.as_str());
}

#[tokio::test]
async fn unchanged_schedule_skips_subscribers_without_daily_updates() {
    let test_app = TestApp::spawn_app().await;
    test_app.subscribe("ana@test.com", false).await;
    test_app.subscribe("beto@test.com", true).await;
    test_app.serve_page(SCHEDULE_PAGE).await;
    accept_all_emails(&test_app.email_server).await;

    test_app.check_schedule().await;
    let response = test_app.check_schedule().await;

    let summary: Value = response.json().await.unwrap();
    assert_eq!(summary["changed"], false);

    let emails = test_app.sent_emails().await;
    assert_eq!(3, emails.len());
    assert_eq!(emails[2]["to"][0], "beto@test.com");
    assert_eq!(emails[2]["subject"], "Calendario de IDUs (sin cambios)");
}

#[tokio::test]
async fn date_and_schedule_markers_are_independent() {
    let test_app = TestApp::spawn_app().await;
    test_app.subscribe("ana@test.com", false).await;
    test_app
        .serve_page(&format!(
            "{}<p>IDUs registrados al <span>20/03/2024</span></p>",
            SCHEDULE_PAGE
        ))
        .await;
    accept_all_emails(&test_app.email_server).await;

    let date: Value = test_app.check_date().await.json().await.unwrap();
    let schedule: Value = test_app.check_schedule().await.json().await.unwrap();

    assert_eq!(date["changed"], true);
    assert_eq!(schedule["changed"], true);
}
