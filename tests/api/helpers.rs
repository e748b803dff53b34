use once_cell::sync::Lazy;
use reqwest::{Response, Url};
use serde_json::Value;
use std::sync::Arc;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use idu_watch::{
    config::{get_configuration, MarkerBackend, Settings, SubscriberBackend},
    marker_store::MarkerStore,
    startup::Application,
    submission_store::SubmissionStore,
    telemetry::{get_subscriber, init_subscriber},
};

pub const PAGE_PATH: &str = "/noticia";

// Set TEST_LOG to see the logs of the app under test
static TRACING: Lazy<()> = Lazy::new(|| {
    let name = "test".to_string();
    let env_filter = "debug".to_string();

    if std::env::var("TEST_LOG").is_ok() {
        init_subscriber(get_subscriber(name, env_filter, std::io::stdout));
    } else {
        init_subscriber(get_subscriber(name, env_filter, std::io::sink));
    }
});

pub struct TestApp {
    pub config: Settings,
    pub address: String,
    pub port: u16,
    pub page_server: MockServer,
    pub email_server: MockServer,
    pub submissions: Arc<dyn SubmissionStore>,
    pub marker_store: Option<Arc<dyn MarkerStore>>,
}

impl TestApp {
    pub async fn spawn_app() -> TestApp {
        Self::spawn_app_with(|_| {}).await
    }

    /// Builds an app backed by in-memory stores, pointed at mock page and email servers.
    pub async fn spawn_app_with(customize: impl FnOnce(&mut Settings)) -> TestApp {
        Lazy::force(&TRACING);

        let mut config = get_configuration().expect("Missing configuration file.");
        let page_server = MockServer::start().await;
        let email_server = MockServer::start().await;

        // Port 0 asks the OS for any free port
        config.set_app_port(0);
        config.set_email_client_base_url(email_server.uri());
        config.set_target_url(format!("{}{}", page_server.uri(), PAGE_PATH));
        config.storage.markers = MarkerBackend::Memory;
        config.storage.subscribers = SubscriberBackend::Memory;
        config.storage.static_subscribers = vec![];
        config.watcher.send_interval_milliseconds = 10;
        customize(&mut config);

        let application = Application::build(config.clone())
            .await
            .expect("Failed to build application.");

        let port = application.get_port();
        let address = format!("http://127.0.0.1:{}", port);
        let submissions = application.submissions.clone();
        let marker_store = application.marker_store.clone();

        tokio::spawn(application.run_until_stop());

        TestApp {
            config,
            address,
            port,
            page_server,
            email_server,
            submissions,
            marker_store,
        }
    }

    pub async fn serve_page(&self, html: &str) {
        Mock::given(method("GET"))
            .and(path(PAGE_PATH))
            .respond_with(ResponseTemplate::new(200).set_body_string(html))
            .mount(&self.page_server)
            .await;
    }

    pub async fn check_date(&self) -> Response {
        self.get("/idu/check").await
    }

    pub async fn check_schedule(&self) -> Response {
        self.get("/idu/schedule/check").await
    }

    pub async fn post_subscription(&self, body: Value) -> Response {
        self.post_json("/idu/subscriptions", body).await
    }

    pub async fn post_unsubscribe(&self, body: Value) -> Response {
        self.post_json("/idu/unsubscribe", body).await
    }

    pub async fn post_contact(&self, body: Value) -> Response {
        self.post_json("/contact", body).await
    }

    /// Signs up through the public endpoint.
    pub async fn subscribe(&self, email: &str, wants_daily_updates: bool) {
        let response = self
            .post_subscription(serde_json::json!({
                "name": "Natalia",
                "email": email,
                "wantsDailyUpdates": wants_daily_updates
            }))
            .await;

        assert_eq!(201, response.status().as_u16());
    }

    pub async fn get(&self, endpoint: &str) -> Response {
        reqwest::Client::new()
            .get(format!("{}{}", self.address, endpoint))
            .send()
            .await
            .expect("Failed to execute request.")
    }

    async fn post_json(&self, endpoint: &str, body: Value) -> Response {
        reqwest::Client::new()
            .post(format!("{}{}", self.address, endpoint))
            .json(&body)
            .send()
            .await
            .expect("Failed to execute request.")
    }

    /// Recipients of every email the provider received, in arrival order.
    pub async fn email_recipients(&self) -> Vec<String> {
        self.sent_emails()
            .await
            .iter()
            .map(|body| body["to"][0].as_str().unwrap().to_string())
            .collect()
    }

    pub async fn sent_emails(&self) -> Vec<Value> {
        self.email_server
            .received_requests()
            .await
            .unwrap()
            .iter()
            .map(|request| serde_json::from_slice(&request.body).unwrap())
            .collect()
    }

    /// Unsubscribe link of an email, rewritten to reach this app's random port.
    pub fn get_unsubscribe_link(&self, email: &Value) -> Url {
        let html = email["html"].as_str().unwrap();
        let link = linkify::LinkFinder::new()
            .links(html)
            .filter(|link| *link.kind() == linkify::LinkKind::Url)
            .map(|link| link.as_str().to_owned())
            .find(|link| link.contains("/idu/unsubscribe"))
            .unwrap();

        let mut link = Url::parse(&link).unwrap();
        assert_eq!(link.host_str().unwrap(), "127.0.0.1");
        link.set_port(Some(self.port)).unwrap();
        link
    }
}

pub async fn accept_all_emails(email_server: &MockServer) {
    Mock::given(path("/emails"))
        .and(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({ "id": "re_1" })))
        .mount(email_server)
        .await;
}

pub fn date_page(date: &str) -> String {
    format!(
        r#"<html><body>
          <p>Se informa que se encuentran habilitados los
             IDUs registrados al <span class="fecha">{}</span>.</p>
        </body></html>"#,
        date
    )
}
