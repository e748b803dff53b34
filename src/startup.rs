use actix_web::dev::Server;
use actix_web::{web, App, HttpServer};
use anyhow::Context;
use sqlx::postgres::PgPoolOptions;
use sqlx::{Pool, Postgres};
use std::net::TcpListener;
use std::sync::Arc;
use tracing_actix_web::TracingLogger;

use crate::config::{DatabaseSettings, MarkerBackend, Settings, SubscriberBackend};
use crate::email_client::EmailClient;
use crate::extract::{DateExtractor, ScheduleExtractor};
use crate::fetcher::PageFetcher;
use crate::marker_store::{
    InMemoryMarkerStore, MarkerStore, RedisMarkerStore, DATE_MARKER_KEY, SCHEDULE_MARKER_KEY,
};
use crate::notifier::Notifier;
use crate::pipeline::{Pipeline, PipelineDependencies};
use crate::rate_limiter::RateLimiter;
use crate::routes::{
    check_idu_date, check_idu_schedule, handle_contact_submission, handle_create_subscription,
    handle_unsubscribe, handle_unsubscribe_link, health_check,
};
use crate::submission_store::{InMemorySubmissionStore, PgSubmissionStore, SubmissionStore};

pub struct Application {
    pub port: u16,
    pub server: Server,
    pub submissions: Arc<dyn SubmissionStore>,
    pub marker_store: Option<Arc<dyn MarkerStore>>,
}

impl Application {
    pub async fn build(config: Settings) -> Result<Self, anyhow::Error> {
        let submissions: Arc<dyn SubmissionStore> = match config.storage.subscribers {
            SubscriberBackend::Postgres => Arc::new(PgSubmissionStore::new(
                get_connection_db_pool(&config.database),
            )),
            SubscriberBackend::Memory => Arc::new(InMemorySubmissionStore::seeded(
                &config.storage.static_subscribers,
            )),
        };

        let marker_store: Option<Arc<dyn MarkerStore>> = match config.storage.markers {
            MarkerBackend::Redis => Some(Arc::new(
                RedisMarkerStore::new(&config.get_redis_uri())
                    .context("Failed to create the redis client")?,
            )),
            MarkerBackend::Memory => Some(Arc::new(InMemoryMarkerStore::new())),
            MarkerBackend::Disabled => None,
        };

        let sender_email = config
            .get_email_client_sender()
            .map_err(anyhow::Error::msg)
            .context("Sender email is not valid")?;
        let email_client = EmailClient::new(
            config.get_email_client_base_url(),
            sender_email,
            config.email_client.sender_name.clone(),
            config.get_email_client_api(),
            Some(config.email_client.get_timeout()),
        )
        .context("Failed to build the email client")?;

        let notifier = Notifier::new(
            Arc::new(email_client),
            Arc::new(RateLimiter::new(config.watcher.get_send_interval())),
            config.get_target_url(),
            &config.get_app_base_url(),
        )
        .map_err(anyhow::Error::msg)?;

        let fetcher = PageFetcher::new(config.watcher.get_fetch_timeout())
            .context("Failed to build the page fetcher")?;

        let dependencies = PipelineDependencies {
            fetcher: Arc::new(fetcher),
            marker_store: marker_store.clone(),
            submissions: submissions.clone(),
            notifier: Arc::new(notifier),
            target_url: config.get_target_url(),
        };
        let date_pipeline = Pipeline::new(
            DateExtractor,
            DATE_MARKER_KEY,
            config.watcher.date_default.clone(),
            dependencies.clone(),
        );
        let schedule_pipeline = Pipeline::new(
            ScheduleExtractor,
            SCHEDULE_MARKER_KEY,
            config.watcher.schedule_default.clone(),
            dependencies,
        );

        let listener = TcpListener::bind(config.get_address())
            .with_context(|| format!("Failed to bind {}", config.get_address()))?;
        let port = listener.local_addr()?.port();

        tracing::info!("Server listening on {}:{}", config.application.host, port);

        let server = run(
            listener,
            submissions.clone(),
            date_pipeline,
            schedule_pipeline,
        )?;

        Ok(Self {
            port,
            server,
            submissions,
            marker_store,
        })
    }

    pub fn get_port(&self) -> u16 {
        self.port
    }

    pub async fn run_until_stop(self) -> Result<(), std::io::Error> {
        self.server.await
    }
}

pub fn run(
    listener: TcpListener,
    submissions: Arc<dyn SubmissionStore>,
    date_pipeline: Pipeline<DateExtractor>,
    schedule_pipeline: Pipeline<ScheduleExtractor>,
) -> Result<Server, std::io::Error> {
    let submissions: web::Data<dyn SubmissionStore> = web::Data::from(submissions);
    let date_pipeline = web::Data::new(date_pipeline);
    let schedule_pipeline = web::Data::new(schedule_pipeline);

    let server = HttpServer::new(move || {
        App::new()
            .wrap(TracingLogger::default())
            .route("/health_check", web::get().to(health_check))
            .route("/idu/check", web::get().to(check_idu_date))
            .route("/idu/schedule/check", web::get().to(check_idu_schedule))
            .route(
                "/idu/subscriptions",
                web::post().to(handle_create_subscription),
            )
            .route("/idu/unsubscribe", web::get().to(handle_unsubscribe_link))
            .route("/idu/unsubscribe", web::post().to(handle_unsubscribe))
            .route("/contact", web::post().to(handle_contact_submission))
            .app_data(submissions.clone())
            .app_data(date_pipeline.clone())
            .app_data(schedule_pipeline.clone())
    })
    .listen(listener)?
    .run();

    Ok(server)
}

pub fn get_connection_db_pool(config: &DatabaseSettings) -> Pool<Postgres> {
    PgPoolOptions::new()
        .acquire_timeout(std::time::Duration::from_secs(2))
        .connect_lazy_with(config.get_db_options())
}
