use futures::future::join_all;
use reqwest::Url;
use std::sync::Arc;

use crate::domain::subscriber::Subscriber;
use crate::domain::subscriber_email::SubscriberEmail;
use crate::email_client::{EmailClient, EmailReceipt};
use crate::extract::{EmailContext, Observation};
use crate::rate_limiter::RateLimiter;

/// A subscriber gets an email when still subscribed and either asked for
/// daily updates or this run saw a change.
pub fn is_eligible(subscriber: &Subscriber, changed: bool) -> bool {
    subscriber.is_active() && (subscriber.wants_daily_updates || changed)
}

#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct DeliveryFailure {
    pub email: String,
    pub error: String,
}

/// Per-run tally of the notification step. Never persisted.
#[derive(Debug, Default, Clone, serde::Serialize)]
pub struct NotificationOutcome {
    pub attempted: usize,
    pub sent: usize,
    pub failed: usize,
    pub failures: Vec<DeliveryFailure>,
}

impl NotificationOutcome {
    fn record(mut self, result: Result<EmailReceipt, DeliveryFailure>) -> Self {
        self.attempted += 1;
        match result {
            Ok(_) => self.sent += 1,
            Err(failure) => {
                self.failed += 1;
                self.failures.push(failure);
            }
        }
        self
    }

    pub fn has_failures(&self) -> bool {
        self.failed > 0
    }
}

/// Sends one email per eligible subscriber through a shared rate limiter.
pub struct Notifier {
    email_client: Arc<EmailClient>,
    rate_limiter: Arc<RateLimiter>,
    page_url: String,
    unsubscribe_endpoint: Url,
}

impl Notifier {
    pub fn new(
        email_client: Arc<EmailClient>,
        rate_limiter: Arc<RateLimiter>,
        page_url: String,
        app_base_url: &str,
    ) -> Result<Notifier, String> {
        let unsubscribe_endpoint = Url::parse(&format!(
            "{}/idu/unsubscribe",
            app_base_url.trim_end_matches('/')
        ))
        .map_err(|err| format!("{} is not a valid base url: {}", app_base_url, err))?;

        Ok(Notifier {
            email_client,
            rate_limiter,
            page_url,
            unsubscribe_endpoint,
        })
    }

    pub fn unsubscribe_link(&self, email: &SubscriberEmail) -> String {
        let mut link = self.unsubscribe_endpoint.clone();
        link.query_pairs_mut().append_pair("email", email.as_ref());
        link.to_string()
    }

    /// All eligible sends are issued at once; the limiter paces actual delivery.
    /// A failing subscriber never stops the others.
    #[tracing::instrument(
        name = "Notifying subscribers",
        skip(self, subscribers, observation, previous),
        fields(subscribers = subscribers.len())
    )]
    pub async fn notify<O: Observation>(
        &self,
        subscribers: &[Subscriber],
        observation: &O,
        previous: Option<&str>,
        changed: bool,
    ) -> NotificationOutcome {
        let sends = subscribers
            .iter()
            .filter(|subscriber| is_eligible(subscriber, changed))
            .map(|subscriber| self.send_one(subscriber, observation, previous, changed));

        let outcome = join_all(sends)
            .await
            .into_iter()
            .fold(NotificationOutcome::default(), NotificationOutcome::record);

        tracing::info!(
            attempted = outcome.attempted,
            sent = outcome.sent,
            failed = outcome.failed,
            "Finished notifying subscribers"
        );

        outcome
    }

    async fn send_one<O: Observation>(
        &self,
        subscriber: &Subscriber,
        observation: &O,
        previous: Option<&str>,
        changed: bool,
    ) -> Result<EmailReceipt, DeliveryFailure> {
        self.rate_limiter.acquire().await;

        let unsubscribe_url = self.unsubscribe_link(&subscriber.email);
        let email = observation.compose_email(&EmailContext {
            previous,
            changed,
            page_url: &self.page_url,
            unsubscribe_url: &unsubscribe_url,
        });

        self.email_client
            .send_email(&subscriber.email, &email.subject, &email.html)
            .await
            .map_err(|err| {
                tracing::error!(
                    "Failed to send an email to {}: {:?}",
                    subscriber.email.as_ref(),
                    err
                );
                DeliveryFailure {
                    email: subscriber.email.as_ref().to_string(),
                    error: err.to_string(),
                }
            })
    }
}
