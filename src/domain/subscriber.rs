use chrono::{DateTime, Utc};

use crate::domain::subscriber_email::SubscriberEmail;

/// A mailing-list entry as seen by the notifier.
#[derive(Debug, Clone, serde::Serialize)]
pub struct Subscriber {
    pub email: SubscriberEmail,
    pub wants_daily_updates: bool,
    pub unsubscribed_at: Option<DateTime<Utc>>,
}

impl Subscriber {
    pub fn new(email: SubscriberEmail, wants_daily_updates: bool) -> Self {
        Self {
            email,
            wants_daily_updates,
            unsubscribed_at: None,
        }
    }

    pub fn is_active(&self) -> bool {
        self.unsubscribed_at.is_none()
    }
}
