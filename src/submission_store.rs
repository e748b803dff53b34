//! Subscriber and contact-form records.
//!
//! Records are append-only. Unsubscribing stamps `unsubscribed_at` on every
//! record of an email and never deletes anything.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{PgPool, Row};
use std::collections::HashSet;
use std::sync::{Mutex, PoisonError};
use uuid::Uuid;

use crate::config::StaticSubscriber;
use crate::domain::contact_submission::{ContactSubmission, CONTACT_SOURCE};
use crate::domain::daily_updates::parse_wants_daily_updates;
use crate::domain::idu_submission::IduSubmission;
use crate::domain::subscriber::Subscriber;
use crate::domain::subscriber_email::SubscriberEmail;

#[derive(thiserror::Error, Debug)]
pub enum SubmissionStoreError {
    #[error("Failed to query the submissions database.")]
    Database(#[from] sqlx::Error),
}

#[async_trait]
pub trait SubmissionStore: Send + Sync {
    async fn save_idu_submission(
        &self,
        submission: &IduSubmission,
    ) -> Result<Uuid, SubmissionStoreError>;

    async fn save_contact_submission(
        &self,
        submission: &ContactSubmission,
    ) -> Result<Uuid, SubmissionStoreError>;

    /// Mailing list for one notification run: one entry per email, latest record wins.
    async fn list_active_subscribers(&self) -> Result<Vec<Subscriber>, SubmissionStoreError>;

    /// Returns how many records were marked.
    async fn unsubscribe(
        &self,
        email: &SubscriberEmail,
        message: Option<&str>,
    ) -> Result<u64, SubmissionStoreError>;
}

/// Older records carry no boolean preference, only the free-text answer in `message`.
fn resolve_wants_daily_updates(flag: Option<bool>, message: Option<&str>) -> bool {
    flag.unwrap_or_else(|| message.map(parse_wants_daily_updates).unwrap_or(false))
}

fn clean_unsubscribe_message(message: Option<&str>) -> Option<String> {
    message
        .map(str::trim)
        .filter(|message| !message.is_empty())
        .map(String::from)
}

/// Emails differing only in letter case belong to the same person.
fn email_key(email: &str) -> String {
    email.to_lowercase()
}

/// Builds the mailing list from records ordered newest first.
fn mailing_list<'a>(
    records: impl Iterator<Item = (&'a str, Option<bool>, Option<&'a str>)>,
) -> Vec<Subscriber> {
    let mut seen = HashSet::new();

    records
        .filter_map(|(email, flag, message)| match SubscriberEmail::parse(email.to_string()) {
            Ok(email) => Some(Subscriber::new(
                email,
                resolve_wants_daily_updates(flag, message),
            )),
            Err(err) => {
                tracing::warn!("Skipping stored submission with invalid email: {}", err);
                None
            }
        })
        .filter(|subscriber| seen.insert(email_key(subscriber.email.as_ref())))
        .collect()
}

pub struct PgSubmissionStore {
    db_pool: PgPool,
}

impl PgSubmissionStore {
    pub fn new(db_pool: PgPool) -> Self {
        Self { db_pool }
    }
}

#[async_trait]
impl SubmissionStore for PgSubmissionStore {
    #[tracing::instrument(
        name = "Insert a new IDU submission into the database",
        skip(self, submission),
        fields(subscriber_email = %submission.email)
    )]
    async fn save_idu_submission(
        &self,
        submission: &IduSubmission,
    ) -> Result<Uuid, SubmissionStoreError> {
        let id = Uuid::new_v4();

        sqlx::query(
            r#"
            INSERT INTO idu_submissions (id, name, email, wants_daily_updates, message, created_at)
            VALUES ($1, $2, $3, $4, $5, $6)
            "#,
        )
        .bind(id)
        .bind(submission.name.as_ref())
        .bind(submission.email.as_ref())
        .bind(submission.wants_daily_updates)
        .bind(submission.message.as_deref())
        .bind(Utc::now())
        .execute(&self.db_pool)
        .await
        .map_err(|err| {
            tracing::error!("Failed to execute query: {:?}", err);
            err
        })?;

        Ok(id)
    }

    #[tracing::instrument(
        name = "Insert a new contact submission into the database",
        skip(self, submission),
        fields(contact_email = %submission.email)
    )]
    async fn save_contact_submission(
        &self,
        submission: &ContactSubmission,
    ) -> Result<Uuid, SubmissionStoreError> {
        let id = Uuid::new_v4();

        sqlx::query(
            r#"
            INSERT INTO contact_submissions (id, name, email, subject, message, source, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            "#,
        )
        .bind(id)
        .bind(submission.name.as_ref())
        .bind(submission.email.as_ref())
        .bind(&submission.subject)
        .bind(&submission.message)
        .bind(CONTACT_SOURCE)
        .bind(Utc::now())
        .execute(&self.db_pool)
        .await
        .map_err(|err| {
            tracing::error!("Failed to execute query: {:?}", err);
            err
        })?;

        Ok(id)
    }

    #[tracing::instrument(name = "Get active IDU subscribers", skip(self))]
    async fn list_active_subscribers(&self) -> Result<Vec<Subscriber>, SubmissionStoreError> {
        let rows = sqlx::query(
            r#"
            SELECT email, wants_daily_updates, message
            FROM idu_submissions
            WHERE unsubscribed_at IS NULL
            ORDER BY created_at DESC
            "#,
        )
        .fetch_all(&self.db_pool)
        .await?;

        let mut records = Vec::with_capacity(rows.len());
        for row in &rows {
            let email: String = row.try_get("email")?;
            let flag: Option<bool> = row.try_get("wants_daily_updates")?;
            let message: Option<String> = row.try_get("message")?;
            records.push((email, flag, message));
        }

        Ok(mailing_list(records.iter().map(|(email, flag, message)| {
            (email.as_str(), *flag, message.as_deref())
        })))
    }

    #[tracing::instrument(
        name = "Unsubscribe an email from IDU updates",
        skip(self, message),
        fields(subscriber_email = %email)
    )]
    async fn unsubscribe(
        &self,
        email: &SubscriberEmail,
        message: Option<&str>,
    ) -> Result<u64, SubmissionStoreError> {
        let result = sqlx::query(
            r#"
            UPDATE idu_submissions
            SET unsubscribed_at = $1,
                unsubscribe_message = COALESCE($2, unsubscribe_message)
            WHERE lower(email) = lower($3)
            "#,
        )
        .bind(Utc::now())
        .bind(clean_unsubscribe_message(message))
        .bind(email.as_ref())
        .execute(&self.db_pool)
        .await?;

        Ok(result.rows_affected())
    }
}

#[derive(Debug, Clone)]
pub struct StoredIduSubmission {
    pub id: Uuid,
    pub name: Option<String>,
    pub email: String,
    pub wants_daily_updates: Option<bool>,
    pub message: Option<String>,
    pub created_at: DateTime<Utc>,
    pub unsubscribed_at: Option<DateTime<Utc>>,
    pub unsubscribe_message: Option<String>,
}

#[derive(Debug, Clone)]
pub struct StoredContactSubmission {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub subject: String,
    pub message: String,
    pub source: &'static str,
    pub created_at: DateTime<Utc>,
}

/// Process-local records, optionally seeded from the static mailing list in configuration.
#[derive(Default)]
pub struct InMemorySubmissionStore {
    idu_submissions: Mutex<Vec<StoredIduSubmission>>,
    contact_submissions: Mutex<Vec<StoredContactSubmission>>,
}

impl InMemorySubmissionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn seeded(subscribers: &[StaticSubscriber]) -> Self {
        let now = Utc::now();
        let records = subscribers
            .iter()
            .map(|subscriber| StoredIduSubmission {
                id: Uuid::new_v4(),
                name: None,
                email: subscriber.email.trim().to_string(),
                wants_daily_updates: Some(subscriber.wants_daily_updates),
                message: None,
                created_at: now,
                unsubscribed_at: None,
                unsubscribe_message: None,
            })
            .collect();

        Self {
            idu_submissions: Mutex::new(records),
            contact_submissions: Mutex::default(),
        }
    }

    pub fn idu_submissions(&self) -> Vec<StoredIduSubmission> {
        self.idu_submissions
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn contact_submissions(&self) -> Vec<StoredContactSubmission> {
        self.contact_submissions
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

#[async_trait]
impl SubmissionStore for InMemorySubmissionStore {
    async fn save_idu_submission(
        &self,
        submission: &IduSubmission,
    ) -> Result<Uuid, SubmissionStoreError> {
        let id = Uuid::new_v4();
        let mut records = self
            .idu_submissions
            .lock()
            .unwrap_or_else(PoisonError::into_inner);

        records.push(StoredIduSubmission {
            id,
            name: Some(submission.name.as_ref().to_string()),
            email: submission.email.as_ref().to_string(),
            wants_daily_updates: Some(submission.wants_daily_updates),
            message: submission.message.clone(),
            created_at: Utc::now(),
            unsubscribed_at: None,
            unsubscribe_message: None,
        });

        Ok(id)
    }

    async fn save_contact_submission(
        &self,
        submission: &ContactSubmission,
    ) -> Result<Uuid, SubmissionStoreError> {
        let id = Uuid::new_v4();
        let mut records = self
            .contact_submissions
            .lock()
            .unwrap_or_else(PoisonError::into_inner);

        records.push(StoredContactSubmission {
            id,
            name: submission.name.as_ref().to_string(),
            email: submission.email.as_ref().to_string(),
            subject: submission.subject.clone(),
            message: submission.message.clone(),
            source: CONTACT_SOURCE,
            created_at: Utc::now(),
        });

        Ok(id)
    }

    async fn list_active_subscribers(&self) -> Result<Vec<Subscriber>, SubmissionStoreError> {
        let records = self
            .idu_submissions
            .lock()
            .unwrap_or_else(PoisonError::into_inner);

        // Insertion order is creation order
        Ok(mailing_list(
            records
                .iter()
                .rev()
                .filter(|record| record.unsubscribed_at.is_none())
                .map(|record| {
                    (
                        record.email.as_str(),
                        record.wants_daily_updates,
                        record.message.as_deref(),
                    )
                }),
        ))
    }

    async fn unsubscribe(
        &self,
        email: &SubscriberEmail,
        message: Option<&str>,
    ) -> Result<u64, SubmissionStoreError> {
        let now = Utc::now();
        let message = clean_unsubscribe_message(message);
        let mut records = self
            .idu_submissions
            .lock()
            .unwrap_or_else(PoisonError::into_inner);

        let key = email_key(email.as_ref());
        let mut affected = 0;
        for record in records
            .iter_mut()
            .filter(|record| email_key(&record.email) == key)
        {
            record.unsubscribed_at = Some(now);
            if message.is_some() {
                record.unsubscribe_message = message.clone();
            }
            affected += 1;
        }

        Ok(affected)
    }
}
