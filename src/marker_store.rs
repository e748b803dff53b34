//! Last-seen marker persistence: one plain string per check variant.

use async_trait::async_trait;
use secrecy::{ExposeSecret, Secret};
use std::collections::HashMap;
use std::sync::{Mutex, PoisonError};

pub const DATE_MARKER_KEY: &str = "idu_last_seen_date";
pub const SCHEDULE_MARKER_KEY: &str = "idu_schedule_signature_v2";

#[derive(thiserror::Error, Debug)]
pub enum MarkerStoreError {
    #[error("Failed to talk to Redis.")]
    Redis(#[from] redis::RedisError),
}

/// Single mutable cell per key, read once and written once per run.
#[async_trait]
pub trait MarkerStore: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<String>, MarkerStoreError>;

    async fn set(&self, key: &str, value: &str) -> Result<(), MarkerStoreError>;
}

pub struct RedisMarkerStore {
    redis_client: redis::Client,
}

impl RedisMarkerStore {
    /// Does not connect until the first command is issued.
    pub fn new(uri: &Secret<String>) -> Result<Self, MarkerStoreError> {
        let redis_client = redis::Client::open(uri.expose_secret().as_str())?;

        Ok(Self { redis_client })
    }
}

#[async_trait]
impl MarkerStore for RedisMarkerStore {
    #[tracing::instrument(name = "Reading marker from Redis", skip(self))]
    async fn get(&self, key: &str) -> Result<Option<String>, MarkerStoreError> {
        let mut redis_conn = self.redis_client.get_tokio_connection().await?;

        let value: Option<String> = redis::cmd("GET")
            .arg(key)
            .query_async(&mut redis_conn)
            .await?;

        Ok(value)
    }

    #[tracing::instrument(name = "Storing marker in Redis", skip(self))]
    async fn set(&self, key: &str, value: &str) -> Result<(), MarkerStoreError> {
        let mut redis_conn = self.redis_client.get_tokio_connection().await?;

        redis::cmd("SET")
            .arg(key)
            .arg(value)
            .query_async::<_, ()>(&mut redis_conn)
            .await?;

        Ok(())
    }
}

/// Process-local store, lost on restart. Handy for local runs and tests.
#[derive(Default)]
pub struct InMemoryMarkerStore {
    markers: Mutex<HashMap<String, String>>,
}

impl InMemoryMarkerStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl MarkerStore for InMemoryMarkerStore {
    async fn get(&self, key: &str) -> Result<Option<String>, MarkerStoreError> {
        let markers = self.markers.lock().unwrap_or_else(PoisonError::into_inner);

        Ok(markers.get(key).cloned())
    }

    async fn set(&self, key: &str, value: &str) -> Result<(), MarkerStoreError> {
        let mut markers = self.markers.lock().unwrap_or_else(PoisonError::into_inner);
        markers.insert(key.to_string(), value.to_string());

        Ok(())
    }
}
