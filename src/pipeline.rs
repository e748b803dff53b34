//! One check run: fetch, extract, compare, notify, persist.
//!
//! Runs are not coordinated with each other. Two runs started at the same
//! time can both read the old marker and both notify.

use std::sync::Arc;

use crate::extract::{Extractor, Observation};
use crate::fetcher::{FetchError, PageFetcher};
use crate::marker_store::{MarkerStore, MarkerStoreError};
use crate::notifier::{NotificationOutcome, Notifier};
use crate::submission_store::{SubmissionStore, SubmissionStoreError};

/// True when nothing was seen before or the value differs in any way.
pub fn detect_change(current: &str, previous: Option<&str>) -> bool {
    previous.map_or(true, |previous| previous != current)
}

/// Collaborators shared by every check variant.
#[derive(Clone)]
pub struct PipelineDependencies {
    pub fetcher: Arc<PageFetcher>,
    pub marker_store: Option<Arc<dyn MarkerStore>>,
    pub submissions: Arc<dyn SubmissionStore>,
    pub notifier: Arc<Notifier>,
    pub target_url: String,
}

pub struct Pipeline<E: Extractor> {
    extractor: E,
    marker_key: &'static str,
    default_marker: Option<String>,
    dependencies: PipelineDependencies,
}

#[derive(Debug, serde::Serialize)]
pub struct RunSummary<O> {
    pub changed: bool,
    pub previous: Option<String>,
    pub current: O,
    pub marker: String,
    pub notifications: NotificationOutcome,
}

#[derive(Debug)]
pub enum RunReport<O> {
    /// The page had nothing recognizable. No marker update, no emails.
    NothingFound,
    Completed(RunSummary<O>),
}

#[derive(thiserror::Error, Debug)]
pub enum PipelineError {
    #[error(transparent)]
    Fetch(#[from] FetchError),
    #[error("Failed to access the last-seen marker.")]
    MarkerStore(#[from] MarkerStoreError),
    #[error("Failed to list subscribers.")]
    Subscribers(#[from] SubmissionStoreError),
}

impl<E: Extractor> Pipeline<E> {
    /// `default_marker` stands in for the stored marker when no store is configured.
    pub fn new(
        extractor: E,
        marker_key: &'static str,
        default_marker: Option<String>,
        dependencies: PipelineDependencies,
    ) -> Self {
        Self {
            extractor,
            marker_key,
            default_marker,
            dependencies,
        }
    }

    #[tracing::instrument(name = "Running IDU check", skip(self), fields(marker_key = %self.marker_key))]
    pub async fn run(&self) -> Result<RunReport<E::Output>, PipelineError> {
        let deps = &self.dependencies;

        let html = deps.fetcher.fetch(&deps.target_url).await?;

        let observation = match self.extractor.extract(&html) {
            Some(observation) => observation,
            None => {
                tracing::warn!("Could not extract the watched value from the page.");
                return Ok(RunReport::NothingFound);
            }
        };
        let current = observation.marker();

        let previous = match &deps.marker_store {
            Some(store) => store.get(self.marker_key).await?,
            None => self.default_marker.clone(),
        };
        let changed = detect_change(&current, previous.as_deref());
        tracing::info!(
            changed,
            previous = ?previous,
            current = %current,
            "Compared against the last-seen marker"
        );

        let subscribers = deps.submissions.list_active_subscribers().await?;
        let notifications = deps
            .notifier
            .notify(&subscribers, &observation, previous.as_deref(), changed)
            .await;

        // Stored even when every send failed
        if let Some(store) = &deps.marker_store {
            store.set(self.marker_key, &current).await?;
        }

        Ok(RunReport::Completed(RunSummary {
            changed,
            previous,
            current: observation,
            marker: current,
            notifications,
        }))
    }
}
