use reqwest::{header, Client, StatusCode};
use std::time;

const USER_AGENT: &str = "Mozilla/5.0 (compatible; IDU-Watcher/1.0)";

/// Downloads the watched page. No caching, no retries.
pub struct PageFetcher {
    http_client: Client,
}

#[derive(thiserror::Error, Debug)]
pub enum FetchError {
    #[error("Fetch failed: {0}")]
    Status(StatusCode),
    #[error("Failed to reach the target page.")]
    Transport(#[from] reqwest::Error),
}

impl PageFetcher {
    pub fn new(timeout: Option<time::Duration>) -> Result<PageFetcher, reqwest::Error> {
        let mut builder = Client::builder().user_agent(USER_AGENT);

        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }

        Ok(PageFetcher {
            http_client: builder.build()?,
        })
    }

    #[tracing::instrument(name = "Fetching the target page", skip(self))]
    pub async fn fetch(&self, url: &str) -> Result<String, FetchError> {
        let response = self
            .http_client
            .get(url)
            // Avoid caching proxies returning stale HTML
            .header(header::CACHE_CONTROL, "no-cache")
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status(status));
        }

        Ok(response.text().await?)
    }
}
