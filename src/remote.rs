//! Access to the remote paginated collection.
//!
//! The ingestion pipeline only depends on [`PageFetcher`]; production uses
//! [`HttpPageFetcher`], tests substitute scripted fetchers.

use std::time::Duration;

use async_trait::async_trait;

use crate::config::RemoteConfig;
use crate::error::FetchError;
use crate::models::Page;

/// Fetches and decodes a single page by URL.
#[async_trait]
pub trait PageFetcher: Send + Sync {
    async fn fetch_page(&self, url: &str) -> Result<Page, FetchError>;
}

/// [`PageFetcher`] over HTTP with `reqwest`.
///
/// The body is read as text and decoded separately so a malformed page is
/// reported as [`FetchError::Parse`] with the offending URL.
pub struct HttpPageFetcher {
    client: reqwest::Client,
}

impl HttpPageFetcher {
    pub fn new(config: &RemoteConfig) -> Result<Self, FetchError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .user_agent(concat!("valsearch/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self { client })
    }

    pub fn with_client(client: reqwest::Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl PageFetcher for HttpPageFetcher {
    async fn fetch_page(&self, url: &str) -> Result<Page, FetchError> {
        let resp = self.client.get(url).send().await?;

        let status = resp.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        let body = resp.text().await?;
        serde_json::from_str(&body).map_err(|source| FetchError::Parse {
            url: url.to_string(),
            source,
        })
    }
}
