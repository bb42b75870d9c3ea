//! Ingestion pipeline.
//!
//! One pass walks the remote collection from the configured start URL,
//! following each page's `links.next` until a page has none. Every record on
//! a page is normalized and upserted before the next page is requested, so
//! memory use is bounded by one page.
//!
//! A page that fails to fetch or decode is retried in place; the cursor never
//! advances past a page that has not been processed. By default retries are
//! unbounded. With `max_page_attempts` set the pass is abandoned instead,
//! leaving every record written so far intact.

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use tracing::{info, warn};

use crate::config::Config;
use crate::db;
use crate::error::IngestionError;
use crate::index::{RecordIndex, SqliteIndex};
use crate::models::{Page, Record};
use crate::remote::{HttpPageFetcher, PageFetcher};

/// Per-pass behavior, usually derived from `[remote]` and `[sync]`.
#[derive(Debug, Clone)]
pub struct IngestOptions {
    pub start_url: String,
    pub retry_delay: Duration,
    /// `None` retries a failing page forever.
    pub max_page_attempts: Option<u32>,
    pub prune_missing: bool,
}

impl IngestOptions {
    pub fn from_config(config: &Config) -> Self {
        Self {
            start_url: config.remote.start_url.clone(),
            retry_delay: config.sync.retry_delay(),
            max_page_attempts: config.sync.max_page_attempts(),
            prune_missing: config.sync.prune_missing,
        }
    }
}

/// Counts from a completed pass.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PassSummary {
    pub pages: u64,
    pub records: u64,
    pub failed_fetches: u64,
    pub pruned: u64,
}

pub struct IngestionPipeline {
    fetcher: Arc<dyn PageFetcher>,
    index: Arc<dyn RecordIndex>,
    options: IngestOptions,
}

impl IngestionPipeline {
    pub fn new(
        fetcher: Arc<dyn PageFetcher>,
        index: Arc<dyn RecordIndex>,
        options: IngestOptions,
    ) -> Self {
        Self {
            fetcher,
            index,
            options,
        }
    }

    /// Runs one full pass over the remote collection.
    ///
    /// Returns once a page declares no next link. Index write failures end
    /// the pass immediately; fetch failures are retried as configured.
    pub async fn run_once(&self) -> Result<PassSummary, IngestionError> {
        let mut summary = PassSummary::default();
        let mut seen: HashSet<String> = HashSet::new();
        let mut next = Some(self.options.start_url.clone());

        while let Some(url) = next {
            let page = self.fetch_with_retry(&url, &mut summary).await?;
            let count = page.data.len() as u64;

            for remote in page.data {
                let record = Record::from(remote);
                self.index.upsert(&record).await?;
                if self.options.prune_missing {
                    seen.insert(record.id);
                }
            }

            info!(url = %url, records = count, "Inserted page");
            summary.pages += 1;
            summary.records += count;
            next = page.links.next.filter(|n| !n.is_empty());
        }

        if self.options.prune_missing {
            summary.pruned = self.index.prune_except(&seen).await?;
        }

        info!(
            pages = summary.pages,
            records = summary.records,
            failed_fetches = summary.failed_fetches,
            pruned = summary.pruned,
            "Sync pass complete"
        );
        Ok(summary)
    }

    async fn fetch_with_retry(
        &self,
        url: &str,
        summary: &mut PassSummary,
    ) -> Result<Page, IngestionError> {
        let mut attempts = 0u32;
        loop {
            info!(url = %url, "Fetching page");
            let err = match self.fetcher.fetch_page(url).await {
                Ok(page) => return Ok(page),
                Err(err) => err,
            };

            attempts += 1;
            summary.failed_fetches += 1;

            match self.options.max_page_attempts {
                Some(max) if attempts >= max => {
                    return Err(IngestionError::PageAbandoned {
                        url: url.to_string(),
                        attempts,
                        source: err,
                    });
                }
                _ => warn!(
                    url = %url,
                    attempt = attempts,
                    error = %err,
                    "Page fetch failed, retrying"
                ),
            }

            if self.options.retry_delay.is_zero() {
                tokio::task::yield_now().await;
            } else {
                tokio::time::sleep(self.options.retry_delay).await;
            }
        }
    }
}

/// Builds the production pipeline: HTTP fetcher plus the SQLite index.
pub async fn build_pipeline(config: &Config) -> Result<(IngestionPipeline, SqliteIndex)> {
    let pool = db::connect(config).await?;
    let index = SqliteIndex::new(pool).with_limit(config.search.limit());
    index.ensure_schema().await?;

    let fetcher = HttpPageFetcher::new(&config.remote)?;
    let pipeline = IngestionPipeline::new(
        Arc::new(fetcher),
        Arc::new(index.clone()),
        IngestOptions::from_config(config),
    );
    Ok((pipeline, index))
}

/// `valsearch sync`: one pass in the foreground, ignoring the freshness window.
pub async fn run_sync(config: &Config) -> Result<()> {
    let (pipeline, index) = build_pipeline(config).await?;
    let summary = pipeline.run_once().await?;

    println!("sync");
    println!("  pages: {}", summary.pages);
    println!("  upserted records: {}", summary.records);
    println!("  failed fetches: {}", summary.failed_fetches);
    if config.sync.prune_missing {
        println!("  pruned records: {}", summary.pruned);
    }
    println!("  indexed total: {}", index.count().await?);
    println!("ok");

    index.pool().close().await;
    Ok(())
}
