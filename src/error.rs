//! Typed errors for the sync-and-index core.
//!
//! Application edges (config, CLI, server startup) use `anyhow`; the core
//! components return these so callers can tell a transient page failure
//! from a storage failure from a malformed search query.

use thiserror::Error;

/// Failure to obtain one page from the remote collection.
///
/// Always treated as transient by the ingestion pipeline.
#[derive(Error, Debug)]
pub enum FetchError {
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("{url} returned HTTP {status}")]
    Status { url: String, status: u16 },

    #[error("malformed page from {url}: {source}")]
    Parse {
        url: String,
        #[source]
        source: serde_json::Error,
    },
}

/// Failure reported by a [`RecordIndex`](crate::index::RecordIndex).
#[derive(Error, Debug)]
pub enum IndexError {
    /// The full-text matcher rejected the query string.
    #[error("invalid search query: {0}")]
    InvalidQuery(String),

    #[error("index storage error: {0}")]
    Storage(#[from] sqlx::Error),
}

/// Reasons an ingestion pass ends without reaching the last page.
#[derive(Error, Debug)]
pub enum IngestionError {
    #[error(transparent)]
    Index(#[from] IndexError),

    #[error("gave up on {url} after {attempts} attempts: {source}")]
    PageAbandoned {
        url: String,
        attempts: u32,
        #[source]
        source: FetchError,
    },
}
