//! Query service: user search string in, ranked records out.

use std::sync::Arc;

use anyhow::Result;
use tracing::{error, warn};

use crate::config::Config;
use crate::db;
use crate::error::IndexError;
use crate::index::{RecordIndex, SqliteIndex};
use crate::models::Record;

#[derive(Clone)]
pub struct QueryService {
    index: Arc<dyn RecordIndex>,
}

impl QueryService {
    pub fn new(index: Arc<dyn RecordIndex>) -> Self {
        Self { index }
    }

    /// Runs `raw_query` against the index.
    ///
    /// An absent or empty query returns nothing without touching the index.
    /// Index errors (including unparseable queries) also yield an empty
    /// list so the search page always renders.
    pub async fn search(&self, raw_query: Option<&str>) -> Vec<Record> {
        let query = match raw_query {
            Some(q) if !q.is_empty() => q,
            _ => return Vec::new(),
        };

        match self.index.search(query).await {
            Ok(records) => records,
            Err(IndexError::InvalidQuery(msg)) => {
                warn!(query = %query, error = %msg, "Rejected search query");
                Vec::new()
            }
            Err(err) => {
                error!(query = %query, error = %err, "Search failed");
                Vec::new()
            }
        }
    }
}

/// `valsearch search <query>`: prints one line per match.
pub async fn run_search(config: &Config, query: &str) -> Result<()> {
    let pool = db::connect(config).await?;
    let index = SqliteIndex::new(pool).with_limit(config.search.limit());
    index.ensure_schema().await?;
    let service = QueryService::new(Arc::new(index.clone()));

    let results = service.search(Some(query)).await;
    if results.is_empty() {
        println!("No results.");
    } else {
        for (i, record) in results.iter().enumerate() {
            println!("{}. {}.{}  ({})", i + 1, record.handle, record.name, record.id);
        }
    }

    index.pool().close().await;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::collections::HashSet;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Counts searches and answers from a fixed script.
    struct CountingIndex {
        searches: AtomicUsize,
        reply: fn(&str) -> Result<Vec<Record>, IndexError>,
    }

    impl CountingIndex {
        fn new(reply: fn(&str) -> Result<Vec<Record>, IndexError>) -> Self {
            Self {
                searches: AtomicUsize::new(0),
                reply,
            }
        }
    }

    #[async_trait]
    impl RecordIndex for CountingIndex {
        async fn ensure_schema(&self) -> Result<(), IndexError> {
            Ok(())
        }
        async fn upsert(&self, _record: &Record) -> Result<(), IndexError> {
            Ok(())
        }
        async fn search(&self, query: &str) -> Result<Vec<Record>, IndexError> {
            self.searches.fetch_add(1, Ordering::SeqCst);
            (self.reply)(query)
        }
        async fn find_by_id(&self, _id: &str) -> Result<Vec<Record>, IndexError> {
            Ok(Vec::new())
        }
        async fn prune_except(&self, _keep: &HashSet<String>) -> Result<u64, IndexError> {
            Ok(0)
        }
        async fn count(&self) -> Result<i64, IndexError> {
            Ok(0)
        }
    }

    #[tokio::test]
    async fn test_empty_query_skips_index() {
        let index = Arc::new(CountingIndex::new(|_| panic!("index must not be queried")));
        let service = QueryService::new(index.clone());

        assert!(service.search(None).await.is_empty());
        assert!(service.search(Some("")).await.is_empty());
        assert_eq!(index.searches.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_results_pass_through_unmodified() {
        let index = Arc::new(CountingIndex::new(|q| {
            Ok(vec![
                Record::new("b", "bob", q, "second"),
                Record::new("a", "alice", q, "first"),
            ])
        }));
        let service = QueryService::new(index.clone());

        let results = service.search(Some("fooBar")).await;
        let ids: Vec<&str> = results.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, vec!["b", "a"]);
        assert_eq!(results[0].name, "fooBar");
        assert_eq!(index.searches.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_invalid_query_yields_empty() {
        let index = Arc::new(CountingIndex::new(|_| {
            Err(IndexError::InvalidQuery("fts5: syntax error".to_string()))
        }));
        let service = QueryService::new(index);
        assert!(service.search(Some("\"oops")).await.is_empty());
    }

    #[tokio::test]
    async fn test_storage_error_yields_empty() {
        let index = Arc::new(CountingIndex::new(|_| {
            Err(IndexError::Storage(sqlx::Error::PoolClosed))
        }));
        let service = QueryService::new(index);
        assert!(service.search(Some("anything")).await.is_empty());
    }
}
