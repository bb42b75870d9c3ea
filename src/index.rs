//! Full-text record index.
//!
//! The [`RecordIndex`] trait is the storage seam used by the ingestion
//! pipeline and the query service. [`SqliteIndex`] implements it on top of a
//! single SQLite FTS5 virtual table:
//!
//! ```text
//! records(id, handle, name, normalized_name, body)   -- fts5
//! ```
//!
//! FTS5 tables have no primary key, so "one row per id" is kept by
//! [`upsert`](RecordIndex::upsert) deleting and re-inserting inside one
//! transaction.

use std::collections::HashSet;

use async_trait::async_trait;
use sqlx::{Row, SqlitePool};

use crate::error::IndexError;
use crate::models::Record;

/// Storage operations the sync and query paths need.
///
/// | Method | Purpose |
/// |--------|---------|
/// | [`ensure_schema`](RecordIndex::ensure_schema) | Create the table if absent (idempotent) |
/// | [`upsert`](RecordIndex::upsert) | Replace the row for `record.id` |
/// | [`search`](RecordIndex::search) | Ranked full-text query |
/// | [`find_by_id`](RecordIndex::find_by_id) | Every row stored under an id |
/// | [`prune_except`](RecordIndex::prune_except) | Drop rows whose id is not in a set |
/// | [`count`](RecordIndex::count) | Total rows |
#[async_trait]
pub trait RecordIndex: Send + Sync {
    async fn ensure_schema(&self) -> Result<(), IndexError>;

    /// Deletes any row with `record.id`, then inserts `record`.
    async fn upsert(&self, record: &Record) -> Result<(), IndexError>;

    /// Returns matching records, most relevant first.
    ///
    /// An empty or whitespace-only query matches nothing. A query the
    /// matcher cannot parse yields [`IndexError::InvalidQuery`].
    async fn search(&self, query: &str) -> Result<Vec<Record>, IndexError>;

    async fn find_by_id(&self, id: &str) -> Result<Vec<Record>, IndexError>;

    /// Deletes every row whose id is not in `keep`. Returns the number removed.
    async fn prune_except(&self, keep: &HashSet<String>) -> Result<u64, IndexError>;

    async fn count(&self) -> Result<i64, IndexError>;
}

/// SQLite FTS5 implementation of [`RecordIndex`].
#[derive(Clone)]
pub struct SqliteIndex {
    pool: SqlitePool,
    limit: Option<u32>,
}

impl SqliteIndex {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool, limit: None }
    }

    /// Caps the number of rows [`search`](RecordIndex::search) returns.
    pub fn with_limit(mut self, limit: Option<u32>) -> Self {
        self.limit = limit;
        self
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}

fn row_to_record(row: &sqlx::sqlite::SqliteRow) -> Record {
    Record {
        id: row.get("id"),
        handle: row.get("handle"),
        name: row.get("name"),
        normalized_name: row.get("normalized_name"),
        body: row.get("body"),
    }
}

/// Separates FTS5 query syntax errors from real storage failures.
fn classify_query_error(err: sqlx::Error) -> IndexError {
    if let sqlx::Error::Database(ref db_err) = err {
        let msg = db_err.message();
        if msg.starts_with("fts5:")
            || msg.contains("syntax error")
            || msg.starts_with("no such column")
            || msg.starts_with("unterminated string")
        {
            return IndexError::InvalidQuery(msg.to_string());
        }
    }
    IndexError::Storage(err)
}

#[async_trait]
impl RecordIndex for SqliteIndex {
    async fn ensure_schema(&self) -> Result<(), IndexError> {
        sqlx::query(
            r#"
            CREATE VIRTUAL TABLE IF NOT EXISTS records USING fts5(
                id,
                handle,
                name,
                normalized_name,
                body
            )
            "#,
        )
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn upsert(&self, record: &Record) -> Result<(), IndexError> {
        let mut tx = self.pool.begin().await?;

        sqlx::query("DELETE FROM records WHERE id = ?")
            .bind(&record.id)
            .execute(&mut *tx)
            .await?;

        sqlx::query(
            "INSERT INTO records (id, handle, name, normalized_name, body) VALUES (?, ?, ?, ?, ?)",
        )
        .bind(&record.id)
        .bind(&record.handle)
        .bind(&record.name)
        .bind(&record.normalized_name)
        .bind(&record.body)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(())
    }

    async fn search(&self, query: &str) -> Result<Vec<Record>, IndexError> {
        if query.trim().is_empty() {
            return Ok(Vec::new());
        }

        // LIMIT -1 is "no limit" in SQLite
        let limit = self.limit.map(i64::from).unwrap_or(-1);

        let rows = sqlx::query(
            r#"
            SELECT id, handle, name, normalized_name, body
            FROM records
            WHERE records MATCH ?
            ORDER BY rank
            LIMIT ?
            "#,
        )
        .bind(query)
        .bind(limit)
        .fetch_all(&self.pool)
        .await
        .map_err(classify_query_error)?;

        Ok(rows.iter().map(row_to_record).collect())
    }

    async fn find_by_id(&self, id: &str) -> Result<Vec<Record>, IndexError> {
        let rows = sqlx::query(
            "SELECT id, handle, name, normalized_name, body FROM records WHERE id = ?",
        )
        .bind(id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.iter().map(row_to_record).collect())
    }

    async fn prune_except(&self, keep: &HashSet<String>) -> Result<u64, IndexError> {
        let ids: Vec<String> = sqlx::query_scalar("SELECT id FROM records")
            .fetch_all(&self.pool)
            .await?;

        let stale: Vec<&String> = ids.iter().filter(|id| !keep.contains(*id)).collect();
        if stale.is_empty() {
            return Ok(0);
        }

        let mut tx = self.pool.begin().await?;
        let mut removed = 0u64;
        for id in stale {
            let result = sqlx::query("DELETE FROM records WHERE id = ?")
                .bind(id)
                .execute(&mut *tx)
                .await?;
            removed += result.rows_affected();
        }
        tx.commit().await?;

        Ok(removed)
    }

    async fn count(&self) -> Result<i64, IndexError> {
        let n: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM records")
            .fetch_one(&self.pool)
            .await?;
        Ok(n)
    }
}
