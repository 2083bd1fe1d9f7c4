//! Persistence of scan results
//!
//! Every non-empty cycle outcome is handed to a [`PersistenceSink`]. The scheduler
//! logs and discards storage failures; nothing is retried.
//!
//! [`SqliteResultStore`] keeps matches in a single `results` table:
//!
//! | column    | type | notes                 |
//! |-----------|------|-----------------------|
//! | id        | TEXT | primary key (UUID v4) |
//! | url       | TEXT | endpoint              |
//! | content   | TEXT | excerpt               |
//! | timestamp | TEXT | RFC 3339, UTC, micros |

use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, Utc};
use rusqlite::{params, Connection};
use std::path::Path;
use std::sync::{Arc, Mutex};
use thiserror::Error;
use uuid::Uuid;

use crate::models::{ScanOutcome, ScrapeResult};

/// Errors raised by result storage
#[derive(Error, Debug)]
pub enum StorageError {
    /// SQLite failure
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// Filesystem failure (creating the database directory)
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Stored row could not be decoded
    #[error("Corrupt row: {0}")]
    CorruptRow(String),

    /// Connection mutex poisoned or blocking task failed
    #[error("Storage unavailable: {0}")]
    Unavailable(String),
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// Destination for the matches of one cycle
#[async_trait]
pub trait PersistenceSink: Send + Sync {
    /// Persist every result of `outcome`, all or nothing
    async fn store(&self, outcome: &ScanOutcome) -> StorageResult<()>;
}

/// SQLite-backed result store
#[derive(Clone)]
pub struct SqliteResultStore {
    conn: Arc<Mutex<Connection>>,
}

impl SqliteResultStore {
    /// Open (or create) the database at `path`
    pub fn open(path: impl AsRef<Path>) -> StorageResult<Self> {
        let path = path.as_ref();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }

        let conn = Connection::open(path)?;
        Self::with_connection(conn)
    }

    /// Open a private in-memory database
    pub fn in_memory() -> StorageResult<Self> {
        Self::with_connection(Connection::open_in_memory()?)
    }

    fn with_connection(conn: Connection) -> StorageResult<Self> {
        conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS results (
                id TEXT PRIMARY KEY,
                url TEXT NOT NULL,
                content TEXT NOT NULL,
                timestamp TEXT NOT NULL
            );
            CREATE INDEX IF NOT EXISTS idx_results_timestamp ON results(timestamp);",
        )?;

        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// Insert all results in one transaction
    pub fn insert_all(&self, results: &[ScrapeResult]) -> StorageResult<usize> {
        let mut conn = self.lock()?;
        let tx = conn.transaction()?;

        {
            let mut stmt = tx.prepare(
                "INSERT INTO results (id, url, content, timestamp) VALUES (?1, ?2, ?3, ?4)",
            )?;
            for result in results {
                stmt.execute(params![
                    Uuid::new_v4().to_string(),
                    result.url,
                    result.content,
                    result.timestamp.to_rfc3339_opts(SecondsFormat::Micros, true),
                ])?;
            }
        }

        tx.commit()?;
        Ok(results.len())
    }

    /// Most recent results, newest first
    pub fn recent(&self, limit: usize) -> StorageResult<Vec<ScrapeResult>> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare(
            "SELECT url, content, timestamp FROM results ORDER BY timestamp DESC LIMIT ?1",
        )?;

        let rows = stmt.query_map(params![limit as i64], |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, String>(2)?,
            ))
        })?;

        let mut results = Vec::new();
        for row in rows {
            let (url, content, timestamp) = row?;
            let timestamp = DateTime::parse_from_rfc3339(&timestamp)
                .map_err(|e| StorageError::CorruptRow(format!("timestamp '{timestamp}': {e}")))?
                .with_timezone(&Utc);
            results.push(ScrapeResult {
                url,
                content,
                timestamp,
            });
        }

        Ok(results)
    }

    /// Total number of stored results
    pub fn count(&self) -> StorageResult<usize> {
        let conn = self.lock()?;
        let count: i64 = conn.query_row("SELECT COUNT(*) FROM results", [], |row| row.get(0))?;
        Ok(count as usize)
    }

    fn lock(&self) -> StorageResult<std::sync::MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|e| StorageError::Unavailable(format!("connection lock poisoned: {e}")))
    }
}

#[async_trait]
impl PersistenceSink for SqliteResultStore {
    async fn store(&self, outcome: &ScanOutcome) -> StorageResult<()> {
        let store = self.clone();
        let results = outcome.results().to_vec();

        let inserted = tokio::task::spawn_blocking(move || store.insert_all(&results))
            .await
            .map_err(|e| StorageError::Unavailable(format!("storage task failed: {e}")))??;

        tracing::info!(count = inserted, "Results saved to database");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn result_at(url: &str, minutes_ago: i64) -> ScrapeResult {
        ScrapeResult {
            url: url.to_string(),
            content: format!("content of {url}"),
            timestamp: Utc::now() - Duration::minutes(minutes_ago),
        }
    }

    #[test]
    fn test_insert_and_count() {
        let store = SqliteResultStore::in_memory().unwrap();
        assert_eq!(store.count().unwrap(), 0);

        let inserted = store
            .insert_all(&[result_at("http://a.onion", 1), result_at("http://b.onion", 2)])
            .unwrap();

        assert_eq!(inserted, 2);
        assert_eq!(store.count().unwrap(), 2);
    }

    #[test]
    fn test_recent_is_newest_first() {
        let store = SqliteResultStore::in_memory().unwrap();
        store
            .insert_all(&[
                result_at("http://old.onion", 30),
                result_at("http://new.onion", 1),
                result_at("http://mid.onion", 10),
            ])
            .unwrap();

        let recent = store.recent(2).unwrap();
        assert_eq!(recent.len(), 2);
        assert_eq!(recent[0].url, "http://new.onion");
        assert_eq!(recent[1].url, "http://mid.onion");
    }

    #[test]
    fn test_same_url_stored_per_match() {
        let store = SqliteResultStore::in_memory().unwrap();
        store.insert_all(&[result_at("http://a.onion", 5)]).unwrap();
        store.insert_all(&[result_at("http://a.onion", 1)]).unwrap();
        assert_eq!(store.count().unwrap(), 2);
    }

    #[tokio::test]
    async fn test_store_outcome() {
        let store = SqliteResultStore::in_memory().unwrap();
        let outcome: ScanOutcome = vec![result_at("http://a.onion", 0)].into_iter().collect();

        store.store(&outcome).await.unwrap();

        let recent = store.recent(10).unwrap();
        assert_eq!(recent.len(), 1);
        assert_eq!(recent[0].content, "content of http://a.onion");
    }

    #[test]
    fn test_open_creates_parent_directory() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("results.db");

        let store = SqliteResultStore::open(&path).unwrap();
        store.insert_all(&[result_at("http://a.onion", 0)]).unwrap();

        let reopened = SqliteResultStore::open(&path).unwrap();
        assert_eq!(reopened.count().unwrap(), 1);
    }
}
