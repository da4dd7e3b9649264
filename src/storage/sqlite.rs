//! SQLite Persistent Storage for Redemptions
//!
//! Durable storage for redemption records that survives service restarts.
//! Uses connection pooling via r2d2 for concurrent access. Every query runs
//! on the blocking pool so a slow disk never stalls other requests.

use async_trait::async_trait;
use r2d2::{Pool, PooledConnection};
use r2d2_sqlite::SqliteConnectionManager;
use rusqlite::{params, OptionalExtension};
use std::path::Path;
use std::time::Duration;

use super::traits::{RedemptionStore, StorageError, StorageResult};
use crate::types::RedemptionRecord;

/// How long a writer waits on a locked database before giving up
const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

// SQLITE_CONSTRAINT_PRIMARYKEY / SQLITE_CONSTRAINT_UNIQUE
const CONSTRAINT_PRIMARYKEY: i32 = 1555;
const CONSTRAINT_UNIQUE: i32 = 2067;

/// SQLite-backed redemption store with connection pooling
#[derive(Clone)]
pub struct SqliteRedemptionStore {
    pool: Pool<SqliteConnectionManager>,
}

impl SqliteRedemptionStore {
    /// Open (or create) the store at the given database path
    ///
    /// Creates the database file and runs migrations if needed.
    pub fn new<P: AsRef<Path>>(db_path: P) -> Result<Self, StorageError> {
        if let Some(parent) = db_path.as_ref().parent() {
            std::fs::create_dir_all(parent).ok();
        }

        let manager = SqliteConnectionManager::file(db_path)
            .with_init(|conn| conn.busy_timeout(BUSY_TIMEOUT));
        let pool = Pool::builder()
            .max_size(10)
            .build(manager)
            .map_err(|e| StorageError::Connection(e.to_string()))?;

        let store = Self { pool };
        store.run_migrations()?;

        Ok(store)
    }

    /// Create an in-memory store (for testing)
    pub fn in_memory() -> Result<Self, StorageError> {
        let manager = SqliteConnectionManager::memory();
        let pool = Pool::builder()
            .max_size(1)
            .build(manager)
            .map_err(|e| StorageError::Connection(e.to_string()))?;

        let store = Self { pool };
        store.run_migrations()?;

        Ok(store)
    }

    fn conn(&self) -> Result<PooledConnection<SqliteConnectionManager>, StorageError> {
        self.pool
            .get()
            .map_err(|e| StorageError::Connection(e.to_string()))
    }

    fn run_migrations(&self) -> Result<(), StorageError> {
        let conn = self.conn()?;

        conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS redemptions (
                transaction_id TEXT PRIMARY KEY,
                redeemed_by TEXT NOT NULL,
                redeemed_at INTEGER NOT NULL
            );

            CREATE INDEX IF NOT EXISTS idx_redemptions_redeemed_by ON redemptions(redeemed_by);
            "#,
        )
        .map_err(|e| StorageError::Database(e.to_string()))?;

        Ok(())
    }

    fn row_to_record(row: &rusqlite::Row) -> rusqlite::Result<RedemptionRecord> {
        Ok(RedemptionRecord {
            transaction_id: row.get("transaction_id")?,
            redeemed_by: row.get("redeemed_by")?,
            redeemed_at: row.get::<_, i64>("redeemed_at")? as u64,
        })
    }

    /// Run a synchronous query on the blocking pool
    async fn blocking<T, F>(&self, f: F) -> StorageResult<T>
    where
        T: Send + 'static,
        F: FnOnce(&Self) -> StorageResult<T> + Send + 'static,
    {
        let store = self.clone();
        tokio::task::spawn_blocking(move || f(&store))
            .await
            .map_err(|e| StorageError::Database(format!("storage task failed: {}", e)))?
    }

    // Synchronous helper methods for the trait implementations

    fn has_sync(&self, transaction_id: &str) -> Result<bool, StorageError> {
        let conn = self.conn()?;

        let found: Option<i64> = conn
            .query_row(
                "SELECT 1 FROM redemptions WHERE transaction_id = ?1",
                params![transaction_id],
                |row| row.get(0),
            )
            .optional()
            .map_err(|e| StorageError::Database(e.to_string()))?;

        Ok(found.is_some())
    }

    fn record_sync(&self, record: &RedemptionRecord) -> Result<(), StorageError> {
        let conn = self.conn()?;

        conn.execute(
            "INSERT INTO redemptions (transaction_id, redeemed_by, redeemed_at) VALUES (?1, ?2, ?3)",
            params![
                record.transaction_id,
                record.redeemed_by,
                record.redeemed_at as i64,
            ],
        )
        .map_err(|e| {
            if let rusqlite::Error::SqliteFailure(ref err, _) = e {
                if err.extended_code == CONSTRAINT_PRIMARYKEY
                    || err.extended_code == CONSTRAINT_UNIQUE
                {
                    return StorageError::Duplicate(record.transaction_id.clone());
                }
            }
            StorageError::Database(e.to_string())
        })?;

        Ok(())
    }

    fn get_sync(&self, transaction_id: &str) -> Result<Option<RedemptionRecord>, StorageError> {
        let conn = self.conn()?;

        conn.query_row(
            "SELECT * FROM redemptions WHERE transaction_id = ?1",
            params![transaction_id],
            Self::row_to_record,
        )
        .optional()
        .map_err(|e| StorageError::Database(e.to_string()))
    }

    fn count_sync(&self) -> Result<u64, StorageError> {
        let conn = self.conn()?;

        let count: i64 = conn
            .query_row("SELECT COUNT(*) FROM redemptions", [], |row| row.get(0))
            .map_err(|e| StorageError::Database(e.to_string()))?;

        Ok(count as u64)
    }
}

#[async_trait]
impl RedemptionStore for SqliteRedemptionStore {
    async fn has(&self, transaction_id: &str) -> StorageResult<bool> {
        let transaction_id = transaction_id.to_string();
        self.blocking(move |store| store.has_sync(&transaction_id))
            .await
    }

    async fn record(&self, transaction_id: &str, requester: &str) -> StorageResult<()> {
        let record = RedemptionRecord::new(transaction_id, requester);
        self.blocking(move |store| store.record_sync(&record)).await
    }

    async fn get(&self, transaction_id: &str) -> StorageResult<Option<RedemptionRecord>> {
        let transaction_id = transaction_id.to_string();
        self.blocking(move |store| store.get_sync(&transaction_id))
            .await
    }

    async fn count(&self) -> StorageResult<u64> {
        self.blocking(|store| store.count_sync()).await
    }
}
