//! Storage Trait Definitions
//!
//! Abstract interface over the redemption store. Implementations can use
//! SQLite (production) or in-memory (testing).

use async_trait::async_trait;
use thiserror::Error;

use crate::types::RedemptionRecord;

/// Storage errors
#[derive(Debug, Error)]
pub enum StorageError {
    /// Unique key already taken; for the redemption store this is
    /// "already redeemed"
    #[error("Duplicate record: {0}")]
    Duplicate(String),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Connection error: {0}")]
    Connection(String),
}

impl StorageError {
    pub fn is_duplicate(&self) -> bool {
        matches!(self, StorageError::Duplicate(_))
    }
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// Redemption store interface
///
/// Implementations:
/// - `SqliteRedemptionStore` - Production storage with SQLite
/// - `MemoryRedemptionStore` - In-memory storage for testing
///
/// `record` must be a single atomic conditional insert. Two callers that
/// both saw `has == false` race on it, and exactly one wins.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait RedemptionStore: Send + Sync {
    /// Whether a record exists for this transaction id
    async fn has(&self, transaction_id: &str) -> StorageResult<bool>;

    /// Insert a new record, failing with `StorageError::Duplicate` if the
    /// transaction id was already redeemed
    async fn record(&self, transaction_id: &str, requester: &str) -> StorageResult<()>;

    /// Get the record for a transaction id
    async fn get(&self, transaction_id: &str) -> StorageResult<Option<RedemptionRecord>>;

    /// Total number of redeemed transaction ids
    async fn count(&self) -> StorageResult<u64>;
}
