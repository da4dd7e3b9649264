//! In-Memory Storage Implementation
//!
//! Provides in-memory storage for testing and dry runs.
//! Data is lost when the service restarts.

use async_trait::async_trait;
use std::collections::hash_map::Entry;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

use super::traits::{RedemptionStore, StorageError, StorageResult};
use crate::types::RedemptionRecord;

/// In-memory redemption store
///
/// Thread-safe storage for redemption records.
/// Uses Arc<RwLock<>> for concurrent access.
#[derive(Clone, Default)]
pub struct MemoryRedemptionStore {
    /// Records indexed by transaction id
    records: Arc<RwLock<HashMap<String, RedemptionRecord>>>,
}

impl MemoryRedemptionStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl RedemptionStore for MemoryRedemptionStore {
    async fn has(&self, transaction_id: &str) -> StorageResult<bool> {
        Ok(self.records.read().await.contains_key(transaction_id))
    }

    async fn record(&self, transaction_id: &str, requester: &str) -> StorageResult<()> {
        // Check and insert under one write lock
        let mut records = self.records.write().await;

        match records.entry(transaction_id.to_string()) {
            Entry::Occupied(_) => Err(StorageError::Duplicate(transaction_id.to_string())),
            Entry::Vacant(slot) => {
                slot.insert(RedemptionRecord::new(transaction_id, requester));
                Ok(())
            }
        }
    }

    async fn get(&self, transaction_id: &str) -> StorageResult<Option<RedemptionRecord>> {
        Ok(self.records.read().await.get(transaction_id).cloned())
    }

    async fn count(&self) -> StorageResult<u64> {
        Ok(self.records.read().await.len() as u64)
    }
}
