//! In-memory implementation of RecordStore
//!
//! This implementation is primarily intended for testing and development purposes.

use crate::{
    ContractId, ContractRecord, ContractStatus, ProviderFieldUpdate, RecordStore,
    RecordStoreError, RecordStoreResult, StatusCounts,
};
use async_trait::async_trait;
use std::collections::HashMap;
use std::fmt::Debug;
use std::sync::Arc;
use tokio::sync::RwLock;

/// In-memory implementation of RecordStore
///
/// This implementation keeps contract records in a process-local map.
/// It is primarily intended for testing and development purposes.
/// All data is lost when the instance is dropped.
#[derive(Debug, Clone)]
pub struct InMemoryRecordStore {
    records: Arc<RwLock<HashMap<String, ContractRecord>>>,
}

impl InMemoryRecordStore {
    /// Create a new in-memory record store
    pub fn new() -> Self {
        Self {
            records: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    fn sorted_newest_first(mut records: Vec<ContractRecord>) -> Vec<ContractRecord> {
        records.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        records
    }
}

impl Default for InMemoryRecordStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl RecordStore for InMemoryRecordStore {
    async fn find_by_key(&self, key: &ContractId) -> RecordStoreResult<ContractRecord> {
        let store = self.records.read().await;

        match store.get(key.as_str()) {
            Some(record) => Ok(record.clone()),
            None => Err(RecordStoreError::NotFound(key.clone())),
        }
    }

    async fn update_provider_fields(
        &self,
        key: &ContractId,
        update: &ProviderFieldUpdate,
    ) -> RecordStoreResult<ContractRecord> {
        // Existence check and mutation under one write lock, so the update is
        // atomic per key.
        let mut store = self.records.write().await;

        match store.get_mut(key.as_str()) {
            Some(record) => {
                record.apply_update(update);
                Ok(record.clone())
            }
            None => Err(RecordStoreError::NotFound(key.clone())),
        }
    }

    async fn list_by_status(
        &self,
        status: ContractStatus,
    ) -> RecordStoreResult<Vec<ContractRecord>> {
        let store = self.records.read().await;
        let records = store
            .values()
            .filter(|record| record.status == status)
            .cloned()
            .collect();

        Ok(Self::sorted_newest_first(records))
    }

    async fn list_all(&self) -> RecordStoreResult<Vec<ContractRecord>> {
        let store = self.records.read().await;
        let records = store.values().cloned().collect();

        Ok(Self::sorted_newest_first(records))
    }

    async fn status_counts(&self) -> RecordStoreResult<StatusCounts> {
        let store = self.records.read().await;
        let mut counts = StatusCounts::default();

        for record in store.values() {
            match record.status {
                ContractStatus::Submitted => counts.submitted += 1,
                ContractStatus::Running => counts.running += 1,
                ContractStatus::Approved => counts.approved += 1,
                ContractStatus::Rejected => counts.rejected += 1,
            }
        }

        Ok(counts)
    }

    async fn insert(&self, record: ContractRecord) -> RecordStoreResult<()> {
        let mut store = self.records.write().await;
        store.insert(record.contract_id.as_str().to_string(), record);

        Ok(())
    }

    async fn health_check(&self) -> RecordStoreResult<bool> {
        Ok(true)
    }
}
