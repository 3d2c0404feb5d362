//! Persistence seam. The store owns uniqueness: offering a dedup key it
//! already holds yields `InsertOutcome::Duplicate`.

use std::collections::HashMap;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tally_core::{CanonicalTransaction, CategorizationResult};
use thiserror::Error;
use tokio::sync::Mutex;

/// A parsed, fingerprinted and categorized transaction ready to persist.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredTransaction {
    pub dedup_key: String,
    pub transaction: CanonicalTransaction,
    pub categorization: CategorizationResult,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum InsertOutcome {
    #[serde(rename = "inserted")]
    Inserted,
    #[serde(rename = "duplicate")]
    Duplicate,
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("store unavailable: {0}")]
    Unavailable(String),
}

#[async_trait]
pub trait TransactionStore: Send + Sync {
    async fn contains(&self, dedup_key: &str) -> Result<bool, StoreError>;

    async fn insert(&self, record: StoredTransaction) -> Result<InsertOutcome, StoreError>;
}

/// In-process store keyed by dedup key. Used by the CLI and tests.
#[derive(Debug, Default)]
pub struct MemoryStore {
    records: Mutex<HashMap<String, StoredTransaction>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.records.lock().await.len()
    }

    /// Stored records ordered by date, then key.
    pub async fn records(&self) -> Vec<StoredTransaction> {
        let mut out: Vec<_> = self.records.lock().await.values().cloned().collect();
        out.sort_by(|a, b| {
            a.transaction
                .date
                .cmp(&b.transaction.date)
                .then_with(|| a.dedup_key.cmp(&b.dedup_key))
        });
        out
    }
}

#[async_trait]
impl TransactionStore for MemoryStore {
    async fn contains(&self, dedup_key: &str) -> Result<bool, StoreError> {
        Ok(self.records.lock().await.contains_key(dedup_key))
    }

    async fn insert(&self, record: StoredTransaction) -> Result<InsertOutcome, StoreError> {
        let mut records = self.records.lock().await;
        if records.contains_key(&record.dedup_key) {
            return Ok(InsertOutcome::Duplicate);
        }
        records.insert(record.dedup_key.clone(), record);
        Ok(InsertOutcome::Inserted)
    }
}
