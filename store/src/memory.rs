//! In-memory hash store, serialisable with the rest of the node state.

use crate::hash::{HashRecord, HashStore};
use crate::StoreError;
use serde::{Deserialize, Serialize};
use snapshots_types::{Fingerprint, Timestamp};
use std::collections::HashMap;

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemoryHashStore {
    records: HashMap<String, HashRecord>,
}

impl MemoryHashStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl HashStore for MemoryHashStore {
    fn store_hash(
        &mut self,
        id: &str,
        hash: Fingerprint,
        now: Timestamp,
    ) -> Result<HashRecord, StoreError> {
        if id.is_empty() {
            return Err(StoreError::InvalidInput("id must not be empty".into()));
        }
        if hash.is_zero() {
            return Err(StoreError::InvalidInput("hash must not be zero".into()));
        }
        if self.records.contains_key(id) {
            return Err(StoreError::Duplicate(id.to_owned()));
        }
        let record = HashRecord {
            hash,
            stored_at: now,
        };
        self.records.insert(id.to_owned(), record);
        tracing::info!(id, %hash, stored_at = %now, "hash stored");
        Ok(record)
    }

    fn get(&self, id: &str) -> Option<HashRecord> {
        self.records.get(id).copied()
    }

    fn record_count(&self) -> usize {
        self.records.len()
    }
}
