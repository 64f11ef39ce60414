//! Write-once hash storage trait.

use crate::StoreError;
use serde::{Deserialize, Serialize};
use snapshots_types::{Fingerprint, Timestamp};

/// A stored fingerprint and the time it was stored.
///
/// The default value (zero fingerprint at the epoch) stands for "nothing stored".
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HashRecord {
    pub hash: Fingerprint,
    pub stored_at: Timestamp,
}

/// Trait for a store that binds ids to fingerprints at most once.
pub trait HashStore {
    /// Bind `id` to `hash` at time `now`.
    ///
    /// Fails with [`StoreError::Duplicate`] if `id` is already bound, and with
    /// [`StoreError::InvalidInput`] for an empty id or a zero fingerprint.
    fn store_hash(
        &mut self,
        id: &str,
        hash: Fingerprint,
        now: Timestamp,
    ) -> Result<HashRecord, StoreError>;

    /// The record for `id`, if any.
    fn get(&self, id: &str) -> Option<HashRecord>;

    /// Number of stored records.
    fn record_count(&self) -> usize;

    /// The record for `id`, or the zero record if nothing was stored.
    fn lookup(&self, id: &str) -> HashRecord {
        self.get(id).unwrap_or_default()
    }

    fn contains(&self, id: &str) -> bool {
        self.get(id).is_some()
    }
}
