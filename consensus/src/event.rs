//! Notifications produced by round transitions.

use serde::{Deserialize, Serialize};
use snapshots_types::{Fingerprint, Identity, RoundId, Timestamp};

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum RoundEvent {
    /// A requester opened a new round.
    RoundOpened {
        id: RoundId,
        topic: String,
        selector: String,
        requester: Identity,
        opened_at: Timestamp,
        potential_votes: u32,
        required_votes: u32,
    },
    /// A fingerprint reached the required vote count for the first time.
    /// Fires at most once per round.
    MajorityReached { id: RoundId, value: Fingerprint },
    /// Every potential voter has voted. Fires exactly once per round that
    /// gets there, whether or not a majority was reached.
    RoundFinalized { id: RoundId, is_valid: bool },
}

impl RoundEvent {
    pub fn round_id(&self) -> &RoundId {
        match self {
            Self::RoundOpened { id, .. }
            | Self::MajorityReached { id, .. }
            | Self::RoundFinalized { id, .. } => id,
        }
    }
}
