//! Read-only snapshots of a round for callers outside the node.

use serde::Serialize;
use snapshots_consensus::{Round, RoundState};
use snapshots_types::{Fingerprint, Identity, RoundId, Timestamp};

/// Votes cast for one fingerprint.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct TallyEntry {
    pub value: Fingerprint,
    pub votes: u32,
}

/// Everything observable about a round at one instant.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct RoundView {
    pub id: RoundId,
    pub topic: String,
    pub selector: String,
    pub requester: Identity,
    pub opened_at: Timestamp,
    pub closes_at: Timestamp,
    pub window_secs: u64,
    pub potential_votes: u32,
    pub required_votes: u32,
    pub total_votes: u32,
    pub state: RoundState,
    pub is_valid: bool,
    /// Zero fingerprint until a majority is reached.
    pub consensus_value: Fingerprint,
    pub winning_count: u32,
    /// Highest count first.
    pub tally: Vec<TallyEntry>,
}

impl RoundView {
    pub fn from_round(round: &Round, now: Timestamp) -> Self {
        Self {
            id: round.id().clone(),
            topic: round.topic().to_owned(),
            selector: round.selector().to_owned(),
            requester: round.requester().clone(),
            opened_at: round.opened_at(),
            closes_at: round.closes_at(),
            window_secs: round.window_secs(),
            potential_votes: round.potential_votes(),
            required_votes: round.required_votes(),
            total_votes: round.total_votes(),
            state: round.state(now),
            is_valid: round.is_valid(),
            consensus_value: round.consensus_value().unwrap_or(Fingerprint::ZERO),
            winning_count: round.winning_count(),
            tally: round
                .tally()
                .into_iter()
                .map(|(value, votes)| TallyEntry { value, votes })
                .collect(),
        }
    }
}
