//! Round state machine: one voting session over a topic/selector pair.
//!
//! A round is created with a frozen set of [`RoundTerms`] and only changes
//! through [`Round::vote`]. The first fingerprint whose tally reaches
//! `required_votes` becomes the consensus value and stays it for good; voting
//! carries on until every potential voter has voted or the window closes.
//!
//! ```text
//! Open ──(tally reaches threshold)──► Completed ──(all votes cast)──► Finalized
//!   │                                                                   ▲
//!   ├────────────────────(all votes cast, no majority)──────────────────┘
//!   └──(window elapses)──► Expired   (no event, votes rejected)
//! ```

use crate::error::ConsensusError;
use crate::event::RoundEvent;
use serde::{Deserialize, Serialize};
use snapshots_types::{Fingerprint, Identity, RoundId, Timestamp};
use std::collections::{HashMap, HashSet};

/// Voting parameters captured when a round opens.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoundTerms {
    /// Size of the validator set at open time.
    pub potential_votes: u32,
    /// Agreeing votes needed for a majority.
    pub required_votes: u32,
    /// How long the round accepts votes, in seconds.
    pub window_secs: u64,
}

/// Where a round is in its lifecycle.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum RoundState {
    /// Accepting votes, no majority yet.
    Open,
    /// A fingerprint reached the threshold; may still accept votes.
    Completed,
    /// Every potential voter has voted. Terminal.
    Finalized,
    /// Window elapsed without a majority and without all votes cast.
    Expired,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Round {
    id: RoundId,
    topic: String,
    selector: String,
    requester: Identity,
    opened_at: Timestamp,
    terms: RoundTerms,
    total_votes: u32,
    has_voted: HashSet<Identity>,
    tally: HashMap<Fingerprint, u32>,
    consensus: Option<Fingerprint>,
}

impl Round {
    pub fn new(
        id: RoundId,
        topic: String,
        selector: String,
        requester: Identity,
        terms: RoundTerms,
        now: Timestamp,
    ) -> Self {
        Self {
            id,
            topic,
            selector,
            requester,
            opened_at: now,
            terms,
            total_votes: 0,
            has_voted: HashSet::new(),
            tally: HashMap::new(),
            consensus: None,
        }
    }

    /// Record `voter`'s fingerprint.
    ///
    /// The caller must already have established that `voter` is a validator.
    /// Nothing is modified when an error is returned.
    pub fn vote(
        &mut self,
        voter: &Identity,
        value: Fingerprint,
        now: Timestamp,
    ) -> Result<Vec<RoundEvent>, ConsensusError> {
        if self.opened_at.has_expired(self.terms.window_secs, now) {
            return Err(ConsensusError::WindowExpired {
                round: self.id.to_string(),
                closed_at: self.closes_at(),
            });
        }
        if value.is_zero() {
            return Err(ConsensusError::InvalidInput(
                "fingerprint must not be zero".into(),
            ));
        }
        if self.has_voted.contains(voter) {
            return Err(ConsensusError::DuplicateVote {
                round: self.id.to_string(),
                voter: voter.to_string(),
            });
        }
        // Validators added after the round opened may vote, but never past
        // the potential vote count fixed at open time.
        if self.is_finalized() {
            return Err(ConsensusError::RoundFinalized(self.id.to_string()));
        }

        self.has_voted.insert(voter.clone());
        let count = self.tally.entry(value).or_insert(0);
        *count += 1;
        let count = *count;
        self.total_votes += 1;

        tracing::debug!(
            round = %self.id,
            %voter,
            %value,
            count,
            total = self.total_votes,
            "vote recorded"
        );

        let mut events = Vec::new();
        if self.consensus.is_none() && count >= self.terms.required_votes {
            self.consensus = Some(value);
            tracing::info!(round = %self.id, %value, votes = count, "majority reached");
            events.push(RoundEvent::MajorityReached {
                id: self.id.clone(),
                value,
            });
        }
        if self.is_finalized() {
            let is_valid = self.is_valid();
            tracing::info!(round = %self.id, is_valid, "round finalized");
            events.push(RoundEvent::RoundFinalized {
                id: self.id.clone(),
                is_valid,
            });
        }
        Ok(events)
    }

    pub fn state(&self, now: Timestamp) -> RoundState {
        if self.is_finalized() {
            RoundState::Finalized
        } else if self.is_valid() {
            RoundState::Completed
        } else if self.opened_at.has_expired(self.terms.window_secs, now) {
            RoundState::Expired
        } else {
            RoundState::Open
        }
    }

    /// Whether a new validator vote would be inside the window and below the vote cap.
    pub fn accepts_votes(&self, now: Timestamp) -> bool {
        !self.is_finalized() && !self.opened_at.has_expired(self.terms.window_secs, now)
    }

    pub fn id(&self) -> &RoundId {
        &self.id
    }

    pub fn topic(&self) -> &str {
        &self.topic
    }

    pub fn selector(&self) -> &str {
        &self.selector
    }

    pub fn requester(&self) -> &Identity {
        &self.requester
    }

    pub fn opened_at(&self) -> Timestamp {
        self.opened_at
    }

    /// First instant at which votes are rejected.
    pub fn closes_at(&self) -> Timestamp {
        Timestamp::new(
            self.opened_at
                .as_secs()
                .saturating_add(self.terms.window_secs),
        )
    }

    pub fn terms(&self) -> RoundTerms {
        self.terms
    }

    pub fn window_secs(&self) -> u64 {
        self.terms.window_secs
    }

    pub fn potential_votes(&self) -> u32 {
        self.terms.potential_votes
    }

    pub fn required_votes(&self) -> u32 {
        self.terms.required_votes
    }

    pub fn total_votes(&self) -> u32 {
        self.total_votes
    }

    pub fn has_voted(&self, voter: &Identity) -> bool {
        self.has_voted.contains(voter)
    }

    /// Votes for `value` so far.
    pub fn tally_of(&self, value: &Fingerprint) -> u32 {
        self.tally.get(value).copied().unwrap_or(0)
    }

    /// All fingerprints with their counts, highest count first, ties by value.
    pub fn tally(&self) -> Vec<(Fingerprint, u32)> {
        let mut entries: Vec<_> = self.tally.iter().map(|(v, c)| (*v, *c)).collect();
        entries.sort_by(|a, b| b.1.cmp(&a.1).then(a.0.cmp(&b.0)));
        entries
    }

    pub fn consensus_value(&self) -> Option<Fingerprint> {
        self.consensus
    }

    pub fn is_valid(&self) -> bool {
        self.consensus.is_some()
    }

    pub fn is_finalized(&self) -> bool {
        self.total_votes >= self.terms.potential_votes
    }

    /// Votes for the consensus value, 0 when there is none.
    pub fn winning_count(&self) -> u32 {
        self.consensus.map(|v| self.tally_of(&v)).unwrap_or(0)
    }

    /// Check the bookkeeping of a round that did not come from [`Round::vote`],
    /// e.g. one decoded from a state file.
    pub fn check_consistency(&self) -> Result<(), ConsensusError> {
        let corrupt = |reason: String| {
            Err(ConsensusError::InvalidInput(format!(
                "round {} is inconsistent: {reason}",
                self.id
            )))
        };
        let terms = self.terms;
        if self.id.is_empty() || self.topic.is_empty() {
            return corrupt("empty id or topic".into());
        }
        if terms.potential_votes == 0
            || terms.required_votes == 0
            || terms.required_votes > terms.potential_votes
        {
            return corrupt(format!(
                "required votes {} outside 1..={}",
                terms.required_votes, terms.potential_votes
            ));
        }
        if self.total_votes > terms.potential_votes {
            return corrupt(format!(
                "{} votes cast but only {} possible",
                self.total_votes, terms.potential_votes
            ));
        }
        if u32::try_from(self.has_voted.len()).ok() != Some(self.total_votes) {
            return corrupt(format!(
                "{} voters recorded for {} votes",
                self.has_voted.len(),
                self.total_votes
            ));
        }
        if self.tally.iter().any(|(v, c)| v.is_zero() || *c == 0) {
            return corrupt("tally holds a zero fingerprint or an empty count".into());
        }
        let sum = self
            .tally
            .values()
            .try_fold(0u32, |acc, c| acc.checked_add(*c));
        if sum != Some(self.total_votes) {
            return corrupt(format!("tally does not sum to {}", self.total_votes));
        }
        if let Some(value) = self.consensus {
            if self.tally_of(&value) < terms.required_votes {
                return corrupt(format!("consensus value {value} lacks a majority"));
            }
        }
        Ok(())
    }
}
