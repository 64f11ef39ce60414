//! Round ledger: every round ever opened, keyed by id, plus the topic history.
//!
//! The ledger routes votes to their round and answers the read queries. It
//! does no access control: callers pass an identity that has already been
//! authorized for the operation.

use crate::error::ConsensusError;
use crate::event::RoundEvent;
use crate::history::HistoryIndex;
use crate::round::{Round, RoundState, RoundTerms};
use serde::{Deserialize, Serialize};
use snapshots_types::{Fingerprint, Identity, RoundId, Timestamp};
use std::collections::HashMap;

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoundLedger {
    /// Round id -> round. Rounds are never removed, which keeps ids unique forever.
    rounds: HashMap<RoundId, Round>,
    history: HistoryIndex,
}

impl RoundLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Open a new round with terms fixed now.
    pub fn open_round(
        &mut self,
        id: RoundId,
        topic: String,
        selector: String,
        requester: &Identity,
        terms: RoundTerms,
        now: Timestamp,
    ) -> Result<RoundEvent, ConsensusError> {
        if self.rounds.contains_key(&id) {
            return Err(ConsensusError::DuplicateRound(id.to_string()));
        }
        if id.is_empty() {
            return Err(ConsensusError::InvalidInput(
                "round id must not be empty".into(),
            ));
        }
        if topic.is_empty() {
            return Err(ConsensusError::InvalidInput("topic must not be empty".into()));
        }
        if terms.potential_votes == 0 {
            return Err(ConsensusError::NoValidators);
        }
        if terms.required_votes == 0 || terms.required_votes > terms.potential_votes {
            return Err(ConsensusError::InvalidInput(format!(
                "required votes {} outside 1..={}",
                terms.required_votes, terms.potential_votes
            )));
        }

        let round = Round::new(
            id.clone(),
            topic,
            selector,
            requester.clone(),
            terms,
            now,
        );
        let event = RoundEvent::RoundOpened {
            id: id.clone(),
            topic: round.topic().to_owned(),
            selector: round.selector().to_owned(),
            requester: requester.clone(),
            opened_at: now,
            potential_votes: terms.potential_votes,
            required_votes: terms.required_votes,
        };
        tracing::info!(
            round = %id,
            topic = round.topic(),
            %requester,
            potential_votes = terms.potential_votes,
            required_votes = terms.required_votes,
            window_secs = terms.window_secs,
            "round opened"
        );

        self.history.record(round.topic(), id.clone());
        self.rounds.insert(id, round);
        Ok(event)
    }

    /// Route a validator's vote to its round.
    pub fn submit_vote(
        &mut self,
        id: &RoundId,
        voter: &Identity,
        value: Fingerprint,
        now: Timestamp,
    ) -> Result<Vec<RoundEvent>, ConsensusError> {
        let round = self
            .rounds
            .get_mut(id)
            .ok_or_else(|| ConsensusError::RoundNotFound(id.to_string()))?;
        round.vote(voter, value, now)
    }

    pub fn round(&self, id: &RoundId) -> Option<&Round> {
        self.rounds.get(id)
    }

    pub fn contains(&self, id: &RoundId) -> bool {
        self.rounds.contains_key(id)
    }

    pub fn round_state(&self, id: &RoundId, now: Timestamp) -> Option<RoundState> {
        self.rounds.get(id).map(|r| r.state(now))
    }

    /// Whether the round reached a majority. False for unknown ids.
    pub fn verify(&self, id: &RoundId) -> bool {
        self.rounds.get(id).is_some_and(Round::is_valid)
    }

    /// The consensus fingerprint, or [`Fingerprint::ZERO`] if there is none.
    pub fn consensus_of(&self, id: &RoundId) -> Fingerprint {
        self.rounds
            .get(id)
            .and_then(Round::consensus_value)
            .unwrap_or(Fingerprint::ZERO)
    }

    /// Votes for the consensus fingerprint, 0 if there is none.
    pub fn winning_count(&self, id: &RoundId) -> u32 {
        self.rounds.get(id).map(Round::winning_count).unwrap_or(0)
    }

    pub fn history_of(&self, topic: &str) -> &[RoundId] {
        self.history.rounds_for(topic)
    }

    /// Every round, in no particular order.
    pub fn rounds(&self) -> impl Iterator<Item = &Round> {
        self.rounds.values()
    }

    /// Check every round's bookkeeping and that each one is filed under its
    /// own id and topic.
    pub fn check_consistency(&self) -> Result<(), ConsensusError> {
        for (key, round) in &self.rounds {
            if key != round.id() {
                return Err(ConsensusError::InvalidInput(format!(
                    "round {} is filed under id {key}",
                    round.id()
                )));
            }
            if !self.history.rounds_for(round.topic()).contains(key) {
                return Err(ConsensusError::InvalidInput(format!(
                    "round {key} is missing from the history of its topic"
                )));
            }
            round.check_consistency()?;
        }
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.rounds.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rounds.is_empty()
    }
}
