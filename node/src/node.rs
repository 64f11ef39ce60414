//! The snapshot quorum node: one lock around all state, roles resolved at the door.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use snapshots_consensus::{RoundEvent, RoundState, RoundTerms};
use snapshots_governance::{
    Capabilities, GovernanceError, GovernanceEvent, MajorityPolicy, OwnerCapability, Role,
};
use snapshots_store::{HashRecord, HashStore};
use snapshots_types::{Clock, Fingerprint, Identity, RoundId, SystemClock};

use crate::config::NodeConfig;
use crate::error::NodeError;
use crate::event::{EventBus, NodeEvent, StoreEvent};
use crate::metrics::NodeMetrics;
use crate::state::NodeState;
use crate::tracing_spans::{admin_span, open_round_span, store_span, vote_span};
use crate::view::RoundView;

/// A running snapshot quorum node.
///
/// Every mutating call takes the state lock, reads the clock, authorizes the
/// caller and applies the change before releasing it, so operations are
/// totally ordered. Notifications go out on the [`EventBus`] while the lock
/// is still held.
pub struct SnapshotsNode {
    state: Mutex<NodeState>,
    clock: Arc<dyn Clock>,
    events: EventBus,
    metrics: NodeMetrics,
}

impl SnapshotsNode {
    /// Wrap `state`. Counters start from the totals already recorded in it,
    /// so a node rebuilt from a saved state reports the same figures.
    pub fn new(state: NodeState, clock: Arc<dyn Clock>) -> Self {
        let node = Self {
            state: Mutex::new(state),
            clock,
            events: EventBus::new(),
            metrics: NodeMetrics::new(),
        };
        {
            let state = node.lock();
            node.seed_counters(&state);
            node.refresh_gauges(&state);
        }
        node
    }

    /// Build a node from a fresh genesis state on the system clock.
    pub fn from_config(config: &NodeConfig) -> Result<Self, NodeError> {
        let state = NodeState::genesis(config)?;
        Ok(Self::new(state, Arc::new(SystemClock)))
    }

    /// Register an observer for every notification the node publishes.
    pub fn subscribe(&mut self, listener: Box<dyn Fn(&NodeEvent) + Send + Sync>) {
        self.events.subscribe(listener);
    }

    pub fn metrics(&self) -> &NodeMetrics {
        &self.metrics
    }

    /// A copy of the committed state, e.g. for persisting.
    pub fn snapshot(&self) -> NodeState {
        self.lock().clone()
    }

    pub fn into_state(self) -> NodeState {
        self.state
            .into_inner()
            .unwrap_or_else(PoisonError::into_inner)
    }

    // ── Rounds ──────────────────────────────────────────────────────────

    /// Open a new round on `topic`. The caller must be a requester.
    pub fn open_round(
        &self,
        caller: &Identity,
        id: RoundId,
        topic: impl Into<String>,
        selector: impl Into<String>,
    ) -> Result<RoundEvent, NodeError> {
        let span = open_round_span(id.as_str(), caller.as_str());
        let _enter = span.enter();

        let mut state = self.lock();
        let now = self.clock.now();
        let result = authorize(&state, caller, Role::Requester).and_then(|_| {
            let potential_votes = state.membership.validator_count();
            let terms = RoundTerms {
                potential_votes,
                required_votes: state.policy.required_votes(potential_votes),
                window_secs: state.policy.default_window_secs(),
            };
            state
                .ledger
                .open_round(id, topic.into(), selector.into(), caller, terms, now)
                .map_err(NodeError::from)
        });

        let event = self.check("open_round", result)?;
        self.metrics.rounds_opened.inc();
        self.events.emit(&NodeEvent::from(event.clone()));
        Ok(event)
    }

    /// Record the caller's fingerprint for round `id`. The caller must be a
    /// validator. Returns the notifications the vote produced, in order.
    pub fn submit_vote(
        &self,
        caller: &Identity,
        id: &RoundId,
        value: Fingerprint,
    ) -> Result<Vec<RoundEvent>, NodeError> {
        let span = vote_span(id.as_str(), caller.as_str());
        let _enter = span.enter();

        let mut state = self.lock();
        let now = self.clock.now();
        let result = authorize(&state, caller, Role::Validator).and_then(|_| {
            state
                .ledger
                .submit_vote(id, caller, value, now)
                .map_err(NodeError::from)
        });

        let events = self.check("submit_vote", result)?;
        self.metrics.votes_accepted.inc();
        for event in &events {
            match event {
                RoundEvent::MajorityReached { .. } => self.metrics.majorities_reached.inc(),
                RoundEvent::RoundFinalized { .. } => self.metrics.rounds_finalized.inc(),
                RoundEvent::RoundOpened { .. } => {}
            }
            self.events.emit(&NodeEvent::from(event.clone()));
        }
        Ok(events)
    }

    // ── Owner management ────────────────────────────────────────────────

    pub fn add_validator(
        &self,
        caller: &Identity,
        validator: Identity,
    ) -> Result<Option<GovernanceEvent>, NodeError> {
        self.govern("add_validator", caller, false, |state, cap| {
            state.membership.add_validator(&cap, validator)
        })
    }

    pub fn remove_validator(
        &self,
        caller: &Identity,
        validator: &Identity,
    ) -> Result<Option<GovernanceEvent>, NodeError> {
        self.govern("remove_validator", caller, false, |state, cap| {
            Ok(state.membership.remove_validator(&cap, validator))
        })
    }

    pub fn add_requester(
        &self,
        caller: &Identity,
        requester: Identity,
    ) -> Result<Option<GovernanceEvent>, NodeError> {
        self.govern("add_requester", caller, false, |state, cap| {
            state.membership.add_requester(&cap, requester)
        })
    }

    pub fn remove_requester(
        &self,
        caller: &Identity,
        requester: &Identity,
    ) -> Result<Option<GovernanceEvent>, NodeError> {
        self.govern("remove_requester", caller, false, |state, cap| {
            Ok(state.membership.remove_requester(&cap, requester))
        })
    }

    /// Change the majority fraction for rounds opened from now on.
    pub fn set_majority(
        &self,
        caller: &Identity,
        numerator: u32,
        denominator: u32,
    ) -> Result<Option<GovernanceEvent>, NodeError> {
        self.govern("set_majority", caller, false, |state, cap| {
            state.policy.set_majority(&cap, numerator, denominator)
        })
    }

    /// Change the voting window for rounds opened from now on.
    pub fn set_default_window(
        &self,
        caller: &Identity,
        window_secs: u64,
    ) -> Result<Option<GovernanceEvent>, NodeError> {
        self.govern("set_default_window", caller, false, |state, cap| {
            state.policy.set_default_window(&cap, window_secs)
        })
    }

    /// Pause or resume the system. The only management call allowed while paused.
    pub fn set_paused(
        &self,
        caller: &Identity,
        paused: bool,
    ) -> Result<Option<GovernanceEvent>, NodeError> {
        self.govern("set_paused", caller, true, |state, cap| {
            Ok(state.gate.set_paused(&cap, paused))
        })
    }

    pub fn transfer_ownership(
        &self,
        caller: &Identity,
        new_owner: Identity,
    ) -> Result<Option<GovernanceEvent>, NodeError> {
        self.govern("transfer_ownership", caller, false, |state, cap| {
            state.gate.transfer_ownership(cap, new_owner)
        })
    }

    // ── Companion hash store ────────────────────────────────────────────

    /// Bind `id` to `hash` once. Open to any caller, paused or not.
    pub fn store_hash(&self, id: &str, hash: Fingerprint) -> Result<HashRecord, NodeError> {
        let span = store_span(id);
        let _enter = span.enter();

        let mut state = self.lock();
        let now = self.clock.now();
        let result = state
            .hashes
            .store_hash(id, hash, now)
            .map_err(NodeError::from);

        let record = self.check("store_hash", result)?;
        self.metrics.hashes_stored.inc();
        self.events.emit(&NodeEvent::from(StoreEvent::HashStored {
            id: id.to_owned(),
            hash: record.hash,
            stored_at: record.stored_at,
        }));
        Ok(record)
    }

    /// The record for `id`, or the zero record if nothing was stored.
    pub fn lookup_hash(&self, id: &str) -> HashRecord {
        self.lock().hashes.lookup(id)
    }

    // ── Queries ─────────────────────────────────────────────────────────

    pub fn verify(&self, id: &RoundId) -> bool {
        self.lock().ledger.verify(id)
    }

    pub fn consensus_of(&self, id: &RoundId) -> Fingerprint {
        self.lock().ledger.consensus_of(id)
    }

    pub fn winning_count(&self, id: &RoundId) -> u32 {
        self.lock().ledger.winning_count(id)
    }

    /// Round ids opened on `topic`, oldest first.
    pub fn history_of(&self, topic: &str) -> Vec<RoundId> {
        self.lock().ledger.history_of(topic).to_vec()
    }

    pub fn round(&self, id: &RoundId) -> Option<RoundView> {
        let state = self.lock();
        let now = self.clock.now();
        state
            .ledger
            .round(id)
            .map(|round| RoundView::from_round(round, now))
    }

    pub fn round_state(&self, id: &RoundId) -> Option<RoundState> {
        let state = self.lock();
        state.ledger.round_state(id, self.clock.now())
    }

    pub fn is_validator(&self, id: &Identity) -> bool {
        self.lock().membership.is_validator(id)
    }

    pub fn is_requester(&self, id: &Identity) -> bool {
        self.lock().membership.is_requester(id)
    }

    pub fn validator_count(&self) -> u32 {
        self.lock().membership.validator_count()
    }

    pub fn requester_count(&self) -> u32 {
        self.lock().membership.requester_count()
    }

    pub fn is_paused(&self) -> bool {
        self.lock().gate.is_paused()
    }

    pub fn owner(&self) -> Identity {
        self.lock().gate.owner().clone()
    }

    pub fn policy(&self) -> MajorityPolicy {
        self.lock().policy
    }

    // ── Internals ───────────────────────────────────────────────────────

    fn lock(&self) -> MutexGuard<'_, NodeState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Run an owner-only change. Unless `pause_exempt`, the pause flag is
    /// checked before the caller's role.
    fn govern<F>(
        &self,
        action: &'static str,
        caller: &Identity,
        pause_exempt: bool,
        apply: F,
    ) -> Result<Option<GovernanceEvent>, NodeError>
    where
        F: FnOnce(
            &mut NodeState,
            OwnerCapability,
        ) -> Result<Option<GovernanceEvent>, GovernanceError>,
    {
        let span = admin_span(action, caller.as_str());
        let _enter = span.enter();

        let mut state = self.lock();
        let result = authorize_owner(&state, caller, pause_exempt)
            .and_then(|cap| apply(&mut *state, cap).map_err(NodeError::from));

        let event = self.check(action, result)?;
        if let Some(event) = &event {
            self.refresh_gauges(&state);
            self.events.emit(&NodeEvent::from(event.clone()));
        } else {
            tracing::debug!(action, "no change");
        }
        Ok(event)
    }

    /// Count and log a rejected operation, passing the result through.
    fn check<T>(
        &self,
        operation: &'static str,
        result: Result<T, NodeError>,
    ) -> Result<T, NodeError> {
        if let Err(e) = &result {
            let kind = e.kind();
            self.metrics.record_rejection(operation, kind.as_str());
            tracing::warn!(operation, %kind, error = %e, "operation rejected");
        }
        result
    }

    /// Rejections are not persisted, so `operations_rejected` starts empty.
    fn seed_counters(&self, state: &NodeState) {
        let (mut votes, mut majorities, mut finalized) = (0u64, 0u64, 0u64);
        for round in state.ledger.rounds() {
            votes += u64::from(round.total_votes());
            majorities += u64::from(round.is_valid());
            finalized += u64::from(round.is_finalized());
        }
        self.metrics.rounds_opened.inc_by(state.ledger.len() as u64);
        self.metrics.votes_accepted.inc_by(votes);
        self.metrics.majorities_reached.inc_by(majorities);
        self.metrics.rounds_finalized.inc_by(finalized);
        self.metrics
            .hashes_stored
            .inc_by(state.hashes.record_count() as u64);
    }

    fn refresh_gauges(&self, state: &NodeState) {
        self.metrics
            .validator_count
            .set(i64::from(state.membership.validator_count()));
        self.metrics
            .requester_count
            .set(i64::from(state.membership.requester_count()));
        self.metrics.paused.set(i64::from(state.gate.is_paused()));
    }
}

/// Pause check first, then the role.
fn authorize(
    state: &NodeState,
    caller: &Identity,
    role: Role,
) -> Result<Capabilities, NodeError> {
    state.gate.ensure_running()?;
    let caps = state.gate.resolve(caller, &state.membership);
    caps.require(role)?;
    Ok(caps)
}

fn authorize_owner(
    state: &NodeState,
    caller: &Identity,
    pause_exempt: bool,
) -> Result<OwnerCapability, NodeError> {
    if !pause_exempt {
        state.gate.ensure_running()?;
    }
    let cap = state
        .gate
        .resolve(caller, &state.membership)
        .owner_capability()?;
    Ok(cap)
}
