//! The complete node state and its on-disk form.
//!
//! Everything the node knows lives in one [`NodeState`] value: the access
//! gate, the member sets, the majority policy, every round and the companion
//! hash store. The daemon loads it, applies one operation and writes it back.

use crate::config::NodeConfig;
use crate::NodeError;
use serde::{Deserialize, Serialize};
use snapshots_consensus::RoundLedger;
use snapshots_governance::{AccessGate, MajorityPolicy, MembershipRegistry};
use snapshots_store::MemoryHashStore;
use std::path::Path;

/// Bumped whenever the persisted layout changes.
pub const STATE_VERSION: u32 = 1;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeState {
    pub gate: AccessGate,
    pub membership: MembershipRegistry,
    pub policy: MajorityPolicy,
    pub ledger: RoundLedger,
    pub hashes: MemoryHashStore,
}

#[derive(Serialize)]
struct StateFileRef<'a> {
    version: u32,
    state: &'a NodeState,
}

#[derive(Deserialize)]
struct StateFile {
    version: u32,
    state: NodeState,
}

impl NodeState {
    /// Build the initial state described by `config`.
    ///
    /// Duplicate entries in the member lists collapse into one member.
    pub fn genesis(config: &NodeConfig) -> Result<Self, NodeError> {
        config.validate()?;
        let gate = AccessGate::new(config.owner.clone());
        let mut membership = MembershipRegistry::new();
        let cap = gate.resolve(&config.owner, &membership).owner_capability()?;

        for validator in &config.validators {
            membership.add_validator(&cap, validator.clone())?;
        }
        for requester in &config.requesters {
            membership.add_requester(&cap, requester.clone())?;
        }

        Ok(Self {
            gate,
            membership,
            policy: config.policy()?,
            ledger: RoundLedger::new(),
            hashes: MemoryHashStore::new(),
        })
    }

    /// Encode as a versioned bincode blob.
    pub fn to_bytes(&self) -> Result<Vec<u8>, NodeError> {
        bincode::serialize(&StateFileRef {
            version: STATE_VERSION,
            state: self,
        })
        .map_err(|e| NodeError::State(format!("encode failed: {e}")))
    }

    /// Decode a blob produced by [`NodeState::to_bytes`].
    ///
    /// A blob that decodes but breaks the policy or round bookkeeping is
    /// rejected as [`NodeError::State`].
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, NodeError> {
        let file: StateFile = bincode::deserialize(bytes)
            .map_err(|e| NodeError::State(format!("decode failed: {e}")))?;
        if file.version != STATE_VERSION {
            return Err(NodeError::State(format!(
                "unsupported state version {} (expected {STATE_VERSION})",
                file.version
            )));
        }
        file.state
            .policy
            .validate()
            .map_err(|e| NodeError::State(format!("stored policy is invalid: {e}")))?;
        file.state
            .ledger
            .check_consistency()
            .map_err(|e| NodeError::State(format!("stored ledger is invalid: {e}")))?;
        Ok(file.state)
    }

    /// Write the state to `path`, replacing any previous file atomically.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), NodeError> {
        let path = path.as_ref();
        let bytes = self.to_bytes()?;
        let tmp = path.with_extension("tmp");
        std::fs::write(&tmp, bytes)?;
        std::fs::rename(&tmp, path)?;
        tracing::debug!(path = %path.display(), "state saved");
        Ok(())
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, NodeError> {
        let path = path.as_ref();
        let bytes = std::fs::read(path)?;
        let state = Self::from_bytes(&bytes)?;
        tracing::debug!(path = %path.display(), rounds = state.ledger.len(), "state loaded");
        Ok(state)
    }
}
