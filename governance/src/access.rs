//! Access gate: owner checks, role resolution and the global pause switch.
//!
//! Roles are resolved once per call into [`Capabilities`]. The round state
//! machine never looks at membership itself; it only runs after the gate has
//! let the caller through.

use crate::error::GovernanceError;
use crate::event::GovernanceEvent;
use crate::membership::MembershipRegistry;
use serde::{Deserialize, Serialize};
use snapshots_types::Identity;
use std::fmt;

/// A role a caller can hold.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Role {
    Owner,
    Validator,
    Requester,
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Owner => write!(f, "owner"),
            Self::Validator => write!(f, "validator"),
            Self::Requester => write!(f, "requester"),
        }
    }
}

/// Proof that the caller was the owner when the gate checked.
///
/// Only [`Capabilities::owner_capability`] can construct one.
#[derive(Debug)]
pub struct OwnerCapability {
    owner: Identity,
}

impl OwnerCapability {
    pub fn owner(&self) -> &Identity {
        &self.owner
    }
}

/// The roles one caller holds, resolved at the start of a call.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Capabilities {
    caller: Identity,
    owner: bool,
    validator: bool,
    requester: bool,
}

impl Capabilities {
    pub fn caller(&self) -> &Identity {
        &self.caller
    }

    pub fn has(&self, role: Role) -> bool {
        match role {
            Role::Owner => self.owner,
            Role::Validator => self.validator,
            Role::Requester => self.requester,
        }
    }

    /// Fail with `Unauthorized` unless the caller holds `role`.
    pub fn require(&self, role: Role) -> Result<(), GovernanceError> {
        if self.has(role) {
            Ok(())
        } else {
            Err(GovernanceError::Unauthorized {
                caller: self.caller.to_string(),
                required: role,
            })
        }
    }

    pub fn owner_capability(&self) -> Result<OwnerCapability, GovernanceError> {
        self.require(Role::Owner)?;
        Ok(OwnerCapability {
            owner: self.caller.clone(),
        })
    }
}

/// Owner identity plus the pause flag.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccessGate {
    owner: Identity,
    paused: bool,
}

impl AccessGate {
    pub fn new(owner: Identity) -> Self {
        Self {
            owner,
            paused: false,
        }
    }

    pub fn owner(&self) -> &Identity {
        &self.owner
    }

    pub fn is_owner(&self, id: &Identity) -> bool {
        &self.owner == id
    }

    pub fn is_paused(&self) -> bool {
        self.paused
    }

    /// Checked first by every mutating entry point except [`AccessGate::set_paused`].
    pub fn ensure_running(&self) -> Result<(), GovernanceError> {
        if self.paused {
            Err(GovernanceError::Paused)
        } else {
            Ok(())
        }
    }

    /// Resolve every role `caller` holds right now.
    pub fn resolve(&self, caller: &Identity, members: &MembershipRegistry) -> Capabilities {
        Capabilities {
            caller: caller.clone(),
            owner: self.is_owner(caller),
            validator: members.is_validator(caller),
            requester: members.is_requester(caller),
        }
    }

    /// Toggle the pause flag. Setting the current value is a no-op.
    pub fn set_paused(&mut self, cap: &OwnerCapability, paused: bool) -> Option<GovernanceEvent> {
        if self.paused == paused {
            return None;
        }
        self.paused = paused;
        tracing::info!(owner = %cap.owner(), paused, "pause flag updated");
        Some(GovernanceEvent::PauseUpdated { paused })
    }

    /// Hand ownership to `new_owner`. The capability is consumed since it
    /// no longer proves anything afterwards.
    pub fn transfer_ownership(
        &mut self,
        cap: OwnerCapability,
        new_owner: Identity,
    ) -> Result<Option<GovernanceEvent>, GovernanceError> {
        if new_owner.is_empty() {
            return Err(GovernanceError::EmptyIdentity);
        }
        if self.owner == new_owner {
            return Ok(None);
        }
        let previous = std::mem::replace(&mut self.owner, new_owner.clone());
        tracing::info!(previous = %cap.owner(), owner = %new_owner, "ownership transferred");
        Ok(Some(GovernanceEvent::OwnershipTransferred {
            previous,
            owner: new_owner,
        }))
    }
}
