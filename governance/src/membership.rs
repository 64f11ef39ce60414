//! Membership registry: the closed validator and requester sets.
//!
//! Adding a present member or removing an absent one is a silent no-op: the
//! mutators return `None` and no notification is produced.

use crate::access::OwnerCapability;
use crate::error::GovernanceError;
use crate::event::GovernanceEvent;
use serde::{Deserialize, Serialize};
use snapshots_types::Identity;
use std::collections::HashSet;

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MembershipRegistry {
    validators: HashSet<Identity>,
    requesters: HashSet<Identity>,
}

impl MembershipRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_validator(
        &mut self,
        cap: &OwnerCapability,
        validator: Identity,
    ) -> Result<Option<GovernanceEvent>, GovernanceError> {
        if validator.is_empty() {
            return Err(GovernanceError::EmptyIdentity);
        }
        if !self.validators.insert(validator.clone()) {
            return Ok(None);
        }
        tracing::info!(owner = %cap.owner(), %validator, count = self.validators.len(), "validator added");
        Ok(Some(GovernanceEvent::ValidatorAdded { validator }))
    }

    /// Removing a validator never touches the vote counts of rounds that are
    /// already open; those were fixed when the round was created.
    pub fn remove_validator(
        &mut self,
        cap: &OwnerCapability,
        validator: &Identity,
    ) -> Option<GovernanceEvent> {
        if !self.validators.remove(validator) {
            return None;
        }
        tracing::info!(owner = %cap.owner(), %validator, count = self.validators.len(), "validator removed");
        Some(GovernanceEvent::ValidatorRemoved {
            validator: validator.clone(),
        })
    }

    pub fn add_requester(
        &mut self,
        cap: &OwnerCapability,
        requester: Identity,
    ) -> Result<Option<GovernanceEvent>, GovernanceError> {
        if requester.is_empty() {
            return Err(GovernanceError::EmptyIdentity);
        }
        if !self.requesters.insert(requester.clone()) {
            return Ok(None);
        }
        tracing::info!(owner = %cap.owner(), %requester, "requester added");
        Ok(Some(GovernanceEvent::RequesterAdded { requester }))
    }

    pub fn remove_requester(
        &mut self,
        cap: &OwnerCapability,
        requester: &Identity,
    ) -> Option<GovernanceEvent> {
        if !self.requesters.remove(requester) {
            return None;
        }
        tracing::info!(owner = %cap.owner(), %requester, "requester removed");
        Some(GovernanceEvent::RequesterRemoved {
            requester: requester.clone(),
        })
    }

    pub fn is_validator(&self, id: &Identity) -> bool {
        self.validators.contains(id)
    }

    pub fn is_requester(&self, id: &Identity) -> bool {
        self.requesters.contains(id)
    }

    pub fn validator_count(&self) -> u32 {
        saturating_count(self.validators.len())
    }

    pub fn requester_count(&self) -> u32 {
        saturating_count(self.requesters.len())
    }

    /// Validators in sorted order.
    pub fn validators(&self) -> Vec<&Identity> {
        let mut list: Vec<_> = self.validators.iter().collect();
        list.sort();
        list
    }

    /// Requesters in sorted order.
    pub fn requesters(&self) -> Vec<&Identity> {
        let mut list: Vec<_> = self.requesters.iter().collect();
        list.sort();
        list
    }
}

/// Set sizes past `u32::MAX` clamp rather than wrap.
fn saturating_count(len: usize) -> u32 {
    u32::try_from(len).unwrap_or(u32::MAX)
}
