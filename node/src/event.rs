//! Notifications published by the node for off-system observers.

use serde::{Deserialize, Serialize};
use snapshots_consensus::RoundEvent;
use snapshots_governance::GovernanceEvent;
use snapshots_types::{Fingerprint, Timestamp};

/// Notifications from the companion hash store.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum StoreEvent {
    HashStored {
        id: String,
        hash: Fingerprint,
        stored_at: Timestamp,
    },
}

/// Every notification the node publishes. Serialises as the inner event,
/// which carries its own `event` tag.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum NodeEvent {
    Round(RoundEvent),
    Governance(GovernanceEvent),
    Store(StoreEvent),
}

impl From<RoundEvent> for NodeEvent {
    fn from(event: RoundEvent) -> Self {
        Self::Round(event)
    }
}

impl From<GovernanceEvent> for NodeEvent {
    fn from(event: GovernanceEvent) -> Self {
        Self::Governance(event)
    }
}

impl From<StoreEvent> for NodeEvent {
    fn from(event: StoreEvent) -> Self {
        Self::Store(event)
    }
}

/// Synchronous fan-out event bus.
///
/// Listeners are invoked inline while the node still holds its state lock,
/// so they observe events in commit order. Keep handlers fast, and never
/// call back into the node from one: that would deadlock.
pub struct EventBus {
    listeners: Vec<Box<dyn Fn(&NodeEvent) + Send + Sync>>,
}

impl EventBus {
    pub fn new() -> Self {
        Self {
            listeners: Vec::new(),
        }
    }

    pub fn subscribe(&mut self, listener: Box<dyn Fn(&NodeEvent) + Send + Sync>) {
        self.listeners.push(listener);
    }

    pub fn emit(&self, event: &NodeEvent) {
        for listener in &self.listeners {
            listener(event);
        }
    }

    pub fn listener_count(&self) -> usize {
        self.listeners.len()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}
