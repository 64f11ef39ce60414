//! Notifications emitted when owner-controlled state actually changes.

use snapshots_types::Identity;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum GovernanceEvent {
    ValidatorAdded { validator: Identity },
    ValidatorRemoved { validator: Identity },
    RequesterAdded { requester: Identity },
    RequesterRemoved { requester: Identity },
    MajorityUpdated { numerator: u32, denominator: u32 },
    WindowUpdated { window_secs: u64 },
    PauseUpdated { paused: bool },
    OwnershipTransferred { previous: Identity, owner: Identity },
}
