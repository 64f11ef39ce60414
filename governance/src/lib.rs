//! Owner-controlled governance for snapshot quorum voting.
//!
//! - [`membership`]: the closed validator and requester sets.
//! - [`policy`]: the majority fraction and default voting window.
//! - [`access`]: owner checks, role resolution and the global pause switch.
//!
//! Every mutator here takes an [`OwnerCapability`], which can only be obtained
//! from an [`AccessGate`] that recognised the caller as the owner.

pub mod access;
pub mod error;
pub mod event;
pub mod membership;
pub mod policy;

pub use access::{AccessGate, Capabilities, OwnerCapability, Role};
pub use error::GovernanceError;
pub use event::GovernanceEvent;
pub use membership::MembershipRegistry;
pub use policy::MajorityPolicy;
