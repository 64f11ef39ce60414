//! Snapshot quorum node: the single owner of all voting state.
//!
//! The node is the boundary every operation passes through. For each call it:
//! - Takes the state lock, so operations are applied one at a time in a total order
//! - Checks the pause switch, then resolves the caller's roles once
//! - Hands the authorized identity to the governance or round state machine
//! - Publishes resulting notifications on the [`EventBus`] before releasing the lock
//! - Updates Prometheus metrics and structured logs

pub mod config;
pub mod error;
pub mod event;
pub mod metrics;
pub mod node;
pub mod state;
pub mod tracing_spans;
pub mod view;

pub use config::NodeConfig;
pub use error::{ErrorKind, NodeError};
pub use event::{EventBus, NodeEvent, StoreEvent};
pub use metrics::NodeMetrics;
pub use node::SnapshotsNode;
pub use state::NodeState;
pub use view::{RoundView, TallyEntry};
