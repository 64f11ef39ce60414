//! Quorum voting: the round state machine.
//!
//! A requester opens a round over a topic (a resource locator); validators
//! each submit one fingerprint of that resource. The first fingerprint whose
//! tally reaches the round's threshold becomes its consensus value.
//!
//! ## Module overview
//!
//! - [`round`]: Round state machine (Open → Completed → Finalized, or Expired).
//! - [`ledger`]: All rounds keyed by id; routes votes, answers queries.
//! - [`history`]: Topic → round ids in open order.
//! - [`event`]: Notifications produced by round transitions.
//! - [`error`]: Consensus error types.

pub mod error;
pub mod event;
pub mod history;
pub mod ledger;
pub mod round;

pub use error::ConsensusError;
pub use event::RoundEvent;
pub use history::HistoryIndex;
pub use ledger::RoundLedger;
pub use round::{Round, RoundState, RoundTerms};
