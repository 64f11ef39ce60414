//! Pre-built [`tracing::Span`] constructors for node operations.
//!
//! Consistent span names and field sets make it easy to filter and
//! correlate log lines per round or per caller.

use tracing::{info_span, Span};

/// Span covering a requester opening a round.
pub fn open_round_span(round: &str, caller: &str) -> Span {
    info_span!("open_round", round = %round, caller = %caller)
}

/// Span covering a validator's vote on a round.
pub fn vote_span(round: &str, caller: &str) -> Span {
    info_span!("vote", round = %round, caller = %caller)
}

/// Span covering an owner-only management action.
pub fn admin_span(action: &str, caller: &str) -> Span {
    info_span!("admin", action = %action, caller = %caller)
}

/// Span covering a write to the companion hash store.
pub fn store_span(id: &str) -> Span {
    info_span!("store_hash", id = %id)
}
