//! Fundamental types for snapshot quorum voting.
//!
//! This crate defines the types shared across every other crate in the workspace:
//! caller identities, round identifiers, content fingerprints, timestamps and the
//! clock abstraction the state machine reads time from.

pub mod fingerprint;
pub mod identity;
pub mod round_id;
pub mod time;

pub use fingerprint::{Fingerprint, ParseFingerprintError};
pub use identity::Identity;
pub use round_id::RoundId;
pub use time::{Clock, SystemClock, Timestamp};
