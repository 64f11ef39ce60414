//! Voting round identifier.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Globally unique key of a voting round, typically a UUID chosen by the requester.
///
/// Once a round has been opened under an id, that id can never be reused.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct RoundId(String);

impl RoundId {
    pub fn new(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for RoundId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for RoundId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for RoundId {
    fn from(s: &str) -> Self {
        Self(s.to_owned())
    }
}
