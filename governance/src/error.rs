use crate::access::Role;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum GovernanceError {
    #[error("caller {caller} is not a {required}")]
    Unauthorized { caller: String, required: Role },

    #[error("system is paused")]
    Paused,

    #[error("invalid majority policy: {0}")]
    InvalidPolicy(String),

    #[error("identity must not be empty")]
    EmptyIdentity,
}
