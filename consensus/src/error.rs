use snapshots_types::Timestamp;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConsensusError {
    #[error("round {0} already exists")]
    DuplicateRound(String),

    #[error("validator {voter} already voted in round {round}")]
    DuplicateVote { round: String, voter: String },

    #[error("round {0} not found")]
    RoundNotFound(String),

    #[error("voting window for round {round} closed at {closed_at}")]
    WindowExpired { round: String, closed_at: Timestamp },

    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("no validators registered")]
    NoValidators,

    #[error("round {0} is finalized: every potential vote has been cast")]
    RoundFinalized(String),
}
