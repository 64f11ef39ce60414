use snapshots_consensus::ConsensusError;
use snapshots_governance::GovernanceError;
use snapshots_store::StoreError;
use std::fmt;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum NodeError {
    #[error("governance error: {0}")]
    Governance(#[from] GovernanceError),

    #[error("consensus error: {0}")]
    Consensus(#[from] ConsensusError),

    #[error("store error: {0}")]
    Store(#[from] StoreError),

    #[error("config error: {0}")]
    Config(String),

    #[error("state file error: {0}")]
    State(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Flat classification of every failure a node operation can report.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Caller lacks the required role.
    Unauthorized,
    /// The system is halted.
    Paused,
    DuplicateRound,
    DuplicateVote,
    /// A hash-store id that was already bound.
    DuplicateRecord,
    /// Unknown round id.
    NotFound,
    /// Vote arrived after the round's window closed.
    WindowExpired,
    /// Every potential vote of the round has been cast already.
    RoundFinalized,
    InvalidInput,
    InvalidPolicy,
    NoValidators,
    Config,
    Storage,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Unauthorized => "unauthorized",
            Self::Paused => "paused",
            Self::DuplicateRound => "duplicate_round",
            Self::DuplicateVote => "duplicate_vote",
            Self::DuplicateRecord => "duplicate_record",
            Self::NotFound => "not_found",
            Self::WindowExpired => "window_expired",
            Self::RoundFinalized => "round_finalized",
            Self::InvalidInput => "invalid_input",
            Self::InvalidPolicy => "invalid_policy",
            Self::NoValidators => "no_validators",
            Self::Config => "config",
            Self::Storage => "storage",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl NodeError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Governance(e) => match e {
                GovernanceError::Unauthorized { .. } => ErrorKind::Unauthorized,
                GovernanceError::Paused => ErrorKind::Paused,
                GovernanceError::InvalidPolicy(_) => ErrorKind::InvalidPolicy,
                GovernanceError::EmptyIdentity => ErrorKind::InvalidInput,
            },
            Self::Consensus(e) => match e {
                ConsensusError::DuplicateRound(_) => ErrorKind::DuplicateRound,
                ConsensusError::DuplicateVote { .. } => ErrorKind::DuplicateVote,
                ConsensusError::RoundNotFound(_) => ErrorKind::NotFound,
                ConsensusError::WindowExpired { .. } => ErrorKind::WindowExpired,
                ConsensusError::InvalidInput(_) => ErrorKind::InvalidInput,
                ConsensusError::NoValidators => ErrorKind::NoValidators,
                ConsensusError::RoundFinalized(_) => ErrorKind::RoundFinalized,
            },
            Self::Store(e) => match e {
                StoreError::Duplicate(_) => ErrorKind::DuplicateRecord,
                StoreError::InvalidInput(_) => ErrorKind::InvalidInput,
            },
            Self::Config(_) => ErrorKind::Config,
            Self::State(_) | Self::Io(_) => ErrorKind::Storage,
        }
    }
}
