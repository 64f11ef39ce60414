use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum StoreError {
    #[error("hash already stored for {0}")]
    Duplicate(String),

    #[error("invalid input: {0}")]
    InvalidInput(String),
}
