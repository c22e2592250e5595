//! Store error types

use thiserror::Error;

/// Errors reported by persistence collaborators
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// The referenced conversation does not exist
    #[error("Chat not found: {0}")]
    ChatNotFound(String),

    /// The backing store rejected the write
    #[error("Write failed: {0}")]
    WriteFailed(String),
}

/// Result type alias for store operations
pub type StoreResult<T> = Result<T, StoreError>;
