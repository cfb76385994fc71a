//! Error types for conversation operations.

use thiserror::Error;

use crate::storage::StorageError;

/// Error type for conversation operations.
#[derive(Error, Debug)]
pub enum ConversationError {
    /// Referenced message does not exist.
    #[error("Message not found: {0}")]
    NotFound(String),

    /// Storage operation failed.
    #[error("Storage error: {0}")]
    Storage(String),

    /// Database error from `SQLite`.
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),
}

/// Result type alias for conversation operations.
pub type Result<T> = std::result::Result<T, ConversationError>;

impl From<StorageError> for ConversationError {
    fn from(err: StorageError) -> Self {
        match err {
            StorageError::Database(e) => Self::Database(e),
            StorageError::Lock(msg) => Self::Storage(msg),
        }
    }
}
