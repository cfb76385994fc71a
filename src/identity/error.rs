//! Error types for identity operations.

use thiserror::Error;

use crate::storage::StorageError;

/// Error type for identity operations.
#[derive(Error, Debug)]
pub enum IdentityError {
    /// Handle is already in use by another user.
    #[error("Handle already taken: {0}")]
    HandleTaken(String),

    /// Referenced user does not exist.
    #[error("User not found: {0}")]
    NotFound(String),

    /// Credential verification failed.
    #[error("Invalid credential")]
    BadCredential,

    /// Operation requires a role the actor does not have.
    #[error("Not permitted: {0}")]
    Forbidden(String),

    /// Stored data could not be interpreted.
    #[error("Invalid data: {0}")]
    InvalidData(String),

    /// Storage operation failed.
    #[error("Storage error: {0}")]
    Storage(String),

    /// Database error from `SQLite`.
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),
}

/// Result type alias for identity operations.
pub type Result<T> = std::result::Result<T, IdentityError>;

impl From<StorageError> for IdentityError {
    fn from(err: StorageError) -> Self {
        match err {
            StorageError::Database(e) => Self::Database(e),
            StorageError::Lock(msg) => Self::Storage(msg),
        }
    }
}
