//! Error types for content operations.

use thiserror::Error;

use crate::storage::StorageError;

/// Error type for content operations.
#[derive(Error, Debug)]
pub enum ContentError {
    /// Referenced post does not exist (or is not visible to the caller).
    #[error("Post not found: {0}")]
    NotFound(String),

    /// Actor is neither the author nor an administrator.
    #[error("Not permitted: {0}")]
    Forbidden(String),

    /// Storage operation failed.
    #[error("Storage error: {0}")]
    Storage(String),

    /// Database error from `SQLite`.
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),
}

/// Result type alias for content operations.
pub type Result<T> = std::result::Result<T, ContentError>;

impl From<StorageError> for ContentError {
    fn from(err: StorageError) -> Self {
        match err {
            StorageError::Database(e) => Self::Database(e),
            StorageError::Lock(msg) => Self::Storage(msg),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn not_found_display() {
        let err = ContentError::NotFound("post-1".to_string());
        assert_eq!(err.to_string(), "Post not found: post-1");
    }

    #[test]
    fn forbidden_display() {
        let err = ContentError::Forbidden("delete requires author or admin".to_string());
        assert_eq!(
            err.to_string(),
            "Not permitted: delete requires author or admin"
        );
    }
}
