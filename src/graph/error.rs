//! Error types for social graph operations.

use thiserror::Error;

use crate::conversation::ConversationError;
use crate::identity::IdentityError;
use crate::storage::StorageError;

/// Error type for social graph operations.
#[derive(Error, Debug)]
pub enum GraphError {
    /// Referenced user or pending request does not exist.
    #[error("Not found: {0}")]
    NotFound(String),

    /// A user tried to friend-request themself.
    #[error("Cannot send a friend request to yourself")]
    SelfRequest,

    /// The pair is already friends.
    #[error("Already friends: {0}")]
    AlreadyFriends(String),

    /// A request from this user is already pending.
    #[error("Request already pending: {0}")]
    AlreadyRequested(String),

    /// Identity store failure other than not-found.
    #[error("Identity error: {0}")]
    Identity(String),

    /// Failure while seeding the conversation on acceptance.
    #[error("Conversation error: {0}")]
    Conversation(String),

    /// Storage operation failed.
    #[error("Storage error: {0}")]
    Storage(String),

    /// Database error from `SQLite`.
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),
}

/// Result type alias for social graph operations.
pub type Result<T> = std::result::Result<T, GraphError>;

impl From<IdentityError> for GraphError {
    fn from(err: IdentityError) -> Self {
        match err {
            IdentityError::NotFound(s) => Self::NotFound(s),
            IdentityError::Database(e) => Self::Database(e),
            IdentityError::Storage(s) => Self::Storage(s),
            other => Self::Identity(other.to_string()),
        }
    }
}

impl From<ConversationError> for GraphError {
    fn from(err: ConversationError) -> Self {
        Self::Conversation(err.to_string())
    }
}

impl From<StorageError> for GraphError {
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
    fn self_request_display() {
        assert_eq!(
            GraphError::SelfRequest.to_string(),
            "Cannot send a friend request to yourself"
        );
    }

    #[test]
    fn identity_not_found_maps_to_not_found() {
        let err: GraphError = IdentityError::NotFound("bob1".to_string()).into();
        assert!(matches!(err, GraphError::NotFound(s) if s == "bob1"));
    }

    #[test]
    fn other_identity_errors_are_wrapped() {
        let err: GraphError = IdentityError::BadCredential.into();
        assert!(matches!(err, GraphError::Identity(_)));
    }
}
