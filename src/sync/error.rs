//! Error types for the synchronization engine.

use thiserror::Error;

use crate::content::ContentError;
use crate::conversation::ConversationError;
use crate::graph::GraphError;
use crate::identity::IdentityError;

/// Error type for synchronization operations.
#[derive(Error, Debug)]
pub enum SyncError {
    /// A backend refused a write it could not absorb. The bundled
    /// SQLite backend evicts instead, so it never raises this; remote
    /// backends without eviction may.
    #[error("Capacity exceeded: {0}")]
    CapacityExceeded(String),

    /// Identity read failed.
    #[error("Identity error: {0}")]
    Identity(String),

    /// Social graph read failed.
    #[error("Graph error: {0}")]
    Graph(String),

    /// Content read failed.
    #[error("Content error: {0}")]
    Content(String),

    /// Conversation read failed.
    #[error("Conversation error: {0}")]
    Conversation(String),
}

/// Result type alias for synchronization operations.
pub type Result<T> = std::result::Result<T, SyncError>;

impl From<IdentityError> for SyncError {
    fn from(err: IdentityError) -> Self {
        Self::Identity(err.to_string())
    }
}

impl From<GraphError> for SyncError {
    fn from(err: GraphError) -> Self {
        Self::Graph(err.to_string())
    }
}

impl From<ContentError> for SyncError {
    fn from(err: ContentError) -> Self {
        Self::Content(err.to_string())
    }
}

impl From<ConversationError> for SyncError {
    fn from(err: ConversationError) -> Self {
        Self::Conversation(err.to_string())
    }
}
