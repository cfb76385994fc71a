//! Types for 1:1 messaging.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::identity::UserId;

/// Unique identifier of a message.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MessageId(String);

impl MessageId {
    /// Generates a fresh random id.
    #[must_use]
    pub fn generate() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }

    /// Returns the id as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for MessageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<String> for MessageId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for MessageId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// A stored message between two users.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    /// Unique id.
    pub id: MessageId,
    /// Sender endpoint.
    pub from: UserId,
    /// Recipient endpoint.
    pub to: UserId,
    /// Message text.
    pub body: String,
    /// When the message was sent (Unix timestamp).
    pub sent_at: i64,
    /// Whether the recipient has read the message.
    pub read: bool,
}

impl Message {
    /// Returns whether the message belongs to the conversation between
    /// the given (unordered) pair of users.
    #[must_use]
    pub fn is_between(&self, a: &UserId, b: &UserId) -> bool {
        (&self.from == a && &self.to == b) || (&self.from == b && &self.to == a)
    }
}

/// Input to [`ConversationStore::send`](super::ConversationStore::send).
#[derive(Debug, Clone)]
pub struct MessageDraft {
    /// Sender endpoint.
    pub from: UserId,
    /// Recipient endpoint.
    pub to: UserId,
    /// Message text.
    pub body: String,
    /// Explicit timestamp; defaults to now when absent.
    pub sent_at: Option<i64>,
}

impl MessageDraft {
    /// Creates a draft timestamped at send time.
    #[must_use]
    pub fn new(from: UserId, to: UserId, body: impl Into<String>) -> Self {
        Self {
            from,
            to,
            body: body.into(),
            sent_at: None,
        }
    }

    /// Sets an explicit timestamp.
    #[must_use]
    pub const fn at(mut self, sent_at: i64) -> Self {
        self.sent_at = Some(sent_at);
        self
    }
}
