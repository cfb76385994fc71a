//! In-process change feed.
//!
//! Every committed write to a watched collection publishes exactly one
//! [`Change`] after the commit. The push delivery path of the
//! synchronization engine consumes the feed and re-applies the read-side
//! filter before redelivering to subscribers. Publishing with no active
//! subscribers is a no-op.

use tokio::sync::broadcast;

use crate::content::PostId;
use crate::identity::UserId;

/// Buffered changes per subscriber before the receiver lags.
///
/// A lagged receiver re-runs its read instead of replaying missed
/// changes, so the buffer only needs to absorb short bursts.
const FEED_CAPACITY: usize = 256;

/// A committed write to a watched collection.
///
/// Each variant carries the typed payload needed to decide relevance
/// to a subscription without re-reading the store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Change {
    /// A user record changed (profile edit, presence, friend state).
    User {
        /// The affected user.
        id: UserId,
    },
    /// A post was created, mutated, or deleted.
    Post {
        /// The affected post.
        id: PostId,
    },
    /// A message was appended to or mutated in a conversation.
    Message {
        /// Sender endpoint.
        from: UserId,
        /// Recipient endpoint.
        to: UserId,
    },
}

/// Broadcast channel for committed writes.
pub struct ChangeFeed {
    tx: broadcast::Sender<Change>,
}

impl ChangeFeed {
    /// Creates a new change feed.
    #[must_use]
    pub fn new() -> Self {
        let (tx, _rx) = broadcast::channel(FEED_CAPACITY);
        Self { tx }
    }

    /// Publishes a change to all active subscribers.
    ///
    /// Delivery is best-effort; a send with no subscribers is silently
    /// dropped and lagged subscribers recover by re-reading.
    pub fn publish(&self, change: Change) {
        let _ = self.tx.send(change);
    }

    /// Subscribes to the feed from this point forward.
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<Change> {
        self.tx.subscribe()
    }

    /// Returns the number of active subscribers.
    #[must_use]
    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }
}

impl Default for ChangeFeed {
    fn default() -> Self {
        Self::new()
    }
}
