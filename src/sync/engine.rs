//! Subscription engine over the stores and the change feed.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::broadcast::error::RecvError;
use tokio::sync::mpsc;
use tokio::time;

use super::error::Result;
use super::types::{Delivery, Subscription};
use crate::content::{ContentRepository, Post};
use crate::conversation::{ConversationStore, Message};
use crate::feed::{Change, ChangeFeed};
use crate::graph::{FriendState, SocialGraphManager};
use crate::identity::UserId;

/// Per-subscription channel depth. A slow consumer backpressures its
/// own task, never the stores.
const SUBSCRIPTION_BUFFER: usize = 16;

/// Shortest accepted poll interval; `tokio::time::interval` rejects a
/// zero duration.
const MIN_POLL_INTERVAL: Duration = Duration::from_millis(1);

/// Runs subscriptions against the stores.
///
/// Each subscription is a spawned task that re-reads the watched state
/// and delivers whole snapshots. Both delivery modes give the same
/// guarantee: every confirmed write to a watched entity is eventually
/// reflected in the subscriber's channel. Intermediate states may be
/// skipped.
pub struct SyncEngine {
    content: Arc<ContentRepository>,
    conversations: Arc<ConversationStore>,
    graph: Arc<SocialGraphManager>,
    feed: Arc<ChangeFeed>,
}

impl SyncEngine {
    /// Creates an engine over the given stores and change feed.
    #[must_use]
    pub const fn new(
        content: Arc<ContentRepository>,
        conversations: Arc<ConversationStore>,
        graph: Arc<SocialGraphManager>,
        feed: Arc<ChangeFeed>,
    ) -> Self {
        Self {
            content,
            conversations,
            graph,
            feed,
        }
    }

    /// Watches the post feed as seen by a viewer.
    ///
    /// # Errors
    ///
    /// Returns an error if the initial read fails.
    pub fn subscribe_feed(
        &self,
        viewer: &UserId,
        delivery: Delivery,
    ) -> Result<Subscription<Vec<Post>>> {
        let content = Arc::clone(&self.content);
        let viewer = viewer.clone();
        self.spawn_subscription(
            delivery,
            move || Ok(content.feed(&viewer)?),
            |change| matches!(change, Change::Post { .. }),
        )
    }

    /// Watches the conversation between two users.
    ///
    /// # Errors
    ///
    /// Returns an error if the initial read fails.
    pub fn subscribe_conversation(
        &self,
        a: &UserId,
        b: &UserId,
        delivery: Delivery,
    ) -> Result<Subscription<Vec<Message>>> {
        let conversations = Arc::clone(&self.conversations);
        let (left, right) = (a.clone(), b.clone());
        let (filter_left, filter_right) = (a.clone(), b.clone());
        self.spawn_subscription(
            delivery,
            move || Ok(conversations.between(&left, &right)?),
            move |change| match change {
                Change::Message { from, to } => {
                    (from == &filter_left && to == &filter_right)
                        || (from == &filter_right && to == &filter_left)
                }
                _ => false,
            },
        )
    }

    /// Watches a user's friends and inbound requests.
    ///
    /// Any user change triggers a re-read: a friend being deleted
    /// shrinks this user's friend set without publishing a change for
    /// this user's id.
    ///
    /// # Errors
    ///
    /// Returns an error if the initial read fails.
    pub fn subscribe_friend_state(
        &self,
        user: &UserId,
        delivery: Delivery,
    ) -> Result<Subscription<FriendState>> {
        let graph = Arc::clone(&self.graph);
        let user = user.clone();
        self.spawn_subscription(
            delivery,
            move || Ok(graph.friend_state(&user)?),
            |change| matches!(change, Change::User { .. }),
        )
    }

    /// Delivers an initial snapshot, then spawns the delivery task.
    fn spawn_subscription<T, R, F>(
        &self,
        delivery: Delivery,
        read: R,
        relevant: F,
    ) -> Result<Subscription<T>>
    where
        T: Send + 'static,
        R: Fn() -> Result<T> + Send + 'static,
        F: Fn(&Change) -> bool + Send + 'static,
    {
        match delivery {
            Delivery::Poll { interval } => {
                let interval = interval.max(MIN_POLL_INTERVAL);
                let (tx, rx) = Self::primed_channel(read()?);
                tokio::spawn(async move {
                    let mut ticker = time::interval(interval);
                    // The first tick completes immediately; the initial
                    // snapshot already covers it.
                    ticker.tick().await;
                    loop {
                        ticker.tick().await;
                        match read() {
                            Ok(snapshot) => {
                                if tx.send(snapshot).await.is_err() {
                                    break;
                                }
                            }
                            Err(err) => {
                                tracing::warn!(error = %err, "poll tick failed, retrying on next tick");
                            }
                        }
                    }
                });
                Ok(Subscription::new(rx))
            }
            Delivery::Push => {
                // Subscribe before the initial read: a write committed
                // in between sits in the receiver backlog and triggers
                // a re-read instead of being lost.
                let mut changes = self.feed.subscribe();
                let (tx, rx) = Self::primed_channel(read()?);
                tokio::spawn(async move {
                    loop {
                        match changes.recv().await {
                            Ok(change) => {
                                if !relevant(&change) {
                                    continue;
                                }
                            }
                            Err(RecvError::Lagged(skipped)) => {
                                // Missed changes; a full re-read recovers.
                                tracing::warn!(skipped, "change feed lagged, re-reading");
                            }
                            Err(RecvError::Closed) => break,
                        }
                        match read() {
                            Ok(snapshot) => {
                                if tx.send(snapshot).await.is_err() {
                                    break;
                                }
                            }
                            Err(err) => {
                                tracing::warn!(error = %err, "refresh after change failed, awaiting next change");
                            }
                        }
                    }
                });
                Ok(Subscription::new(rx))
            }
        }
    }

    /// Channel with the initial snapshot already enqueued.
    fn primed_channel<T>(initial: T) -> (mpsc::Sender<T>, mpsc::Receiver<T>) {
        let (tx, rx) = mpsc::channel(SUBSCRIPTION_BUFFER);
        // Fresh channel with room; cannot fail.
        let _ = tx.try_send(initial);
        (tx, rx)
    }
}
