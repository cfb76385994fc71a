//! High-level social graph API.
//!
//! Combines the identity store (handle resolution, user lookup) with
//! row-level mutations of the `friend_edges` and `friend_requests`
//! tables, and seeds the conversation on acceptance.

use std::sync::Arc;

use rusqlite::params;

use super::error::{GraphError, Result};
use super::types::FriendState;
use crate::conversation::{ConversationStore, MessageDraft};
use crate::feed::{Change, ChangeFeed};
use crate::identity::{IdentityStore, UserId};
use crate::storage::Database;

/// High-level API for the friend-request lifecycle.
///
/// # Example
///
/// ```ignore
/// use agora_core::graph::SocialGraphManager;
///
/// let graph = SocialGraphManager::new(db, identity, conversations, feed);
/// graph.send_request(&alice.id, "bob1")?;
/// graph.accept_request(&bob.id, &alice.id)?;
/// ```
pub struct SocialGraphManager {
    db: Arc<Database>,
    identity: Arc<IdentityStore>,
    conversations: Arc<ConversationStore>,
    feed: Arc<ChangeFeed>,
}

impl SocialGraphManager {
    /// Creates a manager over the shared database and stores.
    #[must_use]
    pub const fn new(
        db: Arc<Database>,
        identity: Arc<IdentityStore>,
        conversations: Arc<ConversationStore>,
        feed: Arc<ChangeFeed>,
    ) -> Self {
        Self {
            db,
            identity,
            conversations,
            feed,
        }
    }

    /// Sends a friend request, resolving the target by handle.
    ///
    /// On success the sender's id is added to the target's pending set
    /// as a single row insert, so concurrent requests against the same
    /// target converge to the union of requesters.
    ///
    /// # Errors
    ///
    /// Returns [`GraphError::NotFound`] if either user is missing,
    /// [`GraphError::SelfRequest`] for a self-targeting request,
    /// [`GraphError::AlreadyFriends`] or [`GraphError::AlreadyRequested`]
    /// when the pair is not in the `None` state.
    pub fn send_request(&self, from: &UserId, to_handle: &str) -> Result<()> {
        let sender = self.identity.get(from)?;
        let target = self.identity.get_by_handle(to_handle)?;

        if target.id == sender.id {
            return Err(GraphError::SelfRequest);
        }
        if target.friends.contains(&sender.id) {
            return Err(GraphError::AlreadyFriends(target.handle));
        }
        if target.friend_requests.contains(&sender.id) {
            return Err(GraphError::AlreadyRequested(target.handle));
        }

        let now = chrono::Utc::now().timestamp();
        {
            let conn = self.db.lock()?;
            conn.execute(
                r"
                INSERT OR IGNORE INTO friend_requests (target_id, requester_id, requested_at)
                VALUES (?1, ?2, ?3)
                ",
                params![target.id.as_str(), sender.id.as_str(), now],
            )?;
        }

        self.feed.publish(Change::User { id: target.id });
        Ok(())
    }

    /// Accepts a pending friend request.
    ///
    /// In one transaction: both friendship edges are inserted, the
    /// pending row is removed, and a system-authored message from the
    /// requester to the accepter is stored to seed the conversation.
    /// Friendship symmetry, the friends/pending exclusivity invariant,
    /// and the seed message all land atomically; once the edges exist
    /// the announcement cannot be lost.
    ///
    /// # Errors
    ///
    /// Returns [`GraphError::NotFound`] if either user or the pending
    /// request does not exist.
    pub fn accept_request(&self, user: &UserId, requester: &UserId) -> Result<()> {
        let accepter = self.identity.get(user)?;
        let requesting = self.identity.get(requester)?;

        let now = chrono::Utc::now().timestamp();
        let announcement = {
            let mut conn = self.db.lock()?;
            let tx = conn.transaction()?;

            let removed = tx.execute(
                "DELETE FROM friend_requests WHERE target_id = ?1 AND requester_id = ?2",
                params![user.as_str(), requester.as_str()],
            )?;
            if removed == 0 {
                return Err(GraphError::NotFound(format!(
                    "no pending request from {requester} to {user}"
                )));
            }

            tx.execute(
                "INSERT OR IGNORE INTO friend_edges (user_id, friend_id, created_at) VALUES (?1, ?2, ?3)",
                params![user.as_str(), requester.as_str(), now],
            )?;
            tx.execute(
                "INSERT OR IGNORE INTO friend_edges (user_id, friend_id, created_at) VALUES (?1, ?2, ?3)",
                params![requester.as_str(), user.as_str(), now],
            )?;

            // Required side effect: seed the conversation with an
            // announcement from the requester to the accepter.
            let announcement = self.conversations.insert(
                &tx,
                MessageDraft::new(
                    requesting.id.clone(),
                    accepter.id.clone(),
                    format!(
                        "{} and {} are now friends.",
                        requesting.display_name, accepter.display_name
                    ),
                ),
            )?;

            tx.commit()?;
            announcement
        };

        self.feed.publish(Change::User { id: accepter.id });
        self.feed.publish(Change::User { id: requesting.id });
        self.feed.publish(Change::Message {
            from: announcement.from,
            to: announcement.to,
        });
        Ok(())
    }

    /// Withdraws a request the sender made earlier.
    ///
    /// # Errors
    ///
    /// Returns [`GraphError::NotFound`] if no such request is pending.
    pub fn cancel_request(&self, from: &UserId, target: &UserId) -> Result<()> {
        self.remove_request(target, from)
    }

    /// Declines a pending inbound request.
    ///
    /// # Errors
    ///
    /// Returns [`GraphError::NotFound`] if no such request is pending.
    pub fn decline_request(&self, user: &UserId, requester: &UserId) -> Result<()> {
        self.remove_request(user, requester)
    }

    /// Dissolves an existing friendship.
    ///
    /// Both edges are removed in one transaction; the pair returns to
    /// the `None` state.
    ///
    /// # Errors
    ///
    /// Returns [`GraphError::NotFound`] if the pair is not friends.
    pub fn unfriend(&self, user: &UserId, other: &UserId) -> Result<()> {
        {
            let mut conn = self.db.lock()?;
            let tx = conn.transaction()?;

            let removed = tx.execute(
                "DELETE FROM friend_edges WHERE user_id = ?1 AND friend_id = ?2",
                params![user.as_str(), other.as_str()],
            )? + tx.execute(
                "DELETE FROM friend_edges WHERE user_id = ?1 AND friend_id = ?2",
                params![other.as_str(), user.as_str()],
            )?;
            if removed == 0 {
                return Err(GraphError::NotFound(format!(
                    "{user} and {other} are not friends"
                )));
            }

            tx.commit()?;
        }

        self.feed.publish(Change::User { id: user.clone() });
        self.feed.publish(Change::User { id: other.clone() });
        Ok(())
    }

    /// Returns a snapshot of one user's friend state.
    ///
    /// # Errors
    ///
    /// Returns [`GraphError::NotFound`] if the user does not exist.
    pub fn friend_state(&self, user: &UserId) -> Result<FriendState> {
        let user = self.identity.get(user)?;
        Ok(FriendState {
            friends: user.friends,
            inbound_requests: user.friend_requests,
        })
    }

    fn remove_request(&self, target: &UserId, requester: &UserId) -> Result<()> {
        let removed = {
            let conn = self.db.lock()?;
            conn.execute(
                "DELETE FROM friend_requests WHERE target_id = ?1 AND requester_id = ?2",
                params![target.as_str(), requester.as_str()],
            )?
        };

        if removed == 0 {
            return Err(GraphError::NotFound(format!(
                "no pending request from {requester} to {target}"
            )));
        }

        self.feed.publish(Change::User { id: target.clone() });
        Ok(())
    }
}
