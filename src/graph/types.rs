//! Types for the social graph.

use std::collections::BTreeSet;

use crate::identity::UserId;

/// Snapshot of one user's friend state.
///
/// Both sets are hydrated from the edge tables at read time; this is
/// the view the synchronization engine delivers to friend-state
/// subscribers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FriendState {
    /// Ids of mutual friends.
    pub friends: BTreeSet<UserId>,
    /// Ids of users with a pending inbound request.
    pub inbound_requests: BTreeSet<UserId>,
}

impl FriendState {
    /// Returns whether the given user is a friend.
    #[must_use]
    pub fn is_friend(&self, id: &UserId) -> bool {
        self.friends.contains(id)
    }

    /// Returns whether the given user has a pending inbound request.
    #[must_use]
    pub fn has_requested(&self, id: &UserId) -> bool {
        self.inbound_requests.contains(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn membership_helpers() {
        let friend = UserId::generate();
        let requester = UserId::generate();
        let stranger = UserId::generate();

        let state = FriendState {
            friends: BTreeSet::from([friend.clone()]),
            inbound_requests: BTreeSet::from([requester.clone()]),
        };

        assert!(state.is_friend(&friend));
        assert!(!state.is_friend(&stranger));
        assert!(state.has_requested(&requester));
        assert!(!state.has_requested(&friend));
    }
}
