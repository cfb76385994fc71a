//! Core types for user identity.

use std::collections::BTreeSet;
use std::fmt;

use serde::{Deserialize, Serialize};

use super::credential::CredentialHash;

/// Unique, immutable identifier of a user.
///
/// Distinct from the handle: the id never changes, the handle is
/// human-chosen and renameable.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(String);

impl UserId {
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

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<String> for UserId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for UserId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// Role flag on a user record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Role {
    /// Ordinary user.
    #[default]
    Member,
    /// Administrator; may delete users and other users' posts.
    Admin,
}

impl Role {
    /// Converts to string representation for storage.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Member => "member",
            Self::Admin => "admin",
        }
    }

    /// Parses from string representation.
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "member" => Some(Self::Member),
            "admin" => Some(Self::Admin),
            _ => None,
        }
    }
}

/// Presence status of a user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Presence {
    /// Actively connected.
    Online,
    /// Connected but idle.
    Away,
    /// Not connected.
    #[default]
    Offline,
}

impl Presence {
    /// Converts to string representation for storage.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Online => "online",
            Self::Away => "away",
            Self::Offline => "offline",
        }
    }

    /// Parses from string representation.
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "online" => Some(Self::Online),
            "away" => Some(Self::Away),
            "offline" => Some(Self::Offline),
            _ => None,
        }
    }
}

/// A user record.
///
/// The `friends` and `friend_requests` sets are hydrated from edge
/// tables on every read. Profile updates never write them; only the
/// social graph manager mutates them, one row at a time, so concurrent
/// writers converge to the union of their additions.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    /// Unique immutable id.
    pub id: UserId,
    /// Globally unique, renameable handle.
    pub handle: String,
    /// Display name shown to other users.
    pub display_name: String,
    /// Salted credential hash.
    pub credential: CredentialHash,
    /// Reference to profile media (URL or inline representation).
    pub avatar: Option<String>,
    /// Role flag.
    pub role: Role,
    /// Presence status.
    pub presence: Presence,
    /// Ids of mutual friends (symmetric with each friend's set).
    pub friends: BTreeSet<UserId>,
    /// Ids of users with an inbound pending request to this user.
    /// Never overlaps with `friends`.
    pub friend_requests: BTreeSet<UserId>,
    /// When the record was created (Unix timestamp).
    pub created_at: i64,
    /// When the record was last updated (Unix timestamp).
    pub updated_at: i64,
}

impl User {
    /// Returns whether this user is an administrator.
    #[must_use]
    pub const fn is_admin(&self) -> bool {
        matches!(self.role, Role::Admin)
    }
}

/// Profile input for signup and profile edits.
#[derive(Debug, Clone)]
pub struct UserProfile {
    /// Requested handle.
    pub handle: String,
    /// Display name.
    pub display_name: String,
    /// Optional profile media reference.
    pub avatar: Option<String>,
    /// Role flag.
    pub role: Role,
}

impl UserProfile {
    /// Creates a new profile with the default role.
    #[must_use]
    pub fn new(handle: impl Into<String>, display_name: impl Into<String>) -> Self {
        Self {
            handle: handle.into(),
            display_name: display_name.into(),
            avatar: None,
            role: Role::default(),
        }
    }

    /// Sets the avatar reference.
    #[must_use]
    pub fn with_avatar(mut self, avatar: impl Into<String>) -> Self {
        self.avatar = Some(avatar.into());
        self
    }

    /// Sets the role.
    #[must_use]
    pub const fn with_role(mut self, role: Role) -> Self {
        self.role = role;
        self
    }
}

/// Ephemeral binding of a client to a user.
///
/// Holds a denormalized copy of the [`User`] record; a successful
/// profile update on the session's user refreshes the snapshot.
/// Created on login, invalidated on logout.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Session {
    /// Snapshot of the authenticated user.
    pub user: User,
    /// When the session was created (Unix timestamp).
    pub created_at: i64,
}

impl Session {
    /// Returns the id of the authenticated user.
    #[must_use]
    pub const fn user_id(&self) -> &UserId {
        &self.user.id
    }

    /// Returns whether the session belongs to an administrator.
    #[must_use]
    pub const fn is_admin(&self) -> bool {
        self.user.is_admin()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::identity::Secret;

    #[test]
    fn user_id_generate_is_unique() {
        assert_ne!(UserId::generate(), UserId::generate());
    }

    #[test]
    fn user_id_display_matches_as_str() {
        let id = UserId::from("abc-123");
        assert_eq!(id.to_string(), "abc-123");
        assert_eq!(id.as_str(), "abc-123");
    }

    #[test]
    fn role_default() {
        assert_eq!(Role::default(), Role::Member);
    }

    #[test]
    fn role_as_str() {
        assert_eq!(Role::Member.as_str(), "member");
        assert_eq!(Role::Admin.as_str(), "admin");
    }

    #[test]
    fn role_parse() {
        assert_eq!(Role::parse("member"), Some(Role::Member));
        assert_eq!(Role::parse("admin"), Some(Role::Admin));
        assert_eq!(Role::parse("invalid"), None);
    }

    #[test]
    fn presence_default() {
        assert_eq!(Presence::default(), Presence::Offline);
    }

    #[test]
    fn presence_as_str_parse_round_trip() {
        for presence in [Presence::Online, Presence::Away, Presence::Offline] {
            assert_eq!(Presence::parse(presence.as_str()), Some(presence));
        }
        assert_eq!(Presence::parse("invalid"), None);
    }

    #[test]
    fn profile_builder() {
        let profile = UserProfile::new("alice1", "Alice")
            .with_avatar("https://media.example.com/alice.jpg")
            .with_role(Role::Admin);

        assert_eq!(profile.handle, "alice1");
        assert_eq!(profile.display_name, "Alice");
        assert_eq!(
            profile.avatar,
            Some("https://media.example.com/alice.jpg".to_string())
        );
        assert_eq!(profile.role, Role::Admin);
    }

    #[test]
    fn profile_new_defaults() {
        let profile = UserProfile::new("bob1", "Bob");
        assert!(profile.avatar.is_none());
        assert_eq!(profile.role, Role::Member);
    }

    fn sample_user() -> User {
        User {
            id: UserId::from("user-1"),
            handle: "alice1".to_string(),
            display_name: "Alice".to_string(),
            credential: CredentialHash::derive(&Secret::new("pw")),
            avatar: None,
            role: Role::Member,
            presence: Presence::Offline,
            friends: BTreeSet::new(),
            friend_requests: BTreeSet::new(),
            created_at: 1_000,
            updated_at: 1_000,
        }
    }

    #[test]
    fn user_is_admin() {
        let mut user = sample_user();
        assert!(!user.is_admin());
        user.role = Role::Admin;
        assert!(user.is_admin());
    }

    #[test]
    fn session_exposes_user_id_and_role() {
        let mut user = sample_user();
        user.role = Role::Admin;
        let session = Session {
            user,
            created_at: 2_000,
        };
        assert_eq!(session.user_id(), &UserId::from("user-1"));
        assert!(session.is_admin());
    }

    #[test]
    fn user_serde_round_trip() {
        let user = sample_user();
        let json = serde_json::to_string(&user).unwrap();
        let back: User = serde_json::from_str(&json).unwrap();
        assert_eq!(back.id, user.id);
        assert_eq!(back.handle, user.handle);
        assert_eq!(back.friends, user.friends);
    }
}
