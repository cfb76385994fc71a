//! `SQLite` storage for user records and the session singleton.
//!
//! User rows hold scalar profile fields only; the `friends` and
//! `friend_requests` sets are hydrated from edge tables on every read
//! and are never written by this store. This keeps profile updates and
//! relationship mutations on disjoint rows, so concurrent writers
//! cannot clobber each other's changes.

use std::collections::BTreeSet;
use std::sync::Arc;

use rusqlite::{params, Connection, OptionalExtension};

use super::credential::{CredentialHash, Secret};
use super::error::{IdentityError, Result};
use super::types::{Presence, Role, Session, User, UserId, UserProfile};
use crate::feed::{Change, ChangeFeed};
use crate::storage::Database;

/// Scalar user columns before set hydration.
struct UserRow {
    id: String,
    handle: String,
    display_name: String,
    credential: String,
    avatar: Option<String>,
    role: String,
    presence: String,
    created_at: i64,
    updated_at: i64,
}

const USER_COLUMNS: &str =
    "id, handle, display_name, credential, avatar, role, presence, created_at, updated_at";

/// Storage for user records, credential checks, and the session singleton.
pub struct IdentityStore {
    db: Arc<Database>,
    feed: Arc<ChangeFeed>,
}

impl IdentityStore {
    /// Creates a store over the shared database.
    #[must_use]
    pub const fn new(db: Arc<Database>, feed: Arc<ChangeFeed>) -> Self {
        Self { db, feed }
    }

    // ==================== User Operations ====================

    /// Creates a new user from a signup profile.
    ///
    /// # Errors
    ///
    /// Returns [`IdentityError::HandleTaken`] if the handle is in use,
    /// or an error if the database operation fails.
    pub fn create(&self, profile: UserProfile, secret: &Secret) -> Result<User> {
        let id = UserId::generate();
        let credential = CredentialHash::derive(secret);
        let now = chrono::Utc::now().timestamp();

        {
            let conn = self.db.lock()?;
            if Self::handle_owner(&conn, &profile.handle)?.is_some() {
                return Err(IdentityError::HandleTaken(profile.handle));
            }

            conn.execute(
                r"
                INSERT INTO users (id, handle, display_name, credential, avatar, role, presence, created_at, updated_at)
                VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
                ",
                params![
                    id.as_str(),
                    &profile.handle,
                    &profile.display_name,
                    credential.as_str(),
                    &profile.avatar,
                    profile.role.as_str(),
                    Presence::default().as_str(),
                    now,
                    now,
                ],
            )?;
        }

        self.feed.publish(Change::User { id: id.clone() });

        Ok(User {
            id,
            handle: profile.handle,
            display_name: profile.display_name,
            credential,
            avatar: profile.avatar,
            role: profile.role,
            presence: Presence::default(),
            friends: BTreeSet::new(),
            friend_requests: BTreeSet::new(),
            created_at: now,
            updated_at: now,
        })
    }

    /// Authenticates a user by handle and secret.
    ///
    /// # Errors
    ///
    /// Returns [`IdentityError::NotFound`] for an unknown handle and
    /// [`IdentityError::BadCredential`] when verification fails.
    pub fn authenticate(&self, handle: &str, secret: &Secret) -> Result<User> {
        let user = self.get_by_handle(handle)?;
        if user.credential.verify(secret) {
            Ok(user)
        } else {
            Err(IdentityError::BadCredential)
        }
    }

    /// Retrieves a user by id.
    ///
    /// # Errors
    ///
    /// Returns [`IdentityError::NotFound`] if no such user exists.
    pub fn get(&self, id: &UserId) -> Result<User> {
        let conn = self.db.lock()?;
        let row = conn
            .query_row(
                &format!("SELECT {USER_COLUMNS} FROM users WHERE id = ?1"),
                params![id.as_str()],
                Self::map_user_row,
            )
            .optional()?
            .ok_or_else(|| IdentityError::NotFound(id.to_string()))?;

        Self::hydrate(&conn, row)
    }

    /// Retrieves a user by handle.
    ///
    /// # Errors
    ///
    /// Returns [`IdentityError::NotFound`] if no such user exists.
    pub fn get_by_handle(&self, handle: &str) -> Result<User> {
        let conn = self.db.lock()?;
        let row = conn
            .query_row(
                &format!("SELECT {USER_COLUMNS} FROM users WHERE handle = ?1"),
                params![handle],
                Self::map_user_row,
            )
            .optional()?
            .ok_or_else(|| IdentityError::NotFound(handle.to_string()))?;

        Self::hydrate(&conn, row)
    }

    /// Updates the scalar profile fields of a user.
    ///
    /// Handle uniqueness is re-validated against all other users, so a
    /// rename to the user's own current handle succeeds. Relationship
    /// sets and the credential are never written by this method.
    ///
    /// # Errors
    ///
    /// Returns [`IdentityError::NotFound`] if the user does not exist,
    /// or [`IdentityError::HandleTaken`] if the handle belongs to
    /// another user.
    pub fn update(&self, user: &User) -> Result<()> {
        let now = chrono::Utc::now().timestamp();

        {
            let conn = self.db.lock()?;
            if let Some(owner) = Self::handle_owner(&conn, &user.handle)? {
                if owner != user.id.as_str() {
                    return Err(IdentityError::HandleTaken(user.handle.clone()));
                }
            }

            let changed = conn.execute(
                r"
                UPDATE users
                SET handle = ?1, display_name = ?2, avatar = ?3, role = ?4, presence = ?5, updated_at = ?6
                WHERE id = ?7
                ",
                params![
                    &user.handle,
                    &user.display_name,
                    &user.avatar,
                    user.role.as_str(),
                    user.presence.as_str(),
                    now,
                    user.id.as_str(),
                ],
            )?;

            if changed == 0 {
                return Err(IdentityError::NotFound(user.id.to_string()));
            }
        }

        self.feed.publish(Change::User {
            id: user.id.clone(),
        });
        Ok(())
    }

    /// Returns whether a handle is free, optionally excluding one user
    /// (the renaming user's own id).
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn is_handle_available(&self, handle: &str, excluding: Option<&UserId>) -> Result<bool> {
        let conn = self.db.lock()?;
        match Self::handle_owner(&conn, handle)? {
            None => Ok(true),
            Some(owner) => Ok(excluding.is_some_and(|id| id.as_str() == owner)),
        }
    }

    /// Updates only the presence status of a user.
    ///
    /// # Errors
    ///
    /// Returns [`IdentityError::NotFound`] if the user does not exist.
    pub fn set_presence(&self, id: &UserId, presence: Presence) -> Result<()> {
        let now = chrono::Utc::now().timestamp();
        let changed = {
            let conn = self.db.lock()?;
            conn.execute(
                "UPDATE users SET presence = ?1, updated_at = ?2 WHERE id = ?3",
                params![presence.as_str(), now, id.as_str()],
            )?
        };

        if changed == 0 {
            return Err(IdentityError::NotFound(id.to_string()));
        }

        self.feed.publish(Change::User { id: id.clone() });
        Ok(())
    }

    /// Deletes a user and all rows referencing them.
    ///
    /// This is the administrative removal path; role checks happen in
    /// [`IdentityManager`](super::IdentityManager).
    ///
    /// # Errors
    ///
    /// Returns [`IdentityError::NotFound`] if the user does not exist.
    pub fn delete(&self, id: &UserId) -> Result<()> {
        {
            let mut conn = self.db.lock()?;
            let tx = conn.transaction()?;

            let removed = tx.execute("DELETE FROM users WHERE id = ?1", params![id.as_str()])?;
            if removed == 0 {
                return Err(IdentityError::NotFound(id.to_string()));
            }

            tx.execute(
                "DELETE FROM friend_edges WHERE user_id = ?1 OR friend_id = ?1",
                params![id.as_str()],
            )?;
            tx.execute(
                "DELETE FROM friend_requests WHERE target_id = ?1 OR requester_id = ?1",
                params![id.as_str()],
            )?;
            tx.execute(
                "DELETE FROM post_likes WHERE user_id = ?1",
                params![id.as_str()],
            )?;
            tx.execute(
                "DELETE FROM post_audience WHERE user_id = ?1",
                params![id.as_str()],
            )?;

            tx.commit()?;
        }

        self.feed.publish(Change::User { id: id.clone() });
        Ok(())
    }

    // ==================== Session Singleton ====================

    /// Persists the active session snapshot.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization or the database operation fails.
    pub fn save_session(&self, session: &Session) -> Result<()> {
        let user_json = serde_json::to_string(&session.user)
            .map_err(|e| IdentityError::Storage(format!("Failed to serialize session: {e}")))?;

        let conn = self.db.lock()?;
        conn.execute(
            r"
            INSERT INTO session (slot, user_json, created_at)
            VALUES (0, ?1, ?2)
            ON CONFLICT(slot) DO UPDATE SET
                user_json = excluded.user_json,
                created_at = excluded.created_at
            ",
            params![&user_json, session.created_at],
        )?;

        Ok(())
    }

    /// Loads the persisted session snapshot, if any.
    ///
    /// # Errors
    ///
    /// Returns an error if the stored snapshot cannot be decoded.
    pub fn load_session(&self) -> Result<Option<Session>> {
        let conn = self.db.lock()?;
        let row: Option<(String, i64)> = conn
            .query_row(
                "SELECT user_json, created_at FROM session WHERE slot = 0",
                [],
                |row| Ok((row.get(0)?, row.get(1)?)),
            )
            .optional()?;

        match row {
            Some((user_json, created_at)) => {
                let user: User = serde_json::from_str(&user_json).map_err(|e| {
                    IdentityError::InvalidData(format!("Invalid session JSON: {e}"))
                })?;
                Ok(Some(Session { user, created_at }))
            }
            None => Ok(None),
        }
    }

    /// Removes the persisted session snapshot.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn clear_session(&self) -> Result<()> {
        let conn = self.db.lock()?;
        conn.execute("DELETE FROM session WHERE slot = 0", [])?;
        Ok(())
    }

    // ==================== Internals ====================

    fn handle_owner(conn: &Connection, handle: &str) -> Result<Option<String>> {
        Ok(conn
            .query_row(
                "SELECT id FROM users WHERE handle = ?1",
                params![handle],
                |row| row.get(0),
            )
            .optional()?)
    }

    fn map_user_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<UserRow> {
        Ok(UserRow {
            id: row.get(0)?,
            handle: row.get(1)?,
            display_name: row.get(2)?,
            credential: row.get(3)?,
            avatar: row.get(4)?,
            role: row.get(5)?,
            presence: row.get(6)?,
            created_at: row.get(7)?,
            updated_at: row.get(8)?,
        })
    }

    /// Attaches the relationship sets to a scalar row.
    fn hydrate(conn: &Connection, row: UserRow) -> Result<User> {
        let role = Role::parse(&row.role)
            .ok_or_else(|| IdentityError::InvalidData(format!("Invalid role: {}", row.role)))?;
        let presence = Presence::parse(&row.presence).ok_or_else(|| {
            IdentityError::InvalidData(format!("Invalid presence: {}", row.presence))
        })?;

        let friends = Self::collect_ids(
            conn,
            "SELECT friend_id FROM friend_edges WHERE user_id = ?1",
            &row.id,
        )?;
        let friend_requests = Self::collect_ids(
            conn,
            "SELECT requester_id FROM friend_requests WHERE target_id = ?1",
            &row.id,
        )?;

        Ok(User {
            id: UserId::from(row.id),
            handle: row.handle,
            display_name: row.display_name,
            credential: CredentialHash::from_stored(row.credential),
            avatar: row.avatar,
            role,
            presence,
            friends,
            friend_requests,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }

    fn collect_ids(conn: &Connection, sql: &str, id: &str) -> Result<BTreeSet<UserId>> {
        let mut stmt = conn.prepare(sql)?;
        let ids = stmt
            .query_map(params![id], |row| row.get::<_, String>(0))?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(ids.into_iter().map(UserId::from).collect())
    }
}
