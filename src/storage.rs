//! Shared `SQLite` database for the social data store.
//!
//! All four logical collections (`users`, `posts`, `messages`, and the
//! `session` singleton) live in one database file so that cross-store
//! operations such as accepting a friend request commit in a single
//! transaction. Set-valued fields (friends, pending requests, likes,
//! audiences) are stored as rows in dedicated tables rather than as
//! serialized blobs, so every set mutation is a row insert or delete.

// SQLite operations need to hold the lock for the duration of the operation.
// Dropping the guard earlier would require restructuring all methods.
#![allow(clippy::significant_drop_tightening)]

use std::path::Path;
use std::sync::{Mutex, MutexGuard};

use rusqlite::Connection;
use thiserror::Error;

/// Error type for database-level failures.
#[derive(Error, Debug)]
pub enum StorageError {
    /// Database error from `SQLite`.
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// The connection lock was poisoned by a panicking writer.
    #[error("Storage error: {0}")]
    Lock(String),
}

/// Thread-safe handle to the backing `SQLite` database.
///
/// The connection is shared by all stores behind a `Mutex`; operations
/// hold the lock for one statement or one short transaction at a time.
pub struct Database {
    conn: Mutex<Connection>,
}

impl Database {
    /// Opens (or creates) the database at the given path.
    ///
    /// # Errors
    ///
    /// Returns an error if the database cannot be created or initialized.
    pub fn open(path: &Path) -> Result<Self, StorageError> {
        let conn = Connection::open(path)?;
        let db = Self {
            conn: Mutex::new(conn),
        };
        db.initialize_schema()?;
        Ok(db)
    }

    /// Creates an in-memory database for testing.
    ///
    /// # Errors
    ///
    /// Returns an error if the database cannot be initialized.
    #[cfg(any(test, feature = "test-utils"))]
    pub fn in_memory() -> Result<Self, StorageError> {
        let conn = Connection::open_in_memory()?;
        let db = Self {
            conn: Mutex::new(conn),
        };
        db.initialize_schema()?;
        Ok(db)
    }

    /// Acquires the connection lock.
    ///
    /// # Errors
    ///
    /// Returns an error if the lock is poisoned.
    pub(crate) fn lock(&self) -> Result<MutexGuard<'_, Connection>, StorageError> {
        self.conn
            .lock()
            .map_err(|e| StorageError::Lock(format!("Failed to acquire database lock: {e}")))
    }

    /// Initializes the database schema.
    fn initialize_schema(&self) -> Result<(), StorageError> {
        let conn = self.lock()?;

        conn.execute_batch(
            r"
            -- User records (scalar profile fields only; relationship sets
            -- live in their own tables)
            CREATE TABLE IF NOT EXISTS users (
                id TEXT PRIMARY KEY,
                handle TEXT NOT NULL UNIQUE,
                display_name TEXT NOT NULL,
                credential TEXT NOT NULL,
                avatar TEXT,
                role TEXT NOT NULL DEFAULT 'member',
                presence TEXT NOT NULL DEFAULT 'offline',
                created_at INTEGER NOT NULL,
                updated_at INTEGER NOT NULL
            );

            -- Directed friendship edges; symmetry is maintained by always
            -- inserting and deleting both directions in one transaction
            CREATE TABLE IF NOT EXISTS friend_edges (
                user_id TEXT NOT NULL,
                friend_id TEXT NOT NULL,
                created_at INTEGER NOT NULL,
                PRIMARY KEY (user_id, friend_id)
            );

            -- Inbound pending friend requests
            CREATE TABLE IF NOT EXISTS friend_requests (
                target_id TEXT NOT NULL,
                requester_id TEXT NOT NULL,
                requested_at INTEGER NOT NULL,
                PRIMARY KEY (target_id, requester_id)
            );

            -- Posts; seq is the insertion/recency order and eviction order
            CREATE TABLE IF NOT EXISTS posts (
                seq INTEGER PRIMARY KEY AUTOINCREMENT,
                id TEXT NOT NULL UNIQUE,
                author_id TEXT NOT NULL,
                body TEXT NOT NULL,
                image TEXT,
                shared_from TEXT,
                created_at INTEGER NOT NULL
            );

            CREATE TABLE IF NOT EXISTS post_likes (
                post_id TEXT NOT NULL,
                user_id TEXT NOT NULL,
                PRIMARY KEY (post_id, user_id)
            );

            -- Visibility restriction; no rows means public
            CREATE TABLE IF NOT EXISTS post_audience (
                post_id TEXT NOT NULL,
                user_id TEXT NOT NULL,
                PRIMARY KEY (post_id, user_id)
            );

            CREATE TABLE IF NOT EXISTS comments (
                seq INTEGER PRIMARY KEY AUTOINCREMENT,
                id TEXT NOT NULL UNIQUE,
                post_id TEXT NOT NULL,
                author_id TEXT NOT NULL,
                body TEXT NOT NULL,
                created_at INTEGER NOT NULL
            );

            -- 1:1 messages; seq breaks timestamp ties by insertion order
            CREATE TABLE IF NOT EXISTS messages (
                seq INTEGER PRIMARY KEY AUTOINCREMENT,
                id TEXT NOT NULL UNIQUE,
                from_id TEXT NOT NULL,
                to_id TEXT NOT NULL,
                body TEXT NOT NULL,
                sent_at INTEGER NOT NULL,
                read INTEGER NOT NULL DEFAULT 0
            );

            -- Active session singleton (denormalized user snapshot)
            CREATE TABLE IF NOT EXISTS session (
                slot INTEGER PRIMARY KEY CHECK (slot = 0),
                user_json TEXT NOT NULL,
                created_at INTEGER NOT NULL
            );
            ",
        )?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn in_memory_initializes_schema() {
        let db = Database::in_memory().unwrap();
        let conn = db.lock().unwrap();
        let count: i64 = conn
            .query_row(
                "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table' AND name IN
                 ('users', 'friend_edges', 'friend_requests', 'posts', 'post_likes',
                  'post_audience', 'comments', 'messages', 'session')",
                [],
                |row| row.get(0),
            )
            .unwrap();
        assert_eq!(count, 9);
    }

    #[test]
    fn open_creates_database_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("agora.db");
        let _db = Database::open(&path).unwrap();
        assert!(path.exists());
    }

    #[test]
    fn schema_initialization_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("agora.db");
        let _first = Database::open(&path).unwrap();
        let second = Database::open(&path);
        assert!(second.is_ok());
    }
}
