//! `SQLite` storage for 1:1 messages.

use std::sync::Arc;

use rusqlite::{params, Connection, OptionalExtension};

use super::error::{ConversationError, Result};
use super::types::{Message, MessageDraft, MessageId};
use crate::feed::{Change, ChangeFeed};
use crate::identity::UserId;
use crate::storage::Database;

/// Default high-water mark before eviction kicks in.
const DEFAULT_HIGH_WATER: usize = 500;

/// Number of oldest messages evicted in one batch.
const DEFAULT_EVICT_BATCH: usize = 100;

const MESSAGE_COLUMNS: &str = "id, from_id, to_id, body, sent_at, read";

/// Bounded storage for 1:1 messages.
///
/// `send` always appends; once the total count exceeds the high-water
/// mark, the oldest batch is evicted in a single statement. Eviction is
/// unconditional housekeeping, never an error for the writer.
pub struct ConversationStore {
    db: Arc<Database>,
    feed: Arc<ChangeFeed>,
    high_water: usize,
    evict_batch: usize,
}

impl ConversationStore {
    /// Creates a store with the default capacity (500 high-water,
    /// batches of 100).
    #[must_use]
    pub const fn new(db: Arc<Database>, feed: Arc<ChangeFeed>) -> Self {
        Self::with_capacity(db, feed, DEFAULT_HIGH_WATER, DEFAULT_EVICT_BATCH)
    }

    /// Creates a store with an explicit high-water mark and batch size.
    #[must_use]
    pub const fn with_capacity(
        db: Arc<Database>,
        feed: Arc<ChangeFeed>,
        high_water: usize,
        evict_batch: usize,
    ) -> Self {
        Self {
            db,
            feed,
            high_water,
            evict_batch,
        }
    }

    /// Appends a message, assigning an id and timestamp as needed.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn send(&self, draft: MessageDraft) -> Result<Message> {
        let message = {
            let conn = self.db.lock()?;
            self.insert(&conn, draft)?
        };

        self.feed.publish(Change::Message {
            from: message.from.clone(),
            to: message.to.clone(),
        });
        Ok(message)
    }

    /// Inserts a message on an already-held connection.
    ///
    /// For callers that bundle the insert into a larger transaction;
    /// they publish the corresponding change after their commit.
    pub(crate) fn insert(&self, conn: &Connection, draft: MessageDraft) -> Result<Message> {
        let message = Message {
            id: MessageId::generate(),
            from: draft.from,
            to: draft.to,
            body: draft.body,
            sent_at: draft
                .sent_at
                .unwrap_or_else(|| chrono::Utc::now().timestamp()),
            read: false,
        };

        conn.execute(
            r"
            INSERT INTO messages (id, from_id, to_id, body, sent_at, read)
            VALUES (?1, ?2, ?3, ?4, ?5, 0)
            ",
            params![
                message.id.as_str(),
                message.from.as_str(),
                message.to.as_str(),
                &message.body,
                message.sent_at,
            ],
        )?;

        let total: usize = conn.query_row("SELECT COUNT(*) FROM messages", [], |row| row.get(0))?;
        if total > self.high_water {
            conn.execute(
                r"
                DELETE FROM messages WHERE seq IN
                    (SELECT seq FROM messages ORDER BY seq ASC LIMIT ?1)
                ",
                params![self.evict_batch],
            )?;
        }

        Ok(message)
    }

    /// Returns all messages between the (unordered) pair, ascending by
    /// timestamp, stable on ties by insertion order.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn between(&self, a: &UserId, b: &UserId) -> Result<Vec<Message>> {
        let conn = self.db.lock()?;
        let mut stmt = conn.prepare(&format!(
            r"
            SELECT {MESSAGE_COLUMNS} FROM messages
            WHERE (from_id = ?1 AND to_id = ?2) OR (from_id = ?2 AND to_id = ?1)
            ORDER BY sent_at ASC, seq ASC
            "
        ))?;

        let messages = stmt
            .query_map(params![a.as_str(), b.as_str()], Self::map_message_row)?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(messages)
    }

    /// Returns the most recent message between the pair, if any.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn last_between(&self, a: &UserId, b: &UserId) -> Result<Option<Message>> {
        let conn = self.db.lock()?;
        Ok(conn
            .query_row(
                &format!(
                    r"
                    SELECT {MESSAGE_COLUMNS} FROM messages
                    WHERE (from_id = ?1 AND to_id = ?2) OR (from_id = ?2 AND to_id = ?1)
                    ORDER BY sent_at DESC, seq DESC
                    LIMIT 1
                    "
                ),
                params![a.as_str(), b.as_str()],
                Self::map_message_row,
            )
            .optional()?)
    }

    /// Marks a message as read.
    ///
    /// # Errors
    ///
    /// Returns [`ConversationError::NotFound`] if the message does not
    /// exist.
    pub fn mark_read(&self, id: &MessageId) -> Result<()> {
        let endpoints = {
            let conn = self.db.lock()?;
            let endpoints: Option<(String, String)> = conn
                .query_row(
                    "SELECT from_id, to_id FROM messages WHERE id = ?1",
                    params![id.as_str()],
                    |row| Ok((row.get(0)?, row.get(1)?)),
                )
                .optional()?;

            let Some(endpoints) = endpoints else {
                return Err(ConversationError::NotFound(id.to_string()));
            };

            conn.execute(
                "UPDATE messages SET read = 1 WHERE id = ?1",
                params![id.as_str()],
            )?;
            endpoints
        };

        self.feed.publish(Change::Message {
            from: UserId::from(endpoints.0),
            to: UserId::from(endpoints.1),
        });
        Ok(())
    }

    /// Returns the number of unread messages addressed to a user.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn unread_count(&self, to: &UserId) -> Result<usize> {
        let conn = self.db.lock()?;
        Ok(conn.query_row(
            "SELECT COUNT(*) FROM messages WHERE to_id = ?1 AND read = 0",
            params![to.as_str()],
            |row| row.get(0),
        )?)
    }

    /// Returns the total number of stored messages.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn count(&self) -> Result<usize> {
        let conn = self.db.lock()?;
        Ok(conn.query_row("SELECT COUNT(*) FROM messages", [], |row| row.get(0))?)
    }

    fn map_message_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Message> {
        Ok(Message {
            id: MessageId::from(row.get::<_, String>(0)?),
            from: UserId::from(row.get::<_, String>(1)?),
            to: UserId::from(row.get::<_, String>(2)?),
            body: row.get(3)?,
            sent_at: row.get(4)?,
            read: row.get::<_, i64>(5)? != 0,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_store() -> ConversationStore {
        let db = Arc::new(Database::in_memory().unwrap());
        ConversationStore::new(db, Arc::new(ChangeFeed::new()))
    }

    fn small_store(high_water: usize, batch: usize) -> ConversationStore {
        let db = Arc::new(Database::in_memory().unwrap());
        ConversationStore::with_capacity(db, Arc::new(ChangeFeed::new()), high_water, batch)
    }

    #[test]
    fn send_assigns_id_and_timestamp() {
        let store = test_store();
        let message = store
            .send(MessageDraft::new(
                UserId::from("a"),
                UserId::from("b"),
                "hi",
            ))
            .unwrap();

        assert!(!message.id.as_str().is_empty());
        assert!(message.sent_at > 0);
        assert!(!message.read);
    }

    #[test]
    fn between_filters_by_unordered_pair() {
        let store = test_store();
        let a = UserId::from("a");
        let b = UserId::from("b");
        let c = UserId::from("c");

        store
            .send(MessageDraft::new(a.clone(), b.clone(), "a to b").at(1))
            .unwrap();
        store
            .send(MessageDraft::new(b.clone(), a.clone(), "b to a").at(2))
            .unwrap();
        store
            .send(MessageDraft::new(a.clone(), c.clone(), "a to c").at(3))
            .unwrap();

        let messages = store.between(&a, &b).unwrap();
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[0].body, "a to b");
        assert_eq!(messages[1].body, "b to a");
    }

    #[test]
    fn between_sorts_by_timestamp_regardless_of_insertion() {
        let store = test_store();
        let a = UserId::from("a");
        let b = UserId::from("b");

        store
            .send(MessageDraft::new(a.clone(), b.clone(), "later").at(300))
            .unwrap();
        store
            .send(MessageDraft::new(a.clone(), b.clone(), "earlier").at(100))
            .unwrap();
        store
            .send(MessageDraft::new(a.clone(), b.clone(), "middle").at(200))
            .unwrap();

        let bodies: Vec<_> = store
            .between(&a, &b)
            .unwrap()
            .into_iter()
            .map(|m| m.body)
            .collect();
        assert_eq!(bodies, ["earlier", "middle", "later"]);
    }

    #[test]
    fn timestamp_ties_keep_insertion_order() {
        let store = test_store();
        let a = UserId::from("a");
        let b = UserId::from("b");

        store
            .send(MessageDraft::new(a.clone(), b.clone(), "first").at(100))
            .unwrap();
        store
            .send(MessageDraft::new(a.clone(), b.clone(), "second").at(100))
            .unwrap();

        let bodies: Vec<_> = store
            .between(&a, &b)
            .unwrap()
            .into_iter()
            .map(|m| m.body)
            .collect();
        assert_eq!(bodies, ["first", "second"]);
    }

    #[test]
    fn last_between_returns_most_recent() {
        let store = test_store();
        let a = UserId::from("a");
        let b = UserId::from("b");

        assert!(store.last_between(&a, &b).unwrap().is_none());

        store
            .send(MessageDraft::new(a.clone(), b.clone(), "old").at(100))
            .unwrap();
        store
            .send(MessageDraft::new(b.clone(), a.clone(), "new").at(200))
            .unwrap();

        let last = store.last_between(&a, &b).unwrap().unwrap();
        assert_eq!(last.body, "new");
    }

    #[test]
    fn eviction_removes_oldest_batch() {
        let store = small_store(10, 4);
        let a = UserId::from("a");
        let b = UserId::from("b");

        for i in 0..11 {
            store
                .send(MessageDraft::new(a.clone(), b.clone(), format!("m{i}")).at(i))
                .unwrap();
        }

        // 11 exceeds the high-water mark of 10; the oldest 4 are gone
        assert_eq!(store.count().unwrap(), 7);
        let messages = store.between(&a, &b).unwrap();
        assert_eq!(messages[0].body, "m4");
        assert_eq!(messages.last().unwrap().body, "m10");
    }

    #[test]
    fn eviction_does_not_trigger_below_high_water() {
        let store = small_store(10, 4);
        let a = UserId::from("a");
        let b = UserId::from("b");

        for i in 0..10 {
            store
                .send(MessageDraft::new(a.clone(), b.clone(), format!("m{i}")).at(i))
                .unwrap();
        }

        assert_eq!(store.count().unwrap(), 10);
    }

    #[test]
    fn mark_read_flips_flag() {
        let store = test_store();
        let a = UserId::from("a");
        let b = UserId::from("b");

        let message = store
            .send(MessageDraft::new(a.clone(), b.clone(), "hi"))
            .unwrap();
        assert_eq!(store.unread_count(&b).unwrap(), 1);

        store.mark_read(&message.id).unwrap();
        assert_eq!(store.unread_count(&b).unwrap(), 0);
        assert!(store.between(&a, &b).unwrap()[0].read);
    }

    #[test]
    fn mark_read_unknown_message_fails() {
        let store = test_store();
        let result = store.mark_read(&MessageId::from("missing"));
        assert!(matches!(result, Err(ConversationError::NotFound(_))));
    }

    #[test]
    fn send_publishes_change() {
        let db = Arc::new(Database::in_memory().unwrap());
        let feed = Arc::new(ChangeFeed::new());
        let store = ConversationStore::new(db, Arc::clone(&feed));
        let mut rx = feed.subscribe();

        let a = UserId::from("a");
        let b = UserId::from("b");
        store
            .send(MessageDraft::new(a.clone(), b.clone(), "hi"))
            .unwrap();

        assert_eq!(rx.try_recv().unwrap(), Change::Message { from: a, to: b });
    }
}
