//! `SQLite`-backed post repository.
//!
//! Like and audience sets are rows in their own tables, so `like` and
//! `unlike` are single-row inserts and deletes (idempotent, convergent
//! under concurrent writers). The repository never rewrites a whole
//! post record.

use std::collections::BTreeSet;
use std::sync::Arc;

use rusqlite::{params, Connection, OptionalExtension};

use super::error::{ContentError, Result};
use super::types::{Comment, CommentId, Post, PostDraft, PostId};
use crate::feed::{Change, ChangeFeed};
use crate::identity::{User, UserId};
use crate::storage::Database;

/// Default maximum number of stored posts.
const DEFAULT_POST_CAP: usize = 50;

/// Bounded storage for posts.
///
/// Insertion is always at the head of recency order; once the total
/// count exceeds the cap, the single oldest post is evicted together
/// with its likes, audience, and comments. Eviction is unconditional
/// housekeeping, never a rejection of the new write.
pub struct ContentRepository {
    db: Arc<Database>,
    feed: Arc<ChangeFeed>,
    capacity: usize,
}

impl ContentRepository {
    /// Creates a repository with the default cap of 50 posts.
    #[must_use]
    pub const fn new(db: Arc<Database>, feed: Arc<ChangeFeed>) -> Self {
        Self::with_capacity(db, feed, DEFAULT_POST_CAP)
    }

    /// Creates a repository with an explicit cap.
    #[must_use]
    pub const fn with_capacity(db: Arc<Database>, feed: Arc<ChangeFeed>, capacity: usize) -> Self {
        Self { db, feed, capacity }
    }

    /// Publishes a new post.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn create(&self, draft: PostDraft) -> Result<Post> {
        self.insert(draft, None)
    }

    /// Retrieves a post as seen by a viewer.
    ///
    /// # Errors
    ///
    /// Returns [`ContentError::NotFound`] if the post does not exist or
    /// is not visible to the viewer.
    pub fn get(&self, id: &PostId, viewer: &UserId) -> Result<Post> {
        let conn = self.db.lock()?;
        let post = Self::fetch(&conn, id)?.ok_or_else(|| ContentError::NotFound(id.to_string()))?;
        if post.is_visible_to(viewer) {
            Ok(post)
        } else {
            Err(ContentError::NotFound(id.to_string()))
        }
    }

    /// Returns all posts visible to the viewer, newest first.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn feed(&self, viewer: &UserId) -> Result<Vec<Post>> {
        let conn = self.db.lock()?;
        let posts = Self::fetch_all(&conn, None)?;
        Ok(posts.into_iter().filter(|p| p.is_visible_to(viewer)).collect())
    }

    /// Returns one author's posts visible to the viewer, newest first.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn posts_by(&self, author: &UserId, viewer: &UserId) -> Result<Vec<Post>> {
        let conn = self.db.lock()?;
        let posts = Self::fetch_all(&conn, Some(author))?;
        Ok(posts.into_iter().filter(|p| p.is_visible_to(viewer)).collect())
    }

    /// Adds a like. Idempotent.
    ///
    /// # Errors
    ///
    /// Returns [`ContentError::NotFound`] if the post does not exist.
    pub fn like(&self, id: &PostId, user: &UserId) -> Result<()> {
        {
            let conn = self.db.lock()?;
            Self::ensure_exists(&conn, id)?;
            conn.execute(
                "INSERT OR IGNORE INTO post_likes (post_id, user_id) VALUES (?1, ?2)",
                params![id.as_str(), user.as_str()],
            )?;
        }
        self.feed.publish(Change::Post { id: id.clone() });
        Ok(())
    }

    /// Removes a like. Idempotent.
    ///
    /// # Errors
    ///
    /// Returns [`ContentError::NotFound`] if the post does not exist.
    pub fn unlike(&self, id: &PostId, user: &UserId) -> Result<()> {
        {
            let conn = self.db.lock()?;
            Self::ensure_exists(&conn, id)?;
            conn.execute(
                "DELETE FROM post_likes WHERE post_id = ?1 AND user_id = ?2",
                params![id.as_str(), user.as_str()],
            )?;
        }
        self.feed.publish(Change::Post { id: id.clone() });
        Ok(())
    }

    /// Appends a comment to the post's ordered sequence.
    ///
    /// # Errors
    ///
    /// Returns [`ContentError::NotFound`] if the post does not exist.
    pub fn comment(&self, id: &PostId, author: &UserId, body: impl Into<String>) -> Result<Comment> {
        let comment = Comment {
            id: CommentId::generate(),
            author: author.clone(),
            body: body.into(),
            created_at: chrono::Utc::now().timestamp(),
        };

        {
            let conn = self.db.lock()?;
            Self::ensure_exists(&conn, id)?;
            conn.execute(
                r"
                INSERT INTO comments (id, post_id, author_id, body, created_at)
                VALUES (?1, ?2, ?3, ?4, ?5)
                ",
                params![
                    comment.id.as_str(),
                    id.as_str(),
                    comment.author.as_str(),
                    &comment.body,
                    comment.created_at,
                ],
            )?;
        }

        self.feed.publish(Change::Post { id: id.clone() });
        Ok(comment)
    }

    /// Shares a post as a new post.
    ///
    /// The new post's `shared_from` always references the ORIGINAL
    /// post: sharing a share flattens to the original id instead of
    /// chaining through intermediates.
    ///
    /// # Errors
    ///
    /// Returns [`ContentError::NotFound`] if the source post does not
    /// exist or is not visible to the sharer.
    pub fn share(
        &self,
        id: &PostId,
        sharer: &UserId,
        caption: impl Into<String>,
        audience: impl IntoIterator<Item = UserId>,
    ) -> Result<Post> {
        let source = self.get(id, sharer)?;
        let original = source.shared_from.unwrap_or(source.id);

        let draft = PostDraft::new(sharer.clone(), caption).visible_to(audience);
        self.insert(draft, Some(original))
    }

    /// Deletes a post and its dependent rows.
    ///
    /// # Errors
    ///
    /// Returns [`ContentError::Forbidden`] unless the actor is the
    /// author or an administrator, and [`ContentError::NotFound`] if
    /// the post does not exist.
    pub fn delete(&self, id: &PostId, actor: &User) -> Result<()> {
        {
            let mut conn = self.db.lock()?;

            let author: Option<String> = conn
                .query_row(
                    "SELECT author_id FROM posts WHERE id = ?1",
                    params![id.as_str()],
                    |row| row.get(0),
                )
                .optional()?;
            let Some(author) = author else {
                return Err(ContentError::NotFound(id.to_string()));
            };

            if author != actor.id.as_str() && !actor.is_admin() {
                return Err(ContentError::Forbidden(
                    "post deletion requires the author or an administrator".to_string(),
                ));
            }

            let tx = conn.transaction()?;
            Self::delete_post_rows(&tx, id.as_str())?;
            tx.commit()?;
        }

        self.feed.publish(Change::Post { id: id.clone() });
        Ok(())
    }

    /// Returns the total number of stored posts.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn count(&self) -> Result<usize> {
        let conn = self.db.lock()?;
        Ok(conn.query_row("SELECT COUNT(*) FROM posts", [], |row| row.get(0))?)
    }

    // ==================== Internals ====================

    fn insert(&self, draft: PostDraft, shared_from: Option<PostId>) -> Result<Post> {
        let post = Post {
            id: PostId::generate(),
            author: draft.author,
            body: draft.body,
            image: draft.image,
            shared_from,
            likes: BTreeSet::new(),
            comments: Vec::new(),
            visible_to: draft.visible_to,
            created_at: chrono::Utc::now().timestamp(),
        };

        {
            let conn = self.db.lock()?;
            conn.execute(
                r"
                INSERT INTO posts (id, author_id, body, image, shared_from, created_at)
                VALUES (?1, ?2, ?3, ?4, ?5, ?6)
                ",
                params![
                    post.id.as_str(),
                    post.author.as_str(),
                    &post.body,
                    &post.image,
                    post.shared_from.as_ref().map(PostId::as_str),
                    post.created_at,
                ],
            )?;

            for viewer in &post.visible_to {
                conn.execute(
                    "INSERT OR IGNORE INTO post_audience (post_id, user_id) VALUES (?1, ?2)",
                    params![post.id.as_str(), viewer.as_str()],
                )?;
            }

            self.evict_over_capacity(&conn)?;
        }

        self.feed.publish(Change::Post {
            id: post.id.clone(),
        });
        Ok(post)
    }

    /// Evicts the single oldest post while the cap is exceeded.
    fn evict_over_capacity(&self, conn: &Connection) -> Result<()> {
        loop {
            let total: usize = conn.query_row("SELECT COUNT(*) FROM posts", [], |row| row.get(0))?;
            if total <= self.capacity {
                return Ok(());
            }

            let oldest: String = conn.query_row(
                "SELECT id FROM posts ORDER BY seq ASC LIMIT 1",
                [],
                |row| row.get(0),
            )?;
            Self::delete_post_rows(conn, &oldest)?;
        }
    }

    fn delete_post_rows(conn: &Connection, id: &str) -> Result<()> {
        conn.execute("DELETE FROM post_likes WHERE post_id = ?1", params![id])?;
        conn.execute("DELETE FROM post_audience WHERE post_id = ?1", params![id])?;
        conn.execute("DELETE FROM comments WHERE post_id = ?1", params![id])?;
        conn.execute("DELETE FROM posts WHERE id = ?1", params![id])?;
        Ok(())
    }

    fn ensure_exists(conn: &Connection, id: &PostId) -> Result<()> {
        let exists: Option<i64> = conn
            .query_row(
                "SELECT 1 FROM posts WHERE id = ?1",
                params![id.as_str()],
                |row| row.get(0),
            )
            .optional()?;
        if exists.is_some() {
            Ok(())
        } else {
            Err(ContentError::NotFound(id.to_string()))
        }
    }

    fn fetch(conn: &Connection, id: &PostId) -> Result<Option<Post>> {
        let row: Option<(String, String, String, Option<String>, Option<String>, i64)> = conn
            .query_row(
                "SELECT id, author_id, body, image, shared_from, created_at FROM posts WHERE id = ?1",
                params![id.as_str()],
                |row| {
                    Ok((
                        row.get(0)?,
                        row.get(1)?,
                        row.get(2)?,
                        row.get(3)?,
                        row.get(4)?,
                        row.get(5)?,
                    ))
                },
            )
            .optional()?;

        match row {
            Some(row) => Ok(Some(Self::hydrate(conn, row)?)),
            None => Ok(None),
        }
    }

    fn fetch_all(conn: &Connection, author: Option<&UserId>) -> Result<Vec<Post>> {
        let sql = author.map_or(
            "SELECT id, author_id, body, image, shared_from, created_at FROM posts ORDER BY seq DESC".to_string(),
            |_| "SELECT id, author_id, body, image, shared_from, created_at FROM posts WHERE author_id = ?1 ORDER BY seq DESC".to_string(),
        );

        let mut stmt = conn.prepare(&sql)?;
        let map_row = |row: &rusqlite::Row<'_>| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, String>(2)?,
                row.get::<_, Option<String>>(3)?,
                row.get::<_, Option<String>>(4)?,
                row.get::<_, i64>(5)?,
            ))
        };

        let rows = match author {
            Some(author) => stmt
                .query_map(params![author.as_str()], map_row)?
                .collect::<std::result::Result<Vec<_>, _>>()?,
            None => stmt
                .query_map([], map_row)?
                .collect::<std::result::Result<Vec<_>, _>>()?,
        };

        rows.into_iter()
            .map(|row| Self::hydrate(conn, row))
            .collect()
    }

    /// Attaches likes, audience, and comments to a scalar post row.
    fn hydrate(
        conn: &Connection,
        (id, author, body, image, shared_from, created_at): (
            String,
            String,
            String,
            Option<String>,
            Option<String>,
            i64,
        ),
    ) -> Result<Post> {
        let likes = Self::collect_ids(
            conn,
            "SELECT user_id FROM post_likes WHERE post_id = ?1",
            &id,
        )?;
        let visible_to = Self::collect_ids(
            conn,
            "SELECT user_id FROM post_audience WHERE post_id = ?1",
            &id,
        )?;

        let mut stmt = conn.prepare(
            "SELECT id, author_id, body, created_at FROM comments WHERE post_id = ?1 ORDER BY seq ASC",
        )?;
        let comments = stmt
            .query_map(params![&id], |row| {
                Ok(Comment {
                    id: CommentId::from(row.get::<_, String>(0)?),
                    author: UserId::from(row.get::<_, String>(1)?),
                    body: row.get(2)?,
                    created_at: row.get(3)?,
                })
            })?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(Post {
            id: PostId::from(id),
            author: UserId::from(author),
            body,
            image,
            shared_from: shared_from.map(PostId::from),
            likes,
            comments,
            visible_to,
            created_at,
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
