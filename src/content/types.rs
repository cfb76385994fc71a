//! Types for posts and comments.

use std::collections::BTreeSet;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::identity::UserId;

/// Unique identifier of a post.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PostId(String);

impl PostId {
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

impl fmt::Display for PostId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<String> for PostId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for PostId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// Unique identifier of a comment.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CommentId(String);

impl CommentId {
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

impl fmt::Display for CommentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<String> for CommentId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

/// A comment, owned exclusively by its parent post.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Comment {
    /// Unique id.
    pub id: CommentId,
    /// Author of the comment.
    pub author: UserId,
    /// Comment text.
    pub body: String,
    /// When the comment was created (Unix timestamp).
    pub created_at: i64,
}

/// A stored post with its hydrated sets and comment sequence.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Post {
    /// Unique id.
    pub id: PostId,
    /// Owning user; immutable.
    pub author: UserId,
    /// Text body (the caption, for shares).
    pub body: String,
    /// Optional image reference.
    pub image: Option<String>,
    /// Id of the ORIGINAL post this one shares, if any. A share of a
    /// share still points at the original, never an intermediate.
    pub shared_from: Option<PostId>,
    /// Users who liked the post.
    pub likes: BTreeSet<UserId>,
    /// Ordered comment sequence; appended to, never reordered.
    pub comments: Vec<Comment>,
    /// Visibility restriction; empty means public.
    pub visible_to: BTreeSet<UserId>,
    /// When the post was created (Unix timestamp).
    pub created_at: i64,
}

impl Post {
    /// Returns whether the post is visible to the given viewer.
    ///
    /// True iff the post is public (empty audience), the viewer is in
    /// the audience, or the viewer is the author.
    #[must_use]
    pub fn is_visible_to(&self, viewer: &UserId) -> bool {
        self.visible_to.is_empty() || self.visible_to.contains(viewer) || &self.author == viewer
    }
}

/// Input to [`ContentRepository::create`](super::ContentRepository::create).
#[derive(Debug, Clone)]
pub struct PostDraft {
    /// Owning user.
    pub author: UserId,
    /// Text body.
    pub body: String,
    /// Optional image reference.
    pub image: Option<String>,
    /// Visibility restriction; empty means public.
    pub visible_to: BTreeSet<UserId>,
}

impl PostDraft {
    /// Creates a public post draft.
    #[must_use]
    pub fn new(author: UserId, body: impl Into<String>) -> Self {
        Self {
            author,
            body: body.into(),
            image: None,
            visible_to: BTreeSet::new(),
        }
    }

    /// Sets the image reference.
    #[must_use]
    pub fn with_image(mut self, image: impl Into<String>) -> Self {
        self.image = Some(image.into());
        self
    }

    /// Restricts visibility to the given viewers (plus the author).
    #[must_use]
    pub fn visible_to(mut self, viewers: impl IntoIterator<Item = UserId>) -> Self {
        self.visible_to.extend(viewers);
        self
    }
}
