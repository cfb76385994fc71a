//! Post storage, visibility, and capacity eviction.
//!
//! Posts are ordered by recency; the store is bounded and evicts the
//! single oldest post once the cap is exceeded. Visibility is a
//! predicate computed on every read path (a post with an empty
//! audience is public; otherwise only the audience and the author see
//! it) and is never persisted per viewer. Shares always reference the
//! ORIGINAL post: sharing a share flattens to the original id instead
//! of chaining.
//!
//! # Types
//!
//! - [`Post`]: a stored post with hydrated likes, audience, comments
//! - [`Comment`]: owned by its parent post
//! - [`PostDraft`]: input to [`ContentRepository::create`]

mod error;
mod repository;
pub mod types;

pub use error::{ContentError, Result};
pub use repository::ContentRepository;
pub use types::{Comment, CommentId, Post, PostDraft, PostId};
