//! 1:1 message storage.
//!
//! A conversation is the unordered pair of its two endpoints; membership
//! is derived from the message rows, never stored. Messages are ordered
//! ascending by timestamp with insertion order breaking ties. The store
//! is bounded: once the total message count exceeds a high-water mark,
//! the oldest batch is evicted in one statement (coarser than the
//! one-at-a-time post eviction, trading eviction frequency for write
//! cost).
//!
//! # Types
//!
//! - [`Message`]: a stored message with id, endpoints, and read flag
//! - [`MessageDraft`]: input to [`ConversationStore::send`]

mod error;
mod store;
pub mod types;

pub use error::{ConversationError, Result};
pub use store::ConversationStore;
pub use types::{Message, MessageDraft, MessageId};
