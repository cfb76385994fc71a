//! Agora Core Library
//!
//! Embedded social data store and synchronization layer: identities
//! and sessions, the friendship graph, posts with audience-restricted
//! visibility, direct-message conversations, and snapshot
//! subscriptions over a change feed. Everything persists to a single
//! SQLite database; collections are bounded and evict oldest-first.

#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]
#![deny(unsafe_code)]

pub mod content;
pub mod conversation;
pub mod feed;
pub mod graph;
pub mod identity;
pub mod storage;
pub mod sync;
