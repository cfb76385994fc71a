//! User identity, credentials, and sessions.
//!
//! This module owns the `users` collection and the `session` singleton.
//! It provides the storage-level [`IdentityStore`] (record CRUD, handle
//! uniqueness, credential verification) and the higher-level
//! [`IdentityManager`] which holds the active session and keeps its
//! denormalized user snapshot fresh across profile updates.
//!
//! # Architecture
//!
//! ```text
//! IdentityManager (session lifecycle)
//!     └── IdentityStore (SQLite user records + credential check)
//! ```
//!
//! Sessions are explicit values handed to callers; there is no ambient
//! "current user" global. Relationship sets (`friends`,
//! `friend_requests`) on [`User`] are hydrated from edge tables on read
//! and are only ever mutated by the social graph manager, row by row.
//!
//! # Types
//!
//! - [`User`]: a user record with hydrated relationship sets
//! - [`UserProfile`]: signup/profile input
//! - [`Session`]: denormalized binding of a client to a user
//! - [`Secret`] / [`CredentialHash`]: credential material

mod credential;
mod error;
mod manager;
mod store;
pub mod types;

pub use credential::{CredentialHash, Secret};
pub use error::{IdentityError, Result};
pub use manager::IdentityManager;
pub use store::IdentityStore;
pub use types::{Presence, Role, Session, User, UserId, UserProfile};
