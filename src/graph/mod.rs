//! Friend-request lifecycle and the mutual-friendship invariant.
//!
//! Per ordered pair (A, B) with A the initiator, the states are:
//!
//! ```text
//! None -> RequestPending(A -> B) -> Friends
//! RequestPending -> None   (cancel by A, decline by B)
//! Friends -> None          (explicit unfriend)
//! ```
//!
//! All set mutations are row-level inserts and deletes against the
//! `friend_edges` and `friend_requests` tables; the manager never
//! rewrites a whole user record, so two concurrent requests against
//! the same target converge to the union of requesters.

mod error;
mod manager;
pub mod types;

pub use error::{GraphError, Result};
pub use manager::SocialGraphManager;
pub use types::FriendState;
