//! Snapshot subscriptions over the stores.
//!
//! The engine exposes one subscription interface with two delivery
//! modes: [`Delivery::Poll`] re-reads on a fixed interval and
//! redelivers whether or not anything changed; [`Delivery::Push`]
//! listens on the change feed and re-reads when a relevant change
//! lands. Both deliver an initial snapshot on subscribe and guarantee
//! that every confirmed write is eventually reflected, with no
//! exactly-once promise for intermediate states.
//!
//! A failed re-read is logged and retried on the next tick or change;
//! it never terminates the subscription.

mod engine;
mod error;
mod types;

pub use engine::SyncEngine;
pub use error::{Result, SyncError};
pub use types::{Delivery, Subscription};
