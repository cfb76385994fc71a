//! Delivery modes and the subscription handle.

use std::time::Duration;

use tokio::sync::mpsc;

/// How a subscription receives state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Delivery {
    /// Re-read and redeliver on a fixed interval, whether or not
    /// anything changed. Intervals shorter than one millisecond are
    /// clamped up to it.
    Poll {
        /// Time between ticks.
        interval: Duration,
    },
    /// Re-read and redeliver whenever a relevant change is published.
    Push,
}

/// A live subscription yielding successive snapshots of watched state.
///
/// Dropping the subscription has the same effect as [`cancel`]: the
/// backing task notices the closed channel and stops.
///
/// [`cancel`]: Subscription::cancel
pub struct Subscription<T> {
    rx: mpsc::Receiver<T>,
}

impl<T> Subscription<T> {
    pub(crate) const fn new(rx: mpsc::Receiver<T>) -> Self {
        Self { rx }
    }

    /// Receives the next snapshot.
    ///
    /// Returns `None` after [`cancel`](Subscription::cancel) once the
    /// already-delivered snapshots are drained.
    pub async fn recv(&mut self) -> Option<T> {
        self.rx.recv().await
    }

    /// Stops future deliveries.
    ///
    /// In-flight work is never aborted; only future ticks stop.
    pub fn cancel(&mut self) {
        self.rx.close();
    }
}

impl<T> std::fmt::Debug for Subscription<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("Subscription")
    }
}
