//! # Deadlines
//!
//! Every public engine operation takes a [`Deadline`]. The operation runs
//! under `tokio::time::timeout_at` with the earlier of the caller's
//! deadline and the configured operation timeout. On expiry the future is
//! dropped; a dropped `sqlx::Transaction` rolls back, so nothing partial
//! is committed.

use std::time::Duration;
use tokio::time::Instant;

/// An optional point in time after which an operation is abandoned.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Deadline(Option<Instant>);

impl Deadline {
    /// No caller deadline; only the configured timeout applies.
    pub fn none() -> Self {
        Deadline(None)
    }

    pub fn at(instant: Instant) -> Self {
        Deadline(Some(instant))
    }

    pub fn after(duration: Duration) -> Self {
        Deadline(Some(Instant::now() + duration))
    }

    pub fn instant(&self) -> Option<Instant> {
        self.0
    }

    pub fn is_expired(&self) -> bool {
        self.0.map_or(false, |at| Instant::now() >= at)
    }

    /// The instant actually enforced: the caller's deadline capped by `limit`.
    pub fn effective(&self, limit: Duration) -> Instant {
        let capped = Instant::now() + limit;
        match self.0 {
            Some(at) => at.min(capped),
            None => capped,
        }
    }
}

impl From<Duration> for Deadline {
    fn from(duration: Duration) -> Self {
        Deadline::after(duration)
    }
}
