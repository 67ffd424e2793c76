//! # Retry Policy
//!
//! Re-runs a whole transaction when it lost a race for SQLite's write
//! lock or for a sequence number.
//!
//! ## Attempt Loop
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  attempt 1 ──► Ok ─────────────────────────────────────────► return     │
//! │     │                                                                   │
//! │     └─ Err ── is_retryable()? ── no ─────────────────────────► return   │
//! │                   │                                                     │
//! │                  yes, attempts left                                     │
//! │                   │                                                     │
//! │                   ▼                                                     │
//! │         sleep(next_backoff)   20ms → 40ms → 80ms ... ≤ max_backoff      │
//! │                   │                                                     │
//! │                   ▼                                                     │
//! │  attempt 2 (fresh transaction, fresh sequence allocation)              │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use backoff::backoff::Backoff;
use backoff::ExponentialBackoff;
use std::future::Future;
use std::time::Duration;
use tracing::warn;

use crate::config::RetrySettings;
use crate::error::EngineResult;

/// How many times, and how patiently, to retry a transaction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryPolicy {
    max_attempts: u32,
    initial_backoff: Duration,
    max_backoff: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        RetryPolicy::from_settings(&RetrySettings::default())
    }
}

impl RetryPolicy {
    pub fn new(max_attempts: u32, initial_backoff: Duration, max_backoff: Duration) -> Self {
        RetryPolicy {
            max_attempts: max_attempts.max(1),
            initial_backoff,
            max_backoff,
        }
    }

    pub fn from_settings(settings: &RetrySettings) -> Self {
        RetryPolicy::new(
            settings.max_attempts,
            Duration::from_millis(settings.initial_backoff_ms),
            Duration::from_millis(settings.max_backoff_ms),
        )
    }

    /// A policy that never retries.
    pub fn none() -> Self {
        RetryPolicy::new(1, Duration::ZERO, Duration::ZERO)
    }

    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    /// Runs `attempt` until it succeeds, fails with a non-retryable error,
    /// or the attempts run out. The last error is returned as is.
    pub async fn run<T, F, Fut>(&self, operation: &'static str, mut attempt: F) -> EngineResult<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = EngineResult<T>>,
    {
        let mut backoff = self.create_backoff();
        let mut tries = 0;

        loop {
            tries += 1;

            match attempt().await {
                Ok(value) => return Ok(value),
                Err(err) if err.is_retryable() && tries < self.max_attempts => {
                    let delay = backoff.next_backoff().unwrap_or(self.max_backoff);
                    warn!(
                        operation,
                        attempt = tries,
                        max_attempts = self.max_attempts,
                        delay_ms = delay.as_millis() as u64,
                        error = %err,
                        "Retrying transaction"
                    );
                    tokio::time::sleep(delay).await;
                }
                Err(err) => {
                    if err.is_retryable() {
                        warn!(operation, attempts = tries, error = %err, "Retries exhausted");
                    }
                    return Err(err);
                }
            }
        }
    }

    /// Creates the exponential backoff configuration.
    fn create_backoff(&self) -> ExponentialBackoff {
        ExponentialBackoff {
            initial_interval: self.initial_backoff,
            max_interval: self.max_backoff,
            multiplier: 2.0,
            // The attempt count bounds retries, not elapsed time.
            max_elapsed_time: None,
            ..Default::default()
        }
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::EngineError;
    use std::sync::atomic::{AtomicU32, Ordering};
    use torque_db::DbError;

    fn fast(max_attempts: u32) -> RetryPolicy {
        RetryPolicy::new(max_attempts, Duration::from_millis(1), Duration::from_millis(2))
    }

    #[tokio::test]
    async fn test_retries_transient_then_succeeds() {
        let counter = AtomicU32::new(0);
        let calls = &counter;
        let result = fast(3)
            .run("test", move || async move {
                let n = calls.fetch_add(1, Ordering::SeqCst) + 1;
                if n < 3 {
                    Err(EngineError::Storage(DbError::Busy("database is locked".into())))
                } else {
                    Ok(n)
                }
            })
            .await;

        assert_eq!(result.unwrap(), 3);
        assert_eq!(counter.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_gives_up_after_max_attempts() {
        let counter = AtomicU32::new(0);
        let calls = &counter;
        let result: EngineResult<()> = fast(3)
            .run("test", move || async move {
                calls.fetch_add(1, Ordering::SeqCst);
                Err(EngineError::SequenceConflict {
                    field: "order_number".into(),
                })
            })
            .await;

        assert!(matches!(result, Err(EngineError::SequenceConflict { .. })));
        assert_eq!(counter.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_does_not_retry_validation() {
        let counter = AtomicU32::new(0);
        let calls = &counter;
        let result: EngineResult<()> = fast(5)
            .run("test", move || async move {
                calls.fetch_add(1, Ordering::SeqCst);
                Err(EngineError::ProductNotFound("p-1".into()))
            })
            .await;

        assert!(result.is_err());
        assert_eq!(counter.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_zero_attempts_means_one() {
        assert_eq!(RetryPolicy::new(0, Duration::ZERO, Duration::ZERO).max_attempts(), 1);
        assert_eq!(RetryPolicy::none().max_attempts(), 1);
    }
}
