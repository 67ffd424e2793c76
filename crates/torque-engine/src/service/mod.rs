//! # Services
//!
//! Transactional operations over the persistence gateway.
//!
//! ## Shape of a Write
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  service.create(request, deadline)                                      │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ServiceContext::run ── timeout_at(min(deadline, operation_timeout))    │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  RetryPolicy::run ── re-runs the attempt on Busy / SequenceConflict     │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  attempt:                                                               │
//! │     tx = db.begin()                                                     │
//! │     first statement is a write  ← takes SQLite's write lock             │
//! │     reads, checks, writes                                               │
//! │     tx.commit()                                                         │
//! │                                                                         │
//! │  Any `?` or an expired deadline drops `tx` → rollback.                  │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

pub mod payment;
pub mod shift;
pub mod work_order;

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tracing::warn;

use torque_core::{Clock, PageRequest};
use torque_db::Database;

use crate::config::EngineConfig;
use crate::deadline::Deadline;
use crate::error::{EngineError, EngineResult};
use crate::retry::RetryPolicy;

/// Everything a service needs, shared by all three.
#[derive(Debug, Clone)]
pub struct ServiceContext {
    pub(crate) db: Database,
    pub(crate) clock: Arc<dyn Clock>,
    pub(crate) retry: RetryPolicy,
    pub(crate) operation_timeout: Duration,
    pub(crate) default_per_page: u32,
    pub(crate) max_per_page: u32,
}

impl ServiceContext {
    pub fn new(db: Database, config: &EngineConfig, clock: Arc<dyn Clock>) -> Self {
        ServiceContext {
            db,
            clock,
            retry: RetryPolicy::from_settings(&config.retry),
            operation_timeout: config.operation_timeout(),
            default_per_page: config.limits.default_per_page,
            max_per_page: config.limits.max_per_page,
        }
    }

    pub fn database(&self) -> &Database {
        &self.db
    }

    /// A page request using the configured default page size.
    pub fn page(&self, page: u32, per_page: Option<u32>) -> PageRequest {
        PageRequest::new(page, per_page.unwrap_or(self.default_per_page))
    }

    pub(crate) fn check_page(&self, request: PageRequest) -> EngineResult<PageRequest> {
        request.validate(self.max_per_page)?;
        Ok(request)
    }

    /// Runs a write attempt with retries under the effective deadline.
    pub(crate) async fn run<T, F, Fut>(
        &self,
        operation: &'static str,
        deadline: Deadline,
        attempt: F,
    ) -> EngineResult<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = EngineResult<T>>,
    {
        self.within_deadline(operation, deadline, self.retry.run(operation, attempt))
            .await
    }

    /// Runs a read under the effective deadline. Reads are not retried.
    pub(crate) async fn read<T, E, Fut>(
        &self,
        operation: &'static str,
        deadline: Deadline,
        read: Fut,
    ) -> EngineResult<T>
    where
        Fut: Future<Output = Result<T, E>>,
        EngineError: From<E>,
    {
        self.within_deadline(operation, deadline, async { Ok::<T, EngineError>(read.await?) })
            .await
    }

    async fn within_deadline<T, Fut>(
        &self,
        operation: &'static str,
        deadline: Deadline,
        fut: Fut,
    ) -> EngineResult<T>
    where
        Fut: Future<Output = EngineResult<T>>,
    {
        if deadline.is_expired() {
            warn!(operation, "Deadline already passed, not starting");
            return Err(EngineError::DeadlineExceeded { operation });
        }

        let at = deadline.effective(self.operation_timeout);
        match tokio::time::timeout_at(at, fut).await {
            Ok(result) => result,
            Err(_) => {
                warn!(operation, "Deadline exceeded, transaction rolled back");
                Err(EngineError::DeadlineExceeded { operation })
            }
        }
    }
}

#[cfg(test)]
pub(crate) mod testing {
    //! Shared fixtures for the service tests.

    use super::*;
    use chrono::{TimeZone, Utc};
    use torque_core::{FixedClock, Product, ProductKind};
    use torque_db::{generate_product_id, DbConfig};

    pub struct Fixture {
        pub ctx: ServiceContext,
        pub clock: Arc<FixedClock>,
    }

    /// In-memory database, clock pinned to 2025-03-14 09:00 UTC.
    pub async fn fixture() -> Fixture {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let clock = Arc::new(FixedClock::new(
            Utc.with_ymd_and_hms(2025, 3, 14, 9, 0, 0).unwrap(),
        ));
        let mut config = EngineConfig::default();
        config.retry.initial_backoff_ms = 1;
        config.retry.max_backoff_ms = 5;
        let ctx = ServiceContext::new(db, &config, clock.clone());
        Fixture { ctx, clock }
    }

    pub async fn product(ctx: &ServiceContext, name: &str, price_cents: i64) -> Product {
        let now = ctx.clock.now();
        let product = Product {
            id: generate_product_id(),
            name: name.to_string(),
            description: None,
            price_cents,
            kind: ProductKind::Service,
            is_active: true,
            created_at: now,
            updated_at: now,
        };
        ctx.db.products().insert(&product).await.unwrap();
        product
    }
}

#[cfg(test)]
mod tests {
    use super::testing::fixture;
    use super::*;
    use std::sync::atomic::{AtomicBool, Ordering};
    use tokio::time::Instant;

    #[tokio::test]
    async fn test_expired_deadline_never_starts() {
        let f = fixture().await;
        let ran = AtomicBool::new(false);
        let ran_ref = &ran;
        let result = f
            .ctx
            .run("noop", Deadline::at(Instant::now()), move || async move {
                ran_ref.store(true, Ordering::SeqCst);
                Ok::<(), EngineError>(())
            })
            .await;
        assert!(matches!(result, Err(EngineError::DeadlineExceeded { operation: "noop" })));
        assert!(!ran.load(Ordering::SeqCst));
    }

    #[tokio::test]
    async fn test_slow_attempt_times_out() {
        let f = fixture().await;
        let result = f
            .ctx
            .run("slow", Deadline::after(Duration::from_millis(20)), || async {
                tokio::time::sleep(Duration::from_secs(5)).await;
                Ok::<(), EngineError>(())
            })
            .await;
        assert!(matches!(result, Err(EngineError::DeadlineExceeded { .. })));
    }

    #[tokio::test]
    async fn test_page_validation_uses_config_limit() {
        let f = fixture().await;
        assert_eq!(f.ctx.page(2, None), PageRequest::new(2, 10));
        assert!(f.ctx.check_page(PageRequest::new(1, 100)).is_ok());
        assert!(matches!(
            f.ctx.check_page(PageRequest::new(1, 101)),
            Err(EngineError::Validation(_))
        ));
        assert!(f.ctx.check_page(PageRequest::new(0, 10)).is_err());
    }
}
