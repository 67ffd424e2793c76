//! # torque-engine: Transactional Services for Torque POS
//!
//! Turns the rules in `torque-core` and the storage in `torque-db` into
//! safe, concurrent operations: every write is one serialized SQLite
//! transaction with retries and a deadline.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Torque POS Data Flow                             │
//! │                                                                         │
//! │  Kiosk / cashier terminal / online order                                │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                 torque-engine (THIS CRATE)                      │   │
//! │  │                                                                 │   │
//! │  │   ┌──────────────────┐ ┌────────────────┐ ┌────────────────┐   │   │
//! │  │   │ WorkOrderService │ │ PaymentService │ │  ShiftService  │   │   │
//! │  │   └────────┬─────────┘ └───────┬────────┘ └───────┬────────┘   │   │
//! │  │            └───────────────────┼──────────────────┘            │   │
//! │  │                     ServiceContext                              │   │
//! │  │          retry (backoff) • deadline • clock • paging            │   │
//! │  └────────────────────────────────┬────────────────────────────────┘   │
//! │                                   ▼                                     │
//! │                 torque-db (repositories, sequences)                     │
//! │                                   ▼                                     │
//! │                    SQLite (WAL, one writer at a time)                   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//!
//! ```rust,ignore
//! use torque_engine::{Deadline, Engine, EngineConfig};
//! use torque_engine::service::payment::ApplyPayment;
//! use torque_engine::service::shift::StartShift;
//! use torque_engine::service::work_order::CreateWorkOrder;
//!
//! let config = EngineConfig::load(None)?;
//! torque_engine::telemetry::init_tracing(&config.log)?;
//! let engine = Engine::connect(&config).await?;
//!
//! let shift = engine.shifts().start(StartShift::new("cashier-1", 20_000), Deadline::none()).await?;
//! let order = engine
//!     .work_orders()
//!     .create(
//!         CreateWorkOrder::new(WorkOrderSource::Cashier, WorkOrderType::Service)
//!             .item(wash_id, 1)
//!             .shift(&shift.id),
//!         Deadline::none(),
//!     )
//!     .await?;
//! let receipt = engine
//!     .payments()
//!     .apply(ApplyPayment::cash(&order.order.id, 10_000).shift(&shift.id), Deadline::none())
//!     .await?;
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod config;
pub mod deadline;
pub mod error;
pub mod retry;
pub mod service;
pub mod telemetry;

// =============================================================================
// Re-exports
// =============================================================================

pub use config::{EngineConfig, LogFormat, LogSettings};
pub use deadline::Deadline;
pub use error::{ConfigError, EngineError, EngineResult, ErrorKind};
pub use retry::RetryPolicy;
pub use service::payment::PaymentService;
pub use service::shift::ShiftService;
pub use service::work_order::WorkOrderService;
pub use service::ServiceContext;

use std::sync::Arc;
use tracing::info;

use torque_core::{Clock, PageRequest, SystemClock};
use torque_db::Database;

// =============================================================================
// Engine
// =============================================================================

/// The three services over one shared database.
///
/// Cheap to clone; clones share the pool.
#[derive(Debug, Clone)]
pub struct Engine {
    ctx: ServiceContext,
    work_orders: WorkOrderService,
    payments: PaymentService,
    shifts: ShiftService,
}

impl Engine {
    /// Builds the engine over an open database.
    pub fn new(db: Database, config: &EngineConfig, clock: Arc<dyn Clock>) -> Self {
        let ctx = ServiceContext::new(db, config, clock);
        Engine {
            work_orders: WorkOrderService::new(ctx.clone()),
            payments: PaymentService::new(ctx.clone()),
            shifts: ShiftService::new(ctx.clone()),
            ctx,
        }
    }

    /// Opens (and migrates) the configured database with the system clock.
    pub async fn connect(config: &EngineConfig) -> EngineResult<Self> {
        let db = Database::new(config.db_config()).await?;
        info!(path = %config.database.path.display(), "Engine connected");
        Ok(Engine::new(db, config, Arc::new(SystemClock)))
    }

    pub fn work_orders(&self) -> &WorkOrderService {
        &self.work_orders
    }

    pub fn payments(&self) -> &PaymentService {
        &self.payments
    }

    pub fn shifts(&self) -> &ShiftService {
        &self.shifts
    }

    pub fn database(&self) -> &Database {
        self.ctx.database()
    }

    /// A page request, falling back to the configured page size.
    pub fn page_request(&self, page: u32, per_page: Option<u32>) -> PageRequest {
        self.ctx.page(page, per_page)
    }

    /// Closes the pool. Outstanding clones fail afterwards.
    pub async fn close(&self) {
        self.ctx.database().close().await;
    }
}
