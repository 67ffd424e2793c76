//! # torque-db: Persistence Gateway for Torque POS
//!
//! SQLite storage for products, work orders, payments, shifts and the
//! daily sequence counters, using sqlx for async access.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Torque POS Data Flow                             │
//! │                                                                         │
//! │  torque-engine (WorkOrderService, PaymentService, ShiftService)        │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                     torque-db (THIS CRATE)                      │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────────┐    ┌───────────────┐    ┌──────────────┐  │   │
//! │  │   │   Database    │    │  Repositories │    │  Migrations  │  │   │
//! │  │   │   (pool.rs)   │    │               │    │  (embedded)  │  │   │
//! │  │   │               │    │ WorkOrderRepo │    │              │  │   │
//! │  │   │ SqlitePool    │◄───│ PaymentRepo   │    │ 001_init.sql │  │   │
//! │  │   │ begin()       │    │ ShiftRepo     │    │              │  │   │
//! │  │   │               │    │ SequenceRepo  │    │              │  │   │
//! │  │   └───────────────┘    └───────────────┘    └──────────────┘  │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  SQLite database file (WAL)                                             │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Module Organization
//!
//! - [`pool`] - Connection pool creation and transactions
//! - [`migrations`] - Embedded database migrations
//! - [`error`] - Database error types
//! - [`repository`] - Repository implementations
//!
//! ## Usage
//!
//! ```rust,ignore
//! use torque_db::{Database, DbConfig};
//!
//! let db = Database::new(DbConfig::new("torque.db")).await?;
//! let active = db.shifts().get_active_by_user("op-1").await?;
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod migrations;
pub mod pool;
pub mod repository;

// =============================================================================
// Re-exports
// =============================================================================

pub use error::{DbError, DbResult};
pub use pool::{Database, DbConfig};

pub use repository::entity::{Entity, EntityStore};
pub use repository::payment::{PaymentChanges, PaymentRepository};
pub use repository::product::{generate_product_id, ProductRepository};
pub use repository::sequence::SequenceRepository;
pub use repository::shift::ShiftRepository;
pub use repository::work_order::WorkOrderRepository;
