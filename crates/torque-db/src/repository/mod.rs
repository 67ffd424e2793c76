//! # Repository Module
//!
//! Database repository implementations for Torque POS.
//!
//! ## Two Ways In
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Pool-backed (&self)                  Connection-level (conn: &mut _)   │
//! │  ───────────────────                  ──────────────────────────────    │
//! │  db.work_orders().get_details(id)     WorkOrderRepository::lock(tx, id) │
//! │  db.payments().list_by_work_order()   PaymentRepository::insert(tx, p)  │
//! │  db.shifts().get_active_by_user()     ShiftRepository::close(tx, ...)   │
//! │                                                                         │
//! │  One-off reads; each call acquires    Composable: the engine passes     │
//! │  and releases its own connection.     the same transaction to several   │
//! │                                       calls and commits once.           │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Available Repositories
//!
//! - [`ProductRepository`](product::ProductRepository) - Catalog lookups
//! - [`WorkOrderRepository`](work_order::WorkOrderRepository) - Orders and items
//! - [`PaymentRepository`](payment::PaymentRepository) - Payment ledger
//! - [`ShiftRepository`](shift::ShiftRepository) - Shifts and summaries
//! - [`SequenceRepository`](sequence::SequenceRepository) - Daily counters
//! - [`EntityStore`](entity::EntityStore) - Shared id/list/count reads

pub mod entity;
pub mod payment;
pub mod product;
pub mod sequence;
pub mod shift;
pub mod work_order;
