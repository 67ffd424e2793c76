//! # torque-core: Pure Business Logic for Torque POS
//!
//! Everything the fulfillment engine decides without touching storage:
//! how lines are priced, which status changes are legal, how numbers are
//! formatted, and when an order counts as paid.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Torque POS Architecture                          │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │        Transport (kiosk, cashier terminal, online orders)       │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                    torque-engine                                │   │
//! │  │    WorkOrderService, PaymentService, ShiftService               │   │
//! │  └──────────────┬──────────────────────────────┬───────────────────┘   │
//! │                 │                              │                        │
//! │  ┌──────────────▼──────────────────┐   ┌──────▼──────────────────┐     │
//! │  │   ★ torque-core (THIS CRATE) ★  │   │       torque-db         │     │
//! │  │                                 │   │  SQLite repositories    │     │
//! │  │  money  pricing  lifecycle      │   │  sequence counters      │     │
//! │  │  ledger sequence pagination     │   └─────────────────────────┘     │
//! │  │  clock  validation  types       │                                   │
//! │  │                                 │                                   │
//! │  │  NO I/O • NO DATABASE • NO NETWORK                                  │
//! │  └─────────────────────────────────┘                                   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`types`] - Domain types (WorkOrder, Payment, Shift, Product)
//! - [`money`] - Money type with integer arithmetic
//! - [`pricing`] - Line-item pricing and order totals
//! - [`lifecycle`] - Work order status state machine
//! - [`ledger`] - Change and fully-paid rules
//! - [`sequence`] - Order / payment number formats
//! - [`pagination`] - Page requests and envelopes
//! - [`clock`] - Injectable time source
//! - [`validation`] - Input validation
//! - [`error`] - Domain error types
//!
//! ## Example Usage
//!
//! ```rust
//! use torque_core::ledger::{calculate_change, is_fully_paid};
//! use torque_core::{Money, PaymentMethod};
//!
//! let total = Money::from_cents(11_000);
//! let tendered = Money::from_cents(15_000);
//!
//! assert_eq!(calculate_change(PaymentMethod::Cash, tendered, total).to_string(), "40.00");
//! assert!(is_fully_paid(tendered, total));
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod clock;
pub mod error;
pub mod ledger;
pub mod lifecycle;
pub mod money;
pub mod pagination;
pub mod pricing;
pub mod sequence;
pub mod types;
pub mod validation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================

pub use clock::{Clock, FixedClock, SystemClock};
pub use error::{CoreError, CoreResult, ValidationError};
pub use money::Money;
pub use pagination::{Page, PageRequest};
pub use pricing::PricedLine;
pub use sequence::SequenceScope;
pub use types::*;

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// Maximum lines in a single work order.
pub const MAX_ORDER_ITEMS: usize = 100;

/// Maximum quantity of a single line.
///
/// Guards against typing 1000 instead of 10 at the counter.
pub const MAX_ITEM_QUANTITY: i64 = 999;

/// Maximum length of free-text fields (notes, instructions, references).
pub const MAX_TEXT_LENGTH: usize = 1000;

/// Page size used when a caller does not ask for one.
pub const DEFAULT_PER_PAGE: u32 = 10;
