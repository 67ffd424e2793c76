//! # Domain Types
//!
//! Core domain types used throughout Torque POS.
//!
//! ## Type Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │   WorkOrder     │   │    Payment      │   │     Shift       │       │
//! │  │  ─────────────  │   │  ─────────────  │   │  ─────────────  │       │
//! │  │  id (UUID)      │◄──│  work_order_id  │   │  id (UUID)      │       │
//! │  │  order_number   │   │  payment_number │   │  user_id        │       │
//! │  │  queue_number   │   │  method, status │   │  status         │       │
//! │  │  status         │   │  amount_paid    │   │  initial_cash   │       │
//! │  │  total_cents    │   │  shift_id ──────┼──►│  total_sales    │       │
//! │  └───────┬─────────┘   └─────────────────┘   └─────────────────┘       │
//! │          │ owns                                                         │
//! │  ┌───────▼─────────┐   ┌─────────────────┐                             │
//! │  │ WorkOrderItem   │──►│    Product      │  (name + price snapshot)    │
//! │  └─────────────────┘   └─────────────────┘                             │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Dual-Key Identity Pattern
//! Every entity has:
//! - `id`: UUID v4 - immutable, used for database relations
//! - Business ID: (`order_number`, `payment_number`) - human-readable, unique

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use ts_rs::TS;

use crate::money::Money;

/// Implements `as_str` and `Display` for a status enum using the same
/// snake_case names that serde and the database use.
macro_rules! wire_names {
    ($ty:ty { $($variant:ident => $name:literal),+ $(,)? }) => {
        impl $ty {
            /// The stored / serialized name of this value.
            pub const fn as_str(&self) -> &'static str {
                match self {
                    $(Self::$variant => $name),+
                }
            }
        }

        impl fmt::Display for $ty {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }
    };
}

// =============================================================================
// Product
// =============================================================================

/// What a catalog entry represents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "snake_case"))]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum ProductKind {
    /// Labour: wash, oil change, detailing.
    Service,
    /// Extra attached to a service (wax, vacuum).
    Addon,
    /// Shelf goods.
    Retail,
}

wire_names!(ProductKind {
    Service => "service",
    Addon => "addon",
    Retail => "retail",
});

/// A catalog entry that work order items are priced from.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct Product {
    /// Unique identifier (UUID v4).
    pub id: String,

    /// Display name, copied onto items at pricing time.
    pub name: String,

    pub description: Option<String>,

    /// Current unit price in cents.
    pub price_cents: i64,

    pub kind: ProductKind,

    /// Inactive products do not resolve for pricing (soft delete).
    pub is_active: bool,

    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,

    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

impl Product {
    /// Returns the price as a Money type.
    #[inline]
    pub fn price(&self) -> Money {
        Money::from_cents(self.price_cents)
    }
}

// =============================================================================
// Work Order Enums
// =============================================================================

/// Where the work order was placed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "snake_case"))]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum WorkOrderSource {
    Kiosk,
    Cashier,
    Online,
}

wire_names!(WorkOrderSource {
    Kiosk => "kiosk",
    Cashier => "cashier",
    Online => "online",
});

/// What the work order contains.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "snake_case"))]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum WorkOrderType {
    Service,
    Retail,
    Mix,
}

wire_names!(WorkOrderType {
    Service => "service",
    Retail => "retail",
    Mix => "mix",
});

/// Fulfillment status of a work order.
///
/// See [`crate::lifecycle`] for the legal transitions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "snake_case"))]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum WorkOrderStatus {
    Pending,
    Confirmed,
    InProgress,
    Ready,
    Completed,
    Cancelled,
}

wire_names!(WorkOrderStatus {
    Pending => "pending",
    Confirmed => "confirmed",
    InProgress => "in_progress",
    Ready => "ready",
    Completed => "completed",
    Cancelled => "cancelled",
});

impl Default for WorkOrderStatus {
    fn default() -> Self {
        WorkOrderStatus::Pending
    }
}

// =============================================================================
// Work Order
// =============================================================================

/// A customer's request for service and retail items.
///
/// ## Totals Invariant
/// `total_cents = subtotal_cents - discount_cents + tax_cents`, and
/// `subtotal_cents` equals the sum of the item subtotals.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct WorkOrder {
    pub id: String,
    /// `WO-YYYYMMDD-NNNN`, unique.
    pub order_number: String,
    pub source: WorkOrderSource,
    pub order_type: WorkOrderType,
    pub customer_id: Option<String>,
    pub vehicle_id: Option<String>,
    pub cashier_id: Option<String>,
    pub shift_id: Option<String>,
    /// Daily counter shown on the waiting-room display.
    pub queue_number: Option<i64>,
    pub status: WorkOrderStatus,
    pub notes: Option<String>,
    pub special_instructions: Option<String>,
    #[ts(as = "Option<String>")]
    pub confirmed_at: Option<DateTime<Utc>>,
    #[ts(as = "Option<String>")]
    pub started_at: Option<DateTime<Utc>>,
    #[ts(as = "Option<String>")]
    pub completed_at: Option<DateTime<Utc>>,
    pub subtotal_cents: i64,
    pub discount_cents: i64,
    pub tax_cents: i64,
    pub total_cents: i64,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
    #[ts(as = "Option<String>")]
    pub deleted_at: Option<DateTime<Utc>>,
}

impl WorkOrder {
    #[inline]
    pub fn subtotal(&self) -> Money {
        Money::from_cents(self.subtotal_cents)
    }

    #[inline]
    pub fn discount(&self) -> Money {
        Money::from_cents(self.discount_cents)
    }

    #[inline]
    pub fn tax(&self) -> Money {
        Money::from_cents(self.tax_cents)
    }

    #[inline]
    pub fn total(&self) -> Money {
        Money::from_cents(self.total_cents)
    }
}

/// One priced line of a work order.
///
/// Uses the snapshot pattern: name and price are frozen when the order is
/// created, so later catalog edits never change what the customer owes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct WorkOrderItem {
    pub id: String,
    pub work_order_id: String,
    pub product_id: String,
    pub product_name_snapshot: String,
    pub price_snapshot_cents: i64,
    pub quantity: i64,
    /// `price_snapshot_cents × quantity`.
    pub subtotal_cents: i64,
    pub assigned_staff_id: Option<String>,
    pub note: Option<String>,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

impl WorkOrderItem {
    #[inline]
    pub fn subtotal(&self) -> Money {
        Money::from_cents(self.subtotal_cents)
    }
}

/// A work order together with its items.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct WorkOrderDetails {
    pub order: WorkOrder,
    pub items: Vec<WorkOrderItem>,
}

// =============================================================================
// Payment
// =============================================================================

/// How the customer paid. `Qris` is the card-equivalent QR rail.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "snake_case"))]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethod {
    Cash,
    Qris,
    Transfer,
    EWallet,
}

wire_names!(PaymentMethod {
    Cash => "cash",
    Qris => "qris",
    Transfer => "transfer",
    EWallet => "e_wallet",
});

/// Settlement status of a payment. Only `Completed` counts towards totals.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "snake_case"))]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum PaymentStatus {
    Pending,
    Completed,
    Failed,
    Refunded,
}

wire_names!(PaymentStatus {
    Pending => "pending",
    Completed => "completed",
    Failed => "failed",
    Refunded => "refunded",
});

/// A settled payment against a work order.
///
/// Amount and change are immutable once written; only status, reference
/// and raw payload may change afterwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct Payment {
    pub id: String,
    /// `PAY-YYYYMMDD-NNNN`, unique.
    pub payment_number: String,
    pub work_order_id: String,
    pub cashier_id: Option<String>,
    pub shift_id: Option<String>,
    pub method: PaymentMethod,
    pub status: PaymentStatus,
    pub amount_paid_cents: i64,
    pub change_cents: i64,
    pub reference_number: Option<String>,
    /// Opaque JSON from the payment rail, stored verbatim.
    pub raw_payload: Option<String>,
    #[ts(as = "String")]
    pub paid_at: DateTime<Utc>,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

impl Payment {
    #[inline]
    pub fn amount_paid(&self) -> Money {
        Money::from_cents(self.amount_paid_cents)
    }

    #[inline]
    pub fn change(&self) -> Money {
        Money::from_cents(self.change_cents)
    }

    /// Parses the raw payload, if any. Malformed JSON yields `None`.
    pub fn payload(&self) -> Option<serde_json::Value> {
        self.raw_payload
            .as_deref()
            .and_then(|raw| serde_json::from_str(raw).ok())
    }
}

/// A payment joined with the order it settles, for shift reports.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct PaymentWithOrder {
    #[cfg_attr(feature = "sqlx", sqlx(flatten))]
    #[serde(flatten)]
    pub payment: Payment,
    pub order_number: String,
    pub order_status: WorkOrderStatus,
    pub order_total_cents: i64,
}

// =============================================================================
// Shift
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "snake_case"))]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum ShiftStatus {
    Active,
    Closed,
    Canceled,
}

wire_names!(ShiftStatus {
    Active => "active",
    Closed => "closed",
    Canceled => "canceled",
});

/// A cashier's drawer session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct Shift {
    pub id: String,
    pub user_id: String,
    #[ts(as = "String")]
    pub start_time: DateTime<Utc>,
    #[ts(as = "Option<String>")]
    pub end_time: Option<DateTime<Utc>>,
    pub initial_cash_cents: i64,
    pub final_cash_cents: i64,
    /// Written on close: Σ completed payments attributed to this shift.
    pub total_sales_cents: i64,
    pub status: ShiftStatus,
    /// Who handed over the opening float.
    pub received_from: Option<String>,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

impl Shift {
    #[inline]
    pub fn is_active(&self) -> bool {
        self.status == ShiftStatus::Active
    }
}

/// Sales figures for one shift.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct ShiftSummary {
    pub total_sales_cents: i64,
    pub total_orders: i64,
}

impl ShiftSummary {
    #[inline]
    pub fn total_sales(&self) -> Money {
        Money::from_cents(self.total_sales_cents)
    }
}

/// A shift with everything attributed to it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct ShiftDetails {
    pub shift: Shift,
    pub summary: ShiftSummary,
    pub work_orders: Vec<WorkOrder>,
    pub payments: Vec<Payment>,
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_names_match_serde() {
        let json = serde_json::to_string(&WorkOrderStatus::InProgress).unwrap();
        assert_eq!(json, "\"in_progress\"");
        assert_eq!(WorkOrderStatus::InProgress.as_str(), "in_progress");

        let json = serde_json::to_string(&PaymentMethod::EWallet).unwrap();
        assert_eq!(json, "\"e_wallet\"");
        assert_eq!(PaymentMethod::EWallet.to_string(), "e_wallet");
    }

    #[test]
    fn test_work_order_status_default() {
        assert_eq!(WorkOrderStatus::default(), WorkOrderStatus::Pending);
    }

    #[test]
    fn test_payment_payload_parsing() {
        let now = Utc::now();
        let mut payment = Payment {
            id: "p1".to_string(),
            payment_number: "PAY-20250101-0001".to_string(),
            work_order_id: "wo1".to_string(),
            cashier_id: None,
            shift_id: None,
            method: PaymentMethod::Qris,
            status: PaymentStatus::Completed,
            amount_paid_cents: 11_000,
            change_cents: 0,
            reference_number: Some("QR-778".to_string()),
            raw_payload: Some(r#"{"acquirer":"bank-a","rrn":"0042"}"#.to_string()),
            paid_at: now,
            created_at: now,
            updated_at: now,
        };

        let payload = payment.payload().unwrap();
        assert_eq!(payload["rrn"], "0042");

        payment.raw_payload = Some("not json".to_string());
        assert!(payment.payload().is_none());
    }
}
