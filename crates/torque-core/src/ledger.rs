//! # Payment Arithmetic
//!
//! Change calculation and the fully-paid rule.

use crate::money::Money;
use crate::types::PaymentMethod;

/// Change owed back to the customer.
///
/// Only cash produces change. Any other rail is settled for the exact
/// amount the rail reports, so overpayment there is not returned here.
///
/// ## Example
/// ```rust
/// use torque_core::ledger::calculate_change;
/// use torque_core::{Money, PaymentMethod};
///
/// let total = Money::from_cents(11_000);
/// assert_eq!(calculate_change(PaymentMethod::Cash, Money::from_cents(15_000), total).cents(), 4_000);
/// assert_eq!(calculate_change(PaymentMethod::Qris, Money::from_cents(15_000), total).cents(), 0);
/// assert_eq!(calculate_change(PaymentMethod::Cash, Money::from_cents(5_000), total).cents(), 0);
/// ```
pub fn calculate_change(method: PaymentMethod, amount_paid: Money, order_total: Money) -> Money {
    match method {
        PaymentMethod::Cash if amount_paid > order_total => amount_paid - order_total,
        _ => Money::zero(),
    }
}

/// An order is fully paid once completed payments reach its total.
#[inline]
pub fn is_fully_paid(completed_paid: Money, order_total: Money) -> bool {
    completed_paid >= order_total
}
