//! # Line-Item Pricer
//!
//! Turns a catalog product and a quantity into an immutable priced line,
//! and rolls lines up into order totals.
//!
//! ## Pricing Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  ItemRequest { product_id, qty }                                        │
//! │       │                                                                 │
//! │       ▼  (engine resolves product inside the create transaction)        │
//! │  price_line(&product, qty) ← THIS MODULE                               │
//! │       │                                                                 │
//! │       ├── inactive product? → ProductNotFound                          │
//! │       ├── qty ∉ 1..=999?    → Validation                               │
//! │       └── PricedLine { name, unit_price, qty, subtotal }               │
//! │                                                                         │
//! │  order_subtotal(lines) = Σ subtotal                                    │
//! │  compute_total(subtotal, discount, tax) = subtotal − discount + tax    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use crate::error::{CoreError, CoreResult};
use crate::money::Money;
use crate::types::Product;
use crate::validation::{validate_non_negative_cents, validate_quantity};

/// A product frozen at the moment it was priced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PricedLine {
    pub product_id: String,
    pub name: String,
    pub unit_price: Money,
    pub quantity: i64,
    pub subtotal: Money,
}

/// Prices one line.
///
/// ## Example
/// ```rust,ignore
/// let line = price_line(&oil_change, 2)?;
/// assert_eq!(line.subtotal, oil_change.price().checked_mul_quantity(2).unwrap());
/// ```
pub fn price_line(product: &Product, quantity: i64) -> CoreResult<PricedLine> {
    if !product.is_active {
        return Err(CoreError::ProductNotFound(product.id.clone()));
    }

    validate_quantity(quantity)?;

    let unit_price = product.price();
    let subtotal = unit_price
        .checked_mul_quantity(quantity)
        .ok_or_else(|| CoreError::AmountOverflow {
            context: format!("line subtotal for product {}", product.id),
        })?;

    Ok(PricedLine {
        product_id: product.id.clone(),
        name: product.name.clone(),
        unit_price,
        quantity,
        subtotal,
    })
}

/// Sums line subtotals.
pub fn order_subtotal<'a, I>(lines: I) -> CoreResult<Money>
where
    I: IntoIterator<Item = &'a PricedLine>,
{
    lines.into_iter().try_fold(Money::zero(), |acc, line| {
        acc.checked_add(line.subtotal)
            .ok_or_else(|| CoreError::AmountOverflow {
                context: "order subtotal".to_string(),
            })
    })
}

/// Computes `subtotal - discount + tax`.
///
/// Discount and tax must be non-negative, and the result must not drop
/// below zero.
///
/// ## Example
/// ```rust
/// use torque_core::money::Money;
/// use torque_core::pricing::compute_total;
///
/// let total = compute_total(
///     Money::from_cents(11_000),
///     Money::from_cents(1_000),
///     Money::from_cents(500),
/// ).unwrap();
/// assert_eq!(total.cents(), 10_500);
/// ```
pub fn compute_total(subtotal: Money, discount: Money, tax: Money) -> CoreResult<Money> {
    validate_non_negative_cents("discount", discount.cents())?;
    validate_non_negative_cents("tax", tax.cents())?;

    let total = subtotal
        .checked_sub(discount)
        .and_then(|m| m.checked_add(tax))
        .ok_or_else(|| CoreError::AmountOverflow {
            context: "order total".to_string(),
        })?;

    if total.is_negative() {
        return Err(CoreError::NegativeTotal {
            subtotal_cents: subtotal.cents(),
            discount_cents: discount.cents(),
            tax_cents: tax.cents(),
        });
    }

    Ok(total)
}

// =============================================================================
// Unit Tests
// =============================================================================
