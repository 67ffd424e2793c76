//! # Validation Module
//!
//! Input validation for engine requests.
//!
//! ## Validation Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Validation Layers                                  │
//! │                                                                         │
//! │  Layer 1: Transport (outside this workspace)                           │
//! │  └── Deserialization, auth                                             │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 2: Engine service (Rust)                                        │
//! │  └── THIS MODULE: quantities, amounts, ids, text limits                │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 3: Database (SQLite)                                            │
//! │  ├── CHECK constraints on cents columns                                │
//! │  ├── UNIQUE order / payment numbers                                    │
//! │  └── One active shift per user (partial unique index)                  │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use crate::error::ValidationError;
use crate::{MAX_ITEM_QUANTITY, MAX_ORDER_ITEMS, MAX_TEXT_LENGTH};

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

// =============================================================================
// Numeric Validators
// =============================================================================

/// Validates a line-item quantity.
///
/// ## Rules
/// - Must be positive (> 0)
/// - Must not exceed MAX_ITEM_QUANTITY (999)
///
/// ## Example
/// ```rust
/// use torque_core::validation::validate_quantity;
///
/// assert!(validate_quantity(2).is_ok());
/// assert!(validate_quantity(0).is_err());
/// assert!(validate_quantity(1000).is_err());
/// ```
pub fn validate_quantity(qty: i64) -> ValidationResult<()> {
    if qty <= 0 {
        return Err(ValidationError::must_be_positive("quantity"));
    }

    if qty > MAX_ITEM_QUANTITY {
        return Err(ValidationError::OutOfRange {
            field: "quantity".to_string(),
            min: 1,
            max: MAX_ITEM_QUANTITY,
        });
    }

    Ok(())
}

/// Validates a price in cents. Zero is allowed (complimentary items).
pub fn validate_price_cents(cents: i64) -> ValidationResult<()> {
    validate_non_negative_cents("price", cents)
}

/// Validates a payment amount in cents. Must be strictly positive.
pub fn validate_payment_amount(cents: i64) -> ValidationResult<()> {
    if cents <= 0 {
        return Err(ValidationError::must_be_positive("amount_paid"));
    }

    Ok(())
}

/// Validates an amount that may be zero but never negative
/// (discount, tax, cash counts).
pub fn validate_non_negative_cents(field: &str, cents: i64) -> ValidationResult<()> {
    if cents < 0 {
        return Err(ValidationError::must_not_be_negative(field));
    }

    Ok(())
}

// =============================================================================
// Collection Validators
// =============================================================================

/// Validates the number of lines in a new work order.
///
/// ## Rules
/// - At least one item
/// - At most MAX_ORDER_ITEMS (100)
pub fn validate_item_count(count: usize) -> ValidationResult<()> {
    if count == 0 {
        return Err(ValidationError::required("items"));
    }

    if count > MAX_ORDER_ITEMS {
        return Err(ValidationError::OutOfRange {
            field: "items".to_string(),
            min: 1,
            max: MAX_ORDER_ITEMS as i64,
        });
    }

    Ok(())
}

// =============================================================================
// String Validators
// =============================================================================

/// Validates an external reference such as a user or customer id.
///
/// These are issued by other systems, so only presence and length are
/// checked.
pub fn validate_reference(field: &str, value: &str) -> ValidationResult<()> {
    if value.trim().is_empty() {
        return Err(ValidationError::required(field));
    }

    if value.len() > 64 {
        return Err(ValidationError::TooLong {
            field: field.to_string(),
            max: 64,
        });
    }

    Ok(())
}

/// Validates optional free text (notes, instructions, references).
pub fn validate_optional_text(field: &str, value: Option<&str>) -> ValidationResult<()> {
    match value {
        Some(text) if text.len() > MAX_TEXT_LENGTH => Err(ValidationError::TooLong {
            field: field.to_string(),
            max: MAX_TEXT_LENGTH,
        }),
        _ => Ok(()),
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_quantity() {
        assert!(validate_quantity(1).is_ok());
        assert!(validate_quantity(999).is_ok());

        assert!(validate_quantity(0).is_err());
        assert!(validate_quantity(-1).is_err());
        assert!(validate_quantity(1000).is_err());
    }

    #[test]
    fn test_validate_amounts() {
        assert!(validate_price_cents(0).is_ok());
        assert!(validate_price_cents(-1).is_err());

        assert!(validate_payment_amount(1).is_ok());
        assert!(validate_payment_amount(0).is_err());

        assert_eq!(
            validate_non_negative_cents("tax", -5),
            Err(ValidationError::must_not_be_negative("tax"))
        );
    }

    #[test]
    fn test_validate_item_count() {
        assert_eq!(validate_item_count(0), Err(ValidationError::required("items")));
        assert!(validate_item_count(1).is_ok());
        assert!(validate_item_count(MAX_ORDER_ITEMS).is_ok());
        assert!(validate_item_count(MAX_ORDER_ITEMS + 1).is_err());
    }

    #[test]
    fn test_validate_reference_and_text() {
        assert!(validate_reference("user_id", "cashier-7").is_ok());
        assert!(validate_reference("user_id", "  ").is_err());
        assert!(validate_reference("user_id", &"x".repeat(65)).is_err());

        assert!(validate_optional_text("notes", None).is_ok());
        assert!(validate_optional_text("notes", Some("rear bumper scratched")).is_ok());
        assert!(validate_optional_text("notes", Some(&"x".repeat(MAX_TEXT_LENGTH + 1))).is_err());
    }
}
