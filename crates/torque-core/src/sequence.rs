//! # Sequence Numbers
//!
//! Formatting rules for human-readable identifiers.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Scope     Example              Resets      Padding                    │
//! │  ───────   ──────────────────   ─────────   ───────────────────────    │
//! │  Order     WO-20250314-0007     daily       4 digits, wider if needed  │
//! │  Payment   PAY-20250314-0012    daily       4 digits, wider if needed  │
//! │  Queue     7                    daily       none                       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Allocation of the next ordinal is storage work and lives in
//! `torque-db`; this module only knows how numbers look.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// The independent counters kept per calendar day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SequenceScope {
    Order,
    Payment,
    Queue,
}

impl SequenceScope {
    /// Key stored in the counter table.
    pub const fn as_str(&self) -> &'static str {
        match self {
            SequenceScope::Order => "order",
            SequenceScope::Payment => "payment",
            SequenceScope::Queue => "queue",
        }
    }

    /// Prefix of the formatted number, if the scope has one.
    pub const fn prefix(&self) -> Option<&'static str> {
        match self {
            SequenceScope::Order => Some("WO"),
            SequenceScope::Payment => Some("PAY"),
            SequenceScope::Queue => None,
        }
    }
}

/// Compact day key used in numbers and the counter table: `YYYYMMDD`.
pub fn day_key(date: NaiveDate) -> String {
    date.format("%Y%m%d").to_string()
}

/// The `PREFIX-YYYYMMDD` stem shared by every number of a scope on a day.
///
/// Returns `None` for [`SequenceScope::Queue`].
pub fn day_stem(scope: SequenceScope, date: NaiveDate) -> Option<String> {
    scope
        .prefix()
        .map(|prefix| format!("{}-{}", prefix, day_key(date)))
}

/// Formats a prefixed sequence number.
///
/// ## Example
/// ```rust
/// use chrono::NaiveDate;
/// use torque_core::sequence::{format_number, SequenceScope};
///
/// let day = NaiveDate::from_ymd_opt(2025, 3, 14).unwrap();
/// assert_eq!(format_number(SequenceScope::Order, day, 7).as_deref(), Some("WO-20250314-0007"));
/// assert_eq!(format_number(SequenceScope::Payment, day, 12345).as_deref(), Some("PAY-20250314-12345"));
/// assert_eq!(format_number(SequenceScope::Queue, day, 7), None);
/// ```
pub fn format_number(scope: SequenceScope, date: NaiveDate, ordinal: i64) -> Option<String> {
    day_stem(scope, date).map(|stem| format!("{}-{:04}", stem, ordinal))
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn day() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 1, 9).unwrap()
    }

    #[test]
    fn test_format_pads_to_four_digits() {
        assert_eq!(
            format_number(SequenceScope::Order, day(), 1).unwrap(),
            "WO-20250109-0001"
        );
        assert_eq!(
            format_number(SequenceScope::Payment, day(), 42).unwrap(),
            "PAY-20250109-0042"
        );
    }

    #[test]
    fn test_format_widens_past_9999() {
        assert_eq!(
            format_number(SequenceScope::Order, day(), 10_000).unwrap(),
            "WO-20250109-10000"
        );
    }

    #[test]
    fn test_queue_has_no_stem() {
        assert_eq!(day_stem(SequenceScope::Queue, day()), None);
        assert_eq!(day_stem(SequenceScope::Order, day()).unwrap(), "WO-20250109");
    }
}
