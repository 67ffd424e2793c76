//! # Engine Error Types
//!
//! What callers of the engine see.
//!
//! ## Error Kinds
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  ErrorKind::NotFound    NotFound, ProductNotFound                       │
//! │  ErrorKind::Validation  Validation, InvalidAmount, InvalidReference     │
//! │  ErrorKind::Conflict    SequenceConflict, ShiftAlreadyActive,           │
//! │                         OrderNotFound                                   │
//! │  ErrorKind::State       InvalidStatusTransition, ShiftNotActive,        │
//! │                         OrderClosed, OrderHasPayments, PaymentLocked    │
//! │  ErrorKind::Storage     Storage(DbError), DeadlineExceeded              │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Retry Classification
//! Only `SequenceConflict` and transient storage failures (SQLITE_BUSY,
//! pool exhaustion) are retried. Everything else fails on the first attempt.

use thiserror::Error;

use torque_core::{CoreError, ShiftStatus, ValidationError, WorkOrderStatus};
use torque_db::DbError;

/// Coarse classification for callers (HTTP status mapping, UI messages).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    NotFound,
    Validation,
    Conflict,
    State,
    Storage,
}

/// Engine operation errors.
#[derive(Debug, Error)]
pub enum EngineError {
    // =========================================================================
    // Lookup
    // =========================================================================
    #[error("{entity} not found: {id}")]
    NotFound { entity: String, id: String },

    /// The product is missing or no longer active.
    #[error("Product not found: {0}")]
    ProductNotFound(String),

    // =========================================================================
    // Input
    // =========================================================================
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    /// A monetary rule failed (negative total, overflow).
    #[error("Invalid amount: {0}")]
    InvalidAmount(String),

    /// A referenced shift, order or product row does not exist.
    #[error("Invalid reference: {0}")]
    InvalidReference(String),

    // =========================================================================
    // Conflicts
    // =========================================================================
    /// Concurrent writers kept colliding on a sequence number.
    #[error("Sequence number conflict on {field}")]
    SequenceConflict { field: String },

    #[error("User {user_id} already has an active shift")]
    ShiftAlreadyActive { user_id: String },

    /// The work order a payment targets does not exist.
    #[error("Work order not found for payment: {0}")]
    OrderNotFound(String),

    // =========================================================================
    // State
    // =========================================================================
    #[error("Cannot move work order from {from} to {to}")]
    InvalidStatusTransition {
        from: WorkOrderStatus,
        to: WorkOrderStatus,
    },

    #[error("Shift {id} is {status}, not active")]
    ShiftNotActive { id: String, status: ShiftStatus },

    #[error("Work order {id} is {status} and accepts no payments")]
    OrderClosed { id: String, status: WorkOrderStatus },

    #[error("Work order {0} has completed payments")]
    OrderHasPayments(String),

    #[error("Payment {0} is completed and cannot be removed")]
    PaymentLocked(String),

    // =========================================================================
    // Infrastructure
    // =========================================================================
    #[error("Deadline exceeded during {operation}")]
    DeadlineExceeded { operation: &'static str },

    #[error("Storage error: {0}")]
    Storage(DbError),
}

/// Result type alias for engine operations.
pub type EngineResult<T> = Result<T, EngineError>;

impl EngineError {
    pub fn not_found(entity: impl Into<String>, id: impl Into<String>) -> Self {
        EngineError::NotFound {
            entity: entity.into(),
            id: id.into(),
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            EngineError::NotFound { .. } | EngineError::ProductNotFound(_) => ErrorKind::NotFound,

            EngineError::Validation(_)
            | EngineError::InvalidAmount(_)
            | EngineError::InvalidReference(_) => ErrorKind::Validation,

            EngineError::SequenceConflict { .. }
            | EngineError::ShiftAlreadyActive { .. }
            | EngineError::OrderNotFound(_) => ErrorKind::Conflict,

            EngineError::InvalidStatusTransition { .. }
            | EngineError::ShiftNotActive { .. }
            | EngineError::OrderClosed { .. }
            | EngineError::OrderHasPayments(_)
            | EngineError::PaymentLocked(_) => ErrorKind::State,

            EngineError::DeadlineExceeded { .. } | EngineError::Storage(_) => ErrorKind::Storage,
        }
    }

    /// Whether re-running the whole transaction may succeed.
    pub fn is_retryable(&self) -> bool {
        match self {
            EngineError::SequenceConflict { .. } => true,
            EngineError::Storage(err) => err.is_transient(),
            _ => false,
        }
    }
}

/// Sequence-numbered columns. A uniqueness failure here means another
/// writer won the race for the same number.
const SEQUENCE_COLUMNS: [&str; 2] = ["order_number", "payment_number"];

impl From<DbError> for EngineError {
    fn from(err: DbError) -> Self {
        if let Some(column) = SEQUENCE_COLUMNS
            .iter()
            .find(|column| err.is_unique_violation_on(column))
        {
            return EngineError::SequenceConflict {
                field: column.to_string(),
            };
        }

        match err {
            DbError::NotFound { entity, id } => EngineError::NotFound { entity, id },
            DbError::ForeignKeyViolation { message } => EngineError::InvalidReference(message),
            DbError::Validation(v) => EngineError::Validation(v),
            other => EngineError::Storage(other),
        }
    }
}

impl From<sqlx::Error> for EngineError {
    fn from(err: sqlx::Error) -> Self {
        EngineError::from(DbError::from(err))
    }
}

impl From<CoreError> for EngineError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::ProductNotFound(id) => EngineError::ProductNotFound(id),
            CoreError::InvalidStatusTransition { from, to } => {
                EngineError::InvalidStatusTransition { from, to }
            }
            CoreError::Validation(v) => EngineError::Validation(v),
            other @ (CoreError::NegativeTotal { .. } | CoreError::AmountOverflow { .. }) => {
                EngineError::InvalidAmount(other.to_string())
            }
        }
    }
}

// =============================================================================
// Configuration Errors
// =============================================================================

/// Errors loading or validating [`EngineConfig`](crate::config::EngineConfig).
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse config file: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Invalid configuration: {0}")]
    Invalid(String),

    #[error("Failed to initialize logging: {0}")]
    Logging(String),
}

pub type ConfigResult<T> = Result<T, ConfigError>;

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sequence_collision_maps_to_conflict() {
        let err = EngineError::from(DbError::duplicate(
            "work_orders.order_number",
            "WO-20250314-0001",
        ));
        assert!(matches!(err, EngineError::SequenceConflict { ref field } if field == "order_number"));
        assert_eq!(err.kind(), ErrorKind::Conflict);
        assert!(err.is_retryable());
    }

    #[test]
    fn test_other_unique_violation_is_storage_and_final() {
        let err = EngineError::from(DbError::duplicate("shifts.user_id", "op-1"));
        assert_eq!(err.kind(), ErrorKind::Storage);
        assert!(!err.is_retryable());
    }

    #[test]
    fn test_busy_is_retryable() {
        let err = EngineError::from(DbError::Busy("database is locked".into()));
        assert_eq!(err.kind(), ErrorKind::Storage);
        assert!(err.is_retryable());
    }

    #[test]
    fn test_core_errors_keep_their_kind() {
        let err = EngineError::from(CoreError::ProductNotFound("p-1".into()));
        assert_eq!(err.kind(), ErrorKind::NotFound);

        let err = EngineError::from(CoreError::InvalidStatusTransition {
            from: WorkOrderStatus::Completed,
            to: WorkOrderStatus::Pending,
        });
        assert_eq!(err.kind(), ErrorKind::State);
        assert!(!err.is_retryable());

        let err = EngineError::from(CoreError::NegativeTotal {
            subtotal_cents: 100,
            discount_cents: 500,
            tax_cents: 0,
        });
        assert_eq!(err.kind(), ErrorKind::Validation);

        let err = EngineError::from(CoreError::Validation(ValidationError::must_be_positive(
            "quantity",
        )));
        assert!(matches!(err, EngineError::Validation(_)));
    }

    #[test]
    fn test_foreign_key_is_validation() {
        let err = EngineError::from(DbError::ForeignKeyViolation {
            message: "FOREIGN KEY constraint failed".into(),
        });
        assert_eq!(err.kind(), ErrorKind::Validation);

        let err = EngineError::from(DbError::Validation(ValidationError::must_not_be_negative("price")));
        assert!(matches!(err, EngineError::Validation(_)));
        assert_eq!(err.kind(), ErrorKind::Validation);
    }
}
