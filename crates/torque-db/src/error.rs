//! # Database Error Types
//!
//! Error types for database operations.
//!
//! ## Error Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Error Propagation                                    │
//! │                                                                         │
//! │  SQLite Error (sqlx::Error)                                            │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  DbError (this module) ← Adds context and categorization               │
//! │       │                                                                 │
//! │       ├── Busy / PoolExhausted → transient, engine retries             │
//! │       ├── UniqueViolation on a sequence number → engine retries        │
//! │       └── everything else → surfaced as a storage error                │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  EngineError (torque-engine) ← Classified by kind for callers          │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use thiserror::Error;

use torque_core::ValidationError;

/// SQLite result codes that mean "another connection holds the lock".
///
/// 5 = SQLITE_BUSY, 6 = SQLITE_LOCKED, 261 = BUSY_RECOVERY,
/// 262 = LOCKED_SHAREDCACHE, 517 = BUSY_SNAPSHOT.
const BUSY_CODES: [&str; 5] = ["5", "6", "261", "262", "517"];

/// Database operation errors.
#[derive(Debug, Error)]
pub enum DbError {
    /// Entity not found in database.
    #[error("{entity} not found: {id}")]
    NotFound { entity: String, id: String },

    /// Unique constraint violation.
    ///
    /// ## When This Occurs
    /// - Two writers allocated the same order or payment number
    /// - A second active shift for the same user
    ///
    /// `field` is the `table.column` list SQLite reports.
    #[error("Duplicate {field}: '{value}' already exists")]
    UniqueViolation { field: String, value: String },

    /// Foreign key constraint violation.
    ///
    /// ## When This Occurs
    /// - Work order or payment referencing a shift that does not exist
    /// - Item referencing a product id that does not exist
    #[error("Foreign key violation: {message}")]
    ForeignKeyViolation { message: String },

    /// Another connection holds the write lock past the busy timeout.
    #[error("Database busy: {0}")]
    Busy(String),

    /// Database connection failed.
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    /// Migration failed.
    #[error("Migration failed: {0}")]
    MigrationFailed(String),

    /// Query execution failed.
    #[error("Query failed: {0}")]
    QueryFailed(String),

    /// Transaction failed.
    #[error("Transaction failed: {0}")]
    TransactionFailed(String),

    /// A value was rejected before it reached SQLite.
    #[error("Validation failed: {0}")]
    Validation(#[from] ValidationError),

    /// Pool exhausted (all connections in use).
    #[error("Connection pool exhausted")]
    PoolExhausted,

    /// Internal database error.
    #[error("Internal database error: {0}")]
    Internal(String),
}

impl DbError {
    /// Creates a NotFound error for a given entity type and ID.
    pub fn not_found(entity: impl Into<String>, id: impl Into<String>) -> Self {
        DbError::NotFound {
            entity: entity.into(),
            id: id.into(),
        }
    }

    /// Creates a UniqueViolation error.
    pub fn duplicate(field: impl Into<String>, value: impl Into<String>) -> Self {
        DbError::UniqueViolation {
            field: field.into(),
            value: value.into(),
        }
    }

    /// Whether retrying the whole transaction may succeed.
    pub fn is_transient(&self) -> bool {
        matches!(self, DbError::Busy(_) | DbError::PoolExhausted)
    }

    /// Whether this is a uniqueness failure on `column` (e.g. `"order_number"`).
    pub fn is_unique_violation_on(&self, column: &str) -> bool {
        match self {
            DbError::UniqueViolation { field, .. } => field
                .split(',')
                .map(str::trim)
                .any(|f| f == column || f.ends_with(&format!(".{}", column))),
            _ => false,
        }
    }
}

/// Convert sqlx errors to DbError.
///
/// ## Error Mapping
/// ```text
/// sqlx::Error::RowNotFound    → DbError::NotFound
/// sqlx::Error::Database       → Busy / UniqueViolation / ForeignKeyViolation / QueryFailed
/// sqlx::Error::PoolTimedOut   → DbError::PoolExhausted
/// Other                       → DbError::Internal
/// ```
impl From<sqlx::Error> for DbError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::RowNotFound => DbError::NotFound {
                entity: "Record".to_string(),
                id: "unknown".to_string(),
            },

            sqlx::Error::Database(db_err) => {
                let msg = db_err.message();
                let busy_code = db_err
                    .code()
                    .map(|code| BUSY_CODES.iter().any(|busy| code == *busy))
                    .unwrap_or(false);

                // SQLite messages:
                // "UNIQUE constraint failed: <table>.<column>"
                // "FOREIGN KEY constraint failed"
                // "database is locked" / "database table is locked"
                if busy_code || msg.contains("is locked") {
                    DbError::Busy(msg.to_string())
                } else if msg.contains("UNIQUE constraint failed") {
                    let field = msg
                        .split("UNIQUE constraint failed: ")
                        .nth(1)
                        .unwrap_or("unknown")
                        .to_string();
                    DbError::UniqueViolation {
                        field,
                        value: "unknown".to_string(),
                    }
                } else if msg.contains("FOREIGN KEY constraint failed") {
                    DbError::ForeignKeyViolation {
                        message: msg.to_string(),
                    }
                } else {
                    DbError::QueryFailed(msg.to_string())
                }
            }

            sqlx::Error::PoolTimedOut => DbError::PoolExhausted,

            sqlx::Error::PoolClosed => DbError::ConnectionFailed("Pool is closed".to_string()),

            _ => DbError::Internal(err.to_string()),
        }
    }
}

impl From<sqlx::migrate::MigrateError> for DbError {
    fn from(err: sqlx::migrate::MigrateError) -> Self {
        DbError::MigrationFailed(err.to_string())
    }
}

/// Result type for database operations.
pub type DbResult<T> = Result<T, DbError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unique_violation_column_match() {
        let err = DbError::duplicate("work_orders.order_number", "WO-20250101-0001");
        assert!(err.is_unique_violation_on("order_number"));
        assert!(!err.is_unique_violation_on("payment_number"));

        let err = DbError::duplicate("shifts.user_id", "cashier-1");
        assert!(err.is_unique_violation_on("user_id"));
    }

    #[test]
    fn test_transient_classification() {
        assert!(DbError::Busy("database is locked".to_string()).is_transient());
        assert!(DbError::PoolExhausted.is_transient());
        assert!(!DbError::not_found("Shift", "x").is_transient());
        assert!(!DbError::duplicate("shifts.user_id", "u").is_transient());
    }
}
