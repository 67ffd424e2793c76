//! # Sequence Repository
//!
//! Allocates daily order numbers, payment numbers and queue numbers.
//!
//! ## Allocation
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  BEGIN (deferred)                                                       │
//! │     │                                                                   │
//! │     ▼                                                                   │
//! │  INSERT INTO sequence_counters (scope, day, value)                      │
//! │  VALUES (?, ?, <highest stored ordinal for the day> + 1)                │
//! │  ON CONFLICT (scope, day)                                               │
//! │      DO UPDATE SET value = MAX(value + 1, excluded.value)               │
//! │  RETURNING value                                                        │
//! │     │                                                                   │
//! │     │  first write of the transaction: takes SQLite's write lock,      │
//! │     │  so nobody else can allocate until COMMIT / ROLLBACK             │
//! │     ▼                                                                   │
//! │  insert order / payment with the number                                 │
//! │     │                                                                   │
//! │     ▼                                                                   │
//! │  COMMIT  (rollback also rolls the counter back; no gaps)                │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The seed subquery keeps the counter ahead of rows that were written
//! without it (imports, restores). The unique indexes on the number
//! columns catch anything that still slips through.

use chrono::NaiveDate;
use sqlx::SqliteConnection;
use tracing::debug;

use torque_core::sequence::{day_key, day_stem, format_number};
use torque_core::SequenceScope;

use crate::error::{DbError, DbResult};

const NEXT_ORDER_SQL: &str = r#"
    INSERT INTO sequence_counters (scope, day, value)
    VALUES (?1, ?2, (
        SELECT COALESCE(MAX(CAST(substr(order_number, ?4) AS INTEGER)), 0) + 1
        FROM work_orders
        WHERE order_number LIKE ?3
    ))
    ON CONFLICT (scope, day) DO UPDATE SET value = MAX(value + 1, excluded.value)
    RETURNING value
"#;

const NEXT_PAYMENT_SQL: &str = r#"
    INSERT INTO sequence_counters (scope, day, value)
    VALUES (?1, ?2, (
        SELECT COALESCE(MAX(CAST(substr(payment_number, ?4) AS INTEGER)), 0) + 1
        FROM payments
        WHERE payment_number LIKE ?3
    ))
    ON CONFLICT (scope, day) DO UPDATE SET value = MAX(value + 1, excluded.value)
    RETURNING value
"#;

// Queue numbers belong to the orders created that day.
const NEXT_QUEUE_SQL: &str = r#"
    INSERT INTO sequence_counters (scope, day, value)
    VALUES (?1, ?2, (
        SELECT COALESCE(MAX(queue_number), 0) + 1
        FROM work_orders
        WHERE order_number LIKE ?3
    ))
    ON CONFLICT (scope, day) DO UPDATE SET value = MAX(value + 1, excluded.value)
    RETURNING value
"#;

/// Repository for daily sequence counters.
///
/// Stateless: every function runs on the caller's connection so that
/// allocation commits or rolls back together with the row that uses it.
#[derive(Debug, Clone, Copy, Default)]
pub struct SequenceRepository;

impl SequenceRepository {
    /// Allocates the next ordinal for `scope` on `date`.
    pub async fn next_value(
        conn: &mut SqliteConnection,
        scope: SequenceScope,
        date: NaiveDate,
    ) -> DbResult<i64> {
        let day = day_key(date);

        // Every scope filters on that day's number stem; queue numbers
        // use the order stem.
        let stem_scope = match scope {
            SequenceScope::Payment => SequenceScope::Payment,
            SequenceScope::Order | SequenceScope::Queue => SequenceScope::Order,
        };
        let stem = day_stem(stem_scope, date).ok_or_else(|| {
            DbError::Internal(format!("sequence scope {} has no stem", stem_scope.as_str()))
        })?;
        let pattern = format!("{}-%", stem);
        // substr() is 1-based and skips the trailing '-'.
        let ordinal_start = stem.len() as i64 + 2;

        let sql = match scope {
            SequenceScope::Order => NEXT_ORDER_SQL,
            SequenceScope::Payment => NEXT_PAYMENT_SQL,
            SequenceScope::Queue => NEXT_QUEUE_SQL,
        };

        let mut query = sqlx::query_scalar::<_, i64>(sql)
            .bind(scope.as_str())
            .bind(&day)
            .bind(&pattern);
        if scope != SequenceScope::Queue {
            query = query.bind(ordinal_start);
        }

        let value = query.fetch_one(&mut *conn).await?;

        debug!(scope = scope.as_str(), day = %day, value, "Allocated sequence value");
        Ok(value)
    }

    /// Allocates and formats the next `WO-…` or `PAY-…` number.
    pub async fn next_number(
        conn: &mut SqliteConnection,
        scope: SequenceScope,
        date: NaiveDate,
    ) -> DbResult<String> {
        let ordinal = Self::next_value(&mut *conn, scope, date).await?;
        format_number(scope, date, ordinal).ok_or_else(|| {
            DbError::Internal(format!("sequence scope {} is not formatted", scope.as_str()))
        })
    }

    /// Allocates the next daily queue number.
    pub async fn next_queue_number(conn: &mut SqliteConnection, date: NaiveDate) -> DbResult<i64> {
        Self::next_value(conn, SequenceScope::Queue, date).await
    }

    /// Reads the current counter without allocating.
    pub async fn current_value(
        conn: &mut SqliteConnection,
        scope: SequenceScope,
        date: NaiveDate,
    ) -> DbResult<Option<i64>> {
        let value = sqlx::query_scalar::<_, i64>(
            "SELECT value FROM sequence_counters WHERE scope = ?1 AND day = ?2",
        )
        .bind(scope.as_str())
        .bind(day_key(date))
        .fetch_optional(&mut *conn)
        .await?;
        Ok(value)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
