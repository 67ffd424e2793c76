//! # Shift Repository
//!
//! Storage for cashier shifts and their sales summaries.
//!
//! ## One Active Shift Per User
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  CREATE UNIQUE INDEX idx_shifts_one_active_per_user                     │
//! │      ON shifts (user_id) WHERE status = 'active';                       │
//! │                                                                         │
//! │  Terminal A: INSERT shift(user=op-1, active)  ✓                         │
//! │  Terminal B: INSERT shift(user=op-1, active)  ✗ UNIQUE constraint       │
//! │                                                shifts.user_id           │
//! │  After close: status='closed' leaves the index, op-1 may start again.  │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::{DateTime, Utc};
use sqlx::{SqliteConnection, SqlitePool};
use tracing::debug;

use torque_core::{Page, PageRequest, Shift, ShiftStatus, ShiftSummary};

use crate::error::DbResult;
use crate::repository::entity::{fetch_by_id, EntityStore, Entity};
use crate::repository::payment::PaymentRepository;
use crate::repository::work_order::WorkOrderRepository;

/// Repository for shift database operations.
#[derive(Debug, Clone)]
pub struct ShiftRepository {
    pool: SqlitePool,
    store: EntityStore<Shift>,
}

impl ShiftRepository {
    /// Creates a new ShiftRepository.
    pub fn new(pool: SqlitePool) -> Self {
        ShiftRepository {
            store: EntityStore::new(pool.clone()),
            pool,
        }
    }

    // =========================================================================
    // Pool-backed reads
    // =========================================================================

    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Shift>> {
        self.store.get(id).await
    }

    /// Lists shifts, most recently started first.
    pub async fn list(&self, request: PageRequest) -> DbResult<Page<Shift>> {
        self.store.list(request).await
    }

    /// The user's active shift, if any.
    pub async fn get_active_by_user(&self, user_id: &str) -> DbResult<Option<Shift>> {
        let mut conn = self.pool.acquire().await?;
        Self::find_active_by_user(&mut conn, user_id).await
    }

    // =========================================================================
    // Connection-level reads
    // =========================================================================

    pub async fn find(conn: &mut SqliteConnection, id: &str) -> DbResult<Option<Shift>> {
        fetch_by_id::<Shift>(conn, id).await
    }

    pub async fn find_active_by_user(
        conn: &mut SqliteConnection,
        user_id: &str,
    ) -> DbResult<Option<Shift>> {
        let sql = format!(
            "SELECT {} FROM {} WHERE user_id = ?1 AND status = ?2",
            Shift::COLUMNS,
            Shift::TABLE
        );
        let shift = sqlx::query_as::<_, Shift>(&sql)
            .bind(user_id)
            .bind(ShiftStatus::Active)
            .fetch_optional(&mut *conn)
            .await?;
        Ok(shift)
    }

    /// Completed-payment total and work order count for a shift.
    pub async fn compute_summary(
        conn: &mut SqliteConnection,
        shift_id: &str,
    ) -> DbResult<ShiftSummary> {
        let total_sales_cents = PaymentRepository::sum_completed_for_shift(&mut *conn, shift_id).await?;
        let total_orders = WorkOrderRepository::count_by_shift(&mut *conn, shift_id).await?;

        Ok(ShiftSummary {
            total_sales_cents,
            total_orders,
        })
    }

    // =========================================================================
    // Connection-level writes
    // =========================================================================

    /// Takes the database write lock and reports whether the shift exists.
    pub async fn lock(conn: &mut SqliteConnection, id: &str) -> DbResult<bool> {
        let result = sqlx::query("UPDATE shifts SET updated_at = updated_at WHERE id = ?1")
            .bind(id)
            .execute(&mut *conn)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Inserts a shift row.
    ///
    /// A second active shift for the same user fails with
    /// `DbError::UniqueViolation { field: "shifts.user_id", .. }`.
    pub async fn insert(conn: &mut SqliteConnection, shift: &Shift) -> DbResult<()> {
        debug!(id = %shift.id, user_id = %shift.user_id, "Inserting shift");

        sqlx::query(
            r#"
            INSERT INTO shifts (
                id, user_id, start_time, end_time,
                initial_cash_cents, final_cash_cents, total_sales_cents,
                status, received_from, created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)
            "#,
        )
        .bind(&shift.id)
        .bind(&shift.user_id)
        .bind(shift.start_time)
        .bind(shift.end_time)
        .bind(shift.initial_cash_cents)
        .bind(shift.final_cash_cents)
        .bind(shift.total_sales_cents)
        .bind(shift.status)
        .bind(&shift.received_from)
        .bind(shift.created_at)
        .bind(shift.updated_at)
        .execute(&mut *conn)
        .await?;

        Ok(())
    }

    /// Closes an active shift with its final figures.
    ///
    /// Returns `false` if the shift was not active, so a shift is closed
    /// at most once.
    pub async fn close(
        conn: &mut SqliteConnection,
        id: &str,
        final_cash_cents: i64,
        summary: &ShiftSummary,
        now: DateTime<Utc>,
    ) -> DbResult<bool> {
        debug!(
            id = %id,
            final_cash_cents,
            total_sales_cents = summary.total_sales_cents,
            total_orders = summary.total_orders,
            "Closing shift"
        );

        let result = sqlx::query(
            r#"
            UPDATE shifts SET
                end_time = ?2,
                final_cash_cents = ?3,
                total_sales_cents = ?4,
                status = ?5,
                updated_at = ?2
            WHERE id = ?1 AND status = ?6
            "#,
        )
        .bind(id)
        .bind(now)
        .bind(final_cash_cents)
        .bind(summary.total_sales_cents)
        .bind(ShiftStatus::Closed)
        .bind(ShiftStatus::Active)
        .execute(&mut *conn)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Cancels an active shift (opened by mistake). No totals are written.
    pub async fn cancel(conn: &mut SqliteConnection, id: &str, now: DateTime<Utc>) -> DbResult<bool> {
        debug!(id = %id, "Cancelling shift");

        let result = sqlx::query(
            "UPDATE shifts SET status = ?2, end_time = ?3, updated_at = ?3 WHERE id = ?1 AND status = ?4",
        )
        .bind(id)
        .bind(ShiftStatus::Canceled)
        .bind(now)
        .bind(ShiftStatus::Active)
        .execute(&mut *conn)
        .await?;

        Ok(result.rows_affected() > 0)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::DbError;
    use crate::pool::{Database, DbConfig};
    use uuid::Uuid;

    fn shift(user_id: &str, now: DateTime<Utc>) -> Shift {
        Shift {
            id: Uuid::new_v4().to_string(),
            user_id: user_id.to_string(),
            start_time: now,
            end_time: None,
            initial_cash_cents: 20_000,
            final_cash_cents: 0,
            total_sales_cents: 0,
            status: ShiftStatus::Active,
            received_from: Some("supervisor-2".to_string()),
            created_at: now,
            updated_at: now,
        }
    }

    #[tokio::test]
    async fn test_second_active_shift_is_rejected() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let now = Utc::now();
        let mut conn = db.pool().acquire().await.unwrap();

        ShiftRepository::insert(&mut conn, &shift("op-1", now)).await.unwrap();
        let err = ShiftRepository::insert(&mut conn, &shift("op-1", now))
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::UniqueViolation { .. }));
        assert!(err.is_unique_violation_on("user_id"));

        // A different operator is unaffected.
        ShiftRepository::insert(&mut conn, &shift("op-2", now)).await.unwrap();
    }

    #[tokio::test]
    async fn test_close_frees_user_for_new_shift() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let now = Utc::now();
        let mut conn = db.pool().acquire().await.unwrap();

        let first = shift("op-1", now);
        ShiftRepository::insert(&mut conn, &first).await.unwrap();

        let summary = ShiftRepository::compute_summary(&mut conn, &first.id).await.unwrap();
        assert_eq!(summary, ShiftSummary { total_sales_cents: 0, total_orders: 0 });

        assert!(ShiftRepository::close(&mut conn, &first.id, 20_000, &summary, now)
            .await
            .unwrap());
        assert!(!ShiftRepository::close(&mut conn, &first.id, 20_000, &summary, now)
            .await
            .unwrap());

        ShiftRepository::insert(&mut conn, &shift("op-1", now)).await.unwrap();
        let active = ShiftRepository::find_active_by_user(&mut conn, "op-1")
            .await
            .unwrap()
            .unwrap();
        assert_ne!(active.id, first.id);
    }

    #[tokio::test]
    async fn test_cancel_only_active() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let now = Utc::now();
        let mut conn = db.pool().acquire().await.unwrap();

        let s = shift("op-1", now);
        ShiftRepository::insert(&mut conn, &s).await.unwrap();
        assert!(ShiftRepository::cancel(&mut conn, &s.id, now).await.unwrap());
        assert!(!ShiftRepository::cancel(&mut conn, &s.id, now).await.unwrap());

        let loaded = ShiftRepository::find(&mut conn, &s.id).await.unwrap().unwrap();
        assert_eq!(loaded.status, ShiftStatus::Canceled);
        assert_eq!(loaded.received_from.as_deref(), Some("supervisor-2"));
    }
}
