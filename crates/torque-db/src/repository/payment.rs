//! # Payment Repository
//!
//! Storage for payments and the sums the ledger and shift reconciler
//! are built on.
//!
//! ## Which Payments Count
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  status      counts towards order paid?   counts towards shift sales?  │
//! │  ─────────   ──────────────────────────   ───────────────────────────  │
//! │  completed   yes                          yes                          │
//! │  pending     no                           no                           │
//! │  failed      no                           no                           │
//! │  refunded    no                           no                           │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//! Sums run in SQL over INTEGER cents, so they are exact.

use chrono::{DateTime, Utc};
use sqlx::{SqliteConnection, SqlitePool};
use tracing::debug;

use torque_core::{Page, PageRequest, Payment, PaymentStatus, PaymentWithOrder};

use crate::error::DbResult;
use crate::repository::entity::{fetch_by_id, fetch_where, EntityStore};

/// Mutable fields of a payment.
///
/// `None` leaves the stored value unchanged.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PaymentChanges {
    pub status: Option<PaymentStatus>,
    pub reference_number: Option<String>,
    pub raw_payload: Option<String>,
}

/// Repository for payment database operations.
#[derive(Debug, Clone)]
pub struct PaymentRepository {
    pool: SqlitePool,
    store: EntityStore<Payment>,
}

impl PaymentRepository {
    /// Creates a new PaymentRepository.
    pub fn new(pool: SqlitePool) -> Self {
        PaymentRepository {
            store: EntityStore::new(pool.clone()),
            pool,
        }
    }

    // =========================================================================
    // Pool-backed reads
    // =========================================================================

    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Payment>> {
        self.store.get(id).await
    }

    /// Lists payments, newest first.
    pub async fn list(&self, request: PageRequest) -> DbResult<Page<Payment>> {
        self.store.list(request).await
    }

    /// Payments against one order, newest first.
    pub async fn list_by_work_order(&self, work_order_id: &str) -> DbResult<Vec<Payment>> {
        self.store.list_where("work_order_id", work_order_id).await
    }

    /// Payments taken during a shift, each with its order's number,
    /// status and total. Newest first.
    pub async fn list_by_shift_with_order(&self, shift_id: &str) -> DbResult<Vec<PaymentWithOrder>> {
        let rows = sqlx::query_as::<_, PaymentWithOrder>(
            r#"
            SELECT
                p.id, p.payment_number, p.work_order_id, p.cashier_id, p.shift_id,
                p.method, p.status, p.amount_paid_cents, p.change_cents,
                p.reference_number, p.raw_payload, p.paid_at, p.created_at, p.updated_at,
                o.order_number AS order_number,
                o.status AS order_status,
                o.total_cents AS order_total_cents
            FROM payments p
            JOIN work_orders o ON o.id = p.work_order_id
            WHERE p.shift_id = ?1
            ORDER BY p.created_at DESC, p.payment_number DESC
            "#,
        )
        .bind(shift_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }

    /// Total of completed payments against an order.
    pub async fn total_completed_for_order(&self, work_order_id: &str) -> DbResult<i64> {
        let mut conn = self.pool.acquire().await?;
        Self::sum_completed_for_order(&mut conn, work_order_id).await
    }

    // =========================================================================
    // Connection-level reads
    // =========================================================================

    pub async fn find(conn: &mut SqliteConnection, id: &str) -> DbResult<Option<Payment>> {
        fetch_by_id::<Payment>(conn, id).await
    }

    pub async fn find_by_shift(conn: &mut SqliteConnection, shift_id: &str) -> DbResult<Vec<Payment>> {
        fetch_where::<Payment>(conn, "shift_id", shift_id).await
    }

    /// Σ amount_paid over completed payments for an order.
    pub async fn sum_completed_for_order(
        conn: &mut SqliteConnection,
        work_order_id: &str,
    ) -> DbResult<i64> {
        let total: i64 = sqlx::query_scalar(
            r#"
            SELECT COALESCE(SUM(amount_paid_cents), 0)
            FROM payments
            WHERE work_order_id = ?1 AND status = ?2
            "#,
        )
        .bind(work_order_id)
        .bind(PaymentStatus::Completed)
        .fetch_one(&mut *conn)
        .await?;

        Ok(total)
    }

    /// Σ amount_paid over completed payments attributed to a shift.
    pub async fn sum_completed_for_shift(
        conn: &mut SqliteConnection,
        shift_id: &str,
    ) -> DbResult<i64> {
        let total: i64 = sqlx::query_scalar(
            r#"
            SELECT COALESCE(SUM(amount_paid_cents), 0)
            FROM payments
            WHERE shift_id = ?1 AND status = ?2
            "#,
        )
        .bind(shift_id)
        .bind(PaymentStatus::Completed)
        .fetch_one(&mut *conn)
        .await?;

        Ok(total)
    }

    // =========================================================================
    // Connection-level writes
    // =========================================================================

    /// Takes the database write lock and reports whether the payment exists.
    pub async fn lock(conn: &mut SqliteConnection, id: &str) -> DbResult<bool> {
        let result = sqlx::query("UPDATE payments SET updated_at = updated_at WHERE id = ?1")
            .bind(id)
            .execute(&mut *conn)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    pub async fn insert(conn: &mut SqliteConnection, payment: &Payment) -> DbResult<()> {
        debug!(
            id = %payment.id,
            payment_number = %payment.payment_number,
            work_order_id = %payment.work_order_id,
            amount_paid_cents = payment.amount_paid_cents,
            "Inserting payment"
        );

        sqlx::query(
            r#"
            INSERT INTO payments (
                id, payment_number, work_order_id, cashier_id, shift_id,
                method, status, amount_paid_cents, change_cents,
                reference_number, raw_payload, paid_at, created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14)
            "#,
        )
        .bind(&payment.id)
        .bind(&payment.payment_number)
        .bind(&payment.work_order_id)
        .bind(&payment.cashier_id)
        .bind(&payment.shift_id)
        .bind(payment.method)
        .bind(payment.status)
        .bind(payment.amount_paid_cents)
        .bind(payment.change_cents)
        .bind(&payment.reference_number)
        .bind(&payment.raw_payload)
        .bind(payment.paid_at)
        .bind(payment.created_at)
        .bind(payment.updated_at)
        .execute(&mut *conn)
        .await?;

        Ok(())
    }

    /// Applies `changes`. Amount, method and order are never touched.
    pub async fn update(
        conn: &mut SqliteConnection,
        id: &str,
        changes: &PaymentChanges,
        now: DateTime<Utc>,
    ) -> DbResult<bool> {
        debug!(id = %id, status = ?changes.status, "Updating payment");

        let result = sqlx::query(
            r#"
            UPDATE payments SET
                status = COALESCE(?2, status),
                reference_number = COALESCE(?3, reference_number),
                raw_payload = COALESCE(?4, raw_payload),
                updated_at = ?5
            WHERE id = ?1
            "#,
        )
        .bind(id)
        .bind(changes.status)
        .bind(&changes.reference_number)
        .bind(&changes.raw_payload)
        .bind(now)
        .execute(&mut *conn)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    pub async fn delete(conn: &mut SqliteConnection, id: &str) -> DbResult<bool> {
        debug!(id = %id, "Deleting payment");

        let result = sqlx::query("DELETE FROM payments WHERE id = ?1")
            .bind(id)
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
    use crate::pool::{Database, DbConfig};
    use crate::repository::work_order::WorkOrderRepository;
    use torque_core::{PaymentMethod, WorkOrder, WorkOrderSource, WorkOrderStatus, WorkOrderType};
    use uuid::Uuid;

    async fn seed_order(conn: &mut SqliteConnection, now: DateTime<Utc>) -> WorkOrder {
        let wo = WorkOrder {
            id: Uuid::new_v4().to_string(),
            order_number: "WO-20250314-0001".to_string(),
            source: WorkOrderSource::Cashier,
            order_type: WorkOrderType::Service,
            customer_id: None,
            vehicle_id: None,
            cashier_id: None,
            shift_id: None,
            queue_number: Some(1),
            status: WorkOrderStatus::Pending,
            notes: None,
            special_instructions: None,
            confirmed_at: None,
            started_at: None,
            completed_at: None,
            subtotal_cents: 11_000,
            discount_cents: 0,
            tax_cents: 0,
            total_cents: 11_000,
            created_at: now,
            updated_at: now,
            deleted_at: None,
        };
        WorkOrderRepository::insert(conn, &wo).await.unwrap();
        wo
    }

    fn payment(order_id: &str, number: &str, status: PaymentStatus, cents: i64, now: DateTime<Utc>) -> Payment {
        Payment {
            id: Uuid::new_v4().to_string(),
            payment_number: number.to_string(),
            work_order_id: order_id.to_string(),
            cashier_id: None,
            shift_id: None,
            method: PaymentMethod::Transfer,
            status,
            amount_paid_cents: cents,
            change_cents: 0,
            reference_number: None,
            raw_payload: None,
            paid_at: now,
            created_at: now,
            updated_at: now,
        }
    }

    #[tokio::test]
    async fn test_sum_counts_only_completed() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let now = Utc::now();
        let mut conn = db.pool().acquire().await.unwrap();
        let wo = seed_order(&mut conn, now).await;

        for (n, status, cents) in [
            ("PAY-20250314-0001", PaymentStatus::Completed, 5_000),
            ("PAY-20250314-0002", PaymentStatus::Failed, 9_000),
            ("PAY-20250314-0003", PaymentStatus::Refunded, 1_000),
            ("PAY-20250314-0004", PaymentStatus::Completed, 2_500),
        ] {
            PaymentRepository::insert(&mut conn, &payment(&wo.id, n, status, cents, now))
                .await
                .unwrap();
        }

        let total = PaymentRepository::sum_completed_for_order(&mut conn, &wo.id)
            .await
            .unwrap();
        assert_eq!(total, 7_500);

        assert_eq!(
            PaymentRepository::sum_completed_for_order(&mut conn, "no-such-order")
                .await
                .unwrap(),
            0
        );
    }

    #[tokio::test]
    async fn test_update_changes_only_mutable_fields() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let now = Utc::now();
        let mut conn = db.pool().acquire().await.unwrap();
        let wo = seed_order(&mut conn, now).await;
        let p = payment(&wo.id, "PAY-20250314-0001", PaymentStatus::Pending, 11_000, now);
        PaymentRepository::insert(&mut conn, &p).await.unwrap();

        let changes = PaymentChanges {
            status: Some(PaymentStatus::Completed),
            reference_number: Some("TRX-991".to_string()),
            raw_payload: None,
        };
        let later = now + chrono::Duration::minutes(1);
        assert!(PaymentRepository::update(&mut conn, &p.id, &changes, later)
            .await
            .unwrap());

        let loaded = PaymentRepository::find(&mut conn, &p.id).await.unwrap().unwrap();
        assert_eq!(loaded.status, PaymentStatus::Completed);
        assert_eq!(loaded.reference_number.as_deref(), Some("TRX-991"));
        assert_eq!(loaded.amount_paid_cents, 11_000);
        assert_eq!(loaded.updated_at, later);
    }

    #[tokio::test]
    async fn test_list_by_shift_joins_order() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let now = Utc::now();
        let mut conn = db.pool().acquire().await.unwrap();

        sqlx::query(
            "INSERT INTO shifts (id, user_id, start_time, status, created_at, updated_at) \
             VALUES ('shift-1', 'op-1', ?1, 'active', ?1, ?1)",
        )
        .bind(now)
        .execute(&mut *conn)
        .await
        .unwrap();

        let wo = seed_order(&mut conn, now).await;
        let mut p = payment(&wo.id, "PAY-20250314-0001", PaymentStatus::Completed, 11_000, now);
        p.shift_id = Some("shift-1".to_string());
        PaymentRepository::insert(&mut conn, &p).await.unwrap();
        drop(conn);

        let rows = db.payments().list_by_shift_with_order("shift-1").await.unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].payment.payment_number, "PAY-20250314-0001");
        assert_eq!(rows[0].order_number, "WO-20250314-0001");
        assert_eq!(rows[0].order_total_cents, 11_000);
    }
}
