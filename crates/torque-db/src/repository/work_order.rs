//! # Work Order Repository
//!
//! Storage for the work order aggregate (order row + item rows).
//!
//! ## Write Functions Take a Connection
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  let mut tx = db.begin().await?;                                        │
//! │  let number = SequenceRepository::next_number(&mut tx, Order, day)?;    │
//! │  WorkOrderRepository::insert(&mut tx, &order)?;                         │
//! │  for item in &items {                                                   │
//! │      WorkOrderRepository::insert_item(&mut tx, item)?;                  │
//! │  }                                                                      │
//! │  tx.commit().await?;            ← all rows or none                     │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//! Reads that the engine does outside a transaction go through the
//! pool-backed methods on [`WorkOrderRepository`].

use chrono::{DateTime, Utc};
use sqlx::{SqliteConnection, SqlitePool};
use tracing::debug;

use torque_core::{
    Page, PageRequest, WorkOrder, WorkOrderDetails, WorkOrderItem, WorkOrderStatus,
};

use crate::error::DbResult;
use crate::repository::entity::{count_where, fetch_by_id, fetch_where, EntityStore};

/// Repository for work order database operations.
#[derive(Debug, Clone)]
pub struct WorkOrderRepository {
    pool: SqlitePool,
    store: EntityStore<WorkOrder>,
}

impl WorkOrderRepository {
    /// Creates a new WorkOrderRepository.
    pub fn new(pool: SqlitePool) -> Self {
        WorkOrderRepository {
            store: EntityStore::new(pool.clone()),
            pool,
        }
    }

    // =========================================================================
    // Pool-backed reads
    // =========================================================================

    /// Gets a live (not soft-deleted) work order by ID.
    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<WorkOrder>> {
        self.store.get(id).await
    }

    /// Gets a work order with its items.
    pub async fn get_details(&self, id: &str) -> DbResult<Option<WorkOrderDetails>> {
        let mut conn = self.pool.acquire().await?;
        Self::find_details(&mut conn, id).await
    }

    /// Lists live work orders, newest first.
    pub async fn list(&self, request: PageRequest) -> DbResult<Page<WorkOrder>> {
        self.store.list(request).await
    }

    /// Lists live work orders in `status`, newest first.
    pub async fn list_by_status(
        &self,
        status: WorkOrderStatus,
        request: PageRequest,
    ) -> DbResult<Page<WorkOrder>> {
        self.store
            .list_page_where(request, "status", status.as_str())
            .await
    }

    /// Lists live work orders attributed to a shift, each with items.
    pub async fn list_by_shift(&self, shift_id: &str) -> DbResult<Vec<WorkOrderDetails>> {
        let mut conn = self.pool.acquire().await?;
        let orders = Self::find_by_shift(&mut conn, shift_id).await?;

        let mut details = Vec::with_capacity(orders.len());
        for order in orders {
            let items = Self::find_items(&mut conn, &order.id).await?;
            details.push(WorkOrderDetails { order, items });
        }
        Ok(details)
    }

    // =========================================================================
    // Connection-level reads
    // =========================================================================

    /// Finds a live work order on the caller's connection.
    pub async fn find(conn: &mut SqliteConnection, id: &str) -> DbResult<Option<WorkOrder>> {
        fetch_by_id::<WorkOrder>(conn, id).await
    }

    /// Finds a live work order and its items on the caller's connection.
    pub async fn find_details(
        conn: &mut SqliteConnection,
        id: &str,
    ) -> DbResult<Option<WorkOrderDetails>> {
        let Some(order) = Self::find(&mut *conn, id).await? else {
            return Ok(None);
        };
        let items = Self::find_items(&mut *conn, id).await?;
        Ok(Some(WorkOrderDetails { order, items }))
    }

    /// Items of one order, in submission order.
    pub async fn find_items(
        conn: &mut SqliteConnection,
        work_order_id: &str,
    ) -> DbResult<Vec<WorkOrderItem>> {
        fetch_where::<WorkOrderItem>(conn, "work_order_id", work_order_id).await
    }

    pub async fn find_by_shift(
        conn: &mut SqliteConnection,
        shift_id: &str,
    ) -> DbResult<Vec<WorkOrder>> {
        fetch_where::<WorkOrder>(conn, "shift_id", shift_id).await
    }

    /// Counts live work orders attributed to a shift.
    pub async fn count_by_shift(conn: &mut SqliteConnection, shift_id: &str) -> DbResult<i64> {
        count_where::<WorkOrder>(conn, Some(("shift_id", shift_id))).await
    }

    // =========================================================================
    // Connection-level writes
    // =========================================================================

    /// Takes the database write lock and reports whether the order exists.
    ///
    /// Used as the first statement of an update transaction so the
    /// following read-check-write cannot interleave with another writer.
    pub async fn lock(conn: &mut SqliteConnection, id: &str) -> DbResult<bool> {
        let result = sqlx::query("UPDATE work_orders SET updated_at = updated_at WHERE id = ?1 AND deleted_at IS NULL")
            .bind(id)
            .execute(&mut *conn)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Inserts the order row.
    pub async fn insert(conn: &mut SqliteConnection, order: &WorkOrder) -> DbResult<()> {
        debug!(id = %order.id, order_number = %order.order_number, "Inserting work order");

        sqlx::query(
            r#"
            INSERT INTO work_orders (
                id, order_number, source, order_type,
                customer_id, vehicle_id, cashier_id, shift_id,
                queue_number, status, notes, special_instructions,
                confirmed_at, started_at, completed_at,
                subtotal_cents, discount_cents, tax_cents, total_cents,
                created_at, updated_at, deleted_at
            ) VALUES (
                ?1, ?2, ?3, ?4,
                ?5, ?6, ?7, ?8,
                ?9, ?10, ?11, ?12,
                ?13, ?14, ?15,
                ?16, ?17, ?18, ?19,
                ?20, ?21, ?22
            )
            "#,
        )
        .bind(&order.id)
        .bind(&order.order_number)
        .bind(order.source)
        .bind(order.order_type)
        .bind(&order.customer_id)
        .bind(&order.vehicle_id)
        .bind(&order.cashier_id)
        .bind(&order.shift_id)
        .bind(order.queue_number)
        .bind(order.status)
        .bind(&order.notes)
        .bind(&order.special_instructions)
        .bind(order.confirmed_at)
        .bind(order.started_at)
        .bind(order.completed_at)
        .bind(order.subtotal_cents)
        .bind(order.discount_cents)
        .bind(order.tax_cents)
        .bind(order.total_cents)
        .bind(order.created_at)
        .bind(order.updated_at)
        .bind(order.deleted_at)
        .execute(&mut *conn)
        .await?;

        Ok(())
    }

    /// Inserts one item row.
    ///
    /// ## Snapshot Pattern
    /// Product name and price are copied onto the item; the catalog row
    /// is never joined again for this item.
    pub async fn insert_item(conn: &mut SqliteConnection, item: &WorkOrderItem) -> DbResult<()> {
        debug!(work_order_id = %item.work_order_id, product_id = %item.product_id, "Inserting work order item");

        sqlx::query(
            r#"
            INSERT INTO work_order_items (
                id, work_order_id, product_id, product_name_snapshot,
                price_snapshot_cents, quantity, subtotal_cents,
                assigned_staff_id, note, created_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)
            "#,
        )
        .bind(&item.id)
        .bind(&item.work_order_id)
        .bind(&item.product_id)
        .bind(&item.product_name_snapshot)
        .bind(item.price_snapshot_cents)
        .bind(item.quantity)
        .bind(item.subtotal_cents)
        .bind(&item.assigned_staff_id)
        .bind(&item.note)
        .bind(item.created_at)
        .execute(&mut *conn)
        .await?;

        Ok(())
    }

    /// Writes every mutable field of the order row.
    ///
    /// Identity, number, source, type, queue number and subtotal never
    /// change after creation and are not written.
    pub async fn update(conn: &mut SqliteConnection, order: &WorkOrder) -> DbResult<bool> {
        debug!(id = %order.id, status = %order.status, total_cents = order.total_cents, "Updating work order");

        let result = sqlx::query(
            r#"
            UPDATE work_orders SET
                cashier_id = ?2,
                shift_id = ?3,
                status = ?4,
                notes = ?5,
                special_instructions = ?6,
                confirmed_at = ?7,
                started_at = ?8,
                completed_at = ?9,
                discount_cents = ?10,
                tax_cents = ?11,
                total_cents = ?12,
                updated_at = ?13
            WHERE id = ?1 AND deleted_at IS NULL
            "#,
        )
        .bind(&order.id)
        .bind(&order.cashier_id)
        .bind(&order.shift_id)
        .bind(order.status)
        .bind(&order.notes)
        .bind(&order.special_instructions)
        .bind(order.confirmed_at)
        .bind(order.started_at)
        .bind(order.completed_at)
        .bind(order.discount_cents)
        .bind(order.tax_cents)
        .bind(order.total_cents)
        .bind(order.updated_at)
        .execute(&mut *conn)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Marks an open order completed.
    ///
    /// Returns `false` if the order was already completed or cancelled,
    /// which makes repeated "fully paid" triggers harmless.
    pub async fn complete_if_open(
        conn: &mut SqliteConnection,
        id: &str,
        now: DateTime<Utc>,
    ) -> DbResult<bool> {
        let result = sqlx::query(
            r#"
            UPDATE work_orders
            SET status = ?2, completed_at = ?3, updated_at = ?3
            WHERE id = ?1
              AND deleted_at IS NULL
              AND status NOT IN (?4, ?5)
            "#,
        )
        .bind(id)
        .bind(WorkOrderStatus::Completed)
        .bind(now)
        .bind(WorkOrderStatus::Completed)
        .bind(WorkOrderStatus::Cancelled)
        .execute(&mut *conn)
        .await?;

        let transitioned = result.rows_affected() > 0;
        if transitioned {
            debug!(id = %id, "Work order auto-completed");
        }
        Ok(transitioned)
    }

    /// Soft-deletes an order. Returns `false` if it was already gone.
    pub async fn soft_delete(
        conn: &mut SqliteConnection,
        id: &str,
        now: DateTime<Utc>,
    ) -> DbResult<bool> {
        debug!(id = %id, "Soft-deleting work order");

        let result = sqlx::query(
            "UPDATE work_orders SET deleted_at = ?2, updated_at = ?2 WHERE id = ?1 AND deleted_at IS NULL",
        )
        .bind(id)
        .bind(now)
        .execute(&mut *conn)
        .await?;

        Ok(result.rows_affected() > 0)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
