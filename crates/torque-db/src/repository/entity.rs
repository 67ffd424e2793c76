//! # Generic Entity Access
//!
//! Get-by-id, paginated list, filtered list and count, written once and
//! shared by every aggregate.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  impl Entity for WorkOrder { TABLE, COLUMNS, ORDER_BY, LIVE_FILTER }    │
//! │                     │                                                   │
//! │                     ▼                                                   │
//! │  EntityStore<WorkOrder>                                                 │
//! │  ├── get(id)              SELECT .. WHERE id = ? AND <live>             │
//! │  ├── list(page)           SELECT .. ORDER BY .. LIMIT .. OFFSET ..      │
//! │  ├── list_where(col, v)   SELECT .. WHERE col = ? ORDER BY ..           │
//! │  └── count()              SELECT COUNT(*) ..                            │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Table and column names come from `&'static str` constants, never from
//! callers; values are always bound.

use std::marker::PhantomData;

use sqlx::sqlite::SqliteRow;
use sqlx::{FromRow, SqliteConnection, SqlitePool};
use torque_core::{Page, PageRequest, Payment, Product, Shift, WorkOrder, WorkOrderItem};

use crate::error::DbResult;

/// A table-backed aggregate.
pub trait Entity: for<'r> FromRow<'r, SqliteRow> + Send + Unpin + 'static {
    /// Human name used in errors and logs.
    const NAME: &'static str;
    const TABLE: &'static str;
    /// Comma-separated select list matching the struct's fields.
    const COLUMNS: &'static str;
    /// Default ordering for lists.
    const ORDER_BY: &'static str;
    /// Predicate that hides soft-deleted rows, if the table has any.
    const LIVE_FILTER: Option<&'static str> = None;
}

impl Entity for Product {
    const NAME: &'static str = "Product";
    const TABLE: &'static str = "products";
    const COLUMNS: &'static str =
        "id, name, description, price_cents, kind, is_active, created_at, updated_at";
    const ORDER_BY: &'static str = "name ASC, id ASC";
}

impl Entity for WorkOrder {
    const NAME: &'static str = "WorkOrder";
    const TABLE: &'static str = "work_orders";
    const COLUMNS: &'static str = "id, order_number, source, order_type, customer_id, vehicle_id, \
        cashier_id, shift_id, queue_number, status, notes, special_instructions, confirmed_at, \
        started_at, completed_at, subtotal_cents, discount_cents, tax_cents, total_cents, \
        created_at, updated_at, deleted_at";
    const ORDER_BY: &'static str = "created_at DESC, order_number DESC";
    const LIVE_FILTER: Option<&'static str> = Some("deleted_at IS NULL");
}

impl Entity for WorkOrderItem {
    const NAME: &'static str = "WorkOrderItem";
    const TABLE: &'static str = "work_order_items";
    const COLUMNS: &'static str = "id, work_order_id, product_id, product_name_snapshot, \
        price_snapshot_cents, quantity, subtotal_cents, assigned_staff_id, note, created_at";
    // Items keep the order they were submitted in.
    const ORDER_BY: &'static str = "rowid ASC";
}

impl Entity for Payment {
    const NAME: &'static str = "Payment";
    const TABLE: &'static str = "payments";
    const COLUMNS: &'static str = "id, payment_number, work_order_id, cashier_id, shift_id, \
        method, status, amount_paid_cents, change_cents, reference_number, raw_payload, \
        paid_at, created_at, updated_at";
    const ORDER_BY: &'static str = "created_at DESC, payment_number DESC";
}

impl Entity for Shift {
    const NAME: &'static str = "Shift";
    const TABLE: &'static str = "shifts";
    const COLUMNS: &'static str = "id, user_id, start_time, end_time, initial_cash_cents, \
        final_cash_cents, total_sales_cents, status, received_from, created_at, updated_at";
    const ORDER_BY: &'static str = "start_time DESC, id DESC";
}

// =============================================================================
// SQL builders
// =============================================================================

fn where_clause<T: Entity>(column: Option<&str>) -> String {
    let mut predicates: Vec<String> = Vec::new();
    if let Some(column) = column {
        predicates.push(format!("{} = ?1", column));
    }
    if let Some(live) = T::LIVE_FILTER {
        predicates.push(live.to_string());
    }

    if predicates.is_empty() {
        String::new()
    } else {
        format!(" WHERE {}", predicates.join(" AND "))
    }
}

fn select_sql<T: Entity>(column: Option<&str>) -> String {
    format!(
        "SELECT {} FROM {}{} ORDER BY {}",
        T::COLUMNS,
        T::TABLE,
        where_clause::<T>(column),
        T::ORDER_BY
    )
}

// =============================================================================
// Connection-level functions (usable inside a transaction)
// =============================================================================

/// Fetches one live row by primary key.
pub async fn fetch_by_id<T: Entity>(conn: &mut SqliteConnection, id: &str) -> DbResult<Option<T>> {
    let sql = select_sql::<T>(Some("id"));
    let row = sqlx::query_as::<_, T>(&sql)
        .bind(id)
        .fetch_optional(&mut *conn)
        .await?;
    Ok(row)
}

/// Fetches all live rows where `column = value`, in default order.
pub async fn fetch_where<T: Entity>(
    conn: &mut SqliteConnection,
    column: &'static str,
    value: &str,
) -> DbResult<Vec<T>> {
    let sql = select_sql::<T>(Some(column));
    let rows = sqlx::query_as::<_, T>(&sql)
        .bind(value)
        .fetch_all(&mut *conn)
        .await?;
    Ok(rows)
}

/// Counts live rows, optionally filtered by `column = value`.
pub async fn count_where<T: Entity>(
    conn: &mut SqliteConnection,
    filter: Option<(&'static str, &str)>,
) -> DbResult<i64> {
    let sql = format!(
        "SELECT COUNT(*) FROM {}{}",
        T::TABLE,
        where_clause::<T>(filter.map(|(column, _)| column))
    );
    let mut query = sqlx::query_scalar::<_, i64>(&sql);
    if let Some((_, value)) = filter {
        query = query.bind(value);
    }
    Ok(query.fetch_one(&mut *conn).await?)
}

/// Fetches one page of live rows, optionally filtered by `column = value`.
pub async fn fetch_page<T: Entity>(
    conn: &mut SqliteConnection,
    request: PageRequest,
    filter: Option<(&'static str, &str)>,
) -> DbResult<Page<T>> {
    let total = count_where::<T>(&mut *conn, filter).await?;

    // Bind positions: ?1 is the filter value when present.
    let (limit_at, offset_at) = if filter.is_some() { (2, 3) } else { (1, 2) };
    let sql = format!(
        "{} LIMIT ?{} OFFSET ?{}",
        select_sql::<T>(filter.map(|(column, _)| column)),
        limit_at,
        offset_at
    );

    let mut query = sqlx::query_as::<_, T>(&sql);
    if let Some((_, value)) = filter {
        query = query.bind(value);
    }
    let items = query
        .bind(request.limit())
        .bind(request.offset())
        .fetch_all(&mut *conn)
        .await?;

    Ok(Page::new(items, request, total))
}

// =============================================================================
// Pool-backed store
// =============================================================================

/// Pool-backed reads for one entity type.
#[derive(Debug)]
pub struct EntityStore<T> {
    pool: SqlitePool,
    _entity: PhantomData<fn() -> T>,
}

impl<T> Clone for EntityStore<T> {
    fn clone(&self) -> Self {
        EntityStore {
            pool: self.pool.clone(),
            _entity: PhantomData,
        }
    }
}

impl<T: Entity> EntityStore<T> {
    pub fn new(pool: SqlitePool) -> Self {
        EntityStore {
            pool,
            _entity: PhantomData,
        }
    }

    pub async fn get(&self, id: &str) -> DbResult<Option<T>> {
        let mut conn = self.pool.acquire().await?;
        fetch_by_id::<T>(&mut conn, id).await
    }

    pub async fn list(&self, request: PageRequest) -> DbResult<Page<T>> {
        let mut conn = self.pool.acquire().await?;
        fetch_page::<T>(&mut conn, request, None).await
    }

    pub async fn list_page_where(
        &self,
        request: PageRequest,
        column: &'static str,
        value: &str,
    ) -> DbResult<Page<T>> {
        let mut conn = self.pool.acquire().await?;
        fetch_page::<T>(&mut conn, request, Some((column, value))).await
    }

    pub async fn list_where(&self, column: &'static str, value: &str) -> DbResult<Vec<T>> {
        let mut conn = self.pool.acquire().await?;
        fetch_where::<T>(&mut conn, column, value).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_select_sql_adds_live_filter() {
        let sql = select_sql::<WorkOrder>(Some("status"));
        assert!(sql.contains("FROM work_orders WHERE status = ?1 AND deleted_at IS NULL"));
        assert!(sql.ends_with("ORDER BY created_at DESC, order_number DESC"));

        let sql = select_sql::<Payment>(None);
        assert!(!sql.contains("WHERE"));
    }
}
