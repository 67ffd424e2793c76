//! # Product Repository
//!
//! Catalog lookups for the line-item pricer, plus the small amount of
//! catalog maintenance the engine's tests and the seed binary need.
//!
//! ## Snapshot Boundary
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  products.price_cents  ── read once, inside the create transaction ──┐  │
//! │                                                                      │  │
//! │  work_order_items.price_snapshot_cents  ◄────────────────────────────┘  │
//! │                                                                         │
//! │  update_price() afterwards changes future orders only.                 │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::Utc;
use sqlx::{SqliteConnection, SqlitePool};
use tracing::debug;
use uuid::Uuid;

use torque_core::validation::validate_price_cents;
use torque_core::{Page, PageRequest, Product};

use crate::error::{DbError, DbResult};
use crate::repository::entity::{fetch_by_id, EntityStore};

/// Repository for product database operations.
///
/// ## Usage
/// ```rust,ignore
/// let repo = db.products();
/// let product = repo.get_by_id("uuid-here").await?;
/// repo.update_price(&product.id, 5_500).await?;
/// ```
#[derive(Debug, Clone)]
pub struct ProductRepository {
    pool: SqlitePool,
    store: EntityStore<Product>,
}

impl ProductRepository {
    /// Creates a new ProductRepository.
    pub fn new(pool: SqlitePool) -> Self {
        ProductRepository {
            store: EntityStore::new(pool.clone()),
            pool,
        }
    }

    /// Gets a product by ID, active or not.
    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Product>> {
        self.store.get(id).await
    }

    /// Resolves a product for pricing on the caller's connection.
    ///
    /// Inactive (soft-deleted) products resolve to `None`.
    pub async fn find_active(conn: &mut SqliteConnection, id: &str) -> DbResult<Option<Product>> {
        let product = fetch_by_id::<Product>(conn, id).await?;
        Ok(product.filter(|p| p.is_active))
    }

    /// Lists products alphabetically.
    pub async fn list(&self, request: PageRequest) -> DbResult<Page<Product>> {
        self.store.list(request).await
    }

    /// Inserts a product.
    pub async fn insert(&self, product: &Product) -> DbResult<()> {
        validate_price_cents(product.price_cents)?;
        debug!(id = %product.id, name = %product.name, "Inserting product");

        sqlx::query(
            r#"
            INSERT INTO products (
                id, name, description, price_cents, kind, is_active, created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
            "#,
        )
        .bind(&product.id)
        .bind(&product.name)
        .bind(&product.description)
        .bind(product.price_cents)
        .bind(product.kind)
        .bind(product.is_active)
        .bind(product.created_at)
        .bind(product.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Changes the catalog price. Existing work order items keep their snapshot.
    pub async fn update_price(&self, id: &str, price_cents: i64) -> DbResult<()> {
        validate_price_cents(price_cents)?;
        debug!(id = %id, price_cents, "Updating product price");

        let result = sqlx::query("UPDATE products SET price_cents = ?2, updated_at = ?3 WHERE id = ?1")
            .bind(id)
            .bind(price_cents)
            .bind(Utc::now())
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Product", id));
        }

        Ok(())
    }

    /// Soft-deletes a product by setting is_active = false.
    ///
    /// Historical items still reference it; new orders can no longer price it.
    pub async fn soft_delete(&self, id: &str) -> DbResult<()> {
        debug!(id = %id, "Soft-deleting product");

        let result = sqlx::query("UPDATE products SET is_active = 0, updated_at = ?2 WHERE id = ?1")
            .bind(id)
            .bind(Utc::now())
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Product", id));
        }

        Ok(())
    }

    /// Counts active products (for diagnostics).
    pub async fn count_active(&self) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM products WHERE is_active = 1")
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }
}

/// Helper to generate a new product ID.
pub fn generate_product_id() -> String {
    Uuid::new_v4().to_string()
}

// =============================================================================
// Unit Tests
// =============================================================================
