//! Shared fixtures for torque-engine integration tests.
//!
//! Each test gets its own on-disk WAL database in a temporary directory,
//! so several pooled connections really contend for SQLite's write lock.

// Not every test binary uses every helper.
#![allow(dead_code)]

use chrono::{TimeZone, Utc};
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;

use torque_core::{FixedClock, Product, ProductKind};
use torque_db::{generate_product_id, Database};
use torque_engine::{Engine, EngineConfig};

/// An engine over a temporary database. The directory lives as long as
/// the fixture.
pub struct TestEngine {
    pub engine: Engine,
    pub clock: Arc<FixedClock>,
    pub config: EngineConfig,
    _dir: TempDir,
}

impl TestEngine {
    pub async fn new(max_connections: u32) -> Self {
        Self::with_busy_timeout(max_connections, Duration::from_secs(5)).await
    }

    pub async fn with_busy_timeout(max_connections: u32, busy_timeout: Duration) -> Self {
        let dir = tempfile::tempdir().expect("should create temp dir");

        let mut config = EngineConfig::default();
        config.database.path = dir.path().join("torque.db");
        config.database.max_connections = max_connections;
        config.retry.max_attempts = 10;
        config.retry.initial_backoff_ms = 5;
        config.retry.max_backoff_ms = 50;

        let db = Database::new(config.db_config().busy_timeout(busy_timeout))
            .await
            .expect("should open database");
        let clock = Arc::new(FixedClock::new(
            Utc.with_ymd_and_hms(2025, 3, 14, 9, 0, 0).unwrap(),
        ));
        let engine = Engine::new(db, &config, clock.clone());

        TestEngine {
            engine,
            clock,
            config,
            _dir: dir,
        }
    }

    /// Adds an active service product to the catalog.
    pub async fn product(&self, name: &str, price_cents: i64) -> Product {
        let now = Utc::now();
        let product = Product {
            id: generate_product_id(),
            name: name.to_string(),
            description: None,
            price_cents,
            kind: ProductKind::Service,
            is_active: true,
            created_at: now,
            updated_at: now,
        };
        self.engine
            .database()
            .products()
            .insert(&product)
            .await
            .expect("should insert product");
        product
    }
}
