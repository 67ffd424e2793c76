//! # Seed Data Generator
//!
//! Populates the database with a vehicle-service catalog for development.
//!
//! ## Usage
//! ```bash
//! # Seed the database named in torque.toml / $TORQUE_CONFIG
//! cargo run -p torque-engine --bin seed
//!
//! # Explicit config file
//! cargo run -p torque-engine --bin seed -- --config ./torque.toml
//!
//! # Specify database path (wins over the config file)
//! cargo run -p torque-engine --bin seed -- --db ./data/torque.db
//! ```
//!
//! ## Generated Products
//! - Services (washes, oil changes, detailing), each in three vehicle sizes
//! - Add-ons (wax, vacuum, tyre shine)
//! - Retail (air fresheners, wiper fluid, microfiber cloths)

use anyhow::{Context, Result};
use chrono::Utc;
use std::env;
use std::path::PathBuf;
use tracing::{info, warn};

use torque_core::{Product, ProductKind};
use torque_db::{generate_product_id, Database};
use torque_engine::telemetry::init_tracing;
use torque_engine::EngineConfig;

/// Services priced per vehicle size. Base prices in cents.
const SERVICES: &[(&str, i64)] = &[
    ("Exterior Wash", 5_000),
    ("Full Wash", 8_000),
    ("Engine Bay Wash", 6_500),
    ("Oil Change", 25_000),
    ("Interior Detailing", 35_000),
    ("Ceramic Coating", 150_000),
];

/// Size surcharge in cents.
const VEHICLE_SIZES: &[(&str, i64)] = &[("Small", 0), ("Medium", 1_000), ("Large", 2_500)];

const ADDONS: &[(&str, i64)] = &[
    ("Hand Wax", 2_500),
    ("Interior Vacuum", 1_000),
    ("Tyre Shine", 1_500),
    ("Glass Coating", 4_000),
    ("Underbody Rinse", 2_000),
];

const RETAIL: &[(&str, i64)] = &[
    ("Air Freshener", 1_200),
    ("Wiper Fluid 1L", 2_200),
    ("Microfiber Cloth", 1_800),
    ("Tyre Pressure Gauge", 4_500),
];

#[tokio::main]
async fn main() -> Result<()> {
    let args: Vec<String> = env::args().collect();

    let mut config_path: Option<PathBuf> = None;
    let mut db_path: Option<PathBuf> = None;

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--config" | "-c" => {
                if i + 1 < args.len() {
                    config_path = Some(PathBuf::from(&args[i + 1]));
                    i += 1;
                }
            }
            "--db" | "-d" => {
                if i + 1 < args.len() {
                    db_path = Some(PathBuf::from(&args[i + 1]));
                    i += 1;
                }
            }
            "--help" | "-h" => {
                println!("Torque POS Seed Data Generator");
                println!();
                println!("Usage: seed [OPTIONS]");
                println!();
                println!("Options:");
                println!("  -c, --config <PATH>  Engine config file (default: $TORQUE_CONFIG)");
                println!("  -d, --db <PATH>      Database file path (overrides config)");
                println!("  -h, --help           Show this help message");
                return Ok(());
            }
            other => eprintln!("Ignoring unknown argument: {}", other),
        }
        i += 1;
    }

    let mut config = EngineConfig::load(config_path).context("loading configuration")?;
    if let Some(path) = db_path {
        config.database.path = path;
    }
    init_tracing(&config.log).context("initializing tracing")?;

    info!(path = %config.database.path.display(), "Seeding database");

    let db = Database::new(config.db_config())
        .await
        .context("opening database")?;

    let existing = db.products().count_active().await?;
    if existing > 0 {
        warn!(existing, "Database already has products, skipping seed");
        return Ok(());
    }

    let start = std::time::Instant::now();
    let mut generated = 0usize;

    for (name, base_cents) in SERVICES {
        for (size, surcharge) in VEHICLE_SIZES {
            let product = catalog_entry(&format!("{} ({})", name, size), base_cents + surcharge, ProductKind::Service);
            insert(&db, &product, &mut generated).await;
        }
    }
    for (name, price_cents) in ADDONS {
        insert(&db, &catalog_entry(name, *price_cents, ProductKind::Addon), &mut generated).await;
    }
    for (name, price_cents) in RETAIL {
        insert(&db, &catalog_entry(name, *price_cents, ProductKind::Retail), &mut generated).await;
    }

    info!(generated, elapsed_ms = start.elapsed().as_millis() as u64, "Seed complete");

    db.close().await;
    Ok(())
}

async fn insert(db: &Database, product: &Product, generated: &mut usize) {
    match db.products().insert(product).await {
        Ok(()) => *generated += 1,
        Err(e) => warn!(name = %product.name, error = %e, "Failed to insert product"),
    }
}

fn catalog_entry(name: &str, price_cents: i64, kind: ProductKind) -> Product {
    let now = Utc::now();
    Product {
        id: generate_product_id(),
        name: name.to_string(),
        description: None,
        price_cents,
        kind,
        is_active: true,
        created_at: now,
        updated_at: now,
    }
}
