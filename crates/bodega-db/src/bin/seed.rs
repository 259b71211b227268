//! # Seed Data Generator
//!
//! Populates the database with demo categories and products for
//! development.
//!
//! ## Usage
//! ```bash
//! cargo run -p bodega-db --bin seed
//! cargo run -p bodega-db --bin seed -- --db ./data/bodega.db
//! ```
//!
//! Refuses to touch a database that already has products, so it can't
//! duplicate data on a second run.

use std::env;

use chrono::Utc;
use uuid::Uuid;

use bodega_core::{Category, Product};
use bodega_db::{Database, DbConfig};

/// Demo catalog: category, then (code, name, price in cents, stock).
const CATALOG: &[(&str, &[(&str, &str, i64, i64)])] = &[
    (
        "Bebidas",
        &[
            ("COL-330", "Cola 330ml", 1500, 48),
            ("COL-600", "Cola 600ml", 2200, 36),
            ("AGU-600", "Agua 600ml", 1000, 60),
            ("JUG-NAR", "Jugo de naranja 1L", 3200, 18),
            ("CAF-MOL", "Café molido 250g", 8900, 12),
        ],
    ),
    (
        "Snacks",
        &[
            ("PAP-45", "Papas 45g", 900, 80),
            ("PAP-150", "Papas 150g", 2400, 40),
            ("GAL-CHO", "Galletas de chocolate", 1800, 55),
            ("CHI-PIC", "Chicharrones picantes", 1100, 30),
        ],
    ),
    (
        "Abarrotes",
        &[
            ("ARR-1K", "Arroz 1kg", 3200, 25),
            ("FRI-1K", "Frijol 1kg", 3800, 20),
            ("AZU-1K", "Azúcar 1kg", 2900, 22),
            ("ACE-1L", "Aceite 1L", 5400, 15),
        ],
    ),
    (
        "Lácteos",
        &[
            ("LEC-1L", "Leche entera 1L", 2100, 30),
            ("QUE-400", "Queso fresco 400g", 6500, 10),
            ("YOG-1L", "Yogur natural 1L", 4200, 14),
        ],
    ),
];

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let args: Vec<String> = env::args().collect();
    let mut db_path = String::from("./bodega.db");

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--db" | "-d" => {
                if i + 1 < args.len() {
                    db_path = args[i + 1].clone();
                    i += 1;
                }
            }
            "--help" | "-h" => {
                println!("Bodega Seed Data Generator");
                println!();
                println!("Usage: seed [OPTIONS]");
                println!();
                println!("Options:");
                println!("  -d, --db <PATH>    Database file path (default: ./bodega.db)");
                println!("  -h, --help         Show this help message");
                return Ok(());
            }
            _ => {}
        }
        i += 1;
    }

    println!("Bodega Seed Data Generator");
    println!("==========================");
    println!("Database: {}", db_path);
    println!();

    let db = Database::new(DbConfig::new(&db_path)).await?;
    println!("Connected, migrations applied");

    let existing = db.products().count().await?;
    if existing > 0 {
        println!("Database already has {} products, skipping seed.", existing);
        println!("Run the reset binary first to start over.");
        return Ok(());
    }

    let now = Utc::now();
    let mut categories = 0;
    let mut products = 0;

    for (category_name, items) in CATALOG {
        let category = Category {
            id: Uuid::new_v4().to_string(),
            name: category_name.to_string(),
            description: None,
            created_at: now,
        };
        db.categories().insert(&category).await?;
        categories += 1;

        for (code, name, price_cents, quantity) in *items {
            let product = Product {
                id: Uuid::new_v4().to_string(),
                code: code.to_string(),
                name: name.to_string(),
                description: None,
                price_cents: *price_cents,
                quantity: *quantity,
                category_id: Some(category.id.clone()),
                created_at: now,
            };
            db.products().insert(&product).await?;
            products += 1;
        }
    }

    println!("Seeded {} categories, {} products", categories, products);

    db.close().await;
    Ok(())
}
