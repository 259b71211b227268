//! # Data Reset
//!
//! Deletes all rows while preserving the schema and the migration ledger.
//! Children go first so foreign keys stay satisfied at every step.
//!
//! ## Usage
//! ```bash
//! cargo run -p bodega-db --bin reset -- --db ./data/bodega.db --yes
//! ```
//!
//! Refuses to run without `--yes`; this is not an undoable operation.

use std::env;

use bodega_db::{Database, DbConfig};

/// Deletion order: children before parents.
const TABLES_IN_ORDER: &[&str] = &["sale_items", "sales", "movements", "products", "categories"];

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
    let mut confirmed = false;

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--db" | "-d" => {
                if i + 1 < args.len() {
                    db_path = args[i + 1].clone();
                    i += 1;
                }
            }
            "--yes" | "-y" => confirmed = true,
            "--help" | "-h" => {
                println!("Bodega Data Reset");
                println!();
                println!("Usage: reset [OPTIONS]");
                println!();
                println!("Options:");
                println!("  -d, --db <PATH>    Database file path (default: ./bodega.db)");
                println!("  -y, --yes          Actually delete (required)");
                println!("  -h, --help         Show this help message");
                return Ok(());
            }
            _ => {}
        }
        i += 1;
    }

    if !confirmed {
        eprintln!("Refusing to delete data without --yes");
        std::process::exit(1);
    }

    println!("Database: {}", db_path);

    let db = Database::new(DbConfig::new(&db_path)).await?;

    for table in TABLES_IN_ORDER {
        let exists: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table' AND name = ?1",
        )
        .bind(table)
        .fetch_one(db.pool())
        .await?;

        if exists == 0 {
            println!("  table '{}' does not exist, skipping", table);
            continue;
        }

        let result = sqlx::query(&format!("DELETE FROM {}", table))
            .execute(db.pool())
            .await?;
        println!("  cleared {} ({} rows)", table, result.rows_affected());
    }

    println!("Done. Schema and migration ledger preserved.");

    db.close().await;
    Ok(())
}
