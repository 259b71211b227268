//! # Migration Runner
//!
//! Applies pending schema migrations and prints the ledger.
//!
//! ## Usage
//! ```bash
//! # Default database (./bodega.db)
//! cargo run -p bodega-db --bin migrate
//!
//! # Specific database file
//! cargo run -p bodega-db --bin migrate -- --db ./data/bodega.db
//! ```

use std::env;

use bodega_db::migrations;
use bodega_db::{Database, DbConfig};

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
                println!("Bodega Migration Runner");
                println!();
                println!("Usage: migrate [OPTIONS]");
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

    println!("Database: {}", db_path);

    // Connect without the automatic migration pass so the applied count
    // can be reported explicitly.
    let config = DbConfig::new(&db_path).run_migrations(false);
    let db = Database::new(config).await?;

    let applied = db.run_migrations().await?;
    let (total, recorded) = migrations::migration_status(db.pool()).await?;

    println!("Applied {} migration(s) this run", applied);
    println!("Ledger: {}/{} scripts recorded", recorded, total);
    println!();

    for entry in migrations::applied_migrations(db.pool()).await? {
        println!(
            "  {}  {}",
            entry.executed_at.format("%Y-%m-%d %H:%M:%S"),
            entry.name
        );
    }

    db.close().await;
    Ok(())
}
