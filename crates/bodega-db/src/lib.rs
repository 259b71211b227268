//! # bodega-db: Database Layer for Bodega
//!
//! SQLite storage for the Bodega inventory-and-sales core, built on sqlx.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────┐
//! │                       Bodega Data Flow                              │
//! │                                                                     │
//! │  Caller (GUI shell, maintenance bin, test)                          │
//! │       │                                                             │
//! │       ▼                                                             │
//! │  ┌─────────────────────────────────────────────────────────────┐   │
//! │  │                  bodega-db (THIS CRATE)                     │   │
//! │  │                                                             │   │
//! │  │  ┌────────────┐  ┌───────────────┐  ┌──────────────────┐   │   │
//! │  │  │  Database  │  │ Repositories  │  │    Migrations    │   │   │
//! │  │  │ (pool.rs)  │◄─│ category      │  │ ledger-driven    │   │   │
//! │  │  │ SqlitePool │  │ product       │  │ runner over      │   │   │
//! │  │  │ WAL, FK on │  │ sale, reports │  │ embedded scripts │   │   │
//! │  │  └────────────┘  └───────────────┘  └──────────────────┘   │   │
//! │  └─────────────────────────────────────────────────────────────┘   │
//! │       │                                                             │
//! │       ▼                                                             │
//! │  SQLite file (or :memory: in tests)                                 │
//! └─────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Module Organization
//!
//! - [`pool`] - Connection pool creation and the [`Database`] handle
//! - [`migrations`] - Ledger-driven migration runner over embedded scripts
//! - [`repository`] - Category, product and sale repositories
//! - [`reports`] - Tabular report queries and CSV export
//! - [`error`] - Database error types
//!
//! ## Usage
//!
//! ```rust,ignore
//! use bodega_db::{Database, DbConfig};
//!
//! let db = Database::new(DbConfig::new("./bodega.db")).await?;
//!
//! let products = db.products().search("cola", None).await?;
//! let sale = db.sales().save(&draft).await?;
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod migrations;
pub mod pool;
pub mod reports;
pub mod repository;

// =============================================================================
// Re-exports
// =============================================================================

pub use error::{DbError, DbResult};
pub use pool::{Database, DbConfig};

// Repository re-exports for convenience
pub use reports::{FlatTable, ReportRepository};
pub use repository::category::CategoryRepository;
pub use repository::product::ProductRepository;
pub use repository::sale::{CancelOutcome, SaleFilter, SaleRepository};
