//! # Repository Module
//!
//! Database repository implementations.
//!
//! ## Repository Pattern
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────┐
//! │  Caller                                                             │
//! │    │  db.products().adjust_quantity(id, 12, "recuento")             │
//! │    ▼                                                                │
//! │  Repository (this module)                                           │
//! │    │  validates input, opens ONE transaction, runs the              │
//! │    │  statements for the operation, commits or rolls back           │
//! │    ▼                                                                │
//! │  SQLite                                                             │
//! └─────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! SQL lives only here; entity structs come from bodega-core and are mapped
//! through explicit typed rows, never through loose dictionaries.
//!
//! ## Available Repositories
//!
//! - [`category::CategoryRepository`] - category CRUD, search, guarded delete
//! - [`product::ProductRepository`] - product CRUD, stock adjustment, movements
//! - [`sale::SaleRepository`] - the sale workflow: save, edit, cancel, query

pub mod category;
pub mod product;
pub mod sale;
