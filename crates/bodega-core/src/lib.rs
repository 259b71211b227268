//! # bodega-core: Pure Business Logic for Bodega
//!
//! Bodega is a small inventory-and-sales manager for a single shop: product
//! catalog with categories, an append-only stock movement ledger, and sales
//! that deduct (and on cancellation restore) stock. This crate is the part
//! of the system that can be reasoned about without a database: entity
//! records, money arithmetic, the sale-under-construction state machine,
//! and the validation rules that run before any write.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────┐
//! │                       Bodega Architecture                           │
//! │                                                                     │
//! │  ┌─────────────────────────────────────────────────────────────┐   │
//! │  │                 GUI shell (out of scope)                    │   │
//! │  └────────────────────────────┬────────────────────────────────┘   │
//! │                               │                                     │
//! │  ┌────────────────────────────▼────────────────────────────────┐   │
//! │  │              ★ bodega-core (THIS CRATE) ★                   │   │
//! │  │                                                             │   │
//! │  │   ┌─────────┐  ┌─────────┐  ┌──────────┐  ┌────────────┐   │   │
//! │  │   │  types  │  │  money  │  │   sale   │  │ validation │   │   │
//! │  │   │ Product │  │  Money  │  │SaleDraft │  │   rules    │   │   │
//! │  │   │Movement │  │ (cents) │  │  totals  │  │   checks   │   │   │
//! │  │   └─────────┘  └─────────┘  └──────────┘  └────────────┘   │   │
//! │  │                                                             │   │
//! │  │   NO I/O • NO DATABASE • NO CLOCK • PURE FUNCTIONS          │   │
//! │  └────────────────────────────┬────────────────────────────────┘   │
//! │                               │                                     │
//! │  ┌────────────────────────────▼────────────────────────────────┐   │
//! │  │                bodega-db (Database Layer)                   │   │
//! │  │          SQLite queries, migrations, repositories           │   │
//! │  └─────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`types`] - Entity records (Category, Product, Movement, Sale, ...)
//! - [`money`] - Money type with integer-cents arithmetic (no floats!)
//! - [`sale`] - SaleDraft: the sale under construction and its totals
//! - [`validation`] - Input validation rules
//! - [`error`] - Domain error types
//!
//! ## Example Usage
//!
//! ```rust
//! use bodega_core::money::Money;
//! use bodega_core::sale::SaleDraft;
//! use chrono::Utc;
//!
//! let mut draft = SaleDraft::new(Utc::now());
//! draft.add_item("prod-a", 2, Money::from_cents(1000)).unwrap();
//! draft.add_item("prod-b", 1, Money::from_cents(500)).unwrap();
//!
//! // 2 × $10.00 + 1 × $5.00
//! assert_eq!(draft.total(), Money::from_cents(2500));
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod money;
pub mod sale;
pub mod types;
pub mod validation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================
// These allow users to do `use bodega_core::Money` instead of
// `use bodega_core::money::Money`.

pub use error::{CoreError, CoreResult, ValidationError};
pub use money::Money;
pub use sale::{DraftItem, SaleDraft};
pub use types::*;

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// Maximum number of line items allowed in a single sale.
///
/// Keeps a runaway sale (scanner stuck, operator error) from producing an
/// absurd transaction.
pub const MAX_SALE_ITEMS: usize = 100;

/// Maximum quantity of a single line item.
///
/// Catches fat-finger quantities (1000 typed instead of 10) before they
/// reach stock arithmetic.
pub const MAX_ITEM_QUANTITY: i64 = 999;
