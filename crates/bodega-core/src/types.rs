//! # Domain Types
//!
//! Typed entity records for Bodega. One struct per table, mapped explicitly
//! at the repository boundary — no loose row dictionaries promoted to
//! objects at runtime.
//!
//! ## Type Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                │
//! │                                                                     │
//! │  ┌──────────────┐      ┌──────────────┐      ┌──────────────┐      │
//! │  │   Category   │◄─────│   Product    │◄─────│   Movement   │      │
//! │  │ ──────────── │ cat? │ ──────────── │      │ ──────────── │      │
//! │  │ id (UUID)    │      │ id (UUID)    │      │ id (UUID)    │      │
//! │  │ name (uniq)  │      │ code (uniq)  │      │ kind         │      │
//! │  └──────────────┘      │ price_cents  │      │ quantity > 0 │      │
//! │                        │ quantity     │      └──────────────┘      │
//! │                        └──────▲───────┘       append-only ledger   │
//! │                               │                                    │
//! │  ┌──────────────┐      ┌──────┴───────┐                            │
//! │  │     Sale     │◄─────│   SaleItem   │                            │
//! │  │ ──────────── │      │ ──────────── │                            │
//! │  │ id (UUID)    │      │ quantity > 0 │                            │
//! │  │ code (uniq)  │      │ price snap   │                            │
//! │  │ total_cents  │      │ subtotal     │                            │
//! │  │ status       │      └──────────────┘                            │
//! │  └──────────────┘                                                  │
//! └─────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Dual-Key Identity Pattern
//! Entities have an immutable UUID v4 `id` for relations, plus a
//! human-readable business key where people need one: `Product.code`,
//! `Sale.code`, and the unique `Category.name`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::money::Money;

// =============================================================================
// Category
// =============================================================================

/// A product category.
///
/// Deletion is blocked at the application layer while any product still
/// references it.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Category {
    /// Unique identifier (UUID v4).
    pub id: String,

    /// Display name, unique across categories.
    pub name: String,

    /// Optional free-form description.
    pub description: Option<String>,

    /// When the category was created.
    pub created_at: DateTime<Utc>,
}

// =============================================================================
// Product
// =============================================================================

/// A product in the catalog.
///
/// `quantity` is never overwritten directly: it changes through
/// `adjust_quantity` (which appends a [`Movement`]) or through sale
/// processing (save decrements, cancellation restores).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Product {
    /// Unique identifier (UUID v4).
    pub id: String,

    /// Business code shown on labels and receipts, unique.
    pub code: String,

    /// Display name.
    pub name: String,

    /// Optional free-form description.
    pub description: Option<String>,

    /// Unit price in cents, never negative.
    pub price_cents: i64,

    /// Units currently in stock. May go negative when a sale oversells;
    /// the movement ledger and sale records keep the history auditable.
    pub quantity: i64,

    /// Owning category, if any.
    pub category_id: Option<String>,

    /// When the product was created.
    pub created_at: DateTime<Utc>,
}

impl Product {
    /// Returns the unit price as a Money value.
    #[inline]
    pub fn price(&self) -> Money {
        Money::from_cents(self.price_cents)
    }

    /// Value of the units currently in stock (price × quantity).
    #[inline]
    pub fn stock_value(&self) -> Money {
        self.price().multiply_quantity(self.quantity)
    }
}

/// A product joined with its category name, for listings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct ProductWithCategory {
    #[cfg_attr(feature = "sqlx", sqlx(flatten))]
    #[serde(flatten)]
    pub product: Product,

    /// Name of the owning category, when one is set.
    pub category_name: Option<String>,
}

// =============================================================================
// Movement
// =============================================================================

/// Direction of a stock movement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[serde(rename_all = "lowercase")]
pub enum MovementKind {
    /// Stock received (positive delta).
    Entrada,
    /// Stock leaving (negative delta).
    Salida,
}

impl MovementKind {
    /// Derives the kind from a signed quantity delta.
    ///
    /// Returns `None` for a zero delta: no change happened, so no movement
    /// is recorded (movement quantity must be positive).
    pub fn from_delta(delta: i64) -> Option<Self> {
        match delta {
            0 => None,
            d if d > 0 => Some(MovementKind::Entrada),
            _ => Some(MovementKind::Salida),
        }
    }

    /// Stable lowercase name, as stored and exported.
    pub fn as_str(&self) -> &'static str {
        match self {
            MovementKind::Entrada => "entrada",
            MovementKind::Salida => "salida",
        }
    }
}

/// An append-only audit record of a stock quantity change.
///
/// Invariant: every change to `Product.quantity` outside of sale processing
/// produces exactly one movement whose quantity is the absolute delta.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Movement {
    /// Unique identifier (UUID v4).
    pub id: String,

    /// Product whose stock changed.
    pub product_id: String,

    /// Direction of the change.
    pub kind: MovementKind,

    /// Absolute number of units moved, always positive.
    pub quantity: i64,

    /// Optional operator note ("recuento anual", "merma", ...).
    pub notes: Option<String>,

    /// When the movement was recorded.
    pub created_at: DateTime<Utc>,
}

// =============================================================================
// Sale Status
// =============================================================================

/// Lifecycle status of a persisted sale.
///
/// A sale is saved as `Completed`; the only transition afterwards is to
/// `Cancelled`, one-way. Drafts exist only in memory ([`crate::SaleDraft`]),
/// never in storage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[serde(rename_all = "lowercase")]
pub enum SaleStatus {
    /// Saved and stock-deducted.
    Completed,
    /// Reversed; stock restored. Terminal.
    Cancelled,
}

impl SaleStatus {
    /// Stable lowercase name, as stored and exported.
    pub fn as_str(&self) -> &'static str {
        match self {
            SaleStatus::Completed => "completed",
            SaleStatus::Cancelled => "cancelled",
        }
    }
}

// =============================================================================
// Sale
// =============================================================================

/// A persisted sale with its line items eagerly loaded.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Sale {
    /// Unique identifier (UUID v4).
    pub id: String,

    /// Human-readable code (`V-YYYYMMDDHHMMSS-XXXX`), unique.
    pub code: String,

    /// When the sale happened.
    pub sale_date: DateTime<Utc>,

    /// Sum of the items' subtotals, in cents.
    pub total_cents: i64,

    /// Current lifecycle status.
    pub status: SaleStatus,

    /// Free-form notes; cancellation prepends its reason here.
    pub notes: Option<String>,

    /// Row timestamps. `None` on rows created before the columns existed
    /// (they were added by a later migration).
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,

    /// Line items, in insertion order.
    pub items: Vec<SaleItem>,
}

impl Sale {
    /// Returns the stored total as a Money value.
    #[inline]
    pub fn total(&self) -> Money {
        Money::from_cents(self.total_cents)
    }

    /// Recomputes the total from the items, ignoring the stored value.
    pub fn computed_total(&self) -> Money {
        self.items.iter().map(SaleItem::subtotal).sum()
    }

    /// Repairs stored subtotals/total that disagree with recomputation.
    ///
    /// The write path always persists computed values, so this should never
    /// find anything; it exists so a corrupted row is surfaced (the caller
    /// logs when this returns `true`) instead of silently propagated.
    pub fn repair_totals(&mut self) -> bool {
        let mut repaired = false;

        for item in &mut self.items {
            let expected = item.unit_price_cents * item.quantity;
            if item.subtotal_cents != expected {
                item.subtotal_cents = expected;
                repaired = true;
            }
        }

        if !self.items.is_empty() {
            let expected: i64 = self.items.iter().map(|i| i.subtotal_cents).sum();
            if self.total_cents != expected {
                self.total_cents = expected;
                repaired = true;
            }
        }

        repaired
    }
}

// =============================================================================
// Sale Item
// =============================================================================

/// A line item of a sale.
///
/// `unit_price_cents` is a point-in-time snapshot: later changes to the
/// product's price never retroactively change a sale.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct SaleItem {
    /// Unique identifier (UUID v4).
    pub id: String,

    /// Owning sale.
    pub sale_id: String,

    /// Product sold.
    pub product_id: String,

    /// Units sold, always positive.
    pub quantity: i64,

    /// Unit price in cents at the moment of sale (frozen).
    pub unit_price_cents: i64,

    /// quantity × unit_price_cents, persisted for reporting.
    pub subtotal_cents: i64,

    /// When the item row was written.
    pub created_at: DateTime<Utc>,
}

impl SaleItem {
    /// Returns the frozen unit price as Money.
    #[inline]
    pub fn unit_price(&self) -> Money {
        Money::from_cents(self.unit_price_cents)
    }

    /// Returns the line subtotal as Money.
    #[inline]
    pub fn subtotal(&self) -> Money {
        Money::from_cents(self.subtotal_cents)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
