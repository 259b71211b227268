//! # Sale Draft
//!
//! The sale under construction, before and between saves.
//!
//! ## Sale Lifecycle
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────┐
//! │                       Sale Lifecycle                                │
//! │                                                                     │
//! │  1. BUILD (in memory, this module)                                  │
//! │     └── SaleDraft::new() → add_item() / remove_item()               │
//! │         every mutation recomputes subtotals and the total           │
//! │                                                                     │
//! │  2. SAVE (bodega-db)                                                │
//! │     └── first save: persist header + items, DEDUCT stock,           │
//! │         status = completed — one transaction                        │
//! │     └── later saves: replace header + items, stock untouched        │
//! │         (it was already deducted at creation — deliberate)          │
//! │                                                                     │
//! │  3. (OPTIONAL) CANCEL (bodega-db)                                   │
//! │     └── restore stock, status = cancelled — terminal                │
//! │                                                                     │
//! └─────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Totals here are the single source of truth: the repository persists what
//! the draft computed, it never recomputes on its own.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{CoreError, CoreResult, ValidationError};
use crate::money::Money;
use crate::types::{Sale, SaleStatus};
use crate::validation::validate_quantity;
use crate::MAX_SALE_ITEMS;

// =============================================================================
// Draft Item
// =============================================================================

/// A line item of a draft sale.
///
/// The subtotal is computed at construction and only at construction —
/// quantity and price are immutable afterwards, so it cannot go stale.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DraftItem {
    product_id: String,
    quantity: i64,
    unit_price_cents: i64,
    subtotal_cents: i64,
}

impl DraftItem {
    fn new(product_id: &str, quantity: i64, unit_price: Money) -> Self {
        DraftItem {
            product_id: product_id.to_string(),
            quantity,
            unit_price_cents: unit_price.cents(),
            subtotal_cents: unit_price.multiply_quantity(quantity).cents(),
        }
    }

    /// Product this line refers to.
    pub fn product_id(&self) -> &str {
        &self.product_id
    }

    /// Units sold, always positive.
    pub fn quantity(&self) -> i64 {
        self.quantity
    }

    /// Frozen unit price.
    pub fn unit_price(&self) -> Money {
        Money::from_cents(self.unit_price_cents)
    }

    /// quantity × unit price.
    pub fn subtotal(&self) -> Money {
        Money::from_cents(self.subtotal_cents)
    }
}

// =============================================================================
// Sale Draft
// =============================================================================

/// A sale being assembled (new) or edited (loaded from storage).
///
/// ## Example
/// ```rust
/// use bodega_core::money::Money;
/// use bodega_core::sale::SaleDraft;
/// use chrono::Utc;
///
/// let mut draft = SaleDraft::new(Utc::now());
/// draft.add_item("prod-a", 2, Money::from_cents(1000)).unwrap();
/// draft.add_item("prod-b", 1, Money::from_cents(500)).unwrap();
/// assert_eq!(draft.total().cents(), 2500);
///
/// draft.remove_item(1).unwrap();
/// assert_eq!(draft.total().cents(), 2000);
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SaleDraft {
    /// `Some` when this draft edits an already-persisted sale.
    persisted_id: Option<String>,

    /// Business code, kept across edits; generated at first save.
    code: Option<String>,

    /// When the sale happened.
    sale_date: DateTime<Utc>,

    /// Status the save will persist. New drafts save as `Completed`.
    status: SaleStatus,

    /// Free-form notes.
    notes: Option<String>,

    items: Vec<DraftItem>,
}

impl SaleDraft {
    /// Starts an empty draft for a new sale.
    pub fn new(sale_date: DateTime<Utc>) -> Self {
        SaleDraft {
            persisted_id: None,
            code: None,
            sale_date,
            status: SaleStatus::Completed,
            notes: None,
            items: Vec::new(),
        }
    }

    /// Reopens a persisted sale for editing.
    ///
    /// Identity (id, code) and status are preserved; saving the result
    /// replaces the item set without touching stock.
    pub fn from_sale(sale: &Sale) -> Self {
        SaleDraft {
            persisted_id: Some(sale.id.clone()),
            code: Some(sale.code.clone()),
            sale_date: sale.sale_date,
            status: sale.status,
            notes: sale.notes.clone(),
            items: sale
                .items
                .iter()
                .map(|i| DraftItem::new(&i.product_id, i.quantity, i.unit_price()))
                .collect(),
        }
    }

    /// Adds a line item. The unit price passed here is the snapshot that
    /// will be persisted, decoupled from later product price changes.
    pub fn add_item(
        &mut self,
        product_id: &str,
        quantity: i64,
        unit_price: Money,
    ) -> CoreResult<()> {
        validate_quantity(quantity)?;

        if self.items.len() >= MAX_SALE_ITEMS {
            return Err(ValidationError::OutOfRange {
                field: "items".to_string(),
                min: 0,
                max: MAX_SALE_ITEMS as i64,
            }
            .into());
        }

        self.items.push(DraftItem::new(product_id, quantity, unit_price));
        Ok(())
    }

    /// Removes the line item at `index`, returning it.
    pub fn remove_item(&mut self, index: usize) -> CoreResult<DraftItem> {
        if index >= self.items.len() {
            return Err(ValidationError::OutOfRange {
                field: "item index".to_string(),
                min: 0,
                max: self.items.len() as i64 - 1,
            }
            .into());
        }
        Ok(self.items.remove(index))
    }

    /// Replaces the draft notes.
    pub fn set_notes(&mut self, notes: Option<String>) {
        self.notes = notes;
    }

    /// Total of the draft: the sum of line subtotals, recomputed on every
    /// call so it can never drift from the items.
    pub fn total(&self) -> Money {
        self.items.iter().map(DraftItem::subtotal).sum()
    }

    /// Ensures the draft is saveable: at least one item.
    pub fn validate_for_save(&self) -> CoreResult<()> {
        if self.items.is_empty() {
            return Err(CoreError::EmptySale);
        }
        Ok(())
    }

    /// `true` when this draft has never been persisted.
    pub fn is_new(&self) -> bool {
        self.persisted_id.is_none()
    }

    /// Persisted id, when editing.
    pub fn persisted_id(&self) -> Option<&str> {
        self.persisted_id.as_deref()
    }

    /// Business code, when already assigned.
    pub fn code(&self) -> Option<&str> {
        self.code.as_deref()
    }

    /// When the sale happened.
    pub fn sale_date(&self) -> DateTime<Utc> {
        self.sale_date
    }

    /// Status the next save will persist.
    pub fn status(&self) -> SaleStatus {
        self.status
    }

    /// Draft notes.
    pub fn notes(&self) -> Option<&str> {
        self.notes.as_deref()
    }

    /// Line items in insertion order.
    pub fn items(&self) -> &[DraftItem] {
        &self.items
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::SaleItem;

    #[test]
    fn total_tracks_add_and_remove() {
        let mut draft = SaleDraft::new(Utc::now());
        assert_eq!(draft.total(), Money::zero());

        draft.add_item("a", 2, Money::from_cents(1000)).unwrap();
        draft.add_item("b", 1, Money::from_cents(500)).unwrap();
        assert_eq!(draft.total().cents(), 2500);

        let removed = draft.remove_item(0).unwrap();
        assert_eq!(removed.subtotal().cents(), 2000);
        assert_eq!(draft.total().cents(), 500);
    }

    #[test]
    fn subtotal_is_quantity_times_unit_price() {
        let mut draft = SaleDraft::new(Utc::now());
        draft.add_item("a", 3, Money::from_cents(110)).unwrap();
        assert_eq!(draft.items()[0].subtotal().cents(), 330);
    }

    #[test]
    fn rejects_non_positive_quantity() {
        let mut draft = SaleDraft::new(Utc::now());
        assert!(draft.add_item("a", 0, Money::from_cents(100)).is_err());
        assert!(draft.add_item("a", -2, Money::from_cents(100)).is_err());
        assert!(draft.items().is_empty());
    }

    #[test]
    fn remove_out_of_range_is_an_error() {
        let mut draft = SaleDraft::new(Utc::now());
        draft.add_item("a", 1, Money::from_cents(100)).unwrap();
        assert!(draft.remove_item(5).is_err());
        assert_eq!(draft.items().len(), 1);
    }

    #[test]
    fn empty_draft_fails_save_validation() {
        let draft = SaleDraft::new(Utc::now());
        assert!(matches!(
            draft.validate_for_save(),
            Err(CoreError::EmptySale)
        ));
    }

    #[test]
    fn from_sale_preserves_identity_and_items() {
        let now = Utc::now();
        let sale = Sale {
            id: "sale-1".to_string(),
            code: "V-20260101120000-AB12".to_string(),
            sale_date: now,
            total_cents: 2500,
            status: SaleStatus::Completed,
            notes: Some("mostrador".to_string()),
            created_at: Some(now),
            updated_at: Some(now),
            items: vec![
                SaleItem {
                    id: "i1".to_string(),
                    sale_id: "sale-1".to_string(),
                    product_id: "a".to_string(),
                    quantity: 2,
                    unit_price_cents: 1000,
                    subtotal_cents: 2000,
                    created_at: now,
                },
                SaleItem {
                    id: "i2".to_string(),
                    sale_id: "sale-1".to_string(),
                    product_id: "b".to_string(),
                    quantity: 1,
                    unit_price_cents: 500,
                    subtotal_cents: 500,
                    created_at: now,
                },
            ],
        };

        let draft = SaleDraft::from_sale(&sale);
        assert!(!draft.is_new());
        assert_eq!(draft.persisted_id(), Some("sale-1"));
        assert_eq!(draft.code(), Some("V-20260101120000-AB12"));
        assert_eq!(draft.total().cents(), 2500);
        assert_eq!(draft.items().len(), 2);
    }
}
