//! # Sale Repository
//!
//! The sale workflow: save, edit, cancel, query.
//!
//! ## Stock Effects
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────┐
//! │                  When Stock Moves (and When Not)                    │
//! │                                                                     │
//! │  save(new draft)      ─ one tx ─►  header + items inserted,         │
//! │                                    each product -item.quantity      │
//! │                                                                     │
//! │  save(edited sale)    ─ one tx ─►  header updated, items replaced,  │
//! │                                    STOCK UNTOUCHED: it was already  │
//! │                                    deducted at creation. Deliberate │
//! │                                    asymmetry, regression-tested.    │
//! │                                                                     │
//! │  cancel(id)           ─ one tx ─►  each product +item.quantity,     │
//! │                                    status = cancelled (terminal)    │
//! │                                                                     │
//! │  cancel(cancelled id) ──────────►  AlreadyCancelled, zero writes    │
//! │                                    (surfaced, not an error, and     │
//! │                                    never a second stock credit)     │
//! └─────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Totals come from the draft (quantity × frozen unit price, summed) and
//! are bound explicitly on every insert; the repository never persists a
//! total it did not just compute.

use chrono::{DateTime, NaiveDate, Utc};
use sqlx::{QueryBuilder, Sqlite, SqlitePool};
use tracing::{debug, warn};
use uuid::Uuid;

use crate::error::{DbError, DbResult};
use bodega_core::{Sale, SaleDraft, SaleItem, SaleStatus};

// =============================================================================
// Query Types
// =============================================================================

/// Filter for sale listings. All bounds are inclusive and optional.
#[derive(Debug, Clone, Default)]
pub struct SaleFilter {
    /// Earliest sale date (by calendar day).
    pub from: Option<NaiveDate>,
    /// Latest sale date (by calendar day).
    pub to: Option<NaiveDate>,
    /// Only sales in this status.
    pub status: Option<SaleStatus>,
}

/// Result of a cancellation request.
#[derive(Debug)]
pub enum CancelOutcome {
    /// The sale was cancelled and stock restored.
    Cancelled(Sale),
    /// The sale was already cancelled; nothing was written.
    AlreadyCancelled,
}

/// Header row as stored; items are loaded separately and attached.
#[derive(Debug, sqlx::FromRow)]
struct SaleRow {
    id: String,
    code: String,
    sale_date: DateTime<Utc>,
    total_cents: i64,
    status: SaleStatus,
    notes: Option<String>,
    created_at: Option<DateTime<Utc>>,
    updated_at: Option<DateTime<Utc>>,
}

impl SaleRow {
    fn into_sale(self, items: Vec<SaleItem>) -> Sale {
        Sale {
            id: self.id,
            code: self.code,
            sale_date: self.sale_date,
            total_cents: self.total_cents,
            status: self.status,
            notes: self.notes,
            created_at: self.created_at,
            updated_at: self.updated_at,
            items,
        }
    }
}

const SELECT_SALE: &str = "SELECT id, code, sale_date, total_cents, status, notes, \
     created_at, updated_at FROM sales";

// =============================================================================
// Repository
// =============================================================================

/// Repository for sale database operations.
#[derive(Debug, Clone)]
pub struct SaleRepository {
    pool: SqlitePool,
}

impl SaleRepository {
    /// Creates a new SaleRepository.
    pub fn new(pool: SqlitePool) -> Self {
        SaleRepository { pool }
    }

    /// Persists a draft: creates the sale on first save, replaces it on
    /// later saves. Returns the stored sale with items eagerly loaded.
    ///
    /// First save, one transaction:
    /// 1. generate the unique code (unless the draft carries one)
    /// 2. insert the header with the recomputed total
    /// 3. insert every item with its frozen unit price and subtotal
    /// 4. decrement each product's stock by the item quantity
    ///
    /// Any failure rolls the whole transaction back; a sale never appears
    /// with half its items or half its stock effects.
    ///
    /// Later saves update the header and replace the item set in one
    /// transaction, without touching stock (see the module docs).
    pub async fn save(&self, draft: &SaleDraft) -> DbResult<Sale> {
        draft.validate_for_save().map_err(DbError::Domain)?;

        let sale_id = match draft.persisted_id() {
            None => self.insert_new(draft).await?,
            Some(id) => {
                self.replace_existing(id, draft).await?;
                id.to_string()
            }
        };

        self.get_by_id(&sale_id)
            .await?
            .ok_or_else(|| DbError::not_found("Sale", &sale_id))
    }

    async fn insert_new(&self, draft: &SaleDraft) -> DbResult<String> {
        let sale_id = Uuid::new_v4().to_string();
        let code = match draft.code() {
            Some(code) => code.to_string(),
            None => generate_sale_code(Utc::now()),
        };
        let now = Utc::now();
        let total_cents = draft.total().cents();

        debug!(id = %sale_id, code = %code, total_cents, "creating sale");

        let mut tx = self.pool.begin().await?;

        sqlx::query(
            "INSERT INTO sales (id, code, sale_date, total_cents, status, notes, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
        )
        .bind(&sale_id)
        .bind(&code)
        .bind(draft.sale_date())
        .bind(total_cents)
        .bind(draft.status())
        .bind(draft.notes())
        .bind(now)
        .bind(now)
        .execute(&mut *tx)
        .await?;

        for item in draft.items() {
            // Stock deduction happens once, here at creation. Zero rows
            // touched means the product does not exist, which rolls the
            // whole sale back.
            let result = sqlx::query("UPDATE products SET quantity = quantity - ?2 WHERE id = ?1")
                .bind(item.product_id())
                .bind(item.quantity())
                .execute(&mut *tx)
                .await?;

            if result.rows_affected() == 0 {
                return Err(DbError::not_found("Product", item.product_id()));
            }

            insert_item(&mut tx, &sale_id, item, now).await?;
        }

        tx.commit().await?;
        Ok(sale_id)
    }

    async fn replace_existing(&self, sale_id: &str, draft: &SaleDraft) -> DbResult<()> {
        let now = Utc::now();
        let total_cents = draft.total().cents();

        debug!(id = %sale_id, total_cents, "replacing sale items");

        let mut tx = self.pool.begin().await?;

        let result = sqlx::query(
            "UPDATE sales SET total_cents = ?2, status = ?3, notes = ?4, updated_at = ?5
             WHERE id = ?1",
        )
        .bind(sale_id)
        .bind(total_cents)
        .bind(draft.status())
        .bind(draft.notes())
        .bind(now)
        .execute(&mut *tx)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Sale", sale_id));
        }

        sqlx::query("DELETE FROM sale_items WHERE sale_id = ?1")
            .bind(sale_id)
            .execute(&mut *tx)
            .await?;

        // Re-insert the current item set. No stock arithmetic on this path.
        for item in draft.items() {
            insert_item(&mut tx, sale_id, item, now).await?;
        }

        tx.commit().await?;
        Ok(())
    }

    /// Cancels a sale: restores each item's quantity to its product, marks
    /// the sale cancelled and appends the reason to its notes — one
    /// transaction.
    ///
    /// Cancelling an already-cancelled sale returns
    /// [`CancelOutcome::AlreadyCancelled`] without writing anything, so
    /// stock can never be credited twice.
    pub async fn cancel(&self, sale_id: &str, reason: &str) -> DbResult<CancelOutcome> {
        let mut tx = self.pool.begin().await?;

        let row = sqlx::query_as::<_, SaleRow>(&format!("{SELECT_SALE} WHERE id = ?1"))
            .bind(sale_id)
            .fetch_optional(&mut *tx)
            .await?
            .ok_or_else(|| DbError::not_found("Sale", sale_id))?;

        if row.status == SaleStatus::Cancelled {
            debug!(id = %sale_id, "sale already cancelled, no-op");
            return Ok(CancelOutcome::AlreadyCancelled);
        }

        let items = fetch_items(&mut tx, sale_id).await?;

        for item in &items {
            sqlx::query("UPDATE products SET quantity = quantity + ?2 WHERE id = ?1")
                .bind(&item.product_id)
                .bind(item.quantity)
                .execute(&mut *tx)
                .await?;
        }

        let notes = cancellation_notes(row.notes.as_deref(), reason);
        let now = Utc::now();

        sqlx::query("UPDATE sales SET status = ?2, notes = ?3, updated_at = ?4 WHERE id = ?1")
            .bind(sale_id)
            .bind(SaleStatus::Cancelled)
            .bind(&notes)
            .bind(now)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        debug!(id = %sale_id, items = items.len(), "sale cancelled, stock restored");

        let mut sale = row.into_sale(items);
        sale.status = SaleStatus::Cancelled;
        sale.notes = Some(notes);
        sale.updated_at = Some(now);
        Ok(CancelOutcome::Cancelled(sale))
    }

    /// Gets a sale by id, items eagerly loaded.
    pub async fn get_by_id(&self, sale_id: &str) -> DbResult<Option<Sale>> {
        let row = sqlx::query_as::<_, SaleRow>(&format!("{SELECT_SALE} WHERE id = ?1"))
            .bind(sale_id)
            .fetch_optional(&self.pool)
            .await?;

        let Some(row) = row else {
            return Ok(None);
        };

        let items = sqlx::query_as::<_, SaleItem>(
            "SELECT id, sale_id, product_id, quantity, unit_price_cents, subtotal_cents, created_at
             FROM sale_items WHERE sale_id = ?1 ORDER BY created_at, id",
        )
        .bind(sale_id)
        .fetch_all(&self.pool)
        .await?;

        let mut sale = row.into_sale(items);

        // The write path always persists computed totals; if this fires the
        // row was damaged outside this code. Repair what we hand back and
        // say so, rather than propagating a silently wrong total.
        if sale.repair_totals() {
            warn!(id = %sale.id, code = %sale.code, "stored totals disagreed with items, repaired in memory");
        }

        Ok(Some(sale))
    }

    /// Gets a sale by its business code.
    pub async fn get_by_code(&self, code: &str) -> DbResult<Option<Sale>> {
        let id: Option<String> = sqlx::query_scalar("SELECT id FROM sales WHERE code = ?1")
            .bind(code)
            .fetch_optional(&self.pool)
            .await?;

        match id {
            Some(id) => self.get_by_id(&id).await,
            None => Ok(None),
        }
    }

    /// Lists sales newest first, optionally bounded by an inclusive date
    /// range and/or a status. Items are eagerly loaded.
    pub async fn list(&self, filter: &SaleFilter) -> DbResult<Vec<Sale>> {
        let mut qb: QueryBuilder<Sqlite> = QueryBuilder::new(SELECT_SALE);
        qb.push(" WHERE 1=1");

        if let Some(from) = filter.from {
            qb.push(" AND DATE(sale_date) >= ");
            qb.push_bind(from);
        }

        if let Some(to) = filter.to {
            qb.push(" AND DATE(sale_date) <= ");
            qb.push_bind(to);
        }

        if let Some(status) = filter.status {
            qb.push(" AND status = ");
            qb.push_bind(status);
        }

        qb.push(" ORDER BY sale_date DESC");

        let rows = qb
            .build_query_as::<SaleRow>()
            .fetch_all(&self.pool)
            .await?;

        let mut sales = Vec::with_capacity(rows.len());
        for row in rows {
            // Reuse the eager single-sale path so list results get the same
            // items and the same consistency guard.
            if let Some(sale) = self.get_by_id(&row.id).await? {
                sales.push(sale);
            }
        }

        Ok(sales)
    }
}

// =============================================================================
// Helpers
// =============================================================================

async fn insert_item(
    tx: &mut sqlx::Transaction<'_, Sqlite>,
    sale_id: &str,
    item: &bodega_core::DraftItem,
    now: DateTime<Utc>,
) -> DbResult<()> {
    sqlx::query(
        "INSERT INTO sale_items (id, sale_id, product_id, quantity, unit_price_cents, subtotal_cents, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
    )
    .bind(Uuid::new_v4().to_string())
    .bind(sale_id)
    .bind(item.product_id())
    .bind(item.quantity())
    .bind(item.unit_price().cents())
    .bind(item.subtotal().cents())
    .bind(now)
    .execute(&mut **tx)
    .await?;

    Ok(())
}

async fn fetch_items(
    tx: &mut sqlx::Transaction<'_, Sqlite>,
    sale_id: &str,
) -> DbResult<Vec<SaleItem>> {
    let items = sqlx::query_as::<_, SaleItem>(
        "SELECT id, sale_id, product_id, quantity, unit_price_cents, subtotal_cents, created_at
         FROM sale_items WHERE sale_id = ?1 ORDER BY created_at, id",
    )
    .bind(sale_id)
    .fetch_all(&mut **tx)
    .await?;

    Ok(items)
}

/// Builds the notes field of a cancelled sale: marker, then whatever was
/// there, then the reason.
fn cancellation_notes(existing: Option<&str>, reason: &str) -> String {
    let mut notes = String::from("SALE CANCELLED.");
    if let Some(existing) = existing {
        if !existing.trim().is_empty() {
            notes.push(' ');
            notes.push_str(existing.trim());
        }
    }
    if !reason.trim().is_empty() {
        notes.push(' ');
        notes.push_str(reason.trim());
    }
    notes
}

/// Generates a sale code: `V-` + timestamp + 4-char random suffix.
///
/// The timestamp prefix keeps codes chronologically sortable; the suffix
/// makes same-second collisions negligible, and the UNIQUE index on
/// `sales.code` is the actual guarantee.
///
/// ## Example
/// `V-20260807153012-A3F9`
fn generate_sale_code(now: DateTime<Utc>) -> String {
    let timestamp = now.format("%Y%m%d%H%M%S");

    let suffix: String = Uuid::new_v4()
        .simple()
        .to_string()
        .chars()
        .take(4)
        .map(|c| c.to_ascii_uppercase())
        .collect();

    format!("V-{timestamp}-{suffix}")
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::{Database, DbConfig};
    use crate::repository::product::generate_product_id;
    use bodega_core::{CoreError, Money, Product};
    use chrono::TimeZone;

    async fn test_db() -> Database {
        Database::new(DbConfig::in_memory()).await.unwrap()
    }

    async fn seed_product(db: &Database, code: &str, price_cents: i64, quantity: i64) -> Product {
        let product = Product {
            id: generate_product_id(),
            code: code.to_string(),
            name: format!("Producto {code}"),
            description: None,
            price_cents,
            quantity,
            category_id: None,
            created_at: Utc::now(),
        };
        db.products().insert(&product).await.unwrap();
        product
    }

    async fn stock_of(db: &Database, id: &str) -> i64 {
        db.products()
            .get_by_id(id)
            .await
            .unwrap()
            .unwrap()
            .product
            .quantity
    }

    #[tokio::test]
    async fn create_sale_computes_total_and_decrements_stock() {
        let db = test_db().await;
        let a = seed_product(&db, "PROD-A", 1000, 10).await;
        let b = seed_product(&db, "PROD-B", 500, 5).await;

        let mut draft = SaleDraft::new(Utc::now());
        draft.add_item(&a.id, 2, Money::from_cents(1000)).unwrap();
        draft.add_item(&b.id, 1, Money::from_cents(500)).unwrap();

        let sale = db.sales().save(&draft).await.unwrap();

        assert_eq!(sale.total_cents, 2500);
        assert_eq!(sale.status, SaleStatus::Completed);
        assert_eq!(sale.items.len(), 2);
        assert_eq!(sale.computed_total().cents(), sale.total_cents);
        assert!(sale.code.starts_with("V-"));
        assert!(sale.created_at.is_some());

        assert_eq!(stock_of(&db, &a.id).await, 8);
        assert_eq!(stock_of(&db, &b.id).await, 4);
    }

    #[tokio::test]
    async fn save_is_atomic_when_an_item_references_a_missing_product() {
        let db = test_db().await;
        let a = seed_product(&db, "PROD-A", 1000, 10).await;

        let mut draft = SaleDraft::new(Utc::now());
        draft.add_item(&a.id, 2, Money::from_cents(1000)).unwrap();
        draft.add_item("ghost", 1, Money::from_cents(100)).unwrap();

        let err = db.sales().save(&draft).await.unwrap_err();
        assert!(matches!(err, DbError::NotFound { .. }));

        // Nothing half-applied: no sale row, stock untouched.
        let sale_count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM sales")
            .fetch_one(db.pool())
            .await
            .unwrap();
        assert_eq!(sale_count, 0);
        assert_eq!(stock_of(&db, &a.id).await, 10);
    }

    #[tokio::test]
    async fn empty_draft_is_rejected_before_any_write() {
        let db = test_db().await;
        let draft = SaleDraft::new(Utc::now());

        let err = db.sales().save(&draft).await.unwrap_err();
        assert!(matches!(err, DbError::Domain(CoreError::EmptySale)));
    }

    #[tokio::test]
    async fn editing_a_completed_sale_replaces_items_but_not_stock() {
        let db = test_db().await;
        let a = seed_product(&db, "PROD-A", 1000, 10).await;
        let b = seed_product(&db, "PROD-B", 500, 5).await;

        let mut draft = SaleDraft::new(Utc::now());
        draft.add_item(&a.id, 2, Money::from_cents(1000)).unwrap();
        let sale = db.sales().save(&draft).await.unwrap();
        assert_eq!(stock_of(&db, &a.id).await, 8);

        // Edit: drop A, add B. Stock was deducted at creation and must not
        // move again in either direction.
        let mut edit = SaleDraft::from_sale(&sale);
        edit.remove_item(0).unwrap();
        edit.add_item(&b.id, 3, Money::from_cents(500)).unwrap();
        let edited = db.sales().save(&edit).await.unwrap();

        assert_eq!(edited.id, sale.id);
        assert_eq!(edited.code, sale.code);
        assert_eq!(edited.items.len(), 1);
        assert_eq!(edited.items[0].product_id, b.id);
        assert_eq!(edited.total_cents, 1500);

        assert_eq!(stock_of(&db, &a.id).await, 8);
        assert_eq!(stock_of(&db, &b.id).await, 5);
    }

    #[tokio::test]
    async fn cancel_restores_stock_and_second_cancel_is_a_noop() {
        let db = test_db().await;
        let a = seed_product(&db, "PROD-A", 1000, 10).await;
        let b = seed_product(&db, "PROD-B", 500, 5).await;

        let mut draft = SaleDraft::new(Utc::now());
        draft.add_item(&a.id, 2, Money::from_cents(1000)).unwrap();
        draft.add_item(&b.id, 1, Money::from_cents(500)).unwrap();
        let sale = db.sales().save(&draft).await.unwrap();

        let outcome = db.sales().cancel(&sale.id, "cliente devolvió").await.unwrap();
        let cancelled = match outcome {
            CancelOutcome::Cancelled(s) => s,
            CancelOutcome::AlreadyCancelled => panic!("first cancel must cancel"),
        };
        assert_eq!(cancelled.status, SaleStatus::Cancelled);
        assert!(cancelled.notes.as_deref().unwrap().starts_with("SALE CANCELLED."));
        assert!(cancelled.notes.as_deref().unwrap().contains("cliente devolvió"));

        assert_eq!(stock_of(&db, &a.id).await, 10);
        assert_eq!(stock_of(&db, &b.id).await, 5);

        // Second cancel: surfaced no-op, never a double credit.
        let outcome = db.sales().cancel(&sale.id, "otra vez").await.unwrap();
        assert!(matches!(outcome, CancelOutcome::AlreadyCancelled));
        assert_eq!(stock_of(&db, &a.id).await, 10);
        assert_eq!(stock_of(&db, &b.id).await, 5);

        let stored = db.sales().get_by_id(&sale.id).await.unwrap().unwrap();
        assert_eq!(stored.status, SaleStatus::Cancelled);
    }

    #[tokio::test]
    async fn cancel_missing_sale_is_not_found() {
        let db = test_db().await;
        let err = db.sales().cancel("nope", "").await.unwrap_err();
        assert!(matches!(err, DbError::NotFound { .. }));
    }

    #[tokio::test]
    async fn get_by_code_finds_the_same_sale() {
        let db = test_db().await;
        let a = seed_product(&db, "PROD-A", 700, 3).await;

        let mut draft = SaleDraft::new(Utc::now());
        draft.add_item(&a.id, 1, Money::from_cents(700)).unwrap();
        let sale = db.sales().save(&draft).await.unwrap();

        let by_code = db.sales().get_by_code(&sale.code).await.unwrap().unwrap();
        assert_eq!(by_code.id, sale.id);
        assert!(db.sales().get_by_code("V-nope").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn list_filters_by_date_range_and_status_newest_first() {
        let db = test_db().await;
        let a = seed_product(&db, "PROD-A", 1000, 100).await;

        let day = |d: u32| Utc.with_ymd_and_hms(2026, 3, d, 12, 0, 0).unwrap();

        let mut first = SaleDraft::new(day(1));
        first.add_item(&a.id, 1, Money::from_cents(1000)).unwrap();
        let first = db.sales().save(&first).await.unwrap();

        let mut second = SaleDraft::new(day(10));
        second.add_item(&a.id, 2, Money::from_cents(1000)).unwrap();
        let second = db.sales().save(&second).await.unwrap();

        let mut third = SaleDraft::new(day(20));
        third.add_item(&a.id, 3, Money::from_cents(1000)).unwrap();
        let third = db.sales().save(&third).await.unwrap();
        db.sales().cancel(&third.id, "").await.unwrap();

        // Everything, newest first.
        let all = db.sales().list(&SaleFilter::default()).await.unwrap();
        let ids: Vec<&str> = all.iter().map(|s| s.id.as_str()).collect();
        assert_eq!(ids, vec![third.id.as_str(), second.id.as_str(), first.id.as_str()]);

        // Inclusive date range.
        let filter = SaleFilter {
            from: Some(NaiveDate::from_ymd_opt(2026, 3, 10).unwrap()),
            to: Some(NaiveDate::from_ymd_opt(2026, 3, 20).unwrap()),
            status: None,
        };
        let ranged = db.sales().list(&filter).await.unwrap();
        assert_eq!(ranged.len(), 2);

        // Status filter.
        let filter = SaleFilter {
            status: Some(SaleStatus::Cancelled),
            ..Default::default()
        };
        let cancelled = db.sales().list(&filter).await.unwrap();
        assert_eq!(cancelled.len(), 1);
        assert_eq!(cancelled[0].id, third.id);

        // Items come eagerly loaded.
        assert_eq!(cancelled[0].items.len(), 1);
    }

    #[tokio::test]
    async fn read_side_repairs_and_flags_a_zeroed_total() {
        let db = test_db().await;
        let a = seed_product(&db, "PROD-A", 1000, 10).await;

        let mut draft = SaleDraft::new(Utc::now());
        draft.add_item(&a.id, 2, Money::from_cents(1000)).unwrap();
        let sale = db.sales().save(&draft).await.unwrap();

        // Damage the row behind the repository's back.
        sqlx::query("UPDATE sales SET total_cents = 0 WHERE id = ?1")
            .bind(&sale.id)
            .execute(db.pool())
            .await
            .unwrap();

        let loaded = db.sales().get_by_id(&sale.id).await.unwrap().unwrap();
        assert_eq!(loaded.total_cents, 2000);
    }

    #[test]
    fn sale_code_shape() {
        let now = Utc.with_ymd_and_hms(2026, 8, 7, 15, 30, 12).unwrap();
        let code = generate_sale_code(now);

        assert!(code.starts_with("V-20260807153012-"));
        let suffix = code.rsplit('-').next().unwrap();
        assert_eq!(suffix.len(), 4);
        assert!(suffix.chars().all(|c| c.is_ascii_alphanumeric()));
    }

    #[test]
    fn cancellation_notes_compose() {
        assert_eq!(cancellation_notes(None, ""), "SALE CANCELLED.");
        assert_eq!(
            cancellation_notes(Some("mostrador"), "duplicada"),
            "SALE CANCELLED. mostrador duplicada"
        );
    }
}
