//! # Product Repository
//!
//! Database operations for products and their stock movement ledger.
//!
//! ## Stock Changes
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────┐
//! │              How Product.quantity Changes                           │
//! │                                                                     │
//! │  adjust_quantity(new_qty)  ──►  UPDATE quantity                     │
//! │                                 + exactly one movement row          │
//! │                                 (entrada/salida, |delta|)           │
//! │                                                                     │
//! │  sale save                 ──►  quantity - item.quantity            │
//! │  sale cancel               ──►  quantity + item.quantity            │
//! │                                 (audited by the sale itself,        │
//! │                                  no movement row)                   │
//! │                                                                     │
//! │  update()                  ──►  never touches quantity              │
//! └─────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The legacy app let a plain product edit overwrite the stock count with
//! no audit trail; that path is deliberately gone.

use chrono::Utc;
use sqlx::{QueryBuilder, Sqlite, SqlitePool};
use tracing::debug;
use uuid::Uuid;

use crate::error::{DbError, DbResult};
use bodega_core::validation::{
    validate_price_cents, validate_product_code, validate_product_name, validate_search_term,
    validate_stock_level,
};
use bodega_core::{CoreError, Movement, MovementKind, Product, ProductWithCategory};

/// Repository for product database operations.
#[derive(Debug, Clone)]
pub struct ProductRepository {
    pool: SqlitePool,
}

const SELECT_WITH_CATEGORY: &str = "SELECT p.id, p.code, p.name, p.description, p.price_cents, \
     p.quantity, p.category_id, p.created_at, c.name AS category_name \
     FROM products p \
     LEFT JOIN categories c ON p.category_id = c.id";

impl ProductRepository {
    /// Creates a new ProductRepository.
    pub fn new(pool: SqlitePool) -> Self {
        ProductRepository { pool }
    }

    /// Inserts a new product.
    ///
    /// ## Returns
    /// * `Err(DbError::Domain(_))` - invalid code/name/price/quantity
    /// * `Err(DbError::UniqueViolation)` - code already exists
    pub async fn insert(&self, product: &Product) -> DbResult<()> {
        validate_product_code(&product.code).map_err(CoreError::from)?;
        validate_product_name(&product.name).map_err(CoreError::from)?;
        validate_price_cents(product.price_cents).map_err(CoreError::from)?;
        validate_stock_level(product.quantity).map_err(CoreError::from)?;

        debug!(code = %product.code, "inserting product");

        sqlx::query(
            "INSERT INTO products (id, code, name, description, price_cents, quantity, category_id, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
        )
        .bind(&product.id)
        .bind(product.code.trim())
        .bind(product.name.trim())
        .bind(&product.description)
        .bind(product.price_cents)
        .bind(product.quantity)
        .bind(&product.category_id)
        .bind(product.created_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Updates a product's descriptive fields and price.
    ///
    /// `quantity` is intentionally absent from the statement: stock only
    /// moves through [`ProductRepository::adjust_quantity`] or sale
    /// processing, so every change stays auditable.
    pub async fn update(&self, product: &Product) -> DbResult<()> {
        validate_product_code(&product.code).map_err(CoreError::from)?;
        validate_product_name(&product.name).map_err(CoreError::from)?;
        validate_price_cents(product.price_cents).map_err(CoreError::from)?;

        debug!(id = %product.id, "updating product");

        let result = sqlx::query(
            "UPDATE products SET code = ?2, name = ?3, description = ?4, price_cents = ?5, category_id = ?6
             WHERE id = ?1",
        )
        .bind(&product.id)
        .bind(product.code.trim())
        .bind(product.name.trim())
        .bind(&product.description)
        .bind(product.price_cents)
        .bind(&product.category_id)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Product", &product.id));
        }

        Ok(())
    }

    /// Deletes a product together with its movement history, in one
    /// transaction.
    ///
    /// Products referenced by sale items cannot be deleted; the foreign key
    /// surfaces as [`DbError::ForeignKeyViolation`] and nothing (including
    /// the movement history) is removed.
    pub async fn delete(&self, id: &str) -> DbResult<()> {
        let mut tx = self.pool.begin().await?;

        sqlx::query("DELETE FROM movements WHERE product_id = ?1")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        let result = sqlx::query("DELETE FROM products WHERE id = ?1")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Product", id));
        }

        tx.commit().await?;

        debug!(id = %id, "product deleted with movement history");
        Ok(())
    }

    /// Gets a product by id, joined with its category name.
    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<ProductWithCategory>> {
        let product = sqlx::query_as::<_, ProductWithCategory>(&format!(
            "{SELECT_WITH_CATEGORY} WHERE p.id = ?1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(product)
    }

    /// Gets a product by its business code.
    pub async fn get_by_code(&self, code: &str) -> DbResult<Option<ProductWithCategory>> {
        let product = sqlx::query_as::<_, ProductWithCategory>(&format!(
            "{SELECT_WITH_CATEGORY} WHERE p.code = ?1"
        ))
        .bind(code)
        .fetch_optional(&self.pool)
        .await?;

        Ok(product)
    }

    /// Lists products ordered by name, optionally only one category.
    pub async fn list(&self, category_id: Option<&str>) -> DbResult<Vec<ProductWithCategory>> {
        self.search("", category_id).await
    }

    /// Searches products by name or code substring, optionally filtered by
    /// category, ordered by name. An empty term matches everything.
    pub async fn search(
        &self,
        term: &str,
        category_id: Option<&str>,
    ) -> DbResult<Vec<ProductWithCategory>> {
        let term = validate_search_term(term).map_err(CoreError::from)?;

        debug!(term = %term, category = ?category_id, "searching products");

        let mut qb: QueryBuilder<Sqlite> = QueryBuilder::new(SELECT_WITH_CATEGORY);
        qb.push(" WHERE 1=1");

        if !term.is_empty() {
            let pattern = format!("%{}%", term);
            qb.push(" AND (p.name LIKE ");
            qb.push_bind(pattern.clone());
            qb.push(" OR p.code LIKE ");
            qb.push_bind(pattern);
            qb.push(")");
        }

        if let Some(category_id) = category_id {
            qb.push(" AND p.category_id = ");
            qb.push_bind(category_id.to_string());
        }

        qb.push(" ORDER BY p.name");

        let products = qb
            .build_query_as::<ProductWithCategory>()
            .fetch_all(&self.pool)
            .await?;

        Ok(products)
    }

    /// Sets a product's stock to `new_quantity` and records the change.
    ///
    /// One transaction: read the current quantity, compute the signed
    /// delta, write the new quantity, append exactly one movement whose
    /// kind follows the delta's sign and whose quantity is `|delta|`.
    ///
    /// ## Returns
    /// * `Ok(Some(movement))` - stock changed, audit row written
    /// * `Ok(None)` - `new_quantity` equals the current stock; nothing
    ///   written (a zero-quantity movement would violate the ledger's
    ///   `quantity > 0` invariant)
    pub async fn adjust_quantity(
        &self,
        id: &str,
        new_quantity: i64,
        notes: Option<&str>,
    ) -> DbResult<Option<Movement>> {
        validate_stock_level(new_quantity).map_err(CoreError::from)?;

        let mut tx = self.pool.begin().await?;

        let current: Option<i64> = sqlx::query_scalar("SELECT quantity FROM products WHERE id = ?1")
            .bind(id)
            .fetch_optional(&mut *tx)
            .await?;
        let current = current.ok_or_else(|| DbError::not_found("Product", id))?;

        let delta = new_quantity - current;
        let Some(kind) = MovementKind::from_delta(delta) else {
            debug!(id = %id, quantity = new_quantity, "stock unchanged, no movement recorded");
            return Ok(None);
        };

        sqlx::query("UPDATE products SET quantity = ?2 WHERE id = ?1")
            .bind(id)
            .bind(new_quantity)
            .execute(&mut *tx)
            .await?;

        let movement = Movement {
            id: Uuid::new_v4().to_string(),
            product_id: id.to_string(),
            kind,
            quantity: delta.abs(),
            notes: notes.map(str::to_string),
            created_at: Utc::now(),
        };

        sqlx::query(
            "INSERT INTO movements (id, product_id, kind, quantity, notes, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        )
        .bind(&movement.id)
        .bind(&movement.product_id)
        .bind(movement.kind)
        .bind(movement.quantity)
        .bind(&movement.notes)
        .bind(movement.created_at)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        debug!(
            id = %id,
            kind = movement.kind.as_str(),
            delta = delta.abs(),
            "stock adjusted"
        );
        Ok(Some(movement))
    }

    /// Lists a product's movement history, newest first.
    pub async fn list_movements(&self, product_id: &str) -> DbResult<Vec<Movement>> {
        let movements = sqlx::query_as::<_, Movement>(
            "SELECT id, product_id, kind, quantity, notes, created_at
             FROM movements
             WHERE product_id = ?1
             ORDER BY created_at DESC",
        )
        .bind(product_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(movements)
    }

    /// Counts products (used by maintenance tooling).
    pub async fn count(&self) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM products")
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }
}

/// Generates a new product id.
pub fn generate_product_id() -> String {
    Uuid::new_v4().to_string()
}

// =============================================================================
// Unit Tests
// =============================================================================
