//! # Category Repository
//!
//! Database operations for categories.
//!
//! The one rule worth calling out: deletion is refused while products still
//! reference the category. The check runs inside the delete transaction and
//! surfaces as a domain error the caller can show, instead of leaking a
//! foreign-key constraint code.

use sqlx::SqlitePool;
use tracing::debug;
use uuid::Uuid;

use crate::error::{DbError, DbResult};
use bodega_core::validation::{validate_category_name, validate_search_term};
use bodega_core::{Category, CoreError};

/// Repository for category database operations.
#[derive(Debug, Clone)]
pub struct CategoryRepository {
    pool: SqlitePool,
}

impl CategoryRepository {
    /// Creates a new CategoryRepository.
    pub fn new(pool: SqlitePool) -> Self {
        CategoryRepository { pool }
    }

    /// Inserts a new category.
    ///
    /// ## Returns
    /// * `Err(DbError::Domain(_))` - empty/overlong name
    /// * `Err(DbError::UniqueViolation)` - name already taken
    pub async fn insert(&self, category: &Category) -> DbResult<()> {
        validate_category_name(&category.name).map_err(CoreError::from)?;

        debug!(id = %category.id, name = %category.name, "inserting category");

        sqlx::query(
            "INSERT INTO categories (id, name, description, created_at)
             VALUES (?1, ?2, ?3, ?4)",
        )
        .bind(&category.id)
        .bind(category.name.trim())
        .bind(&category.description)
        .bind(category.created_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Updates a category's name and description.
    pub async fn update(&self, category: &Category) -> DbResult<()> {
        validate_category_name(&category.name).map_err(CoreError::from)?;

        debug!(id = %category.id, "updating category");

        let result = sqlx::query(
            "UPDATE categories SET name = ?2, description = ?3 WHERE id = ?1",
        )
        .bind(&category.id)
        .bind(category.name.trim())
        .bind(&category.description)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Category", &category.id));
        }

        Ok(())
    }

    /// Deletes a category.
    ///
    /// Refused with [`CoreError::CategoryHasProducts`] while any product
    /// references it. Check and delete share one transaction so a product
    /// created in between cannot be orphaned.
    pub async fn delete(&self, id: &str) -> DbResult<()> {
        let mut tx = self.pool.begin().await?;

        let product_count: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM products WHERE category_id = ?1")
                .bind(id)
                .fetch_one(&mut *tx)
                .await?;

        if product_count > 0 {
            return Err(CoreError::CategoryHasProducts {
                id: id.to_string(),
                product_count,
            }
            .into());
        }

        let result = sqlx::query("DELETE FROM categories WHERE id = ?1")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Category", id));
        }

        tx.commit().await?;

        debug!(id = %id, "category deleted");
        Ok(())
    }

    /// Gets a category by its id.
    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Category>> {
        let category = sqlx::query_as::<_, Category>(
            "SELECT id, name, description, created_at FROM categories WHERE id = ?1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(category)
    }

    /// Lists all categories, ordered by name.
    pub async fn list_all(&self) -> DbResult<Vec<Category>> {
        let categories = sqlx::query_as::<_, Category>(
            "SELECT id, name, description, created_at FROM categories ORDER BY name",
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(categories)
    }

    /// Searches categories by name substring, case-insensitively.
    /// An empty term lists everything.
    pub async fn search(&self, term: &str) -> DbResult<Vec<Category>> {
        let term = validate_search_term(term).map_err(CoreError::from)?;

        if term.is_empty() {
            return self.list_all().await;
        }

        let pattern = format!("%{}%", term);
        let categories = sqlx::query_as::<_, Category>(
            "SELECT id, name, description, created_at
             FROM categories
             WHERE name LIKE ?1
             ORDER BY name",
        )
        .bind(pattern)
        .fetch_all(&self.pool)
        .await?;

        Ok(categories)
    }
}

/// Generates a new category id.
pub fn generate_category_id() -> String {
    Uuid::new_v4().to_string()
}

// =============================================================================
// Unit Tests
// =============================================================================
