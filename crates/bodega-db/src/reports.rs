//! # Reports
//!
//! Tabular summaries of sales, inventory, and categories, as flat
//! header+rows tables a spreadsheet (or anything else) can ingest.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────┐
//! │  repositories ──► typed rows ──► FlatTable ──► CSV                  │
//! │                                                                     │
//! │  Pure data transforms: a report never writes to the store.          │
//! └─────────────────────────────────────────────────────────────────────┘
//! ```

use sqlx::SqlitePool;

use crate::error::{DbError, DbResult};
use crate::repository::product::ProductRepository;
use crate::repository::sale::{SaleFilter, SaleRepository};
use bodega_core::Money;

// =============================================================================
// Flat Table
// =============================================================================

/// A report as a flat table: one header row plus data rows, every cell
/// already rendered to text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FlatTable {
    pub title: String,
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl FlatTable {
    /// Serializes the table (header first) to CSV.
    pub fn to_csv(&self) -> DbResult<String> {
        let mut writer = csv::Writer::from_writer(Vec::new());

        writer
            .write_record(&self.headers)
            .map_err(|e| DbError::Internal(e.to_string()))?;
        for row in &self.rows {
            writer
                .write_record(row)
                .map_err(|e| DbError::Internal(e.to_string()))?;
        }

        let bytes = writer
            .into_inner()
            .map_err(|e| DbError::Internal(e.to_string()))?;
        String::from_utf8(bytes).map_err(|e| DbError::Internal(e.to_string()))
    }
}

/// Aggregate row of the category summary report.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct CategorySummary {
    pub name: String,
    pub product_count: i64,
    pub total_units: i64,
    pub stock_value_cents: i64,
}

// =============================================================================
// Repository
// =============================================================================

/// Read-only report queries.
#[derive(Debug, Clone)]
pub struct ReportRepository {
    pool: SqlitePool,
}

impl ReportRepository {
    /// Creates a new ReportRepository.
    pub fn new(pool: SqlitePool) -> Self {
        ReportRepository { pool }
    }

    /// Sales report: one row per sale matching the filter, newest first.
    pub async fn sales_table(&self, filter: &SaleFilter) -> DbResult<FlatTable> {
        let sales = SaleRepository::new(self.pool.clone()).list(filter).await?;

        let rows = sales
            .iter()
            .map(|sale| {
                vec![
                    sale.code.clone(),
                    sale.sale_date.format("%Y-%m-%d %H:%M").to_string(),
                    sale.status.as_str().to_string(),
                    sale.items.len().to_string(),
                    decimal(sale.total()),
                ]
            })
            .collect();

        Ok(FlatTable {
            title: "Sales".to_string(),
            headers: ["Code", "Date", "Status", "Items", "Total"]
                .map(String::from)
                .into(),
            rows,
        })
    }

    /// Inventory report: one row per product, optionally one category only,
    /// with the stock value (price × quantity) per product.
    pub async fn inventory_table(&self, category_id: Option<&str>) -> DbResult<FlatTable> {
        let products = ProductRepository::new(self.pool.clone())
            .list(category_id)
            .await?;

        let rows = products
            .iter()
            .map(|p| {
                vec![
                    p.product.code.clone(),
                    p.product.name.clone(),
                    p.category_name.clone().unwrap_or_default(),
                    decimal(p.product.price()),
                    p.product.quantity.to_string(),
                    decimal(p.product.stock_value()),
                ]
            })
            .collect();

        Ok(FlatTable {
            title: "Inventory".to_string(),
            headers: ["Code", "Name", "Category", "Price", "Quantity", "Stock value"]
                .map(String::from)
                .into(),
            rows,
        })
    }

    /// Category summary: product count, unit count and stock value per
    /// category, plus an "(uncategorized)" bucket when needed.
    pub async fn category_summary(&self) -> DbResult<Vec<CategorySummary>> {
        let rows = sqlx::query_as::<_, CategorySummary>(
            "SELECT COALESCE(c.name, '(uncategorized)') AS name,
                    COUNT(p.id) AS product_count,
                    COALESCE(SUM(p.quantity), 0) AS total_units,
                    COALESCE(SUM(p.quantity * p.price_cents), 0) AS stock_value_cents
             FROM products p
             LEFT JOIN categories c ON p.category_id = c.id
             GROUP BY c.id
             ORDER BY name",
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }

    /// The category summary as a flat table.
    pub async fn category_summary_table(&self) -> DbResult<FlatTable> {
        let rows = self
            .category_summary()
            .await?
            .into_iter()
            .map(|s| {
                vec![
                    s.name,
                    s.product_count.to_string(),
                    s.total_units.to_string(),
                    decimal(Money::from_cents(s.stock_value_cents)),
                ]
            })
            .collect();

        Ok(FlatTable {
            title: "Categories".to_string(),
            headers: ["Category", "Products", "Units", "Stock value"]
                .map(String::from)
                .into(),
            rows,
        })
    }
}

/// Renders money as a plain decimal (`12.34`), spreadsheet-friendly.
fn decimal(amount: Money) -> String {
    let sign = if amount.is_negative() { "-" } else { "" };
    format!("{}{}.{:02}", sign, amount.major().abs(), amount.minor())
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::{Database, DbConfig};
    use crate::repository::category::generate_category_id;
    use crate::repository::product::generate_product_id;
    use bodega_core::{Category, Product, SaleDraft};
    use chrono::Utc;

    async fn test_db() -> Database {
        Database::new(DbConfig::in_memory()).await.unwrap()
    }

    async fn seed_catalog(db: &Database) -> (Category, Product, Product) {
        let cat = Category {
            id: generate_category_id(),
            name: "Bebidas".to_string(),
            description: None,
            created_at: Utc::now(),
        };
        db.categories().insert(&cat).await.unwrap();

        let cola = Product {
            id: generate_product_id(),
            code: "COL-33".to_string(),
            name: "Cola 330ml".to_string(),
            description: None,
            price_cents: 1500,
            quantity: 10,
            category_id: Some(cat.id.clone()),
            created_at: Utc::now(),
        };
        db.products().insert(&cola).await.unwrap();

        let chips = Product {
            id: generate_product_id(),
            code: "CHI-45".to_string(),
            name: "Papas 45g".to_string(),
            description: None,
            price_cents: 900,
            quantity: 4,
            category_id: None,
            created_at: Utc::now(),
        };
        db.products().insert(&chips).await.unwrap();

        (cat, cola, chips)
    }

    #[tokio::test]
    async fn inventory_table_values_are_price_times_quantity() {
        let db = test_db().await;
        let (_, _, _) = seed_catalog(&db).await;

        let table = db.reports().inventory_table(None).await.unwrap();
        assert_eq!(table.headers.len(), 6);
        assert_eq!(table.rows.len(), 2);

        // Ordered by product name: Cola first.
        assert_eq!(table.rows[0][0], "COL-33");
        assert_eq!(table.rows[0][2], "Bebidas");
        assert_eq!(table.rows[0][3], "15.00");
        assert_eq!(table.rows[0][5], "150.00");

        assert_eq!(table.rows[1][0], "CHI-45");
        assert_eq!(table.rows[1][2], "");
        assert_eq!(table.rows[1][5], "36.00");
    }

    #[tokio::test]
    async fn category_summary_groups_and_buckets_uncategorized() {
        let db = test_db().await;
        let (_, _, _) = seed_catalog(&db).await;

        let summary = db.reports().category_summary().await.unwrap();
        assert_eq!(summary.len(), 2);

        let uncategorized = summary.iter().find(|s| s.name == "(uncategorized)").unwrap();
        assert_eq!(uncategorized.product_count, 1);
        assert_eq!(uncategorized.total_units, 4);
        assert_eq!(uncategorized.stock_value_cents, 3600);

        let bebidas = summary.iter().find(|s| s.name == "Bebidas").unwrap();
        assert_eq!(bebidas.stock_value_cents, 15000);
    }

    #[tokio::test]
    async fn sales_table_reflects_saved_sales() {
        let db = test_db().await;
        let (_, cola, _) = seed_catalog(&db).await;

        let mut draft = SaleDraft::new(Utc::now());
        draft.add_item(&cola.id, 2, cola.price()).unwrap();
        let sale = db.sales().save(&draft).await.unwrap();

        let table = db.reports().sales_table(&SaleFilter::default()).await.unwrap();
        assert_eq!(table.rows.len(), 1);
        assert_eq!(table.rows[0][0], sale.code);
        assert_eq!(table.rows[0][2], "completed");
        assert_eq!(table.rows[0][3], "1");
        assert_eq!(table.rows[0][4], "30.00");
    }

    #[tokio::test]
    async fn flat_table_round_trips_through_csv() {
        let table = FlatTable {
            title: "Demo".to_string(),
            headers: vec!["A".to_string(), "B".to_string()],
            rows: vec![
                vec!["uno".to_string(), "1.00".to_string()],
                vec!["dos, con coma".to_string(), "2.50".to_string()],
            ],
        };

        let csv_text = table.to_csv().unwrap();
        let mut lines = csv_text.lines();
        assert_eq!(lines.next(), Some("A,B"));
        assert_eq!(lines.next(), Some("uno,1.00"));
        // Comma-containing cell gets quoted.
        assert_eq!(lines.next(), Some("\"dos, con coma\",2.50"));
        assert_eq!(lines.next(), None);
    }

    #[test]
    fn decimal_rendering() {
        assert_eq!(decimal(Money::from_cents(1500)), "15.00");
        assert_eq!(decimal(Money::from_cents(5)), "0.05");
        assert_eq!(decimal(Money::from_cents(-550)), "-5.50");
    }
}
