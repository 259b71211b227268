//! # Database Migrations
//!
//! Embedded SQL migrations, applied by a ledger-driven runner.
//!
//! ## How Migrations Work
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────┐
//! │                      Migration Process                              │
//! │                                                                     │
//! │  Database::new()                                                    │
//! │       │                                                             │
//! │       ▼                                                             │
//! │  Ensure `migrations` ledger table (name, executed_at)               │
//! │       │                                                             │
//! │       ▼                                                             │
//! │  Compare embedded scripts vs ledger, in filename order              │
//! │       │                                                             │
//! │       ├── 001_initial_schema.sql  ✓ recorded → skip                 │
//! │       ├── 002_sales.sql           ✓ recorded → skip                 │
//! │       └── 003_sale_timestamps.sql ⬜ pending → run                   │
//! │       │                                                             │
//! │       ▼                                                             │
//! │  Split pending script into statements, execute each,                │
//! │  then record the script name in the ledger                          │
//! │                                                                     │
//! └─────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Statements run without a wrapping transaction, the way the legacy tool
//! did: re-run safety comes from idempotent statements instead —
//! `IF NOT EXISTS` on tables/indexes, and `ADD COLUMN` statements skipped
//! by the runner when `pragma_table_info` shows the column already exists.
//! A statement failure aborts the failing script and everything after it,
//! reporting the script's name; scripts already recorded stay recorded.
//! There are no down migrations.
//!
//! ## Adding New Migrations
//!
//! 1. Create a file in `migrations/sqlite/` with the next sequence number,
//!    named `NNN_description.sql`
//! 2. Register it in [`SCRIPTS`] below
//! 3. Write idempotent SQL (`IF NOT EXISTS` where possible)
//! 4. **NEVER** modify an existing migration - always add a new one

use std::collections::HashSet;

use chrono::{DateTime, Utc};
use sqlx::SqlitePool;
use tracing::{debug, info};

use crate::error::{DbError, DbResult};

/// Embedded migration scripts, compiled into the binary so no runtime file
/// access is needed. Applied in lexicographic filename order.
static SCRIPTS: &[(&str, &str)] = &[
    (
        "001_initial_schema.sql",
        include_str!("../../../migrations/sqlite/001_initial_schema.sql"),
    ),
    (
        "002_sales.sql",
        include_str!("../../../migrations/sqlite/002_sales.sql"),
    ),
    (
        "003_sale_timestamps.sql",
        include_str!("../../../migrations/sqlite/003_sale_timestamps.sql"),
    ),
];

/// A ledger entry for an applied migration.
#[derive(Debug, Clone, PartialEq, Eq, sqlx::FromRow)]
pub struct AppliedMigration {
    pub name: String,
    pub executed_at: DateTime<Utc>,
}

/// Runs all pending migrations, returning how many scripts were applied.
///
/// Idempotent: a second run right after a first applies zero scripts and
/// leaves the ledger untouched.
pub async fn run_migrations(pool: &SqlitePool) -> DbResult<usize> {
    run_scripts(pool, SCRIPTS).await
}

/// Returns (total embedded scripts, scripts recorded in the ledger).
pub async fn migration_status(pool: &SqlitePool) -> DbResult<(usize, usize)> {
    let applied: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM migrations")
        .fetch_one(pool)
        .await
        .unwrap_or(0);

    Ok((SCRIPTS.len(), applied as usize))
}

/// Lists the ledger, oldest first.
pub async fn applied_migrations(pool: &SqlitePool) -> DbResult<Vec<AppliedMigration>> {
    ensure_ledger(pool).await?;

    let rows = sqlx::query_as::<_, AppliedMigration>(
        "SELECT name, executed_at FROM migrations ORDER BY name",
    )
    .fetch_all(pool)
    .await?;

    Ok(rows)
}

// =============================================================================
// Runner internals
// =============================================================================

async fn run_scripts(pool: &SqlitePool, scripts: &[(&str, &str)]) -> DbResult<usize> {
    ensure_ledger(pool).await?;

    let applied: HashSet<String> = sqlx::query_scalar("SELECT name FROM migrations")
        .fetch_all(pool)
        .await?
        .into_iter()
        .collect();

    // Apply order is the lexicographic filename order, regardless of how
    // the scripts were registered.
    let mut ordered: Vec<&(&str, &str)> = scripts.iter().collect();
    ordered.sort_by(|a, b| a.0.cmp(b.0));

    let mut count = 0;
    for &(name, sql) in ordered {
        if applied.contains(name) {
            debug!(script = name, "already applied, skipping");
            continue;
        }

        info!(script = name, "applying migration");
        apply_script(pool, name, sql).await?;

        sqlx::query("INSERT INTO migrations (name, executed_at) VALUES (?1, ?2)")
            .bind(name)
            .bind(Utc::now())
            .execute(pool)
            .await?;

        count += 1;
    }

    if count > 0 {
        info!(applied = count, "migrations complete");
    } else {
        debug!("no pending migrations");
    }

    Ok(count)
}

async fn ensure_ledger(pool: &SqlitePool) -> DbResult<()> {
    sqlx::query(
        "CREATE TABLE IF NOT EXISTS migrations (
            name        TEXT PRIMARY KEY,
            executed_at TEXT NOT NULL
        )",
    )
    .execute(pool)
    .await?;

    Ok(())
}

/// Executes one script, statement by statement.
async fn apply_script(pool: &SqlitePool, script: &str, sql: &str) -> DbResult<()> {
    for statement in statements(sql) {
        if let Some((table, column)) = add_column_target(&statement) {
            if column_exists(pool, &table, &column).await? {
                debug!(
                    script,
                    table = %table,
                    column = %column,
                    "column already exists, skipping ADD COLUMN"
                );
                continue;
            }
        }

        sqlx::query(&statement)
            .execute(pool)
            .await
            .map_err(|e| DbError::MigrationFailed {
                script: script.to_string(),
                message: e.to_string(),
            })?;
    }

    Ok(())
}

/// Splits a script into executable statements: `;`-separated chunks with
/// comment lines stripped and blanks dropped.
fn statements(sql: &str) -> Vec<String> {
    sql.split(';')
        .map(|chunk| {
            chunk
                .lines()
                .filter(|line| !line.trim_start().starts_with("--"))
                .collect::<Vec<_>>()
                .join("\n")
                .trim()
                .to_string()
        })
        .filter(|s| !s.is_empty())
        .collect()
}

/// Recognizes `ALTER TABLE <t> ADD COLUMN <c> ...` and returns (t, c).
///
/// SQLite has no `ADD COLUMN IF NOT EXISTS`, so the runner performs the
/// existence check itself; statements that already carry the clause (future
/// SQLite versions) are left alone.
fn add_column_target(statement: &str) -> Option<(String, String)> {
    let upper = statement.to_uppercase();

    if upper.contains("IF NOT EXISTS") {
        return None;
    }

    let alter_idx = upper.find("ALTER TABLE")?;
    let add_idx = upper.find("ADD COLUMN")?;
    if add_idx <= alter_idx {
        return None;
    }

    let table = statement[alter_idx + "ALTER TABLE".len()..add_idx]
        .trim()
        .to_string();
    let column = statement[add_idx + "ADD COLUMN".len()..]
        .split_whitespace()
        .next()?
        .to_string();

    if table.is_empty() || column.is_empty() {
        return None;
    }

    Some((table, column))
}

async fn column_exists(pool: &SqlitePool, table: &str, column: &str) -> DbResult<bool> {
    let count: i64 =
        sqlx::query_scalar("SELECT COUNT(*) FROM pragma_table_info(?1) WHERE name = ?2")
            .bind(table)
            .bind(column)
            .fetch_one(pool)
            .await?;

    Ok(count > 0)
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::{Database, DbConfig};

    async fn empty_db() -> Database {
        let config = DbConfig::in_memory().run_migrations(false);
        Database::new(config).await.unwrap()
    }

    #[test]
    fn statement_splitting_drops_comments_and_blanks() {
        let sql = "-- header comment\nCREATE TABLE a (id TEXT);\n\n-- another\nCREATE TABLE b (id TEXT);\n";
        let stmts = statements(sql);
        assert_eq!(stmts.len(), 2);
        assert!(stmts[0].starts_with("CREATE TABLE a"));
        assert!(stmts[1].starts_with("CREATE TABLE b"));
    }

    #[test]
    fn add_column_recognition() {
        assert_eq!(
            add_column_target("ALTER TABLE sales ADD COLUMN created_at TEXT"),
            Some(("sales".to_string(), "created_at".to_string()))
        );
        assert_eq!(add_column_target("CREATE TABLE x (id TEXT)"), None);
        assert_eq!(
            add_column_target("ALTER TABLE sales ADD COLUMN IF NOT EXISTS created_at TEXT"),
            None
        );
    }

    #[tokio::test]
    async fn second_run_applies_nothing_and_keeps_ledger() {
        let db = empty_db().await;

        let first = run_migrations(db.pool()).await.unwrap();
        assert_eq!(first, SCRIPTS.len());

        let ledger_before = applied_migrations(db.pool()).await.unwrap();
        assert_eq!(ledger_before.len(), SCRIPTS.len());

        let second = run_migrations(db.pool()).await.unwrap();
        assert_eq!(second, 0);

        let ledger_after = applied_migrations(db.pool()).await.unwrap();
        assert_eq!(ledger_before, ledger_after);
    }

    #[tokio::test]
    async fn status_reports_totals() {
        let db = empty_db().await;
        run_migrations(db.pool()).await.unwrap();

        let (total, applied) = migration_status(db.pool()).await.unwrap();
        assert_eq!(total, SCRIPTS.len());
        assert_eq!(applied, SCRIPTS.len());
    }

    #[tokio::test]
    async fn add_column_is_skipped_when_column_exists() {
        let db = empty_db().await;
        run_migrations(db.pool()).await.unwrap();

        // Forget that 003 ran. Its ADD COLUMN statements now target columns
        // that already exist and must be skipped, not fail.
        sqlx::query("DELETE FROM migrations WHERE name = '003_sale_timestamps.sql'")
            .execute(db.pool())
            .await
            .unwrap();

        let applied = run_migrations(db.pool()).await.unwrap();
        assert_eq!(applied, 1);

        assert!(column_exists(db.pool(), "sales", "created_at").await.unwrap());
        assert!(column_exists(db.pool(), "sales", "updated_at").await.unwrap());
    }

    #[tokio::test]
    async fn failure_reports_script_and_keeps_earlier_scripts_recorded() {
        let db = empty_db().await;

        let scripts: &[(&str, &str)] = &[
            ("001_ok.sql", "CREATE TABLE IF NOT EXISTS t1 (id TEXT)"),
            ("002_bad.sql", "CREATE TABLE IF NOT EXISTS t2 (id TEXT);\nTHIS IS NOT SQL"),
            ("003_never.sql", "CREATE TABLE IF NOT EXISTS t3 (id TEXT)"),
        ];

        let err = run_scripts(db.pool(), scripts).await.unwrap_err();
        match err {
            DbError::MigrationFailed { script, .. } => assert_eq!(script, "002_bad.sql"),
            other => panic!("unexpected error: {other}"),
        }

        // 001 stays recorded, 002 and 003 do not.
        let ledger = applied_migrations(db.pool()).await.unwrap();
        let names: Vec<&str> = ledger.iter().map(|m| m.name.as_str()).collect();
        assert_eq!(names, vec!["001_ok.sql"]);

        // 003 was never reached.
        let t3: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table' AND name = 't3'",
        )
        .fetch_one(db.pool())
        .await
        .unwrap();
        assert_eq!(t3, 0);
    }
}
