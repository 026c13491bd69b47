// Migration Runner
// Schema state lives in lw_schema_version. Early deployments tracked it as
// textual revision ids in a schema_migrations table; those rows get folded
// into the numeric table once, then the old table is dropped.

use sqlx::SqlitePool;
use tracing::info;

use leadwatch_core::error::Result;

use crate::map_sqlx_error;

/// Revision ids the old bookkeeping used, in apply order
const LEGACY_REVISIONS: [&str; 3] = ["b589e261f68f", "a1c3e9f72b44", "c7f2a1d8e345"];

/// Run database migrations
pub async fn run_migrations(pool: &SqlitePool) -> Result<()> {
    info!("Running database migrations...");

    fold_in_legacy_versions(pool).await?;

    let table_exists: i64 = sqlx::query_scalar(
        "SELECT COUNT(*) FROM sqlite_master WHERE type='table' AND name='lw_schema_version'",
    )
    .fetch_one(pool)
    .await
    .map_err(map_sqlx_error)?;

    let current_version: i64 = if table_exists > 0 {
        sqlx::query_scalar("SELECT version FROM lw_schema_version ORDER BY version DESC LIMIT 1")
            .fetch_optional(pool)
            .await
            .map_err(map_sqlx_error)?
            .unwrap_or(0)
    } else {
        0
    };

    info!("Current schema version: {}", current_version);

    if current_version < 1 {
        info!("Applying migration 001: Leads");
        apply_migration(pool, include_str!("../migrations/001_create_leads.sql")).await?;
    }

    if current_version < 2 {
        info!("Applying migration 002: Comments & report history");
        apply_migration(
            pool,
            include_str!("../migrations/002_comment_and_reports.sql"),
        )
        .await?;
    }

    if current_version < 3 {
        info!("Applying migration 003: Webmaster status");
        apply_migration(pool, include_str!("../migrations/003_webmaster_status.sql")).await?;
    }

    info!("All migrations applied successfully");
    Ok(())
}

/// Translate legacy revision rows into numeric versions, then drop the old
/// table. No-op when the legacy table is absent.
async fn fold_in_legacy_versions(pool: &SqlitePool) -> Result<()> {
    let legacy_exists: i64 = sqlx::query_scalar(
        "SELECT COUNT(*) FROM sqlite_master WHERE type='table' AND name='schema_migrations'",
    )
    .fetch_one(pool)
    .await
    .map_err(map_sqlx_error)?;

    if legacy_exists == 0 {
        return Ok(());
    }

    let revisions: Vec<String> = sqlx::query_scalar("SELECT version FROM schema_migrations")
        .fetch_all(pool)
        .await
        .map_err(map_sqlx_error)?;

    // Unknown revisions are ignored; the schema then re-migrates from what
    // the known ones prove is present.
    let reached = revisions
        .iter()
        .filter_map(|rev| {
            LEGACY_REVISIONS
                .iter()
                .position(|known| known == rev)
                .map(|pos| pos as i64 + 1)
        })
        .max()
        .unwrap_or(0);

    let mut tx = pool.begin().await.map_err(map_sqlx_error)?;

    sqlx::query(
        "CREATE TABLE IF NOT EXISTS lw_schema_version (
            version INTEGER PRIMARY KEY,
            applied_at TEXT NOT NULL DEFAULT (datetime('now'))
        )",
    )
    .execute(&mut *tx)
    .await
    .map_err(map_sqlx_error)?;

    for version in 1..=reached {
        sqlx::query("INSERT OR IGNORE INTO lw_schema_version (version) VALUES (?)")
            .bind(version)
            .execute(&mut *tx)
            .await
            .map_err(map_sqlx_error)?;
    }

    sqlx::query("DROP TABLE schema_migrations")
        .execute(&mut *tx)
        .await
        .map_err(map_sqlx_error)?;

    tx.commit().await.map_err(map_sqlx_error)?;

    info!(
        reached_version = reached,
        "Folded legacy schema_migrations into lw_schema_version"
    );
    Ok(())
}

/// Apply a single migration SQL file
async fn apply_migration(pool: &SqlitePool, sql: &str) -> Result<()> {
    let mut tx = pool.begin().await.map_err(map_sqlx_error)?;

    // Split by semicolon and execute each statement
    for statement in sql.split(';') {
        let clean_statement: String = statement
            .lines()
            .filter(|line| !line.trim().starts_with("--"))
            .collect::<Vec<_>>()
            .join("\n")
            .trim()
            .to_string();

        if !clean_statement.is_empty() {
            sqlx::query(&clean_statement)
                .execute(&mut *tx)
                .await
                .map_err(map_sqlx_error)?;
        }
    }

    tx.commit().await.map_err(map_sqlx_error)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::create_pool;

    async fn version_of(pool: &SqlitePool) -> i64 {
        sqlx::query_scalar("SELECT version FROM lw_schema_version ORDER BY version DESC LIMIT 1")
            .fetch_one(pool)
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_run_migrations() {
        let pool = create_pool("sqlite::memory:").await.unwrap();
        run_migrations(&pool).await.unwrap();

        for table in ["leads", "webmaster_reports", "webmaster_status"] {
            let count: i64 = sqlx::query_scalar(&format!("SELECT COUNT(*) FROM {table}"))
                .fetch_one(&pool)
                .await
                .unwrap();
            assert_eq!(count, 0, "{table} should exist and be empty");
        }
        assert_eq!(version_of(&pool).await, 3);
    }

    #[tokio::test]
    async fn test_migrations_are_idempotent() {
        let pool = create_pool("sqlite::memory:").await.unwrap();
        run_migrations(&pool).await.unwrap();
        run_migrations(&pool).await.unwrap();

        let rows: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM lw_schema_version")
            .fetch_one(&pool)
            .await
            .unwrap();
        assert_eq!(rows, 3);
    }

    #[tokio::test]
    async fn test_legacy_versions_fold_in_and_migration_continues() {
        let pool = create_pool("sqlite::memory:").await.unwrap();

        // A database left behind by the old bookkeeping at revision 1:
        // leads exists without the comment column.
        sqlx::query(
            "CREATE TABLE leads (
                id INTEGER PRIMARY KEY,
                status INTEGER NOT NULL,
                date TEXT NOT NULL,
                webmaster TEXT NOT NULL,
                amount REAL NOT NULL DEFAULT 0,
                imported_at TEXT NOT NULL
            )",
        )
        .execute(&pool)
        .await
        .unwrap();
        sqlx::query("CREATE TABLE schema_migrations (version TEXT PRIMARY KEY)")
            .execute(&pool)
            .await
            .unwrap();
        sqlx::query("INSERT INTO schema_migrations (version) VALUES ('b589e261f68f')")
            .execute(&pool)
            .await
            .unwrap();

        run_migrations(&pool).await.unwrap();

        // Legacy table gone, numeric bookkeeping at 3
        let legacy: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM sqlite_master WHERE type='table' AND name='schema_migrations'",
        )
        .fetch_one(&pool)
        .await
        .unwrap();
        assert_eq!(legacy, 0);
        assert_eq!(version_of(&pool).await, 3);

        // Migration 002 ran on top of the legacy schema: comment exists now
        sqlx::query(
            "INSERT INTO leads (id, status, date, webmaster, amount, imported_at, comment)
             VALUES (1, 2, '2025-01-01', 'wm', 0, '2025-01-01T00:00:00Z', 'kept')",
        )
        .execute(&pool)
        .await
        .unwrap();
    }
}
