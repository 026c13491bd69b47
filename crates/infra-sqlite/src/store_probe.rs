// Store Probe - DB size and row counts for the admin surface

use async_trait::async_trait;
use sqlx::SqlitePool;

use leadwatch_core::error::Result;
use leadwatch_core::port::{StoreProbe, StoreStats};

use crate::map_sqlx_error;

pub struct SqliteStoreProbe {
    pool: SqlitePool,
}

impl SqliteStoreProbe {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    async fn db_size_bytes(&self) -> Result<i64> {
        let page_count: i64 = sqlx::query_scalar("PRAGMA page_count")
            .fetch_one(&self.pool)
            .await
            .map_err(map_sqlx_error)?;
        let page_size: i64 = sqlx::query_scalar("PRAGMA page_size")
            .fetch_one(&self.pool)
            .await
            .map_err(map_sqlx_error)?;
        Ok(page_count * page_size)
    }

    async fn table_count(&self, sql: &str) -> Result<i64> {
        sqlx::query_scalar(sql)
            .fetch_one(&self.pool)
            .await
            .map_err(map_sqlx_error)
    }
}

#[async_trait]
impl StoreProbe for SqliteStoreProbe {
    async fn stats(&self) -> Result<StoreStats> {
        Ok(StoreStats {
            db_size_bytes: self.db_size_bytes().await?,
            leads_total: self.table_count("SELECT COUNT(*) FROM leads").await?,
            reports_total: self
                .table_count("SELECT COUNT(*) FROM webmaster_reports")
                .await?,
            webmasters_tracked: self
                .table_count("SELECT COUNT(*) FROM webmaster_status")
                .await?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{create_pool, run_migrations};

    #[tokio::test]
    async fn stats_reflect_row_counts() {
        let pool = create_pool("sqlite::memory:").await.unwrap();
        run_migrations(&pool).await.unwrap();

        sqlx::query(
            "INSERT INTO leads (id, status, date, webmaster, amount, imported_at)
             VALUES (1, 2, '2025-03-15', 'wm-a', 10.0, '2025-03-15T00:00:00Z'),
                    (2, 4, '2025-03-16', 'wm-a', 20.0, '2025-03-16T00:00:00Z')",
        )
        .execute(&pool)
        .await
        .unwrap();

        let probe = SqliteStoreProbe::new(pool);
        let stats = probe.stats().await.unwrap();

        assert_eq!(stats.leads_total, 2);
        assert_eq!(stats.reports_total, 0);
        assert_eq!(stats.webmasters_tracked, 0);
        assert!(stats.db_size_bytes > 0);
    }
}
