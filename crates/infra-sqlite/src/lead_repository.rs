// SQLite LeadRepository Implementation

use std::sync::Arc;

use async_trait::async_trait;
use chrono::NaiveDate;
use sqlx::SqlitePool;

use leadwatch_core::domain::{Lead, LeadId, StatusCode};
use leadwatch_core::error::Result;
use leadwatch_core::port::{Clock, LeadRepository};

use crate::map_sqlx_error;

pub struct SqliteLeadRepository {
    pool: SqlitePool,
    clock: Arc<dyn Clock>,
}

impl SqliteLeadRepository {
    pub fn new(pool: SqlitePool, clock: Arc<dyn Clock>) -> Self {
        Self { pool, clock }
    }
}

#[async_trait]
impl LeadRepository for SqliteLeadRepository {
    async fn upsert_batch(&self, leads: &[Lead]) -> Result<u64> {
        if leads.is_empty() {
            return Ok(0);
        }

        let imported_at = self.clock.now_utc();
        let mut tx = self.pool.begin().await.map_err(map_sqlx_error)?;
        let mut written = 0u64;

        for lead in leads {
            let result = sqlx::query(
                r#"
                INSERT INTO leads (id, status, date, webmaster, amount, comment, imported_at)
                VALUES (?, ?, ?, ?, ?, ?, ?)
                ON CONFLICT(id) DO UPDATE SET
                    status = excluded.status,
                    date = excluded.date,
                    webmaster = excluded.webmaster,
                    amount = excluded.amount,
                    comment = excluded.comment,
                    imported_at = excluded.imported_at
                "#,
            )
            .bind(lead.id)
            .bind(lead.status)
            .bind(lead.date)
            .bind(&lead.webmaster)
            .bind(lead.amount)
            .bind(&lead.comment)
            .bind(imported_at)
            .execute(&mut *tx)
            .await
            .map_err(map_sqlx_error)?;

            written += result.rows_affected();
        }

        tx.commit().await.map_err(map_sqlx_error)?;
        Ok(written)
    }

    async fn patch(
        &self,
        id: LeadId,
        status: Option<StatusCode>,
        comment: Option<&str>,
    ) -> Result<bool> {
        let result = sqlx::query(
            r#"
            UPDATE leads
            SET status = COALESCE(?, status),
                comment = COALESCE(?, comment)
            WHERE id = ?
            "#,
        )
        .bind(status)
        .bind(comment)
        .bind(id)
        .execute(&self.pool)
        .await
        .map_err(map_sqlx_error)?;

        Ok(result.rows_affected() > 0)
    }

    async fn fetch(&self, webmaster: Option<&str>, since: Option<NaiveDate>) -> Result<Vec<Lead>> {
        let rows: Vec<LeadRow> = sqlx::query_as(
            r#"
            SELECT id, status, date, webmaster, amount, comment
            FROM leads
            WHERE (? IS NULL OR webmaster = ?)
              AND (? IS NULL OR date >= ?)
            ORDER BY date ASC, id ASC
            "#,
        )
        .bind(webmaster)
        .bind(webmaster)
        .bind(since)
        .bind(since)
        .fetch_all(&self.pool)
        .await
        .map_err(map_sqlx_error)?;

        Ok(rows.into_iter().map(LeadRow::into_lead).collect())
    }
}

/// SQLite row representation
#[derive(Debug, sqlx::FromRow)]
struct LeadRow {
    id: i64,
    status: i32,
    date: NaiveDate,
    webmaster: String,
    amount: f64,
    comment: Option<String>,
}

impl LeadRow {
    fn into_lead(self) -> Lead {
        Lead {
            id: self.id,
            status: self.status,
            date: self.date,
            webmaster: self.webmaster,
            amount: self.amount,
            comment: self.comment,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{create_pool, run_migrations};
    use leadwatch_core::port::SystemClock;

    async fn repo() -> SqliteLeadRepository {
        let pool = create_pool("sqlite::memory:").await.unwrap();
        run_migrations(&pool).await.unwrap();
        SqliteLeadRepository::new(pool, Arc::new(SystemClock))
    }

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    fn lead(id: i64, status: i32, day: &str, webmaster: &str) -> Lead {
        Lead {
            id,
            status,
            date: date(day),
            webmaster: webmaster.to_string(),
            amount: 150.0,
            comment: None,
        }
    }

    #[tokio::test]
    async fn upsert_then_fetch_round_trips() {
        let repo = repo().await;
        let written = repo
            .upsert_batch(&[lead(1, 2, "2025-03-01", "wm-a"), lead(2, 6, "2025-03-02", "wm-b")])
            .await
            .unwrap();
        assert_eq!(written, 2);

        let all = repo.fetch(None, None).await.unwrap();
        assert_eq!(all.len(), 2);
        assert_eq!(all[0].id, 1);
        assert_eq!(all[0].amount, 150.0);
    }

    #[tokio::test]
    async fn upsert_same_id_replaces_row() {
        let repo = repo().await;
        repo.upsert_batch(&[lead(1, 2, "2025-03-01", "wm-a")])
            .await
            .unwrap();

        let mut changed = lead(1, 4, "2025-03-01", "wm-a");
        changed.comment = Some("bought".to_string());
        repo.upsert_batch(&[changed]).await.unwrap();

        let all = repo.fetch(None, None).await.unwrap();
        assert_eq!(all.len(), 1);
        assert_eq!(all[0].status, 4);
        assert_eq!(all[0].comment.as_deref(), Some("bought"));
    }

    #[tokio::test]
    async fn fetch_filters_by_webmaster_and_date() {
        let repo = repo().await;
        repo.upsert_batch(&[
            lead(1, 2, "2025-03-01", "wm-a"),
            lead(2, 2, "2025-03-10", "wm-a"),
            lead(3, 2, "2025-03-10", "wm-b"),
        ])
        .await
        .unwrap();

        let wm_a = repo.fetch(Some("wm-a"), None).await.unwrap();
        assert_eq!(wm_a.len(), 2);

        let recent = repo.fetch(None, Some(date("2025-03-05"))).await.unwrap();
        assert_eq!(recent.len(), 2);

        let both = repo
            .fetch(Some("wm-a"), Some(date("2025-03-05")))
            .await
            .unwrap();
        assert_eq!(both.len(), 1);
        assert_eq!(both[0].id, 2);
    }

    #[tokio::test]
    async fn patch_updates_only_provided_fields() {
        let repo = repo().await;
        let mut seeded = lead(1, 2, "2025-03-01", "wm-a");
        seeded.comment = Some("original".to_string());
        repo.upsert_batch(&[seeded]).await.unwrap();

        assert!(repo.patch(1, Some(7), None).await.unwrap());

        let all = repo.fetch(None, None).await.unwrap();
        assert_eq!(all[0].status, 7);
        assert_eq!(all[0].comment.as_deref(), Some("original"));
    }

    #[tokio::test]
    async fn patch_unknown_id_reports_false() {
        let repo = repo().await;
        assert!(!repo.patch(99, Some(4), None).await.unwrap());
    }
}
