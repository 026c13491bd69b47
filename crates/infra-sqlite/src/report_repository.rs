// SQLite ReportRepository Implementation

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::SqlitePool;

use leadwatch_core::error::Result;
use leadwatch_core::port::{Clock, NewReport, NewStatus, ReportRecord, ReportRepository, StatusRow};

use crate::map_sqlx_error;

pub struct SqliteReportRepository {
    pool: SqlitePool,
    clock: Arc<dyn Clock>,
}

impl SqliteReportRepository {
    pub fn new(pool: SqlitePool, clock: Arc<dyn Clock>) -> Self {
        Self { pool, clock }
    }
}

#[async_trait]
impl ReportRepository for SqliteReportRepository {
    async fn insert_report(&self, report: &NewReport) -> Result<ReportRecord> {
        let created_at = self.clock.now_utc();
        let issues = serde_json::to_string(&report.issues)?;

        let result = sqlx::query(
            r#"
            INSERT INTO webmaster_reports (
                webmaster, created_at, period_days,
                total_leads, approved, bought_out, trash,
                approve_pct, buyout_pct, trash_pct, score_pct, issues
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&report.webmaster)
        .bind(created_at)
        .bind(report.period_days)
        .bind(report.total_leads)
        .bind(report.approved)
        .bind(report.bought_out)
        .bind(report.trash)
        .bind(report.approve_pct)
        .bind(report.buyout_pct)
        .bind(report.trash_pct)
        .bind(report.score_pct)
        .bind(&issues)
        .execute(&self.pool)
        .await
        .map_err(map_sqlx_error)?;

        Ok(ReportRecord {
            id: result.last_insert_rowid(),
            webmaster: report.webmaster.clone(),
            created_at,
            period_days: report.period_days,
            total_leads: report.total_leads,
            approved: report.approved,
            bought_out: report.bought_out,
            trash: report.trash,
            approve_pct: report.approve_pct,
            buyout_pct: report.buyout_pct,
            trash_pct: report.trash_pct,
            score_pct: report.score_pct,
            issues: report.issues.clone(),
        })
    }

    async fn list_reports(
        &self,
        webmaster: Option<&str>,
        limit: i64,
    ) -> Result<Vec<ReportRecord>> {
        // SQLite treats a negative LIMIT as "no limit"
        let limit = if limit > 0 { limit } else { -1 };

        let rows: Vec<ReportRow> = sqlx::query_as(
            r#"
            SELECT id, webmaster, created_at, period_days,
                   total_leads, approved, bought_out, trash,
                   approve_pct, buyout_pct, trash_pct, score_pct, issues
            FROM webmaster_reports
            WHERE (? IS NULL OR webmaster = ?)
            ORDER BY created_at DESC, id DESC
            LIMIT ?
            "#,
        )
        .bind(webmaster)
        .bind(webmaster)
        .bind(limit)
        .fetch_all(&self.pool)
        .await
        .map_err(map_sqlx_error)?;

        rows.into_iter().map(ReportRow::into_record).collect()
    }

    async fn latest_report(&self, webmaster: &str) -> Result<Option<ReportRecord>> {
        let row: Option<ReportRow> = sqlx::query_as(
            r#"
            SELECT id, webmaster, created_at, period_days,
                   total_leads, approved, bought_out, trash,
                   approve_pct, buyout_pct, trash_pct, score_pct, issues
            FROM webmaster_reports
            WHERE webmaster = ?
            ORDER BY created_at DESC, id DESC
            LIMIT 1
            "#,
        )
        .bind(webmaster)
        .fetch_optional(&self.pool)
        .await
        .map_err(map_sqlx_error)?;

        row.map(ReportRow::into_record).transpose()
    }

    async fn upsert_status(&self, status: &NewStatus) -> Result<()> {
        let updated_at = self.clock.now_utc();
        let issues = serde_json::to_string(&status.issues)?;

        sqlx::query(
            r#"
            INSERT INTO webmaster_status (
                webmaster, updated_at, period_days,
                total_leads, approved, bought_out, trash,
                approve_pct, avg_approve_pct, adj_buyout_pct,
                trash_pct, avg_trash_pct, score_pct,
                health_score, ok, issues
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            ON CONFLICT(webmaster) DO UPDATE SET
                updated_at = excluded.updated_at,
                period_days = excluded.period_days,
                total_leads = excluded.total_leads,
                approved = excluded.approved,
                bought_out = excluded.bought_out,
                trash = excluded.trash,
                approve_pct = excluded.approve_pct,
                avg_approve_pct = excluded.avg_approve_pct,
                adj_buyout_pct = excluded.adj_buyout_pct,
                trash_pct = excluded.trash_pct,
                avg_trash_pct = excluded.avg_trash_pct,
                score_pct = excluded.score_pct,
                health_score = excluded.health_score,
                ok = excluded.ok,
                issues = excluded.issues
            "#,
        )
        .bind(&status.webmaster)
        .bind(updated_at)
        .bind(status.period_days)
        .bind(status.total_leads)
        .bind(status.approved)
        .bind(status.bought_out)
        .bind(status.trash)
        .bind(status.approve_pct)
        .bind(status.avg_approve_pct)
        .bind(status.adj_buyout_pct)
        .bind(status.trash_pct)
        .bind(status.avg_trash_pct)
        .bind(status.score_pct)
        .bind(status.health_score)
        .bind(status.ok)
        .bind(&issues)
        .execute(&self.pool)
        .await
        .map_err(map_sqlx_error)?;

        Ok(())
    }

    async fn status_snapshot(&self) -> Result<Vec<StatusRow>> {
        let rows: Vec<StatusRowDb> = sqlx::query_as(
            r#"
            SELECT webmaster, updated_at, period_days,
                   total_leads, approved, bought_out, trash,
                   approve_pct, avg_approve_pct, adj_buyout_pct,
                   trash_pct, avg_trash_pct, score_pct,
                   health_score, ok, issues
            FROM webmaster_status
            ORDER BY ok ASC, webmaster ASC
            "#,
        )
        .fetch_all(&self.pool)
        .await
        .map_err(map_sqlx_error)?;

        rows.into_iter().map(StatusRowDb::into_status).collect()
    }

    async fn get_status(&self, webmaster: &str) -> Result<Option<StatusRow>> {
        let row: Option<StatusRowDb> = sqlx::query_as(
            r#"
            SELECT webmaster, updated_at, period_days,
                   total_leads, approved, bought_out, trash,
                   approve_pct, avg_approve_pct, adj_buyout_pct,
                   trash_pct, avg_trash_pct, score_pct,
                   health_score, ok, issues
            FROM webmaster_status
            WHERE webmaster = ?
            "#,
        )
        .bind(webmaster)
        .fetch_optional(&self.pool)
        .await
        .map_err(map_sqlx_error)?;

        row.map(StatusRowDb::into_status).transpose()
    }
}

/// SQLite row representation
#[derive(Debug, sqlx::FromRow)]
struct ReportRow {
    id: i64,
    webmaster: String,
    created_at: DateTime<Utc>,
    period_days: i64,
    total_leads: i64,
    approved: i64,
    bought_out: i64,
    trash: i64,
    approve_pct: f64,
    buyout_pct: f64,
    trash_pct: f64,
    score_pct: Option<f64>,
    issues: String,
}

impl ReportRow {
    fn into_record(self) -> Result<ReportRecord> {
        Ok(ReportRecord {
            id: self.id,
            webmaster: self.webmaster,
            created_at: self.created_at,
            period_days: self.period_days,
            total_leads: self.total_leads,
            approved: self.approved,
            bought_out: self.bought_out,
            trash: self.trash,
            approve_pct: self.approve_pct,
            buyout_pct: self.buyout_pct,
            trash_pct: self.trash_pct,
            score_pct: self.score_pct,
            issues: serde_json::from_str(&self.issues)?,
        })
    }
}

#[derive(Debug, sqlx::FromRow)]
struct StatusRowDb {
    webmaster: String,
    updated_at: DateTime<Utc>,
    period_days: i64,
    total_leads: i64,
    approved: i64,
    bought_out: i64,
    trash: i64,
    approve_pct: f64,
    avg_approve_pct: f64,
    adj_buyout_pct: f64,
    trash_pct: f64,
    avg_trash_pct: f64,
    score_pct: Option<f64>,
    health_score: f64,
    ok: bool,
    issues: String,
}

impl StatusRowDb {
    fn into_status(self) -> Result<StatusRow> {
        Ok(StatusRow {
            webmaster: self.webmaster,
            updated_at: self.updated_at,
            period_days: self.period_days,
            total_leads: self.total_leads,
            approved: self.approved,
            bought_out: self.bought_out,
            trash: self.trash,
            approve_pct: self.approve_pct,
            avg_approve_pct: self.avg_approve_pct,
            adj_buyout_pct: self.adj_buyout_pct,
            trash_pct: self.trash_pct,
            avg_trash_pct: self.avg_trash_pct,
            score_pct: self.score_pct,
            health_score: self.health_score,
            ok: self.ok,
            issues: serde_json::from_str(&self.issues)?,
        })
    }
}
