// Report Repository Port (Interface)

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::Result;

/// A finished analysis run for one webmaster, ready to persist.
///
/// `buyout_pct` carries the maturity-adjusted value so stored reports stay
/// comparable across webmasters with different lead ages.
#[derive(Debug, Clone, PartialEq)]
pub struct NewReport {
    pub webmaster: String,
    pub period_days: i64,
    pub total_leads: i64,
    pub approved: i64,
    pub bought_out: i64,
    pub trash: i64,
    pub approve_pct: f64,
    pub buyout_pct: f64,
    pub trash_pct: f64,
    pub score_pct: Option<f64>,
    pub issues: Vec<String>,
}

/// A persisted report row
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportRecord {
    pub id: i64,
    pub webmaster: String,
    pub created_at: DateTime<Utc>,
    pub period_days: i64,
    pub total_leads: i64,
    pub approved: i64,
    pub bought_out: i64,
    pub trash: i64,
    pub approve_pct: f64,
    pub buyout_pct: f64,
    pub trash_pct: f64,
    pub score_pct: Option<f64>,
    pub issues: Vec<String>,
}

/// Latest known standing of one webmaster (one row per webmaster)
#[derive(Debug, Clone, PartialEq)]
pub struct NewStatus {
    pub webmaster: String,
    pub period_days: i64,
    pub total_leads: i64,
    pub approved: i64,
    pub bought_out: i64,
    pub trash: i64,
    pub approve_pct: f64,
    pub avg_approve_pct: f64,
    pub adj_buyout_pct: f64,
    pub trash_pct: f64,
    pub avg_trash_pct: f64,
    pub score_pct: Option<f64>,
    pub health_score: f64,
    pub ok: bool,
    pub issues: Vec<String>,
}

/// A persisted status row
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatusRow {
    pub webmaster: String,
    pub updated_at: DateTime<Utc>,
    pub period_days: i64,
    pub total_leads: i64,
    pub approved: i64,
    pub bought_out: i64,
    pub trash: i64,
    pub approve_pct: f64,
    pub avg_approve_pct: f64,
    pub adj_buyout_pct: f64,
    pub trash_pct: f64,
    pub avg_trash_pct: f64,
    pub score_pct: Option<f64>,
    pub health_score: f64,
    pub ok: bool,
    pub issues: Vec<String>,
}

/// Repository interface for report history and status persistence
#[async_trait]
pub trait ReportRepository: Send + Sync {
    /// Append a report to the history; returns the stored row
    async fn insert_report(&self, report: &NewReport) -> Result<ReportRecord>;

    /// List reports newest-first, optionally for one webmaster
    async fn list_reports(&self, webmaster: Option<&str>, limit: i64)
        -> Result<Vec<ReportRecord>>;

    /// Most recent report for one webmaster
    async fn latest_report(&self, webmaster: &str) -> Result<Option<ReportRecord>>;

    /// Insert or replace the current status of one webmaster
    async fn upsert_status(&self, status: &NewStatus) -> Result<()>;

    /// All status rows, problematic webmasters first
    async fn status_snapshot(&self) -> Result<Vec<StatusRow>>;

    /// Current status of one webmaster
    async fn get_status(&self, webmaster: &str) -> Result<Option<StatusRow>>;
}
