//! Wire types for the Leadwatch JSON-RPC API.
//!
//! Mirrors the server's request and response shapes so the SDK stays free
//! of the daemon's internal crates. Dates travel as ISO-8601 strings.

use serde::{Deserialize, Serialize};

/// One lead row for [`crate::LeadwatchClient::ingest`]
#[derive(Debug, Clone, Serialize)]
pub struct LeadRow {
    /// CRM lead id, unique across the fleet
    pub id: i64,
    /// Raw CRM status code
    pub status: i32,
    /// Lead date, e.g. `"2025-08-01"`
    pub date: String,
    pub webmaster: String,
    pub amount: f64,
    pub comment: Option<String>,
}

/// Response from an ingest batch
#[derive(Debug, Clone, Deserialize)]
pub struct IngestResponse {
    pub received: u64,
    pub upserted: u64,
    pub skipped: u64,
}

/// Response from a server-side file import
#[derive(Debug, Clone, Deserialize)]
pub struct ImportResponse {
    pub path: String,
    pub received: u64,
    pub upserted: u64,
    pub skipped: u64,
}

/// Response from a lead patch
#[derive(Debug, Clone, Deserialize)]
pub struct PatchResponse {
    pub id: i64,
    pub patched: bool,
}

/// One webmaster's counters and percentage shares
#[derive(Debug, Clone, Deserialize)]
pub struct WebmasterMetrics {
    pub webmaster: String,
    pub total: u64,
    pub approved: u64,
    pub bought_out: u64,
    pub trash: u64,
    pub approve_pct: f64,
    pub buyout_pct: f64,
    pub trash_pct: f64,
}

/// Response from the fleet summary
#[derive(Debug, Clone, Deserialize)]
pub struct SummaryResponse {
    pub period_days: i64,
    pub webmasters: Vec<WebmasterMetrics>,
}

/// One day-cohort inside a score card
#[derive(Debug, Clone, Deserialize)]
pub struct CohortRow {
    pub date: String,
    pub age_days: i64,
    pub leads: u64,
    pub approved: u64,
    pub bought_out: u64,
    pub actual_buyout_rate: f64,
    pub benchmark_rate: f64,
    pub weighted_actual: f64,
    pub weighted_benchmark: f64,
}

/// Age-weighted buyout score for one webmaster
#[derive(Debug, Clone, Deserialize)]
pub struct ScoreCard {
    pub webmaster: String,
    pub analysis_date: String,
    pub cohorts: Vec<CohortRow>,
    pub numerator: f64,
    pub denominator: f64,
    pub score: f64,
    pub score_pct: f64,
}

/// Response from the score endpoint
#[derive(Debug, Clone, Deserialize)]
pub struct ScoreResponse {
    pub card: ScoreCard,
}

/// Response from the last-N metrics endpoint
#[derive(Debug, Clone, Deserialize)]
pub struct LastNResponse {
    pub n: usize,
    pub metrics: WebmasterMetrics,
}

/// Counters for one day of one webmaster's leads
#[derive(Debug, Clone, Deserialize)]
pub struct DailyRow {
    pub date: String,
    pub leads: u64,
    pub approved: u64,
    pub bought_out: u64,
    pub trash: u64,
    pub approve_pct: f64,
    pub buyout_pct: f64,
    pub trash_pct: f64,
}

/// Response from the daily breakdown endpoint
#[derive(Debug, Clone, Deserialize)]
pub struct DailyResponse {
    pub webmaster: String,
    pub period_days: i64,
    pub days: Vec<DailyRow>,
}

/// Full verdict for one webmaster from a report run
#[derive(Debug, Clone, Deserialize)]
pub struct WebmasterAnalysis {
    pub webmaster: String,
    pub total_leads: u64,
    pub approved: u64,
    pub bought_out: u64,
    pub trash: u64,
    pub approve_pct: f64,
    pub buyout_pct: f64,
    pub adj_buyout_pct: f64,
    pub trash_pct: f64,
    pub score_pct: Option<f64>,
    pub health_score: f64,
    /// `"green"`, `"yellow"` or `"red"`
    pub band: String,
    pub ok: bool,
    pub issues: Vec<String>,
    pub report_id: Option<i64>,
    pub report_created_at: Option<String>,
}

/// Response from an on-demand report run
#[derive(Debug, Clone, Deserialize)]
pub struct RunReportsResponse {
    pub period_days: i64,
    pub analysed: usize,
    pub flagged: usize,
    pub webmasters: Vec<WebmasterAnalysis>,
}

/// One persisted report row
#[derive(Debug, Clone, Deserialize)]
pub struct ReportRecord {
    pub id: i64,
    pub webmaster: String,
    pub created_at: String,
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

/// Response from the report history listing
#[derive(Debug, Clone, Deserialize)]
pub struct ListReportsResponse {
    pub count: usize,
    pub reports: Vec<ReportRecord>,
}

/// Response carrying a webmaster's newest report
#[derive(Debug, Clone, Deserialize)]
pub struct LatestReportResponse {
    pub report: ReportRecord,
}

/// Latest known standing of one webmaster
#[derive(Debug, Clone, Deserialize)]
pub struct StatusRow {
    pub webmaster: String,
    pub updated_at: String,
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

/// Response from the status board snapshot
#[derive(Debug, Clone, Deserialize)]
pub struct StatusSnapshotResponse {
    pub count: usize,
    pub webmasters: Vec<StatusRow>,
}

/// Response carrying one webmaster's status row
#[derive(Debug, Clone, Deserialize)]
pub struct StatusGetResponse {
    pub status: StatusRow,
}

/// One reporting dataset definition
#[derive(Debug, Clone, Deserialize)]
pub struct DatasetSpec {
    pub name: String,
    pub title: String,
    pub description: String,
    pub columns: Vec<String>,
    pub sql: String,
}

/// Response listing the reporting datasets
#[derive(Debug, Clone, Deserialize)]
pub struct DatasetsListResponse {
    pub count: usize,
    pub datasets: Vec<DatasetSpec>,
}

/// Response from running one dataset
#[derive(Debug, Clone, Deserialize)]
pub struct DatasetsRunResponse {
    pub name: String,
    pub columns: Vec<String>,
    pub count: usize,
    pub rows: Vec<serde_json::Value>,
}

/// Response from the daemon statistics endpoint
#[derive(Debug, Clone, Deserialize)]
pub struct StatsResponse {
    pub leads_total: i64,
    pub reports_total: i64,
    pub webmasters_tracked: i64,
    pub db_size_bytes: i64,
    pub uptime_seconds: i64,
}
