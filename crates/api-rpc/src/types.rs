//! RPC Request/Response Types
//!
//! One request/response pair per JSON-RPC method. Requests whose fields are
//! all optional implement `Default` with the same values serde fills in, so
//! calls with omitted params behave like calls with an empty object.

use serde::{Deserialize, Serialize};

use leadwatch_core::application::WebmasterAnalysis;
use leadwatch_core::domain::{DailyRow, LeadDraft, ScoreCard, WebmasterMetrics};
use leadwatch_core::port::{DatasetSpec, ReportRecord, StatusRow};

fn default_period_days() -> i64 {
    30
}

fn default_last_n() -> usize {
    100
}

fn default_report_limit() -> i64 {
    50
}

/// leads.ingest.v1 - Upsert a batch of leads
#[derive(Debug, Deserialize)]
pub struct IngestRequest {
    pub leads: Vec<LeadDraft>,
}

#[derive(Debug, Clone, Serialize)]
pub struct IngestResponse {
    pub received: u64,
    pub upserted: u64,
    pub skipped: u64,
}

/// leads.import.v1 - Import a CSV export readable by the daemon
#[derive(Debug, Deserialize)]
pub struct ImportRequest {
    pub path: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct ImportResponse {
    pub path: String,
    pub received: u64,
    pub upserted: u64,
    pub skipped: u64,
}

/// leads.patch.v1 - Correct status and/or comment of one lead
#[derive(Debug, Deserialize)]
pub struct PatchRequest {
    pub id: i64,
    pub status: Option<i32>,
    pub comment: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct PatchResponse {
    pub id: i64,
    pub patched: bool,
}

/// analysis.summary.v1 - Per-webmaster metrics over the trailing period
#[derive(Debug, Deserialize)]
pub struct SummaryRequest {
    #[serde(default = "default_period_days")]
    pub period_days: i64,
}

impl Default for SummaryRequest {
    fn default() -> Self {
        Self {
            period_days: default_period_days(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct SummaryResponse {
    pub period_days: i64,
    pub webmasters: Vec<WebmasterMetrics>,
}

/// analysis.score.v1 - 8-day weighted buyout score for one webmaster
#[derive(Debug, Deserialize)]
pub struct ScoreRequest {
    pub webmaster: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct ScoreResponse {
    pub card: ScoreCard,
}

/// analysis.last_n.v1 - Metrics over the most recent N leads
#[derive(Debug, Deserialize)]
pub struct LastNRequest {
    pub webmaster: String,
    #[serde(default = "default_last_n")]
    pub n: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct LastNResponse {
    pub n: usize,
    pub metrics: WebmasterMetrics,
}

/// analysis.daily.v1 - Day-by-day counters for one webmaster
#[derive(Debug, Deserialize)]
pub struct DailyRequest {
    pub webmaster: String,
    #[serde(default = "default_period_days")]
    pub period_days: i64,
}

#[derive(Debug, Clone, Serialize)]
pub struct DailyResponse {
    pub webmaster: String,
    pub period_days: i64,
    pub days: Vec<DailyRow>,
}

/// reports.run.v1 - Analyse now and persist report + status rows
#[derive(Debug, Deserialize)]
pub struct RunReportsRequest {
    #[serde(default = "default_period_days")]
    pub period_days: i64,
    pub webmaster: Option<String>,
}

impl Default for RunReportsRequest {
    fn default() -> Self {
        Self {
            period_days: default_period_days(),
            webmaster: None,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct RunReportsResponse {
    pub period_days: i64,
    pub analysed: usize,
    pub flagged: usize,
    pub webmasters: Vec<WebmasterAnalysis>,
}

/// reports.list.v1 - Stored reports, newest first
#[derive(Debug, Deserialize)]
pub struct ListReportsRequest {
    pub webmaster: Option<String>,
    #[serde(default = "default_report_limit")]
    pub limit: i64,
}

impl Default for ListReportsRequest {
    fn default() -> Self {
        Self {
            webmaster: None,
            limit: default_report_limit(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ListReportsResponse {
    pub count: usize,
    pub reports: Vec<ReportRecord>,
}

/// reports.latest.v1 - Most recent report for one webmaster
#[derive(Debug, Deserialize)]
pub struct LatestReportRequest {
    pub webmaster: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct LatestReportResponse {
    pub report: ReportRecord,
}

/// status.snapshot.v1 - Current standing of every webmaster
#[derive(Debug, Default, Deserialize)]
pub struct StatusSnapshotRequest {
    /// Only return webmasters with open issues
    #[serde(default)]
    pub only_issues: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct StatusSnapshotResponse {
    pub count: usize,
    pub webmasters: Vec<StatusRow>,
}

/// status.get.v1 - Current standing of one webmaster
#[derive(Debug, Deserialize)]
pub struct StatusGetRequest {
    pub webmaster: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct StatusGetResponse {
    pub status: StatusRow,
}

/// datasets.list.v1 - Available reporting datasets
#[derive(Debug, Default, Deserialize)]
pub struct DatasetsListRequest {}

#[derive(Debug, Clone, Serialize)]
pub struct DatasetsListResponse {
    pub count: usize,
    pub datasets: Vec<DatasetSpec>,
}

/// datasets.run.v1 - Execute one dataset and return its rows
#[derive(Debug, Deserialize)]
pub struct DatasetsRunRequest {
    pub name: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct DatasetsRunResponse {
    pub name: String,
    pub columns: Vec<String>,
    pub count: usize,
    pub rows: Vec<serde_json::Value>,
}

/// admin.stats.v1 - Store totals and daemon uptime
#[derive(Debug, Default, Deserialize)]
pub struct AdminStatsRequest {}

#[derive(Debug, Clone, Serialize)]
pub struct AdminStatsResponse {
    pub leads_total: i64,
    pub reports_total: i64,
    pub webmasters_tracked: i64,
    pub db_size_bytes: i64,
    pub uptime_seconds: i64,
}
