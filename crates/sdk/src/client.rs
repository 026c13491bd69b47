//! Leadwatch client implementation.

use std::time::Duration;

use jsonrpsee::core::client::ClientT;
use jsonrpsee::core::params::ObjectParams;
use jsonrpsee::http_client::{HttpClient, HttpClientBuilder};

use crate::error::{Result, SdkError};
use crate::types::{
    DailyResponse, DatasetsListResponse, DatasetsRunResponse, IngestResponse, ImportResponse,
    LastNResponse, LatestReportResponse, LeadRow, ListReportsResponse, PatchResponse,
    RunReportsResponse, ScoreResponse, StatsResponse, StatusGetResponse, StatusSnapshotResponse,
    SummaryResponse,
};

/// Leadwatch daemon client
///
/// Every call sends params as a single named-field object, which is the
/// only shape the daemon accepts.
///
/// # Example
///
/// ```no_run
/// use leadwatch_sdk::LeadwatchClient;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let client = LeadwatchClient::connect("http://127.0.0.1:9620").await?;
/// # Ok(())
/// # }
/// ```
pub struct LeadwatchClient {
    client: HttpClient,
}

impl LeadwatchClient {
    /// Connect to a Leadwatch daemon
    ///
    /// # Arguments
    ///
    /// * `url` - RPC endpoint URL (e.g., `http://127.0.0.1:9620`)
    pub async fn connect(url: impl AsRef<str>) -> Result<Self> {
        let url = url.as_ref();

        let client = HttpClientBuilder::default()
            .request_timeout(Duration::from_secs(30))
            .build(url)
            .map_err(|e| SdkError::Connection(format!("Failed to create client: {}", e)))?;

        Ok(Self { client })
    }

    /// Ingest a batch of leads
    ///
    /// Rows already present are updated in place, so replaying an export
    /// is safe.
    ///
    /// # Example
    ///
    /// ```no_run
    /// # use leadwatch_sdk::{LeadwatchClient, LeadRow};
    /// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
    /// # let client = LeadwatchClient::connect("http://127.0.0.1:9620").await?;
    /// let response = client
    ///     .ingest(vec![LeadRow {
    ///         id: 501,
    ///         status: 2,
    ///         date: "2025-08-01".to_string(),
    ///         webmaster: "wm-north".to_string(),
    ///         amount: 120.0,
    ///         comment: None,
    ///     }])
    ///     .await?;
    ///
    /// println!("upserted {} leads", response.upserted);
    /// # Ok(())
    /// # }
    /// ```
    pub async fn ingest(&self, leads: Vec<LeadRow>) -> Result<IngestResponse> {
        let mut params = ObjectParams::new();
        params.insert("leads", leads)?;
        let response: IngestResponse = self.client.request("leads.ingest.v1", params).await?;

        Ok(response)
    }

    /// Import a CSV file readable by the daemon
    pub async fn import(&self, path: impl Into<String>) -> Result<ImportResponse> {
        let mut params = ObjectParams::new();
        params.insert("path", path.into())?;
        let response: ImportResponse = self.client.request("leads.import.v1", params).await?;

        Ok(response)
    }

    /// Patch one lead's status and/or comment
    pub async fn patch(
        &self,
        id: i64,
        status: Option<i32>,
        comment: Option<&str>,
    ) -> Result<PatchResponse> {
        let mut params = ObjectParams::new();
        params.insert("id", id)?;
        if let Some(status) = status {
            params.insert("status", status)?;
        }
        if let Some(comment) = comment {
            params.insert("comment", comment)?;
        }
        let response: PatchResponse = self.client.request("leads.patch.v1", params).await?;

        Ok(response)
    }

    /// Per-webmaster metrics over a trailing window
    ///
    /// `period_days` falls back to the server default (30 days) when `None`.
    ///
    /// # Example
    ///
    /// ```no_run
    /// # use leadwatch_sdk::LeadwatchClient;
    /// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
    /// # let client = LeadwatchClient::connect("http://127.0.0.1:9620").await?;
    /// let summary = client.summary(Some(7)).await?;
    /// for row in summary.webmasters {
    ///     println!("{}: {:.1}% approved", row.webmaster, row.approve_pct);
    /// }
    /// # Ok(())
    /// # }
    /// ```
    pub async fn summary(&self, period_days: Option<i64>) -> Result<SummaryResponse> {
        let mut params = ObjectParams::new();
        if let Some(days) = period_days {
            params.insert("period_days", days)?;
        }
        let response: SummaryResponse = self.client.request("analysis.summary.v1", params).await?;

        Ok(response)
    }

    /// Age-weighted buyout score for one webmaster
    pub async fn score(&self, webmaster: impl Into<String>) -> Result<ScoreResponse> {
        let mut params = ObjectParams::new();
        params.insert("webmaster", webmaster.into())?;
        let response: ScoreResponse = self.client.request("analysis.score.v1", params).await?;

        Ok(response)
    }

    /// Metrics over a webmaster's most recent leads
    ///
    /// `n` falls back to the server default (100 leads) when `None`.
    pub async fn last_n(
        &self,
        webmaster: impl Into<String>,
        n: Option<usize>,
    ) -> Result<LastNResponse> {
        let mut params = ObjectParams::new();
        params.insert("webmaster", webmaster.into())?;
        if let Some(n) = n {
            params.insert("n", n)?;
        }
        let response: LastNResponse = self.client.request("analysis.last_n.v1", params).await?;

        Ok(response)
    }

    /// Day-by-day counters for one webmaster over the trailing period
    pub async fn daily(
        &self,
        webmaster: impl Into<String>,
        period_days: Option<i64>,
    ) -> Result<DailyResponse> {
        let mut params = ObjectParams::new();
        params.insert("webmaster", webmaster.into())?;
        if let Some(days) = period_days {
            params.insert("period_days", days)?;
        }
        let response: DailyResponse = self.client.request("analysis.daily.v1", params).await?;

        Ok(response)
    }

    /// Analyse the fleet now and persist report and status rows
    ///
    /// With `webmaster` set, only that webmaster's rows are written,
    /// though fleet averages still come from everyone.
    pub async fn run_reports(
        &self,
        period_days: Option<i64>,
        webmaster: Option<&str>,
    ) -> Result<RunReportsResponse> {
        let mut params = ObjectParams::new();
        if let Some(days) = period_days {
            params.insert("period_days", days)?;
        }
        if let Some(webmaster) = webmaster {
            params.insert("webmaster", webmaster)?;
        }
        let response: RunReportsResponse = self.client.request("reports.run.v1", params).await?;

        Ok(response)
    }

    /// Saved report history, newest first
    pub async fn list_reports(
        &self,
        webmaster: Option<&str>,
        limit: Option<i64>,
    ) -> Result<ListReportsResponse> {
        let mut params = ObjectParams::new();
        if let Some(webmaster) = webmaster {
            params.insert("webmaster", webmaster)?;
        }
        if let Some(limit) = limit {
            params.insert("limit", limit)?;
        }
        let response: ListReportsResponse = self.client.request("reports.list.v1", params).await?;

        Ok(response)
    }

    /// Newest saved report for one webmaster
    pub async fn latest_report(
        &self,
        webmaster: impl Into<String>,
    ) -> Result<LatestReportResponse> {
        let mut params = ObjectParams::new();
        params.insert("webmaster", webmaster.into())?;
        let response: LatestReportResponse =
            self.client.request("reports.latest.v1", params).await?;

        Ok(response)
    }

    /// Status board snapshot, problematic webmasters first
    pub async fn status_snapshot(&self, only_issues: bool) -> Result<StatusSnapshotResponse> {
        let mut params = ObjectParams::new();
        params.insert("only_issues", only_issues)?;
        let response: StatusSnapshotResponse =
            self.client.request("status.snapshot.v1", params).await?;

        Ok(response)
    }

    /// Current standing of one webmaster
    pub async fn status_get(&self, webmaster: impl Into<String>) -> Result<StatusGetResponse> {
        let mut params = ObjectParams::new();
        params.insert("webmaster", webmaster.into())?;
        let response: StatusGetResponse = self.client.request("status.get.v1", params).await?;

        Ok(response)
    }

    /// List the reporting datasets behind the BI dashboards
    pub async fn datasets_list(&self) -> Result<DatasetsListResponse> {
        let params = ObjectParams::new();
        let response: DatasetsListResponse =
            self.client.request("datasets.list.v1", params).await?;

        Ok(response)
    }

    /// Run one reporting dataset and return its rows
    pub async fn datasets_run(&self, name: impl Into<String>) -> Result<DatasetsRunResponse> {
        let mut params = ObjectParams::new();
        params.insert("name", name.into())?;
        let response: DatasetsRunResponse = self.client.request("datasets.run.v1", params).await?;

        Ok(response)
    }

    /// Daemon statistics
    pub async fn stats(&self) -> Result<StatsResponse> {
        let params = ObjectParams::new();
        let response: StatsResponse = self.client.request("admin.stats.v1", params).await?;

        Ok(response)
    }
}
