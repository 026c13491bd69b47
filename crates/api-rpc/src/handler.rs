//! RPC Method Handlers
//!
//! Implements the business logic for each JSON-RPC method. Mutating methods
//! (ingest, import, patch, report runs) go through the rate limiter; reads
//! do not.

use std::path::Path;
use std::sync::Arc;

use jsonrpsee::types::ErrorObjectOwned;

use leadwatch_core::application::{AnalysisService, IngestService};
use leadwatch_core::error::AppError;
use leadwatch_core::port::{DatasetCatalog, ReportRepository, StoreProbe};

use crate::error::{code, to_rpc_error};
use crate::rate_limiter::RateLimiter;
use crate::types::{
    AdminStatsRequest, AdminStatsResponse, DailyRequest, DailyResponse, DatasetsListRequest,
    DatasetsListResponse, DatasetsRunRequest, DatasetsRunResponse, ImportRequest, ImportResponse,
    IngestRequest, IngestResponse, LastNRequest, LastNResponse, LatestReportRequest,
    LatestReportResponse, ListReportsRequest, ListReportsResponse, PatchRequest, PatchResponse,
    RunReportsRequest, RunReportsResponse, ScoreRequest, ScoreResponse, StatusGetRequest,
    StatusGetResponse, StatusSnapshotRequest, StatusSnapshotResponse, SummaryRequest,
    SummaryResponse,
};

/// RPC Handler with injected dependencies
pub struct RpcHandler {
    ingest: Arc<IngestService>,
    analysis: Arc<AnalysisService>,
    reports: Arc<dyn ReportRepository>,
    datasets: Arc<dyn DatasetCatalog>,
    probe: Arc<dyn StoreProbe>,
    rate_limiter: RateLimiter,
    start_time: std::time::Instant,
}

impl RpcHandler {
    pub fn new(
        ingest: Arc<IngestService>,
        analysis: Arc<AnalysisService>,
        reports: Arc<dyn ReportRepository>,
        datasets: Arc<dyn DatasetCatalog>,
        probe: Arc<dyn StoreProbe>,
    ) -> Self {
        // Default: 200 burst, 100 req/sec (configurable via env)
        let max_burst: u32 = std::env::var("LEADWATCH_RATE_LIMIT_BURST")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(200);

        let rate_per_sec: u32 = std::env::var("LEADWATCH_RATE_LIMIT_RATE")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(100);

        Self {
            ingest,
            analysis,
            reports,
            datasets,
            probe,
            rate_limiter: RateLimiter::new(max_burst, rate_per_sec),
            start_time: std::time::Instant::now(),
        }
    }

    fn throttle(&self) -> Result<(), ErrorObjectOwned> {
        if self.rate_limiter.check() {
            Ok(())
        } else {
            Err(ErrorObjectOwned::owned(
                code::THROTTLED,
                "Rate limit exceeded. Please slow down.",
                None::<()>,
            ))
        }
    }

    /// leads.ingest.v1
    pub async fn ingest(&self, params: IngestRequest) -> Result<IngestResponse, ErrorObjectOwned> {
        self.throttle()?;

        let outcome = self
            .ingest
            .ingest_batch(params.leads)
            .await
            .map_err(to_rpc_error)?;

        Ok(IngestResponse {
            received: outcome.received,
            upserted: outcome.upserted,
            skipped: outcome.skipped,
        })
    }

    /// leads.import.v1
    pub async fn import(&self, params: ImportRequest) -> Result<ImportResponse, ErrorObjectOwned> {
        self.throttle()?;

        let outcome = self
            .ingest
            .import_file(Path::new(&params.path))
            .await
            .map_err(to_rpc_error)?;

        Ok(ImportResponse {
            path: params.path,
            received: outcome.received,
            upserted: outcome.upserted,
            skipped: outcome.skipped,
        })
    }

    /// leads.patch.v1
    pub async fn patch(&self, params: PatchRequest) -> Result<PatchResponse, ErrorObjectOwned> {
        self.throttle()?;

        self.ingest
            .patch_lead(params.id, params.status, params.comment.as_deref())
            .await
            .map_err(to_rpc_error)?;

        Ok(PatchResponse {
            id: params.id,
            patched: true,
        })
    }

    /// analysis.summary.v1
    pub async fn summary(
        &self,
        params: SummaryRequest,
    ) -> Result<SummaryResponse, ErrorObjectOwned> {
        let webmasters = self
            .analysis
            .summary(params.period_days)
            .await
            .map_err(to_rpc_error)?;

        Ok(SummaryResponse {
            period_days: params.period_days,
            webmasters,
        })
    }

    /// analysis.score.v1
    pub async fn score(&self, params: ScoreRequest) -> Result<ScoreResponse, ErrorObjectOwned> {
        let card = self
            .analysis
            .score_card(&params.webmaster)
            .await
            .map_err(to_rpc_error)?;

        if card.cohorts.is_empty() {
            return Err(to_rpc_error(AppError::NotFound(format!(
                "no leads for webmaster '{}' in the scoring window",
                params.webmaster
            ))));
        }

        Ok(ScoreResponse { card })
    }

    /// analysis.last_n.v1
    pub async fn last_n(&self, params: LastNRequest) -> Result<LastNResponse, ErrorObjectOwned> {
        let metrics = self
            .analysis
            .last_n(&params.webmaster, params.n)
            .await
            .map_err(to_rpc_error)?;

        Ok(LastNResponse {
            n: params.n,
            metrics,
        })
    }

    /// analysis.daily.v1
    pub async fn daily(&self, params: DailyRequest) -> Result<DailyResponse, ErrorObjectOwned> {
        let days = self
            .analysis
            .daily(&params.webmaster, params.period_days)
            .await
            .map_err(to_rpc_error)?;

        Ok(DailyResponse {
            webmaster: params.webmaster,
            period_days: params.period_days,
            days,
        })
    }

    /// reports.run.v1
    pub async fn run_reports(
        &self,
        params: RunReportsRequest,
    ) -> Result<RunReportsResponse, ErrorObjectOwned> {
        self.throttle()?;

        let webmasters = self
            .analysis
            .run_and_save(params.period_days, params.webmaster.as_deref())
            .await
            .map_err(to_rpc_error)?;

        Ok(RunReportsResponse {
            period_days: params.period_days,
            analysed: webmasters.len(),
            flagged: webmasters.iter().filter(|w| !w.ok).count(),
            webmasters,
        })
    }

    /// reports.list.v1
    pub async fn list_reports(
        &self,
        params: ListReportsRequest,
    ) -> Result<ListReportsResponse, ErrorObjectOwned> {
        let reports = self
            .reports
            .list_reports(params.webmaster.as_deref(), params.limit)
            .await
            .map_err(to_rpc_error)?;

        Ok(ListReportsResponse {
            count: reports.len(),
            reports,
        })
    }

    /// reports.latest.v1
    pub async fn latest_report(
        &self,
        params: LatestReportRequest,
    ) -> Result<LatestReportResponse, ErrorObjectOwned> {
        let report = self
            .reports
            .latest_report(&params.webmaster)
            .await
            .map_err(to_rpc_error)?
            .ok_or_else(|| {
                to_rpc_error(AppError::NotFound(format!(
                    "no reports for webmaster '{}'",
                    params.webmaster
                )))
            })?;

        Ok(LatestReportResponse { report })
    }

    /// status.snapshot.v1
    pub async fn status_snapshot(
        &self,
        params: StatusSnapshotRequest,
    ) -> Result<StatusSnapshotResponse, ErrorObjectOwned> {
        let mut webmasters = self
            .reports
            .status_snapshot()
            .await
            .map_err(to_rpc_error)?;

        if params.only_issues {
            webmasters.retain(|s| !s.ok);
        }

        Ok(StatusSnapshotResponse {
            count: webmasters.len(),
            webmasters,
        })
    }

    /// status.get.v1
    pub async fn status_get(
        &self,
        params: StatusGetRequest,
    ) -> Result<StatusGetResponse, ErrorObjectOwned> {
        let status = self
            .reports
            .get_status(&params.webmaster)
            .await
            .map_err(to_rpc_error)?
            .ok_or_else(|| {
                to_rpc_error(AppError::NotFound(format!(
                    "no status for webmaster '{}'; run reports first",
                    params.webmaster
                )))
            })?;

        Ok(StatusGetResponse { status })
    }

    /// datasets.list.v1
    pub async fn datasets_list(
        &self,
        _params: DatasetsListRequest,
    ) -> Result<DatasetsListResponse, ErrorObjectOwned> {
        let datasets = self.datasets.list();
        Ok(DatasetsListResponse {
            count: datasets.len(),
            datasets,
        })
    }

    /// datasets.run.v1
    pub async fn datasets_run(
        &self,
        params: DatasetsRunRequest,
    ) -> Result<DatasetsRunResponse, ErrorObjectOwned> {
        let columns = self
            .datasets
            .list()
            .into_iter()
            .find(|d| d.name == params.name)
            .map(|d| d.columns)
            .ok_or_else(|| {
                to_rpc_error(AppError::NotFound(format!(
                    "unknown dataset '{}'",
                    params.name
                )))
            })?;

        let rows = self.datasets.run(&params.name).await.map_err(to_rpc_error)?;

        Ok(DatasetsRunResponse {
            name: params.name,
            columns,
            count: rows.len(),
            rows,
        })
    }

    /// admin.stats.v1
    pub async fn stats(
        &self,
        _params: AdminStatsRequest,
    ) -> Result<AdminStatsResponse, ErrorObjectOwned> {
        let stats = self.probe.stats().await.map_err(to_rpc_error)?;

        Ok(AdminStatsResponse {
            leads_total: stats.leads_total,
            reports_total: stats.reports_total,
            webmasters_tracked: stats.webmasters_tracked,
            db_size_bytes: stats.db_size_bytes,
            uptime_seconds: self.start_time.elapsed().as_secs() as i64,
        })
    }
}
