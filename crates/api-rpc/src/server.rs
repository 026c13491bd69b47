//! JSON-RPC Server
//!
//! Binds the versioned method table to a localhost TCP listener. The bound
//! address is handed back so callers (and tests binding port 0) know where
//! the server actually listens.

use std::net::SocketAddr;
use std::sync::Arc;

use jsonrpsee::server::{Server, ServerHandle};
use jsonrpsee::RpcModule;
use tracing::info;

use leadwatch_core::application::{AnalysisService, IngestService};
use leadwatch_core::port::{DatasetCatalog, ReportRepository, StoreProbe};

use crate::handler::RpcHandler;
use crate::types::{
    AdminStatsRequest, DailyRequest, DatasetsListRequest, DatasetsRunRequest, ImportRequest,
    IngestRequest, LastNRequest, LatestReportRequest, ListReportsRequest, PatchRequest,
    RunReportsRequest, ScoreRequest, StatusGetRequest, StatusSnapshotRequest, SummaryRequest,
};

const DEFAULT_RPC_HOST: &str = "127.0.0.1";
const DEFAULT_RPC_PORT: u16 = 9620;

/// RPC Server Configuration
pub struct RpcServerConfig {
    pub host: String,
    pub port: u16,
}

impl Default for RpcServerConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_RPC_HOST.to_string(),
            port: DEFAULT_RPC_PORT,
        }
    }
}

/// RPC Server
pub struct RpcServer {
    config: RpcServerConfig,
    handler: Arc<RpcHandler>,
}

impl RpcServer {
    pub fn new(
        config: RpcServerConfig,
        ingest: Arc<IngestService>,
        analysis: Arc<AnalysisService>,
        reports: Arc<dyn ReportRepository>,
        datasets: Arc<dyn DatasetCatalog>,
        probe: Arc<dyn StoreProbe>,
    ) -> Self {
        Self {
            config,
            handler: Arc::new(RpcHandler::new(ingest, analysis, reports, datasets, probe)),
        }
    }

    /// Start the JSON-RPC server
    ///
    /// Security: meant to bind 127.0.0.1 only; nothing here adds auth.
    pub async fn start(self) -> Result<(ServerHandle, SocketAddr), String> {
        let addr = format!("{}:{}", self.config.host, self.config.port);

        info!(
            host = %self.config.host,
            port = %self.config.port,
            "Starting JSON-RPC server"
        );

        let server = Server::builder()
            .build(&addr)
            .await
            .map_err(|e| format!("Failed to build server on {}: {}", addr, e))?;

        let local_addr = server
            .local_addr()
            .map_err(|e| format!("Failed to read bound address: {}", e))?;

        let mut module = RpcModule::new(());

        // Lead write path
        let handler = self.handler.clone();
        module
            .register_async_method("leads.ingest.v1", move |params, _, _| {
                let handler = handler.clone();
                async move {
                    let req: IngestRequest = params.parse()?;
                    handler.ingest(req).await
                }
            })
            .map_err(|e| e.to_string())?;

        let handler = self.handler.clone();
        module
            .register_async_method("leads.import.v1", move |params, _, _| {
                let handler = handler.clone();
                async move {
                    let req: ImportRequest = params.parse()?;
                    handler.import(req).await
                }
            })
            .map_err(|e| e.to_string())?;

        let handler = self.handler.clone();
        module
            .register_async_method("leads.patch.v1", move |params, _, _| {
                let handler = handler.clone();
                async move {
                    let req: PatchRequest = params.parse()?;
                    handler.patch(req).await
                }
            })
            .map_err(|e| e.to_string())?;

        // Analysis reads
        let handler = self.handler.clone();
        module
            .register_async_method("analysis.summary.v1", move |params, _, _| {
                let handler = handler.clone();
                async move {
                    let req: Option<SummaryRequest> = params.parse()?;
                    handler.summary(req.unwrap_or_default()).await
                }
            })
            .map_err(|e| e.to_string())?;

        let handler = self.handler.clone();
        module
            .register_async_method("analysis.score.v1", move |params, _, _| {
                let handler = handler.clone();
                async move {
                    let req: ScoreRequest = params.parse()?;
                    handler.score(req).await
                }
            })
            .map_err(|e| e.to_string())?;

        let handler = self.handler.clone();
        module
            .register_async_method("analysis.last_n.v1", move |params, _, _| {
                let handler = handler.clone();
                async move {
                    let req: LastNRequest = params.parse()?;
                    handler.last_n(req).await
                }
            })
            .map_err(|e| e.to_string())?;

        let handler = self.handler.clone();
        module
            .register_async_method("analysis.daily.v1", move |params, _, _| {
                let handler = handler.clone();
                async move {
                    let req: DailyRequest = params.parse()?;
                    handler.daily(req).await
                }
            })
            .map_err(|e| e.to_string())?;

        // Report runs and history
        let handler = self.handler.clone();
        module
            .register_async_method("reports.run.v1", move |params, _, _| {
                let handler = handler.clone();
                async move {
                    let req: Option<RunReportsRequest> = params.parse()?;
                    handler.run_reports(req.unwrap_or_default()).await
                }
            })
            .map_err(|e| e.to_string())?;

        let handler = self.handler.clone();
        module
            .register_async_method("reports.list.v1", move |params, _, _| {
                let handler = handler.clone();
                async move {
                    let req: Option<ListReportsRequest> = params.parse()?;
                    handler.list_reports(req.unwrap_or_default()).await
                }
            })
            .map_err(|e| e.to_string())?;

        let handler = self.handler.clone();
        module
            .register_async_method("reports.latest.v1", move |params, _, _| {
                let handler = handler.clone();
                async move {
                    let req: LatestReportRequest = params.parse()?;
                    handler.latest_report(req).await
                }
            })
            .map_err(|e| e.to_string())?;

        // Status board
        let handler = self.handler.clone();
        module
            .register_async_method("status.snapshot.v1", move |params, _, _| {
                let handler = handler.clone();
                async move {
                    let req: Option<StatusSnapshotRequest> = params.parse()?;
                    handler.status_snapshot(req.unwrap_or_default()).await
                }
            })
            .map_err(|e| e.to_string())?;

        let handler = self.handler.clone();
        module
            .register_async_method("status.get.v1", move |params, _, _| {
                let handler = handler.clone();
                async move {
                    let req: StatusGetRequest = params.parse()?;
                    handler.status_get(req).await
                }
            })
            .map_err(|e| e.to_string())?;

        // Reporting datasets
        let handler = self.handler.clone();
        module
            .register_async_method("datasets.list.v1", move |params, _, _| {
                let handler = handler.clone();
                async move {
                    let req: Option<DatasetsListRequest> = params.parse()?;
                    handler.datasets_list(req.unwrap_or_default()).await
                }
            })
            .map_err(|e| e.to_string())?;

        let handler = self.handler.clone();
        module
            .register_async_method("datasets.run.v1", move |params, _, _| {
                let handler = handler.clone();
                async move {
                    let req: DatasetsRunRequest = params.parse()?;
                    handler.datasets_run(req).await
                }
            })
            .map_err(|e| e.to_string())?;

        // Admin
        let handler = self.handler.clone();
        module
            .register_async_method("admin.stats.v1", move |params, _, _| {
                let handler = handler.clone();
                async move {
                    let req: Option<AdminStatsRequest> = params.parse()?;
                    handler.stats(req.unwrap_or_default()).await
                }
            })
            .map_err(|e| e.to_string())?;

        info!(addr = %local_addr, "JSON-RPC server started");

        let handle = server.start(module);
        Ok((handle, local_addr))
    }
}
