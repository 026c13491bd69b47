//! Leadwatch Daemon - Main Entry Point
//!
//! Composition root: wires the SQLite adapters into the application
//! services, spawns the report scheduler, and serves the JSON-RPC API.

mod config;

use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::info;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use leadwatch_api_rpc::{RpcServer, RpcServerConfig};
use leadwatch_core::application::{AnalysisService, IngestService, ReportScheduler};
use leadwatch_core::port::SystemClock;
use leadwatch_infra_csv::CsvLeadSource;
use leadwatch_infra_sqlite::{
    create_pool, run_migrations, SqliteDatasetCatalog, SqliteLeadRepository,
    SqliteReportRepository, SqliteStoreProbe,
};

use config::{mask_db_url, DaemonConfig};

const VERSION: &str = env!("CARGO_PKG_VERSION");

#[tokio::main]
async fn main() -> Result<()> {
    // 1. Logging first so config failures are visible
    let _log_guard = init_tracing();

    info!("Leadwatch daemon v{} starting...", VERSION);

    // 2. Configuration: invalid env exits non-zero before anything spawns
    let config = DaemonConfig::from_env().map_err(|e| anyhow::anyhow!("{e}"))?;

    info!(db = %mask_db_url(&config.database_url), "Initializing database...");

    // 3. Database: create the data directory and the file on first open
    ensure_parent_dir(&config.database_url)?;
    let pool = create_pool(&config.database_url)
        .await
        .map_err(|e| anyhow::anyhow!("DB pool creation failed: {}", e))?;
    run_migrations(&pool)
        .await
        .map_err(|e| anyhow::anyhow!("Migration failed: {}", e))?;

    // 4. Dependency wiring
    let clock = Arc::new(SystemClock);
    let lead_repo = Arc::new(SqliteLeadRepository::new(pool.clone(), clock.clone()));
    let report_repo = Arc::new(SqliteReportRepository::new(pool.clone(), clock.clone()));
    let datasets = Arc::new(SqliteDatasetCatalog::new(
        pool.clone(),
        &config.analysis.statuses,
    ));
    let probe = Arc::new(SqliteStoreProbe::new(pool.clone()));

    let ingest = Arc::new(IngestService::new(
        lead_repo.clone(),
        Arc::new(CsvLeadSource),
    ));
    let analysis = Arc::new(AnalysisService::new(
        lead_repo.clone(),
        report_repo.clone(),
        clock.clone(),
        config.analysis.clone(),
    ));

    // 5. Report scheduler (first run fires immediately)
    let scheduler = ReportScheduler::new(
        analysis.clone(),
        config.report_interval_hours,
        config.report_window_days,
    );
    tokio::spawn(async move {
        scheduler.run().await;
    });

    // 6. JSON-RPC server
    let rpc_server = RpcServer::new(
        RpcServerConfig {
            host: config.rpc_host.clone(),
            port: config.rpc_port,
        },
        ingest,
        analysis,
        report_repo,
        datasets,
        probe,
    );
    let (rpc_handle, rpc_addr) = rpc_server
        .start()
        .await
        .map_err(|e| anyhow::anyhow!("RPC server start failed: {}", e))?;

    info!(addr = %rpc_addr, "Leadwatch ready");
    info!("Press Ctrl+C to shutdown");

    // 7. Wait for shutdown signal
    tokio::signal::ctrl_c().await?;

    info!("Shutdown signal received. Exiting gracefully...");
    rpc_handle
        .stop()
        .map_err(|e| anyhow::anyhow!("RPC server stop failed: {}", e))?;

    info!("Shutdown complete.");
    Ok(())
}

/// Pretty or JSON console logging, optionally duplicated to a daily-rolled
/// file when `LEADWATCH_LOG_DIR` is set. The returned guard must stay alive
/// for the file writer to flush.
fn init_tracing() -> Option<tracing_appender::non_blocking::WorkerGuard> {
    let format = std::env::var("LEADWATCH_LOG_FORMAT").unwrap_or_else(|_| "pretty".to_string());
    let log_dir = std::env::var("LEADWATCH_LOG_DIR").ok();

    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new("leadwatch=info"))
        .expect("Failed to create env filter");

    match log_dir {
        Some(dir) => {
            let appender = tracing_appender::rolling::daily(dir, "leadwatch.log");
            let (writer, guard) = tracing_appender::non_blocking(appender);
            if format == "json" {
                tracing_subscriber::registry()
                    .with(env_filter)
                    .with(fmt::layer().json().with_writer(writer))
                    .init();
            } else {
                tracing_subscriber::registry()
                    .with(env_filter)
                    .with(fmt::layer().with_ansi(false).with_writer(writer))
                    .init();
            }
            Some(guard)
        }
        None => {
            if format == "json" {
                tracing_subscriber::registry()
                    .with(env_filter)
                    .with(fmt::layer().json())
                    .init();
            } else {
                tracing_subscriber::registry()
                    .with(env_filter)
                    .with(fmt::layer().pretty())
                    .init();
            }
            None
        }
    }
}

/// Create the directory holding a file-backed database. `:memory:` needs none.
fn ensure_parent_dir(database_url: &str) -> Result<()> {
    let path = database_url
        .strip_prefix("sqlite://")
        .or_else(|| database_url.strip_prefix("sqlite:"))
        .unwrap_or(database_url);
    if path == ":memory:" {
        return Ok(());
    }

    if let Some(parent) = Path::new(path).parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create data directory {}", parent.display())
            })?;
        }
    }
    Ok(())
}
