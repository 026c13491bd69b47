//! Leadwatch SDK - Rust client library
//!
//! Provides a typed client for the Leadwatch daemon's JSON-RPC API.
//!
//! # Example
//!
//! ```no_run
//! use leadwatch_sdk::{LeadwatchClient, LeadRow};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     // Connect to the daemon
//!     let client = LeadwatchClient::connect("http://127.0.0.1:9620").await?;
//!
//!     // Push a lead batch
//!     let ingest = client
//!         .ingest(vec![LeadRow {
//!             id: 501,
//!             status: 2,
//!             date: "2025-08-01".to_string(),
//!             webmaster: "wm-north".to_string(),
//!             amount: 120.0,
//!             comment: None,
//!         }])
//!         .await?;
//!     println!("upserted {} leads", ingest.upserted);
//!
//!     // Read the fleet summary
//!     let summary = client.summary(None).await?;
//!     println!("{} webmasters in the window", summary.webmasters.len());
//!
//!     Ok(())
//! }
//! ```

mod client;
mod error;
mod types;

pub use client::LeadwatchClient;
pub use error::{Result, SdkError};
pub use types::{
    CohortRow, DailyResponse, DailyRow, DatasetSpec, DatasetsListResponse, DatasetsRunResponse,
    IngestResponse, ImportResponse, LastNResponse, LatestReportResponse, LeadRow,
    ListReportsResponse, PatchResponse, ReportRecord, RunReportsResponse, ScoreCard,
    ScoreResponse, StatsResponse, StatusGetResponse, StatusRow, StatusSnapshotResponse,
    SummaryResponse, WebmasterAnalysis, WebmasterMetrics,
};
