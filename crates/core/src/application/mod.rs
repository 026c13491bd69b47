// Application Layer - Use cases wired over the ports

pub mod analysis;
pub mod ingest;
pub mod report_job;

pub use analysis::{AnalysisConfig, AnalysisService, WebmasterAnalysis};
pub use ingest::{IngestOutcome, IngestService};
pub use report_job::ReportScheduler;
