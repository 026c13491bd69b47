// Port Layer - Interfaces for external dependencies

pub mod clock;
pub mod datasets;
pub mod lead_repository;
pub mod lead_source;
pub mod report_repository;
pub mod store_probe;

// Re-exports
pub use clock::{Clock, SystemClock};
pub use datasets::{DatasetCatalog, DatasetSpec};
pub use lead_repository::LeadRepository;
pub use lead_source::{LeadSource, ParsedLeads};
pub use report_repository::{NewReport, NewStatus, ReportRecord, ReportRepository, StatusRow};
pub use store_probe::{StoreProbe, StoreStats};
