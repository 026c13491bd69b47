// Leadwatch Infrastructure - CSV Adapter
// Implements: LeadSource for CRM CSV exports

mod lead_source;

pub use lead_source::CsvLeadSource;
