// Lead Source Port (file ingestion)

use std::path::Path;

use async_trait::async_trait;

use crate::domain::Lead;
use crate::error::Result;

/// Outcome of parsing an external lead file
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedLeads {
    pub leads: Vec<Lead>,
    /// Rows dropped for missing or unparsable required fields
    pub skipped: u64,
}

/// Interface for reading lead exports from disk
#[async_trait]
pub trait LeadSource: Send + Sync {
    /// Parse the file at `path` into normalized leads
    async fn load(&self, path: &Path) -> Result<ParsedLeads>;
}
