// Dataset Catalog Port (BI query surface)

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::Result;

/// A named, ready-to-run reporting query.
///
/// `columns` documents the result shape so dashboards can rely on it; the
/// adapter's tests pin the two together.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DatasetSpec {
    pub name: String,
    pub title: String,
    pub description: String,
    pub columns: Vec<String>,
    pub sql: String,
}

/// Interface to the reporting datasets backed by the lead store
#[async_trait]
pub trait DatasetCatalog: Send + Sync {
    /// All available datasets with their rendered SQL
    fn list(&self) -> Vec<DatasetSpec>;

    /// Execute one dataset by name; rows come back as JSON objects
    async fn run(&self, name: &str) -> Result<Vec<serde_json::Value>>;
}
