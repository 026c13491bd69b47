// Store Probe port - storage-level statistics for admin surfaces

use async_trait::async_trait;
use serde::Serialize;

use crate::error::Result;

/// Storage statistics reported by `admin.stats.v1`
#[derive(Debug, Clone, Serialize)]
pub struct StoreStats {
    pub db_size_bytes: i64,
    pub leads_total: i64,
    pub reports_total: i64,
    pub webmasters_tracked: i64,
}

/// Read-only view into the backing store's size and row counts
#[async_trait]
pub trait StoreProbe: Send + Sync {
    async fn stats(&self) -> Result<StoreStats>;
}
