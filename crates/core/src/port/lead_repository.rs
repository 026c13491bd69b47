// Lead Repository Port (Interface)

use async_trait::async_trait;
use chrono::NaiveDate;

use crate::domain::{Lead, LeadId, StatusCode};
use crate::error::Result;

/// Repository interface for Lead persistence
#[async_trait]
pub trait LeadRepository: Send + Sync {
    /// Insert or update a batch of leads keyed by id; returns rows written
    async fn upsert_batch(&self, leads: &[Lead]) -> Result<u64>;

    /// Update status and/or comment of one lead; false when the id is unknown
    async fn patch(
        &self,
        id: LeadId,
        status: Option<StatusCode>,
        comment: Option<&str>,
    ) -> Result<bool>;

    /// Fetch leads, optionally filtered by webmaster and minimum date
    async fn fetch(&self, webmaster: Option<&str>, since: Option<NaiveDate>) -> Result<Vec<Lead>>;
}
