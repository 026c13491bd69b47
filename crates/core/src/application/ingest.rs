// Ingest Use Cases
// Accepts lead batches (RPC) and file imports, normalizes, upserts.

use std::path::Path;
use std::sync::Arc;

use serde::Serialize;
use tracing::{info, warn};

use crate::domain::{Lead, LeadDraft, LeadId, StatusCode};
use crate::error::{AppError, Result};
use crate::port::{LeadRepository, LeadSource};

/// What happened to one incoming batch
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct IngestOutcome {
    pub received: u64,
    pub upserted: u64,
    /// Rows dropped during normalization (blank webmaster, bad fields)
    pub skipped: u64,
}

/// Ingest service: the only write path into the lead store
pub struct IngestService {
    leads: Arc<dyn LeadRepository>,
    source: Arc<dyn LeadSource>,
}

impl IngestService {
    pub fn new(leads: Arc<dyn LeadRepository>, source: Arc<dyn LeadSource>) -> Self {
        Self { leads, source }
    }

    /// Normalize and upsert a batch of drafts.
    ///
    /// Re-sending the same ids is safe: rows are keyed by id and updated in
    /// place, so retries and overlapping exports converge.
    pub async fn ingest_batch(&self, drafts: Vec<LeadDraft>) -> Result<IngestOutcome> {
        let received = drafts.len() as u64;
        let leads: Vec<Lead> = drafts.into_iter().filter_map(LeadDraft::normalize).collect();
        let skipped = received - leads.len() as u64;

        if skipped > 0 {
            warn!(skipped, "Dropped drafts during normalization");
        }

        let upserted = self.leads.upsert_batch(&leads).await?;
        info!(received, upserted, skipped, "Lead batch ingested");
        Ok(IngestOutcome {
            received,
            upserted,
            skipped,
        })
    }

    /// Parse a lead export file and upsert its rows
    pub async fn import_file(&self, path: &Path) -> Result<IngestOutcome> {
        let parsed = self.source.load(path).await?;
        let received = parsed.leads.len() as u64 + parsed.skipped;

        let upserted = self.leads.upsert_batch(&parsed.leads).await?;
        info!(
            path = %path.display(),
            received,
            upserted,
            skipped = parsed.skipped,
            "Lead file imported"
        );
        Ok(IngestOutcome {
            received,
            upserted,
            skipped: parsed.skipped,
        })
    }

    /// Correct the status and/or comment of one stored lead
    pub async fn patch_lead(
        &self,
        id: LeadId,
        status: Option<StatusCode>,
        comment: Option<&str>,
    ) -> Result<()> {
        if status.is_none() && comment.is_none() {
            return Err(AppError::Validation(
                "patch requires a status or a comment".to_string(),
            ));
        }
        if !self.leads.patch(id, status, comment).await? {
            return Err(AppError::NotFound(format!("lead {id} not found")));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::port::ParsedLeads;
    use async_trait::async_trait;
    use chrono::NaiveDate;
    use std::sync::Mutex;

    #[derive(Default)]
    struct MemoryLeads {
        rows: Mutex<Vec<Lead>>,
    }

    #[async_trait]
    impl LeadRepository for MemoryLeads {
        async fn upsert_batch(&self, leads: &[Lead]) -> Result<u64> {
            let mut rows = self.rows.lock().unwrap();
            for lead in leads {
                match rows.iter_mut().find(|r| r.id == lead.id) {
                    Some(existing) => *existing = lead.clone(),
                    None => rows.push(lead.clone()),
                }
            }
            Ok(leads.len() as u64)
        }
        async fn patch(
            &self,
            id: LeadId,
            status: Option<StatusCode>,
            comment: Option<&str>,
        ) -> Result<bool> {
            let mut rows = self.rows.lock().unwrap();
            match rows.iter_mut().find(|r| r.id == id) {
                Some(row) => {
                    if let Some(status) = status {
                        row.status = status;
                    }
                    if let Some(comment) = comment {
                        row.comment = Some(comment.to_string());
                    }
                    Ok(true)
                }
                None => Ok(false),
            }
        }
        async fn fetch(
            &self,
            _webmaster: Option<&str>,
            _since: Option<NaiveDate>,
        ) -> Result<Vec<Lead>> {
            Ok(self.rows.lock().unwrap().clone())
        }
    }

    struct FixedSource(ParsedLeads);

    #[async_trait]
    impl LeadSource for FixedSource {
        async fn load(&self, _path: &Path) -> Result<ParsedLeads> {
            Ok(self.0.clone())
        }
    }

    fn draft(id: i64, webmaster: &str) -> LeadDraft {
        LeadDraft {
            id,
            status: 2,
            date: NaiveDate::parse_from_str("2025-03-15", "%Y-%m-%d").unwrap(),
            webmaster: webmaster.to_string(),
            amount: 50.0,
            comment: None,
        }
    }

    fn empty_source() -> Arc<FixedSource> {
        Arc::new(FixedSource(ParsedLeads {
            leads: Vec::new(),
            skipped: 0,
        }))
    }

    #[tokio::test]
    async fn batch_ingest_counts_normalization_skips() {
        let repo = Arc::new(MemoryLeads::default());
        let svc = IngestService::new(Arc::clone(&repo) as _, empty_source());

        let outcome = svc
            .ingest_batch(vec![draft(1, "wm-a"), draft(2, "  "), draft(3, " wm-b ")])
            .await
            .unwrap();

        assert_eq!(outcome.received, 3);
        assert_eq!(outcome.upserted, 2);
        assert_eq!(outcome.skipped, 1);

        let rows = repo.fetch(None, None).await.unwrap();
        assert_eq!(rows.len(), 2);
        // Webmaster names come out trimmed
        assert!(rows.iter().any(|l| l.webmaster == "wm-b"));
    }

    #[tokio::test]
    async fn re_ingesting_same_id_updates_in_place() {
        let repo = Arc::new(MemoryLeads::default());
        let svc = IngestService::new(Arc::clone(&repo) as _, empty_source());

        svc.ingest_batch(vec![draft(1, "wm-a")]).await.unwrap();
        let mut updated = draft(1, "wm-a");
        updated.status = 4;
        svc.ingest_batch(vec![updated]).await.unwrap();

        let rows = repo.fetch(None, None).await.unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].status, 4);
    }

    #[tokio::test]
    async fn file_import_reports_parser_skips() {
        let repo = Arc::new(MemoryLeads::default());
        let source = Arc::new(FixedSource(ParsedLeads {
            leads: vec![draft(7, "wm-a").normalize().unwrap()],
            skipped: 3,
        }));
        let svc = IngestService::new(Arc::clone(&repo) as _, source);

        let outcome = svc.import_file(Path::new("leads.csv")).await.unwrap();
        assert_eq!(outcome.received, 4);
        assert_eq!(outcome.upserted, 1);
        assert_eq!(outcome.skipped, 3);
        assert_eq!(repo.fetch(None, None).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn patch_requires_some_change() {
        let svc = IngestService::new(Arc::new(MemoryLeads::default()), empty_source());
        let err = svc.patch_lead(1, None, None).await.unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
    }

    #[tokio::test]
    async fn patch_unknown_lead_is_not_found() {
        let svc = IngestService::new(Arc::new(MemoryLeads::default()), empty_source());
        let err = svc.patch_lead(42, Some(6), None).await.unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }

    #[tokio::test]
    async fn patch_updates_status_and_comment() {
        let repo = Arc::new(MemoryLeads::default());
        let svc = IngestService::new(Arc::clone(&repo) as _, empty_source());
        svc.ingest_batch(vec![draft(1, "wm-a")]).await.unwrap();

        svc.patch_lead(1, Some(6), Some("duplicate phone"))
            .await
            .unwrap();

        let rows = repo.fetch(None, None).await.unwrap();
        assert_eq!(rows[0].status, 6);
        assert_eq!(rows[0].comment.as_deref(), Some("duplicate phone"));
    }
}
