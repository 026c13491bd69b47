// CSV LeadSource Implementation
// Reads CRM lead exports. The CRM emits its own column spellings
// (id_custom, sum), which are accepted as aliases of the canonical names.

use std::path::Path;

use async_trait::async_trait;
use chrono::NaiveDate;
use serde::Deserialize;
use tracing::{debug, warn};

use leadwatch_core::domain::LeadDraft;
use leadwatch_core::error::{AppError, Result};
use leadwatch_core::port::{LeadSource, ParsedLeads};

pub struct CsvLeadSource;

/// Raw CSV cells, all optional so one bad field never poisons the batch
#[derive(Debug, Deserialize)]
struct RawRow {
    #[serde(alias = "id_custom")]
    id: Option<String>,
    status: Option<String>,
    date: Option<String>,
    webmaster: Option<String>,
    #[serde(alias = "sum")]
    amount: Option<String>,
    comment: Option<String>,
}

impl RawRow {
    /// Rows without a parsable id, status, or date are unusable
    fn into_draft(self) -> Option<LeadDraft> {
        let id = self.id?.trim().parse().ok()?;
        let status = self.status?.trim().parse().ok()?;
        let date = parse_date(self.date.as_deref()?)?;

        Some(LeadDraft {
            id,
            status,
            date,
            webmaster: self.webmaster.unwrap_or_default(),
            amount: parse_amount(self.amount.as_deref()),
            comment: self
                .comment
                .map(|c| c.trim().to_string())
                .filter(|c| !c.is_empty()),
        })
    }
}

/// Accepts date-only, datetime, and the dotted export format
fn parse_date(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    let head = raw.split(['T', ' ']).next().unwrap_or(raw);
    NaiveDate::parse_from_str(head, "%Y-%m-%d")
        .or_else(|_| NaiveDate::parse_from_str(head, "%d.%m.%Y"))
        .ok()
}

/// Missing or garbage amounts coerce to 0, matching how unsold
/// leads are exported
fn parse_amount(raw: Option<&str>) -> f64 {
    raw.and_then(|a| a.trim().parse().ok()).unwrap_or(0.0)
}

#[async_trait]
impl LeadSource for CsvLeadSource {
    async fn load(&self, path: &Path) -> Result<ParsedLeads> {
        let mut reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .from_path(path)
            .map_err(|e| AppError::Parse(format!("cannot open {}: {e}", path.display())))?;

        let mut leads = Vec::new();
        let mut skipped = 0u64;

        for record in reader.deserialize::<RawRow>() {
            let row = match record {
                Ok(row) => row,
                Err(e) => {
                    warn!(error = %e, "Skipping malformed CSV record");
                    skipped += 1;
                    continue;
                }
            };

            match row.into_draft().and_then(LeadDraft::normalize) {
                Some(lead) => leads.push(lead),
                None => skipped += 1,
            }
        }

        debug!(
            path = %path.display(),
            parsed = leads.len(),
            skipped,
            "CSV export parsed"
        );
        Ok(ParsedLeads { leads, skipped })
    }
}
