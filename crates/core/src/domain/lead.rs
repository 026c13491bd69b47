// Lead Domain Model

use std::collections::BTreeSet;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::domain::error::{DomainError, Result};

/// CRM order identifier (natural primary key)
pub type LeadId = i64;

/// Raw CRM status code
pub type StatusCode = i32;

/// One lead as tracked by the system
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Lead {
    pub id: LeadId,
    pub status: StatusCode,
    pub date: NaiveDate,
    pub webmaster: String,
    pub amount: f64,
    pub comment: Option<String>,
}

/// One row as it arrives from a file or an ingest batch, before normalization
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LeadDraft {
    pub id: LeadId,
    pub status: StatusCode,
    pub date: NaiveDate,
    pub webmaster: String,
    #[serde(default)]
    pub amount: f64,
    #[serde(default)]
    pub comment: Option<String>,
}

impl LeadDraft {
    /// Normalize a draft into a [`Lead`].
    ///
    /// The webmaster identifier is trimmed; drafts with an empty webmaster
    /// are unusable and return `None` (callers count them as skipped).
    pub fn normalize(self) -> Option<Lead> {
        let webmaster = self.webmaster.trim();
        if webmaster.is_empty() {
            return None;
        }
        Some(Lead {
            id: self.id,
            status: self.status,
            date: self.date,
            webmaster: webmaster.to_string(),
            amount: self.amount,
            comment: self.comment,
        })
    }
}

/// Classification of raw CRM status codes into the three metric classes.
///
/// The sets may overlap: a bought-out lead is still approved, so the buyout
/// codes are normally a subset of the approve codes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatusMap {
    approve: BTreeSet<StatusCode>,
    buyout: BTreeSet<StatusCode>,
    trash: BTreeSet<StatusCode>,
}

impl StatusMap {
    /// Build a status map from explicit code sets; every set must be non-empty
    pub fn new(
        approve: impl IntoIterator<Item = StatusCode>,
        buyout: impl IntoIterator<Item = StatusCode>,
        trash: impl IntoIterator<Item = StatusCode>,
    ) -> Result<Self> {
        let map = Self {
            approve: approve.into_iter().collect(),
            buyout: buyout.into_iter().collect(),
            trash: trash.into_iter().collect(),
        };
        if map.approve.is_empty() {
            return Err(DomainError::EmptyStatusSet { class: "approve" });
        }
        if map.buyout.is_empty() {
            return Err(DomainError::EmptyStatusSet { class: "buyout" });
        }
        if map.trash.is_empty() {
            return Err(DomainError::EmptyStatusSet { class: "trash" });
        }
        Ok(map)
    }

    pub fn is_approved(&self, status: StatusCode) -> bool {
        self.approve.contains(&status)
    }

    pub fn is_bought_out(&self, status: StatusCode) -> bool {
        self.buyout.contains(&status)
    }

    pub fn is_trash(&self, status: StatusCode) -> bool {
        self.trash.contains(&status)
    }

    pub fn approve_codes(&self) -> impl Iterator<Item = StatusCode> + '_ {
        self.approve.iter().copied()
    }

    pub fn buyout_codes(&self) -> impl Iterator<Item = StatusCode> + '_ {
        self.buyout.iter().copied()
    }

    pub fn trash_codes(&self) -> impl Iterator<Item = StatusCode> + '_ {
        self.trash.iter().copied()
    }
}

impl Default for StatusMap {
    /// Default CRM mapping: 2 = approved, 3 = shipped, 4 = bought out
    /// (terminal, still approved), 6 = invalid, 7 = cancelled.
    fn default() -> Self {
        Self {
            approve: BTreeSet::from([2, 3, 4]),
            buyout: BTreeSet::from([4]),
            trash: BTreeSet::from([6, 7]),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    #[test]
    fn normalize_trims_webmaster() {
        let draft = LeadDraft {
            id: 1,
            status: 2,
            date: date("2025-03-10"),
            webmaster: "  abc123  ".to_string(),
            amount: 500.0,
            comment: None,
        };
        let lead = draft.normalize().unwrap();
        assert_eq!(lead.webmaster, "abc123");
    }

    #[test]
    fn normalize_rejects_empty_webmaster() {
        let draft = LeadDraft {
            id: 1,
            status: 2,
            date: date("2025-03-10"),
            webmaster: "   ".to_string(),
            amount: 0.0,
            comment: None,
        };
        assert!(draft.normalize().is_none());
    }

    #[test]
    fn default_status_map_classifies_bought_out_as_approved() {
        let map = StatusMap::default();
        assert!(map.is_approved(4));
        assert!(map.is_bought_out(4));
        assert!(!map.is_trash(4));
        assert!(map.is_trash(6));
        assert!(!map.is_approved(1));
    }

    #[test]
    fn status_map_rejects_empty_sets() {
        let err = StatusMap::new([2], [], [6]).unwrap_err();
        assert!(matches!(err, DomainError::EmptyStatusSet { class: "buyout" }));
    }
}
