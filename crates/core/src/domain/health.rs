//! Composite health score and traffic-light banding.

use serde::{Deserialize, Serialize};

use crate::domain::round_dp;

/// Minimum health score for the green band
pub const HEALTH_GREEN_MIN: f64 = 90.0;
/// Minimum health score for the yellow band
pub const HEALTH_YELLOW_MIN: f64 = 70.0;

/// Traffic-light classification of a health score
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HealthBand {
    Green,
    Yellow,
    Red,
}

impl HealthBand {
    pub fn for_value(score: f64) -> Self {
        if score >= HEALTH_GREEN_MIN {
            Self::Green
        } else if score >= HEALTH_YELLOW_MIN {
            Self::Yellow
        } else {
            Self::Red
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Green => "green",
            Self::Yellow => "yellow",
            Self::Red => "red",
        }
    }
}

impl std::fmt::Display for HealthBand {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Composite 0-100 health score.
///
/// Weighted blend of approval, maturity-adjusted buyout, and the inverse of
/// the trash share: `0.4 * approve + 0.4 * adj_buyout + 0.2 * (100 - trash)`.
pub fn health_score(approve_pct: f64, adj_buyout_pct: f64, trash_pct: f64) -> f64 {
    let raw = 0.4 * approve_pct + 0.4 * adj_buyout_pct + 0.2 * (100.0 - trash_pct);
    round_dp(raw.clamp(0.0, 100.0), 1)
}
