//! Rule-based detection of underperforming webmasters.

use serde::Serialize;

/// Thresholds for issue detection, relative to fleet-wide averages where
/// noted.
#[derive(Debug, Clone, PartialEq)]
pub struct IssueThresholds {
    /// Flag when approve % falls this many points below the fleet average
    pub approve_below_avg: f64,
    /// Flag when trash % rises this many points above the fleet average
    pub trash_above_avg: f64,
    /// Flag when the adjusted buyout % drops under this floor
    pub min_adj_buyout_pct: f64,
    /// Flag when the 8-day score % drops under this floor
    pub min_score_pct: f64,
}

impl Default for IssueThresholds {
    fn default() -> Self {
        Self {
            approve_below_avg: 10.0,
            trash_above_avg: 10.0,
            min_adj_buyout_pct: 65.0,
            min_score_pct: 70.0,
        }
    }
}

/// A single detected problem, carrying the numbers that triggered it
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Issue {
    LowApprove { approve_pct: f64, fleet_avg: f64 },
    HighTrash { trash_pct: f64, fleet_avg: f64 },
    LowBuyout { adj_buyout_pct: f64, target: f64 },
    LowScore { score_pct: f64, floor: f64 },
}

impl std::fmt::Display for Issue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::LowApprove {
                approve_pct,
                fleet_avg,
            } => write!(
                f,
                "approve rate {approve_pct}% is well below the {fleet_avg}% average"
            ),
            Self::HighTrash {
                trash_pct,
                fleet_avg,
            } => write!(
                f,
                "trash rate {trash_pct}% is well above the {fleet_avg}% average"
            ),
            Self::LowBuyout {
                adj_buyout_pct,
                target,
            } => write!(
                f,
                "adjusted buyout {adj_buyout_pct}% is under the {target}% target"
            ),
            Self::LowScore { score_pct, floor } => {
                write!(f, "8-day score {score_pct}% is under the {floor}% floor")
            }
        }
    }
}

/// Evaluate one webmaster's metrics against the thresholds.
///
/// `score_pct` is optional: a webmaster with no leads inside the scoring
/// window has no score and is not penalised for it.
pub fn detect_issues(
    approve_pct: f64,
    adj_buyout_pct: f64,
    trash_pct: f64,
    score_pct: Option<f64>,
    avg_approve_pct: f64,
    avg_trash_pct: f64,
    thresholds: &IssueThresholds,
) -> Vec<Issue> {
    let mut issues = Vec::new();

    if approve_pct < avg_approve_pct - thresholds.approve_below_avg {
        issues.push(Issue::LowApprove {
            approve_pct,
            fleet_avg: avg_approve_pct,
        });
    }
    if trash_pct > avg_trash_pct + thresholds.trash_above_avg {
        issues.push(Issue::HighTrash {
            trash_pct,
            fleet_avg: avg_trash_pct,
        });
    }
    if adj_buyout_pct < thresholds.min_adj_buyout_pct {
        issues.push(Issue::LowBuyout {
            adj_buyout_pct,
            target: thresholds.min_adj_buyout_pct,
        });
    }
    if let Some(score_pct) = score_pct {
        if score_pct < thresholds.min_score_pct {
            issues.push(Issue::LowScore {
                score_pct,
                floor: thresholds.min_score_pct,
            });
        }
    }

    issues
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn healthy_webmaster_has_no_issues() {
        let issues = detect_issues(
            60.0,
            70.0,
            10.0,
            Some(95.0),
            55.0,
            12.0,
            &IssueThresholds::default(),
        );
        assert!(issues.is_empty());
    }

    #[test]
    fn approve_far_below_average_is_flagged() {
        let issues = detect_issues(
            30.0,
            70.0,
            10.0,
            Some(95.0),
            55.0,
            12.0,
            &IssueThresholds::default(),
        );
        assert_eq!(issues.len(), 1);
        assert!(matches!(issues[0], Issue::LowApprove { .. }));
    }

    #[test]
    fn approve_within_tolerance_is_not_flagged() {
        // 46 vs avg 55: 9 points below, inside the 10-point tolerance
        let issues = detect_issues(
            46.0,
            70.0,
            10.0,
            None,
            55.0,
            12.0,
            &IssueThresholds::default(),
        );
        assert!(issues.is_empty());
    }

    #[test]
    fn missing_score_is_not_penalised() {
        let issues = detect_issues(
            60.0,
            70.0,
            10.0,
            None,
            55.0,
            12.0,
            &IssueThresholds::default(),
        );
        assert!(issues.is_empty());
    }

    #[test]
    fn multiple_problems_stack() {
        let issues = detect_issues(
            20.0,
            30.0,
            40.0,
            Some(25.0),
            55.0,
            12.0,
            &IssueThresholds::default(),
        );
        assert_eq!(issues.len(), 4);
    }

    #[test]
    fn issue_messages_carry_the_numbers() {
        let msg = Issue::LowBuyout {
            adj_buyout_pct: 42.5,
            target: 65.0,
        }
        .to_string();
        assert!(msg.contains("42.5"));
        assert!(msg.contains("65"));
    }
}
