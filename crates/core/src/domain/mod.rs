// Domain Layer - Pure lead-quality logic, no infrastructure

pub mod error;
pub mod health;
pub mod issues;
pub mod lead;
pub mod metrics;
pub mod scoring;

// Re-exports
pub use error::DomainError;
pub use health::{health_score, HealthBand};
pub use issues::{detect_issues, Issue, IssueThresholds};
pub use lead::{Lead, LeadDraft, LeadId, StatusCode, StatusMap};
pub use metrics::{
    daily_breakdown, last_n, metrics_for, summary, webmasters, DailyRow, WebmasterMetrics,
};
pub use scoring::{
    adjusted_buyout_pct, score, BenchmarkCurve, CohortRow, ScoreCard, SCORING_WINDOW_DAYS,
};

/// Round to `dp` decimal places (metric percentages are stored pre-rounded)
pub(crate) fn round_dp(value: f64, dp: u32) -> f64 {
    let factor = 10f64.powi(dp as i32);
    (value * factor).round() / factor
}
