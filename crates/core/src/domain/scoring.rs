//! 8-day weighted buyout score.
//!
//! Leads are grouped into cohorts by creation date. For each cohort of age
//! `d` days (d = 1 is yesterday, d = 8 is eight days ago):
//!
//! ```text
//! numerator   = sum( approved_d * actual_buyout_rate_d )
//! denominator = sum( approved_d * benchmark_buyout_rate_d )
//! score       = numerator / denominator
//! ```
//!
//! A score of 1.0 means the webmaster is exactly on target; above 1.0 is
//! above-target buyout. Cohorts older than the window use the benchmark of
//! the last day in the window (the highest target rate).

use chrono::{Days, NaiveDate};
use serde::Serialize;

use crate::domain::error::{DomainError, Result};
use crate::domain::lead::{Lead, StatusMap};
use crate::domain::round_dp;

/// Length of the scoring window in days
pub const SCORING_WINDOW_DAYS: i64 = 8;

/// Target buyout rate per cohort age (1..=8 days)
#[derive(Debug, Clone, PartialEq)]
pub struct BenchmarkCurve {
    rates: [f64; SCORING_WINDOW_DAYS as usize],
}

impl BenchmarkCurve {
    /// Build a curve from explicit per-age rates.
    ///
    /// Rates must be within (0, 1] and non-decreasing: a cohort can only
    /// gain buyouts as it ages.
    pub fn new(rates: [f64; SCORING_WINDOW_DAYS as usize]) -> Result<Self> {
        for (i, rate) in rates.iter().enumerate() {
            if !(*rate > 0.0 && *rate <= 1.0) {
                return Err(DomainError::InvalidBenchmarkCurve(format!(
                    "rate for age {} is {} (expected within (0, 1])",
                    i + 1,
                    rate
                )));
            }
            if i > 0 && rates[i - 1] > *rate {
                return Err(DomainError::InvalidBenchmarkCurve(format!(
                    "rates must be non-decreasing, age {} drops to {}",
                    i + 1,
                    rate
                )));
            }
        }
        Ok(Self { rates })
    }

    /// Benchmark rate for a cohort of the given age; ages are clamped to 1..=8
    pub fn rate_for_age(&self, age_days: i64) -> f64 {
        let clamped = age_days.clamp(1, SCORING_WINDOW_DAYS) as usize;
        self.rates[clamped - 1]
    }

    /// Target rate of a fully matured cohort (age 8 and beyond)
    pub fn mature_rate(&self) -> f64 {
        self.rates[SCORING_WINDOW_DAYS as usize - 1]
    }
}

impl Default for BenchmarkCurve {
    fn default() -> Self {
        Self {
            rates: [0.05, 0.15, 0.30, 0.40, 0.50, 0.57, 0.62, 0.65],
        }
    }
}

/// One creation-date cohort inside the scoring window
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CohortRow {
    pub date: NaiveDate,
    pub age_days: i64,
    pub leads: u64,
    pub approved: u64,
    pub bought_out: u64,
    pub actual_buyout_rate: f64,
    pub benchmark_rate: f64,
    pub weighted_actual: f64,
    pub weighted_benchmark: f64,
}

/// Full score result for one webmaster
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScoreCard {
    pub webmaster: String,
    pub analysis_date: NaiveDate,
    pub cohorts: Vec<CohortRow>,
    pub numerator: f64,
    pub denominator: f64,
    pub score: f64,
    pub score_pct: f64,
}

impl ScoreCard {
    fn empty(webmaster: &str, analysis_date: NaiveDate) -> Self {
        Self {
            webmaster: webmaster.to_string(),
            analysis_date,
            cohorts: Vec::new(),
            numerator: 0.0,
            denominator: 0.0,
            score: 0.0,
            score_pct: 0.0,
        }
    }
}

/// Cohort age in calendar days; leads from the analysis day count as age 1
fn cohort_age(analysis_date: NaiveDate, cohort_date: NaiveDate) -> i64 {
    (analysis_date - cohort_date).num_days().max(1)
}

/// Calculate the 8-day weighted buyout score for one webmaster.
///
/// Only leads dated within `SCORING_WINDOW_DAYS` of `analysis_date` enter
/// the calculation; a webmaster with no such leads gets an empty card with
/// score 0.
pub fn score(
    leads: &[Lead],
    statuses: &StatusMap,
    curve: &BenchmarkCurve,
    webmaster: &str,
    analysis_date: NaiveDate,
) -> ScoreCard {
    let cutoff = analysis_date - Days::new(SCORING_WINDOW_DAYS as u64);

    let mut by_day: std::collections::BTreeMap<NaiveDate, (u64, u64, u64)> =
        std::collections::BTreeMap::new();
    for lead in leads
        .iter()
        .filter(|l| l.webmaster == webmaster && l.date >= cutoff)
    {
        let entry = by_day.entry(lead.date).or_default();
        entry.0 += 1;
        if statuses.is_approved(lead.status) {
            entry.1 += 1;
        }
        if statuses.is_bought_out(lead.status) {
            entry.2 += 1;
        }
    }

    if by_day.is_empty() {
        return ScoreCard::empty(webmaster, analysis_date);
    }

    let mut cohorts = Vec::with_capacity(by_day.len());
    let mut numerator = 0.0;
    let mut denominator = 0.0;

    for (date, (total, approved, bought_out)) in by_day {
        let age_days = cohort_age(analysis_date, date);

        // Rate is relative to approved leads, not all leads
        let actual_rate = if approved > 0 {
            bought_out as f64 / approved as f64
        } else {
            0.0
        };
        let benchmark_rate = curve.rate_for_age(age_days);

        let weighted_actual = approved as f64 * actual_rate;
        let weighted_benchmark = approved as f64 * benchmark_rate;
        numerator += weighted_actual;
        denominator += weighted_benchmark;

        cohorts.push(CohortRow {
            date,
            age_days,
            leads: total,
            approved,
            bought_out,
            actual_buyout_rate: round_dp(actual_rate, 4),
            benchmark_rate: round_dp(benchmark_rate, 4),
            weighted_actual: round_dp(weighted_actual, 2),
            weighted_benchmark: round_dp(weighted_benchmark, 2),
        });
    }

    let score = if denominator > 0.0 {
        round_dp(numerator / denominator, 4)
    } else {
        0.0
    };

    ScoreCard {
        webmaster: webmaster.to_string(),
        analysis_date,
        cohorts,
        numerator: round_dp(numerator, 2),
        denominator: round_dp(denominator, 2),
        score,
        score_pct: round_dp(score * 100.0, 2),
    }
}

/// Adjusted buyout percentage: projects young cohorts to their expected
/// mature rate.
///
/// For a cohort of age `d`:
/// - `d >= 8`: the actual rate counts as-is;
/// - `d <  8`: `adjusted = min(actual * (mature_rate / benchmark_d), 1.0)`.
///
/// The result is the approved-lead-weighted average across all cohorts in
/// the look-back period, as a percentage. 0.0 when nothing was approved.
pub fn adjusted_buyout_pct(
    leads: &[Lead],
    statuses: &StatusMap,
    curve: &BenchmarkCurve,
    webmaster: &str,
    analysis_date: NaiveDate,
    period_days: i64,
) -> f64 {
    let since = analysis_date - Days::new(period_days.max(0) as u64);

    let mut by_day: std::collections::BTreeMap<NaiveDate, (u64, u64)> =
        std::collections::BTreeMap::new();
    for lead in leads
        .iter()
        .filter(|l| l.webmaster == webmaster && l.date >= since)
    {
        let entry = by_day.entry(lead.date).or_default();
        if statuses.is_approved(lead.status) {
            entry.0 += 1;
        }
        if statuses.is_bought_out(lead.status) {
            entry.1 += 1;
        }
    }

    let mut total_approved = 0u64;
    let mut total_weighted = 0.0;

    for (date, (approved, bought_out)) in by_day {
        if approved == 0 {
            continue;
        }
        let age_days = cohort_age(analysis_date, date);
        let actual_rate = bought_out as f64 / approved as f64;

        let adjusted_rate = if age_days >= SCORING_WINDOW_DAYS {
            actual_rate
        } else {
            (actual_rate * (curve.mature_rate() / curve.rate_for_age(age_days))).min(1.0)
        };

        total_weighted += approved as f64 * adjusted_rate;
        total_approved += approved;
    }

    if total_approved == 0 {
        return 0.0;
    }
    round_dp(total_weighted / total_approved as f64 * 100.0, 2)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    fn lead(id: i64, status: i32, day: &str) -> Lead {
        Lead {
            id,
            status,
            date: date(day),
            webmaster: "wm-a".to_string(),
            amount: 100.0,
            comment: None,
        }
    }

    #[test]
    fn curve_clamps_ages_to_window() {
        let curve = BenchmarkCurve::default();
        assert_eq!(curve.rate_for_age(0), curve.rate_for_age(1));
        assert_eq!(curve.rate_for_age(30), curve.mature_rate());
        assert_eq!(curve.mature_rate(), 0.65);
    }

    #[test]
    fn curve_rejects_decreasing_rates() {
        let err = BenchmarkCurve::new([0.1, 0.2, 0.3, 0.4, 0.3, 0.5, 0.6, 0.65]).unwrap_err();
        assert!(matches!(err, DomainError::InvalidBenchmarkCurve(_)));

        let err = BenchmarkCurve::new([0.0, 0.2, 0.3, 0.4, 0.45, 0.5, 0.6, 0.65]).unwrap_err();
        assert!(matches!(err, DomainError::InvalidBenchmarkCurve(_)));
    }

    #[test]
    fn on_target_cohort_scores_one() {
        // Age-8 cohort: benchmark 0.65. 20 approved, 13 bought out = 0.65.
        let analysis = date("2025-03-20");
        let mut leads = Vec::new();
        for i in 0..13 {
            leads.push(lead(i, 4, "2025-03-12"));
        }
        for i in 13..20 {
            leads.push(lead(i, 2, "2025-03-12"));
        }

        let card = score(
            &leads,
            &StatusMap::default(),
            &BenchmarkCurve::default(),
            "wm-a",
            analysis,
        );

        assert_eq!(card.cohorts.len(), 1);
        assert_eq!(card.cohorts[0].age_days, 8);
        assert_eq!(card.cohorts[0].approved, 20);
        assert_eq!(card.cohorts[0].bought_out, 13);
        assert_eq!(card.score, 1.0);
        assert_eq!(card.score_pct, 100.0);
    }

    #[test]
    fn score_weights_cohorts_by_approved_volume() {
        let analysis = date("2025-03-20");
        let mut leads = Vec::new();
        // Age 8 (benchmark 0.65): 10 approved, 0 bought out
        for i in 0..10 {
            leads.push(lead(i, 2, "2025-03-12"));
        }
        // Age 1 (benchmark 0.05): 10 approved, 10 bought out
        for i in 10..20 {
            leads.push(lead(i, 4, "2025-03-19"));
        }

        let card = score(
            &leads,
            &StatusMap::default(),
            &BenchmarkCurve::default(),
            "wm-a",
            analysis,
        );

        // numerator = 10*0 + 10*1 = 10; denominator = 10*0.65 + 10*0.05 = 7
        assert_eq!(card.numerator, 10.0);
        assert_eq!(card.denominator, 7.0);
        assert_eq!(card.score, round_dp(10.0 / 7.0, 4));
    }

    #[test]
    fn leads_outside_window_are_ignored() {
        let analysis = date("2025-03-20");
        let leads = vec![lead(1, 4, "2025-03-01")];
        let card = score(
            &leads,
            &StatusMap::default(),
            &BenchmarkCurve::default(),
            "wm-a",
            analysis,
        );
        assert!(card.cohorts.is_empty());
        assert_eq!(card.score, 0.0);
    }

    #[test]
    fn same_day_leads_count_as_age_one() {
        let analysis = date("2025-03-20");
        let leads = vec![lead(1, 2, "2025-03-20")];
        let card = score(
            &leads,
            &StatusMap::default(),
            &BenchmarkCurve::default(),
            "wm-a",
            analysis,
        );
        assert_eq!(card.cohorts[0].age_days, 1);
    }

    #[test]
    fn cohort_with_no_approved_contributes_nothing() {
        let analysis = date("2025-03-20");
        let leads = vec![lead(1, 6, "2025-03-15"), lead(2, 1, "2025-03-15")];
        let card = score(
            &leads,
            &StatusMap::default(),
            &BenchmarkCurve::default(),
            "wm-a",
            analysis,
        );
        assert_eq!(card.cohorts.len(), 1);
        assert_eq!(card.cohorts[0].approved, 0);
        assert_eq!(card.denominator, 0.0);
        assert_eq!(card.score, 0.0);
    }

    #[test]
    fn adjusted_buyout_projects_young_cohorts() {
        let analysis = date("2025-03-20");
        // Age-1 cohort at exactly the age-1 benchmark: 20 approved, 1 bought
        // out = 0.05 actual -> projected to the mature rate.
        let mut leads = vec![lead(0, 4, "2025-03-19")];
        for i in 1..20 {
            leads.push(lead(i, 2, "2025-03-19"));
        }

        let adj = adjusted_buyout_pct(
            &leads,
            &StatusMap::default(),
            &BenchmarkCurve::default(),
            "wm-a",
            analysis,
            30,
        );
        assert_eq!(adj, 65.0);
    }

    #[test]
    fn adjusted_buyout_uses_actual_rate_for_mature_cohorts() {
        let analysis = date("2025-03-20");
        // Age-10 cohort: 4 of 10 approved bought out -> 40%, no projection
        let mut leads = Vec::new();
        for i in 0..4 {
            leads.push(lead(i, 4, "2025-03-10"));
        }
        for i in 4..10 {
            leads.push(lead(i, 2, "2025-03-10"));
        }

        let adj = adjusted_buyout_pct(
            &leads,
            &StatusMap::default(),
            &BenchmarkCurve::default(),
            "wm-a",
            analysis,
            30,
        );
        assert_eq!(adj, 40.0);
    }

    #[test]
    fn adjusted_buyout_caps_projection_at_hundred() {
        let analysis = date("2025-03-20");
        // Age-1 cohort fully bought out: 1.0 * (0.65 / 0.05) would be 13.0
        let leads = vec![lead(1, 4, "2025-03-19"), lead(2, 4, "2025-03-19")];
        let adj = adjusted_buyout_pct(
            &leads,
            &StatusMap::default(),
            &BenchmarkCurve::default(),
            "wm-a",
            analysis,
            30,
        );
        assert_eq!(adj, 100.0);
    }

    #[test]
    fn adjusted_buyout_without_approved_leads_is_zero() {
        let analysis = date("2025-03-20");
        let leads = vec![lead(1, 6, "2025-03-15")];
        let adj = adjusted_buyout_pct(
            &leads,
            &StatusMap::default(),
            &BenchmarkCurve::default(),
            "wm-a",
            analysis,
            30,
        );
        assert_eq!(adj, 0.0);
    }
}
