// Analysis Use Cases
// Turns raw leads into per-webmaster quality verdicts and persists them.

use std::sync::Arc;

use chrono::{DateTime, Days, NaiveDate, Utc};
use serde::Serialize;
use tracing::{debug, info};

use crate::domain::{
    self, adjusted_buyout_pct, detect_issues, health_score, score, BenchmarkCurve, DailyRow,
    HealthBand, Lead, ScoreCard, StatusMap, WebmasterMetrics,
};
use crate::error::{AppError, Result};
use crate::port::{Clock, LeadRepository, NewReport, NewStatus, ReportRepository};

/// Tunables for one analysis pass
#[derive(Debug, Clone, Default)]
pub struct AnalysisConfig {
    pub statuses: StatusMap,
    pub curve: BenchmarkCurve,
    pub thresholds: domain::IssueThresholds,
}

/// Full verdict for one webmaster over the analysed period
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WebmasterAnalysis {
    pub webmaster: String,
    pub total_leads: u64,
    pub approved: u64,
    pub bought_out: u64,
    pub trash: u64,
    pub approve_pct: f64,
    /// Raw buyout share of approved leads
    pub buyout_pct: f64,
    /// Buyout share with young cohorts projected to maturity
    pub adj_buyout_pct: f64,
    pub trash_pct: f64,
    /// Absent when the webmaster had no leads inside the scoring window
    pub score_pct: Option<f64>,
    pub health_score: f64,
    pub band: HealthBand,
    pub ok: bool,
    pub issues: Vec<String>,
    /// Filled when the analysis was persisted
    #[serde(skip_serializing_if = "Option::is_none")]
    pub report_id: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub report_created_at: Option<DateTime<Utc>>,
}

/// Analysis service: reads leads, computes verdicts, optionally persists them
pub struct AnalysisService {
    leads: Arc<dyn LeadRepository>,
    reports: Arc<dyn ReportRepository>,
    clock: Arc<dyn Clock>,
    config: AnalysisConfig,
}

impl AnalysisService {
    pub fn new(
        leads: Arc<dyn LeadRepository>,
        reports: Arc<dyn ReportRepository>,
        clock: Arc<dyn Clock>,
        config: AnalysisConfig,
    ) -> Self {
        Self {
            leads,
            reports,
            clock,
            config,
        }
    }

    pub fn statuses(&self) -> &StatusMap {
        &self.config.statuses
    }

    /// Pure analysis over an in-memory lead set.
    ///
    /// Results come back worst-health-first so attention lands on problems.
    pub fn analyse_leads(
        &self,
        leads: &[Lead],
        analysis_date: NaiveDate,
        period_days: i64,
    ) -> Vec<WebmasterAnalysis> {
        let summary = domain::summary(leads, &self.config.statuses);
        let (avg_approve_pct, avg_trash_pct) = fleet_averages(&summary);

        let mut results: Vec<WebmasterAnalysis> = summary
            .into_iter()
            .map(|m| {
                self.analyse_one(
                    leads,
                    m,
                    analysis_date,
                    period_days,
                    avg_approve_pct,
                    avg_trash_pct,
                )
            })
            .collect();

        results.sort_by(|a, b| {
            a.health_score
                .partial_cmp(&b.health_score)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then_with(|| a.webmaster.cmp(&b.webmaster))
        });
        results
    }

    fn analyse_one(
        &self,
        leads: &[Lead],
        metrics: WebmasterMetrics,
        analysis_date: NaiveDate,
        period_days: i64,
        avg_approve_pct: f64,
        avg_trash_pct: f64,
    ) -> WebmasterAnalysis {
        let adj_buyout = adjusted_buyout_pct(
            leads,
            &self.config.statuses,
            &self.config.curve,
            &metrics.webmaster,
            analysis_date,
            period_days,
        );

        let card = score(
            leads,
            &self.config.statuses,
            &self.config.curve,
            &metrics.webmaster,
            analysis_date,
        );
        let score_pct = if card.cohorts.is_empty() {
            None
        } else {
            Some(card.score_pct)
        };

        let health = health_score(metrics.approve_pct, adj_buyout, metrics.trash_pct);
        let issues = detect_issues(
            metrics.approve_pct,
            adj_buyout,
            metrics.trash_pct,
            score_pct,
            avg_approve_pct,
            avg_trash_pct,
            &self.config.thresholds,
        );

        WebmasterAnalysis {
            webmaster: metrics.webmaster,
            total_leads: metrics.total,
            approved: metrics.approved,
            bought_out: metrics.bought_out,
            trash: metrics.trash,
            approve_pct: metrics.approve_pct,
            buyout_pct: metrics.buyout_pct,
            adj_buyout_pct: adj_buyout,
            trash_pct: metrics.trash_pct,
            score_pct,
            health_score: health,
            band: HealthBand::for_value(health),
            ok: issues.is_empty(),
            issues: issues.iter().map(|i| i.to_string()).collect(),
            report_id: None,
            report_created_at: None,
        }
    }

    /// Analyse every webmaster over the trailing period
    pub async fn run(&self, period_days: i64) -> Result<Vec<WebmasterAnalysis>> {
        let period_days = validate_period(period_days)?;
        let today = self.clock.today();
        let since = today - Days::new(period_days as u64);

        let leads = self.leads.fetch(None, Some(since)).await?;
        debug!(
            lead_count = leads.len(),
            period_days, "Analysing trailing period"
        );
        Ok(self.analyse_leads(&leads, today, period_days))
    }

    /// Analyse and persist: one report row per webmaster plus a status upsert.
    ///
    /// With `webmaster` set, fleet averages still come from the whole fleet
    /// but only that webmaster's rows are written and returned.
    pub async fn run_and_save(
        &self,
        period_days: i64,
        webmaster: Option<&str>,
    ) -> Result<Vec<WebmasterAnalysis>> {
        let mut results = self.run(period_days).await?;
        let (avg_approve_pct, avg_trash_pct) = result_averages(&results);

        if let Some(name) = webmaster {
            results.retain(|r| r.webmaster == name);
            if results.is_empty() {
                return Err(AppError::NotFound(format!(
                    "no leads for webmaster '{name}' in the last {period_days} days"
                )));
            }
        }

        for analysis in &mut results {
            let record = self
                .reports
                .insert_report(&NewReport {
                    webmaster: analysis.webmaster.clone(),
                    period_days,
                    total_leads: analysis.total_leads as i64,
                    approved: analysis.approved as i64,
                    bought_out: analysis.bought_out as i64,
                    trash: analysis.trash as i64,
                    approve_pct: analysis.approve_pct,
                    buyout_pct: analysis.adj_buyout_pct,
                    trash_pct: analysis.trash_pct,
                    score_pct: analysis.score_pct,
                    issues: analysis.issues.clone(),
                })
                .await?;

            self.reports
                .upsert_status(&NewStatus {
                    webmaster: analysis.webmaster.clone(),
                    period_days,
                    total_leads: analysis.total_leads as i64,
                    approved: analysis.approved as i64,
                    bought_out: analysis.bought_out as i64,
                    trash: analysis.trash as i64,
                    approve_pct: analysis.approve_pct,
                    avg_approve_pct,
                    adj_buyout_pct: analysis.adj_buyout_pct,
                    trash_pct: analysis.trash_pct,
                    avg_trash_pct,
                    score_pct: analysis.score_pct,
                    health_score: analysis.health_score,
                    ok: analysis.ok,
                    issues: analysis.issues.clone(),
                })
                .await?;

            analysis.report_id = Some(record.id);
            analysis.report_created_at = Some(record.created_at);
        }

        info!(
            webmasters = results.len(),
            flagged = results.iter().filter(|r| !r.ok).count(),
            period_days,
            "Analysis persisted"
        );
        Ok(results)
    }

    /// Per-webmaster quality metrics over the trailing period
    pub async fn summary(&self, period_days: i64) -> Result<Vec<WebmasterMetrics>> {
        let period_days = validate_period(period_days)?;
        let since = self.clock.today() - Days::new(period_days as u64);
        let leads = self.leads.fetch(None, Some(since)).await?;
        Ok(domain::summary(&leads, &self.config.statuses))
    }

    /// Detailed 8-day score card for one webmaster
    pub async fn score_card(&self, webmaster: &str) -> Result<ScoreCard> {
        let today = self.clock.today();
        let since = today - Days::new(domain::SCORING_WINDOW_DAYS as u64);
        let leads = self.leads.fetch(Some(webmaster), Some(since)).await?;
        Ok(score(
            &leads,
            &self.config.statuses,
            &self.config.curve,
            webmaster,
            today,
        ))
    }

    /// Quality metrics over the most recent `n` leads of one webmaster
    pub async fn last_n(&self, webmaster: &str, n: usize) -> Result<WebmasterMetrics> {
        if n == 0 {
            return Err(AppError::Validation(
                "n must be positive".to_string(),
            ));
        }
        let leads = self.leads.fetch(Some(webmaster), None).await?;
        Ok(domain::last_n(&leads, &self.config.statuses, webmaster, n))
    }

    /// Day-by-day counters for one webmaster over the trailing period
    pub async fn daily(&self, webmaster: &str, period_days: i64) -> Result<Vec<DailyRow>> {
        let period_days = validate_period(period_days)?;
        let since = self.clock.today() - Days::new(period_days as u64);
        let leads = self.leads.fetch(Some(webmaster), Some(since)).await?;
        if leads.is_empty() {
            return Err(AppError::NotFound(format!(
                "no leads for webmaster '{webmaster}' in the last {period_days} days"
            )));
        }
        Ok(domain::daily_breakdown(
            &leads,
            &self.config.statuses,
            webmaster,
        ))
    }
}

fn validate_period(period_days: i64) -> Result<i64> {
    if period_days <= 0 {
        return Err(AppError::Validation(format!(
            "period_days must be positive, got {period_days}"
        )));
    }
    Ok(period_days)
}

/// Unweighted fleet averages across webmasters, 2 decimal places
fn fleet_averages(summary: &[WebmasterMetrics]) -> (f64, f64) {
    if summary.is_empty() {
        return (0.0, 0.0);
    }
    let n = summary.len() as f64;
    let approve = summary.iter().map(|m| m.approve_pct).sum::<f64>() / n;
    let trash = summary.iter().map(|m| m.trash_pct).sum::<f64>() / n;
    (
        (approve * 100.0).round() / 100.0,
        (trash * 100.0).round() / 100.0,
    )
}

fn result_averages(results: &[WebmasterAnalysis]) -> (f64, f64) {
    if results.is_empty() {
        return (0.0, 0.0);
    }
    let n = results.len() as f64;
    let approve = results.iter().map(|r| r.approve_pct).sum::<f64>() / n;
    let trash = results.iter().map(|r| r.trash_pct).sum::<f64>() / n;
    (
        (approve * 100.0).round() / 100.0,
        (trash * 100.0).round() / 100.0,
    )
}
