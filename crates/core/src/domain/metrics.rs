// Core metric calculations over a set of leads

use std::cmp::Ordering;
use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::Serialize;

use crate::domain::lead::{Lead, StatusMap};
use crate::domain::round_dp;

/// Approve/buyout/trash counters and percentages for one webmaster.
///
/// `buyout_pct` is measured against approved leads, not all leads.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WebmasterMetrics {
    pub webmaster: String,
    pub total: u64,
    pub approved: u64,
    pub bought_out: u64,
    pub trash: u64,
    pub approve_pct: f64,
    pub buyout_pct: f64,
    pub trash_pct: f64,
}

/// Per-day counters for one webmaster
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DailyRow {
    pub date: NaiveDate,
    pub leads: u64,
    pub approved: u64,
    pub bought_out: u64,
    pub trash: u64,
    pub approve_pct: f64,
    pub buyout_pct: f64,
    pub trash_pct: f64,
}

/// Safe percentage (0-100, two decimals, 0.0 on a zero denominator)
pub(crate) fn pct(numerator: u64, denominator: u64) -> f64 {
    if denominator == 0 {
        0.0
    } else {
        round_dp(numerator as f64 / denominator as f64 * 100.0, 2)
    }
}

#[derive(Debug, Default, Clone, Copy)]
struct Counters {
    total: u64,
    approved: u64,
    bought_out: u64,
    trash: u64,
}

impl Counters {
    fn add(&mut self, lead: &Lead, statuses: &StatusMap) {
        self.total += 1;
        if statuses.is_approved(lead.status) {
            self.approved += 1;
        }
        if statuses.is_bought_out(lead.status) {
            self.bought_out += 1;
        }
        if statuses.is_trash(lead.status) {
            self.trash += 1;
        }
    }
}

fn metrics_from_counters(webmaster: &str, c: Counters) -> WebmasterMetrics {
    WebmasterMetrics {
        webmaster: webmaster.to_string(),
        total: c.total,
        approved: c.approved,
        bought_out: c.bought_out,
        trash: c.trash,
        approve_pct: pct(c.approved, c.total),
        buyout_pct: pct(c.bought_out, c.approved),
        trash_pct: pct(c.trash, c.total),
    }
}

/// Metrics over all of one webmaster's leads
pub fn metrics_for(leads: &[Lead], statuses: &StatusMap, webmaster: &str) -> WebmasterMetrics {
    let mut counters = Counters::default();
    for lead in leads.iter().filter(|l| l.webmaster == webmaster) {
        counters.add(lead, statuses);
    }
    metrics_from_counters(webmaster, counters)
}

/// One [`WebmasterMetrics`] row per webmaster, sorted by buyout percentage
/// descending (webmaster name breaks ties for deterministic output)
pub fn summary(leads: &[Lead], statuses: &StatusMap) -> Vec<WebmasterMetrics> {
    let mut by_webmaster: BTreeMap<&str, Counters> = BTreeMap::new();
    for lead in leads {
        by_webmaster
            .entry(lead.webmaster.as_str())
            .or_default()
            .add(lead, statuses);
    }

    let mut rows: Vec<WebmasterMetrics> = by_webmaster
        .into_iter()
        .map(|(webmaster, counters)| metrics_from_counters(webmaster, counters))
        .collect();

    rows.sort_by(|a, b| {
        b.buyout_pct
            .partial_cmp(&a.buyout_pct)
            .unwrap_or(Ordering::Equal)
            .then_with(|| a.webmaster.cmp(&b.webmaster))
    });
    rows
}

/// Metrics over the `n` most recent leads of one webmaster (most recent by
/// date, lead id as tiebreaker)
pub fn last_n(leads: &[Lead], statuses: &StatusMap, webmaster: &str, n: usize) -> WebmasterMetrics {
    let mut own: Vec<&Lead> = leads.iter().filter(|l| l.webmaster == webmaster).collect();
    own.sort_by(|a, b| b.date.cmp(&a.date).then_with(|| b.id.cmp(&a.id)));
    own.truncate(n);

    let mut counters = Counters::default();
    for lead in own {
        counters.add(lead, statuses);
    }
    metrics_from_counters(webmaster, counters)
}

/// Per-day counters and percentages for one webmaster, ascending by date
pub fn daily_breakdown(leads: &[Lead], statuses: &StatusMap, webmaster: &str) -> Vec<DailyRow> {
    let mut by_day: BTreeMap<NaiveDate, Counters> = BTreeMap::new();
    for lead in leads.iter().filter(|l| l.webmaster == webmaster) {
        by_day.entry(lead.date).or_default().add(lead, statuses);
    }

    by_day
        .into_iter()
        .map(|(date, c)| DailyRow {
            date,
            leads: c.total,
            approved: c.approved,
            bought_out: c.bought_out,
            trash: c.trash,
            approve_pct: pct(c.approved, c.total),
            buyout_pct: pct(c.bought_out, c.approved),
            trash_pct: pct(c.trash, c.total),
        })
        .collect()
}

/// Distinct webmasters present in a set of leads, sorted by name
pub fn webmasters(leads: &[Lead]) -> Vec<String> {
    let mut names: Vec<String> = leads
        .iter()
        .map(|l| l.webmaster.clone())
        .collect::<std::collections::BTreeSet<_>>()
        .into_iter()
        .collect();
    names.sort();
    names
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    fn lead(id: i64, status: i32, day: &str, webmaster: &str) -> Lead {
        Lead {
            id,
            status,
            date: date(day),
            webmaster: webmaster.to_string(),
            amount: 100.0,
            comment: None,
        }
    }

    #[test]
    fn buyout_pct_is_relative_to_approved() {
        // 4 leads: 2 approved (one of them bought out), 1 trash, 1 new
        let leads = vec![
            lead(1, 2, "2025-03-10", "wm-a"),
            lead(2, 4, "2025-03-10", "wm-a"),
            lead(3, 6, "2025-03-11", "wm-a"),
            lead(4, 1, "2025-03-11", "wm-a"),
        ];
        let m = metrics_for(&leads, &StatusMap::default(), "wm-a");

        assert_eq!(m.total, 4);
        assert_eq!(m.approved, 2);
        assert_eq!(m.bought_out, 1);
        assert_eq!(m.trash, 1);
        assert_eq!(m.approve_pct, 50.0);
        assert_eq!(m.buyout_pct, 50.0); // 1 of 2 approved, not 1 of 4
        assert_eq!(m.trash_pct, 25.0);
    }

    #[test]
    fn zero_denominators_yield_zero_percent() {
        let leads = vec![lead(1, 1, "2025-03-10", "wm-a")];
        let m = metrics_for(&leads, &StatusMap::default(), "wm-a");
        assert_eq!(m.approve_pct, 0.0);
        assert_eq!(m.buyout_pct, 0.0);

        let empty = metrics_for(&[], &StatusMap::default(), "wm-b");
        assert_eq!(empty.total, 0);
        assert_eq!(empty.approve_pct, 0.0);
    }

    #[test]
    fn summary_sorts_by_buyout_desc() {
        let leads = vec![
            // wm-a: 1/2 approved bought out -> 50%
            lead(1, 2, "2025-03-10", "wm-a"),
            lead(2, 4, "2025-03-10", "wm-a"),
            // wm-b: 2/2 approved bought out -> 100%
            lead(3, 4, "2025-03-10", "wm-b"),
            lead(4, 4, "2025-03-10", "wm-b"),
        ];
        let rows = summary(&leads, &StatusMap::default());
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].webmaster, "wm-b");
        assert_eq!(rows[0].buyout_pct, 100.0);
        assert_eq!(rows[1].webmaster, "wm-a");
    }

    #[test]
    fn last_n_takes_most_recent_by_date() {
        let leads = vec![
            lead(1, 6, "2025-03-01", "wm-a"), // old trash, outside window of 2
            lead(2, 4, "2025-03-10", "wm-a"),
            lead(3, 2, "2025-03-11", "wm-a"),
        ];
        let m = last_n(&leads, &StatusMap::default(), "wm-a", 2);
        assert_eq!(m.total, 2);
        assert_eq!(m.trash, 0);
        assert_eq!(m.approved, 2);
    }

    #[test]
    fn last_n_breaks_date_ties_by_id() {
        let leads = vec![
            lead(10, 6, "2025-03-10", "wm-a"),
            lead(11, 4, "2025-03-10", "wm-a"),
            lead(12, 4, "2025-03-10", "wm-a"),
        ];
        // n = 2 keeps the two highest ids on the shared date
        let m = last_n(&leads, &StatusMap::default(), "wm-a", 2);
        assert_eq!(m.bought_out, 2);
        assert_eq!(m.trash, 0);
    }

    #[test]
    fn daily_breakdown_groups_and_sorts() {
        let leads = vec![
            lead(1, 4, "2025-03-11", "wm-a"),
            lead(2, 2, "2025-03-10", "wm-a"),
            lead(3, 6, "2025-03-10", "wm-a"),
            lead(4, 2, "2025-03-10", "wm-b"), // other webmaster ignored
        ];
        let rows = daily_breakdown(&leads, &StatusMap::default(), "wm-a");
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].date, date("2025-03-10"));
        assert_eq!(rows[0].leads, 2);
        assert_eq!(rows[0].trash, 1);
        assert_eq!(rows[1].date, date("2025-03-11"));
        assert_eq!(rows[1].bought_out, 1);
    }
}
