//! End-to-end pipeline tests over a real SQLite store: CSV export ->
//! ingest -> analysis -> persisted reports and status rows.

use std::io::Write;
use std::sync::Arc;

use chrono::{DateTime, NaiveDate, Utc};
use tempfile::NamedTempFile;

use leadwatch_core::application::{AnalysisConfig, AnalysisService, IngestService, ReportScheduler};
use leadwatch_core::domain::LeadDraft;
use leadwatch_core::error::AppError;
use leadwatch_core::port::{Clock, LeadRepository, ReportRepository};
use leadwatch_infra_csv::CsvLeadSource;
use leadwatch_infra_sqlite::{
    create_pool, run_migrations, SqliteLeadRepository, SqliteReportRepository,
};

/// Analysis date all tests pin the clock to
const TODAY: &str = "2025-03-20";

struct FixedClock(NaiveDate);

impl Clock for FixedClock {
    fn now_utc(&self) -> DateTime<Utc> {
        self.0
            .and_hms_opt(12, 0, 0)
            .map(|dt| dt.and_utc())
            .unwrap_or_else(Utc::now)
    }
}

fn date(s: &str) -> NaiveDate {
    s.parse().unwrap()
}

fn draft(id: i64, status: i32, day: &str, webmaster: &str) -> LeadDraft {
    LeadDraft {
        id,
        status,
        date: date(day),
        webmaster: webmaster.to_string(),
        amount: 100.0,
        comment: None,
    }
}

struct Stack {
    leads: Arc<SqliteLeadRepository>,
    reports: Arc<SqliteReportRepository>,
    ingest: IngestService,
    analysis: Arc<AnalysisService>,
}

async fn stack(url: &str) -> Stack {
    let pool = create_pool(url).await.unwrap();
    run_migrations(&pool).await.unwrap();

    let clock: Arc<dyn Clock> = Arc::new(FixedClock(date(TODAY)));
    let leads = Arc::new(SqliteLeadRepository::new(pool.clone(), Arc::clone(&clock)));
    let reports = Arc::new(SqliteReportRepository::new(pool, Arc::clone(&clock)));

    let ingest = IngestService::new(leads.clone(), Arc::new(CsvLeadSource));
    let analysis = Arc::new(AnalysisService::new(
        leads.clone(),
        reports.clone(),
        clock,
        AnalysisConfig::default(),
    ));

    Stack {
        leads,
        reports,
        ingest,
        analysis,
    }
}

#[tokio::test]
async fn batch_ingest_analyse_persist() {
    let s = stack("sqlite::memory:").await;

    // wm-good: all approved, most bought out. wm-bad: mostly trash.
    let mut drafts = Vec::new();
    for i in 0..6 {
        drafts.push(draft(i, if i < 5 { 4 } else { 2 }, "2025-03-10", "wm-good"));
    }
    for i in 10..20 {
        drafts.push(draft(i, if i < 16 { 6 } else { 2 }, "2025-03-10", "wm-bad"));
    }

    let outcome = s.ingest.ingest_batch(drafts).await.unwrap();
    assert_eq!(outcome.received, 16);
    assert_eq!(outcome.upserted, 16);
    assert_eq!(outcome.skipped, 0);

    let results = s.analysis.run_and_save(30, None).await.unwrap();
    assert_eq!(results.len(), 2);

    // Worst health comes first and carries the issue flags
    assert_eq!(results[0].webmaster, "wm-bad");
    assert!(results[0].health_score < results[1].health_score);
    assert!(!results[0].ok);
    assert!(!results[0].issues.is_empty());
    assert!(results[1].ok);

    // Each webmaster got a report row and a status row
    assert_eq!(s.reports.list_reports(None, 50).await.unwrap().len(), 2);
    let board = s.reports.status_snapshot().await.unwrap();
    assert_eq!(board.len(), 2);
    assert_eq!(board[0].webmaster, "wm-bad");

    // Re-running appends reports but keeps one status row per webmaster
    s.analysis.run_and_save(30, None).await.unwrap();
    assert_eq!(s.reports.list_reports(None, 50).await.unwrap().len(), 4);
    assert_eq!(s.reports.status_snapshot().await.unwrap().len(), 2);
}

#[tokio::test]
async fn csv_import_flows_into_the_store() {
    let s = stack("sqlite::memory:").await;

    let mut file = NamedTempFile::new().unwrap();
    write!(
        file,
        "id,status,date,webmaster,amount,comment\n\
         1,2,2025-03-10,wm-a,1500,first\n\
         2,4,2025-03-10,wm-a,900,\n\
         3,6,11.03.2025,wm-b,0,duplicate\n\
         broken,2,2025-03-10,wm-a,0,\n"
    )
    .unwrap();

    let outcome = s.ingest.import_file(file.path()).await.unwrap();
    assert_eq!(outcome.received, 4);
    assert_eq!(outcome.upserted, 3);
    assert_eq!(outcome.skipped, 1);

    let stored = s.leads.fetch(Some("wm-a"), None).await.unwrap();
    assert_eq!(stored.len(), 2);
    let first = stored.iter().find(|l| l.id == 1).unwrap();
    assert_eq!(first.comment.as_deref(), Some("first"));
    assert_eq!(first.amount, 1500.0);

    // The dotted export date landed as a real date
    let dotted = s.leads.fetch(Some("wm-b"), None).await.unwrap();
    assert_eq!(dotted[0].date, date("2025-03-11"));
}

#[tokio::test]
async fn leads_survive_restart() {
    let dir = tempfile::tempdir().unwrap();
    let url = format!("sqlite:{}", dir.path().join("leads.db").display());

    {
        let s = stack(&url).await;
        s.ingest
            .ingest_batch(vec![draft(1, 2, "2025-03-10", "wm-a")])
            .await
            .unwrap();
        // Pool dropped here, daemon "stops"
    }

    let s = stack(&url).await;
    let stored = s.leads.fetch(None, None).await.unwrap();
    assert_eq!(stored.len(), 1);
    assert_eq!(stored[0].webmaster, "wm-a");
}

#[tokio::test]
async fn scheduler_pass_writes_status_rows() {
    let s = stack("sqlite::memory:").await;
    s.ingest
        .ingest_batch(vec![
            draft(1, 2, "2025-03-18", "wm-a"),
            draft(2, 4, "2025-03-18", "wm-a"),
        ])
        .await
        .unwrap();

    let scheduler = ReportScheduler::new(s.analysis.clone(), 1, 30);
    let analysed = scheduler.run_once().await.unwrap();
    assert_eq!(analysed, 1);

    let status = s.reports.get_status("wm-a").await.unwrap().unwrap();
    assert_eq!(status.total_leads, 2);
    assert_eq!(status.approve_pct, 100.0);
}

#[tokio::test]
async fn patch_reclassifies_a_lead() {
    let s = stack("sqlite::memory:").await;
    s.ingest
        .ingest_batch(vec![
            draft(1, 1, "2025-03-18", "wm-a"),
            draft(2, 2, "2025-03-18", "wm-a"),
        ])
        .await
        .unwrap();

    // CRM support corrected the pending lead to trash
    s.ingest
        .patch_lead(1, Some(6), Some("manual review: junk"))
        .await
        .unwrap();

    let summary = s.analysis.summary(30).await.unwrap();
    assert_eq!(summary.len(), 1);
    assert_eq!(summary[0].trash, 1);
    assert_eq!(summary[0].trash_pct, 50.0);

    let err = s.ingest.patch_lead(999, Some(6), None).await.unwrap_err();
    assert!(matches!(err, AppError::NotFound(_)));
}

#[tokio::test]
async fn single_webmaster_run_keeps_fleet_context() {
    let s = stack("sqlite::memory:").await;
    s.ingest
        .ingest_batch(vec![
            draft(1, 2, "2025-03-15", "wm-a"),
            draft(2, 6, "2025-03-15", "wm-a"),
            draft(3, 2, "2025-03-15", "wm-b"),
            draft(4, 2, "2025-03-15", "wm-b"),
        ])
        .await
        .unwrap();

    let results = s.analysis.run_and_save(30, Some("wm-a")).await.unwrap();
    assert_eq!(results.len(), 1);
    assert_eq!(results[0].webmaster, "wm-a");

    // Only wm-a was persisted, but its averages come from the whole fleet
    assert!(s.reports.get_status("wm-b").await.unwrap().is_none());
    let status = s.reports.get_status("wm-a").await.unwrap().unwrap();
    assert_eq!(status.avg_approve_pct, 75.0);

    let err = s.analysis.run_and_save(30, Some("ghost")).await.unwrap_err();
    assert!(matches!(err, AppError::NotFound(_)));
}
