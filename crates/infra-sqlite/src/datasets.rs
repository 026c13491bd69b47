// Reporting Datasets
// Named SQL views over the lead store, consumed by BI dashboards. The SQL
// is rendered once per process from the configured status map so dashboards
// and the analysis pipeline never disagree on what counts as approved.

use async_trait::async_trait;
use sqlx::sqlite::SqliteRow;
use sqlx::{Column, Row, SqlitePool, TypeInfo, ValueRef};

use leadwatch_core::domain::health::{HEALTH_GREEN_MIN, HEALTH_YELLOW_MIN};
use leadwatch_core::domain::{StatusCode, StatusMap};
use leadwatch_core::error::{AppError, Result};
use leadwatch_core::port::{DatasetCatalog, DatasetSpec};

use crate::map_sqlx_error;

pub struct SqliteDatasetCatalog {
    pool: SqlitePool,
    datasets: Vec<DatasetSpec>,
}

impl SqliteDatasetCatalog {
    pub fn new(pool: SqlitePool, statuses: &StatusMap) -> Self {
        Self {
            pool,
            datasets: builtin_datasets(statuses),
        }
    }
}

#[async_trait]
impl DatasetCatalog for SqliteDatasetCatalog {
    fn list(&self) -> Vec<DatasetSpec> {
        self.datasets.clone()
    }

    async fn run(&self, name: &str) -> Result<Vec<serde_json::Value>> {
        let dataset = self
            .datasets
            .iter()
            .find(|d| d.name == name)
            .ok_or_else(|| AppError::NotFound(format!("dataset '{name}' not found")))?;

        let rows = sqlx::query(&dataset.sql)
            .fetch_all(&self.pool)
            .await
            .map_err(map_sqlx_error)?;

        rows.iter().map(row_to_json).collect()
    }
}

fn in_list(codes: impl Iterator<Item = StatusCode>) -> String {
    codes
        .map(|c| c.to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

/// The shipped datasets, with status-class IN lists baked in
pub fn builtin_datasets(statuses: &StatusMap) -> Vec<DatasetSpec> {
    let approve = in_list(statuses.approve_codes());
    let buyout = in_list(statuses.buyout_codes());
    let trash = in_list(statuses.trash_codes());

    let columns = |names: &[&str]| names.iter().map(|n| n.to_string()).collect::<Vec<_>>();

    vec![
        DatasetSpec {
            name: "webmaster_summary".to_string(),
            title: "Webmaster summary".to_string(),
            description: "Lead counts and quality percentages per webmaster, \
                          best buyout first"
                .to_string(),
            columns: columns(&[
                "webmaster",
                "total_leads",
                "approved",
                "bought_out",
                "trash",
                "approve_pct",
                "buyout_pct",
                "trash_pct",
            ]),
            sql: format!(
                r#"SELECT
    webmaster,
    COUNT(*) AS total_leads,
    SUM(CASE WHEN status IN ({approve}) THEN 1 ELSE 0 END) AS approved,
    SUM(CASE WHEN status IN ({buyout}) THEN 1 ELSE 0 END) AS bought_out,
    SUM(CASE WHEN status IN ({trash}) THEN 1 ELSE 0 END) AS trash,
    ROUND(100.0 * SUM(CASE WHEN status IN ({approve}) THEN 1 ELSE 0 END) / COUNT(*), 2) AS approve_pct,
    CASE
        WHEN SUM(CASE WHEN status IN ({approve}) THEN 1 ELSE 0 END) = 0 THEN 0.0
        ELSE ROUND(100.0 * SUM(CASE WHEN status IN ({buyout}) THEN 1 ELSE 0 END)
                   / SUM(CASE WHEN status IN ({approve}) THEN 1 ELSE 0 END), 2)
    END AS buyout_pct,
    ROUND(100.0 * SUM(CASE WHEN status IN ({trash}) THEN 1 ELSE 0 END) / COUNT(*), 2) AS trash_pct
FROM leads
GROUP BY webmaster
ORDER BY buyout_pct DESC, webmaster ASC"#
            ),
        },
        DatasetSpec {
            name: "webmaster_health".to_string(),
            title: "Webmaster health".to_string(),
            description: "Current health score and traffic-light band per \
                          webmaster, weakest first"
                .to_string(),
            columns: columns(&[
                "webmaster",
                "health_score",
                "band",
                "approve_pct",
                "adj_buyout_pct",
                "trash_pct",
                "score_pct",
                "ok",
                "updated_at",
            ]),
            sql: format!(
                r#"SELECT
    webmaster,
    health_score,
    CASE
        WHEN health_score >= {green} THEN 'green'
        WHEN health_score >= {yellow} THEN 'yellow'
        ELSE 'red'
    END AS band,
    approve_pct,
    adj_buyout_pct,
    trash_pct,
    score_pct,
    ok,
    updated_at
FROM webmaster_status
ORDER BY health_score ASC, webmaster ASC"#,
                green = HEALTH_GREEN_MIN,
                yellow = HEALTH_YELLOW_MIN,
            ),
        },
        DatasetSpec {
            name: "status_distribution".to_string(),
            title: "Status distribution".to_string(),
            description: "How stored leads spread across raw CRM status codes".to_string(),
            columns: columns(&["status", "class", "leads", "share_pct"]),
            sql: format!(
                r#"SELECT
    status,
    CASE
        WHEN status IN ({buyout}) THEN 'buyout'
        WHEN status IN ({approve}) THEN 'approve'
        WHEN status IN ({trash}) THEN 'trash'
        ELSE 'other'
    END AS class,
    COUNT(*) AS leads,
    ROUND(100.0 * COUNT(*) / (SELECT COUNT(*) FROM leads), 2) AS share_pct
FROM leads
GROUP BY status
ORDER BY leads DESC, status ASC"#
            ),
        },
        DatasetSpec {
            name: "report_history".to_string(),
            title: "Report history".to_string(),
            description: "Every persisted analysis run, newest first".to_string(),
            columns: columns(&[
                "id",
                "webmaster",
                "created_at",
                "period_days",
                "total_leads",
                "approve_pct",
                "buyout_pct",
                "trash_pct",
                "score_pct",
            ]),
            sql: r#"SELECT
    id,
    webmaster,
    created_at,
    period_days,
    total_leads,
    approve_pct,
    buyout_pct,
    trash_pct,
    score_pct
FROM webmaster_reports
ORDER BY created_at DESC, id DESC"#
                .to_string(),
        },
    ]
}

/// Convert a result row into a JSON object keyed by column name
fn row_to_json(row: &SqliteRow) -> Result<serde_json::Value> {
    let mut object = serde_json::Map::new();

    for (index, column) in row.columns().iter().enumerate() {
        let raw = row.try_get_raw(index).map_err(map_sqlx_error)?;
        let value = if raw.is_null() {
            serde_json::Value::Null
        } else {
            match raw.type_info().name() {
                "INTEGER" => {
                    serde_json::Value::from(row.try_get::<i64, _>(index).map_err(map_sqlx_error)?)
                }
                "REAL" => {
                    serde_json::Value::from(row.try_get::<f64, _>(index).map_err(map_sqlx_error)?)
                }
                _ => serde_json::Value::from(
                    row.try_get::<String, _>(index).map_err(map_sqlx_error)?,
                ),
            }
        };
        object.insert(column.name().to_string(), value);
    }

    Ok(serde_json::Value::Object(object))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{create_pool, run_migrations, SqliteLeadRepository, SqliteReportRepository};
    use chrono::NaiveDate;
    use leadwatch_core::domain::Lead;
    use leadwatch_core::port::{
        Clock, LeadRepository, NewReport, NewStatus, ReportRepository, SystemClock,
    };
    use std::collections::BTreeSet;
    use std::sync::Arc;

    fn lead(id: i64, status: i32, webmaster: &str) -> Lead {
        Lead {
            id,
            status,
            date: NaiveDate::parse_from_str("2025-03-10", "%Y-%m-%d").unwrap(),
            webmaster: webmaster.to_string(),
            amount: 100.0,
            comment: None,
        }
    }

    async fn seeded_catalog() -> SqliteDatasetCatalog {
        let pool = create_pool("sqlite::memory:").await.unwrap();
        run_migrations(&pool).await.unwrap();

        let clock: Arc<dyn Clock> = Arc::new(SystemClock);
        let leads = SqliteLeadRepository::new(pool.clone(), Arc::clone(&clock));
        leads
            .upsert_batch(&[
                lead(1, 2, "wm-a"),
                lead(2, 4, "wm-a"),
                lead(3, 6, "wm-a"),
                lead(4, 1, "wm-a"),
            ])
            .await
            .unwrap();

        let reports = SqliteReportRepository::new(pool.clone(), clock);
        reports
            .insert_report(&NewReport {
                webmaster: "wm-a".to_string(),
                period_days: 30,
                total_leads: 4,
                approved: 2,
                bought_out: 1,
                trash: 1,
                approve_pct: 50.0,
                buyout_pct: 50.0,
                trash_pct: 25.0,
                score_pct: None,
                issues: vec![],
            })
            .await
            .unwrap();
        reports
            .upsert_status(&NewStatus {
                webmaster: "wm-a".to_string(),
                period_days: 30,
                total_leads: 4,
                approved: 2,
                bought_out: 1,
                trash: 1,
                approve_pct: 50.0,
                avg_approve_pct: 50.0,
                adj_buyout_pct: 50.0,
                trash_pct: 25.0,
                avg_trash_pct: 25.0,
                score_pct: None,
                health_score: 55.0,
                ok: false,
                issues: vec!["flagged".to_string()],
            })
            .await
            .unwrap();

        SqliteDatasetCatalog::new(pool, &StatusMap::default())
    }

    #[tokio::test]
    async fn every_dataset_returns_exactly_its_documented_columns() {
        let catalog = seeded_catalog().await;

        for dataset in catalog.list() {
            let rows = catalog.run(&dataset.name).await.unwrap();
            assert!(!rows.is_empty(), "dataset {} returned no rows", dataset.name);

            let keys: BTreeSet<String> = rows[0]
                .as_object()
                .unwrap()
                .keys()
                .cloned()
                .collect();
            let documented: BTreeSet<String> = dataset.columns.iter().cloned().collect();
            assert_eq!(keys, documented, "column mismatch in {}", dataset.name);
        }
    }

    #[tokio::test]
    async fn summary_dataset_computes_percentages() {
        let catalog = seeded_catalog().await;
        let rows = catalog.run("webmaster_summary").await.unwrap();
        assert_eq!(rows.len(), 1);

        let row = rows[0].as_object().unwrap();
        assert_eq!(row["webmaster"], "wm-a");
        assert_eq!(row["total_leads"], 4);
        assert_eq!(row["approved"], 2);
        assert_eq!(row["bought_out"], 1);
        assert_eq!(row["approve_pct"], 50.0);
        // Buyout is relative to approved leads
        assert_eq!(row["buyout_pct"], 50.0);
        assert_eq!(row["trash_pct"], 25.0);
    }

    #[tokio::test]
    async fn distribution_classifies_buyout_before_approve() {
        let catalog = seeded_catalog().await;
        let rows = catalog.run("status_distribution").await.unwrap();

        let class_of = |code: i64| {
            rows.iter()
                .map(|r| r.as_object().unwrap())
                .find(|r| r["status"] == code)
                .map(|r| r["class"].as_str().unwrap().to_string())
                .unwrap()
        };
        assert_eq!(class_of(4), "buyout");
        assert_eq!(class_of(2), "approve");
        assert_eq!(class_of(6), "trash");
        assert_eq!(class_of(1), "other");
    }

    #[tokio::test]
    async fn health_dataset_bands_scores() {
        let catalog = seeded_catalog().await;
        let rows = catalog.run("webmaster_health").await.unwrap();
        let row = rows[0].as_object().unwrap();
        assert_eq!(row["band"], "red");
        assert_eq!(row["health_score"], 55.0);
        assert_eq!(row["score_pct"], serde_json::Value::Null);
    }

    #[tokio::test]
    async fn unknown_dataset_is_not_found() {
        let catalog = seeded_catalog().await;
        let err = catalog.run("nope").await.unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }
}
