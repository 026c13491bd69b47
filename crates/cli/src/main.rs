//! Command-line client for the Leadwatch daemon.
//!
//! Talks plain JSON-RPC over HTTP. Params are always a single
//! named-field object, matching what the server parses.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use colored::Colorize;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tabled::{builder::Builder, Table, Tabled};

use leadwatch_core::port::LeadSource;
use leadwatch_infra_csv::CsvLeadSource;

const DEFAULT_RPC_URL: &str = "http://127.0.0.1:9620";

#[derive(Parser)]
#[command(name = "leadwatch")]
#[command(about = "Webmaster lead-quality dashboards from the terminal", version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// RPC server URL
    #[arg(long, env = "LEADWATCH_RPC_URL", default_value = DEFAULT_RPC_URL)]
    rpc_url: String,
}

#[derive(Subcommand)]
enum Commands {
    /// Parse a CSV lead export and send it to the daemon
    Import {
        /// Path to the CSV file
        file: PathBuf,
    },

    /// Per-webmaster quality metrics over a trailing window
    Summary {
        /// Window length in days
        #[arg(long, default_value = "30")]
        days: i64,
    },

    /// Age-weighted buyout score for one webmaster
    Score {
        /// Webmaster identifier
        webmaster: String,
    },

    /// Metrics over the most recent leads of one webmaster
    Last {
        /// Webmaster identifier
        webmaster: String,

        /// How many recent leads to consider
        #[arg(long, default_value = "100")]
        n: usize,
    },

    /// Day-by-day counters for one webmaster
    Daily {
        /// Webmaster identifier
        webmaster: String,

        /// Window length in days
        #[arg(long, default_value = "30")]
        days: i64,
    },

    /// Analyse the fleet now and persist report and status rows
    RunReports {
        /// Window length in days
        #[arg(long, default_value = "30")]
        days: i64,

        /// Restrict persisted rows to one webmaster
        #[arg(long)]
        webmaster: Option<String>,
    },

    /// Current standing of every webmaster, problematic first
    Status {
        /// Only webmasters with open issues
        #[arg(long)]
        only_issues: bool,
    },

    /// Saved report history, newest first
    Reports {
        /// Restrict to one webmaster
        #[arg(long)]
        webmaster: Option<String>,

        /// Maximum rows to fetch
        #[arg(long, default_value = "20")]
        limit: i64,
    },

    /// Reporting datasets behind the BI dashboards
    Datasets {
        #[command(subcommand)]
        command: DatasetCommands,
    },

    /// Daemon statistics
    Stats,
}

#[derive(Subcommand)]
enum DatasetCommands {
    /// List available datasets
    List,

    /// Run a dataset and print its rows
    Show {
        /// Dataset name, as shown by `datasets list`
        name: String,
    },

    /// Write each dataset's SQL into a directory
    Export {
        /// Target directory, created if missing
        #[arg(long)]
        dir: PathBuf,
    },
}

#[derive(Serialize)]
struct JsonRpcRequest {
    jsonrpc: String,
    method: String,
    params: serde_json::Value,
    id: u64,
}

#[derive(Deserialize)]
struct JsonRpcResponse {
    result: Option<serde_json::Value>,
    error: Option<JsonRpcError>,
}

#[derive(Deserialize)]
struct JsonRpcError {
    code: i32,
    message: String,
}

/// One webmaster's counters and shares, as the server reports them.
#[derive(Deserialize)]
struct MetricsRow {
    webmaster: String,
    total: u64,
    approved: u64,
    bought_out: u64,
    trash: u64,
    approve_pct: f64,
    buyout_pct: f64,
    trash_pct: f64,
}

#[derive(Tabled)]
struct SummaryDisplay {
    webmaster: String,
    leads: u64,
    approved: u64,
    #[tabled(rename = "bought out")]
    bought_out: u64,
    trash: u64,
    #[tabled(rename = "approve %")]
    approve: String,
    #[tabled(rename = "buyout %")]
    buyout: String,
    #[tabled(rename = "trash %")]
    trash_share: String,
}

impl From<MetricsRow> for SummaryDisplay {
    fn from(row: MetricsRow) -> Self {
        Self {
            webmaster: row.webmaster,
            leads: row.total,
            approved: row.approved,
            bought_out: row.bought_out,
            trash: row.trash,
            approve: pct(row.approve_pct),
            buyout: pct(row.buyout_pct),
            trash_share: pct(row.trash_pct),
        }
    }
}

#[derive(Deserialize)]
struct ScoreCardWire {
    webmaster: String,
    analysis_date: String,
    cohorts: Vec<CohortWire>,
    numerator: f64,
    denominator: f64,
    score_pct: f64,
}

#[derive(Deserialize)]
struct CohortWire {
    date: String,
    age_days: i64,
    leads: u64,
    bought_out: u64,
    actual_buyout_rate: f64,
    benchmark_rate: f64,
}

#[derive(Tabled)]
struct CohortDisplay {
    date: String,
    #[tabled(rename = "age (days)")]
    age: i64,
    leads: u64,
    #[tabled(rename = "bought out")]
    bought_out: u64,
    #[tabled(rename = "actual rate")]
    actual: String,
    #[tabled(rename = "benchmark")]
    benchmark: String,
}

impl From<CohortWire> for CohortDisplay {
    fn from(row: CohortWire) -> Self {
        Self {
            date: row.date,
            age: row.age_days,
            leads: row.leads,
            bought_out: row.bought_out,
            actual: format!("{:.3}", row.actual_buyout_rate),
            benchmark: format!("{:.3}", row.benchmark_rate),
        }
    }
}

/// One day of one webmaster's leads from `analysis.daily.v1`.
#[derive(Deserialize)]
struct DailyWire {
    date: String,
    leads: u64,
    approved: u64,
    bought_out: u64,
    trash: u64,
    approve_pct: f64,
    buyout_pct: f64,
    trash_pct: f64,
}

#[derive(Tabled)]
struct DailyDisplay {
    date: String,
    leads: u64,
    approved: u64,
    #[tabled(rename = "bought out")]
    bought_out: u64,
    trash: u64,
    #[tabled(rename = "approve %")]
    approve: String,
    #[tabled(rename = "buyout %")]
    buyout: String,
    #[tabled(rename = "trash %")]
    trash_share: String,
}

impl From<DailyWire> for DailyDisplay {
    fn from(row: DailyWire) -> Self {
        Self {
            date: row.date,
            leads: row.leads,
            approved: row.approved,
            bought_out: row.bought_out,
            trash: row.trash,
            approve: pct(row.approve_pct),
            buyout: pct(row.buyout_pct),
            trash_share: pct(row.trash_pct),
        }
    }
}

/// One analysed webmaster from `reports.run.v1`.
#[derive(Deserialize)]
struct AnalysisRow {
    webmaster: String,
    total_leads: u64,
    approve_pct: f64,
    adj_buyout_pct: f64,
    trash_pct: f64,
    score_pct: Option<f64>,
    health_score: f64,
    ok: bool,
    issues: Vec<String>,
}

#[derive(Tabled)]
struct AnalysisDisplay {
    webmaster: String,
    leads: u64,
    #[tabled(rename = "approve %")]
    approve: String,
    #[tabled(rename = "adj buyout %")]
    adj_buyout: String,
    #[tabled(rename = "trash %")]
    trash: String,
    #[tabled(rename = "score %")]
    score: String,
    health: String,
    ok: String,
    issues: String,
}

impl From<AnalysisRow> for AnalysisDisplay {
    fn from(row: AnalysisRow) -> Self {
        Self {
            webmaster: row.webmaster,
            leads: row.total_leads,
            approve: pct(row.approve_pct),
            adj_buyout: pct(row.adj_buyout_pct),
            trash: pct(row.trash_pct),
            score: paint_opt_score(row.score_pct),
            health: paint_health(row.health_score),
            ok: mark(row.ok),
            issues: join_issues(&row.issues),
        }
    }
}

/// One status-board row from `status.snapshot.v1` / `status.get.v1`.
#[derive(Deserialize)]
struct StatusWire {
    webmaster: String,
    approve_pct: f64,
    avg_approve_pct: f64,
    adj_buyout_pct: f64,
    trash_pct: f64,
    score_pct: Option<f64>,
    health_score: f64,
    ok: bool,
    issues: Vec<String>,
    updated_at: String,
}

#[derive(Tabled)]
struct StatusDisplay {
    webmaster: String,
    ok: String,
    health: String,
    #[tabled(rename = "approve %")]
    approve: String,
    #[tabled(rename = "adj buyout %")]
    adj_buyout: String,
    #[tabled(rename = "trash %")]
    trash: String,
    #[tabled(rename = "score %")]
    score: String,
    issues: String,
}

impl From<StatusWire> for StatusDisplay {
    fn from(row: StatusWire) -> Self {
        Self {
            webmaster: row.webmaster,
            ok: mark(row.ok),
            health: paint_health(row.health_score),
            approve: pct(row.approve_pct),
            adj_buyout: pct(row.adj_buyout_pct),
            trash: pct(row.trash_pct),
            score: paint_opt_score(row.score_pct),
            issues: join_issues(&row.issues),
        }
    }
}

#[derive(Deserialize)]
struct ReportWire {
    id: i64,
    webmaster: String,
    created_at: String,
    period_days: i64,
    total_leads: i64,
    approve_pct: f64,
    buyout_pct: f64,
    trash_pct: f64,
    score_pct: Option<f64>,
}

#[derive(Tabled)]
struct ReportDisplay {
    id: i64,
    webmaster: String,
    created: String,
    days: i64,
    leads: i64,
    #[tabled(rename = "approve %")]
    approve: String,
    #[tabled(rename = "adj buyout %")]
    adj_buyout: String,
    #[tabled(rename = "trash %")]
    trash: String,
    #[tabled(rename = "score %")]
    score: String,
}

impl From<ReportWire> for ReportDisplay {
    fn from(row: ReportWire) -> Self {
        Self {
            id: row.id,
            webmaster: row.webmaster,
            created: row.created_at.chars().take(19).collect(),
            days: row.period_days,
            leads: row.total_leads,
            approve: pct(row.approve_pct),
            adj_buyout: pct(row.buyout_pct),
            trash: pct(row.trash_pct),
            score: opt_pct(row.score_pct),
        }
    }
}

#[derive(Deserialize, Tabled)]
struct DatasetRow {
    name: String,
    title: String,
    description: String,
}

#[derive(Deserialize)]
struct DatasetFull {
    name: String,
    title: String,
    sql: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Import { file } => {
            let parsed = CsvLeadSource
                .load(&file)
                .await
                .map_err(|e| anyhow::anyhow!("{e}"))?;
            if parsed.leads.is_empty() {
                anyhow::bail!(
                    "no parsable leads in {} ({} rows skipped)",
                    file.display(),
                    parsed.skipped
                );
            }

            let result = call_rpc(
                &cli.rpc_url,
                "leads.ingest.v1",
                json!({ "leads": parsed.leads }),
            )
            .await?;

            println!("{}", format!("✓ Imported {}", file.display()).green().bold());
            if parsed.skipped > 0 {
                println!("  unparsable rows skipped: {}", parsed.skipped);
            }
            println!("  received: {}", result["received"]);
            println!("  upserted: {}", result["upserted"]);
            println!("  skipped:  {}", result["skipped"]);
        }

        Commands::Summary { days } => {
            let result = call_rpc(
                &cli.rpc_url,
                "analysis.summary.v1",
                json!({ "period_days": days }),
            )
            .await?;
            let rows: Vec<MetricsRow> = serde_json::from_value(result["webmasters"].clone())?;
            if rows.is_empty() {
                println!("{}", "No leads in the window".yellow());
                return Ok(());
            }

            println!(
                "{}",
                format!("Webmaster summary - last {days} days").cyan().bold()
            );
            let rows: Vec<SummaryDisplay> = rows.into_iter().map(Into::into).collect();
            println!("{}", Table::new(rows));
        }

        Commands::Score { webmaster } => {
            let result = call_rpc(
                &cli.rpc_url,
                "analysis.score.v1",
                json!({ "webmaster": webmaster }),
            )
            .await?;
            let card: ScoreCardWire = serde_json::from_value(result["card"].clone())?;

            println!(
                "{}",
                format!("Score card for {} ({})", card.webmaster, card.analysis_date)
                    .cyan()
                    .bold()
            );
            println!(
                "  score: {} (weighted actual {:.2} / benchmark {:.2})",
                paint_score(card.score_pct),
                card.numerator,
                card.denominator
            );
            let cohorts: Vec<CohortDisplay> = card.cohorts.into_iter().map(Into::into).collect();
            println!("{}", Table::new(cohorts));
        }

        Commands::Last { webmaster, n } => {
            let result = call_rpc(
                &cli.rpc_url,
                "analysis.last_n.v1",
                json!({ "webmaster": webmaster, "n": n }),
            )
            .await?;
            let row: MetricsRow = serde_json::from_value(result["metrics"].clone())?;

            println!(
                "{}",
                format!("Last {} leads of {}", result["n"], row.webmaster)
                    .cyan()
                    .bold()
            );
            println!("{}", Table::new(vec![SummaryDisplay::from(row)]));
        }

        Commands::Daily { webmaster, days } => {
            let result = call_rpc(
                &cli.rpc_url,
                "analysis.daily.v1",
                json!({ "webmaster": webmaster, "period_days": days }),
            )
            .await?;
            let rows: Vec<DailyWire> = serde_json::from_value(result["days"].clone())?;

            println!(
                "{}",
                format!("Daily breakdown for {webmaster} - last {days} days")
                    .cyan()
                    .bold()
            );
            let rows: Vec<DailyDisplay> = rows.into_iter().map(Into::into).collect();
            println!("{}", Table::new(rows));
        }

        Commands::RunReports { days, webmaster } => {
            let params = match &webmaster {
                Some(name) => json!({ "period_days": days, "webmaster": name }),
                None => json!({ "period_days": days }),
            };
            let result = call_rpc(&cli.rpc_url, "reports.run.v1", params).await?;
            let rows: Vec<AnalysisRow> = serde_json::from_value(result["webmasters"].clone())?;

            println!(
                "{}",
                format!(
                    "✓ Analysed {} webmasters over {} days, {} flagged",
                    result["analysed"], result["period_days"], result["flagged"]
                )
                .green()
                .bold()
            );
            let rows: Vec<AnalysisDisplay> = rows.into_iter().map(Into::into).collect();
            println!("{}", Table::new(rows));
        }

        Commands::Status { only_issues } => {
            let result = call_rpc(
                &cli.rpc_url,
                "status.snapshot.v1",
                json!({ "only_issues": only_issues }),
            )
            .await?;
            let rows: Vec<StatusWire> = serde_json::from_value(result["webmasters"].clone())?;
            if rows.is_empty() {
                let note = if only_issues {
                    "No webmasters with open issues"
                } else {
                    "No status rows yet - run `leadwatch run-reports` first"
                };
                println!("{}", note.yellow());
                return Ok(());
            }

            let updated = rows
                .first()
                .map(|r| r.updated_at.chars().take(19).collect::<String>())
                .unwrap_or_default();
            println!(
                "{}",
                format!("Webmaster status board (as of {updated})").cyan().bold()
            );
            let rows: Vec<StatusDisplay> = rows.into_iter().map(Into::into).collect();
            println!("{}", Table::new(rows));
        }

        Commands::Reports { webmaster, limit } => {
            let params = match &webmaster {
                Some(name) => json!({ "webmaster": name, "limit": limit }),
                None => json!({ "limit": limit }),
            };
            let result = call_rpc(&cli.rpc_url, "reports.list.v1", params).await?;
            let rows: Vec<ReportWire> = serde_json::from_value(result["reports"].clone())?;
            if rows.is_empty() {
                println!("{}", "No saved reports".yellow());
                return Ok(());
            }

            println!("{}", format!("Saved reports ({})", rows.len()).cyan().bold());
            let rows: Vec<ReportDisplay> = rows.into_iter().map(Into::into).collect();
            println!("{}", Table::new(rows));
        }

        Commands::Datasets { command } => match command {
            DatasetCommands::List => {
                let result = call_rpc(&cli.rpc_url, "datasets.list.v1", json!({})).await?;
                let rows: Vec<DatasetRow> = serde_json::from_value(result["datasets"].clone())?;

                println!(
                    "{}",
                    format!("Reporting datasets ({})", rows.len()).cyan().bold()
                );
                println!("{}", Table::new(rows));
            }

            DatasetCommands::Show { name } => {
                let result = call_rpc(
                    &cli.rpc_url,
                    "datasets.run.v1",
                    json!({ "name": name }),
                )
                .await?;
                let columns: Vec<String> = serde_json::from_value(result["columns"].clone())?;
                let rows = result["rows"]
                    .as_array()
                    .cloned()
                    .unwrap_or_default();

                println!(
                    "{}",
                    format!("Dataset {} ({} rows)", result["name"], rows.len())
                        .cyan()
                        .bold()
                );
                let mut builder = Builder::default();
                builder.push_record(columns.clone());
                for row in &rows {
                    builder.push_record(columns.iter().map(|col| fmt_value(&row[col.as_str()])));
                }
                println!("{}", builder.build());
            }

            DatasetCommands::Export { dir } => {
                let result = call_rpc(&cli.rpc_url, "datasets.list.v1", json!({})).await?;
                let datasets: Vec<DatasetFull> =
                    serde_json::from_value(result["datasets"].clone())?;

                std::fs::create_dir_all(&dir)
                    .with_context(|| format!("failed to create {}", dir.display()))?;
                for dataset in &datasets {
                    let path = dir.join(format!("{}.sql", dataset.name));
                    let body = format!("-- {}\n{}\n", dataset.title, dataset.sql.trim_end());
                    std::fs::write(&path, body)
                        .with_context(|| format!("failed to write {}", path.display()))?;
                    println!("{} {}", "✓".green(), path.display());
                }
                println!("Exported {} dataset definitions", datasets.len());
            }
        },

        Commands::Stats => {
            let result = call_rpc(&cli.rpc_url, "admin.stats.v1", json!({})).await?;

            println!("{}", "Daemon statistics".cyan().bold());
            println!("  leads:       {}", result["leads_total"]);
            println!("  reports:     {}", result["reports_total"]);
            println!("  webmasters:  {}", result["webmasters_tracked"]);
            let db_mb = result["db_size_bytes"].as_f64().unwrap_or(0.0) / 1_048_576.0;
            println!("  db size:     {db_mb:.2} MB");
            let uptime = result["uptime_seconds"].as_u64().unwrap_or(0);
            println!("  uptime:      {}", format_uptime(uptime));
        }
    }

    Ok(())
}

async fn call_rpc(
    rpc_url: &str,
    method: &str,
    params: serde_json::Value,
) -> Result<serde_json::Value> {
    let request = JsonRpcRequest {
        jsonrpc: "2.0".to_string(),
        method: method.to_string(),
        params,
        id: 1,
    };

    let client = reqwest::Client::new();
    let response = client
        .post(rpc_url)
        .json(&request)
        .send()
        .await
        .with_context(|| format!("failed to reach the daemon at {rpc_url}"))?;

    let rpc_response: JsonRpcResponse = response
        .json()
        .await
        .context("daemon returned a malformed JSON-RPC response")?;

    if let Some(error) = rpc_response.error {
        anyhow::bail!("RPC error ({}): {}", error.code, error.message);
    }

    rpc_response
        .result
        .context("daemon returned neither result nor error")
}

fn pct(value: f64) -> String {
    format!("{value:.2}")
}

fn opt_pct(value: Option<f64>) -> String {
    value.map(pct).unwrap_or_else(|| "-".to_string())
}

fn paint_health(health: f64) -> String {
    let text = format!("{health:.1}");
    if health >= 90.0 {
        text.green().to_string()
    } else if health >= 70.0 {
        text.yellow().to_string()
    } else {
        text.red().to_string()
    }
}

fn paint_score(score_pct: f64) -> String {
    let text = format!("{score_pct:.2}%");
    if score_pct >= 70.0 {
        text.green().to_string()
    } else {
        text.red().to_string()
    }
}

fn paint_opt_score(score_pct: Option<f64>) -> String {
    score_pct
        .map(paint_score)
        .unwrap_or_else(|| "-".to_string())
}

fn mark(ok: bool) -> String {
    if ok {
        "✓".green().to_string()
    } else {
        "✗".red().to_string()
    }
}

fn join_issues(issues: &[String]) -> String {
    if issues.is_empty() {
        "-".to_string()
    } else {
        issues.join("; ")
    }
}

fn fmt_value(value: &serde_json::Value) -> String {
    match value {
        serde_json::Value::Null => String::new(),
        serde_json::Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn format_uptime(total_seconds: u64) -> String {
    let hours = total_seconds / 3600;
    let minutes = (total_seconds % 3600) / 60;
    let seconds = total_seconds % 60;
    format!("{hours}h {minutes}m {seconds}s")
}
