//! Simple SDK example
//!
//! Walks through the main Leadwatch endpoints.
//!
//! # Usage
//!
//! 1. Start the daemon:
//!    ```bash
//!    cargo run --package leadwatch-daemon
//!    ```
//!
//! 2. Run this example:
//!    ```bash
//!    cargo run --example simple
//!    ```

use leadwatch_sdk::{LeadRow, LeadwatchClient};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    println!("Leadwatch SDK - Simple Example");
    println!("==============================\n");

    // 1. Connect to daemon
    println!("1. Connecting to daemon...");
    let client = LeadwatchClient::connect("http://127.0.0.1:9620").await?;
    println!("   ✓ Connected\n");

    // 2. Push a small lead batch
    println!("2. Ingesting leads...");
    let today = "2025-08-25";
    let ingest = client
        .ingest(vec![
            LeadRow {
                id: 9001,
                status: 2,
                date: today.to_string(),
                webmaster: "wm-example".to_string(),
                amount: 150.0,
                comment: None,
            },
            LeadRow {
                id: 9002,
                status: 4,
                date: today.to_string(),
                webmaster: "wm-example".to_string(),
                amount: 150.0,
                comment: Some("bought out same day".to_string()),
            },
            LeadRow {
                id: 9003,
                status: 6,
                date: today.to_string(),
                webmaster: "wm-example".to_string(),
                amount: 0.0,
                comment: Some("duplicate".to_string()),
            },
        ])
        .await?;
    println!(
        "   ✓ received {} / upserted {} / skipped {}\n",
        ingest.received, ingest.upserted, ingest.skipped
    );

    // 3. Analyse and persist
    println!("3. Running reports...");
    let run = client.run_reports(Some(30), None).await?;
    println!(
        "   ✓ analysed {} webmasters, {} flagged\n",
        run.analysed, run.flagged
    );

    // 4. Status board
    println!("4. Fetching the status board...");
    let board = client.status_snapshot(false).await?;
    for row in &board.webmasters {
        let mark = if row.ok { "✓" } else { "✗" };
        println!(
            "   {} {} health {:.1} ({} issues)",
            mark,
            row.webmaster,
            row.health_score,
            row.issues.len()
        );
    }
    println!();

    // 5. Score one webmaster
    println!("5. Scoring wm-example...");
    let score = client.score("wm-example").await?;
    println!(
        "   ✓ score {:.2}% over {} cohorts",
        score.card.score_pct,
        score.card.cohorts.len()
    );

    println!("\n✓ Example completed successfully!");

    Ok(())
}
