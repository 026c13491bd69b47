// Report Scheduler
// Periodic analysis runs in the background

use std::sync::Arc;
use std::time::Duration;

use tokio::time::interval;
use tracing::{error, info};

use crate::application::analysis::AnalysisService;
use crate::error::Result;

/// Report scheduler
///
/// Re-analyses the fleet every `interval_hours` and persists the results.
/// The first run happens right away so a fresh daemon is never without
/// status rows.
pub struct ReportScheduler {
    analysis: Arc<AnalysisService>,
    interval_hours: u64,
    window_days: i64,
}

impl ReportScheduler {
    pub fn new(analysis: Arc<AnalysisService>, interval_hours: u64, window_days: i64) -> Self {
        Self {
            analysis,
            interval_hours,
            window_days,
        }
    }

    /// Run the scheduling loop (background task)
    ///
    /// Should be spawned in tokio::spawn
    pub async fn run(self) {
        info!(
            interval_hours = self.interval_hours,
            window_days = self.window_days,
            "Report scheduler started"
        );

        // First tick resolves immediately
        let mut tick = interval(Duration::from_secs(self.interval_hours.max(1) * 3600));

        loop {
            tick.tick().await;

            match self.run_once().await {
                Ok(webmasters) => {
                    info!(webmasters, "Scheduled report run completed");
                }
                Err(e) => {
                    error!(error = ?e, "Scheduled report run failed");
                }
            }
        }
    }

    /// Run one analysis pass immediately (also used for manual triggers)
    pub async fn run_once(&self) -> Result<usize> {
        let results = self.analysis.run_and_save(self.window_days, None).await?;
        Ok(results.len())
    }
}
