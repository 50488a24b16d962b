use anyhow::Result;
use chrono::Utc;
use std::path::{Path, PathBuf};
use tokio::time::{Duration, MissedTickBehavior};
use tracing::{error, info};

use crate::metrics::MetricsCollector;
use crate::polling::PollingSource;
use crate::schedule::{run_cycle, CycleReport};

/// Run a single cycle and record its outcome.
pub async fn refresh_once<S>(
    source: &S,
    output_path: &Path,
    metrics: &MetricsCollector,
) -> Result<CycleReport>
where
    S: PollingSource + ?Sized,
{
    let tracker = metrics.record_cycle_start();

    match run_cycle(source, output_path, Utc::now()).await {
        Ok(report) => {
            info!(
                "Updated {:?}: {} matches on {} courts",
                output_path, report.matches, report.courts
            );
            tracker.succeed(&report);
            Ok(report)
        }
        Err(e) => {
            error!("Update failed: {:#}", e);
            tracker.fail(&e);
            Err(e)
        }
    }
}

/// Refresh immediately, then once per `period`, until the task is dropped.
/// A failed cycle is logged and the next one runs on schedule.
pub async fn run_scheduler<S>(
    source: S,
    output_path: PathBuf,
    period: Duration,
    metrics: MetricsCollector,
) where
    S: PollingSource,
{
    let mut ticker = tokio::time::interval(period.max(Duration::from_secs(1)));
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    info!("Refreshing {:?} every {:?}", output_path, period);

    loop {
        ticker.tick().await;
        let _ = refresh_once(&source, &output_path, &metrics).await;
    }
}
