use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::{
    sync::{Arc, Mutex, MutexGuard},
    time::Instant,
};

use crate::schedule::CycleReport;

/// Outcome counters for the refresh cycles, served at `/status`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RefreshStatus {
    pub total_cycles: u64,
    pub successful_cycles: u64,
    pub failed_cycles: u64,
    pub avg_cycle_time_ms: f64,
    pub last_success_time: Option<DateTime<Utc>>,
    pub last_error: Option<String>,
    pub last_error_time: Option<DateTime<Utc>>,
    pub matches: usize,
    pub courts: usize,
    pub rejected_matches: usize,
}

#[derive(Clone, Default)]
pub struct MetricsCollector {
    status: Arc<Mutex<RefreshStatus>>,
}

impl MetricsCollector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_cycle_start(&self) -> CycleTracker {
        CycleTracker {
            start_time: Instant::now(),
            collector: self.clone(),
        }
    }

    pub fn get_status(&self) -> RefreshStatus {
        self.lock().clone()
    }

    fn lock(&self) -> MutexGuard<'_, RefreshStatus> {
        // plain counters, still consistent if a holder panicked
        self.status.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

pub struct CycleTracker {
    start_time: Instant,
    collector: MetricsCollector,
}

impl CycleTracker {
    pub fn succeed(self, report: &CycleReport) {
        let elapsed_ms = self.start_time.elapsed().as_secs_f64() * 1000.0;
        let mut status = self.collector.lock();

        record_cycle(&mut status, elapsed_ms);
        status.successful_cycles += 1;
        status.last_success_time = Some(Utc::now());
        status.matches = report.matches;
        status.courts = report.courts;
        status.rejected_matches = report.rejected;
    }

    pub fn fail(self, error: &anyhow::Error) {
        let elapsed_ms = self.start_time.elapsed().as_secs_f64() * 1000.0;
        let mut status = self.collector.lock();

        record_cycle(&mut status, elapsed_ms);
        status.failed_cycles += 1;
        status.last_error = Some(format!("{error:#}"));
        status.last_error_time = Some(Utc::now());
    }
}

fn record_cycle(status: &mut RefreshStatus, elapsed_ms: f64) {
    status.total_cycles += 1;

    // Exponential moving average, seeded with the first sample
    let alpha = 0.1;
    status.avg_cycle_time_ms = if status.total_cycles == 1 {
        elapsed_ms
    } else {
        status.avg_cycle_time_ms * (1.0 - alpha) + elapsed_ms * alpha
    };
}
