// 🎬 Tracking Simulator - batch replay of a record file
//
// Reads every line up front, then feeds them one at a time through the
// processor with an optional pause in between. Bad lines are logged and
// skipped; they never abort the rest of the replay.

use crate::processor::{SharedProcessor, TrackingProcessor};
use crate::error::Result as TrackingResult;
use anyhow::{Context, Result};
use serde::Serialize;
use std::fs;
use std::path::Path;
use std::thread;
use std::time::Duration;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SimulationReport {
    /// Lines applied successfully
    pub processed: usize,

    /// Lines rejected (parse errors, unknown shipments, unknown tags, ...)
    pub failed: usize,

    pub skipped_blank: usize,
}

impl SimulationReport {
    pub fn total(&self) -> usize {
        self.processed + self.failed + self.skipped_blank
    }

    pub fn summary(&self) -> String {
        format!(
            "{} processed, {} failed, {} blank ({} lines)",
            self.processed,
            self.failed,
            self.skipped_blank,
            self.total()
        )
    }
}

/// Load the record lines of a simulation file
pub fn read_updates(path: &Path) -> Result<Vec<String>> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read simulation file: {}", path.display()))?;
    Ok(content.lines().map(str::to_string).collect())
}

pub struct TrackingSimulator {
    interval: Duration,
}

impl TrackingSimulator {
    pub fn new(interval: Duration) -> Self {
        TrackingSimulator { interval }
    }

    /// Replay without pausing between updates
    pub fn immediate() -> Self {
        Self::new(Duration::ZERO)
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Replay a file into an owned processor
    pub fn run(&self, processor: &mut TrackingProcessor, path: &Path) -> Result<SimulationReport> {
        let lines = read_updates(path)?;
        tracing::info!(path = %path.display(), lines = lines.len(), "starting simulation");
        Ok(self.replay(&lines, |line| processor.try_process(line)))
    }

    /// Replay a file into a shared processor, locking once per record
    pub fn run_shared(&self, processor: &SharedProcessor, path: &Path) -> Result<SimulationReport> {
        let lines = read_updates(path)?;
        tracing::info!(path = %path.display(), lines = lines.len(), "starting simulation");
        Ok(self.replay(&lines, |line| processor.lock().try_process(line)))
    }

    /// Feed lines to `apply` one at a time; the pause happens outside `apply`
    pub fn replay<F>(&self, lines: &[String], mut apply: F) -> SimulationReport
    where
        F: FnMut(&str) -> TrackingResult<String>,
    {
        let mut report = SimulationReport::default();

        for (index, line) in lines.iter().enumerate() {
            if line.trim().is_empty() {
                report.skipped_blank += 1;
                continue;
            }

            match apply(line) {
                Ok(_) => report.processed += 1,
                Err(err) => {
                    tracing::warn!(line_number = index + 1, "skipping update '{}': {}", line, err);
                    report.failed += 1;
                }
            }

            if !self.interval.is_zero() {
                thread::sleep(self.interval);
            }
        }

        tracing::info!("simulation finished: {}", report.summary());
        report
    }
}

impl Default for TrackingSimulator {
    fn default() -> Self {
        Self::immediate()
    }
}

// ============================================================================
// TESTS
// ============================================================================
