//! Per-table progress and the end-of-run report.

use crate::error::LoadError;
use serde::Serialize;
use std::time::Duration;

/// Where a table's load ended up.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LoadStatus {
    /// Not started yet.
    Pending,
    /// Not attempted because the run was cancelled or aborted earlier.
    Skipped,
    /// Target reached.
    Completed,
    /// Stopped by an error.
    Failed,
    /// Stopped by cancellation at a batch boundary.
    Cancelled,
}

impl LoadStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            LoadStatus::Pending => "PENDING",
            LoadStatus::Skipped => "SKIPPED",
            LoadStatus::Completed => "COMPLETED",
            LoadStatus::Failed => "FAILED",
            LoadStatus::Cancelled => "CANCELLED",
        }
    }
}

/// Progress of one table in one run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LoadProgress {
    pub table: String,
    /// Rows present before this run started
    pub existing_count: u64,
    pub target_count: u64,
    pub inserted_this_run: u64,
    pub batches_committed: u64,
    pub failed_batches: u64,
    pub elapsed_seconds: f64,
    pub rows_per_second: f64,
    pub status: LoadStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip)]
    fatal: bool,
}

impl LoadProgress {
    pub fn new(table: impl Into<String>, existing_count: u64, target_count: u64) -> Self {
        Self {
            table: table.into(),
            existing_count,
            target_count,
            inserted_this_run: 0,
            batches_committed: 0,
            failed_batches: 0,
            elapsed_seconds: 0.0,
            rows_per_second: 0.0,
            status: LoadStatus::Pending,
            error: None,
            fatal: false,
        }
    }

    /// A table the run never got to.
    pub fn skipped(table: impl Into<String>, target_count: u64) -> Self {
        let mut progress = Self::new(table, 0, target_count);
        progress.status = LoadStatus::Skipped;
        progress
    }

    /// A table that failed before any row was generated.
    pub fn failed(table: impl Into<String>, target_count: u64, error: &LoadError) -> Self {
        let mut progress = Self::new(table, 0, target_count);
        progress.fail(error, Duration::ZERO);
        progress
    }

    /// Rows still missing at the start of the run.
    pub fn needed(&self) -> u64 {
        self.target_count.saturating_sub(self.existing_count)
    }

    pub fn current_count(&self) -> u64 {
        self.existing_count + self.inserted_this_run
    }

    /// True once the table holds at least its target.
    pub fn is_terminal(&self) -> bool {
        self.current_count() >= self.target_count
    }

    /// Percent of this run's rows inserted so far.
    pub fn percent(&self) -> f64 {
        let needed = self.needed();
        if needed == 0 {
            100.0
        } else {
            self.inserted_this_run as f64 * 100.0 / needed as f64
        }
    }

    /// Account for a committed batch.
    pub fn record_batch(&mut self, rows: u64, elapsed: Duration) {
        self.inserted_this_run += rows;
        self.batches_committed += 1;
        self.set_elapsed(elapsed);
    }

    pub fn set_elapsed(&mut self, elapsed: Duration) {
        self.elapsed_seconds = elapsed.as_secs_f64();
        self.rows_per_second = if self.elapsed_seconds > 0.0 {
            self.inserted_this_run as f64 / self.elapsed_seconds
        } else {
            0.0
        };
    }

    pub fn complete(&mut self, elapsed: Duration) {
        self.status = LoadStatus::Completed;
        self.set_elapsed(elapsed);
    }

    pub fn cancel(&mut self, elapsed: Duration) {
        self.status = LoadStatus::Cancelled;
        self.set_elapsed(elapsed);
    }

    /// Mark failed, keeping the first error if one was already recorded.
    pub fn fail(&mut self, error: &LoadError, elapsed: Duration) {
        self.status = LoadStatus::Failed;
        self.fatal |= error.is_fatal();
        if self.error.is_none() {
            self.error = Some(error.to_string());
        }
        self.set_elapsed(elapsed);
    }

    /// Whether the failure means the datastore can no longer be used.
    pub fn is_fatal(&self) -> bool {
        self.fatal
    }
}

/// Outcome of a whole run.
#[derive(Debug, Clone, Serialize)]
pub struct LoadReport {
    pub strategy: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub seed: Option<u64>,
    pub total_inserted: u64,
    pub elapsed_seconds: f64,
    pub tables: Vec<LoadProgress>,
}

impl LoadReport {
    pub fn new(strategy: impl Into<String>, seed: Option<u64>) -> Self {
        Self {
            strategy: strategy.into(),
            seed,
            total_inserted: 0,
            elapsed_seconds: 0.0,
            tables: Vec::new(),
        }
    }

    pub fn push(&mut self, progress: LoadProgress) {
        self.total_inserted += progress.inserted_this_run;
        self.tables.push(progress);
    }

    pub fn table(&self, name: &str) -> Option<&LoadProgress> {
        self.tables.iter().find(|t| t.table == name)
    }

    /// Tables that failed or were cancelled.
    pub fn failed_tables(&self) -> Vec<&str> {
        self.tables
            .iter()
            .filter(|t| matches!(t.status, LoadStatus::Failed | LoadStatus::Cancelled))
            .map(|t| t.table.as_str())
            .collect()
    }

    /// True when every table completed.
    pub fn passed(&self) -> bool {
        self.tables
            .iter()
            .all(|t| t.status == LoadStatus::Completed)
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Generate a summary string.
    pub fn summary(&self) -> String {
        let status = if self.passed() { "PASSED" } else { "FAILED" };
        let mut summary = format!(
            "Load Report: {status}\n\
             ===========\n\
             Strategy: {}\n\
             Seed: {}\n\
             Inserted: {} rows in {:.2}s\n\n",
            self.strategy,
            self.seed
                .map(|s| s.to_string())
                .unwrap_or_else(|| "random".to_string()),
            self.total_inserted,
            self.elapsed_seconds,
        );

        summary.push_str(&format!(
            "{:<24} {:>10} {:>10} {:>10} {:>12} {:>10}\n",
            "table", "existing", "target", "inserted", "rows/sec", "status"
        ));
        for t in &self.tables {
            summary.push_str(&format!(
                "{:<24} {:>10} {:>10} {:>10} {:>12.0} {:>10}\n",
                t.table,
                t.existing_count,
                t.target_count,
                t.inserted_this_run,
                t.rows_per_second,
                t.status.as_str()
            ));
        }

        let errors: Vec<&LoadProgress> = self.tables.iter().filter(|t| t.error.is_some()).collect();
        if !errors.is_empty() {
            summary.push_str("\nErrors:\n");
            for t in errors {
                summary.push_str(&format!(
                    "- {}: {}\n",
                    t.table,
                    t.error.as_deref().unwrap_or_default()
                ));
            }
        }

        summary
    }
}
