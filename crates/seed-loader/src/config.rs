//! Configuration types for a load run.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

/// Default rows per batch.
pub const DEFAULT_BATCH_SIZE: usize = 10_000;

/// Upper bound on the default number of generation workers.
pub const DEFAULT_MAX_WORKERS: usize = 8;

/// Default per-operation timeout.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// How rows reach the datastore.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Strategy {
    /// Multi-row parameterized INSERT, one transaction per batch.
    #[default]
    Batch,
    /// One COPY into a staging table, then a single set-based move.
    BulkCopy,
}

impl Strategy {
    pub fn as_str(&self) -> &'static str {
        match self {
            Strategy::Batch => "batch",
            Strategy::BulkCopy => "bulk-copy",
        }
    }
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Strategy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "batch" => Ok(Strategy::Batch),
            "bulk-copy" | "bulk_copy" | "copy" => Ok(Strategy::BulkCopy),
            other => Err(format!("unknown strategy '{other}' (expected batch or bulk-copy)")),
        }
    }
}

/// What the batch loader does after a batch fails and is rolled back.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum BatchErrorPolicy {
    /// Stop this table and move on to the next one.
    #[default]
    AbortTable,
    /// Skip the failed batch and keep going; the table still reports failed.
    ContinueTable,
}

impl FromStr for BatchErrorPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "abort-table" | "abort" => Ok(BatchErrorPolicy::AbortTable),
            "continue" | "continue-table" => Ok(BatchErrorPolicy::ContinueTable),
            other => Err(format!(
                "unknown batch error policy '{other}' (expected abort-table or continue)"
            )),
        }
    }
}

/// `min(8, available cores)`.
pub fn default_workers() -> usize {
    std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1)
        .min(DEFAULT_MAX_WORKERS)
}

/// Options for a load run.
#[derive(Debug, Clone)]
pub struct LoadOptions {
    pub strategy: Strategy,
    /// Rows per batch (batch strategy) and per worker chunk upper bound
    pub batch_size: usize,
    /// Generation workers per table
    pub workers: usize,
    /// Maximum sampled keys per parent table
    pub pool_size: usize,
    /// Limit applied to each insert, copy and move
    pub timeout: Duration,
    pub on_batch_error: BatchErrorPolicy,
    /// Disable triggers and drop secondary indexes during bulk copy
    pub suspend_constraints: bool,
    /// Base seed; `None` draws fresh entropy
    pub seed: Option<u64>,
}

impl Default for LoadOptions {
    fn default() -> Self {
        Self {
            strategy: Strategy::Batch,
            batch_size: DEFAULT_BATCH_SIZE,
            workers: default_workers(),
            pool_size: crate::pool::DEFAULT_POOL_SIZE,
            timeout: DEFAULT_TIMEOUT,
            on_batch_error: BatchErrorPolicy::AbortTable,
            suspend_constraints: false,
            seed: None,
        }
    }
}

impl LoadOptions {
    pub fn with_strategy(mut self, strategy: Strategy) -> Self {
        self.strategy = strategy;
        self
    }

    pub fn with_batch_size(mut self, size: usize) -> Self {
        self.batch_size = size.max(1);
        self
    }

    pub fn with_workers(mut self, workers: usize) -> Self {
        self.workers = workers.max(1);
        self
    }

    pub fn with_pool_size(mut self, size: usize) -> Self {
        self.pool_size = size.max(1);
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_batch_error_policy(mut self, policy: BatchErrorPolicy) -> Self {
        self.on_batch_error = policy;
        self
    }

    pub fn with_suspend_constraints(mut self, suspend: bool) -> Self {
        self.suspend_constraints = suspend;
        self
    }

    pub fn with_seed(mut self, seed: Option<u64>) -> Self {
        self.seed = seed;
        self
    }

    /// Rows per worker chunk: small enough to keep workers interleaved,
    /// never larger than a batch.
    pub fn chunk_size(&self) -> usize {
        self.batch_size.clamp(1, 1_000)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let options = LoadOptions::default();
        assert_eq!(options.batch_size, 10_000);
        assert_eq!(options.pool_size, 10_000);
        assert!(options.workers >= 1 && options.workers <= 8);
        assert_eq!(options.on_batch_error, BatchErrorPolicy::AbortTable);
        assert_eq!(options.chunk_size(), 1_000);
    }

    #[test]
    fn test_parse_strategy() {
        assert_eq!("batch".parse::<Strategy>().unwrap(), Strategy::Batch);
        assert_eq!("bulk-copy".parse::<Strategy>().unwrap(), Strategy::BulkCopy);
        assert!("fast".parse::<Strategy>().is_err());
        assert_eq!(Strategy::BulkCopy.to_string(), "bulk-copy");
    }

    #[test]
    fn test_parse_policy() {
        assert_eq!(
            "continue".parse::<BatchErrorPolicy>().unwrap(),
            BatchErrorPolicy::ContinueTable
        );
        assert!("retry".parse::<BatchErrorPolicy>().is_err());
    }

    #[test]
    fn test_builder_clamps() {
        let options = LoadOptions::default()
            .with_batch_size(0)
            .with_workers(0)
            .with_pool_size(0);
        assert_eq!(options.batch_size, 1);
        assert_eq!(options.workers, 1);
        assert_eq!(options.pool_size, 1);
        assert_eq!(options.chunk_size(), 1);
    }
}
