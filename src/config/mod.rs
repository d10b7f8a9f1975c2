//! Config file and option resolution.
//!
//! ```toml
//! [postgres]
//! host = "db.internal"
//! database = "shop"
//! user = "loader"
//! fast_session = true
//!
//! [load]
//! target_count = 1000000
//! batch_size = 10000
//! strategy = "bulk-copy"
//! timeout = "2m"
//! ```
//!
//! Command-line flags and environment variables win over the file.

pub mod duration;

pub use duration::parse_duration;

use crate::LoadArgs;
use anyhow::Context;
use seed_loader::{BatchErrorPolicy, LoadOptions, Strategy};
use seed_postgresql::PostgresConfig;
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Default rows per table when neither flag nor file sets one.
pub const DEFAULT_TARGET_COUNT: u64 = 1_000;

/// Contents of a `--config` file.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FileConfig {
    pub postgres: PostgresConfig,
    pub load: LoadSection,
}

/// `[load]` table; every key is optional.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LoadSection {
    pub schema: Option<PathBuf>,
    pub target_count: Option<u64>,
    pub batch_size: Option<usize>,
    pub strategy: Option<Strategy>,
    pub workers: Option<usize>,
    pub pool_size: Option<usize>,
    pub timeout: Option<String>,
    pub on_batch_error: Option<BatchErrorPolicy>,
    pub suspend_constraints: Option<bool>,
    pub seed: Option<u64>,
    pub tables: Option<Vec<String>>,
}

impl FileConfig {
    pub fn from_file(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        Self::parse(&content).with_context(|| format!("Invalid config file {}", path.display()))
    }

    pub fn parse(content: &str) -> anyhow::Result<Self> {
        Ok(toml::from_str(content)?)
    }

    /// Load `path` if given, defaults otherwise.
    pub fn load_optional(path: Option<&Path>) -> anyhow::Result<Self> {
        match path {
            Some(path) => Self::from_file(path),
            None => Ok(Self::default()),
        }
    }
}

/// Everything a load run needs besides the datastore.
#[derive(Debug, Clone)]
pub struct ResolvedLoad {
    pub schema: Option<PathBuf>,
    pub target_count: u64,
    pub tables: Vec<String>,
    pub options: LoadOptions,
    pub postgres: PostgresConfig,
}

/// Merge flags over the config file over defaults.
pub fn resolve(args: &LoadArgs, file: FileConfig) -> anyhow::Result<ResolvedLoad> {
    let load = file.load;
    let defaults = LoadOptions::default();

    let timeout = match args.timeout.as_deref().or(load.timeout.as_deref()) {
        Some(raw) => parse_duration(raw).context("Invalid --timeout")?,
        None => defaults.timeout,
    };
    if timeout.is_zero() {
        anyhow::bail!("--timeout must be greater than zero");
    }

    let options = defaults
        .clone()
        .with_strategy(args.strategy.or(load.strategy).unwrap_or(defaults.strategy))
        .with_batch_size(args.batch_size.or(load.batch_size).unwrap_or(defaults.batch_size))
        .with_workers(args.workers.or(load.workers).unwrap_or(defaults.workers))
        .with_pool_size(args.pool_size.or(load.pool_size).unwrap_or(defaults.pool_size))
        .with_timeout(timeout)
        .with_batch_error_policy(
            args.on_batch_error
                .or(load.on_batch_error)
                .unwrap_or(defaults.on_batch_error),
        )
        .with_suspend_constraints(
            args.suspend_constraints || load.suspend_constraints.unwrap_or(false),
        )
        .with_seed(args.seed.or(load.seed));

    let tables = if args.tables.is_empty() {
        load.tables.unwrap_or_default()
    } else {
        args.tables.clone()
    };

    Ok(ResolvedLoad {
        schema: args.schema.clone().or(load.schema),
        target_count: args
            .target_count
            .or(load.target_count)
            .unwrap_or(DEFAULT_TARGET_COUNT),
        tables,
        options,
        postgres: args.postgres.apply(file.postgres),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_parse_file() {
        let config = FileConfig::parse(
            r#"
[postgres]
host = "db.internal"
password = "secret"
fast_session = true

[load]
target_count = 5000
strategy = "bulk-copy"
on_batch_error = "continue-table"
timeout = "2m"
tables = ["users", "orders"]
"#,
        )
        .unwrap();

        assert_eq!(config.postgres.host, "db.internal");
        assert_eq!(config.postgres.port, 5432);
        assert!(config.postgres.fast_session);
        assert_eq!(config.postgres.session_statements().len(), 3);
        assert_eq!(config.load.target_count, Some(5000));
        assert_eq!(config.load.strategy, Some(Strategy::BulkCopy));
        assert_eq!(
            config.load.on_batch_error,
            Some(BatchErrorPolicy::ContinueTable)
        );
    }

    #[test]
    fn test_unknown_key_rejected() {
        assert!(FileConfig::parse("[load]\nbatchsize = 10\n").is_err());
    }

    #[test]
    fn test_flags_win_over_file() {
        let file = FileConfig::parse(
            r#"
[load]
target_count = 5000
batch_size = 200
timeout = "2m"
seed = 9
"#,
        )
        .unwrap();
        let args = LoadArgs {
            batch_size: Some(50),
            ..LoadArgs::default()
        };

        let resolved = resolve(&args, file).unwrap();
        assert_eq!(resolved.target_count, 5000);
        assert_eq!(resolved.options.batch_size, 50);
        assert_eq!(resolved.options.timeout, Duration::from_secs(120));
        assert_eq!(resolved.options.seed, Some(9));
        assert_eq!(resolved.options.strategy, Strategy::Batch);
    }

    #[test]
    fn test_defaults_without_file() {
        let resolved = resolve(&LoadArgs::default(), FileConfig::default()).unwrap();
        assert_eq!(resolved.target_count, DEFAULT_TARGET_COUNT);
        assert_eq!(resolved.options.batch_size, 10_000);
        assert_eq!(resolved.options.timeout, Duration::from_secs(30));
        assert!(resolved.tables.is_empty());
        assert!(resolved.schema.is_none());
    }

    #[test]
    fn test_zero_timeout_rejected() {
        let args = LoadArgs {
            timeout: Some("0s".to_string()),
            ..LoadArgs::default()
        };
        assert!(resolve(&args, FileConfig::default()).is_err());
    }
}
