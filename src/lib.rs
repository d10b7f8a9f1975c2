//! bulkseed library
//!
//! Fills a relational schema with synthetic rows in foreign-key order:
//! parents first, children drawing their foreign keys from bounded samples
//! of the parents' primary keys. Loads top up to a target count, so a rerun
//! only inserts the shortfall.
//!
//! # Workspace
//!
//! - `seed_core` - tables, foreign keys, dependency order
//! - `seed_generator` - per-table record generators
//! - `seed_loader` - key pools, batch and bulk-copy loaders, orchestration
//! - `seed_postgresql` - the PostgreSQL datastore
//!
//! # CLI Usage
//!
//! ```bash
//! # Show the load order of the built-in e-commerce schema
//! bulkseed plan
//!
//! # Top every table up to 1M rows with staged COPY
//! bulkseed load --target-count 1000000 --strategy bulk-copy \
//!   --suspend-constraints --fast-session --pg-host localhost --pg-database shop --yes
//!
//! # Exercise a custom schema in memory only
//! bulkseed load --schema schema.yaml --dry-run --report-json report.json
//! ```

use clap::Args;
use seed_loader::{BatchErrorPolicy, Strategy};
use seed_postgresql::PostgresArgs;
use std::path::PathBuf;

pub mod config;
pub mod load;
pub mod plan;

/// Options for `bulkseed load`.
#[derive(Args, Clone, Debug, Default)]
pub struct LoadArgs {
    /// Schema YAML file (defaults to the built-in e-commerce schema)
    #[arg(long, short = 's')]
    pub schema: Option<PathBuf>,

    /// Rows each table should hold after the load
    #[arg(long, env = "BULKSEED_TARGET_COUNT")]
    pub target_count: Option<u64>,

    /// Rows per batch
    #[arg(long)]
    pub batch_size: Option<usize>,

    /// Loading strategy: batch or bulk-copy
    #[arg(long)]
    pub strategy: Option<Strategy>,

    /// Generation workers per table (default: min(8, cores))
    #[arg(long)]
    pub workers: Option<usize>,

    /// Seed for reproducible data (random when omitted)
    #[arg(long)]
    pub seed: Option<u64>,

    /// Only load these tables (comma-separated); other parents are sampled as-is
    #[arg(long, value_delimiter = ',')]
    pub tables: Vec<String>,

    /// Maximum sampled keys per parent table
    #[arg(long)]
    pub pool_size: Option<usize>,

    /// Time limit per insert, copy or move (e.g. 30s, 5m)
    #[arg(long)]
    pub timeout: Option<String>,

    /// What to do after a failed batch: abort-table or continue
    #[arg(long)]
    pub on_batch_error: Option<BatchErrorPolicy>,

    /// Disable triggers and drop secondary indexes during bulk copy
    #[arg(long)]
    pub suspend_constraints: bool,

    /// Load into an in-memory store instead of PostgreSQL
    #[arg(long)]
    pub dry_run: bool,

    /// Skip the confirmation prompt for large loads
    #[arg(long, short = 'y')]
    pub yes: bool,

    /// Write the final report as JSON to this file
    #[arg(long)]
    pub report_json: Option<PathBuf>,

    #[command(flatten)]
    pub postgres: PostgresArgs,
}

/// Options for `bulkseed plan`.
#[derive(Args, Clone, Debug, Default)]
pub struct PlanArgs {
    /// Schema YAML file (defaults to the built-in e-commerce schema)
    #[arg(long, short = 's')]
    pub schema: Option<PathBuf>,

    /// Only show these tables (comma-separated)
    #[arg(long, value_delimiter = ',')]
    pub tables: Vec<String>,
}
