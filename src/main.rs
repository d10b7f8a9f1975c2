//! Command-line interface for bulkseed
//!
//! # Usage Examples
//!
//! ```bash
//! # Print the dependency order of a schema
//! bulkseed plan --schema schema.yaml
//!
//! # Top the built-in e-commerce schema up to 10k rows per table
//! bulkseed load --target-count 10000 --pg-database shop
//!
//! # Settings from a file, flags on top
//! bulkseed --config bulkseed.toml load --strategy bulk-copy --yes
//! ```
//!
//! Set `RUST_LOG` to change log verbosity (default `info`).

use anyhow::Context;
use bulkseed::{load::run_load, plan::run_plan, LoadArgs, PlanArgs};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tokio_util::sync::CancellationToken;
use tracing::warn;

#[derive(Parser)]
#[command(name = "bulkseed")]
#[command(about = "Fill a relational schema with synthetic rows in foreign-key order")]
#[command(long_about = None)]
struct Cli {
    /// TOML config file with [postgres] and [load] sections
    #[arg(long, global = true, env = "BULKSEED_CONFIG")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Load tables up to their target row counts
    Load(LoadArgs),

    /// Print the load order without touching a database
    Plan(PlanArgs),
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    if let Err(e) = run().await {
        eprintln!("Error: {e:#}");
        std::process::exit(1);
    }
    Ok(())
}

async fn run() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Plan(args) => run_plan(&args),
        Commands::Load(args) => {
            let cancel = CancellationToken::new();
            let on_signal = cancel.clone();
            tokio::spawn(async move {
                if tokio::signal::ctrl_c().await.is_ok() {
                    warn!("Interrupted, finishing in-flight batches");
                    on_signal.cancel();
                }
            });

            let report = run_load(args, cli.config.as_deref(), cancel)
                .await
                .context("Load failed")?;
            println!("{}", report.summary());

            if !report.passed() {
                anyhow::bail!(
                    "{} table(s) failed: {}",
                    report.failed_tables().len(),
                    report.failed_tables().join(", ")
                );
            }
            Ok(())
        }
    }
}
