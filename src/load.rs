//! `bulkseed load`: top every planned table up to its target.

use crate::config::{resolve, FileConfig};
use crate::plan::{load_graph, resolve_plan};
use crate::LoadArgs;
use anyhow::Context;
use seed_core::{LoadPlan, TargetCounts};
use seed_generator::{ecommerce_registry, GeneratorRegistry};
use seed_loader::{LoadOrchestrator, LoadReport, MemoryDatastore};
use seed_postgresql::PostgresDatastore;
use std::io::{BufRead, IsTerminal, Write};
use std::path::Path;
use tokio_util::sync::CancellationToken;
use tracing::info;

/// Loads at or above this many rows ask for confirmation.
pub const LARGE_LOAD_ROWS: u64 = 1_000_000;

/// Rows the plan would end up holding in total.
pub fn planned_rows(plan: &LoadPlan, targets: &TargetCounts) -> u64 {
    plan.tables()
        .iter()
        .map(|t| targets.target_for(t))
        .fold(0u64, u64::saturating_add)
}

/// Ask on `output`, read the answer from `input`. Only "y"/"yes" proceed.
pub fn confirm(
    total_rows: u64,
    tables: usize,
    input: &mut impl BufRead,
    output: &mut impl Write,
) -> anyhow::Result<bool> {
    write!(
        output,
        "This will load up to {total_rows} rows across {tables} tables. Continue? [y/N] "
    )?;
    output.flush()?;

    let mut answer = String::new();
    input.read_line(&mut answer)?;
    Ok(matches!(
        answer.trim().to_ascii_lowercase().as_str(),
        "y" | "yes"
    ))
}

fn confirm_large_load(total_rows: u64, tables: usize, yes: bool) -> anyhow::Result<()> {
    if yes || total_rows < LARGE_LOAD_ROWS {
        return Ok(());
    }
    let stdin = std::io::stdin();
    if !stdin.is_terminal() {
        anyhow::bail!("Refusing to load {total_rows} rows without confirmation; pass --yes");
    }
    if !confirm(total_rows, tables, &mut stdin.lock(), &mut std::io::stderr())? {
        anyhow::bail!("Load aborted by user");
    }
    Ok(())
}

/// Run a load and return its report.
///
/// Fatal errors (invalid plan, lost connection) come back as `Err`; table
/// failures are in the report.
pub async fn run_load(
    args: LoadArgs,
    config_path: Option<&Path>,
    cancel: CancellationToken,
) -> anyhow::Result<LoadReport> {
    let file = FileConfig::load_optional(config_path)?;
    let resolved = resolve(&args, file)?;

    let graph = load_graph(resolved.schema.as_deref())?;
    let plan = resolve_plan(&graph, &resolved.tables)?;
    let targets = TargetCounts::uniform(resolved.target_count);

    // Timestamps are generated relative to the start of the run.
    let anchor = chrono::Utc::now().naive_utc();
    let registry = match resolved.schema {
        Some(_) => GeneratorRegistry::new().with_fallback(anchor),
        None => ecommerce_registry(anchor)?,
    };

    confirm_large_load(planned_rows(&plan, &targets), plan.len(), args.yes)?;

    let orchestrator = LoadOrchestrator::new(registry, targets, resolved.options)
        .with_cancellation(cancel);

    let report = if args.dry_run {
        info!("[DRY-RUN] Loading into an in-memory datastore");
        let store = MemoryDatastore::new(&graph);
        orchestrator.run(&store, &graph, &plan).await?
    } else {
        info!(
            target_db = %resolved.postgres,
            schema = %resolved.postgres.schema,
            "Connecting to PostgreSQL"
        );
        let store = PostgresDatastore::connect(&resolved.postgres)
            .await
            .context("Failed to connect to PostgreSQL")?;
        orchestrator.run(&store, &graph, &plan).await?
    };

    if let Some(path) = &args.report_json {
        let json = report.to_json().context("Failed to serialize report")?;
        std::fs::write(path, json)
            .with_context(|| format!("Failed to write report to {}", path.display()))?;
        info!(path = %path.display(), "Wrote JSON report");
    }

    Ok(report)
}
