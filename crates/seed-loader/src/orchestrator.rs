//! Load orchestration across a whole plan.

use crate::batch::BatchLoader;
use crate::bulk::BulkCopyLoader;
use crate::config::{LoadOptions, Strategy};
use crate::datastore::Datastore;
use crate::error::LoadError;
use crate::pool::KeyPoolSampler;
use crate::report::{LoadProgress, LoadReport};
use crate::worker::TableJob;
use seed_core::{DependencyGraph, LoadPlan, TargetCounts};
use seed_generator::{GeneratorRegistry, WorkerSeeds};
use std::sync::Arc;
use std::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

/// Loads every table of a plan in dependency order.
///
/// Tables run one after another. A table that fails is recorded and the run
/// moves on; only a lost connection or an invalid plan stops the run.
pub struct LoadOrchestrator {
    registry: GeneratorRegistry,
    targets: TargetCounts,
    options: LoadOptions,
    cancel: CancellationToken,
}

impl LoadOrchestrator {
    pub fn new(registry: GeneratorRegistry, targets: TargetCounts, options: LoadOptions) -> Self {
        Self {
            registry,
            targets,
            options,
            cancel: CancellationToken::new(),
        }
    }

    /// Use an externally owned cancellation token (e.g. tied to Ctrl-C).
    pub fn with_cancellation(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }

    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    pub fn options(&self) -> &LoadOptions {
        &self.options
    }

    /// Resolve the load order, optionally restricted to `tables`.
    pub fn plan(&self, graph: &DependencyGraph, tables: &[String]) -> Result<LoadPlan, LoadError> {
        let plan = graph.topological_order()?;
        if tables.is_empty() {
            Ok(plan)
        } else {
            Ok(plan.restrict(tables)?)
        }
    }

    /// Plan and load every table of `graph`.
    pub async fn load(
        &self,
        datastore: &dyn Datastore,
        graph: &DependencyGraph,
    ) -> Result<LoadReport, LoadError> {
        let plan = self.plan(graph, &[])?;
        self.run(datastore, graph, &plan).await
    }

    /// Load the tables of `plan` in order.
    pub async fn run(
        &self,
        datastore: &dyn Datastore,
        graph: &DependencyGraph,
        plan: &LoadPlan,
    ) -> Result<LoadReport, LoadError> {
        let start = Instant::now();
        let generators = self.registry.resolve_plan(plan)?;
        let seeds = match self.options.seed {
            Some(seed) => WorkerSeeds::new(seed),
            None => WorkerSeeds::from_entropy(),
        };
        info!(
            tables = plan.len(),
            strategy = %self.options.strategy,
            batch_size = self.options.batch_size,
            workers = self.options.workers,
            seed = seeds.base(),
            "Starting load"
        );

        let mut sampler = KeyPoolSampler::new(self.options.pool_size);
        sampler.invalidate_all();
        let batch = BatchLoader::new(&self.options);
        let bulk = BulkCopyLoader::new(&self.options);
        let mut report = LoadReport::new(self.options.strategy.as_str(), Some(seeds.base()));

        for (position, spec) in plan.tables().iter().enumerate() {
            let table = spec.name.as_str();
            let target = self.targets.target_for(spec);

            if self.cancel.is_cancelled() {
                warn!(
                    remaining = plan.len() - position,
                    "Load cancelled; skipping remaining tables"
                );
                self.skip_rest(&mut report, plan, position);
                break;
            }

            let existing = match datastore.row_count(table).await {
                Ok(count) => count,
                Err(e) => {
                    let err = LoadError::datastore(table, e);
                    if err.is_fatal() {
                        return Err(self.abort(report, plan, position, err, start));
                    }
                    error!(table, error = %err, "Could not count rows");
                    report.push(LoadProgress::failed(table, target, &err));
                    continue;
                }
            };
            if existing >= target {
                info!(table, existing, target, "Table already at target");
                let mut progress = LoadProgress::new(table, existing, target);
                progress.complete(std::time::Duration::ZERO);
                report.push(progress);
                continue;
            }

            let parents = match sampler.parents_of(datastore, graph, spec).await {
                Ok(parents) => parents,
                Err(err) if err.is_fatal() => {
                    return Err(self.abort(report, plan, position, err, start));
                }
                Err(err) => {
                    error!(table, error = %err, "Skipping table");
                    let mut progress = LoadProgress::new(table, existing, target);
                    progress.fail(&err, std::time::Duration::ZERO);
                    report.push(progress);
                    continue;
                }
            };

            let generator = generators.get(table).cloned().ok_or_else(|| {
                LoadError::Plan(format!("no generator resolved for table '{table}'"))
            })?;
            let job = TableJob {
                spec,
                target,
                generator,
                parents: Arc::new(parents),
                seeds: seeds.for_table(table),
            };

            let progress = match self.options.strategy {
                Strategy::Batch => batch.load(datastore, job, &self.cancel).await,
                Strategy::BulkCopy => bulk.bulk_load(datastore, job, &self.cancel).await,
            };

            if progress.is_fatal() {
                let err = LoadError::Connection(progress.error.clone().unwrap_or_default());
                report.push(progress);
                return Err(self.abort(report, plan, position + 1, err, start));
            }
            report.push(progress);
        }

        report.elapsed_seconds = start.elapsed().as_secs_f64();
        info!(
            inserted = report.total_inserted,
            elapsed_secs = report.elapsed_seconds,
            failed = report.failed_tables().len(),
            "Load finished"
        );
        Ok(report)
    }

    fn skip_rest(&self, report: &mut LoadReport, plan: &LoadPlan, from: usize) {
        for spec in plan.tables().iter().skip(from) {
            report.push(LoadProgress::skipped(
                spec.name.clone(),
                self.targets.target_for(spec),
            ));
        }
    }

    /// Log what was done before a fatal error and hand the error back.
    fn abort(
        &self,
        mut report: LoadReport,
        plan: &LoadPlan,
        from: usize,
        err: LoadError,
        start: Instant,
    ) -> LoadError {
        self.skip_rest(&mut report, plan, from);
        report.elapsed_seconds = start.elapsed().as_secs_f64();
        error!(error = %err, "Load aborted\n{}", report.summary());
        err
    }
}
