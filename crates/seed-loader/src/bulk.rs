//! Staging-table bulk copy.
//!
//! Protocol per table:
//!
//! ```text
//! suspend (optional) ─► BEGIN ─► CREATE staging ─► COPY chunks ─► INSERT .. SELECT
//!        │                                                            │
//!        │                      any failure ─► ROLLBACK               ▼
//!        └──────────── restore on every exit path ◄──── DROP staging, COMMIT
//! ```

use crate::config::LoadOptions;
use crate::datastore::{Datastore, SuspendedState};
use crate::error::{DatastoreError, LoadError};
use crate::report::{LoadProgress, LoadStatus};
use crate::worker::{join_workers, partition, spawn_workers, TableJob, WorkerSet};
use futures::StreamExt;
use seed_core::TableSpec;
use std::future::Future;
use std::time::{Duration, Instant};
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

/// Triggers and secondary indexes switched off for one table.
///
/// Async work cannot run in `Drop`, so the guard must be handed back through
/// [`SuspensionGuard::release`]. Dropping it unreleased only logs a warning.
#[must_use = "release() the guard to restore triggers and indexes"]
#[derive(Debug)]
pub struct SuspensionGuard {
    state: Option<SuspendedState>,
}

impl SuspensionGuard {
    /// Suspend constraints on `table`.
    pub async fn acquire(
        datastore: &dyn Datastore,
        table: &TableSpec,
    ) -> Result<Self, DatastoreError> {
        let state = datastore.suspend(table).await?;
        info!(
            table = %table.name,
            dropped_indexes = state.dropped_indexes.len(),
            triggers_disabled = state.triggers_disabled,
            "Suspended constraints"
        );
        Ok(Self { state: Some(state) })
    }

    pub fn state(&self) -> Option<&SuspendedState> {
        self.state.as_ref()
    }

    /// Restore everything that was suspended.
    pub async fn release(mut self, datastore: &dyn Datastore) -> Result<(), DatastoreError> {
        let Some(state) = self.state.take() else {
            return Ok(());
        };
        datastore.restore(&state).await?;
        info!(
            table = %state.table,
            restored_indexes = state.dropped_indexes.len(),
            "Restored constraints"
        );
        Ok(())
    }
}

impl Drop for SuspensionGuard {
    fn drop(&mut self) {
        if let Some(state) = &self.state {
            warn!(
                table = %state.table,
                indexes = ?state.dropped_indexes,
                "Suspension guard dropped without release; triggers and indexes are still off"
            );
        }
    }
}

/// Tops a table up with one staged COPY per table.
#[derive(Debug, Clone)]
pub struct BulkCopyLoader {
    batch_size: usize,
    chunk_size: usize,
    workers: usize,
    timeout: Duration,
    suspend_constraints: bool,
}

async fn timed_step<T>(
    table: &str,
    step: &'static str,
    limit: Duration,
    op: impl Future<Output = Result<T, DatastoreError>>,
) -> Result<T, LoadError> {
    let source = match tokio::time::timeout(limit, op).await {
        Ok(Ok(value)) => return Ok(value),
        Ok(Err(e)) => e,
        Err(_) => DatastoreError::Timeout(limit),
    };
    Err(LoadError::BulkCopy {
        table: table.to_string(),
        step,
        source,
    })
}

impl BulkCopyLoader {
    pub fn new(options: &LoadOptions) -> Self {
        Self {
            batch_size: options.batch_size.max(1),
            chunk_size: options.chunk_size(),
            workers: options.workers.max(1),
            timeout: options.timeout,
            suspend_constraints: options.suspend_constraints,
        }
    }

    /// Insert `target - row_count` rows through a staging table.
    pub async fn bulk_load(
        &self,
        datastore: &dyn Datastore,
        job: TableJob<'_>,
        cancel: &CancellationToken,
    ) -> LoadProgress {
        let start = Instant::now();
        let table = job.spec.name.as_str();

        let existing = match datastore.row_count(table).await {
            Ok(count) => count,
            Err(e) => {
                return LoadProgress::failed(table, job.target, &LoadError::datastore(table, e))
            }
        };
        let mut progress = LoadProgress::new(table, existing, job.target);
        let needed = progress.needed();
        if needed == 0 {
            info!(table, existing, target = job.target, "Table already at target");
            progress.complete(start.elapsed());
            return progress;
        }
        if cancel.is_cancelled() {
            progress.cancel(start.elapsed());
            return progress;
        }

        info!(
            table,
            existing,
            target = job.target,
            needed,
            workers = self.workers,
            suspend = self.suspend_constraints,
            "Loading table with bulk copy"
        );

        let guard = if self.suspend_constraints {
            match SuspensionGuard::acquire(datastore, job.spec).await {
                Ok(guard) => Some(guard),
                Err(source) => {
                    let err = LoadError::BulkCopy {
                        table: table.to_string(),
                        step: "suspend",
                        source,
                    };
                    error!(table, error = %err, "Could not suspend constraints");
                    progress.fail(&err, start.elapsed());
                    return progress;
                }
            }
        } else {
            None
        };

        let copied = self
            .copy_in_transaction(datastore, &job, existing, needed, cancel)
            .await;

        let restored = match guard {
            Some(guard) => guard.release(datastore).await,
            None => Ok(()),
        };

        match copied {
            Ok(rows) => progress.record_batch(rows, start.elapsed()),
            Err(LoadError::Cancelled(_)) => {
                warn!(table, "Bulk copy cancelled and rolled back");
                progress.cancel(start.elapsed());
            }
            Err(err) => {
                progress.failed_batches += 1;
                error!(table, error = %err, "Bulk copy rolled back");
                progress.fail(&err, start.elapsed());
            }
        }
        if let Err(source) = restored {
            let err = LoadError::Restore {
                table: table.to_string(),
                source,
            };
            error!(table, error = %err, "Constraint restore failed");
            progress.fail(&err, start.elapsed());
        }

        if progress.status == LoadStatus::Pending && progress.is_terminal() {
            progress.complete(start.elapsed());
            info!(
                table,
                inserted = progress.inserted_this_run,
                rows_per_sec = progress.rows_per_second.round(),
                "Table complete"
            );
        } else if progress.status == LoadStatus::Pending {
            let err = LoadError::Worker {
                table: table.to_string(),
                message: format!("moved {} of {needed} rows", progress.inserted_this_run),
            };
            progress.fail(&err, start.elapsed());
        }
        progress
    }

    /// Steps 2-5, rolled back as a unit on any failure.
    async fn copy_in_transaction(
        &self,
        datastore: &dyn Datastore,
        job: &TableJob<'_>,
        existing: u64,
        needed: u64,
        cancel: &CancellationToken,
    ) -> Result<u64, LoadError> {
        let table = job.spec.name.as_str();
        timed_step(table, "begin", self.timeout, datastore.begin()).await?;

        match self.stage_and_move(datastore, job, existing, needed, cancel).await {
            Ok(rows) => {
                timed_step(table, "commit", self.timeout, datastore.commit()).await?;
                Ok(rows)
            }
            Err(err) => {
                if let Err(e) = datastore.rollback().await {
                    warn!(table, error = %e, "Rollback failed");
                }
                Err(err)
            }
        }
    }

    async fn stage_and_move(
        &self,
        datastore: &dyn Datastore,
        job: &TableJob<'_>,
        existing: u64,
        needed: u64,
        cancel: &CancellationToken,
    ) -> Result<u64, LoadError> {
        let table = job.spec.name.as_str();
        let staging = timed_step(
            table,
            "create staging",
            self.timeout,
            datastore.create_staging(job.spec),
        )
        .await?;

        let ranges = partition(existing, needed, self.workers);
        let WorkerSet { receiver, handles } =
            spawn_workers(&job.generation(existing, self.chunk_size), &ranges, cancel);
        let chunks = futures::stream::unfold(receiver, |mut rx| async move {
            rx.recv().await.map(|chunk| (chunk, rx))
        })
        .boxed();

        // One COPY carries the whole table, so its limit scales with the
        // number of batches it replaces.
        let batches = needed.div_ceil(self.batch_size as u64).max(1);
        let copy_limit = self
            .timeout
            .saturating_mul(u32::try_from(batches).unwrap_or(u32::MAX));
        let copied = timed_step(
            table,
            "copy",
            copy_limit,
            datastore.copy_into_staging(&staging, job.spec, chunks),
        )
        .await;
        let generated = join_workers(handles).await;
        let copied = copied?;

        if let Err(message) = generated {
            return Err(LoadError::Worker {
                table: table.to_string(),
                message,
            });
        }
        if copied < needed {
            if cancel.is_cancelled() {
                return Err(LoadError::Cancelled(table.to_string()));
            }
            return Err(LoadError::Worker {
                table: table.to_string(),
                message: format!("copied {copied} of {needed} rows"),
            });
        }
        info!(table, rows = copied, "Staged rows");

        let moved = timed_step(
            table,
            "move",
            self.timeout,
            datastore.move_from_staging(&staging, job.spec),
        )
        .await?;
        timed_step(
            table,
            "drop staging",
            self.timeout,
            datastore.drop_staging(&staging),
        )
        .await?;
        Ok(moved)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::{FailPoint, MemoryDatastore};
    use crate::pool::ParentPools;
    use seed_core::{ColumnSpec, ColumnType, DependencyGraph, Record, Value};
    use seed_generator::{ParentKeys, RecordGenerator, WorkerSeeds};
    use std::sync::Arc;

    struct Readings;

    impl RecordGenerator for Readings {
        fn table(&self) -> &str {
            "readings"
        }

        fn columns(&self) -> Vec<&str> {
            vec!["id", "value"]
        }

        fn generate(&self, rng: &mut dyn rand::RngCore, _parent_keys: &ParentKeys) -> Record {
            Record::new(vec![
                Value::Uuid(seed_generator::generators::uuid::uuid_v4(rng)),
                Value::Integer(i64::from(rng.next_u32())),
            ])
        }
    }

    const INDEX: &str = "CREATE INDEX idx_readings_value ON readings (value)";

    fn graph() -> DependencyGraph {
        DependencyGraph::new(vec![TableSpec::new(
            "readings",
            "id",
            vec![
                ColumnSpec::new("id", ColumnType::Uuid),
                ColumnSpec::new("value", ColumnType::Integer),
            ],
        )])
        .unwrap()
    }

    fn job(spec: &TableSpec, target: u64) -> TableJob<'_> {
        TableJob {
            spec,
            target,
            generator: Arc::new(Readings),
            parents: Arc::new(ParentPools::none()),
            seeds: WorkerSeeds::new(5).for_table("readings"),
        }
    }

    fn loader() -> BulkCopyLoader {
        BulkCopyLoader::new(
            &LoadOptions::default()
                .with_batch_size(100)
                .with_workers(4)
                .with_suspend_constraints(true),
        )
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_bulk_copy_success_restores() {
        let graph = graph();
        let spec = graph.get_table("readings").unwrap();
        let store = MemoryDatastore::new(&graph).with_index("readings", INDEX);

        let progress = loader()
            .bulk_load(&store, job(spec, 1_001), &CancellationToken::new())
            .await;

        assert_eq!(progress.status, LoadStatus::Completed);
        assert_eq!(store.row_count("readings").await.unwrap(), 1_001);
        assert_eq!(store.indexes("readings"), vec![INDEX.to_string()]);
        assert!(store.triggers_enabled("readings"));
        assert!(store.staging_tables().is_empty());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_failed_move_rolls_back_and_restores() {
        let graph = graph();
        let spec = graph.get_table("readings").unwrap();
        let store = MemoryDatastore::new(&graph).with_index("readings", INDEX);
        store.fail_at(FailPoint::Move {
            table: "readings".into(),
        });

        let progress = loader()
            .bulk_load(&store, job(spec, 500), &CancellationToken::new())
            .await;

        assert_eq!(progress.status, LoadStatus::Failed);
        assert!(progress.error.as_deref().unwrap().contains("move"));
        assert_eq!(store.row_count("readings").await.unwrap(), 0);
        assert_eq!(store.indexes("readings"), vec![INDEX.to_string()]);
        assert!(store.triggers_enabled("readings"));
        assert!(store.staging_tables().is_empty());
        assert!(!store.in_transaction());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_failed_copy_restores() {
        let graph = graph();
        let spec = graph.get_table("readings").unwrap();
        let store = MemoryDatastore::new(&graph).with_index("readings", INDEX);
        store.fail_at(FailPoint::Copy {
            table: "readings".into(),
        });

        let progress = loader()
            .bulk_load(&store, job(spec, 500), &CancellationToken::new())
            .await;

        assert_eq!(progress.status, LoadStatus::Failed);
        assert_eq!(store.indexes("readings").len(), 1);
        assert!(store.triggers_enabled("readings"));
        let ops = store.operations();
        let suspend = ops.iter().position(|op| op == "suspend readings").unwrap();
        let restore = ops.iter().position(|op| op == "restore readings").unwrap();
        let rollback = ops.iter().position(|op| op == "rollback").unwrap();
        assert!(suspend < rollback && rollback < restore);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_restore_failure_fails_table() {
        let graph = graph();
        let spec = graph.get_table("readings").unwrap();
        let store = MemoryDatastore::new(&graph).with_index("readings", INDEX);
        store.fail_at(FailPoint::Restore {
            table: "readings".into(),
        });

        let progress = loader()
            .bulk_load(&store, job(spec, 200), &CancellationToken::new())
            .await;

        assert_eq!(progress.status, LoadStatus::Failed);
        assert!(progress.error.as_deref().unwrap().contains("Restoring"));
        // The rows themselves were committed before the restore ran.
        assert_eq!(progress.inserted_this_run, 200);
    }

    #[tokio::test]
    async fn test_guard_acquire_and_release() {
        let graph = graph();
        let spec = graph.get_table("readings").unwrap();
        let store = MemoryDatastore::new(&graph).with_index("readings", INDEX);

        let guard = SuspensionGuard::acquire(&store, spec).await.unwrap();
        assert_eq!(guard.state().unwrap().dropped_indexes.len(), 1);
        assert!(store.indexes("readings").is_empty());

        guard.release(&store).await.unwrap();
        assert_eq!(store.indexes("readings").len(), 1);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_top_up_after_partial_table() {
        let graph = graph();
        let spec = graph.get_table("readings").unwrap();
        let store = MemoryDatastore::new(&graph);

        let first = loader()
            .bulk_load(&store, job(spec, 300), &CancellationToken::new())
            .await;
        let second = loader()
            .bulk_load(&store, job(spec, 450), &CancellationToken::new())
            .await;
        let third = loader()
            .bulk_load(&store, job(spec, 450), &CancellationToken::new())
            .await;

        assert_eq!(first.inserted_this_run, 300);
        assert_eq!(second.existing_count, 300);
        assert_eq!(second.inserted_this_run, 150);
        assert_eq!(third.inserted_this_run, 0);
        assert_eq!(third.status, LoadStatus::Completed);
        assert_eq!(store.row_count("readings").await.unwrap(), 450);
    }
}
