//! Batched parameterized inserts, one transaction per batch.

use crate::config::{BatchErrorPolicy, LoadOptions};
use crate::datastore::Datastore;
use crate::error::{DatastoreError, LoadError};
use crate::report::{LoadProgress, LoadStatus};
use crate::worker::{partition, spawn_workers, TableJob};
use seed_core::{Record, TableSpec};
use std::time::{Duration, Instant};
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

/// Tops a table up to its target with batched inserts.
///
/// Each batch is generated, inserted and committed on its own, so a failure
/// costs at most one batch. Memory holds one batch plus the worker channel.
#[derive(Debug, Clone)]
pub struct BatchLoader {
    batch_size: usize,
    chunk_size: usize,
    workers: usize,
    timeout: Duration,
    policy: BatchErrorPolicy,
}

impl BatchLoader {
    pub fn new(options: &LoadOptions) -> Self {
        Self {
            batch_size: options.batch_size.max(1),
            chunk_size: options.chunk_size(),
            workers: options.workers.max(1),
            timeout: options.timeout,
            policy: options.on_batch_error,
        }
    }

    /// Insert `target - row_count` rows; nothing when already at target.
    pub async fn load(
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

        info!(
            table,
            existing,
            target = job.target,
            needed,
            batch_size = self.batch_size,
            "Loading table with batched inserts"
        );

        let ranges = partition(existing, needed, self.workers);
        let mut workers =
            spawn_workers(&job.generation(existing, self.chunk_size), &ranges, cancel);
        let mut pending: Vec<Record> = Vec::with_capacity(self.batch_size);
        let mut batch_index = 0u64;

        loop {
            if cancel.is_cancelled() {
                warn!(table, batches = progress.batches_committed, "Cancelled between batches");
                break;
            }

            while pending.len() < self.batch_size {
                match workers.receiver.recv().await {
                    Some(chunk) => pending.extend(chunk),
                    None => break,
                }
            }
            if pending.is_empty() {
                break;
            }
            let batch = if pending.len() > self.batch_size {
                let rest = pending.split_off(self.batch_size);
                std::mem::replace(&mut pending, rest)
            } else {
                std::mem::take(&mut pending)
            };
            batch_index += 1;

            match self.write_batch(datastore, job.spec, &batch).await {
                Ok(rows) => {
                    progress.record_batch(rows, start.elapsed());
                    info!(
                        table,
                        batch = batch_index,
                        inserted = progress.inserted_this_run,
                        percent = progress.percent().round(),
                        elapsed_secs = progress.elapsed_seconds,
                        rows_per_sec = progress.rows_per_second.round(),
                        "Batch committed"
                    );
                }
                Err(source) => {
                    progress.failed_batches += 1;
                    let err = LoadError::BatchInsert {
                        table: table.to_string(),
                        batch: batch_index,
                        source,
                    };
                    error!(table, batch = batch_index, error = %err, "Batch rolled back");
                    progress.fail(&err, start.elapsed());
                    if err.is_fatal() || self.policy == BatchErrorPolicy::AbortTable {
                        break;
                    }
                }
            }
        }

        let generated = workers.join().await;
        if let Err(message) = generated {
            progress.fail(
                &LoadError::Worker {
                    table: table.to_string(),
                    message,
                },
                start.elapsed(),
            );
        }

        if progress.status == LoadStatus::Pending {
            if progress.is_terminal() {
                progress.complete(start.elapsed());
                info!(
                    table,
                    inserted = progress.inserted_this_run,
                    batches = progress.batches_committed,
                    rows_per_sec = progress.rows_per_second.round(),
                    "Table complete"
                );
            } else if cancel.is_cancelled() {
                progress.cancel(start.elapsed());
            } else {
                progress.fail(
                    &LoadError::Worker {
                        table: table.to_string(),
                        message: format!(
                            "generated {} of {needed} rows",
                            progress.inserted_this_run
                        ),
                    },
                    start.elapsed(),
                );
            }
        }
        progress
    }

    /// Insert one batch in its own transaction, rolling back on failure.
    async fn write_batch(
        &self,
        datastore: &dyn Datastore,
        spec: &TableSpec,
        rows: &[Record],
    ) -> Result<u64, DatastoreError> {
        datastore.begin().await?;

        let insert = datastore.insert_rows(spec, rows);
        let inserted = match tokio::time::timeout(self.timeout, insert).await {
            Ok(Ok(count)) => datastore.commit().await.map(|_| count),
            Ok(Err(e)) => Err(e),
            Err(_) => Err(DatastoreError::Timeout(self.timeout)),
        };

        if inserted.is_err() {
            if let Err(e) = datastore.rollback().await {
                warn!(table = %spec.name, error = %e, "Rollback failed");
            }
        }
        inserted
    }
}
