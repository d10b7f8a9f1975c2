//! Generation workers.
//!
//! Row generation is CPU-bound, so it runs on the blocking pool. Each worker
//! owns a contiguous slice of the rows still needed and an RNG seeded for the
//! table's starting row count and the absolute offset where that slice starts. Workers push fixed-size
//! chunks into a bounded channel read by the single writer; when the writer
//! stops reading, workers stop at their next send.

use crate::pool::ParentPools;
use seed_core::{Record, TableSpec};
use seed_generator::{ParentKeys, RecordGenerator, TableSeeds};
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::debug;

/// One worker's share of a table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WorkerRange {
    /// Absolute row offset of the first row (existing rows included)
    pub offset: u64,
    /// Number of rows to generate
    pub count: u64,
}

/// Split `count` rows starting at `start` into at most `workers` contiguous
/// ranges. The last range takes the remainder.
pub fn partition(start: u64, count: u64, workers: usize) -> Vec<WorkerRange> {
    if count == 0 {
        return Vec::new();
    }
    let workers = (workers.max(1) as u64).min(count);
    let per_worker = count / workers;

    (0..workers)
        .map(|i| {
            let len = if i == workers - 1 {
                count - per_worker * (workers - 1)
            } else {
                per_worker
            };
            WorkerRange {
                offset: start + i * per_worker,
                count: len,
            }
        })
        .collect()
}

/// Everything a worker needs to generate rows for one table.
#[derive(Clone)]
pub struct GenerationJob {
    pub generator: Arc<dyn RecordGenerator>,
    pub parents: Arc<ParentPools>,
    pub seeds: TableSeeds,
    /// Rows per chunk sent to the writer
    pub chunk_size: usize,
}

/// One table's load: what to generate and how many rows to end up with.
#[derive(Clone)]
pub struct TableJob<'a> {
    pub spec: &'a TableSpec,
    /// Desired total row count after the load
    pub target: u64,
    pub generator: Arc<dyn RecordGenerator>,
    pub parents: Arc<ParentPools>,
    pub seeds: TableSeeds,
}

impl TableJob<'_> {
    /// Worker inputs for a load that found `existing` rows in the table.
    pub fn generation(&self, existing: u64, chunk_size: usize) -> GenerationJob {
        GenerationJob {
            generator: Arc::clone(&self.generator),
            parents: Arc::clone(&self.parents),
            seeds: self.seeds.resumed_at(existing),
            chunk_size,
        }
    }
}

/// Running workers and the receiving end of their channel.
pub struct WorkerSet {
    pub receiver: mpsc::Receiver<Vec<Record>>,
    pub handles: Vec<JoinHandle<u64>>,
}

impl WorkerSet {
    /// Stop reading and wait for every worker.
    pub async fn join(self) -> Result<u64, String> {
        drop(self.receiver);
        join_workers(self.handles).await
    }
}

/// Wait for workers, returning the rows they generated or the first failure.
pub async fn join_workers(handles: Vec<JoinHandle<u64>>) -> Result<u64, String> {
    let mut generated = 0;
    let mut failure = None;
    for handle in handles {
        match handle.await {
            Ok(rows) => generated += rows,
            Err(e) => {
                failure.get_or_insert_with(|| e.to_string());
            }
        }
    }
    match failure {
        Some(message) => Err(message),
        None => Ok(generated),
    }
}

/// Spawn one blocking worker per range.
///
/// The channel holds `2 * ranges` chunks, so at most that many chunks
/// beyond the writer's current batch are in memory.
pub fn spawn_workers(
    job: &GenerationJob,
    ranges: &[WorkerRange],
    cancel: &CancellationToken,
) -> WorkerSet {
    let (tx, receiver) = mpsc::channel(ranges.len().max(1) * 2);

    let handles = ranges
        .iter()
        .map(|range| {
            let job = job.clone();
            let tx = tx.clone();
            let cancel = cancel.clone();
            let range = *range;
            tokio::task::spawn_blocking(move || run_worker(job, range, tx, cancel))
        })
        .collect();

    WorkerSet { receiver, handles }
}

fn run_worker(
    job: GenerationJob,
    range: WorkerRange,
    tx: mpsc::Sender<Vec<Record>>,
    cancel: CancellationToken,
) -> u64 {
    let mut rng = job.seeds.stream(range.offset);
    let mut keys = ParentKeys::new();
    let chunk_size = job.chunk_size.max(1);
    let mut generated = 0u64;

    while generated < range.count {
        if cancel.is_cancelled() {
            break;
        }
        let len = chunk_size.min((range.count - generated) as usize);
        let mut chunk = Vec::with_capacity(len);
        for _ in 0..len {
            job.parents.select(&mut rng, &mut keys);
            chunk.push(job.generator.generate(&mut rng, &keys));
        }
        if tx.blocking_send(chunk).is_err() {
            debug!(
                table = job.generator.table(),
                offset = range.offset,
                "Writer stopped reading; worker exiting"
            );
            break;
        }
        generated += len as u64;
    }
    generated
}
