//! Dependency-ordered loading for bulkseed.
//!
//! This crate turns a [`LoadPlan`](seed_core::LoadPlan) into rows in a
//! datastore:
//! 1. Sample bounded key pools from parent tables
//! 2. Generate rows on blocking workers with per-worker seeds
//! 3. Insert them with batched transactions or a staged bulk copy
//! 4. Report per-table progress
//!
//! # Example
//!
//! ```ignore
//! use seed_core::{DependencyGraph, TargetCounts};
//! use seed_generator::ecommerce_registry;
//! use seed_loader::{LoadOptions, LoadOrchestrator, MemoryDatastore};
//!
//! let graph = DependencyGraph::ecommerce()?;
//! let store = MemoryDatastore::new(&graph);
//! let orchestrator = LoadOrchestrator::new(
//!     ecommerce_registry(chrono::Utc::now().naive_utc())?,
//!     TargetCounts::uniform(1_000),
//!     LoadOptions::default().with_seed(Some(42)),
//! );
//! let report = orchestrator.load(&store, &graph).await?;
//! assert!(report.passed());
//! ```

pub mod batch;
pub mod bulk;
pub mod config;
pub mod datastore;
pub mod error;
pub mod memory;
pub mod orchestrator;
pub mod pool;
pub mod report;
pub mod worker;

pub use batch::BatchLoader;
pub use bulk::{BulkCopyLoader, SuspensionGuard};
pub use config::{BatchErrorPolicy, LoadOptions, Strategy};
pub use datastore::{Datastore, RecordStream, SuspendedState};
pub use error::{DatastoreError, LoadError};
pub use memory::{FailPoint, MemoryDatastore};
pub use orchestrator::LoadOrchestrator;
pub use pool::{KeyPool, KeyPoolSampler, ParentPools};
pub use report::{LoadProgress, LoadReport, LoadStatus};
pub use worker::{partition, TableJob, WorkerRange};
