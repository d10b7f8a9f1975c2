//! Core types for bulkseed.
//!
//! This crate describes what gets loaded, not how:
//!
//! - [`ColumnType`] - semantic column types
//! - [`Value`] and [`Record`] - generated values and rows
//! - [`TableSpec`] and [`DependencyGraph`] - tables and their foreign keys
//! - [`LoadPlan`] - the dependency-ordered tables for one run
//!
//! # Architecture
//!
//! ```text
//! seed-core (this crate)
//!    │
//!    ├─── seed-generator   (RecordGenerator implementations per table)
//!    ├─── seed-loader      (key pools, batch/bulk-copy loaders, orchestrator)
//!    └─── seed-postgresql  (Datastore implementation on tokio-postgres)
//! ```
//!
//! # Example
//!
//! ```rust
//! use seed_core::DependencyGraph;
//!
//! let graph = DependencyGraph::ecommerce().unwrap();
//! let plan = graph.topological_order().unwrap();
//! assert_eq!(plan.table_names()[0], "categories");
//! ```

pub mod plan;
pub mod schema;
pub mod types;
pub mod values;

// Re-exports for convenience
pub use plan::{LoadPlan, TargetCounts};
pub use schema::{
    ColumnSpec, DependencyGraph, ForeignKeyRef, SchemaError, TableSpec, ECOMMERCE_SCHEMA_YAML,
};
pub use types::ColumnType;
pub use values::{Record, Value};
