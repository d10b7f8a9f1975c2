//! Record generators for bulkseed.
//!
//! A [`RecordGenerator`] produces one row for one table from an RNG and the
//! parent keys the loader picked for that row. Generators hold no mutable
//! state, so a single instance is shared by every worker of a table; each
//! worker brings its own RNG seeded from [`WorkerSeeds`].
//!
//! # Architecture
//!
//! ```text
//! WorkerSeeds ──► StdRng (per worker)
//!                    │
//!  ParentKeys ──┐    │
//!               ▼    ▼
//!       ┌──────────────────┐
//!       │ RecordGenerator  │  (looked up in GeneratorRegistry,
//!       └────────┬─────────┘   columns checked against TableSpec)
//!                ▼
//!             Record
//! ```
//!
//! # Example
//!
//! ```rust
//! use chrono::NaiveDate;
//! use rand::rngs::StdRng;
//! use rand::SeedableRng;
//! use seed_core::{DependencyGraph, Value};
//! use seed_generator::{ecommerce_registry, ParentKeys};
//!
//! let anchor = NaiveDate::from_ymd_opt(2025, 1, 1)
//!     .unwrap()
//!     .and_hms_opt(0, 0, 0)
//!     .unwrap();
//! let graph = DependencyGraph::ecommerce().unwrap();
//! let registry = ecommerce_registry(anchor).unwrap();
//! let users = registry.resolve(graph.get_table("users").unwrap()).unwrap();
//!
//! let mut rng = StdRng::seed_from_u64(42);
//! let row = users.generate(&mut rng, &ParentKeys::new());
//! assert_eq!(row.len(), 12);
//! assert!(matches!(row.get(0), Some(Value::Uuid(_))));
//! ```

pub mod ecommerce;
pub mod generator;
pub mod generators;
pub mod generic;
pub mod seeds;

pub use ecommerce::ecommerce_registry;
pub use generator::{
    check_columns, GeneratorError, GeneratorRegistry, ParentKey, ParentKeys, RecordGenerator,
};
pub use generic::ColumnTypeGenerator;
pub use seeds::{TableSeeds, WorkerSeeds};
