//! PostgreSQL datastore for bulkseed.
//!
//! Implements [`seed_loader::Datastore`] on one tokio-postgres session:
//! multi-row parameterized INSERT for the batch strategy, binary COPY into a
//! TEMP staging table for the bulk-copy strategy, and trigger/index
//! suspension around bulk copies. An opt-in session profile relaxes
//! synchronous commit and raises work memory for the load.
//!
//! Target tables must already exist; nothing here creates them.

pub mod config;
pub mod copy;
pub mod datastore;
pub mod error;
pub mod insert;
pub mod session;
pub mod suspend;

pub use config::{PostgresArgs, PostgresConfig};
pub use datastore::PostgresDatastore;
pub use error::PostgresDatastoreError;
