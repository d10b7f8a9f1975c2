//! The datastore capability the loaders write through.

use crate::error::DatastoreError;
use async_trait::async_trait;
use futures::stream::BoxStream;
use seed_core::{Record, TableSpec, Value};

/// Chunks of generated rows flowing into a bulk copy.
pub type RecordStream<'a> = BoxStream<'a, Vec<Record>>;

/// What [`Datastore::suspend`] switched off, so it can be switched back on.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SuspendedState {
    /// Table the suspension applies to
    pub table: String,
    /// Whether triggers (and the FK checks they implement) were disabled
    pub triggers_disabled: bool,
    /// Definitions of the indexes that were dropped, in creation order
    pub dropped_indexes: Vec<String>,
}

/// A transactional store the loaders insert into.
///
/// All methods take `&self`; a single coordinating task owns the connection
/// and issues statements one at a time. `begin`/`commit`/`rollback` bracket
/// the statements issued in between.
#[async_trait]
pub trait Datastore: Send + Sync {
    /// Current number of rows in a table.
    async fn row_count(&self, table: &str) -> Result<u64, DatastoreError>;

    /// Up to `limit` primary keys of `table`, chosen uniformly at random.
    async fn sample_keys(&self, table: &TableSpec, limit: usize)
        -> Result<Vec<Value>, DatastoreError>;

    async fn begin(&self) -> Result<(), DatastoreError>;

    async fn commit(&self) -> Result<(), DatastoreError>;

    async fn rollback(&self) -> Result<(), DatastoreError>;

    /// Insert rows whose values follow the table's column order.
    async fn insert_rows(&self, table: &TableSpec, rows: &[Record])
        -> Result<u64, DatastoreError>;

    /// Create an empty staging table shaped like `table`, returning its name.
    async fn create_staging(&self, table: &TableSpec) -> Result<String, DatastoreError>;

    /// Copy every chunk of `rows` into the staging table in one operation.
    async fn copy_into_staging(
        &self,
        staging: &str,
        table: &TableSpec,
        rows: RecordStream<'_>,
    ) -> Result<u64, DatastoreError>;

    /// Move all staged rows into the target table with one set-based insert.
    async fn move_from_staging(&self, staging: &str, table: &TableSpec)
        -> Result<u64, DatastoreError>;

    async fn drop_staging(&self, staging: &str) -> Result<(), DatastoreError>;

    /// Disable triggers and drop secondary indexes on `table`.
    async fn suspend(&self, table: &TableSpec) -> Result<SuspendedState, DatastoreError>;

    /// Undo a previous [`Datastore::suspend`].
    async fn restore(&self, state: &SuspendedState) -> Result<(), DatastoreError>;
}
