//! Error types for loading.

use seed_core::SchemaError;
use seed_generator::GeneratorError;
use std::time::Duration;
use thiserror::Error;

/// Errors raised by a [`Datastore`](crate::Datastore) implementation.
#[derive(Error, Debug)]
pub enum DatastoreError {
    /// The connection is gone; nothing further can succeed.
    #[error("Connection error: {0}")]
    Connection(String),

    /// A statement failed.
    #[error("Query error: {0}")]
    Query(String),

    /// An operation exceeded its time limit.
    #[error("Operation timed out after {0:?}")]
    Timeout(Duration),

    /// The datastore cannot perform the operation.
    #[error("Unsupported operation: {0}")]
    Unsupported(String),
}

impl DatastoreError {
    pub fn is_connection(&self) -> bool {
        matches!(self, DatastoreError::Connection(_))
    }
}

/// Errors that can occur during a load run.
///
/// `Connection` and `Plan` abort the run. The remaining variants fail one
/// table and are recorded in its [`LoadProgress`](crate::LoadProgress).
#[derive(Error, Debug)]
pub enum LoadError {
    /// The datastore connection was lost.
    #[error("Connection error: {0}")]
    Connection(String),

    /// The load plan is invalid; nothing was inserted.
    #[error("Plan error: {0}")]
    Plan(String),

    /// A parent table has no rows for a required foreign key.
    #[error("Table '{table}' requires keys from '{parent}' (column '{column}') but '{parent}' has no rows")]
    EmptyParentPool {
        table: String,
        parent: String,
        column: String,
    },

    /// A batch insert failed and was rolled back.
    #[error("Batch {batch} of table '{table}' failed: {source}")]
    BatchInsert {
        table: String,
        batch: u64,
        #[source]
        source: DatastoreError,
    },

    /// A step of the bulk-copy protocol failed.
    #[error("Bulk copy of table '{table}' failed during {step}: {source}")]
    BulkCopy {
        table: String,
        step: &'static str,
        #[source]
        source: DatastoreError,
    },

    /// Restoring suspended triggers or indexes failed.
    #[error("Restoring constraints on '{table}' failed: {source}")]
    Restore {
        table: String,
        #[source]
        source: DatastoreError,
    },

    /// A generation worker panicked or was aborted.
    #[error("Generation worker for '{table}' failed: {message}")]
    Worker { table: String, message: String },

    /// The run was cancelled before the table finished.
    #[error("Load of table '{0}' cancelled")]
    Cancelled(String),

    /// Any other datastore failure outside a batch.
    #[error("Datastore error on '{table}': {source}")]
    Datastore {
        table: String,
        #[source]
        source: DatastoreError,
    },
}

impl LoadError {
    /// Whether the whole run must stop.
    pub fn is_fatal(&self) -> bool {
        match self {
            LoadError::Connection(_) | LoadError::Plan(_) => true,
            LoadError::BatchInsert { source, .. }
            | LoadError::BulkCopy { source, .. }
            | LoadError::Restore { source, .. }
            | LoadError::Datastore { source, .. } => source.is_connection(),
            _ => false,
        }
    }

    /// Wrap a datastore failure that happened outside a batch.
    pub fn datastore(table: &str, source: DatastoreError) -> Self {
        match source {
            DatastoreError::Connection(message) => LoadError::Connection(message),
            source => LoadError::Datastore {
                table: table.to_string(),
                source,
            },
        }
    }
}

impl From<SchemaError> for LoadError {
    fn from(err: SchemaError) -> Self {
        LoadError::Plan(err.to_string())
    }
}

impl From<GeneratorError> for LoadError {
    fn from(err: GeneratorError) -> Self {
        LoadError::Plan(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fatal_classification() {
        assert!(LoadError::Plan("cycle".into()).is_fatal());
        assert!(LoadError::BatchInsert {
            table: "orders".into(),
            batch: 3,
            source: DatastoreError::Connection("closed".into()),
        }
        .is_fatal());
        assert!(!LoadError::BatchInsert {
            table: "orders".into(),
            batch: 3,
            source: DatastoreError::Query("duplicate key".into()),
        }
        .is_fatal());
        assert!(!LoadError::Cancelled("orders".into()).is_fatal());
    }

    #[test]
    fn test_schema_error_is_plan_error() {
        let err: LoadError = SchemaError::Cycle {
            cycle: vec!["a".into(), "b".into(), "a".into()],
        }
        .into();
        assert!(matches!(err, LoadError::Plan(ref m) if m.contains("a -> b -> a")));
    }

    #[test]
    fn test_batch_error_message_names_table_and_batch() {
        let err = LoadError::BatchInsert {
            table: "orders".into(),
            batch: 3,
            source: DatastoreError::Timeout(Duration::from_secs(30)),
        };
        let message = err.to_string();
        assert!(message.contains("Batch 3"));
        assert!(message.contains("orders"));
    }
}
