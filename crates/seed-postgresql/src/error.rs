//! Error types for the PostgreSQL datastore.

use seed_loader::DatastoreError;
use thiserror::Error;

/// Errors that can occur talking to PostgreSQL.
#[derive(Error, Debug)]
pub enum PostgresDatastoreError {
    /// PostgreSQL connection or query error.
    #[error("PostgreSQL error: {0}")]
    PostgreSQL(#[from] tokio_postgres::Error),

    /// Table has no usable primary key.
    #[error("Table '{0}' has no primary key column")]
    NoPrimaryKey(String),

    /// Configuration error.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Connection error.
    #[error("Connection error: {0}")]
    Connection(String),
}

impl PostgresDatastoreError {
    /// Whether the session is gone.
    ///
    /// Covers a closed client and SQLSTATE class 08 (connection exception)
    /// and 57P01-57P03 (server shutting down or unavailable).
    pub fn is_connection(&self) -> bool {
        match self {
            PostgresDatastoreError::Connection(_) => true,
            PostgresDatastoreError::PostgreSQL(e) => {
                if e.is_closed() {
                    return true;
                }
                match e.code() {
                    Some(code) => {
                        let code = code.code();
                        code.starts_with("08") || matches!(code, "57P01" | "57P02" | "57P03")
                    }
                    None => false,
                }
            }
            _ => false,
        }
    }
}

impl From<PostgresDatastoreError> for DatastoreError {
    fn from(err: PostgresDatastoreError) -> Self {
        if err.is_connection() {
            DatastoreError::Connection(err.to_string())
        } else {
            DatastoreError::Query(err.to_string())
        }
    }
}

pub type Result<T> = std::result::Result<T, PostgresDatastoreError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_connection_errors_classified() {
        let err: DatastoreError = PostgresDatastoreError::Connection("reset".into()).into();
        assert!(err.is_connection());

        let err: DatastoreError = PostgresDatastoreError::NoPrimaryKey("users".into()).into();
        assert!(matches!(err, DatastoreError::Query(ref m) if m.contains("users")));
    }
}
