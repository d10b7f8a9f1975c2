//! Per-session settings for bulk loads.
//!
//! Only parameters a regular session may `SET` are used. Server-wide knobs
//! such as `shared_buffers` or `wal_buffers` need a restart and are left to
//! the operator.

use crate::error::Result;
use tokio_postgres::Client;
use tracing::info;

/// Memory given to sorts and index rebuilds when tuning is on.
pub const DEFAULT_WORK_MEM: &str = "256MB";

fn quote_literal(value: &str) -> String {
    format!("'{}'", value.replace('\'', "''"))
}

/// `SET` statements for a bulk-load session.
///
/// `synchronous_commit = off` lets a commit return before its WAL is
/// flushed; a crash can lose the last batches but never corrupts the table.
pub fn session_tuning_sql(work_mem: &str) -> Vec<String> {
    let mem = quote_literal(work_mem);
    vec![
        "SET synchronous_commit = off".to_string(),
        format!("SET work_mem = {mem}"),
        format!("SET maintenance_work_mem = {mem}"),
    ]
}

/// Run `statements` on the session, stopping at the first failure.
pub async fn apply(client: &Client, statements: &[String]) -> Result<()> {
    for sql in statements {
        client.batch_execute(sql).await?;
    }
    info!(settings = statements.len(), "Applied bulk-load session settings");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tuning_statements() {
        assert_eq!(
            session_tuning_sql(DEFAULT_WORK_MEM),
            vec![
                "SET synchronous_commit = off",
                "SET work_mem = '256MB'",
                "SET maintenance_work_mem = '256MB'",
            ]
        );
    }

    #[test]
    fn test_work_mem_is_quoted() {
        let sql = session_tuning_sql("1GB'; DROP TABLE users; --");
        assert_eq!(sql[1], "SET work_mem = '1GB''; DROP TABLE users; --'");
    }
}
