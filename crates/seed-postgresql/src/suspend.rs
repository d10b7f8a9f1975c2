//! Trigger and index suspension for bulk copy.
//!
//! `DISABLE TRIGGER ALL` also switches off the internal triggers behind
//! foreign keys, which requires superuser. Only indexes that back neither the
//! primary key nor a constraint are dropped; their definitions are captured
//! with `pg_get_indexdef` so restore can replay them verbatim.

use crate::error::{PostgresDatastoreError, Result};
use crate::insert::{qualified, quote_ident};
use seed_loader::SuspendedState;
use tokio_postgres::Client;
use tracing::{debug, warn};

const SECONDARY_INDEXES_SQL: &str = "\
SELECT i.relname, pg_get_indexdef(ix.indexrelid)
FROM pg_index ix
JOIN pg_class i ON i.oid = ix.indexrelid
JOIN pg_class t ON t.oid = ix.indrelid
JOIN pg_namespace n ON n.oid = t.relnamespace
WHERE n.nspname = $1
  AND t.relname = $2
  AND NOT ix.indisprimary
  AND NOT EXISTS (SELECT 1 FROM pg_constraint c WHERE c.conindid = ix.indexrelid)
ORDER BY i.oid";

/// A droppable index: name and the statement that recreates it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SecondaryIndex {
    pub name: String,
    pub definition: String,
}

pub async fn secondary_indexes(
    client: &Client,
    schema: &str,
    table: &str,
) -> Result<Vec<SecondaryIndex>> {
    let rows = client
        .query(SECONDARY_INDEXES_SQL, &[&schema, &table])
        .await?;
    rows.iter()
        .map(|row| -> Result<SecondaryIndex> {
            Ok(SecondaryIndex {
                name: row.try_get(0)?,
                definition: row.try_get(1)?,
            })
        })
        .collect()
}

/// Disable triggers on `table` and drop its secondary indexes.
pub async fn suspend(client: &Client, schema: &str, table: &str) -> Result<SuspendedState> {
    let indexes = secondary_indexes(client, schema, table).await?;

    client
        .batch_execute(&format!(
            "ALTER TABLE {} DISABLE TRIGGER ALL",
            qualified(schema, table)
        ))
        .await?;

    let mut state = SuspendedState {
        table: table.to_string(),
        triggers_disabled: true,
        dropped_indexes: Vec::with_capacity(indexes.len()),
    };
    for index in indexes {
        let drop = format!(
            "DROP INDEX IF EXISTS {}.{}",
            quote_ident(schema),
            quote_ident(&index.name)
        );
        if let Err(e) = client.batch_execute(&drop).await {
            // Put back what was already switched off before reporting.
            if let Err(restore_err) = restore(client, schema, &state).await {
                warn!(table, error = %restore_err, "Could not undo partial suspension");
            }
            return Err(e.into());
        }
        debug!(table, index = %index.name, "Dropped index");
        state.dropped_indexes.push(index.definition);
    }
    Ok(state)
}

/// Re-enable triggers and recreate dropped indexes.
///
/// Every step is attempted; the first failure is returned.
pub async fn restore(client: &Client, schema: &str, state: &SuspendedState) -> Result<()> {
    let mut first_error: Option<PostgresDatastoreError> = None;

    if state.triggers_disabled {
        let sql = format!(
            "ALTER TABLE {} ENABLE TRIGGER ALL",
            qualified(schema, &state.table)
        );
        if let Err(e) = client.batch_execute(&sql).await {
            warn!(table = %state.table, error = %e, "Could not re-enable triggers");
            first_error.get_or_insert(e.into());
        }
    }

    for definition in &state.dropped_indexes {
        if let Err(e) = client.batch_execute(definition).await {
            warn!(table = %state.table, index = %definition, error = %e, "Could not recreate index");
            first_error.get_or_insert(e.into());
        }
    }

    match first_error {
        Some(e) => Err(e),
        None => Ok(()),
    }
}
