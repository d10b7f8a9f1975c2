//! Staging tables and binary COPY.
//!
//! The staging table is a session-local TEMP table whose columns use the
//! exact wire types of [`pg_type`], which binary COPY requires. It is created
//! inside the load transaction, so a rollback removes it as well.

use crate::error::Result;
use crate::insert::{column_list, pg_type, qualified, quote_ident, record_params, sql_type};
use futures::StreamExt;
use seed_core::TableSpec;
use seed_loader::RecordStream;
use tokio_postgres::binary_copy::BinaryCopyInWriter;
use tokio_postgres::types::{ToSql, Type};
use tokio_postgres::Client;
use tracing::debug;

/// Name of the staging table for `table`.
pub fn staging_name(table: &str) -> String {
    format!("_bulkseed_staging_{table}")
}

pub fn create_staging_sql(spec: &TableSpec) -> String {
    let columns: Vec<String> = spec
        .columns
        .iter()
        .map(|c| format!("{} {}", quote_ident(&c.name), sql_type(c.column_type)))
        .collect();
    format!(
        "CREATE TEMP TABLE {} ({}) ON COMMIT DROP",
        quote_ident(&staging_name(&spec.name)),
        columns.join(", ")
    )
}

pub fn copy_sql(staging: &str, spec: &TableSpec) -> String {
    format!(
        "COPY {} ({}) FROM STDIN (FORMAT binary)",
        quote_ident(staging),
        column_list(spec)
    )
}

pub fn move_sql(schema: &str, staging: &str, spec: &TableSpec) -> String {
    let columns = column_list(spec);
    format!(
        "INSERT INTO {} ({columns}) SELECT {columns} FROM {}",
        qualified(schema, &spec.name),
        quote_ident(staging)
    )
}

pub async fn create_staging(client: &Client, spec: &TableSpec) -> Result<String> {
    let name = staging_name(&spec.name);
    client.batch_execute(&create_staging_sql(spec)).await?;
    debug!(table = %spec.name, staging = %name, "Created staging table");
    Ok(name)
}

/// Stream every chunk into the staging table through one binary COPY.
pub async fn copy_records(
    client: &Client,
    staging: &str,
    spec: &TableSpec,
    mut rows: RecordStream<'_>,
) -> Result<u64> {
    let sink = client.copy_in(&copy_sql(staging, spec)).await?;
    let types: Vec<Type> = spec.columns.iter().map(|c| pg_type(c.column_type)).collect();
    let writer = BinaryCopyInWriter::new(sink, &types);
    futures::pin_mut!(writer);

    while let Some(chunk) = rows.next().await {
        for record in &chunk {
            let params = record_params(spec, record);
            let param_refs: Vec<&(dyn ToSql + Sync)> = params
                .iter()
                .map(|p| p.as_ref() as &(dyn ToSql + Sync))
                .collect();
            writer.as_mut().write(&param_refs).await?;
        }
    }

    let copied = writer.finish().await?;
    debug!(table = %spec.name, staging, rows = copied, "COPY finished");
    Ok(copied)
}

pub async fn move_from_staging(
    client: &Client,
    schema: &str,
    staging: &str,
    spec: &TableSpec,
) -> Result<u64> {
    Ok(client.execute(&move_sql(schema, staging, spec), &[]).await?)
}

pub async fn drop_staging(client: &Client, staging: &str) -> Result<()> {
    client
        .batch_execute(&format!("DROP TABLE IF EXISTS {}", quote_ident(staging)))
        .await?;
    Ok(())
}
