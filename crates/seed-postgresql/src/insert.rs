//! Batched INSERT logic for PostgreSQL.

use crate::error::Result;
use chrono::{NaiveDate, NaiveDateTime};
use rust_decimal::Decimal;
use seed_core::{ColumnType, Record, TableSpec, Value};
use tokio_postgres::types::{ToSql, Type};
use tokio_postgres::Client;
use tracing::debug;
use uuid::Uuid;

/// Upper bound on bind parameters in one statement (protocol limit).
pub const MAX_BIND_PARAMS: usize = 65_535;

/// Quote an identifier, doubling embedded quotes.
pub fn quote_ident(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

/// `"schema"."table"`.
pub fn qualified(schema: &str, table: &str) -> String {
    format!("{}.{}", quote_ident(schema), quote_ident(table))
}

/// Native type used for casts and staging columns.
pub fn sql_type(column_type: ColumnType) -> &'static str {
    match column_type {
        ColumnType::Uuid => "uuid",
        ColumnType::Text => "text",
        ColumnType::Decimal => "numeric",
        ColumnType::Integer => "int8",
        ColumnType::Boolean => "bool",
        ColumnType::Timestamp => "timestamp",
        ColumnType::Date => "date",
    }
}

/// Wire type matching [`sql_type`].
pub fn pg_type(column_type: ColumnType) -> Type {
    match column_type {
        ColumnType::Uuid => Type::UUID,
        ColumnType::Text => Type::TEXT,
        ColumnType::Decimal => Type::NUMERIC,
        ColumnType::Integer => Type::INT8,
        ColumnType::Boolean => Type::BOOL,
        ColumnType::Timestamp => Type::TIMESTAMP,
        ColumnType::Date => Type::DATE,
    }
}

/// Quoted, comma-separated column list in declaration order.
pub fn column_list(spec: &TableSpec) -> String {
    spec.columns
        .iter()
        .map(|c| quote_ident(&c.name))
        .collect::<Vec<_>>()
        .join(", ")
}

/// Rows that fit in one statement without exceeding [`MAX_BIND_PARAMS`].
pub fn rows_per_statement(column_count: usize) -> usize {
    (MAX_BIND_PARAMS / column_count.max(1)).max(1)
}

/// Multi-row INSERT with typed placeholders (`$1::uuid, $2::text, ...`).
pub fn insert_sql(schema: &str, spec: &TableSpec, row_count: usize) -> String {
    let mut param_idx = 1;
    let placeholders: Vec<String> = (0..row_count)
        .map(|_| {
            let row: Vec<String> = spec
                .columns
                .iter()
                .map(|c| {
                    let p = format!("${param_idx}::{}", sql_type(c.column_type));
                    param_idx += 1;
                    p
                })
                .collect();
            format!("({})", row.join(", "))
        })
        .collect();

    format!(
        "INSERT INTO {} ({}) VALUES {}",
        qualified(schema, &spec.name),
        column_list(spec),
        placeholders.join(", ")
    )
}

/// Convert a value to a boxed parameter; NULL takes the column's type.
pub fn value_to_boxed(value: &Value, column_type: ColumnType) -> Box<dyn ToSql + Sync + Send> {
    match value {
        Value::Null => match column_type {
            ColumnType::Uuid => Box::new(None::<Uuid>),
            ColumnType::Text => Box::new(None::<String>),
            ColumnType::Decimal => Box::new(None::<Decimal>),
            ColumnType::Integer => Box::new(None::<i64>),
            ColumnType::Boolean => Box::new(None::<bool>),
            ColumnType::Timestamp => Box::new(None::<NaiveDateTime>),
            ColumnType::Date => Box::new(None::<NaiveDate>),
        },
        Value::Uuid(u) => Box::new(*u),
        Value::Text(s) => Box::new(s.clone()),
        Value::Decimal(d) => Box::new(*d),
        Value::Integer(i) => Box::new(*i),
        Value::Boolean(b) => Box::new(*b),
        Value::Timestamp(ts) => Box::new(*ts),
        Value::Date(d) => Box::new(*d),
    }
}

/// Parameters for one record, in column order.
pub fn record_params(spec: &TableSpec, record: &Record) -> Vec<Box<dyn ToSql + Sync + Send>> {
    spec.columns
        .iter()
        .zip(record.values())
        .map(|(column, value)| value_to_boxed(value, column.column_type))
        .collect()
}

/// Insert a batch of rows.
///
/// Splits into several statements when the batch would exceed the bind
/// parameter limit; the caller's transaction keeps the batch atomic.
pub async fn insert_batch(
    client: &Client,
    schema: &str,
    spec: &TableSpec,
    rows: &[Record],
) -> Result<u64> {
    if rows.is_empty() {
        return Ok(0);
    }

    let per_statement = rows_per_statement(spec.columns.len());
    let mut inserted = 0;
    for chunk in rows.chunks(per_statement) {
        let sql = insert_sql(schema, spec, chunk.len());
        let params: Vec<Box<dyn ToSql + Sync + Send>> = chunk
            .iter()
            .flat_map(|record| record_params(spec, record))
            .collect();
        let param_refs: Vec<&(dyn ToSql + Sync)> = params
            .iter()
            .map(|p| p.as_ref() as &(dyn ToSql + Sync))
            .collect();

        inserted += client.execute(&sql, &param_refs).await?;
        debug!(table = %spec.name, rows = chunk.len(), "INSERT statement executed");
    }
    Ok(inserted)
}

#[cfg(test)]
mod tests {
    use super::*;
    use seed_core::ColumnSpec;

    fn users() -> TableSpec {
        TableSpec::new(
            "users",
            "user_id",
            vec![
                ColumnSpec::new("user_id", ColumnType::Uuid),
                ColumnSpec::new("email", ColumnType::Text),
                ColumnSpec::nullable("last_login", ColumnType::Timestamp),
            ],
        )
    }

    #[test]
    fn test_insert_sql_placeholders() {
        let sql = insert_sql("public", &users(), 2);
        assert_eq!(
            sql,
            "INSERT INTO \"public\".\"users\" (\"user_id\", \"email\", \"last_login\") VALUES \
             ($1::uuid, $2::text, $3::timestamp), ($4::uuid, $5::text, $6::timestamp)"
        );
    }

    #[test]
    fn test_rows_per_statement_respects_limit() {
        assert_eq!(rows_per_statement(3), 21_845);
        assert_eq!(rows_per_statement(12), 5_461);
        assert!(rows_per_statement(12) * 12 <= MAX_BIND_PARAMS);
        assert_eq!(rows_per_statement(100_000), 1);
    }

    #[test]
    fn test_quote_ident_escapes() {
        assert_eq!(quote_ident("order"), "\"order\"");
        assert_eq!(quote_ident("we\"ird"), "\"we\"\"ird\"");
        assert_eq!(qualified("sales", "orders"), "\"sales\".\"orders\"");
    }

    #[test]
    fn test_null_params_take_column_type() {
        let record = Record::new(vec![
            Value::Uuid(Uuid::nil()),
            Value::Text("a@example.com".into()),
            Value::Null,
        ]);
        let params = record_params(&users(), &record);
        assert_eq!(params.len(), 3);
        assert_eq!(format!("{:?}", params[1]), "\"a@example.com\"");
        assert_eq!(format!("{:?}", params[2]), "None");
        assert_eq!(pg_type(ColumnType::Timestamp), Type::TIMESTAMP);
    }
}
