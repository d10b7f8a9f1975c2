//! Type-driven generation for tables loaded from a custom schema file.
//!
//! Values are picked from the declared column type alone. Foreign key
//! columns take the key selected by the loader and nullable columns are
//! NULL with [`DEFAULT_NULL_PROBABILITY`]. Primary keys draw from the widest
//! range their type allows so large tables do not collide.

use crate::generator::{ParentKeys, RecordGenerator};
use crate::generators::{fake, numeric, timestamp, uuid};
use chrono::{DateTime, NaiveDate, NaiveDateTime};
use rand::{Rng, RngCore};
use seed_core::{ColumnSpec, ColumnType, Record, TableSpec, Value};

/// Probability that a nullable, non-key column is NULL.
pub const DEFAULT_NULL_PROBABILITY: f64 = 0.1;

/// Days from 0001-01-01 to roughly year 260,000, within both chrono and PostgreSQL.
const MAX_KEY_DAYS: i32 = 95_000_000;

/// Unix seconds up to roughly year 220,000.
const MAX_KEY_SECONDS: i64 = 7_000_000_000_000;

/// Generic generator driven by a [`TableSpec`].
#[derive(Debug, Clone)]
pub struct ColumnTypeGenerator {
    spec: TableSpec,
    anchor: NaiveDateTime,
    null_probability: f64,
}

impl ColumnTypeGenerator {
    pub fn new(spec: TableSpec, anchor: NaiveDateTime) -> Self {
        Self {
            spec,
            anchor,
            null_probability: DEFAULT_NULL_PROBABILITY,
        }
    }

    /// Override the NULL probability for nullable columns (clamped to 0..=1).
    pub fn with_null_probability(mut self, probability: f64) -> Self {
        self.null_probability = probability.clamp(0.0, 1.0);
        self
    }

    fn is_foreign_key(&self, column: &str) -> bool {
        self.spec.foreign_keys.iter().any(|fk| fk.column == column)
    }

    fn primary_key_value(&self, column_type: ColumnType, rng: &mut dyn RngCore) -> Value {
        match column_type {
            ColumnType::Uuid => Value::Uuid(uuid::uuid_v4(rng)),
            ColumnType::Text => Value::Text(uuid::uuid_v4(rng).to_string()),
            ColumnType::Decimal => {
                Value::Decimal(numeric::money(rng, 1, 999_999_999_999_999_999))
            }
            ColumnType::Integer => Value::Integer(numeric::int_range(rng, 1, i64::MAX)),
            ColumnType::Boolean => Value::Boolean(rng.random_bool(0.5)),
            ColumnType::Timestamp => Value::Timestamp(
                DateTime::from_timestamp(rng.random_range(0..=MAX_KEY_SECONDS), 0)
                    .map(|ts| ts.naive_utc())
                    .unwrap_or(self.anchor),
            ),
            ColumnType::Date => Value::Date(
                NaiveDate::from_num_days_from_ce_opt(rng.random_range(1..=MAX_KEY_DAYS))
                    .unwrap_or(self.anchor.date()),
            ),
        }
    }

    fn value_for(&self, column: &ColumnSpec, rng: &mut dyn RngCore) -> Value {
        if column.name == self.spec.primary_key {
            return self.primary_key_value(column.column_type, rng);
        }
        if column.nullable && rng.random_bool(self.null_probability) {
            return Value::Null;
        }
        match column.column_type {
            ColumnType::Uuid => Value::Uuid(uuid::uuid_v4(rng)),
            ColumnType::Text => Value::Text(fake::sentence(rng, 3)),
            ColumnType::Decimal => Value::Decimal(numeric::money(rng, 0, 100_000)),
            ColumnType::Integer => Value::Integer(numeric::int_range(rng, 0, 1_000)),
            ColumnType::Boolean => Value::Boolean(rng.random_bool(0.5)),
            ColumnType::Timestamp => {
                Value::Timestamp(timestamp::within_days(rng, self.anchor, 365))
            }
            ColumnType::Date => Value::Date(timestamp::within_days(rng, self.anchor, 365).date()),
        }
    }
}

impl RecordGenerator for ColumnTypeGenerator {
    fn table(&self) -> &str {
        &self.spec.name
    }

    fn columns(&self) -> Vec<&str> {
        self.spec.column_names()
    }

    fn generate(&self, rng: &mut dyn RngCore, parent_keys: &ParentKeys) -> Record {
        self.spec
            .columns
            .iter()
            .map(|column| {
                if self.is_foreign_key(&column.name) {
                    parent_keys.value(&column.name)
                } else {
                    self.value_for(column, rng)
                }
            })
            .collect()
    }
}
