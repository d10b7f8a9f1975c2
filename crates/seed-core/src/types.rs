//! Column types understood by the loader.
//!
//! `ColumnType` is the semantic type of a column, independent of how a given
//! datastore spells it. The PostgreSQL datastore maps each variant to a native
//! type when it builds staging tables and placeholders.
//!
//! # YAML Format
//!
//! ```yaml
//! type: uuid
//! type: decimal
//! type: timestamp
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;

/// Semantic column type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ColumnType {
    /// 128-bit UUID
    Uuid,

    /// Unbounded text
    Text,

    /// Exact decimal (money, weights)
    Decimal,

    /// 64-bit signed integer
    Integer,

    /// Boolean
    Boolean,

    /// Timestamp without timezone
    Timestamp,

    /// Calendar date
    Date,
}

impl ColumnType {
    /// Lowercase name used in YAML and diagnostics.
    pub fn as_str(&self) -> &'static str {
        match self {
            ColumnType::Uuid => "uuid",
            ColumnType::Text => "text",
            ColumnType::Decimal => "decimal",
            ColumnType::Integer => "integer",
            ColumnType::Boolean => "boolean",
            ColumnType::Timestamp => "timestamp",
            ColumnType::Date => "date",
        }
    }
}

impl fmt::Display for ColumnType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
