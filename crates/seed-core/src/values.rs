//! Generated values and records.
//!
//! A [`Record`] is the ordered tuple a generator produces for one row. It
//! only lives between generation and the insert call; nothing keeps records
//! around once a batch is written.

use crate::types::ColumnType;
use chrono::{NaiveDate, NaiveDateTime};
use rust_decimal::Decimal;
use std::fmt;
use uuid::Uuid;

/// A single column value.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Value {
    /// SQL NULL
    Null,

    /// UUID value
    Uuid(Uuid),

    /// Text value
    Text(String),

    /// Exact decimal
    Decimal(Decimal),

    /// 64-bit signed integer
    Integer(i64),

    /// Boolean value
    Boolean(bool),

    /// Timestamp without timezone
    Timestamp(NaiveDateTime),

    /// Calendar date
    Date(NaiveDate),
}

impl Value {
    /// Check if this value is null.
    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// The column type this value belongs to, or `None` for NULL.
    pub fn column_type(&self) -> Option<ColumnType> {
        match self {
            Value::Null => None,
            Value::Uuid(_) => Some(ColumnType::Uuid),
            Value::Text(_) => Some(ColumnType::Text),
            Value::Decimal(_) => Some(ColumnType::Decimal),
            Value::Integer(_) => Some(ColumnType::Integer),
            Value::Boolean(_) => Some(ColumnType::Boolean),
            Value::Timestamp(_) => Some(ColumnType::Timestamp),
            Value::Date(_) => Some(ColumnType::Date),
        }
    }

    /// Try to get this value as a UUID.
    pub fn as_uuid(&self) -> Option<Uuid> {
        match self {
            Self::Uuid(u) => Some(*u),
            _ => None,
        }
    }

    /// Try to get this value as a decimal.
    pub fn as_decimal(&self) -> Option<Decimal> {
        match self {
            Self::Decimal(d) => Some(*d),
            _ => None,
        }
    }

    /// Try to get this value as an integer.
    pub fn as_integer(&self) -> Option<i64> {
        match self {
            Self::Integer(i) => Some(*i),
            _ => None,
        }
    }

    /// Try to get this value as a string slice.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(s) => Some(s),
            _ => None,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => f.write_str("NULL"),
            Value::Uuid(u) => write!(f, "{u}"),
            Value::Text(s) => f.write_str(s),
            Value::Decimal(d) => write!(f, "{d}"),
            Value::Integer(i) => write!(f, "{i}"),
            Value::Boolean(b) => write!(f, "{b}"),
            Value::Timestamp(ts) => write!(f, "{}", ts.format("%Y-%m-%dT%H:%M:%S%.f")),
            Value::Date(d) => write!(f, "{d}"),
        }
    }
}

impl From<Uuid> for Value {
    fn from(value: Uuid) -> Self {
        Value::Uuid(value)
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Value::Text(value)
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::Text(value.to_string())
    }
}

impl From<Decimal> for Value {
    fn from(value: Decimal) -> Self {
        Value::Decimal(value)
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Value::Integer(value)
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Value::Boolean(value)
    }
}

impl From<NaiveDateTime> for Value {
    fn from(value: NaiveDateTime) -> Self {
        Value::Timestamp(value)
    }
}

impl From<NaiveDate> for Value {
    fn from(value: NaiveDate) -> Self {
        Value::Date(value)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(value: Option<T>) -> Self {
        value.map(Into::into).unwrap_or(Value::Null)
    }
}

/// One generated row, ordered exactly like its table's columns.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Record {
    values: Vec<Value>,
}

impl Record {
    /// Create a record from ordered values.
    pub fn new(values: Vec<Value>) -> Self {
        Self { values }
    }

    /// Create an empty record with room for `capacity` columns.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            values: Vec::with_capacity(capacity),
        }
    }

    /// Append the next column value.
    pub fn push(&mut self, value: impl Into<Value>) {
        self.values.push(value.into());
    }

    /// Number of values in the record.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Whether the record holds no values.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Value at a column position.
    pub fn get(&self, index: usize) -> Option<&Value> {
        self.values.get(index)
    }

    /// All values in column order.
    pub fn values(&self) -> &[Value] {
        &self.values
    }

    /// Consume the record, returning its values.
    pub fn into_values(self) -> Vec<Value> {
        self.values
    }
}

impl FromIterator<Value> for Record {
    fn from_iter<I: IntoIterator<Item = Value>>(iter: I) -> Self {
        Self {
            values: iter.into_iter().collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn test_value_column_type() {
        assert_eq!(Value::Integer(3).column_type(), Some(ColumnType::Integer));
        assert_eq!(Value::Null.column_type(), None);
        assert!(Value::Null.is_null());
    }

    #[test]
    fn test_option_into_value() {
        let missing: Option<i64> = None;
        assert_eq!(Value::from(missing), Value::Null);
        assert_eq!(Value::from(Some(5i64)), Value::Integer(5));
    }

    #[test]
    fn test_record_push_preserves_order() {
        let mut record = Record::with_capacity(3);
        record.push("first");
        record.push(Decimal::from_str("1.50").unwrap());
        record.push(true);

        assert_eq!(record.len(), 3);
        assert_eq!(record.get(0), Some(&Value::Text("first".to_string())));
        assert_eq!(record.get(2), Some(&Value::Boolean(true)));
        assert!(record.get(3).is_none());
    }

    #[test]
    fn test_value_display() {
        let ts = NaiveDate::from_ymd_opt(2024, 5, 1)
            .unwrap()
            .and_hms_opt(12, 30, 0)
            .unwrap();
        assert_eq!(Value::Timestamp(ts).to_string(), "2024-05-01T12:30:00");
        assert_eq!(Value::Null.to_string(), "NULL");
    }
}
