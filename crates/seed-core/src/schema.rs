//! Schema dependency graph.
//!
//! A [`DependencyGraph`] is the static description of the tables to load:
//! their columns, their primary key, their foreign keys into other tables and
//! an optional per-table target row count. It is loaded from YAML:
//!
//! ```yaml
//! version: 1
//! tables:
//!   - name: users
//!     primary_key: user_id
//!     columns:
//!       - name: user_id
//!         type: uuid
//!       - name: last_login
//!         type: timestamp
//!         nullable: true
//!   - name: orders
//!     primary_key: order_id
//!     columns:
//!       - name: order_id
//!         type: uuid
//!       - name: user_id
//!         type: uuid
//!     foreign_keys:
//!       - column: user_id
//!         references: users
//! ```
//!
//! Structural problems (duplicate names, foreign keys on unknown columns) are
//! rejected when the graph is built. References to undeclared tables and
//! cycles are reported by [`DependencyGraph::topological_order`].

use crate::types::ColumnType;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::fs;
use std::path::Path;

/// Built-in e-commerce schema (12 tables, foreign-key chains up to depth 3).
pub const ECOMMERCE_SCHEMA_YAML: &str = include_str!("../schemas/ecommerce.yaml");

/// Error type for schema operations.
#[derive(Debug, thiserror::Error)]
pub enum SchemaError {
    /// Error reading schema file
    #[error("Failed to read schema file: {0}")]
    IoError(#[from] std::io::Error),

    /// Error parsing YAML
    #[error("Failed to parse YAML: {0}")]
    YamlError(#[from] serde_yaml::Error),

    /// Foreign keys form a cycle
    #[error("Foreign keys form a cycle: {}", .cycle.join(" -> "))]
    Cycle { cycle: Vec<String> },

    /// Foreign key names a table that is not declared
    #[error("Table '{table}' column '{column}' references undeclared table '{referenced}'")]
    DanglingReference {
        table: String,
        column: String,
        referenced: String,
    },

    /// Table declared twice
    #[error("Table '{0}' is declared more than once")]
    DuplicateTable(String),

    /// Column declared twice in one table
    #[error("Column '{column}' is declared more than once in table '{table}'")]
    DuplicateColumn { table: String, column: String },

    /// Table not found in schema
    #[error("Table not found: {0}")]
    TableNotFound(String),

    /// Column not found in table schema
    #[error("Column '{column}' not found in table '{table}'")]
    ColumnNotFound { table: String, column: String },

    /// Table has no columns
    #[error("Table '{0}' has no columns")]
    EmptyTable(String),
}

/// Column definition.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ColumnSpec {
    /// Column name
    pub name: String,

    /// Column type
    #[serde(rename = "type")]
    pub column_type: ColumnType,

    /// Whether this column accepts NULL
    #[serde(default)]
    pub nullable: bool,
}

impl ColumnSpec {
    /// Create a new non-nullable column.
    pub fn new(name: impl Into<String>, column_type: ColumnType) -> Self {
        Self {
            name: name.into(),
            column_type,
            nullable: false,
        }
    }

    /// Create a new nullable column.
    pub fn nullable(name: impl Into<String>, column_type: ColumnType) -> Self {
        Self {
            name: name.into(),
            column_type,
            nullable: true,
        }
    }
}

/// A foreign key from one column into another table's primary key.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ForeignKeyRef {
    /// Referencing column in this table
    pub column: String,

    /// Table whose primary key is referenced
    #[serde(rename = "references")]
    pub referenced_table: String,

    /// Whether the column may be NULL when the parent has no rows
    #[serde(default)]
    pub nullable: bool,
}

impl ForeignKeyRef {
    /// Create a required foreign key.
    pub fn new(column: impl Into<String>, referenced_table: impl Into<String>) -> Self {
        Self {
            column: column.into(),
            referenced_table: referenced_table.into(),
            nullable: false,
        }
    }

    /// Create a foreign key that may be NULL.
    pub fn optional(column: impl Into<String>, referenced_table: impl Into<String>) -> Self {
        Self {
            column: column.into(),
            referenced_table: referenced_table.into(),
            nullable: true,
        }
    }
}

/// Table definition.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TableSpec {
    /// Table name
    pub name: String,

    /// Primary key column name
    pub primary_key: String,

    /// Columns in insert order
    pub columns: Vec<ColumnSpec>,

    /// Foreign keys into other tables
    #[serde(default)]
    pub foreign_keys: Vec<ForeignKeyRef>,

    /// Target row count for this table (overrides the run-wide target)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_count: Option<u64>,
}

impl TableSpec {
    /// Create a table with the given primary key and columns.
    pub fn new(
        name: impl Into<String>,
        primary_key: impl Into<String>,
        columns: Vec<ColumnSpec>,
    ) -> Self {
        Self {
            name: name.into(),
            primary_key: primary_key.into(),
            columns,
            foreign_keys: Vec::new(),
            target_count: None,
        }
    }

    /// Add a foreign key.
    pub fn with_foreign_key(mut self, fk: ForeignKeyRef) -> Self {
        self.foreign_keys.push(fk);
        self
    }

    /// Set the table's own target count.
    pub fn with_target_count(mut self, count: u64) -> Self {
        self.target_count = Some(count);
        self
    }

    /// Get a column by name.
    pub fn get_column(&self, name: &str) -> Option<&ColumnSpec> {
        self.columns.iter().find(|c| c.name == name)
    }

    /// Position of a column in insert order.
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c.name == name)
    }

    /// All column names in insert order.
    pub fn column_names(&self) -> Vec<&str> {
        self.columns.iter().map(|c| c.name.as_str()).collect()
    }

    /// Primary key column definition.
    pub fn primary_key_column(&self) -> Option<&ColumnSpec> {
        self.get_column(&self.primary_key)
    }

    /// Distinct tables this table depends on, in foreign key order.
    pub fn parent_tables(&self) -> Vec<&str> {
        let mut seen = HashSet::new();
        self.foreign_keys
            .iter()
            .map(|fk| fk.referenced_table.as_str())
            .filter(|t| seen.insert(*t))
            .collect()
    }

    fn validate(&self) -> Result<(), SchemaError> {
        if self.columns.is_empty() {
            return Err(SchemaError::EmptyTable(self.name.clone()));
        }

        let mut seen = HashSet::new();
        for column in &self.columns {
            if !seen.insert(column.name.as_str()) {
                return Err(SchemaError::DuplicateColumn {
                    table: self.name.clone(),
                    column: column.name.clone(),
                });
            }
        }

        if self.get_column(&self.primary_key).is_none() {
            return Err(SchemaError::ColumnNotFound {
                table: self.name.clone(),
                column: self.primary_key.clone(),
            });
        }

        for fk in &self.foreign_keys {
            if self.get_column(&fk.column).is_none() {
                return Err(SchemaError::ColumnNotFound {
                    table: self.name.clone(),
                    column: fk.column.clone(),
                });
            }
        }

        Ok(())
    }
}

fn default_version() -> u32 {
    1
}

#[derive(Deserialize)]
struct RawGraph {
    #[serde(default = "default_version")]
    version: u32,
    tables: Vec<TableSpec>,
}

/// Tables and their foreign-key dependencies, in declaration order.
#[derive(Debug, Clone)]
pub struct DependencyGraph {
    version: u32,
    tables: Vec<TableSpec>,
    table_map: HashMap<String, usize>,
}

impl DependencyGraph {
    /// Build a graph from table definitions.
    pub fn new(tables: Vec<TableSpec>) -> Result<Self, SchemaError> {
        Self::with_version(default_version(), tables)
    }

    fn with_version(version: u32, tables: Vec<TableSpec>) -> Result<Self, SchemaError> {
        let mut table_map = HashMap::with_capacity(tables.len());
        for (idx, table) in tables.iter().enumerate() {
            table.validate()?;
            if table_map.insert(table.name.clone(), idx).is_some() {
                return Err(SchemaError::DuplicateTable(table.name.clone()));
            }
        }

        Ok(Self {
            version,
            tables,
            table_map,
        })
    }

    /// Load a graph from a YAML file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, SchemaError> {
        let content = fs::read_to_string(path)?;
        Self::from_yaml(&content)
    }

    /// Parse a graph from a YAML string.
    pub fn from_yaml(yaml: &str) -> Result<Self, SchemaError> {
        let raw: RawGraph = serde_yaml::from_str(yaml)?;
        Self::with_version(raw.version, raw.tables)
    }

    /// The built-in e-commerce graph.
    pub fn ecommerce() -> Result<Self, SchemaError> {
        Self::from_yaml(ECOMMERCE_SCHEMA_YAML)
    }

    /// Schema file version.
    pub fn version(&self) -> u32 {
        self.version
    }

    /// Get a table by name.
    pub fn get_table(&self, name: &str) -> Option<&TableSpec> {
        self.table_map
            .get(name)
            .and_then(|&idx| self.tables.get(idx))
    }

    /// Tables in declaration order.
    pub fn tables(&self) -> &[TableSpec] {
        &self.tables
    }

    /// Table names in declaration order.
    pub fn table_names(&self) -> Vec<&str> {
        self.tables.iter().map(|t| t.name.as_str()).collect()
    }

    /// Tables with a foreign key into `table`.
    pub fn dependents_of(&self, table: &str) -> Vec<&TableSpec> {
        self.tables
            .iter()
            .filter(|t| t.foreign_keys.iter().any(|fk| fk.referenced_table == table))
            .collect()
    }

    /// Check that every foreign key names a declared table.
    pub fn check_references(&self) -> Result<(), SchemaError> {
        for table in &self.tables {
            for fk in &table.foreign_keys {
                if !self.table_map.contains_key(&fk.referenced_table) {
                    return Err(SchemaError::DanglingReference {
                        table: table.name.clone(),
                        column: fk.column.clone(),
                        referenced: fk.referenced_table.clone(),
                    });
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const YAML: &str = r#"
version: 1
tables:
  - name: users
    primary_key: user_id
    target_count: 25
    columns:
      - name: user_id
        type: uuid
      - name: last_login
        type: timestamp
        nullable: true
  - name: orders
    primary_key: order_id
    columns:
      - { name: order_id, type: uuid }
      - { name: user_id, type: uuid }
      - { name: coupon_owner, type: uuid, nullable: true }
    foreign_keys:
      - { column: user_id, references: users }
      - { column: coupon_owner, references: users, nullable: true }
"#;

    #[test]
    fn test_from_yaml() {
        let graph = DependencyGraph::from_yaml(YAML).unwrap();

        assert_eq!(graph.version(), 1);
        assert_eq!(graph.table_names(), vec!["users", "orders"]);

        let users = graph.get_table("users").unwrap();
        assert_eq!(users.target_count, Some(25));
        assert!(users.get_column("last_login").unwrap().nullable);
        assert_eq!(
            users.primary_key_column().unwrap().column_type,
            ColumnType::Uuid
        );

        let orders = graph.get_table("orders").unwrap();
        assert_eq!(orders.foreign_keys.len(), 2);
        assert!(!orders.foreign_keys[0].nullable);
        assert!(orders.foreign_keys[1].nullable);
        // Two foreign keys into the same table count as one dependency.
        assert_eq!(orders.parent_tables(), vec!["users"]);
        assert_eq!(orders.column_index("user_id"), Some(1));
    }

    #[test]
    fn test_dependents_of() {
        let graph = DependencyGraph::from_yaml(YAML).unwrap();
        let dependents: Vec<&str> = graph
            .dependents_of("users")
            .iter()
            .map(|t| t.name.as_str())
            .collect();
        assert_eq!(dependents, vec!["orders"]);
        assert!(graph.dependents_of("orders").is_empty());
    }

    #[test]
    fn test_duplicate_table_rejected() {
        let table = TableSpec::new("t", "id", vec![ColumnSpec::new("id", ColumnType::Uuid)]);
        let result = DependencyGraph::new(vec![table.clone(), table]);
        assert!(matches!(result, Err(SchemaError::DuplicateTable(name)) if name == "t"));
    }

    #[test]
    fn test_duplicate_column_rejected() {
        let table = TableSpec::new(
            "t",
            "id",
            vec![
                ColumnSpec::new("id", ColumnType::Uuid),
                ColumnSpec::new("id", ColumnType::Text),
            ],
        );
        assert!(matches!(
            DependencyGraph::new(vec![table]),
            Err(SchemaError::DuplicateColumn { .. })
        ));
    }

    #[test]
    fn test_missing_primary_key_column() {
        let table = TableSpec::new("t", "pk", vec![ColumnSpec::new("id", ColumnType::Uuid)]);
        assert!(matches!(
            DependencyGraph::new(vec![table]),
            Err(SchemaError::ColumnNotFound { column, .. }) if column == "pk"
        ));
    }

    #[test]
    fn test_foreign_key_on_unknown_column() {
        let table = TableSpec::new("t", "id", vec![ColumnSpec::new("id", ColumnType::Uuid)])
            .with_foreign_key(ForeignKeyRef::new("parent_id", "p"));
        assert!(matches!(
            DependencyGraph::new(vec![table]),
            Err(SchemaError::ColumnNotFound { column, .. }) if column == "parent_id"
        ));
    }

    #[test]
    fn test_dangling_reference_check() {
        let table = TableSpec::new(
            "orders",
            "id",
            vec![
                ColumnSpec::new("id", ColumnType::Uuid),
                ColumnSpec::new("user_id", ColumnType::Uuid),
            ],
        )
        .with_foreign_key(ForeignKeyRef::new("user_id", "users"));
        let graph = DependencyGraph::new(vec![table]).unwrap();

        let err = graph.check_references().unwrap_err();
        assert_eq!(
            err.to_string(),
            "Table 'orders' column 'user_id' references undeclared table 'users'"
        );
    }

    #[test]
    fn test_ecommerce_schema_loads() {
        let graph = DependencyGraph::ecommerce().unwrap();
        assert_eq!(graph.tables().len(), 12);
        assert!(graph.check_references().is_ok());
        assert_eq!(
            graph.get_table("order_items").unwrap().parent_tables(),
            vec!["orders", "products"]
        );
    }
}
