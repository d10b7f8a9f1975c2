//! The record generator capability and its registry.

use crate::generic::ColumnTypeGenerator;
use chrono::NaiveDateTime;
use rand::RngCore;
use seed_core::{LoadPlan, Record, TableSpec, Value};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// Error type for generator operations.
#[derive(Debug, thiserror::Error)]
pub enum GeneratorError {
    /// No generator registered for a table
    #[error("No generator registered for table '{0}'")]
    TableNotFound(String),

    /// Generator columns do not match the table definition
    #[error("Generator for '{table}' produces columns {generator:?} but the table declares {table_columns:?}")]
    ColumnMismatch {
        table: String,
        generator: Vec<String>,
        table_columns: Vec<String>,
    },

    /// Categorical weights are unusable
    #[error("Invalid weights: {0}")]
    InvalidWeights(String),
}

/// The parent key chosen for one foreign key of one row.
#[derive(Debug, Clone, PartialEq)]
pub struct ParentKey {
    /// Referencing column
    pub column: String,
    /// Referenced table
    pub table: String,
    /// Selected key, or NULL for a nullable foreign key with no parent rows
    pub value: Value,
}

/// Parent keys selected for a single row, one per foreign key.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParentKeys {
    keys: Vec<ParentKey>,
}

impl ParentKeys {
    /// No parents (root tables).
    pub fn new() -> Self {
        Self::default()
    }

    /// Record the key chosen for a foreign key column.
    pub fn insert(&mut self, column: impl Into<String>, table: impl Into<String>, value: Value) {
        self.keys.push(ParentKey {
            column: column.into(),
            table: table.into(),
            value,
        });
    }

    /// Builder form of [`ParentKeys::insert`].
    pub fn with(mut self, column: &str, table: &str, value: impl Into<Value>) -> Self {
        self.insert(column, table, value.into());
        self
    }

    /// Key chosen for a foreign key column.
    pub fn by_column(&self, column: &str) -> Option<&Value> {
        self.keys
            .iter()
            .find(|k| k.column == column)
            .map(|k| &k.value)
    }

    /// Key chosen for the first foreign key into `table`.
    pub fn by_table(&self, table: &str) -> Option<&Value> {
        self.keys.iter().find(|k| k.table == table).map(|k| &k.value)
    }

    /// Value for a foreign key column, NULL if none was selected.
    pub fn value(&self, column: &str) -> Value {
        self.by_column(column).cloned().unwrap_or(Value::Null)
    }

    /// Reset for reuse on the next row.
    pub fn clear(&mut self) {
        self.keys.clear();
    }

    /// All selected keys.
    pub fn iter(&self) -> impl Iterator<Item = &ParentKey> {
        self.keys.iter()
    }
}

/// Produces synthetic rows for one table.
///
/// Implementations must be pure: all randomness comes from the `rng`
/// argument and `generate` takes `&self`, so one generator can be shared
/// by several workers at once.
pub trait RecordGenerator: Send + Sync {
    /// Table this generator fills.
    fn table(&self) -> &str;

    /// Column names in the order `generate` emits them.
    fn columns(&self) -> Vec<&str>;

    /// Generate one row.
    fn generate(&self, rng: &mut dyn RngCore, parent_keys: &ParentKeys) -> Record;
}

impl fmt::Debug for dyn RecordGenerator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RecordGenerator")
            .field("table", &self.table())
            .finish()
    }
}

/// Check that a generator emits exactly the table's columns, in order.
pub fn check_columns(
    generator: &dyn RecordGenerator,
    spec: &TableSpec,
) -> Result<(), GeneratorError> {
    let produced = generator.columns();
    let declared = spec.column_names();
    if produced != declared {
        return Err(GeneratorError::ColumnMismatch {
            table: spec.name.clone(),
            generator: produced.iter().map(|s| s.to_string()).collect(),
            table_columns: declared.iter().map(|s| s.to_string()).collect(),
        });
    }
    Ok(())
}

/// Generators keyed by table name.
///
/// Tables without a registered generator can fall back to
/// [`ColumnTypeGenerator`], which fills columns from their declared types.
#[derive(Clone, Default)]
pub struct GeneratorRegistry {
    generators: HashMap<String, Arc<dyn RecordGenerator>>,
    /// Anchor time for type-driven fallback generators, `None` disables fallback
    fallback: Option<NaiveDateTime>,
}

impl GeneratorRegistry {
    /// Empty registry without fallback.
    pub fn new() -> Self {
        Self::default()
    }

    /// Use type-driven generation, anchored at `anchor`, for tables with no
    /// registered generator.
    pub fn with_fallback(mut self, anchor: NaiveDateTime) -> Self {
        self.fallback = Some(anchor);
        self
    }

    /// Register a generator under its table name, replacing any previous one.
    pub fn register(&mut self, generator: Arc<dyn RecordGenerator>) {
        self.generators
            .insert(generator.table().to_string(), generator);
    }

    /// Builder form of [`GeneratorRegistry::register`].
    pub fn with(mut self, generator: impl RecordGenerator + 'static) -> Self {
        self.register(Arc::new(generator));
        self
    }

    /// Registered generator for a table.
    pub fn get(&self, table: &str) -> Option<Arc<dyn RecordGenerator>> {
        self.generators.get(table).cloned()
    }

    /// Registered table names, sorted.
    pub fn table_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.generators.keys().map(|s| s.as_str()).collect();
        names.sort_unstable();
        names
    }

    /// Generator for a table, checked against its definition.
    pub fn resolve(&self, spec: &TableSpec) -> Result<Arc<dyn RecordGenerator>, GeneratorError> {
        let generator = match self.get(&spec.name) {
            Some(generator) => generator,
            None => match self.fallback {
                Some(anchor) => Arc::new(ColumnTypeGenerator::new(spec.clone(), anchor)),
                None => return Err(GeneratorError::TableNotFound(spec.name.clone())),
            },
        };
        check_columns(generator.as_ref(), spec)?;
        Ok(generator)
    }

    /// Resolve generators for every table in a plan.
    pub fn resolve_plan(
        &self,
        plan: &LoadPlan,
    ) -> Result<HashMap<String, Arc<dyn RecordGenerator>>, GeneratorError> {
        plan.tables()
            .iter()
            .map(|spec| Ok((spec.name.clone(), self.resolve(spec)?)))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use seed_core::{ColumnSpec, ColumnType};

    struct Fixed;

    impl RecordGenerator for Fixed {
        fn table(&self) -> &str {
            "fixed"
        }

        fn columns(&self) -> Vec<&str> {
            vec!["id", "label"]
        }

        fn generate(&self, _rng: &mut dyn RngCore, _parent_keys: &ParentKeys) -> Record {
            Record::new(vec![Value::Integer(1), Value::from("x")])
        }
    }

    fn fixed_spec(columns: &[&str]) -> TableSpec {
        TableSpec::new(
            "fixed",
            columns[0],
            columns
                .iter()
                .map(|c| ColumnSpec::new(*c, ColumnType::Text))
                .collect(),
        )
    }

    #[test]
    fn test_parent_keys_lookup() {
        let keys = ParentKeys::new()
            .with("user_id", "users", Value::Integer(7))
            .with("product_id", "products", Value::Null);

        assert_eq!(keys.by_column("user_id"), Some(&Value::Integer(7)));
        assert_eq!(keys.by_table("products"), Some(&Value::Null));
        assert_eq!(keys.value("missing"), Value::Null);
        assert_eq!(keys.iter().count(), 2);
    }

    #[test]
    fn test_resolve_registered() {
        let registry = GeneratorRegistry::new().with(Fixed);
        let generator = registry.resolve(&fixed_spec(&["id", "label"])).unwrap();
        let mut rng = StdRng::seed_from_u64(1);
        assert_eq!(generator.generate(&mut rng, &ParentKeys::new()).len(), 2);
    }

    #[test]
    fn test_column_mismatch() {
        let registry = GeneratorRegistry::new().with(Fixed);
        let err = registry
            .resolve(&fixed_spec(&["id", "label", "extra"]))
            .unwrap_err();
        assert!(matches!(err, GeneratorError::ColumnMismatch { .. }));
    }

    #[test]
    fn test_missing_without_fallback() {
        let registry = GeneratorRegistry::new();
        let spec = fixed_spec(&["id"]);
        assert!(matches!(
            registry.resolve(&spec),
            Err(GeneratorError::TableNotFound(_))
        ));

        let anchor = chrono::DateTime::UNIX_EPOCH.naive_utc();
        let registry = registry.with_fallback(anchor);
        assert!(registry.resolve(&spec).is_ok());
    }
}
