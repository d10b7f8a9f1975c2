//! Load plans: the resolved generation order for one run.

use crate::schema::{DependencyGraph, SchemaError, TableSpec};
use std::collections::{BTreeSet, HashMap, HashSet};

/// Tables in dependency order, computed once per run.
///
/// Every table appears after all the tables it references. Tables with no
/// mutual dependency keep their declaration order, so the same graph always
/// yields the same plan.
#[derive(Debug, Clone, PartialEq)]
pub struct LoadPlan {
    tables: Vec<TableSpec>,
}

impl LoadPlan {
    /// Tables in load order.
    pub fn tables(&self) -> &[TableSpec] {
        &self.tables
    }

    /// Table names in load order.
    pub fn table_names(&self) -> Vec<&str> {
        self.tables.iter().map(|t| t.name.as_str()).collect()
    }

    /// Number of tables in the plan.
    pub fn len(&self) -> usize {
        self.tables.len()
    }

    /// Whether the plan has no tables.
    pub fn is_empty(&self) -> bool {
        self.tables.is_empty()
    }

    /// Position of a table in load order.
    pub fn position(&self, table: &str) -> Option<usize> {
        self.tables.iter().position(|t| t.name == table)
    }

    /// Keep only the named tables, preserving load order.
    ///
    /// Parents dropped from the plan are not loaded; their key pools are
    /// still sampled from whatever the datastore already holds.
    pub fn restrict<S: AsRef<str>>(&self, tables: &[S]) -> Result<Self, SchemaError> {
        let wanted: HashSet<&str> = tables.iter().map(|t| t.as_ref()).collect();
        for name in &wanted {
            if self.position(name).is_none() {
                return Err(SchemaError::TableNotFound(name.to_string()));
            }
        }

        Ok(Self {
            tables: self
                .tables
                .iter()
                .filter(|t| wanted.contains(t.name.as_str()))
                .cloned()
                .collect(),
        })
    }
}

impl DependencyGraph {
    /// Resolve the load order with Kahn's algorithm.
    ///
    /// Fails with [`SchemaError::DanglingReference`] if a foreign key names an
    /// undeclared table and with [`SchemaError::Cycle`] if the foreign keys
    /// are not acyclic (a self-reference counts as a cycle).
    pub fn topological_order(&self) -> Result<LoadPlan, SchemaError> {
        self.check_references()?;

        let tables = self.tables();
        let index: HashMap<&str, usize> = tables
            .iter()
            .enumerate()
            .map(|(i, t)| (t.name.as_str(), i))
            .collect();

        let mut in_degree = vec![0usize; tables.len()];
        let mut children: Vec<Vec<usize>> = vec![Vec::new(); tables.len()];
        for (child, table) in tables.iter().enumerate() {
            for parent in table.parent_tables() {
                let parent = index[parent];
                children[parent].push(child);
                in_degree[child] += 1;
            }
        }

        // Smallest declaration index first keeps the order stable.
        let mut ready: BTreeSet<usize> = in_degree
            .iter()
            .enumerate()
            .filter(|(_, d)| **d == 0)
            .map(|(i, _)| i)
            .collect();
        let mut order = Vec::with_capacity(tables.len());

        while let Some(next) = ready.pop_first() {
            order.push(next);
            for &child in &children[next] {
                in_degree[child] -= 1;
                if in_degree[child] == 0 {
                    ready.insert(child);
                }
            }
        }

        if order.len() < tables.len() {
            let stuck: Vec<usize> = (0..tables.len()).filter(|i| in_degree[*i] > 0).collect();
            return Err(SchemaError::Cycle {
                cycle: find_cycle(self, &stuck, &index),
            });
        }

        Ok(LoadPlan {
            tables: order.into_iter().map(|i| tables[i].clone()).collect(),
        })
    }
}

/// Walk parent edges among the unresolved tables until a table repeats.
fn find_cycle(
    graph: &DependencyGraph,
    stuck: &[usize],
    index: &HashMap<&str, usize>,
) -> Vec<String> {
    let tables = graph.tables();
    let stuck_set: HashSet<usize> = stuck.iter().copied().collect();
    let Some(&start) = stuck.first() else {
        return Vec::new();
    };

    let mut path = vec![start];
    let mut current = start;
    loop {
        let next = tables[current]
            .parent_tables()
            .into_iter()
            .map(|p| index[p])
            .find(|p| stuck_set.contains(p));
        let Some(next) = next else {
            break;
        };
        if let Some(pos) = path.iter().position(|&p| p == next) {
            let mut cycle: Vec<String> = path[pos..]
                .iter()
                .map(|&i| tables[i].name.clone())
                .collect();
            cycle.push(tables[next].name.clone());
            return cycle;
        }
        path.push(next);
        current = next;
    }

    stuck.iter().map(|&i| tables[i].name.clone()).collect()
}

/// Target row counts for a run.
///
/// Resolution order: explicit per-table override, then the table's own
/// `target_count` from the schema, then the run-wide default.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TargetCounts {
    default: u64,
    overrides: HashMap<String, u64>,
}

impl TargetCounts {
    /// Same target for every table.
    pub fn uniform(default: u64) -> Self {
        Self {
            default,
            overrides: HashMap::new(),
        }
    }

    /// Override the target for one table.
    pub fn with_override(mut self, table: impl Into<String>, count: u64) -> Self {
        self.overrides.insert(table.into(), count);
        self
    }

    /// Run-wide default target.
    pub fn default_target(&self) -> u64 {
        self.default
    }

    /// Target for a table.
    pub fn target_for(&self, table: &TableSpec) -> u64 {
        self.overrides
            .get(&table.name)
            .copied()
            .or(table.target_count)
            .unwrap_or(self.default)
    }
}
