//! In-memory datastore.
//!
//! Behaves like a single-session relational store: statements between
//! `begin` and `commit` are undone by `rollback`. Primary keys and NOT NULL
//! columns are always enforced; foreign keys only while triggers are
//! enabled. Suspension really removes secondary indexes and triggers until
//! restored. Failures
//! can be injected at chosen points. Used by `--dry-run` and by the tests.

use crate::datastore::{Datastore, RecordStream, SuspendedState};
use crate::error::DatastoreError;
use async_trait::async_trait;
use futures::StreamExt;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use seed_core::{DependencyGraph, Record, TableSpec, Value};
use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::{Mutex, MutexGuard};
use std::time::Duration;
use tracing::debug;

/// Where an injected failure fires.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum FailPoint {
    /// The n-th `insert_rows` call on a table (1-based)
    Insert { table: String, call: u64 },
    /// `copy_into_staging` for a table
    Copy { table: String },
    /// `move_from_staging` for a table
    Move { table: String },
    /// `restore` for a table
    Restore { table: String },
}

#[derive(Debug)]
struct MemoryTable {
    spec: TableSpec,
    rows: Vec<Record>,
    indexes: Vec<String>,
    triggers_enabled: bool,
    insert_calls: u64,
}

#[derive(Debug)]
struct Staging {
    table: String,
    rows: Vec<Record>,
}

#[derive(Debug, Default)]
struct Transaction {
    row_counts: HashMap<String, usize>,
    created_staging: Vec<String>,
}

#[derive(Debug)]
struct State {
    tables: BTreeMap<String, MemoryTable>,
    staging: HashMap<String, Staging>,
    transaction: Option<Transaction>,
    failures: HashSet<FailPoint>,
    disconnected: bool,
    insert_delay: Option<Duration>,
    rng: StdRng,
    operations: Vec<String>,
}

/// Datastore that keeps every table in memory.
#[derive(Debug)]
pub struct MemoryDatastore {
    state: Mutex<State>,
}

impl MemoryDatastore {
    /// Empty tables for every table of the graph.
    pub fn new(graph: &DependencyGraph) -> Self {
        let tables = graph
            .tables()
            .iter()
            .map(|spec| {
                (
                    spec.name.clone(),
                    MemoryTable {
                        spec: spec.clone(),
                        rows: Vec::new(),
                        indexes: Vec::new(),
                        triggers_enabled: true,
                        insert_calls: 0,
                    },
                )
            })
            .collect();

        Self {
            state: Mutex::new(State {
                tables,
                staging: HashMap::new(),
                transaction: None,
                failures: HashSet::new(),
                disconnected: false,
                insert_delay: None,
                rng: StdRng::seed_from_u64(0),
                operations: Vec::new(),
            }),
        }
    }

    /// Seed the key sampler.
    pub fn with_sampling_seed(self, seed: u64) -> Self {
        self.state().rng = StdRng::seed_from_u64(seed);
        self
    }

    /// Declare a secondary index on a table.
    pub fn with_index(self, table: &str, definition: &str) -> Self {
        if let Some(t) = self.state().tables.get_mut(table) {
            t.indexes.push(definition.to_string());
        }
        self
    }

    /// Preload rows without constraint checks.
    pub fn with_rows(self, table: &str, rows: Vec<Record>) -> Self {
        if let Some(t) = self.state().tables.get_mut(table) {
            t.rows.extend(rows);
        }
        self
    }

    /// Make the operation at `point` fail with a query error.
    pub fn fail_at(&self, point: FailPoint) {
        self.state().failures.insert(point);
    }

    /// Fail every subsequent call with a connection error.
    pub fn disconnect(&self) {
        self.state().disconnected = true;
    }

    /// Sleep this long inside every `insert_rows`.
    pub fn set_insert_delay(&self, delay: Duration) {
        self.state().insert_delay = Some(delay);
    }

    /// Committed and in-transaction rows of a table.
    pub fn rows(&self, table: &str) -> Vec<Record> {
        self.state()
            .tables
            .get(table)
            .map(|t| t.rows.clone())
            .unwrap_or_default()
    }

    /// Primary keys currently in a table.
    pub fn keys(&self, table: &str) -> HashSet<Value> {
        self.state()
            .tables
            .get(table)
            .map(primary_keys)
            .unwrap_or_default()
    }

    /// Secondary index definitions currently present on a table.
    pub fn indexes(&self, table: &str) -> Vec<String> {
        self.state()
            .tables
            .get(table)
            .map(|t| t.indexes.clone())
            .unwrap_or_default()
    }

    pub fn triggers_enabled(&self, table: &str) -> bool {
        self.state()
            .tables
            .get(table)
            .is_some_and(|t| t.triggers_enabled)
    }

    /// Names of staging tables that still exist.
    pub fn staging_tables(&self) -> Vec<String> {
        self.state().staging.keys().cloned().collect()
    }

    pub fn in_transaction(&self) -> bool {
        self.state().transaction.is_some()
    }

    /// Log of statements issued, e.g. `begin`, `insert orders 100`, `commit`.
    pub fn operations(&self) -> Vec<String> {
        self.state().operations.clone()
    }

    fn state(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn connected(&self) -> Result<MutexGuard<'_, State>, DatastoreError> {
        let state = self.state();
        if state.disconnected {
            return Err(DatastoreError::Connection(
                "connection to in-memory datastore closed".to_string(),
            ));
        }
        Ok(state)
    }
}

fn primary_keys(table: &MemoryTable) -> HashSet<Value> {
    match table.spec.column_index(&table.spec.primary_key) {
        Some(idx) => table
            .rows
            .iter()
            .filter_map(|r| r.get(idx).cloned())
            .collect(),
        None => HashSet::new(),
    }
}

fn unknown_table(name: &str) -> DatastoreError {
    DatastoreError::Query(format!("relation \"{name}\" does not exist"))
}

impl State {
    /// Validate rows against the target table's constraints.
    fn check_rows(&self, table: &str, rows: &[Record]) -> Result<(), DatastoreError> {
        let target = self.tables.get(table).ok_or_else(|| unknown_table(table))?;
        let spec = &target.spec;

        for row in rows {
            if row.len() != spec.columns.len() {
                return Err(DatastoreError::Query(format!(
                    "INSERT into {table} has {} values for {} columns",
                    row.len(),
                    spec.columns.len()
                )));
            }
            for (column, value) in spec.columns.iter().zip(row.values()) {
                match value.column_type() {
                    None if !column.nullable => {
                        return Err(DatastoreError::Query(format!(
                            "null value in column \"{}\" of relation \"{table}\" violates not-null constraint",
                            column.name
                        )));
                    }
                    Some(actual) if actual != column.column_type => {
                        return Err(DatastoreError::Query(format!(
                            "column \"{}\" is of type {} but expression is of type {actual}",
                            column.name, column.column_type
                        )));
                    }
                    _ => {}
                }
            }
        }

        // The primary key index survives trigger suspension.
        let mut seen = primary_keys(target);
        let pk_idx = spec.column_index(&spec.primary_key);
        for row in rows {
            if let Some(pk) = pk_idx.and_then(|i| row.get(i)) {
                if !seen.insert(pk.clone()) {
                    return Err(DatastoreError::Query(format!(
                        "duplicate key value violates unique constraint \"{table}_pkey\": {pk}"
                    )));
                }
            }
        }

        if !target.triggers_enabled {
            return Ok(());
        }

        for fk in &spec.foreign_keys {
            let parent = self
                .tables
                .get(&fk.referenced_table)
                .ok_or_else(|| unknown_table(&fk.referenced_table))?;
            let parent_keys = primary_keys(parent);
            let Some(idx) = spec.column_index(&fk.column) else {
                continue;
            };
            for row in rows {
                match row.get(idx) {
                    Some(Value::Null) | None => {}
                    Some(key) if parent_keys.contains(key) => {}
                    Some(key) => {
                        return Err(DatastoreError::Query(format!(
                            "insert or update on table \"{table}\" violates foreign key constraint on \"{}\": key {key} is not present in table \"{}\"",
                            fk.column, fk.referenced_table
                        )));
                    }
                }
            }
        }
        Ok(())
    }

    /// Append rows, remembering the pre-transaction length for rollback.
    fn append(&mut self, table: &str, rows: Vec<Record>) -> Result<u64, DatastoreError> {
        let target = self
            .tables
            .get_mut(table)
            .ok_or_else(|| unknown_table(table))?;
        if let Some(tx) = self.transaction.as_mut() {
            tx.row_counts
                .entry(table.to_string())
                .or_insert(target.rows.len());
        }
        let count = rows.len() as u64;
        target.rows.extend(rows);
        Ok(count)
    }

    fn take_failure(&mut self, point: &FailPoint) -> Result<(), DatastoreError> {
        if self.failures.remove(point) {
            return Err(DatastoreError::Query(format!("injected failure at {point:?}")));
        }
        Ok(())
    }
}

#[async_trait]
impl Datastore for MemoryDatastore {
    async fn row_count(&self, table: &str) -> Result<u64, DatastoreError> {
        let state = self.connected()?;
        state
            .tables
            .get(table)
            .map(|t| t.rows.len() as u64)
            .ok_or_else(|| unknown_table(table))
    }

    async fn sample_keys(
        &self,
        table: &TableSpec,
        limit: usize,
    ) -> Result<Vec<Value>, DatastoreError> {
        let mut state = self.connected()?;
        let state = &mut *state;
        let target = state
            .tables
            .get(&table.name)
            .ok_or_else(|| unknown_table(&table.name))?;
        let idx = target
            .spec
            .column_index(&target.spec.primary_key)
            .ok_or_else(|| DatastoreError::Query(format!("{} has no primary key", table.name)))?;

        // Reservoir sampling keeps memory at `limit` keys regardless of table size.
        let mut reservoir: Vec<Value> = Vec::with_capacity(limit.min(target.rows.len()));
        for (seen, row) in target.rows.iter().enumerate() {
            let Some(key) = row.get(idx) else { continue };
            if reservoir.len() < limit {
                reservoir.push(key.clone());
            } else {
                let slot = state.rng.random_range(0..=seen);
                if slot < limit {
                    reservoir[slot] = key.clone();
                }
            }
        }
        state
            .operations
            .push(format!("sample {} {}", table.name, reservoir.len()));
        Ok(reservoir)
    }

    async fn begin(&self) -> Result<(), DatastoreError> {
        let mut state = self.connected()?;
        if state.transaction.is_some() {
            return Err(DatastoreError::Query(
                "there is already a transaction in progress".to_string(),
            ));
        }
        state.transaction = Some(Transaction::default());
        state.operations.push("begin".to_string());
        Ok(())
    }

    async fn commit(&self) -> Result<(), DatastoreError> {
        let mut state = self.connected()?;
        state.transaction = None;
        state.operations.push("commit".to_string());
        Ok(())
    }

    async fn rollback(&self) -> Result<(), DatastoreError> {
        let mut state = self.connected()?;
        if let Some(tx) = state.transaction.take() {
            for (table, len) in tx.row_counts {
                if let Some(t) = state.tables.get_mut(&table) {
                    t.rows.truncate(len);
                }
            }
            for staging in tx.created_staging {
                state.staging.remove(&staging);
            }
        }
        state.operations.push("rollback".to_string());
        Ok(())
    }

    async fn insert_rows(
        &self,
        table: &TableSpec,
        rows: &[Record],
    ) -> Result<u64, DatastoreError> {
        let delay = self.connected()?.insert_delay;
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        let mut state = self.connected()?;
        let call = {
            let target = state
                .tables
                .get_mut(&table.name)
                .ok_or_else(|| unknown_table(&table.name))?;
            target.insert_calls += 1;
            target.insert_calls
        };
        state.take_failure(&FailPoint::Insert {
            table: table.name.clone(),
            call,
        })?;
        state.check_rows(&table.name, rows)?;
        let count = state.append(&table.name, rows.to_vec())?;
        state
            .operations
            .push(format!("insert {} {count}", table.name));
        debug!(table = %table.name, rows = count, "memory insert");
        Ok(count)
    }

    async fn create_staging(&self, table: &TableSpec) -> Result<String, DatastoreError> {
        let mut state = self.connected()?;
        let name = format!("_bulkseed_staging_{}", table.name);
        if state.staging.contains_key(&name) {
            return Err(DatastoreError::Query(format!(
                "relation \"{name}\" already exists"
            )));
        }
        state.staging.insert(
            name.clone(),
            Staging {
                table: table.name.clone(),
                rows: Vec::new(),
            },
        );
        if let Some(tx) = state.transaction.as_mut() {
            tx.created_staging.push(name.clone());
        }
        state.operations.push(format!("create staging {name}"));
        Ok(name)
    }

    async fn copy_into_staging(
        &self,
        staging: &str,
        table: &TableSpec,
        mut rows: RecordStream<'_>,
    ) -> Result<u64, DatastoreError> {
        self.connected()?.take_failure(&FailPoint::Copy {
            table: table.name.clone(),
        })?;

        let mut copied = 0u64;
        while let Some(chunk) = rows.next().await {
            let mut state = self.connected()?;
            let target = state
                .staging
                .get_mut(staging)
                .ok_or_else(|| unknown_table(staging))?;
            copied += chunk.len() as u64;
            target.rows.extend(chunk);
        }
        self.connected()?
            .operations
            .push(format!("copy {staging} {copied}"));
        Ok(copied)
    }

    async fn move_from_staging(
        &self,
        staging: &str,
        table: &TableSpec,
    ) -> Result<u64, DatastoreError> {
        let mut state = self.connected()?;
        state.take_failure(&FailPoint::Move {
            table: table.name.clone(),
        })?;
        let staged = state
            .staging
            .get_mut(staging)
            .ok_or_else(|| unknown_table(staging))?;
        if staged.table != table.name {
            return Err(DatastoreError::Query(format!(
                "staging table {staging} belongs to {}",
                staged.table
            )));
        }
        let rows = std::mem::take(&mut staged.rows);

        if let Err(e) = state.check_rows(&table.name, &rows) {
            if let Some(staged) = state.staging.get_mut(staging) {
                staged.rows = rows;
            }
            return Err(e);
        }
        let count = state.append(&table.name, rows)?;
        state
            .operations
            .push(format!("move {} {count}", table.name));
        Ok(count)
    }

    async fn drop_staging(&self, staging: &str) -> Result<(), DatastoreError> {
        let mut state = self.connected()?;
        state.staging.remove(staging);
        state.operations.push(format!("drop staging {staging}"));
        Ok(())
    }

    async fn suspend(&self, table: &TableSpec) -> Result<SuspendedState, DatastoreError> {
        let mut state = self.connected()?;
        let target = state
            .tables
            .get_mut(&table.name)
            .ok_or_else(|| unknown_table(&table.name))?;
        target.triggers_enabled = false;
        let dropped_indexes = std::mem::take(&mut target.indexes);
        state.operations.push(format!("suspend {}", table.name));
        Ok(SuspendedState {
            table: table.name.clone(),
            triggers_disabled: true,
            dropped_indexes,
        })
    }

    async fn restore(&self, suspended: &SuspendedState) -> Result<(), DatastoreError> {
        let mut state = self.connected()?;
        state.take_failure(&FailPoint::Restore {
            table: suspended.table.clone(),
        })?;
        let target = state
            .tables
            .get_mut(&suspended.table)
            .ok_or_else(|| unknown_table(&suspended.table))?;
        target.indexes.extend(suspended.dropped_indexes.iter().cloned());
        if suspended.triggers_disabled {
            target.triggers_enabled = true;
        }
        state
            .operations
            .push(format!("restore {}", suspended.table));
        Ok(())
    }
}
