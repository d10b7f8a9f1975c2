//! Bounded samples of parent primary keys.
//!
//! A child table never needs every parent key, only enough of them to spread
//! its foreign keys around. The sampler pulls at most `max_size` keys per
//! parent once per run and hands out the same immutable pool afterwards.

use crate::datastore::Datastore;
use crate::error::{DatastoreError, LoadError};
use chrono::{DateTime, Utc};
use rand::seq::IndexedRandom;
use rand::RngCore;
use seed_core::{DependencyGraph, ForeignKeyRef, TableSpec, Value};
use seed_generator::ParentKeys;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, info};

/// Default upper bound on sampled keys per parent table.
pub const DEFAULT_POOL_SIZE: usize = 10_000;

/// Sampled primary keys of one table.
#[derive(Debug, Clone, PartialEq)]
pub struct KeyPool {
    table: String,
    keys: Vec<Value>,
    sampled_at: DateTime<Utc>,
}

impl KeyPool {
    pub fn new(table: impl Into<String>, keys: Vec<Value>) -> Self {
        Self {
            table: table.into(),
            keys,
            sampled_at: Utc::now(),
        }
    }

    pub fn table(&self) -> &str {
        &self.table
    }

    pub fn keys(&self) -> &[Value] {
        &self.keys
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    pub fn sampled_at(&self) -> DateTime<Utc> {
        self.sampled_at
    }

    /// Pick one key uniformly, `None` if the pool is empty.
    pub fn choose(&self, rng: &mut dyn RngCore) -> Option<&Value> {
        self.keys.choose(rng)
    }
}

/// Caches one [`KeyPool`] per table for the duration of a run.
#[derive(Debug)]
pub struct KeyPoolSampler {
    max_size: usize,
    pools: HashMap<String, Arc<KeyPool>>,
}

impl Default for KeyPoolSampler {
    fn default() -> Self {
        Self::new(DEFAULT_POOL_SIZE)
    }
}

impl KeyPoolSampler {
    pub fn new(max_size: usize) -> Self {
        Self {
            max_size: max_size.max(1),
            pools: HashMap::new(),
        }
    }

    pub fn max_size(&self) -> usize {
        self.max_size
    }

    /// Pool for `table`, sampled from the datastore on first use.
    pub async fn sample(
        &mut self,
        datastore: &dyn Datastore,
        table: &TableSpec,
    ) -> Result<Arc<KeyPool>, DatastoreError> {
        if let Some(pool) = self.pools.get(&table.name) {
            debug!(table = %table.name, keys = pool.len(), "Using cached key pool");
            return Ok(Arc::clone(pool));
        }

        let keys = datastore.sample_keys(table, self.max_size).await?;
        info!(table = %table.name, keys = keys.len(), "Sampled key pool");
        let pool = Arc::new(KeyPool::new(table.name.clone(), keys));
        self.pools.insert(table.name.clone(), Arc::clone(&pool));
        Ok(pool)
    }

    /// Pools for every foreign key of `table`.
    ///
    /// Fails with [`LoadError::EmptyParentPool`] when a required foreign key
    /// points at an empty parent. A nullable foreign key into an empty parent
    /// is accepted and will be NULL.
    pub async fn parents_of(
        &mut self,
        datastore: &dyn Datastore,
        graph: &DependencyGraph,
        table: &TableSpec,
    ) -> Result<ParentPools, LoadError> {
        let mut pools = Vec::with_capacity(table.foreign_keys.len());
        for fk in &table.foreign_keys {
            let parent = graph.get_table(&fk.referenced_table).ok_or_else(|| {
                LoadError::Plan(format!(
                    "table '{}' references unknown table '{}'",
                    table.name, fk.referenced_table
                ))
            })?;
            let pool = self
                .sample(datastore, parent)
                .await
                .map_err(|e| LoadError::datastore(&table.name, e))?;

            if pool.is_empty() && !fk.nullable {
                return Err(LoadError::EmptyParentPool {
                    table: table.name.clone(),
                    parent: fk.referenced_table.clone(),
                    column: fk.column.clone(),
                });
            }
            pools.push((fk.clone(), pool));
        }
        Ok(ParentPools { pools })
    }

    /// Whether a pool for `table` is cached.
    pub fn is_cached(&self, table: &str) -> bool {
        self.pools.contains_key(table)
    }

    /// Drop all cached pools so the next run samples fresh keys.
    pub fn invalidate_all(&mut self) {
        self.pools.clear();
    }
}

/// The key pools backing each foreign key of one table.
#[derive(Debug, Clone, Default)]
pub struct ParentPools {
    pools: Vec<(ForeignKeyRef, Arc<KeyPool>)>,
}

impl ParentPools {
    /// No foreign keys.
    pub fn none() -> Self {
        Self::default()
    }

    /// Pick a key for every foreign key into `keys`, NULL where the pool is empty.
    pub fn select(&self, rng: &mut dyn RngCore, keys: &mut ParentKeys) {
        keys.clear();
        for (fk, pool) in &self.pools {
            let value = pool.choose(rng).cloned().unwrap_or(Value::Null);
            keys.insert(fk.column.as_str(), fk.referenced_table.as_str(), value);
        }
    }

    pub fn pool(&self, column: &str) -> Option<&Arc<KeyPool>> {
        self.pools
            .iter()
            .find(|(fk, _)| fk.column == column)
            .map(|(_, pool)| pool)
    }

    pub fn len(&self) -> usize {
        self.pools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pools.is_empty()
    }
}
