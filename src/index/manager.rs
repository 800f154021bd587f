//! Per-partition index manager
//!
//! # API
//!
//! - `define_index(definition, records)` - Add an index and build it
//! - `insert(record)` / `remove(record)` - Keep every index in step with writes
//! - `lookup(id, prefix, range)` - Equality prefix + optional range seek
//! - `estimate(id, prefix, range)` / `selectivity(...)` - Exact match counts
//!
//! Each index carries a hit counter bumped by `lookup`, sampled by
//! monitoring to find indexes nobody uses.

use std::sync::atomic::{AtomicU64, Ordering};

use serde::{Deserialize, Serialize};

use super::btree::{ColumnRange, IndexKey, IndexTree};
use super::errors::{IndexError, IndexResult};
use crate::schema::{Record, RecordId, Value};

/// Engine-wide index identifier
pub type IndexId = u32;

/// Ordered column list an index is built over
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexDefinition {
    pub id: IndexId,
    pub columns: Vec<String>,
}

impl IndexDefinition {
    pub fn new(id: IndexId, columns: Vec<String>) -> Self {
        Self { id, columns }
    }

    /// `idx_<col1>_<col2>...`
    pub fn name(&self) -> String {
        format!("idx_{}", self.columns.join("_"))
    }

    /// Composite key of `record` for this index
    pub fn key_for(&self, record: &Record) -> IndexKey {
        IndexKey::new(
            self.columns
                .iter()
                .map(|column| record.value(column).clone())
                .collect(),
        )
    }

    pub fn leading_column(&self) -> Option<&str> {
        self.columns.first().map(String::as_str)
    }
}

#[derive(Debug)]
struct IndexInstance {
    definition: IndexDefinition,
    tree: IndexTree,
    hits: AtomicU64,
}

impl IndexInstance {
    fn new(definition: IndexDefinition) -> Self {
        Self {
            definition,
            tree: IndexTree::new(),
            hits: AtomicU64::new(0),
        }
    }
}

/// Index instances of one partition
#[derive(Debug, Default)]
pub struct IndexManager {
    /// In definition order
    indexes: Vec<IndexInstance>,
    record_count: usize,
}

impl IndexManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Empty instances for each definition
    pub fn from_definitions(definitions: impl IntoIterator<Item = IndexDefinition>) -> Self {
        Self {
            indexes: definitions.into_iter().map(IndexInstance::new).collect(),
            record_count: 0,
        }
    }

    /// Adds an index and populates it from `records`.
    ///
    /// `records` must be exactly the records already inserted into this
    /// manager.
    pub fn define_index<'r>(
        &mut self,
        definition: IndexDefinition,
        records: impl IntoIterator<Item = &'r Record>,
    ) -> IndexResult<IndexId> {
        if definition.columns.is_empty() {
            return Err(IndexError::invalid_lookup("Index needs at least one column"));
        }
        if self.has_columns(&definition.columns) {
            return Err(IndexError::duplicate_definition(&definition.columns));
        }
        if self.indexes.iter().any(|ix| ix.definition.id == definition.id) {
            return Err(IndexError::invalid_lookup(format!(
                "Index id {} already in use",
                definition.id
            )));
        }

        let mut instance = IndexInstance::new(definition);
        for record in records {
            instance
                .tree
                .insert(instance.definition.key_for(record), record.id.clone());
        }

        let id = instance.definition.id;
        self.indexes.push(instance);
        Ok(id)
    }

    /// True if an index over exactly `columns` (same order) exists
    pub fn has_columns(&self, columns: &[String]) -> bool {
        self.indexes
            .iter()
            .any(|ix| ix.definition.columns.as_slice() == columns)
    }

    /// Definitions in definition order
    pub fn definitions(&self) -> impl Iterator<Item = &IndexDefinition> {
        self.indexes.iter().map(|ix| &ix.definition)
    }

    pub fn definition(&self, id: IndexId) -> Option<&IndexDefinition> {
        self.instance(id).ok().map(|ix| &ix.definition)
    }

    /// Adds `record` to every index
    pub fn insert(&mut self, record: &Record) {
        for ix in &mut self.indexes {
            ix.tree.insert(ix.definition.key_for(record), record.id.clone());
        }
        self.record_count += 1;
    }

    /// Removes `record` from every index.
    ///
    /// An id missing from its bucket is skipped silently.
    pub fn remove(&mut self, record: &Record) {
        for ix in &mut self.indexes {
            ix.tree.remove(&ix.definition.key_for(record), &record.id);
        }
        self.record_count = self.record_count.saturating_sub(1);
    }

    /// Equality on the first `prefix.len()` columns plus an optional range on
    /// the next one. Further columns are not narrowed; callers filter them.
    pub fn lookup(
        &self,
        id: IndexId,
        prefix: &[Value],
        range: Option<&ColumnRange>,
    ) -> IndexResult<Vec<RecordId>> {
        let ix = self.instance(id)?;
        check_shape(&ix.definition, prefix, range)?;
        ix.hits.fetch_add(1, Ordering::Relaxed);
        Ok(ix.tree.lookup(prefix, range))
    }

    /// Exact number of records a lookup would return
    pub fn estimate(
        &self,
        id: IndexId,
        prefix: &[Value],
        range: Option<&ColumnRange>,
    ) -> IndexResult<usize> {
        let ix = self.instance(id)?;
        check_shape(&ix.definition, prefix, range)?;
        Ok(ix.tree.count(prefix, range))
    }

    /// Fraction of the partition's records a lookup would return, in [0, 1]
    pub fn selectivity(
        &self,
        id: IndexId,
        prefix: &[Value],
        range: Option<&ColumnRange>,
    ) -> IndexResult<f64> {
        let matched = self.estimate(id, prefix, range)?;
        if self.record_count == 0 {
            return Ok(0.0);
        }
        Ok((matched as f64 / self.record_count as f64).min(1.0))
    }

    /// Lookups served by an index since it was built
    pub fn hits(&self, id: IndexId) -> Option<u64> {
        self.instance(id).ok().map(|ix| ix.hits.load(Ordering::Relaxed))
    }

    pub fn record_count(&self) -> usize {
        self.record_count
    }

    pub fn index_count(&self) -> usize {
        self.indexes.len()
    }

    fn instance(&self, id: IndexId) -> IndexResult<&IndexInstance> {
        self.indexes
            .iter()
            .find(|ix| ix.definition.id == id)
            .ok_or_else(|| IndexError::unknown_index(id))
    }
}

fn check_shape(
    definition: &IndexDefinition,
    prefix: &[Value],
    range: Option<&ColumnRange>,
) -> IndexResult<()> {
    let needed = prefix.len() + usize::from(range.is_some());
    if needed > definition.columns.len() {
        return Err(IndexError::invalid_lookup(format!(
            "{} has {} column(s) but the lookup constrains {}",
            definition.name(),
            definition.columns.len(),
            needed
        )));
    }
    Ok(())
}
