//! A single partition: its records and its index instances

use std::collections::BTreeMap;

use chrono::NaiveDate;

use crate::index::{IndexDefinition, IndexId, IndexManager, IndexResult};
use crate::schema::{Record, RecordId};

/// Partition identifier; never reused
pub type PartitionId = u64;

/// Records of one date range plus their indexes.
///
/// The range itself lives in the boundary table, not here.
#[derive(Debug)]
pub struct Partition {
    id: PartitionId,
    records: BTreeMap<RecordId, Record>,
    indexes: IndexManager,
    retired: bool,
}

impl Partition {
    pub fn new(id: PartitionId, definitions: impl IntoIterator<Item = IndexDefinition>) -> Self {
        Self {
            id,
            records: BTreeMap::new(),
            indexes: IndexManager::from_definitions(definitions),
            retired: false,
        }
    }

    pub fn id(&self) -> PartitionId {
        self.id
    }

    /// Adds a record and indexes it. The caller has checked the id is free.
    pub fn insert(&mut self, record: Record) {
        self.indexes.insert(&record);
        self.records.insert(record.id.clone(), record);
    }

    /// Removes a record and its index entries
    pub fn remove(&mut self, id: &RecordId) -> Option<Record> {
        let record = self.records.remove(id)?;
        self.indexes.remove(&record);
        Some(record)
    }

    pub fn get(&self, id: &RecordId) -> Option<&Record> {
        self.records.get(id)
    }

    pub fn contains(&self, id: &RecordId) -> bool {
        self.records.contains_key(id)
    }

    /// Records in id order
    pub fn records(&self) -> impl Iterator<Item = &Record> {
        self.records.values()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn indexes(&self) -> &IndexManager {
        &self.indexes
    }

    /// Builds a new index over the current records
    pub fn define_index(&mut self, definition: IndexDefinition) -> IndexResult<IndexId> {
        self.indexes.define_index(definition, self.records.values())
    }

    pub fn definitions(&self) -> Vec<IndexDefinition> {
        self.indexes.definitions().cloned().collect()
    }

    /// Copies this partition into `[.., boundary)` and `[boundary, ..)`
    /// halves with freshly built indexes. The lower half takes `left_id`, the
    /// upper half keeps this partition's id. `self` is left intact.
    pub fn split_at(&self, boundary: NaiveDate, left_id: PartitionId) -> (Partition, Partition) {
        let definitions = self.definitions();
        let mut left = Partition::new(left_id, definitions.clone());
        let mut right = Partition::new(self.id, definitions);

        for record in self.records.values() {
            if record.partition_key < boundary {
                left.insert(record.clone());
            } else {
                right.insert(record.clone());
            }
        }
        (left, right)
    }

    /// Removes every record, returning them in id order
    pub fn drain(&mut self) -> Vec<Record> {
        let records = std::mem::take(&mut self.records);
        self.indexes = IndexManager::from_definitions(self.definitions());
        records.into_values().collect()
    }

    /// Marks this instance as replaced in the boundary table
    pub fn retire(&mut self) {
        self.retired = true;
    }

    pub fn is_retired(&self) -> bool {
        self.retired
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::Value;

    fn d(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    fn def() -> IndexDefinition {
        IndexDefinition::new(1, vec!["property_id".to_string()])
    }

    #[test]
    fn test_insert_and_remove_keep_indexes_in_step() {
        let mut p = Partition::new(0, [def()]);
        p.insert(Record::new("b1", d("2024-06-01")).with("property_id", 1));
        p.insert(Record::new("b2", d("2024-06-02")).with("property_id", 1));

        assert_eq!(p.indexes().lookup(1, &[Value::Int(1)], None).unwrap().len(), 2);

        let removed = p.remove(&RecordId::new("b1")).unwrap();
        assert_eq!(removed.id.as_str(), "b1");
        assert_eq!(p.indexes().lookup(1, &[Value::Int(1)], None).unwrap().len(), 1);
        assert!(p.remove(&RecordId::new("b1")).is_none());
    }

    #[test]
    fn test_split_partitions_records_by_key() {
        let mut p = Partition::new(3, [def()]);
        p.insert(Record::new("early", d("2024-06-30")).with("property_id", 1));
        p.insert(Record::new("late", d("2024-07-01")).with("property_id", 1));

        let (left, right) = p.split_at(d("2024-07-01"), 9);
        assert_eq!(left.id(), 9);
        assert_eq!(right.id(), 3);
        assert!(left.contains(&RecordId::new("early")));
        assert!(right.contains(&RecordId::new("late")));
        assert_eq!(right.indexes().lookup(1, &[Value::Int(1)], None).unwrap().len(), 1);

        // Parent untouched
        assert_eq!(p.len(), 2);
    }

    #[test]
    fn test_drain_empties_indexes() {
        let mut p = Partition::new(0, [def()]);
        p.insert(Record::new("b1", d("2024-06-01")).with("property_id", 1));

        let drained = p.drain();
        assert_eq!(drained.len(), 1);
        assert!(p.is_empty());
        assert!(p.indexes().lookup(1, &[Value::Int(1)], None).unwrap().is_empty());
        assert_eq!(p.indexes().index_count(), 1);
    }
}
