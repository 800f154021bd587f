//! Partition manager
//!
//! Owns the boundary table, routes keys to partitions, and performs the
//! structural operations: boundary insert (split), partition drop (merge of
//! the freed range into the next partition) and index definition.
//!
//! Structural operations are serialized by `admin`. Lock order is
//! `admin` → partition lock → `table`; record writers never hold `table`
//! while waiting on a partition lock.

use std::sync::atomic::{AtomicU32, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, RwLock};

use chrono::{Days, Months, NaiveDate};
use serde::{Deserialize, Serialize};

use super::boundary::{BoundaryTable, KeyRange, PartitionBounds, PartitionSlot};
use super::errors::{PartitionError, PartitionResult};
use super::partition::{Partition, PartitionId};
use crate::index::{IndexDefinition, IndexError, IndexId};
use crate::schema::Record;
use crate::sync;

/// Which partitions an index definition applies to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IndexScope {
    /// Every current partition and every partition split off later
    All,
    /// One partition (inherited by both halves if it is split)
    Partition(PartitionId),
}

/// Step used to carve bounded partitions out of the catch-all
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SplitInterval {
    Days(u32),
    Months(u32),
}

impl SplitInterval {
    /// `from` advanced by one step, if representable
    pub fn advance(&self, from: NaiveDate) -> Option<NaiveDate> {
        match *self {
            SplitInterval::Days(0) | SplitInterval::Months(0) => None,
            SplitInterval::Days(n) => from.checked_add_days(Days::new(u64::from(n))),
            SplitInterval::Months(n) => from.checked_add_months(Months::new(n)),
        }
    }
}

/// Read-only view of one partition for administration and reporting
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PartitionInfo {
    pub id: PartitionId,
    pub bounds: PartitionBounds,
    pub record_count: usize,
    pub indexes: Vec<String>,
}

/// Owner of the partition layout
#[derive(Debug)]
pub struct PartitionManager {
    table: RwLock<Arc<BoundaryTable>>,
    admin: Mutex<()>,
    /// Definitions registered with `IndexScope::All`
    catalog: RwLock<Vec<IndexDefinition>>,
    next_partition: AtomicU64,
    next_index: AtomicU32,
}

impl PartitionManager {
    /// Builds partitions from ascending lower bounds.
    ///
    /// `[b0, b1), ..., [b_n, +inf)`; an empty list gives a single catch-all
    /// starting at the earliest representable date.
    pub fn new(boundaries: &[NaiveDate]) -> PartitionResult<Self> {
        for pair in boundaries.windows(2) {
            if pair[0] >= pair[1] {
                return Err(PartitionError::unordered_boundaries(pair[0], pair[1]));
            }
        }

        let lowers: Vec<NaiveDate> = if boundaries.is_empty() {
            vec![NaiveDate::MIN]
        } else {
            boundaries.to_vec()
        };

        let slots: Vec<PartitionSlot> = lowers
            .iter()
            .enumerate()
            .map(|(i, lower)| {
                let id = i as PartitionId;
                PartitionSlot {
                    id,
                    bounds: PartitionBounds::new(*lower, lowers.get(i + 1).copied()),
                    partition: Arc::new(RwLock::new(Partition::new(id, []))),
                }
            })
            .collect();

        Ok(Self {
            next_partition: AtomicU64::new(slots.len() as u64),
            table: RwLock::new(Arc::new(BoundaryTable::new(slots))),
            admin: Mutex::new(()),
            catalog: RwLock::new(Vec::new()),
            next_index: AtomicU32::new(1),
        })
    }

    /// Current boundary table. Stays valid (and unchanged) for as long as
    /// the caller holds it.
    pub fn snapshot(&self) -> Arc<BoundaryTable> {
        Arc::clone(&sync::read(&self.table))
    }

    /// Partition owning `key`
    pub fn locate(&self, key: NaiveDate) -> PartitionResult<PartitionId> {
        let table = self.snapshot();
        let pos = table.locate(key)?;
        Ok(table.slots()[pos].id)
    }

    /// Partitions intersecting `range`, in range order
    pub fn prune(&self, range: &KeyRange) -> Vec<PartitionId> {
        self.snapshot().prune(range).iter().map(|s| s.id).collect()
    }

    /// Splits the partition containing `boundary` at `boundary`.
    ///
    /// Returns the id of the new lower half `[lower, boundary)`; the upper
    /// half keeps the original id, so the catch-all id never changes.
    /// Dropping the returned id, when legal, restores the previous layout.
    pub fn insert_boundary(&self, boundary: NaiveDate) -> PartitionResult<PartitionId> {
        let _admin = sync::lock(&self.admin);
        let table = self.snapshot();

        if boundary < table.min() {
            return Err(PartitionError::boundary_before_min(boundary, table.min()));
        }
        if table.slots().iter().any(|s| s.bounds.lower == boundary) {
            return Err(PartitionError::boundary_exists(boundary));
        }

        let pos = table.locate(boundary)?;
        let target = &table.slots()[pos];
        let mut parent = sync::write(&target.partition);

        let left_id = self.next_partition.fetch_add(1, Ordering::Relaxed);
        let (left, right) = parent.split_at(boundary, left_id);

        let mut slots = table.slots().to_vec();
        slots[pos] = PartitionSlot {
            id: target.id,
            bounds: PartitionBounds::new(boundary, target.bounds.upper),
            partition: Arc::new(RwLock::new(right)),
        };
        slots.insert(
            pos,
            PartitionSlot {
                id: left_id,
                bounds: PartitionBounds::new(target.bounds.lower, Some(boundary)),
                partition: Arc::new(RwLock::new(left)),
            },
        );

        self.publish(slots);
        parent.retire();
        Ok(left_id)
    }

    /// Drops a partition, returning the records it held.
    ///
    /// Only the lowest partition or the one just below the catch-all can go;
    /// its range is merged into the next partition up.
    pub fn drop_partition(&self, id: PartitionId) -> PartitionResult<Vec<Record>> {
        self.drop_partition_with(id, |_| {})
    }

    /// Like [`drop_partition`](Self::drop_partition), but runs `on_drain`
    /// over the removed records while the victim is still write-locked and
    /// before the new layout is published.
    pub fn drop_partition_with<F>(&self, id: PartitionId, on_drain: F) -> PartitionResult<Vec<Record>>
    where
        F: FnOnce(&[Record]),
    {
        let _admin = sync::lock(&self.admin);
        let table = self.snapshot();

        let pos = table
            .position(id)
            .ok_or_else(|| PartitionError::unknown_partition(id))?;
        let last = table.len() - 1;
        if pos == last {
            return Err(PartitionError::non_pruneable(id, "the catch-all partition must exist"));
        }
        if pos != 0 && pos + 1 != last {
            return Err(PartitionError::non_pruneable(
                id,
                "only the lowest partition or the one below the catch-all can be dropped",
            ));
        }

        let victim = &table.slots()[pos];
        let mut partition = sync::write(&victim.partition);
        let removed = partition.drain();
        on_drain(&removed);

        let mut slots = table.slots().to_vec();
        slots.remove(pos);
        slots[pos].bounds.lower = victim.bounds.lower;

        self.publish(slots);
        partition.retire();
        Ok(removed)
    }

    /// Defines an index over `columns` in the partitions named by `scope`.
    ///
    /// Either every target partition gets the index or none does.
    pub fn define_index(&self, scope: IndexScope, columns: Vec<String>) -> PartitionResult<IndexId> {
        if columns.is_empty() {
            return Err(IndexError::invalid_lookup("Index needs at least one column").into());
        }

        let _admin = sync::lock(&self.admin);
        let table = self.snapshot();

        let targets: Vec<&PartitionSlot> = match scope {
            IndexScope::All => {
                if sync::read(&self.catalog).iter().any(|d| d.columns == columns) {
                    return Err(IndexError::duplicate_definition(&columns).into());
                }
                table.slots().iter().collect()
            }
            IndexScope::Partition(id) => {
                let pos = table
                    .position(id)
                    .ok_or_else(|| PartitionError::unknown_partition(id))?;
                vec![&table.slots()[pos]]
            }
        };

        for slot in &targets {
            if sync::read(&slot.partition).indexes().has_columns(&columns) {
                return Err(IndexError::duplicate_definition(&columns).into());
            }
        }

        let definition = IndexDefinition::new(
            self.next_index.fetch_add(1, Ordering::Relaxed),
            columns,
        );
        for slot in &targets {
            sync::write(&slot.partition).define_index(definition.clone())?;
        }

        if scope == IndexScope::All {
            sync::write(&self.catalog).push(definition.clone());
        }
        Ok(definition.id)
    }

    /// Definitions registered for every partition
    pub fn catalog(&self) -> Vec<IndexDefinition> {
        sync::read(&self.catalog).clone()
    }

    /// Splits the catch-all at successive `step`s while `key` lies at or
    /// beyond `catch_all.lower + step`, doing at most `max_splits` splits.
    ///
    /// Returns the ids of the partitions created.
    pub fn ensure_bounded(
        &self,
        key: NaiveDate,
        step: SplitInterval,
        max_splits: u32,
    ) -> PartitionResult<Vec<PartitionId>> {
        let mut created = Vec::new();

        while created.len() < max_splits as usize {
            let lower = self.snapshot().catch_all().bounds.lower;
            let Some(boundary) = step.advance(lower) else {
                break;
            };
            if key < boundary {
                break;
            }

            match self.insert_boundary(boundary) {
                Ok(id) => created.push(id),
                // Another writer split here first
                Err(e) if e.code() == crate::errors::ErrorCode::BoundaryExists => continue,
                Err(e) => return Err(e),
            }
        }

        Ok(created)
    }

    /// Layout summary in range order
    pub fn partitions(&self) -> Vec<PartitionInfo> {
        self.snapshot()
            .slots()
            .iter()
            .map(|slot| {
                let partition = sync::read(&slot.partition);
                PartitionInfo {
                    id: slot.id,
                    bounds: slot.bounds,
                    record_count: partition.len(),
                    indexes: partition.indexes().definitions().map(|d| d.name()).collect(),
                }
            })
            .collect()
    }

    fn publish(&self, slots: Vec<PartitionSlot>) {
        *sync::write(&self.table) = Arc::new(BoundaryTable::new(slots));
    }
}
