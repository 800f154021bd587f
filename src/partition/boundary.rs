//! Boundary table and partition-key ranges

use std::fmt;
use std::ops::Bound;
use std::sync::{Arc, RwLock};

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::errors::{PartitionError, PartitionResult};
use super::partition::{Partition, PartitionId};

/// Half-open date range `[lower, upper)`; `upper == None` is unbounded
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PartitionBounds {
    pub lower: NaiveDate,
    pub upper: Option<NaiveDate>,
}

impl PartitionBounds {
    pub fn new(lower: NaiveDate, upper: Option<NaiveDate>) -> Self {
        Self { lower, upper }
    }

    pub fn contains(&self, key: NaiveDate) -> bool {
        key >= self.lower && self.upper.map_or(true, |u| key < u)
    }

    pub fn is_catch_all(&self) -> bool {
        self.upper.is_none()
    }

    /// Last date inside the range
    fn last_day(&self) -> NaiveDate {
        self.upper
            .and_then(|u| u.pred_opt())
            .unwrap_or(NaiveDate::MAX)
    }

    /// True if some date in this range satisfies `range`
    pub fn intersects(&self, range: &KeyRange) -> bool {
        let Some((lo, hi)) = range.inclusive_span() else {
            return false;
        };
        lo.max(self.lower) <= hi.min(self.last_day())
    }
}

impl fmt::Display for PartitionBounds {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.upper {
            Some(upper) => write!(f, "[{}, {})", self.lower, upper),
            None => write!(f, "[{}, +inf)", self.lower),
        }
    }
}

/// Constraint on the partition key extracted from a predicate
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyRange {
    pub lower: Bound<NaiveDate>,
    pub upper: Bound<NaiveDate>,
}

impl KeyRange {
    /// No constraint: every partition survives pruning
    pub fn all() -> Self {
        Self {
            lower: Bound::Unbounded,
            upper: Bound::Unbounded,
        }
    }

    pub fn point(d: NaiveDate) -> Self {
        Self {
            lower: Bound::Included(d),
            upper: Bound::Included(d),
        }
    }

    pub fn new(lower: Bound<NaiveDate>, upper: Bound<NaiveDate>) -> Self {
        Self { lower, upper }
    }

    pub fn is_unbounded(&self) -> bool {
        self.lower == Bound::Unbounded && self.upper == Bound::Unbounded
    }

    /// Dates satisfying both ranges
    pub fn intersect(self, other: KeyRange) -> KeyRange {
        let lower = match (self.inclusive_lower(), other.inclusive_lower()) {
            (Some(a), Some(b)) => Bound::Included(a.max(b)),
            _ => return KeyRange::empty(),
        };
        let upper = match (self.inclusive_upper(), other.inclusive_upper()) {
            (Some(a), Some(b)) => Bound::Included(a.min(b)),
            _ => return KeyRange::empty(),
        };
        KeyRange { lower, upper }
    }

    /// Range no date satisfies
    pub fn empty() -> Self {
        Self {
            lower: Bound::Excluded(NaiveDate::MAX),
            upper: Bound::Unbounded,
        }
    }

    /// `[first, last]` of the dates in range, or None if there are none
    pub fn inclusive_span(&self) -> Option<(NaiveDate, NaiveDate)> {
        let lo = self.inclusive_lower()?;
        let hi = self.inclusive_upper()?;
        (lo <= hi).then_some((lo, hi))
    }

    fn inclusive_lower(&self) -> Option<NaiveDate> {
        match self.lower {
            Bound::Included(d) => Some(d),
            Bound::Excluded(d) => d.succ_opt(),
            Bound::Unbounded => Some(NaiveDate::MIN),
        }
    }

    fn inclusive_upper(&self) -> Option<NaiveDate> {
        match self.upper {
            Bound::Included(d) => Some(d),
            Bound::Excluded(d) => d.pred_opt(),
            Bound::Unbounded => Some(NaiveDate::MAX),
        }
    }
}

/// One entry of the boundary table
#[derive(Debug, Clone)]
pub struct PartitionSlot {
    pub id: PartitionId,
    pub bounds: PartitionBounds,
    pub partition: Arc<RwLock<Partition>>,
}

/// Sorted, gapless list of partitions.
///
/// Immutable once published; structural changes publish a new table.
#[derive(Debug)]
pub struct BoundaryTable {
    slots: Vec<PartitionSlot>,
}

impl BoundaryTable {
    /// `slots` must be non-empty, sorted and gapless with a single trailing
    /// catch-all.
    pub(crate) fn new(slots: Vec<PartitionSlot>) -> Self {
        debug_assert!(!slots.is_empty());
        debug_assert!(slots.windows(2).all(|w| w[0].bounds.upper == Some(w[1].bounds.lower)));
        debug_assert!(slots.last().map_or(false, |s| s.bounds.is_catch_all()));
        Self { slots }
    }

    pub fn slots(&self) -> &[PartitionSlot] {
        &self.slots
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Lowest bound of the lowest partition
    pub fn min(&self) -> NaiveDate {
        self.slots[0].bounds.lower
    }

    pub fn catch_all(&self) -> &PartitionSlot {
        &self.slots[self.slots.len() - 1]
    }

    /// Lower bounds in ascending order
    pub fn boundaries(&self) -> Vec<NaiveDate> {
        self.slots.iter().map(|s| s.bounds.lower).collect()
    }

    /// Position of the partition owning `key`
    pub fn locate(&self, key: NaiveDate) -> PartitionResult<usize> {
        if key < self.min() {
            return Err(PartitionError::boundary_before_min(key, self.min()));
        }
        Ok(self.slots.partition_point(|s| s.bounds.lower <= key) - 1)
    }

    pub fn position(&self, id: PartitionId) -> Option<usize> {
        self.slots.iter().position(|s| s.id == id)
    }

    /// Partitions intersecting `range`, in range order
    pub fn prune(&self, range: &KeyRange) -> &[PartitionSlot] {
        let Some((lo, hi)) = range.inclusive_span() else {
            return &[];
        };
        if hi < self.min() {
            return &[];
        }

        let first = self.locate(lo.max(self.min())).unwrap_or(0);
        let end = self.slots.partition_point(|s| s.bounds.lower <= hi);
        &self.slots[first..end]
    }
}
