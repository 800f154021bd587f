//! BTreeMap-backed composite index structure
//!
//! `IndexTree` maps an `IndexKey` to the ids of the records holding it.
//! Keys compare lexicographically, so all keys sharing an equality prefix
//! form one contiguous run ordered by the next column.

use std::collections::BTreeMap;
use std::ops::Bound;

use serde::{Deserialize, Serialize};

use crate::schema::{RecordId, Value};

/// Composite index key: one value per indexed column, in declared order
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct IndexKey(Vec<Value>);

impl IndexKey {
    pub fn new(values: Vec<Value>) -> Self {
        Self(values)
    }

    pub fn values(&self) -> &[Value] {
        &self.0
    }
}

/// Bound on a single column.
///
/// `Null` never satisfies a range, whichever bounds are set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnRange {
    pub lower: Bound<Value>,
    pub upper: Bound<Value>,
}

impl ColumnRange {
    /// Matches every non-null value
    pub fn unbounded() -> Self {
        Self {
            lower: Bound::Unbounded,
            upper: Bound::Unbounded,
        }
    }

    pub fn at_least(v: Value) -> Self {
        Self {
            lower: Bound::Included(v),
            upper: Bound::Unbounded,
        }
    }

    pub fn greater_than(v: Value) -> Self {
        Self {
            lower: Bound::Excluded(v),
            upper: Bound::Unbounded,
        }
    }

    pub fn at_most(v: Value) -> Self {
        Self {
            lower: Bound::Unbounded,
            upper: Bound::Included(v),
        }
    }

    pub fn less_than(v: Value) -> Self {
        Self {
            lower: Bound::Unbounded,
            upper: Bound::Excluded(v),
        }
    }

    /// Inclusive on both ends
    pub fn between(lo: Value, hi: Value) -> Self {
        Self {
            lower: Bound::Included(lo),
            upper: Bound::Included(hi),
        }
    }

    /// Narrowest range satisfying both `self` and `other`
    pub fn intersect(self, other: ColumnRange) -> ColumnRange {
        ColumnRange {
            lower: tighter_lower(self.lower, other.lower),
            upper: tighter_upper(self.upper, other.upper),
        }
    }

    pub fn above_lower(&self, v: &Value) -> bool {
        match &self.lower {
            Bound::Included(lo) => v >= lo,
            Bound::Excluded(lo) => v > lo,
            Bound::Unbounded => true,
        }
    }

    pub fn below_upper(&self, v: &Value) -> bool {
        match &self.upper {
            Bound::Included(hi) => v <= hi,
            Bound::Excluded(hi) => v < hi,
            Bound::Unbounded => true,
        }
    }

    pub fn contains(&self, v: &Value) -> bool {
        !v.is_null() && self.above_lower(v) && self.below_upper(v)
    }
}

fn tighter_lower(a: Bound<Value>, b: Bound<Value>) -> Bound<Value> {
    match (a, b) {
        (Bound::Unbounded, other) | (other, Bound::Unbounded) => other,
        (Bound::Included(x), Bound::Included(y)) => Bound::Included(x.max(y)),
        (Bound::Excluded(x), Bound::Excluded(y)) => Bound::Excluded(x.max(y)),
        (Bound::Included(inc), Bound::Excluded(exc))
        | (Bound::Excluded(exc), Bound::Included(inc)) => {
            if inc > exc {
                Bound::Included(inc)
            } else {
                Bound::Excluded(exc)
            }
        }
    }
}

fn tighter_upper(a: Bound<Value>, b: Bound<Value>) -> Bound<Value> {
    match (a, b) {
        (Bound::Unbounded, other) | (other, Bound::Unbounded) => other,
        (Bound::Included(x), Bound::Included(y)) => Bound::Included(x.min(y)),
        (Bound::Excluded(x), Bound::Excluded(y)) => Bound::Excluded(x.min(y)),
        (Bound::Included(inc), Bound::Excluded(exc))
        | (Bound::Excluded(exc), Bound::Included(inc)) => {
            if inc < exc {
                Bound::Included(inc)
            } else {
                Bound::Excluded(exc)
            }
        }
    }
}

/// Ordered map from composite key to record-id bucket
#[derive(Debug, Default)]
pub struct IndexTree {
    tree: BTreeMap<IndexKey, Vec<RecordId>>,
    entries: usize,
}

impl IndexTree {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends `id` to the bucket for `key`
    pub fn insert(&mut self, key: IndexKey, id: RecordId) {
        self.tree.entry(key).or_default().push(id);
        self.entries += 1;
    }

    /// Removes `id` from the bucket for `key`.
    ///
    /// Returns false (and changes nothing) if the id is not in that bucket.
    pub fn remove(&mut self, key: &IndexKey, id: &RecordId) -> bool {
        let Some(bucket) = self.tree.get_mut(key) else {
            return false;
        };
        let Some(pos) = bucket.iter().position(|existing| existing == id) else {
            return false;
        };

        bucket.remove(pos);
        if bucket.is_empty() {
            self.tree.remove(key);
        }
        self.entries -= 1;
        true
    }

    /// Buckets whose key starts with `prefix` and whose next column lies in
    /// `range`, in key order.
    ///
    /// `range` applies to column `prefix.len()`; a key without that column
    /// never matches a range.
    pub fn seek<'a>(
        &'a self,
        prefix: &'a [Value],
        range: Option<&'a ColumnRange>,
    ) -> impl Iterator<Item = (&'a IndexKey, &'a [RecordId])> + 'a {
        let p = prefix.len();
        let mut start = prefix.to_vec();
        if let Some(r) = range {
            match &r.lower {
                Bound::Included(v) | Bound::Excluded(v) => start.push(v.clone()),
                Bound::Unbounded => {}
            }
        }

        self.tree
            .range((Bound::Included(IndexKey(start)), Bound::Unbounded))
            .take_while(move |(key, _)| {
                key.0.starts_with(prefix)
                    && range.map_or(true, |r| key.0.get(p).map_or(false, |v| r.below_upper(v)))
            })
            .filter(move |(key, _)| {
                range.map_or(true, |r| key.0.get(p).map_or(false, |v| r.contains(v)))
            })
            .map(|(key, ids)| (key, ids.as_slice()))
    }

    /// Record ids matching `prefix` + `range`, key order then insertion order
    pub fn lookup(&self, prefix: &[Value], range: Option<&ColumnRange>) -> Vec<RecordId> {
        self.seek(prefix, range)
            .flat_map(|(_, ids)| ids.iter().cloned())
            .collect()
    }

    /// Number of record ids matching `prefix` + `range`
    pub fn count(&self, prefix: &[Value], range: Option<&ColumnRange>) -> usize {
        self.seek(prefix, range).map(|(_, ids)| ids.len()).sum()
    }

    /// Number of distinct keys
    pub fn key_count(&self) -> usize {
        self.tree.len()
    }

    /// Number of record ids across all buckets
    pub fn entry_count(&self) -> usize {
        self.entries
    }
}
