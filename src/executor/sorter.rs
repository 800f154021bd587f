//! Result ordering
//!
//! Rows compare by sort key in the requested direction, then by record id
//! ascending, so every ordering is total and deterministic. `Null` is the
//! smallest key: first ascending, last descending.

use std::cmp::Ordering;

use super::result::ResultRow;
use crate::planner::SortDirection;

/// Sorts result rows
pub struct ResultSorter;

impl ResultSorter {
    pub fn compare(a: &ResultRow, b: &ResultRow, direction: SortDirection) -> Ordering {
        let by_key = match direction {
            SortDirection::Asc => a.sort_key.cmp(&b.sort_key),
            SortDirection::Desc => b.sort_key.cmp(&a.sort_key),
        };
        by_key.then_with(|| a.id.cmp(&b.id))
    }

    /// Full sort
    pub fn sort(rows: &mut [ResultRow], direction: SortDirection) {
        rows.sort_by(|a, b| Self::compare(a, b, direction));
    }

    /// Keeps the first `k` rows in order, discarding the rest without
    /// sorting them
    pub fn top_k(rows: &mut Vec<ResultRow>, k: usize, direction: SortDirection) {
        if k == 0 {
            rows.clear();
            return;
        }
        if rows.len() > k {
            rows.select_nth_unstable_by(k - 1, |a, b| Self::compare(a, b, direction));
            rows.truncate(k);
        }
        Self::sort(rows, direction);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{RecordId, Value};

    fn row(id: &str, key: Value) -> ResultRow {
        ResultRow::new(RecordId::new(id), key)
    }

    fn ids(rows: &[ResultRow]) -> Vec<&str> {
        rows.iter().map(|r| r.id.as_str()).collect()
    }

    fn sample() -> Vec<ResultRow> {
        vec![
            row("c", Value::Int(30)),
            row("a", Value::Int(20)),
            row("n", Value::Null),
            row("b", Value::Int(20)),
            row("d", Value::Int(25)),
        ]
    }

    #[test]
    fn test_sort_ascending_nulls_first() {
        let mut rows = sample();
        ResultSorter::sort(&mut rows, SortDirection::Asc);
        assert_eq!(ids(&rows), vec!["n", "a", "b", "d", "c"]);
    }

    #[test]
    fn test_sort_descending_ties_by_id() {
        let mut rows = sample();
        ResultSorter::sort(&mut rows, SortDirection::Desc);
        assert_eq!(ids(&rows), vec!["c", "d", "a", "b", "n"]);
    }

    #[test]
    fn test_top_k_matches_sort_prefix() {
        for k in 0..7 {
            for direction in [SortDirection::Asc, SortDirection::Desc] {
                let mut full = sample();
                ResultSorter::sort(&mut full, direction);
                full.truncate(k);

                let mut top = sample();
                ResultSorter::top_k(&mut top, k, direction);
                assert_eq!(top, full, "k={} {:?}", k, direction);
            }
        }
    }
}
