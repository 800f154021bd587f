//! Sorted, non-overlapping interval lists keyed by group

use std::collections::HashMap;

use chrono::NaiveDate;

use super::errors::{IntervalError, IntervalResult};
use crate::schema::Interval;

/// Committed intervals per grouping key
#[derive(Debug, Default, Clone)]
pub struct IntervalSet {
    groups: HashMap<String, Vec<Interval>>,
}

impl IntervalSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reserves `[start, end)` for `group`.
    ///
    /// Check and insert happen in one call on `&mut self`; callers sharing
    /// the set must hold its write lock across the call.
    pub fn try_reserve(
        &mut self,
        group: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> IntervalResult<Interval> {
        let interval = Interval::new(start, end)?;
        self.reserve(group, interval)?;
        Ok(interval)
    }

    /// Reserves an already validated interval
    pub fn reserve(&mut self, group: &str, interval: Interval) -> IntervalResult<()> {
        let list = self.groups.get(group).map(Vec::as_slice).unwrap_or(&[]);
        let pos = list.partition_point(|iv| iv.start() < interval.start());

        // Only the neighbours can overlap in a sorted non-overlapping list.
        if pos > 0 && list[pos - 1].overlaps(&interval) {
            return Err(IntervalError::conflict(group, interval, list[pos - 1]));
        }
        if let Some(next) = list.get(pos) {
            if next.overlaps(&interval) {
                return Err(IntervalError::conflict(group, interval, *next));
            }
        }

        self.groups
            .entry(group.to_string())
            .or_default()
            .insert(pos, interval);
        Ok(())
    }

    /// Removes the exact interval `[start, end)` from `group`
    pub fn release(&mut self, group: &str, start: NaiveDate, end: NaiveDate) -> IntervalResult<()> {
        let interval = Interval::new(start, end)?;
        self.release_interval(group, interval)
    }

    pub fn release_interval(&mut self, group: &str, interval: Interval) -> IntervalResult<()> {
        let Some(list) = self.groups.get_mut(group) else {
            return Err(IntervalError::not_found(group, interval));
        };

        let pos = list.partition_point(|iv| iv.start() < interval.start());
        if list.get(pos) != Some(&interval) {
            return Err(IntervalError::not_found(group, interval));
        }

        list.remove(pos);
        if list.is_empty() {
            self.groups.remove(group);
        }
        Ok(())
    }

    /// Committed intervals of `group` intersecting `[start, end)`
    pub fn overlapping(
        &self,
        group: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> IntervalResult<Overlapping<'_>> {
        let query = Interval::new(start, end)?;
        let list = self.intervals(group);
        // Ends are sorted too because the list never overlaps.
        let first = list.partition_point(|iv| iv.end() <= query.start());
        Ok(Overlapping {
            intervals: list,
            query,
            first,
            pos: first,
        })
    }

    /// All committed intervals of `group`, sorted by start
    pub fn intervals(&self, group: &str) -> &[Interval] {
        self.groups.get(group).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Number of groups holding at least one interval
    pub fn group_count(&self) -> usize {
        self.groups.len()
    }

    /// Total committed intervals across all groups
    pub fn len(&self) -> usize {
        self.groups.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }
}

/// Lazy scan over the intervals intersecting a query window.
///
/// Stops at the first interval starting at or after the window's end.
/// Cloning (or calling [`Overlapping::restart`]) replays the scan.
#[derive(Debug, Clone)]
pub struct Overlapping<'a> {
    intervals: &'a [Interval],
    query: Interval,
    first: usize,
    pos: usize,
}

impl Overlapping<'_> {
    /// Rewinds to the first intersecting interval
    pub fn restart(&mut self) {
        self.pos = self.first;
    }
}

impl Iterator for Overlapping<'_> {
    type Item = Interval;

    fn next(&mut self) -> Option<Interval> {
        let iv = *self.intervals.get(self.pos)?;
        if iv.start() >= self.query.end() {
            return None;
        }
        self.pos += 1;
        Some(iv)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::ErrorCode;

    fn d(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    #[test]
    fn test_booking_scenario() {
        let mut set = IntervalSet::new();

        set.try_reserve("P1", d("2024-06-01"), d("2024-06-05")).unwrap();
        set.try_reserve("P1", d("2024-06-10"), d("2024-06-15")).unwrap();

        let err = set
            .try_reserve("P1", d("2024-06-03"), d("2024-06-04"))
            .unwrap_err();
        assert_eq!(err.code(), ErrorCode::Conflict);
        assert_eq!(
            err.existing(),
            Some(Interval::new(d("2024-06-01"), d("2024-06-05")).unwrap())
        );

        let hits: Vec<_> = set
            .overlapping("P1", d("2024-06-02"), d("2024-06-12"))
            .unwrap()
            .collect();
        assert_eq!(hits.len(), 2);
        assert_eq!(hits[0].start(), d("2024-06-01"));
        assert_eq!(hits[1].start(), d("2024-06-10"));
    }

    #[test]
    fn test_rejection_leaves_set_unchanged() {
        let mut set = IntervalSet::new();
        set.try_reserve("P1", d("2024-06-01"), d("2024-06-05")).unwrap();

        let before = set.intervals("P1").to_vec();
        assert!(set.try_reserve("P1", d("2024-05-30"), d("2024-06-02")).is_err());
        assert!(set.try_reserve("P1", d("2024-05-30"), d("2024-06-02")).is_err());
        assert_eq!(set.intervals("P1"), before.as_slice());
    }

    #[test]
    fn test_adjacent_intervals_allowed() {
        let mut set = IntervalSet::new();
        set.try_reserve("P1", d("2024-06-05"), d("2024-06-07")).unwrap();
        set.try_reserve("P1", d("2024-06-01"), d("2024-06-05")).unwrap();
        set.try_reserve("P1", d("2024-06-07"), d("2024-06-08")).unwrap();

        let starts: Vec<_> = set.intervals("P1").iter().map(|iv| iv.start()).collect();
        assert_eq!(starts, vec![d("2024-06-01"), d("2024-06-05"), d("2024-06-07")]);
    }

    #[test]
    fn test_groups_are_independent() {
        let mut set = IntervalSet::new();
        set.try_reserve("P1", d("2024-06-01"), d("2024-06-05")).unwrap();
        set.try_reserve("P2", d("2024-06-01"), d("2024-06-05")).unwrap();
        assert_eq!(set.group_count(), 2);
        assert_eq!(set.len(), 2);
    }

    #[test]
    fn test_zero_length_rejected() {
        let mut set = IntervalSet::new();
        let err = set
            .try_reserve("P1", d("2024-06-01"), d("2024-06-01"))
            .unwrap_err();
        assert_eq!(err.code(), ErrorCode::InvalidInterval);

        assert!(set.overlapping("P1", d("2024-06-01"), d("2024-06-01")).is_err());
    }

    #[test]
    fn test_release_requires_exact_match() {
        let mut set = IntervalSet::new();
        set.try_reserve("P1", d("2024-06-01"), d("2024-06-05")).unwrap();

        let err = set.release("P1", d("2024-06-01"), d("2024-06-04")).unwrap_err();
        assert_eq!(err.code(), ErrorCode::NotFound);

        set.release("P1", d("2024-06-01"), d("2024-06-05")).unwrap();
        assert!(set.is_empty());

        // Freed range can be booked again
        set.try_reserve("P1", d("2024-06-02"), d("2024-06-03")).unwrap();
    }

    #[test]
    fn test_overlapping_is_restartable() {
        let mut set = IntervalSet::new();
        set.try_reserve("P1", d("2024-06-01"), d("2024-06-05")).unwrap();
        set.try_reserve("P1", d("2024-06-06"), d("2024-06-08")).unwrap();
        set.try_reserve("P1", d("2024-07-01"), d("2024-07-08")).unwrap();

        let mut scan = set.overlapping("P1", d("2024-06-04"), d("2024-06-07")).unwrap();
        let first: Vec<_> = scan.by_ref().collect();
        assert_eq!(first.len(), 2);
        assert_eq!(scan.next(), None);

        scan.restart();
        let second: Vec<_> = scan.collect();
        assert_eq!(first, second);
    }

    #[test]
    fn test_overlapping_unknown_group_is_empty() {
        let set = IntervalSet::new();
        let mut scan = set.overlapping("nobody", d("2024-01-01"), d("2025-01-01")).unwrap();
        assert_eq!(scan.next(), None);
    }
}
