//! Interval Set Property Tests
//!
//! Tests for interval invariants:
//! - Accepted intervals never overlap and stay sorted by start
//! - A rejected reservation leaves the set unchanged
//! - Overlap queries agree with a linear scan and can be replayed

use chrono::{Days, NaiveDate};
use proptest::prelude::*;
use rangestore::errors::ErrorCode;
use rangestore::interval::IntervalSet;
use rangestore::schema::Interval;

fn day(offset: u64) -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 1, 1)
        .unwrap()
        .checked_add_days(Days::new(offset))
        .unwrap()
}

fn arb_interval() -> impl Strategy<Value = (u64, u64)> {
    (0u64..200, 1u64..15).prop_map(|(start, len)| (start, start + len))
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(128))]

    /// The set holds exactly the accepted intervals, sorted and disjoint
    #[test]
    fn prop_accepts_exactly_non_overlapping(
        candidates in prop::collection::vec(arb_interval(), 0..60),
    ) {
        let mut set = IntervalSet::new();
        let mut accepted: Vec<Interval> = Vec::new();

        for (start, end) in candidates {
            let candidate = Interval::new(day(start), day(end)).unwrap();
            let clashes = accepted.iter().any(|iv| iv.overlaps(&candidate));
            let before = set.intervals("P1").to_vec();

            match set.try_reserve("P1", day(start), day(end)) {
                Ok(iv) => {
                    prop_assert!(!clashes);
                    accepted.push(iv);
                }
                Err(e) => {
                    prop_assert!(clashes);
                    prop_assert_eq!(e.code(), ErrorCode::Conflict);
                    prop_assert_eq!(set.intervals("P1"), before.as_slice());
                }
            }
        }

        accepted.sort_by_key(|iv| iv.start());
        prop_assert_eq!(set.intervals("P1"), accepted.as_slice());
        for pair in accepted.windows(2) {
            prop_assert!(pair[0].end() <= pair[1].start());
        }
    }

    /// Overlap queries return what a linear scan finds, in start order
    #[test]
    fn prop_overlapping_matches_scan(
        candidates in prop::collection::vec(arb_interval(), 0..60),
        window in arb_interval(),
    ) {
        let mut set = IntervalSet::new();
        for (start, end) in candidates {
            let _ = set.try_reserve("P1", day(start), day(end));
        }

        let query = Interval::new(day(window.0), day(window.1)).unwrap();
        let expected: Vec<Interval> = set
            .intervals("P1")
            .iter()
            .copied()
            .filter(|iv| iv.overlaps(&query))
            .collect();

        let mut found = set.overlapping("P1", query.start(), query.end()).unwrap();
        let first: Vec<Interval> = found.by_ref().collect();
        prop_assert_eq!(&first, &expected);

        found.restart();
        let again: Vec<Interval> = found.collect();
        prop_assert_eq!(again, expected);
    }

    /// Reserve then release returns the set to its previous state
    #[test]
    fn prop_release_undoes_reserve(
        candidates in prop::collection::vec(arb_interval(), 0..30),
        extra in arb_interval(),
    ) {
        let mut set = IntervalSet::new();
        for (start, end) in candidates {
            let _ = set.try_reserve("P1", day(start), day(end));
        }
        let before = set.intervals("P1").to_vec();

        if set.try_reserve("P1", day(extra.0), day(extra.1)).is_ok() {
            set.release("P1", day(extra.0), day(extra.1)).unwrap();
        }
        prop_assert_eq!(set.intervals("P1"), before.as_slice());
    }
}

#[test]
fn test_release_requires_exact_match() {
    let mut set = IntervalSet::new();
    set.try_reserve("P1", day(0), day(5)).unwrap();

    let err = set.release("P1", day(0), day(4)).unwrap_err();
    assert_eq!(err.code(), ErrorCode::NotFound);
    let err = set.release("P2", day(0), day(5)).unwrap_err();
    assert_eq!(err.code(), ErrorCode::NotFound);

    set.release("P1", day(0), day(5)).unwrap();
    assert!(set.is_empty());
}

#[test]
fn test_zero_length_rejected() {
    let mut set = IntervalSet::new();
    let err = set.try_reserve("P1", day(3), day(3)).unwrap_err();
    assert_eq!(err.code(), ErrorCode::InvalidInterval);
    let err = set.overlapping("P1", day(3), day(1)).unwrap_err();
    assert_eq!(err.code(), ErrorCode::InvalidInterval);
}
