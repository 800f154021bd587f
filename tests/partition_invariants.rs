//! Partition Layout Invariant Tests
//!
//! Tests for partition invariants:
//! - Ranges stay sorted and gapless with exactly one catch-all
//! - Every record lives in the partition whose range contains its key
//! - insert_boundary then drop_partition restores the boundary set

use chrono::{Days, NaiveDate};
use proptest::prelude::*;
use rangestore::engine::{Engine, EngineConfig};
use rangestore::errors::ErrorCode;
use rangestore::partition::{PartitionInfo, SplitInterval};
use rangestore::planner::{Query, Term};
use rangestore::schema::{ColumnType, Record, RecordId, RelationSchema};

// =============================================================================
// Helper Functions
// =============================================================================

fn d(s: &str) -> NaiveDate {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
}

fn base() -> NaiveDate {
    d("2024-01-01")
}

fn day(offset: u64) -> NaiveDate {
    base().checked_add_days(Days::new(offset)).unwrap()
}

fn open(boundaries: Vec<NaiveDate>) -> Engine {
    let schema = RelationSchema::new("stay_date").with_column("guests", ColumnType::Int);
    Engine::open(EngineConfig::new(schema).with_boundaries(boundaries)).unwrap()
}

fn assert_layout(layout: &[PartitionInfo]) {
    assert!(!layout.is_empty());
    for pair in layout.windows(2) {
        assert_eq!(pair[0].bounds.upper, Some(pair[1].bounds.lower));
    }
    let open_ended = layout.iter().filter(|p| p.bounds.is_catch_all()).count();
    assert_eq!(open_ended, 1);
    assert!(layout.last().unwrap().bounds.is_catch_all());
}

fn boundaries(engine: &Engine) -> Vec<NaiveDate> {
    engine.partitions().iter().map(|p| p.bounds.lower).collect()
}

// =============================================================================
// Layout Tests
// =============================================================================

/// Boundary insertion keeps the layout contiguous and the records in place
#[test]
fn test_split_keeps_records_routed() {
    let engine = open(vec![day(0)]);
    for i in 0..20 {
        engine.insert(Record::new(format!("r{:02}", i), day(i * 10))).unwrap();
    }

    engine.insert_boundary(day(55)).unwrap();
    engine.insert_boundary(day(120)).unwrap();

    let layout = engine.partitions();
    assert_layout(&layout);
    let counts: Vec<_> = layout.iter().map(|p| p.record_count).collect();
    assert_eq!(counts, vec![6, 6, 8]);
}

/// Only the lowest partition and the one below the catch-all can be dropped
#[test]
fn test_drop_rules() {
    let engine = open(vec![day(0), day(10), day(20), day(30)]);
    let layout = engine.partitions();

    for interior in &layout[1..2] {
        let err = engine.drop_partition(interior.id).unwrap_err();
        assert_eq!(err.code(), ErrorCode::NonPruneable);
    }
    let err = engine.drop_partition(layout[3].id).unwrap_err();
    assert_eq!(err.code(), ErrorCode::NonPruneable);
    let err = engine.drop_partition(999).unwrap_err();
    assert_eq!(err.code(), ErrorCode::NotFound);

    engine.drop_partition(layout[2].id).unwrap();
    engine.drop_partition(layout[0].id).unwrap();
    // Each freed range went to the partition above it
    assert_eq!(boundaries(&engine), vec![day(0), day(20)]);
    assert_layout(&engine.partitions());
}

/// Boundary errors leave the layout untouched
#[test]
fn test_boundary_errors() {
    let engine = open(vec![day(0), day(10)]);

    let err = engine.insert_boundary(day(10)).unwrap_err();
    assert_eq!(err.code(), ErrorCode::BoundaryExists);

    let err = engine.insert_boundary(d("2023-12-31")).unwrap_err();
    assert_eq!(err.code(), ErrorCode::BoundaryBeforeMin);

    assert_eq!(boundaries(&engine), vec![day(0), day(10)]);
}

/// Auto split carves monthly partitions out of the catch-all
#[test]
fn test_auto_split_monthly() {
    let schema = RelationSchema::new("stay_date");
    let config = EngineConfig::new(schema)
        .with_boundaries(vec![d("2024-01-01")])
        .with_auto_split(SplitInterval::Months(1));
    let engine = Engine::open(config).unwrap();

    engine.insert(Record::new("jan", d("2024-01-20"))).unwrap();
    assert_eq!(engine.partitions().len(), 1);

    engine.insert(Record::new("apr", d("2024-04-02"))).unwrap();
    assert_eq!(
        boundaries(&engine),
        vec![d("2024-01-01"), d("2024-02-01"), d("2024-03-01"), d("2024-04-01")]
    );
    assert_layout(&engine.partitions());
}

// =============================================================================
// Property Tests
// =============================================================================

#[derive(Debug, Clone)]
enum Op {
    Split(u64),
    DropLowest,
    DropUpper,
}

fn arb_op() -> impl Strategy<Value = Op> {
    prop_oneof![
        3 => (1u64..400).prop_map(Op::Split),
        1 => Just(Op::DropLowest),
        1 => Just(Op::DropUpper),
    ]
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    /// Any mix of splits and legal drops keeps the layout gapless and every
    /// surviving record in the partition that owns its key.
    #[test]
    fn prop_layout_stays_contiguous(
        keys in prop::collection::vec(0u64..400, 0..40),
        ops in prop::collection::vec(arb_op(), 0..20),
    ) {
        let engine = open(vec![day(0)]);
        for (i, k) in keys.iter().enumerate() {
            engine.insert(Record::new(format!("r{}", i), day(*k))).unwrap();
        }

        for op in ops {
            let layout = engine.partitions();
            let result = match op {
                Op::Split(offset) => engine.insert_boundary(day(offset)).map(|_| ()),
                Op::DropLowest if layout.len() > 1 => engine.drop_partition(layout[0].id).map(|_| ()),
                Op::DropUpper if layout.len() > 1 => {
                    engine.drop_partition(layout[layout.len() - 2].id).map(|_| ())
                }
                _ => Ok(()),
            };
            if let Err(e) = result {
                prop_assert!(matches!(
                    e.code(),
                    ErrorCode::BoundaryExists | ErrorCode::BoundaryBeforeMin
                ));
            }
            assert_layout(&engine.partitions());
        }

        let layout = engine.partitions();
        let total: usize = layout.iter().map(|p| p.record_count).sum();
        prop_assert_eq!(total, engine.len());
        for (i, k) in keys.iter().enumerate() {
            let id = RecordId::new(format!("r{}", i));
            if engine.get(&id).is_err() {
                continue;
            }
            let owner = layout.iter().find(|p| p.bounds.contains(day(*k))).unwrap();
            let result = engine
                .query(&Query::new().with_term(Term::eq("stay_date", day(*k))))
                .unwrap();
            prop_assert_eq!(result.explain.partition_ids(), vec![owner.id]);
            prop_assert!(result.ids.contains(&id));
        }
    }

    /// Splitting at a new boundary and dropping the partition it returns
    /// restores the original boundary set whenever that drop is legal.
    #[test]
    fn prop_split_drop_round_trip(
        initial in prop::collection::btree_set(1u64..300, 1..5),
        split in 1u64..400,
    ) {
        let mut bounds: Vec<NaiveDate> = vec![day(0)];
        bounds.extend(initial.iter().map(|o| day(*o)));
        prop_assume!(!bounds.contains(&day(split)));
        let engine = open(bounds.clone());

        let id = engine.insert_boundary(day(split)).unwrap();
        let layout = engine.partitions();
        prop_assert_eq!(layout.len(), bounds.len() + 1);
        let pos = layout.iter().position(|p| p.id == id).unwrap();
        prop_assert_eq!(layout[pos].bounds.upper, Some(day(split)));

        match engine.drop_partition(id) {
            Ok(_) => prop_assert_eq!(boundaries(&engine), bounds),
            Err(e) => {
                prop_assert!(pos != 0 && pos + 2 != layout.len());
                prop_assert_eq!(e.code(), ErrorCode::NonPruneable);
            }
        }
        assert_layout(&engine.partitions());
    }
}

/// Splitting the catch-all and dropping the returned partition is a no-op
#[test]
fn test_catch_all_split_round_trip() {
    let engine = open(vec![day(0), day(10), day(20)]);
    let before = boundaries(&engine);

    let id = engine.insert_boundary(day(40)).unwrap();
    assert_eq!(engine.drop_partition(id).unwrap(), 0);
    assert_eq!(boundaries(&engine), before);

    // An interior split returns a partition that is not droppable
    let id = engine.insert_boundary(day(15)).unwrap();
    let err = engine.drop_partition(id).unwrap_err();
    assert_eq!(err.code(), ErrorCode::NonPruneable);
    assert_eq!(boundaries(&engine), vec![day(0), day(10), day(15), day(20)]);
}
