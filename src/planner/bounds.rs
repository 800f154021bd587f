//! Partition-key range extraction
//!
//! Only terms on the partition column contribute. Terms are conjunctive, so
//! their ranges intersect; a query with no such term constrains nothing and
//! every partition survives pruning.

use std::ops::Bound;

use super::ast::{CompareOp, Query};
use crate::partition::KeyRange;

/// Derives the `KeyRange` a query allows on the partition column
pub struct KeyRangeExtractor<'a> {
    partition_column: &'a str,
}

impl<'a> KeyRangeExtractor<'a> {
    pub fn new(partition_column: &'a str) -> Self {
        Self { partition_column }
    }

    pub fn extract(&self, query: &Query) -> KeyRange {
        query
            .terms
            .iter()
            .filter(|t| t.column == self.partition_column)
            .filter_map(|t| term_range(&t.op))
            .fold(KeyRange::all(), KeyRange::intersect)
    }
}

/// Range of dates a comparison admits. Non-date literals are rejected during
/// validation; here they just contribute nothing.
fn term_range(op: &CompareOp) -> Option<KeyRange> {
    let range = match op {
        CompareOp::Eq(v) => KeyRange::point(v.as_date()?),
        CompareOp::Lt(v) => KeyRange::new(Bound::Unbounded, Bound::Excluded(v.as_date()?)),
        CompareOp::Le(v) => KeyRange::new(Bound::Unbounded, Bound::Included(v.as_date()?)),
        CompareOp::Gt(v) => KeyRange::new(Bound::Excluded(v.as_date()?), Bound::Unbounded),
        CompareOp::Ge(v) => KeyRange::new(Bound::Included(v.as_date()?), Bound::Unbounded),
        CompareOp::Between(lo, hi) => {
            KeyRange::new(Bound::Included(lo.as_date()?), Bound::Included(hi.as_date()?))
        }
    };
    Some(range)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use crate::planner::ast::Term;

    fn d(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    #[test]
    fn test_no_partition_terms_is_unbounded() {
        let query = Query::new().with_term(Term::eq("property_id", 3));
        assert!(KeyRangeExtractor::new("check_in").extract(&query).is_unbounded());
    }

    #[test]
    fn test_between_is_inclusive() {
        let query =
            Query::new().with_term(Term::between("check_in", d("2024-06-01"), d("2024-08-31")));
        let range = KeyRangeExtractor::new("check_in").extract(&query);
        assert_eq!(range.inclusive_span(), Some((d("2024-06-01"), d("2024-08-31"))));
    }

    #[test]
    fn test_terms_intersect() {
        let query = Query::new()
            .with_term(Term::ge("check_in", d("2024-01-01")))
            .with_term(Term::lt("check_in", d("2024-03-01")))
            .with_term(Term::gt("check_in", d("2024-01-31")));
        let range = KeyRangeExtractor::new("check_in").extract(&query);
        assert_eq!(range.inclusive_span(), Some((d("2024-02-01"), d("2024-02-29"))));
    }

    #[test]
    fn test_contradiction_is_empty() {
        let query = Query::new()
            .with_term(Term::eq("check_in", d("2024-01-01")))
            .with_term(Term::eq("check_in", d("2024-01-02")));
        let range = KeyRangeExtractor::new("check_in").extract(&query);
        assert!(range.inclusive_span().is_none());
    }
}
