//! Residual term filtering
//!
//! Terms are conjunctive. A missing attribute reads as `Null`, which no
//! comparison accepts.

use crate::planner::Term;
use crate::schema::Record;

/// Evaluates terms against records
pub struct RecordFilter;

impl RecordFilter {
    /// True if `record` satisfies every term
    pub fn matches(record: &Record, terms: &[Term]) -> bool {
        terms
            .iter()
            .all(|term| term.op.matches(record.value(&term.column)))
    }
}
