//! Per-group interval bookkeeping
//!
//! Answers "does this interval collide with anything already reserved for
//! the same group?" and "which reservations intersect this window?".
//!
//! # Invariants
//!
//! - Intervals of one group never overlap (half-open semantics)
//! - Intervals of one group are kept sorted by start
//! - A rejected reservation leaves the set untouched

mod errors;
mod set;

pub use errors::{IntervalError, IntervalResult};
pub use set::{IntervalSet, Overlapping};
