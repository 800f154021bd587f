//! rangestore - a date-range partitioned record store
//!
//! Records are routed to partitions by a date key. Each partition keeps its
//! own secondary indexes, and a shared interval set rejects overlapping
//! reservations within a group. Queries are pruned to the partitions their
//! date predicates can reach, planned per partition, and merged.

pub mod cli;
pub mod engine;
pub mod errors;
pub mod executor;
pub mod index;
pub mod interval;
pub mod observability;
pub mod partition;
pub mod planner;
pub mod schema;

mod sync;
