//! Secondary indexes
//!
//! Every partition carries its own index instances, built from definitions
//! shared across partitions. An index maps a composite key (the record's
//! values for the indexed columns, in declared order) to the ids of the
//! records holding that key.
//!
//! # Invariants
//!
//! - Every record of the partition appears in every index exactly once
//! - Buckets keep record ids in insertion order
//! - Missing attributes index as `Null`, which sorts before every value
//! - Lookups never return a record whose key falls outside the request

mod btree;
mod errors;
mod manager;

pub use btree::{ColumnRange, IndexKey, IndexTree};
pub use errors::{IndexError, IndexResult};
pub use manager::{IndexDefinition, IndexId, IndexManager};
