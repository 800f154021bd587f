//! Date-range partitioning
//!
//! The relation is split into contiguous half-open date ranges. Exactly one
//! partition (the catch-all) has no upper bound.
//!
//! # Concurrency
//!
//! - Each partition sits behind its own `RwLock` (many readers, one writer)
//! - The boundary table is copy-on-write: structural changes build a new
//!   table and swap it in under a brief lock, so readers holding the old
//!   table are never blocked or see a half-built table
//! - A partition replaced by a split or drop is marked retired; a writer
//!   that finds its target retired re-reads the table and retries
//!
//! # Invariants
//!
//! - `lower_i == upper_{i-1}` for adjacent partitions
//! - Exactly the last partition has no upper bound
//! - A record lives in the partition whose range contains its key

mod boundary;
mod errors;
mod manager;
mod partition;

pub use boundary::{BoundaryTable, KeyRange, PartitionBounds, PartitionSlot};
pub use errors::{PartitionError, PartitionResult};
pub use manager::{IndexScope, PartitionInfo, PartitionManager, SplitInterval};
pub use partition::{Partition, PartitionId};
