//! Query executor
//!
//! Consumes per-partition plans and produces ordered, limited results.
//!
//! # Execution Flow (strict order)
//!
//! 1. Validate the query against the schema
//! 2. Prune partitions on the partition-key range
//! 3. Per partition: plan, fetch by index or scan, apply residual terms
//! 4. Merge per-partition results
//! 5. Apply limit
//!
//! # Invariants
//!
//! - Pruning and index choice never change the result set
//! - Orderings are total: ties break by record id
//! - A missed deadline returns an error, never a truncated result

mod errors;
mod executor;
mod filters;
mod result;
mod sorter;

pub use errors::{ExecutorError, ExecutorResult};
pub use executor::QueryExecutor;
pub use filters::RecordFilter;
pub use result::{QueryResult, ResultRow};
pub use sorter::ResultSorter;
