//! Query planner
//!
//! A query moves through `Parsed -> Pruned -> PlannedPerPartition ->
//! Executing -> Merged`. This module covers the first three: validation
//! against the schema, partition-key range extraction for pruning, and
//! per-partition access-path selection. Execution and merging live in
//! `executor`.
//!
//! # Design Principles
//!
//! - Deterministic: same query and data, same plan
//! - Pruning never changes results, only what is visited
//! - Every term not enforced by the access path is re-checked per record

mod ast;
mod bounds;
mod errors;
mod explain;
mod planner;

pub use ast::{CompareOp, Query, SortDirection, SortSpec, Term};
pub use bounds::KeyRangeExtractor;
pub use errors::{PlannerError, PlannerResult};
pub use explain::{ExplainTrace, MergeStrategy, PartitionTrace};
pub use planner::{AccessPath, AccessPlan, QueryPlanner};
