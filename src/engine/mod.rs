//! Engine facade
//!
//! Single entry point for writes, queries, partition and index
//! administration, and post-write hooks.
//!
//! # Guarantees
//!
//! - A write is all-or-nothing: a rejected insert, update or delete leaves
//!   records, indexes and the interval set as they were
//! - Two reservations of the same group never overlap, whichever partitions
//!   their records live in
//! - Queries see one boundary table for their whole run

mod config;
mod engine;
mod errors;
mod hooks;

pub use config::EngineConfig;
pub use engine::{Engine, IndexUsage};
pub use errors::{ConfigError, EngineError, EngineResult, HookError};
pub use hooks::{GroupSummary, GroupTotals, PostWriteHook, WriteEvent};
