//! Engine error types
//!
//! `EngineError` wraps every subsystem error. `code()` always answers from
//! the shared taxonomy, whichever layer failed.

use std::path::PathBuf;

use thiserror::Error;

use crate::errors::{ErrorCode, Severity};
use crate::executor::ExecutorError;
use crate::index::IndexError;
use crate::interval::IntervalError;
use crate::partition::PartitionError;
use crate::planner::PlannerError;
use crate::schema::{RecordId, SchemaError};

/// Result type for engine operations
pub type EngineResult<T> = Result<T, EngineError>;

/// Configuration loading and validation errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Cannot read config {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Malformed config: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Invalid config: {0}")]
    Invalid(String),
}

/// Error reported by a post-write hook
#[derive(Debug, Clone, Error)]
#[error("Hook '{hook}' failed: {message}")]
pub struct HookError {
    pub hook: String,
    pub message: String,
}

impl HookError {
    pub fn new(hook: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            hook: hook.into(),
            message: message.into(),
        }
    }
}

/// Errors returned by the engine facade
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("{0}")]
    Schema(#[from] SchemaError),

    #[error("{0}")]
    Interval(#[from] IntervalError),

    #[error("{0}")]
    Index(#[from] IndexError),

    #[error("{0}")]
    Partition(#[from] PartitionError),

    #[error("{0}")]
    Planner(#[from] PlannerError),

    #[error("{0}")]
    Executor(#[from] ExecutorError),

    #[error("[REJECT] RANGE_NOT_FOUND: Record {0} does not exist")]
    RecordNotFound(RecordId),

    #[error("[REJECT] RANGE_DUPLICATE_RECORD: Record {0} already exists")]
    DuplicateRecord(RecordId),

    #[error("[REJECT] RANGE_INVALID_CONFIG: {0}")]
    Config(#[from] ConfigError),

    #[error("[ERROR] RANGE_HOOK_FAILED: {0}")]
    Hook(#[from] HookError),
}

impl EngineError {
    pub fn code(&self) -> ErrorCode {
        match self {
            EngineError::Schema(e) => e.code(),
            EngineError::Interval(e) => e.code(),
            EngineError::Index(e) => e.code(),
            EngineError::Partition(e) => e.code(),
            EngineError::Planner(e) => e.code(),
            EngineError::Executor(e) => e.code(),
            EngineError::RecordNotFound(_) => ErrorCode::NotFound,
            EngineError::DuplicateRecord(_) => ErrorCode::DuplicateRecord,
            EngineError::Config(_) => ErrorCode::InvalidConfig,
            EngineError::Hook(_) => ErrorCode::HookFailed,
        }
    }

    pub fn severity(&self) -> Severity {
        self.code().severity()
    }

    /// Message without the severity and code prefix
    pub fn message(&self) -> String {
        match self {
            EngineError::Schema(e) => e.message().to_string(),
            EngineError::Interval(e) => e.message().to_string(),
            EngineError::Index(e) => e.message().to_string(),
            EngineError::Partition(e) => e.message().to_string(),
            EngineError::Planner(e) => e.message().to_string(),
            EngineError::Executor(e) => e.message().to_string(),
            EngineError::RecordNotFound(id) => format!("Record {} does not exist", id),
            EngineError::DuplicateRecord(id) => format!("Record {} already exists", id),
            EngineError::Config(e) => e.to_string(),
            EngineError::Hook(e) => e.to_string(),
        }
    }
}
