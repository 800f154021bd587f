//! Executor error types
//!
//! Codes:
//! - RANGE_DEADLINE_EXCEEDED (ERROR)
//! - RANGE_AMBIGUOUS_ORDERING (REJECT)
//! - plus planner and index codes passed through

use std::fmt;

use crate::errors::{ErrorCode, Severity};
use crate::index::IndexError;
use crate::planner::PlannerError;

/// Executor error with context
#[derive(Debug, Clone)]
pub struct ExecutorError {
    code: ErrorCode,
    message: String,
}

impl ExecutorError {
    /// Deadline passed; nothing from the partial run is returned
    pub fn deadline_exceeded(visited: usize, candidates: usize) -> Self {
        Self {
            code: ErrorCode::DeadlineExceeded,
            message: format!(
                "Deadline passed after {} of {} partitions",
                visited, candidates
            ),
        }
    }

    /// Unindexed ordering over more rows than may be sorted in memory
    pub fn ambiguous_ordering(column: &str, rows: usize, threshold: usize) -> Self {
        Self {
            code: ErrorCode::AmbiguousOrdering,
            message: format!(
                "Ordering by unindexed column '{}' over {} rows exceeds the sort threshold {}; add a limit or an index",
                column, rows, threshold
            ),
        }
    }

    pub fn code(&self) -> ErrorCode {
        self.code
    }

    pub fn severity(&self) -> Severity {
        self.code.severity()
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

impl From<PlannerError> for ExecutorError {
    fn from(err: PlannerError) -> Self {
        Self {
            code: err.code(),
            message: err.message().to_string(),
        }
    }
}

impl From<IndexError> for ExecutorError {
    fn from(err: IndexError) -> Self {
        Self {
            code: err.code(),
            message: err.message().to_string(),
        }
    }
}

impl fmt::Display for ExecutorError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}: {}", self.severity(), self.code, self.message)
    }
}

impl std::error::Error for ExecutorError {}

/// Result type for executor operations
pub type ExecutorResult<T> = Result<T, ExecutorError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deadline_is_runtime_error() {
        let err = ExecutorError::deadline_exceeded(1, 3);
        assert_eq!(err.code(), ErrorCode::DeadlineExceeded);
        assert_eq!(err.severity(), Severity::Error);
        assert!(format!("{}", err).starts_with("[ERROR] RANGE_DEADLINE_EXCEEDED"));
    }

    #[test]
    fn test_planner_codes_pass_through() {
        let err: ExecutorError = PlannerError::no_such_column("x").into();
        assert_eq!(err.code(), ErrorCode::NoSuchColumn);
        assert_eq!(err.severity(), Severity::Reject);
    }
}
