//! Interval set error types
//!
//! Codes:
//! - RANGE_CONFLICT (REJECT)
//! - RANGE_INVALID_INTERVAL (REJECT)
//! - RANGE_NOT_FOUND (REJECT)

use std::fmt;

use crate::errors::{ErrorCode, Severity};
use crate::schema::{Interval, SchemaError};

/// Interval set error
#[derive(Debug, Clone)]
pub struct IntervalError {
    code: ErrorCode,
    message: String,
    /// Committed interval that blocked a reservation
    existing: Option<Interval>,
}

impl IntervalError {
    pub fn conflict(group: &str, candidate: Interval, existing: Interval) -> Self {
        Self {
            code: ErrorCode::Conflict,
            message: format!(
                "Interval {} for '{}' overlaps committed {}",
                candidate, group, existing
            ),
            existing: Some(existing),
        }
    }

    pub fn not_found(group: &str, interval: Interval) -> Self {
        Self {
            code: ErrorCode::NotFound,
            message: format!("No interval {} reserved for '{}'", interval, group),
            existing: None,
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

    /// Interval that caused a conflict
    pub fn existing(&self) -> Option<Interval> {
        self.existing
    }
}

impl From<SchemaError> for IntervalError {
    fn from(err: SchemaError) -> Self {
        Self {
            code: err.code(),
            message: err.message().to_string(),
            existing: None,
        }
    }
}

impl fmt::Display for IntervalError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}: {}", self.severity(), self.code, self.message)
    }
}

impl std::error::Error for IntervalError {}

/// Result type for interval set operations
pub type IntervalResult<T> = Result<T, IntervalError>;
