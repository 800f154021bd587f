//! Schema error types
//!
//! Codes:
//! - RANGE_INVALID_INTERVAL (REJECT)
//! - RANGE_INVALID_RECORD (REJECT)
//! - RANGE_NO_SUCH_COLUMN (REJECT)

use std::fmt;

use crate::errors::{ErrorCode, Severity};

/// Schema error with context
#[derive(Debug, Clone)]
pub struct SchemaError {
    code: ErrorCode,
    message: String,
    column: Option<String>,
}

impl SchemaError {
    /// Interval whose start is not strictly before its end
    pub fn invalid_interval(start: impl fmt::Display, end: impl fmt::Display) -> Self {
        Self {
            code: ErrorCode::InvalidInterval,
            message: format!("Interval [{}, {}) is empty or reversed", start, end),
            column: None,
        }
    }

    /// Record that does not fit the relation schema
    pub fn invalid_record(reason: impl Into<String>) -> Self {
        Self {
            code: ErrorCode::InvalidRecord,
            message: reason.into(),
            column: None,
        }
    }

    /// Attribute value of the wrong type
    pub fn type_mismatch(column: impl Into<String>, expected: &str, found: &str) -> Self {
        let column = column.into();
        Self {
            code: ErrorCode::InvalidRecord,
            message: format!(
                "Column '{}' expects {} but got {}",
                column, expected, found
            ),
            column: Some(column),
        }
    }

    /// Attribute not declared by the schema
    pub fn no_such_column(column: impl Into<String>) -> Self {
        let column = column.into();
        Self {
            code: ErrorCode::NoSuchColumn,
            message: format!("Column '{}' is not declared", column),
            column: Some(column),
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

    /// Column involved, if any
    pub fn column(&self) -> Option<&str> {
        self.column.as_deref()
    }
}

impl fmt::Display for SchemaError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}: {}", self.severity(), self.code, self.message)
    }
}

impl std::error::Error for SchemaError {}

/// Result type for schema operations
pub type SchemaResult<T> = Result<T, SchemaError>;
