//! Planner error types
//!
//! Codes:
//! - RANGE_NO_SUCH_COLUMN (REJECT)
//! - RANGE_INVALID_PREDICATE (REJECT)

use std::fmt;

use crate::errors::{ErrorCode, Severity};
use crate::index::IndexError;

/// Planner error with context
#[derive(Debug, Clone)]
pub struct PlannerError {
    code: ErrorCode,
    message: String,
    column: Option<String>,
}

impl PlannerError {
    /// Term or ordering on a column the schema does not declare
    pub fn no_such_column(column: impl Into<String>) -> Self {
        let column = column.into();
        Self {
            code: ErrorCode::NoSuchColumn,
            message: format!("Column '{}' is not declared", column),
            column: Some(column),
        }
    }

    /// Null literal in a comparison
    pub fn null_literal(column: impl Into<String>) -> Self {
        let column = column.into();
        Self {
            code: ErrorCode::InvalidPredicate,
            message: format!("Comparison on '{}' uses a null literal", column),
            column: Some(column),
        }
    }

    /// Literal whose type differs from the column's
    pub fn literal_type(column: impl Into<String>, expected: &str, found: &str) -> Self {
        let column = column.into();
        Self {
            code: ErrorCode::InvalidPredicate,
            message: format!(
                "Column '{}' is {} but the literal is {}",
                column, expected, found
            ),
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

    pub fn column(&self) -> Option<&str> {
        self.column.as_deref()
    }
}

impl From<IndexError> for PlannerError {
    fn from(err: IndexError) -> Self {
        Self {
            code: err.code(),
            message: err.message().to_string(),
            column: None,
        }
    }
}

impl fmt::Display for PlannerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}: {}", self.severity(), self.code, self.message)
    }
}

impl std::error::Error for PlannerError {}

/// Result type for planner operations
pub type PlannerResult<T> = Result<T, PlannerError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_codes() {
        assert_eq!(PlannerError::no_such_column("x").code(), ErrorCode::NoSuchColumn);
        assert_eq!(PlannerError::null_literal("x").code(), ErrorCode::InvalidPredicate);
        assert_eq!(
            PlannerError::literal_type("x", "int", "text").code(),
            ErrorCode::InvalidPredicate
        );
    }

    #[test]
    fn test_error_display() {
        let err = PlannerError::no_such_column("guest_name");
        let display = format!("{}", err);
        assert!(display.contains("RANGE_NO_SUCH_COLUMN"));
        assert!(display.contains("guest_name"));
        assert_eq!(err.column(), Some("guest_name"));
    }
}
