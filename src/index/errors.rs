//! Index error types
//!
//! Codes:
//! - RANGE_DUPLICATE_DEFINITION (REJECT)
//! - RANGE_NOT_FOUND (REJECT)
//! - RANGE_INVALID_PREDICATE (REJECT)

use std::fmt;

use crate::errors::{ErrorCode, Severity};

/// Index error with context
#[derive(Debug, Clone)]
pub struct IndexError {
    code: ErrorCode,
    message: String,
}

impl IndexError {
    pub fn duplicate_definition(columns: &[String]) -> Self {
        Self {
            code: ErrorCode::DuplicateDefinition,
            message: format!("Index on ({}) already exists", columns.join(", ")),
        }
    }

    pub fn unknown_index(id: u32) -> Self {
        Self {
            code: ErrorCode::NotFound,
            message: format!("Index {} is not defined", id),
        }
    }

    /// Lookup shape the index cannot serve
    pub fn invalid_lookup(reason: impl Into<String>) -> Self {
        Self {
            code: ErrorCode::InvalidPredicate,
            message: reason.into(),
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

impl fmt::Display for IndexError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}: {}", self.severity(), self.code, self.message)
    }
}

impl std::error::Error for IndexError {}

/// Result type for index operations
pub type IndexResult<T> = Result<T, IndexError>;
