//! Partition error types
//!
//! Codes:
//! - RANGE_BOUNDARY_EXISTS (REJECT)
//! - RANGE_BOUNDARY_BEFORE_MIN (REJECT)
//! - RANGE_NON_PRUNEABLE (REJECT)
//! - RANGE_NOT_FOUND (REJECT)
//! - RANGE_DUPLICATE_DEFINITION (REJECT)

use std::fmt;

use chrono::NaiveDate;

use crate::errors::{ErrorCode, Severity};
use crate::index::IndexError;

/// Partition error with context
#[derive(Debug, Clone)]
pub struct PartitionError {
    code: ErrorCode,
    message: String,
}

impl PartitionError {
    pub fn boundary_exists(boundary: NaiveDate) -> Self {
        Self {
            code: ErrorCode::BoundaryExists,
            message: format!("Boundary {} already exists", boundary),
        }
    }

    pub fn boundary_before_min(value: NaiveDate, min: NaiveDate) -> Self {
        Self {
            code: ErrorCode::BoundaryBeforeMin,
            message: format!("{} precedes the lowest partition bound {}", value, min),
        }
    }

    pub fn non_pruneable(id: u64, reason: &str) -> Self {
        Self {
            code: ErrorCode::NonPruneable,
            message: format!("Partition {} cannot be dropped: {}", id, reason),
        }
    }

    pub fn unknown_partition(id: u64) -> Self {
        Self {
            code: ErrorCode::NotFound,
            message: format!("Partition {} does not exist", id),
        }
    }

    pub fn unordered_boundaries(prev: NaiveDate, next: NaiveDate) -> Self {
        Self {
            code: ErrorCode::BoundaryExists,
            message: format!(
                "Boundaries must be strictly ascending: {} is followed by {}",
                prev, next
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

impl From<IndexError> for PartitionError {
    fn from(err: IndexError) -> Self {
        Self {
            code: err.code(),
            message: err.message().to_string(),
        }
    }
}

impl fmt::Display for PartitionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}: {}", self.severity(), self.code, self.message)
    }
}

impl std::error::Error for PartitionError {}

/// Result type for partition operations
pub type PartitionResult<T> = Result<T, PartitionError>;
