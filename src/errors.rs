//! Error taxonomy shared by every subsystem
//!
//! Each subsystem has its own error type (`IntervalError`, `IndexError`, ...)
//! but they all report a code from this single taxonomy so callers can match
//! on failures without caring which layer produced them.

use std::fmt;

use serde::Serialize;

/// Severity of an error
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Severity {
    /// Caller mistake; engine state untouched
    Reject,
    /// Runtime failure; engine state untouched
    Error,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Reject => write!(f, "REJECT"),
            Severity::Error => write!(f, "ERROR"),
        }
    }
}

/// Error codes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum ErrorCode {
    /// Interval overlaps a committed interval for the same grouping key
    Conflict,
    /// Zero or negative length interval
    InvalidInterval,
    /// Record, interval, index or partition does not exist
    NotFound,
    /// Index over the same ordered column list already exists
    DuplicateDefinition,
    /// Boundary already present in the boundary table
    BoundaryExists,
    /// Boundary or key below the lowest partition bound
    BoundaryBeforeMin,
    /// Dropping the partition would break contiguity
    NonPruneable,
    /// Predicate, ordering, index or record references an unknown column
    NoSuchColumn,
    /// Unindexed ordering over a result set larger than the sort threshold
    AmbiguousOrdering,
    /// Caller-supplied deadline passed before the query finished
    DeadlineExceeded,
    /// Predicate literal is null or has the wrong type
    InvalidPredicate,
    /// Record does not conform to the relation schema
    InvalidRecord,
    /// Record id already present
    DuplicateRecord,
    /// Configuration file missing, malformed or inconsistent
    InvalidConfig,
    /// Post-write hook reported a failure
    HookFailed,
}

impl ErrorCode {
    /// Stable string form used in logs and CLI responses
    pub fn code(&self) -> &'static str {
        match self {
            ErrorCode::Conflict => "RANGE_CONFLICT",
            ErrorCode::InvalidInterval => "RANGE_INVALID_INTERVAL",
            ErrorCode::NotFound => "RANGE_NOT_FOUND",
            ErrorCode::DuplicateDefinition => "RANGE_DUPLICATE_DEFINITION",
            ErrorCode::BoundaryExists => "RANGE_BOUNDARY_EXISTS",
            ErrorCode::BoundaryBeforeMin => "RANGE_BOUNDARY_BEFORE_MIN",
            ErrorCode::NonPruneable => "RANGE_NON_PRUNEABLE",
            ErrorCode::NoSuchColumn => "RANGE_NO_SUCH_COLUMN",
            ErrorCode::AmbiguousOrdering => "RANGE_AMBIGUOUS_ORDERING",
            ErrorCode::DeadlineExceeded => "RANGE_DEADLINE_EXCEEDED",
            ErrorCode::InvalidPredicate => "RANGE_INVALID_PREDICATE",
            ErrorCode::InvalidRecord => "RANGE_INVALID_RECORD",
            ErrorCode::DuplicateRecord => "RANGE_DUPLICATE_RECORD",
            ErrorCode::InvalidConfig => "RANGE_INVALID_CONFIG",
            ErrorCode::HookFailed => "RANGE_HOOK_FAILED",
        }
    }

    /// Severity level for this code.
    ///
    /// Deadline expiry and hook failures are runtime conditions; everything
    /// else is a request the caller should not have made.
    pub fn severity(&self) -> Severity {
        match self {
            ErrorCode::DeadlineExceeded | ErrorCode::HookFailed => Severity::Error,
            _ => Severity::Reject,
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_codes_are_prefixed() {
        let codes = [
            ErrorCode::Conflict,
            ErrorCode::InvalidInterval,
            ErrorCode::NotFound,
            ErrorCode::DuplicateDefinition,
            ErrorCode::BoundaryExists,
            ErrorCode::BoundaryBeforeMin,
            ErrorCode::NonPruneable,
            ErrorCode::NoSuchColumn,
            ErrorCode::AmbiguousOrdering,
            ErrorCode::DeadlineExceeded,
            ErrorCode::InvalidPredicate,
            ErrorCode::InvalidRecord,
            ErrorCode::DuplicateRecord,
            ErrorCode::InvalidConfig,
            ErrorCode::HookFailed,
        ];

        for code in codes {
            assert!(code.code().starts_with("RANGE_"));
        }
    }

    #[test]
    fn test_runtime_errors() {
        assert_eq!(ErrorCode::DeadlineExceeded.severity(), Severity::Error);
        assert_eq!(ErrorCode::HookFailed.severity(), Severity::Error);
        assert_eq!(ErrorCode::Conflict.severity(), Severity::Reject);
        assert_eq!(ErrorCode::NonPruneable.severity(), Severity::Reject);
    }
}
