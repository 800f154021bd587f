//! Observable engine events
//!
//! Events are explicit and typed; each maps to one log line name.

use std::fmt;

use super::logger::Severity;

/// Observable events
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Event {
    // Lifecycle
    EngineOpen,
    ConfigLoaded,

    // Partitions
    PartitionSplit,
    PartitionAutoSplit,
    PartitionDropped,

    // Indexes
    IndexDefined,

    // Writes
    RecordInserted,
    RecordUpdated,
    RecordDeleted,
    ReservationConflict,
    WriteRejected,

    // Queries
    QueryExecuted,
    QueryRejected,
    DeadlineExceeded,

    // Hooks
    HookFailed,
}

impl Event {
    pub fn as_str(&self) -> &'static str {
        match self {
            Event::EngineOpen => "ENGINE_OPEN",
            Event::ConfigLoaded => "CONFIG_LOADED",
            Event::PartitionSplit => "PARTITION_SPLIT",
            Event::PartitionAutoSplit => "PARTITION_AUTO_SPLIT",
            Event::PartitionDropped => "PARTITION_DROPPED",
            Event::IndexDefined => "INDEX_DEFINED",
            Event::RecordInserted => "RECORD_INSERTED",
            Event::RecordUpdated => "RECORD_UPDATED",
            Event::RecordDeleted => "RECORD_DELETED",
            Event::ReservationConflict => "RESERVATION_CONFLICT",
            Event::WriteRejected => "WRITE_REJECTED",
            Event::QueryExecuted => "QUERY_COMPLETE",
            Event::QueryRejected => "QUERY_REJECTED",
            Event::DeadlineExceeded => "QUERY_DEADLINE_EXCEEDED",
            Event::HookFailed => "HOOK_FAILED",
        }
    }

    /// Severity the event is logged at
    pub fn severity(&self) -> Severity {
        match self {
            Event::RecordInserted
            | Event::RecordUpdated
            | Event::RecordDeleted
            | Event::QueryExecuted => Severity::Trace,
            Event::EngineOpen
            | Event::ConfigLoaded
            | Event::PartitionSplit
            | Event::PartitionAutoSplit
            | Event::PartitionDropped
            | Event::IndexDefined => Severity::Info,
            Event::ReservationConflict | Event::WriteRejected | Event::QueryRejected => {
                Severity::Warn
            }
            Event::DeadlineExceeded | Event::HookFailed => Severity::Error,
        }
    }
}

impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_names_are_upper_snake() {
        let events = [
            Event::EngineOpen,
            Event::ConfigLoaded,
            Event::PartitionSplit,
            Event::PartitionAutoSplit,
            Event::PartitionDropped,
            Event::IndexDefined,
            Event::RecordInserted,
            Event::RecordUpdated,
            Event::RecordDeleted,
            Event::ReservationConflict,
            Event::WriteRejected,
            Event::QueryExecuted,
            Event::QueryRejected,
            Event::DeadlineExceeded,
            Event::HookFailed,
        ];
        for event in events {
            let s = event.as_str();
            assert!(!s.is_empty());
            assert!(s.chars().all(|c| c.is_ascii_uppercase() || c == '_'));
        }
    }

    #[test]
    fn test_event_severity() {
        assert_eq!(Event::HookFailed.severity(), Severity::Error);
        assert_eq!(Event::ReservationConflict.severity(), Severity::Warn);
        assert_eq!(Event::RecordInserted.severity(), Severity::Trace);
    }
}
