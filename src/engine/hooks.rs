//! Post-write hooks
//!
//! Hooks run synchronously after a write has committed and its partition,
//! directory and interval locks are released. A hook error is logged and
//! counted; it never undoes the write.
//!
//! A hook must not write through the engine that calls it.

use std::collections::BTreeMap;
use std::sync::RwLock;

use serde::Serialize;

use super::errors::HookError;
use crate::schema::Record;
use crate::sync;

/// A committed change
#[derive(Debug, Clone, Copy)]
pub enum WriteEvent<'a> {
    Inserted(&'a Record),
    Deleted(&'a Record),
}

impl WriteEvent<'_> {
    pub fn record(&self) -> &Record {
        match self {
            WriteEvent::Inserted(r) | WriteEvent::Deleted(r) => r,
        }
    }
}

/// Observer of committed writes
pub trait PostWriteHook: Send + Sync {
    /// Name used in logs and errors
    fn name(&self) -> &str;

    fn on_commit(&self, event: &WriteEvent<'_>) -> Result<(), HookError>;
}

/// Per-group reservation totals
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct GroupTotals {
    pub reservations: u64,
    pub reserved_days: i64,
}

/// Keeps reservation count and reserved days per grouping key
#[derive(Debug, Default)]
pub struct GroupSummary {
    totals: RwLock<BTreeMap<String, GroupTotals>>,
}

impl GroupSummary {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, group: &str) -> Option<GroupTotals> {
        sync::read(&self.totals).get(group).copied()
    }

    pub fn snapshot(&self) -> BTreeMap<String, GroupTotals> {
        sync::read(&self.totals).clone()
    }
}

impl PostWriteHook for GroupSummary {
    fn name(&self) -> &str {
        "group_summary"
    }

    fn on_commit(&self, event: &WriteEvent<'_>) -> Result<(), HookError> {
        let Some(reservation) = &event.record().reservation else {
            return Ok(());
        };
        let days = reservation.interval.days();
        let mut totals = sync::write(&self.totals);

        match event {
            WriteEvent::Inserted(_) => {
                let entry = totals.entry(reservation.group.clone()).or_default();
                entry.reservations += 1;
                entry.reserved_days += days;
            }
            WriteEvent::Deleted(_) => {
                let Some(entry) = totals.get_mut(&reservation.group) else {
                    return Err(HookError::new(
                        self.name(),
                        format!("no totals for group '{}'", reservation.group),
                    ));
                };
                entry.reservations = entry.reservations.saturating_sub(1);
                entry.reserved_days -= days;
                if entry.reservations == 0 {
                    totals.remove(&reservation.group);
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{Interval, Reservation};
    use chrono::NaiveDate;

    fn d(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    fn booking(id: &str, start: &str, end: &str) -> Record {
        let interval = Interval::new(d(start), d(end)).unwrap();
        Record::new(id, d(start)).with_reservation(Reservation::new("P1", interval))
    }

    #[test]
    fn test_summary_tracks_inserts_and_deletes() {
        let summary = GroupSummary::new();
        let a = booking("a", "2024-06-01", "2024-06-05");
        let b = booking("b", "2024-06-10", "2024-06-15");

        summary.on_commit(&WriteEvent::Inserted(&a)).unwrap();
        summary.on_commit(&WriteEvent::Inserted(&b)).unwrap();
        assert_eq!(
            summary.get("P1"),
            Some(GroupTotals {
                reservations: 2,
                reserved_days: 9
            })
        );

        summary.on_commit(&WriteEvent::Deleted(&a)).unwrap();
        assert_eq!(summary.get("P1").unwrap().reserved_days, 5);

        summary.on_commit(&WriteEvent::Deleted(&b)).unwrap();
        assert_eq!(summary.get("P1"), None);
    }

    #[test]
    fn test_unknown_group_delete_fails() {
        let summary = GroupSummary::new();
        let a = booking("a", "2024-06-01", "2024-06-05");
        assert!(summary.on_commit(&WriteEvent::Deleted(&a)).is_err());
    }

    #[test]
    fn test_records_without_reservation_ignored() {
        let summary = GroupSummary::new();
        let r = Record::new("x", d("2024-01-01"));
        summary.on_commit(&WriteEvent::Inserted(&r)).unwrap();
        assert!(summary.snapshot().is_empty());
    }
}
