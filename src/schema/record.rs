//! Records, reservations and intervals

use std::collections::BTreeMap;
use std::fmt;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::errors::{SchemaError, SchemaResult};
use super::value::Value;

static NULL: Value = Value::Null;

/// Opaque unique record key
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RecordId(String);

impl RecordId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for RecordId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

/// Half-open date interval `[start, end)`.
///
/// Construction guarantees `start < end`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "RawInterval")]
pub struct Interval {
    start: NaiveDate,
    end: NaiveDate,
}

#[derive(Deserialize)]
struct RawInterval {
    start: NaiveDate,
    end: NaiveDate,
}

impl TryFrom<RawInterval> for Interval {
    type Error = SchemaError;

    fn try_from(raw: RawInterval) -> SchemaResult<Self> {
        Interval::new(raw.start, raw.end)
    }
}

impl Interval {
    /// Creates an interval, rejecting zero or negative length
    pub fn new(start: NaiveDate, end: NaiveDate) -> SchemaResult<Self> {
        if start >= end {
            return Err(SchemaError::invalid_interval(start, end));
        }
        Ok(Self { start, end })
    }

    pub fn start(&self) -> NaiveDate {
        self.start
    }

    pub fn end(&self) -> NaiveDate {
        self.end
    }

    /// `self.start < other.end && other.start < self.end`
    pub fn overlaps(&self, other: &Interval) -> bool {
        self.start < other.end && other.start < self.end
    }

    /// Length in days
    pub fn days(&self) -> i64 {
        (self.end - self.start).num_days()
    }
}

impl fmt::Display for Interval {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}, {})", self.start, self.end)
    }
}

/// Grouping key plus the interval it occupies
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reservation {
    pub group: String,
    pub interval: Interval,
}

impl Reservation {
    pub fn new(group: impl Into<String>, interval: Interval) -> Self {
        Self {
            group: group.into(),
            interval,
        }
    }
}

/// A stored record
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Record {
    pub id: RecordId,
    /// Partition key
    pub partition_key: NaiveDate,
    #[serde(default)]
    pub attributes: BTreeMap<String, Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reservation: Option<Reservation>,
}

impl Record {
    pub fn new(id: impl Into<RecordId>, partition_key: NaiveDate) -> Self {
        Self {
            id: id.into(),
            partition_key,
            attributes: BTreeMap::new(),
            reservation: None,
        }
    }

    /// Sets an attribute
    pub fn with(mut self, column: impl Into<String>, value: impl Into<Value>) -> Self {
        self.attributes.insert(column.into(), value.into());
        self
    }

    pub fn with_reservation(mut self, reservation: Reservation) -> Self {
        self.reservation = Some(reservation);
        self
    }

    /// Attribute value; missing attributes read as `Null`
    pub fn value(&self, column: &str) -> &Value {
        self.attributes.get(column).unwrap_or(&NULL)
    }
}

impl From<String> for RecordId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    #[test]
    fn test_zero_length_interval_rejected() {
        let err = Interval::new(d("2024-06-01"), d("2024-06-01")).unwrap_err();
        assert_eq!(err.code(), crate::errors::ErrorCode::InvalidInterval);

        assert!(Interval::new(d("2024-06-05"), d("2024-06-01")).is_err());
    }

    #[test]
    fn test_overlap_is_half_open() {
        let a = Interval::new(d("2024-06-01"), d("2024-06-05")).unwrap();
        let b = Interval::new(d("2024-06-05"), d("2024-06-07")).unwrap();
        let c = Interval::new(d("2024-06-04"), d("2024-06-06")).unwrap();

        assert!(!a.overlaps(&b));
        assert!(a.overlaps(&c));
        assert!(c.overlaps(&b));
        assert_eq!(a.days(), 4);
    }

    #[test]
    fn test_interval_deserialize_validates() {
        let ok: Result<Interval, _> =
            serde_json::from_str(r#"{"start":"2024-06-01","end":"2024-06-03"}"#);
        assert!(ok.is_ok());

        let bad: Result<Interval, _> =
            serde_json::from_str(r#"{"start":"2024-06-03","end":"2024-06-03"}"#);
        assert!(bad.is_err());
    }

    #[test]
    fn test_missing_attribute_reads_null() {
        let record = Record::new("b1", d("2024-06-01")).with("guests", 2);
        assert_eq!(record.value("guests"), &Value::Int(2));
        assert!(record.value("status").is_null());
    }
}
