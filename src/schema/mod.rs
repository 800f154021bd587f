//! Relation schema, values and records
//!
//! The engine stores a single relation of time-ranged records. Every record
//! has a date partition key, a bag of typed attributes and, optionally, a
//! reservation (grouping key + half-open interval) that must not overlap any
//! other reservation of the same group.

mod errors;
mod record;
mod types;
mod validator;
mod value;

pub use errors::{SchemaError, SchemaResult};
pub use record::{Interval, Record, RecordId, Reservation};
pub use types::{ColumnType, RelationSchema};
pub use validator::SchemaValidator;
pub use value::Value;
