//! Record validation against the relation schema
//!
//! Validation rules:
//! - Every attribute is declared
//! - Attribute types match exactly (no coercion)
//! - Null attributes are dropped
//! - The partition column attribute, if given, equals the partition key
//!
//! The validated record carries its partition key as an attribute under the
//! partition column so predicates, indexes and ordering can see it.

use super::errors::{SchemaError, SchemaResult};
use super::record::Record;
use super::types::RelationSchema;
use super::value::Value;

/// Validates and normalizes records
pub struct SchemaValidator<'a> {
    schema: &'a RelationSchema,
}

impl<'a> SchemaValidator<'a> {
    pub fn new(schema: &'a RelationSchema) -> Self {
        Self { schema }
    }

    /// Validates `record` and returns its normalized form
    pub fn normalize(&self, mut record: Record) -> SchemaResult<Record> {
        record.attributes.retain(|_, v| !v.is_null());

        for (column, value) in &record.attributes {
            let Some(expected) = self.schema.column_type(column) else {
                return Err(SchemaError::no_such_column(column.clone()));
            };
            if value.column_type() != Some(expected) {
                return Err(SchemaError::type_mismatch(
                    column.clone(),
                    expected.type_name(),
                    value.type_name(),
                ));
            }
        }

        let key = Value::Date(record.partition_key);
        match record.attributes.get(&self.schema.partition_column) {
            Some(existing) if *existing != key => {
                return Err(SchemaError::invalid_record(format!(
                    "Column '{}' is {} but partition key is {}",
                    self.schema.partition_column, existing, record.partition_key
                )));
            }
            Some(_) => {}
            None => {
                record
                    .attributes
                    .insert(self.schema.partition_column.clone(), key);
            }
        }

        Ok(record)
    }
}
