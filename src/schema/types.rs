//! Relation schema
//!
//! Supported column types:
//! - int: 64-bit signed integer
//! - decimal: exact decimal
//! - text: UTF-8 string
//! - date: calendar date

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use super::errors::{SchemaError, SchemaResult};

/// Indexable column types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ColumnType {
    Int,
    Decimal,
    Text,
    Date,
}

impl ColumnType {
    /// Returns the type name for error messages
    pub fn type_name(&self) -> &'static str {
        match self {
            ColumnType::Int => "int",
            ColumnType::Decimal => "decimal",
            ColumnType::Text => "text",
            ColumnType::Date => "date",
        }
    }
}

impl fmt::Display for ColumnType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.type_name())
    }
}

/// Shape of the stored relation.
///
/// The partition column is always of type date and is implicitly part of
/// `columns`; it may be listed there but only as `date`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RelationSchema {
    /// Column holding the partition key
    pub partition_column: String,
    /// Declared attribute columns
    #[serde(default)]
    pub columns: BTreeMap<String, ColumnType>,
}

impl RelationSchema {
    /// Creates a schema with only the partition column
    pub fn new(partition_column: impl Into<String>) -> Self {
        Self {
            partition_column: partition_column.into(),
            columns: BTreeMap::new(),
        }
    }

    /// Adds a column
    pub fn with_column(mut self, name: impl Into<String>, column_type: ColumnType) -> Self {
        self.columns.insert(name.into(), column_type);
        self
    }

    /// Type of a column, including the partition column
    pub fn column_type(&self, name: &str) -> Option<ColumnType> {
        if name == self.partition_column {
            return Some(ColumnType::Date);
        }
        self.columns.get(name).copied()
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.column_type(name).is_some()
    }

    pub fn is_partition_column(&self, name: &str) -> bool {
        name == self.partition_column
    }

    /// Checks the schema itself is well formed
    pub fn validate(&self) -> SchemaResult<()> {
        if self.partition_column.is_empty() {
            return Err(SchemaError::invalid_record(
                "Partition column name must not be empty",
            ));
        }

        if let Some(declared) = self.columns.get(&self.partition_column) {
            if *declared != ColumnType::Date {
                return Err(SchemaError::type_mismatch(
                    self.partition_column.clone(),
                    ColumnType::Date.type_name(),
                    declared.type_name(),
                ));
            }
        }

        Ok(())
    }
}
