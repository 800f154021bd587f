//! Result types for query execution

use serde::Serialize;

use crate::planner::ExplainTrace;
use crate::schema::{RecordId, Value};

/// A matched record and the value it is ordered by
#[derive(Debug, Clone, PartialEq)]
pub struct ResultRow {
    pub id: RecordId,
    /// `Null` when the query has no ordering
    pub sort_key: Value,
}

impl ResultRow {
    pub fn new(id: RecordId, sort_key: Value) -> Self {
        Self { id, sort_key }
    }
}

/// Ordered, limited record ids plus the explain trace
#[derive(Debug, Clone, Serialize)]
pub struct QueryResult {
    pub ids: Vec<RecordId>,
    pub explain: ExplainTrace,
}

impl QueryResult {
    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &RecordId> {
        self.ids.iter()
    }
}
