//! Query AST
//!
//! A query is a conjunction of column comparisons plus an optional ordering,
//! limit and deadline.

use std::collections::HashMap;
use std::fmt;
use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};

use crate::index::ColumnRange;
use crate::schema::Value;

/// Comparison applied to one column
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CompareOp {
    Eq(Value),
    Lt(Value),
    Le(Value),
    Gt(Value),
    Ge(Value),
    /// Inclusive on both ends
    Between(Value, Value),
}

impl CompareOp {
    pub fn is_equality(&self) -> bool {
        matches!(self, CompareOp::Eq(_))
    }

    pub fn is_range(&self) -> bool {
        !self.is_equality()
    }

    /// Returns the operation name for explain output
    pub fn op_name(&self) -> &'static str {
        match self {
            CompareOp::Eq(_) => "=",
            CompareOp::Lt(_) => "<",
            CompareOp::Le(_) => "<=",
            CompareOp::Gt(_) => ">",
            CompareOp::Ge(_) => ">=",
            CompareOp::Between(_, _) => "between",
        }
    }

    /// Literals carried by this comparison
    pub fn literals(&self) -> Vec<&Value> {
        match self {
            CompareOp::Eq(v)
            | CompareOp::Lt(v)
            | CompareOp::Le(v)
            | CompareOp::Gt(v)
            | CompareOp::Ge(v) => vec![v],
            CompareOp::Between(lo, hi) => vec![lo, hi],
        }
    }

    /// Values satisfying this comparison, as a column range
    pub fn to_range(&self) -> ColumnRange {
        match self {
            CompareOp::Eq(v) => ColumnRange::between(v.clone(), v.clone()),
            CompareOp::Lt(v) => ColumnRange::less_than(v.clone()),
            CompareOp::Le(v) => ColumnRange::at_most(v.clone()),
            CompareOp::Gt(v) => ColumnRange::greater_than(v.clone()),
            CompareOp::Ge(v) => ColumnRange::at_least(v.clone()),
            CompareOp::Between(lo, hi) => ColumnRange::between(lo.clone(), hi.clone()),
        }
    }

    /// True if `value` satisfies the comparison. `Null` never does.
    pub fn matches(&self, value: &Value) -> bool {
        if value.is_null() {
            return false;
        }
        match self {
            CompareOp::Eq(v) => value == v,
            CompareOp::Lt(v) => value < v,
            CompareOp::Le(v) => value <= v,
            CompareOp::Gt(v) => value > v,
            CompareOp::Ge(v) => value >= v,
            CompareOp::Between(lo, hi) => value >= lo && value <= hi,
        }
    }
}

/// One conjunct: `column op literal`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Term {
    pub column: String,
    #[serde(flatten)]
    pub op: CompareOp,
}

impl Term {
    pub fn new(column: impl Into<String>, op: CompareOp) -> Self {
        Self {
            column: column.into(),
            op,
        }
    }

    pub fn eq(column: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::new(column, CompareOp::Eq(value.into()))
    }

    pub fn lt(column: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::new(column, CompareOp::Lt(value.into()))
    }

    pub fn le(column: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::new(column, CompareOp::Le(value.into()))
    }

    pub fn gt(column: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::new(column, CompareOp::Gt(value.into()))
    }

    pub fn ge(column: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::new(column, CompareOp::Ge(value.into()))
    }

    pub fn between(
        column: impl Into<String>,
        lo: impl Into<Value>,
        hi: impl Into<Value>,
    ) -> Self {
        Self::new(column, CompareOp::Between(lo.into(), hi.into()))
    }

    pub fn is_equality(&self) -> bool {
        self.op.is_equality()
    }
}

impl fmt::Display for Term {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.op {
            CompareOp::Between(lo, hi) => {
                write!(f, "{} between {} and {}", self.column, lo, hi)
            }
            op => write!(f, "{} {} {}", self.column, op.op_name(), op.literals()[0]),
        }
    }
}

/// Sort direction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    #[default]
    Asc,
    Desc,
}

impl SortDirection {
    pub fn as_str(&self) -> &'static str {
        match self {
            SortDirection::Asc => "asc",
            SortDirection::Desc => "desc",
        }
    }
}

/// Result ordering
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SortSpec {
    pub column: String,
    #[serde(default)]
    pub direction: SortDirection,
}

impl SortSpec {
    pub fn asc(column: impl Into<String>) -> Self {
        Self {
            column: column.into(),
            direction: SortDirection::Asc,
        }
    }

    pub fn desc(column: impl Into<String>) -> Self {
        Self {
            column: column.into(),
            direction: SortDirection::Desc,
        }
    }
}

/// Conjunctive query
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Query {
    /// Terms, all combined with AND
    #[serde(default)]
    pub terms: Vec<Term>,
    #[serde(default)]
    pub order_by: Option<SortSpec>,
    #[serde(default)]
    pub limit: Option<usize>,
    /// Checked between partitions; not part of the wire form
    #[serde(skip)]
    pub deadline: Option<Instant>,
}

impl Query {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a term
    pub fn with_term(mut self, term: Term) -> Self {
        self.terms.push(term);
        self
    }

    pub fn order_by(mut self, sort: SortSpec) -> Self {
        self.order_by = Some(sort);
        self
    }

    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn with_deadline(mut self, deadline: Instant) -> Self {
        self.deadline = Some(deadline);
        self
    }

    /// Deadline `timeout` from now; a timeout too large to represent means
    /// no deadline
    pub fn with_timeout(self, timeout: Duration) -> Self {
        match Instant::now().checked_add(timeout) {
            Some(deadline) => self.with_deadline(deadline),
            None => self,
        }
    }

    /// Terms grouped by column, in first-appearance order within each column
    pub fn terms_by_column(&self) -> HashMap<&str, Vec<&Term>> {
        let mut map: HashMap<&str, Vec<&Term>> = HashMap::new();
        for term in &self.terms {
            map.entry(term.column.as_str()).or_default().push(term);
        }
        map
    }

    /// Columns referenced by terms or ordering
    pub fn columns(&self) -> impl Iterator<Item = &str> {
        self.terms
            .iter()
            .map(|t| t.column.as_str())
            .chain(self.order_by.iter().map(|s| s.column.as_str()))
    }
}
