//! Query planner
//!
//! Validates queries against the relation schema and picks one access path
//! per surviving partition.
//!
//! Index selection, per partition:
//! 1. Score each index by the number of leading columns bound by equality,
//!    plus one if the next column carries a range
//! 2. Highest score wins; ties go to lower estimated selectivity, then to
//!    definition order
//! 3. No index scoring above zero means a full scan
//!
//! Plans are deterministic for the same query and partition contents.

use std::collections::HashSet;

use super::ast::{CompareOp, Query, Term};
use super::bounds::KeyRangeExtractor;
use super::errors::{PlannerError, PlannerResult};
use crate::index::{ColumnRange, IndexDefinition, IndexId};
use crate::partition::{KeyRange, Partition};
use crate::schema::{RelationSchema, Value};

/// How a partition's candidate records are obtained
#[derive(Debug, Clone, PartialEq)]
pub enum AccessPath {
    /// Every record of the partition
    Scan,
    /// Index seek: equality on `prefix`, optional range on the next column
    Index {
        id: IndexId,
        name: String,
        prefix: Vec<Value>,
        range: Option<ColumnRange>,
    },
}

impl AccessPath {
    /// `"scan"` or the index name
    pub fn label(&self) -> &str {
        match self {
            AccessPath::Scan => "scan",
            AccessPath::Index { name, .. } => name,
        }
    }

    pub fn index_id(&self) -> Option<IndexId> {
        match self {
            AccessPath::Scan => None,
            AccessPath::Index { id, .. } => Some(*id),
        }
    }
}

/// Plan for a single partition
#[derive(Debug, Clone)]
pub struct AccessPlan {
    pub path: AccessPath,
    /// Terms the access path does not enforce; applied per record
    pub residual: Vec<Term>,
    pub estimated_rows: usize,
}

/// Candidate index and the terms it would consume
struct Candidate<'d> {
    definition: &'d IndexDefinition,
    score: usize,
    prefix: Vec<Value>,
    range: Option<ColumnRange>,
    consumed: HashSet<usize>,
}

/// Stateless planner bound to a schema
pub struct QueryPlanner<'a> {
    schema: &'a RelationSchema,
}

impl<'a> QueryPlanner<'a> {
    pub fn new(schema: &'a RelationSchema) -> Self {
        Self { schema }
    }

    /// Checks every referenced column exists and every literal is a
    /// non-null value of the column's type.
    pub fn validate(&self, query: &Query) -> PlannerResult<()> {
        for column in query.columns() {
            if !self.schema.has_column(column) {
                return Err(PlannerError::no_such_column(column));
            }
        }

        for term in &query.terms {
            let Some(expected) = self.schema.column_type(&term.column) else {
                return Err(PlannerError::no_such_column(&term.column));
            };
            for literal in term.op.literals() {
                match literal.column_type() {
                    None => return Err(PlannerError::null_literal(&term.column)),
                    Some(found) if found != expected => {
                        return Err(PlannerError::literal_type(
                            &term.column,
                            expected.type_name(),
                            found.type_name(),
                        ))
                    }
                    Some(_) => {}
                }
            }
        }
        Ok(())
    }

    /// Partition-key constraint used for pruning
    pub fn key_range(&self, query: &Query) -> KeyRange {
        KeyRangeExtractor::new(&self.schema.partition_column).extract(query)
    }

    /// Chooses the access path for one partition
    pub fn plan_partition(&self, partition: &Partition, query: &Query) -> PlannerResult<AccessPlan> {
        let mut best: Option<(Candidate<'_>, f64)> = None;

        for definition in partition.indexes().definitions() {
            let candidate = candidate_for(definition, &query.terms);
            if candidate.score == 0 {
                continue;
            }

            let selectivity = partition.indexes().selectivity(
                definition.id,
                &candidate.prefix,
                candidate.range.as_ref(),
            )?;

            let better = match &best {
                None => true,
                Some((current, current_sel)) => {
                    candidate.score > current.score
                        || (candidate.score == current.score && selectivity < *current_sel)
                }
            };
            if better {
                best = Some((candidate, selectivity));
            }
        }

        let Some((chosen, _)) = best else {
            return Ok(AccessPlan {
                path: AccessPath::Scan,
                residual: query.terms.clone(),
                estimated_rows: partition.len(),
            });
        };

        let estimated_rows = partition.indexes().estimate(
            chosen.definition.id,
            &chosen.prefix,
            chosen.range.as_ref(),
        )?;
        let residual = query
            .terms
            .iter()
            .enumerate()
            .filter(|(i, _)| !chosen.consumed.contains(i))
            .map(|(_, t)| t.clone())
            .collect();

        Ok(AccessPlan {
            path: AccessPath::Index {
                id: chosen.definition.id,
                name: chosen.definition.name(),
                prefix: chosen.prefix,
                range: chosen.range,
            },
            residual,
            estimated_rows,
        })
    }
}

/// Longest usable prefix of `definition` given `terms`.
///
/// Each leading column takes the first equality term on it; the column after
/// the equality run takes the intersection of every range term on it.
fn candidate_for<'d>(definition: &'d IndexDefinition, terms: &[Term]) -> Candidate<'d> {
    let mut prefix = Vec::new();
    let mut consumed = HashSet::new();
    let mut range = None;

    for column in &definition.columns {
        let eq = terms
            .iter()
            .enumerate()
            .find(|(_, t)| &t.column == column && t.is_equality());
        if let Some((i, term)) = eq {
            if let CompareOp::Eq(v) = &term.op {
                prefix.push(v.clone());
                consumed.insert(i);
                continue;
            }
        }

        for (i, term) in terms.iter().enumerate() {
            if &term.column == column && term.op.is_range() {
                let r = term.op.to_range();
                range = Some(match range.take() {
                    None => r,
                    Some(existing) => ColumnRange::intersect(existing, r),
                });
                consumed.insert(i);
            }
        }
        break;
    }

    Candidate {
        definition,
        score: prefix.len() + usize::from(range.is_some()),
        prefix,
        range,
        consumed,
    }
}
