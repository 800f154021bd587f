//! Query executor
//!
//! Runs a validated query against one boundary-table snapshot.
//!
//! Execution flow (strict order):
//! 1. Validate terms and ordering against the schema
//! 2. Prune partitions by the partition-key range
//! 3. Per surviving partition, under its read lock: plan, fetch, filter
//! 4. Merge: concatenate, range-ordered concatenate, sort or top-k
//! 5. Apply limit
//!
//! The deadline is checked before every partition and before the merge.
//! An expired deadline discards everything gathered so far.

use std::time::Instant;

use super::errors::{ExecutorError, ExecutorResult};
use super::filters::RecordFilter;
use super::result::{QueryResult, ResultRow};
use super::sorter::ResultSorter;
use crate::partition::{BoundaryTable, Partition, PartitionSlot};
use crate::planner::{
    AccessPath, AccessPlan, ExplainTrace, MergeStrategy, PartitionTrace, Query, QueryPlanner,
    SortDirection,
};
use crate::schema::{Record, RelationSchema, Value};
use crate::sync;

/// Executes queries against partition snapshots
pub struct QueryExecutor<'a> {
    schema: &'a RelationSchema,
    planner: QueryPlanner<'a>,
    sort_threshold: usize,
}

impl<'a> QueryExecutor<'a> {
    /// `sort_threshold` bounds unindexed, unlimited in-memory sorts
    pub fn new(schema: &'a RelationSchema, sort_threshold: usize) -> Self {
        Self {
            schema,
            planner: QueryPlanner::new(schema),
            sort_threshold,
        }
    }

    pub fn execute(&self, table: &BoundaryTable, query: &Query) -> ExecutorResult<QueryResult> {
        let started = Instant::now();
        self.planner.validate(query)?;

        let candidates = table.prune(&self.planner.key_range(query));
        let mut explain = ExplainTrace::new(table.len(), candidates.len());

        let order = query.order_by.as_ref();
        let direction = order.map_or(SortDirection::Asc, |s| s.direction);
        let ordered_on_key =
            order.map_or(false, |s| self.schema.is_partition_column(&s.column));

        explain.merge = match order {
            None => MergeStrategy::Concatenate,
            Some(_) if ordered_on_key => MergeStrategy::RangeOrdered,
            Some(_) if query.limit.is_some() => MergeStrategy::TopK,
            Some(_) => MergeStrategy::Sort,
        };
        let streaming = matches!(
            explain.merge,
            MergeStrategy::Concatenate | MergeStrategy::RangeOrdered
        );

        let visit: Vec<&PartitionSlot> = if ordered_on_key && direction == SortDirection::Desc {
            candidates.iter().rev().collect()
        } else {
            candidates.iter().collect()
        };

        let mut rows: Vec<ResultRow> = Vec::new();
        let mut order_indexed = false;

        for (visited, slot) in visit.iter().enumerate() {
            check_deadline(query, visited, visit.len())?;
            if streaming && query.limit.map_or(false, |limit| rows.len() >= limit) {
                break;
            }

            let partition = sync::read(&slot.partition);
            let plan = self.planner.plan_partition(&partition, query)?;
            let mut trace = PartitionTrace::new(slot.id, slot.bounds, &plan);

            if let Some(sort) = order {
                order_indexed |= partition
                    .indexes()
                    .definitions()
                    .any(|d| d.leading_column() == Some(sort.column.as_str()));
            }

            let mut matched = fetch(&partition, &plan, query, &mut trace)?;
            if ordered_on_key {
                ResultSorter::sort(&mut matched, direction);
            }
            rows.extend(matched);
            explain.partitions.push(trace);
        }

        check_deadline(query, visit.len(), visit.len())?;

        match explain.merge {
            MergeStrategy::Sort => {
                if !order_indexed && rows.len() > self.sort_threshold {
                    let column = order.map_or("", |s| s.column.as_str());
                    return Err(ExecutorError::ambiguous_ordering(
                        column,
                        rows.len(),
                        self.sort_threshold,
                    ));
                }
                ResultSorter::sort(&mut rows, direction);
            }
            MergeStrategy::TopK => {
                let k = query.limit.unwrap_or(rows.len());
                ResultSorter::top_k(&mut rows, k, direction);
            }
            MergeStrategy::Concatenate | MergeStrategy::RangeOrdered => {}
        }

        if let Some(limit) = query.limit {
            rows.truncate(limit);
        }

        explain.elapsed_ticks = u64::try_from(started.elapsed().as_micros()).unwrap_or(u64::MAX);
        Ok(QueryResult {
            ids: rows.into_iter().map(|r| r.id).collect(),
            explain,
        })
    }
}

fn check_deadline(query: &Query, visited: usize, candidates: usize) -> ExecutorResult<()> {
    match query.deadline {
        Some(deadline) if Instant::now() >= deadline => {
            Err(ExecutorError::deadline_exceeded(visited, candidates))
        }
        _ => Ok(()),
    }
}

/// Candidate records via the access path, filtered by the residual terms
fn fetch(
    partition: &Partition,
    plan: &AccessPlan,
    query: &Query,
    trace: &mut PartitionTrace,
) -> ExecutorResult<Vec<ResultRow>> {
    let sort_column = query.order_by.as_ref().map(|s| s.column.as_str());
    let to_row = |record: &Record| {
        let key = sort_column.map_or(Value::Null, |c| record.value(c).clone());
        ResultRow::new(record.id.clone(), key)
    };

    let mut out = Vec::new();
    match &plan.path {
        AccessPath::Scan => {
            for record in partition.records() {
                trace.actual_rows += 1;
                if RecordFilter::matches(record, &plan.residual) {
                    out.push(to_row(record));
                }
            }
        }
        AccessPath::Index {
            id, prefix, range, ..
        } => {
            for record_id in partition.indexes().lookup(*id, prefix, range.as_ref())? {
                trace.actual_rows += 1;
                if let Some(record) = partition.get(&record_id) {
                    if RecordFilter::matches(record, &plan.residual) {
                        out.push(to_row(record));
                    }
                }
            }
        }
    }

    trace.returned_rows = out.len();
    Ok(out)
}
