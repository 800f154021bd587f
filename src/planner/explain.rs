//! Explain trace
//!
//! Structured record of what a query touched: one entry per visited
//! partition plus the merge strategy and elapsed time. Serializable for
//! external reporting and printable in a fixed layout.

use std::fmt;

use serde::Serialize;
use uuid::Uuid;

use super::planner::AccessPlan;
use crate::index::IndexId;
use crate::partition::{PartitionBounds, PartitionId};

/// How per-partition results were combined
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MergeStrategy {
    /// No ordering requested; partitions in range order
    Concatenate,
    /// Ordered on the partition column; per-partition sort then range order
    RangeOrdered,
    /// Full sort of the merged set
    Sort,
    /// Bounded selection of the first `limit` rows
    TopK,
}

impl MergeStrategy {
    pub fn as_str(&self) -> &'static str {
        match self {
            MergeStrategy::Concatenate => "concatenate",
            MergeStrategy::RangeOrdered => "range_ordered",
            MergeStrategy::Sort => "sort",
            MergeStrategy::TopK => "top_k",
        }
    }
}

/// One visited partition
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PartitionTrace {
    pub partition_id: PartitionId,
    pub bounds: PartitionBounds,
    /// `"scan"` or index name
    pub access_path: String,
    pub index_id: Option<IndexId>,
    pub estimated_rows: usize,
    /// Records fetched by the access path
    pub actual_rows: usize,
    /// Records left after residual filtering
    pub returned_rows: usize,
}

impl PartitionTrace {
    pub fn new(partition_id: PartitionId, bounds: PartitionBounds, plan: &AccessPlan) -> Self {
        Self {
            partition_id,
            bounds,
            access_path: plan.path.label().to_string(),
            index_id: plan.path.index_id(),
            estimated_rows: plan.estimated_rows,
            actual_rows: 0,
            returned_rows: 0,
        }
    }
}

/// Explain output of one executed query
#[derive(Debug, Clone, Serialize)]
pub struct ExplainTrace {
    pub query_id: Uuid,
    /// Partitions in the boundary table when the query ran
    pub total_partitions: usize,
    /// Partitions surviving pruning
    pub candidate_partitions: usize,
    pub partitions: Vec<PartitionTrace>,
    pub merge: MergeStrategy,
    /// Microseconds from validation to merged result
    pub elapsed_ticks: u64,
}

impl ExplainTrace {
    pub fn new(total_partitions: usize, candidate_partitions: usize) -> Self {
        Self {
            query_id: Uuid::new_v4(),
            total_partitions,
            candidate_partitions,
            partitions: Vec::new(),
            merge: MergeStrategy::Concatenate,
            elapsed_ticks: 0,
        }
    }

    /// Ids of visited partitions, in visit order
    pub fn partition_ids(&self) -> Vec<PartitionId> {
        self.partitions.iter().map(|p| p.partition_id).collect()
    }

    pub fn pruned_partitions(&self) -> usize {
        self.total_partitions - self.candidate_partitions
    }

    pub fn index_lookups(&self) -> usize {
        self.partitions.iter().filter(|p| p.index_id.is_some()).count()
    }

    pub fn full_scans(&self) -> usize {
        self.partitions.iter().filter(|p| p.index_id.is_none()).count()
    }
}

impl fmt::Display for ExplainTrace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "=== EXPLAIN ===")?;
        writeln!(f, "Query: {}", self.query_id)?;
        writeln!(
            f,
            "Partitions: {} of {} ({} pruned)",
            self.candidate_partitions,
            self.total_partitions,
            self.pruned_partitions()
        )?;
        for p in &self.partitions {
            writeln!(
                f,
                "  - partition {} {}: {} est={} actual={} returned={}",
                p.partition_id,
                p.bounds,
                p.access_path,
                p.estimated_rows,
                p.actual_rows,
                p.returned_rows
            )?;
        }
        writeln!(f, "Merge: {}", self.merge.as_str())?;
        writeln!(f, "Elapsed: {} us", self.elapsed_ticks)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::planner::planner::AccessPath;
    use chrono::NaiveDate;

    fn bounds() -> PartitionBounds {
        PartitionBounds::new(NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(), None)
    }

    fn trace() -> ExplainTrace {
        let mut trace = ExplainTrace::new(3, 1);
        let plan = AccessPlan {
            path: AccessPath::Scan,
            residual: Vec::new(),
            estimated_rows: 12,
        };
        let mut entry = PartitionTrace::new(2, bounds(), &plan);
        entry.actual_rows = 12;
        entry.returned_rows = 4;
        trace.partitions.push(entry);
        trace.elapsed_ticks = 42;
        trace
    }

    #[test]
    fn test_explain_display() {
        let output = format!("{}", trace());
        assert!(output.starts_with("=== EXPLAIN ==="));
        assert!(output.contains("Partitions: 1 of 3 (2 pruned)"));
        assert!(output.contains("partition 2 [2024-01-01, +inf): scan est=12 actual=12 returned=4"));
        assert!(output.contains("Merge: concatenate"));
    }

    #[test]
    fn test_explain_json() {
        let json = serde_json::to_value(trace()).unwrap();
        assert_eq!(json["partitions"][0]["access_path"], "scan");
        assert_eq!(json["partitions"][0]["index_id"], serde_json::Value::Null);
        assert_eq!(json["merge"], "concatenate");
        assert_eq!(json["elapsed_ticks"], 42);
    }

    #[test]
    fn test_counts() {
        let t = trace();
        assert_eq!(t.full_scans(), 1);
        assert_eq!(t.index_lookups(), 0);
        assert_eq!(t.partition_ids(), vec![2]);
    }
}
