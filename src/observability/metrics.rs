//! Metrics registry
//!
//! - Counters only, monotonic
//! - Reset only on process start
//! - Relaxed atomics; a snapshot is not a consistent cut across counters

use std::sync::atomic::{AtomicU64, Ordering};

use serde::Serialize;

/// Engine counters
#[derive(Debug, Default)]
pub struct MetricsRegistry {
    inserts: AtomicU64,
    updates: AtomicU64,
    deletes: AtomicU64,
    conflicts: AtomicU64,
    writes_rejected: AtomicU64,
    queries_executed: AtomicU64,
    queries_rejected: AtomicU64,
    partitions_scanned: AtomicU64,
    partitions_pruned: AtomicU64,
    index_lookups: AtomicU64,
    full_scans: AtomicU64,
    deadline_expiries: AtomicU64,
    hook_failures: AtomicU64,
    partitions_created: AtomicU64,
    partitions_dropped: AtomicU64,
}

impl MetricsRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    // Writes

    pub fn increment_inserts(&self) {
        self.inserts.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_updates(&self) {
        self.updates.fetch_add(1, Ordering::Relaxed);
    }

    pub fn add_deletes(&self, n: u64) {
        self.deletes.fetch_add(n, Ordering::Relaxed);
    }

    pub fn increment_conflicts(&self) {
        self.conflicts.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_writes_rejected(&self) {
        self.writes_rejected.fetch_add(1, Ordering::Relaxed);
    }

    // Queries

    pub fn increment_queries_executed(&self) {
        self.queries_executed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_queries_rejected(&self) {
        self.queries_rejected.fetch_add(1, Ordering::Relaxed);
    }

    /// Records the partition and access-path counts of one query
    pub fn record_query_shape(&self, scanned: u64, pruned: u64, index_lookups: u64, full_scans: u64) {
        self.partitions_scanned.fetch_add(scanned, Ordering::Relaxed);
        self.partitions_pruned.fetch_add(pruned, Ordering::Relaxed);
        self.index_lookups.fetch_add(index_lookups, Ordering::Relaxed);
        self.full_scans.fetch_add(full_scans, Ordering::Relaxed);
    }

    pub fn increment_deadline_expiries(&self) {
        self.deadline_expiries.fetch_add(1, Ordering::Relaxed);
    }

    // Hooks and layout

    pub fn increment_hook_failures(&self) {
        self.hook_failures.fetch_add(1, Ordering::Relaxed);
    }

    pub fn add_partitions_created(&self, n: u64) {
        self.partitions_created.fetch_add(n, Ordering::Relaxed);
    }

    pub fn increment_partitions_dropped(&self) {
        self.partitions_dropped.fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            inserts: self.inserts.load(Ordering::Relaxed),
            updates: self.updates.load(Ordering::Relaxed),
            deletes: self.deletes.load(Ordering::Relaxed),
            conflicts: self.conflicts.load(Ordering::Relaxed),
            writes_rejected: self.writes_rejected.load(Ordering::Relaxed),
            queries_executed: self.queries_executed.load(Ordering::Relaxed),
            queries_rejected: self.queries_rejected.load(Ordering::Relaxed),
            partitions_scanned: self.partitions_scanned.load(Ordering::Relaxed),
            partitions_pruned: self.partitions_pruned.load(Ordering::Relaxed),
            index_lookups: self.index_lookups.load(Ordering::Relaxed),
            full_scans: self.full_scans.load(Ordering::Relaxed),
            deadline_expiries: self.deadline_expiries.load(Ordering::Relaxed),
            hook_failures: self.hook_failures.load(Ordering::Relaxed),
            partitions_created: self.partitions_created.load(Ordering::Relaxed),
            partitions_dropped: self.partitions_dropped.load(Ordering::Relaxed),
        }
    }
}

/// Point-in-time copy of every counter
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct MetricsSnapshot {
    pub inserts: u64,
    pub updates: u64,
    pub deletes: u64,
    pub conflicts: u64,
    pub writes_rejected: u64,
    pub queries_executed: u64,
    pub queries_rejected: u64,
    pub partitions_scanned: u64,
    pub partitions_pruned: u64,
    pub index_lookups: u64,
    pub full_scans: u64,
    pub deadline_expiries: u64,
    pub hook_failures: u64,
    pub partitions_created: u64,
    pub partitions_dropped: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_registry_is_zero() {
        assert_eq!(MetricsRegistry::new().snapshot(), MetricsSnapshot::default());
    }

    #[test]
    fn test_counters() {
        let registry = MetricsRegistry::new();
        registry.increment_inserts();
        registry.increment_inserts();
        registry.add_deletes(3);
        registry.increment_conflicts();
        registry.record_query_shape(2, 5, 1, 1);

        let snapshot = registry.snapshot();
        assert_eq!(snapshot.inserts, 2);
        assert_eq!(snapshot.deletes, 3);
        assert_eq!(snapshot.conflicts, 1);
        assert_eq!(snapshot.partitions_scanned, 2);
        assert_eq!(snapshot.partitions_pruned, 5);
    }

    #[test]
    fn test_snapshot_json() {
        let registry = MetricsRegistry::new();
        registry.increment_queries_executed();
        let json = serde_json::to_value(registry.snapshot()).unwrap();
        assert_eq!(json["queries_executed"], 1);
        assert_eq!(json["hook_failures"], 0);
    }

    #[test]
    fn test_thread_safety() {
        let registry = MetricsRegistry::new();
        std::thread::scope(|s| {
            for _ in 0..8 {
                s.spawn(|| {
                    for _ in 0..100 {
                        registry.increment_inserts();
                    }
                });
            }
        });
        assert_eq!(registry.snapshot().inserts, 800);
    }
}
