//! Engine facade
//!
//! Owns the partition manager, the interval set, the record directory and
//! the hook registry, and routes every public operation through them.
//!
//! Lock order, outermost first:
//!
//! 1. hook registry
//! 2. partition admin lock (inside `PartitionManager`)
//! 3. partition locks, in boundary order when two are held
//! 4. record directory
//! 5. interval set
//!
//! Writers re-read the boundary table and retry when the partition they
//! locked has been retired by a split or a drop.

use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, RwLock};

use chrono::NaiveDate;
use serde::Serialize;

use super::config::EngineConfig;
use super::errors::{EngineError, EngineResult};
use super::hooks::{PostWriteHook, WriteEvent};
use crate::errors::ErrorCode;
use crate::executor::{QueryExecutor, QueryResult};
use crate::index::IndexId;
use crate::interval::IntervalSet;
use crate::observability::{
    log_event, Event, Logger, MetricsRegistry, MetricsSnapshot, ObservationScope,
};
use crate::partition::{
    IndexScope, PartitionId, PartitionInfo, PartitionManager, PartitionSlot,
};
use crate::planner::Query;
use crate::schema::{Interval, Record, RecordId, RelationSchema, SchemaError, SchemaValidator, Value};
use crate::sync;

/// Lookups served by one index instance
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct IndexUsage {
    pub partition_id: PartitionId,
    pub index_id: IndexId,
    pub name: String,
    pub hits: u64,
}

type HookList = Vec<Arc<dyn PostWriteHook>>;

/// Date-range partitioned record store
pub struct Engine {
    config: EngineConfig,
    partitions: PartitionManager,
    intervals: RwLock<IntervalSet>,
    /// Partition key of every live record
    directory: RwLock<HashMap<RecordId, NaiveDate>>,
    hooks: RwLock<HookList>,
    metrics: MetricsRegistry,
}

impl Engine {
    /// Validates `config` and builds the initial partition layout
    pub fn open(config: EngineConfig) -> EngineResult<Self> {
        config.validate()?;
        Logger::set_min_severity(config.log_level);

        let partitions = PartitionManager::new(&config.initial_boundaries)?;
        log_event(
            Event::EngineOpen,
            &[
                ("partition_column", config.schema.partition_column.as_str()),
                ("partitions", &partitions.snapshot().len().to_string()),
            ],
        );

        Ok(Self {
            config,
            partitions,
            intervals: RwLock::new(IntervalSet::new()),
            directory: RwLock::new(HashMap::new()),
            hooks: RwLock::new(Vec::new()),
            metrics: MetricsRegistry::new(),
        })
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn schema(&self) -> &RelationSchema {
        &self.config.schema
    }

    /// Number of live records
    pub fn len(&self) -> usize {
        sync::read(&self.directory).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    // ==================
    // Writes
    // ==================

    /// Inserts a record, reserving its interval if it carries one.
    ///
    /// A rejected insert leaves nothing behind.
    pub fn insert(&self, record: Record) -> EngineResult<RecordId> {
        let hooks = sync::read(&self.hooks);

        match self.insert_record(record) {
            Ok(record) => {
                self.metrics.increment_inserts();
                log_event(
                    Event::RecordInserted,
                    &[
                        ("id", record.id.as_str()),
                        ("partition_key", &record.partition_key.to_string()),
                    ],
                );
                self.run_hooks(&hooks, &[WriteEvent::Inserted(&record)]);
                Ok(record.id)
            }
            Err(e) => {
                self.reject_write("insert", &e);
                Err(e)
            }
        }
    }

    fn insert_record(&self, record: Record) -> EngineResult<Record> {
        let record = SchemaValidator::new(&self.config.schema).normalize(record)?;
        self.auto_split(record.partition_key)?;

        loop {
            let slot = self.slot_for(record.partition_key)?;
            let mut partition = sync::write(&slot.partition);
            if partition.is_retired() {
                continue;
            }

            let mut directory = sync::write(&self.directory);
            if directory.contains_key(&record.id) {
                return Err(EngineError::DuplicateRecord(record.id.clone()));
            }
            if let Some(reservation) = &record.reservation {
                sync::write(&self.intervals).reserve(&reservation.group, reservation.interval)?;
            }

            directory.insert(record.id.clone(), record.partition_key);
            partition.insert(record.clone());
            return Ok(record);
        }
    }

    /// Applies `changes` to a record and returns the new version.
    ///
    /// `Null` clears an attribute. A new date under the partition column
    /// moves the record to the partition owning it. The reservation is kept.
    pub fn update(&self, id: &RecordId, changes: BTreeMap<String, Value>) -> EngineResult<Record> {
        let hooks = sync::read(&self.hooks);

        match self.update_record(id, &changes) {
            Ok((old, new)) => {
                self.metrics.increment_updates();
                log_event(
                    Event::RecordUpdated,
                    &[
                        ("id", id.as_str()),
                        ("moved", if old.partition_key != new.partition_key { "true" } else { "false" }),
                    ],
                );
                self.run_hooks(&hooks, &[WriteEvent::Deleted(&old), WriteEvent::Inserted(&new)]);
                Ok(new)
            }
            Err(e) => {
                self.reject_write("update", &e);
                Err(e)
            }
        }
    }

    fn update_record(
        &self,
        id: &RecordId,
        changes: &BTreeMap<String, Value>,
    ) -> EngineResult<(Record, Record)> {
        let schema = &self.config.schema;
        if let Some(column) = changes.keys().find(|c| !schema.has_column(c)) {
            return Err(SchemaError::no_such_column(column.clone()).into());
        }

        let moved_to = match changes.get(&schema.partition_column) {
            None => None,
            Some(Value::Date(d)) => Some(*d),
            Some(Value::Null) => {
                return Err(SchemaError::invalid_record(format!(
                    "Column '{}' cannot be cleared",
                    schema.partition_column
                ))
                .into())
            }
            Some(other) => {
                return Err(SchemaError::type_mismatch(
                    schema.partition_column.clone(),
                    "date",
                    other.type_name(),
                )
                .into())
            }
        };
        if let Some(key) = moved_to {
            self.auto_split(key)?;
        }

        loop {
            let old_key = self.directory_key(id)?;
            let new_key = moved_to.unwrap_or(old_key);

            let table = self.partitions.snapshot();
            let old_pos = table.locate(old_key)?;
            let new_pos = table.locate(new_key)?;
            let old_slot = table.slots()[old_pos].clone();
            let new_slot = table.slots()[new_pos].clone();
            drop(table);

            if old_pos == new_pos {
                let mut partition = sync::write(&old_slot.partition);
                if partition.is_retired() {
                    continue;
                }
                let Some(current) = partition.get(id).cloned() else {
                    self.missing_or_moved(id, old_key)?;
                    continue;
                };

                let updated = self.apply_changes(&current, changes, new_key)?;
                partition.remove(id);
                partition.insert(updated.clone());
                if new_key != old_key {
                    sync::write(&self.directory).insert(id.clone(), new_key);
                }
                return Ok((current, updated));
            }

            let (low, high) = if old_pos < new_pos {
                (&old_slot, &new_slot)
            } else {
                (&new_slot, &old_slot)
            };
            let mut low_guard = sync::write(&low.partition);
            let mut high_guard = sync::write(&high.partition);
            if low_guard.is_retired() || high_guard.is_retired() {
                continue;
            }
            let (source, target) = if old_pos < new_pos {
                (&mut low_guard, &mut high_guard)
            } else {
                (&mut high_guard, &mut low_guard)
            };

            let Some(current) = source.get(id).cloned() else {
                self.missing_or_moved(id, old_key)?;
                continue;
            };

            let updated = self.apply_changes(&current, changes, new_key)?;
            source.remove(id);
            target.insert(updated.clone());
            sync::write(&self.directory).insert(id.clone(), new_key);
            return Ok((current, updated));
        }
    }

    fn apply_changes(
        &self,
        current: &Record,
        changes: &BTreeMap<String, Value>,
        key: NaiveDate,
    ) -> EngineResult<Record> {
        let mut record = current.clone();
        for (column, value) in changes {
            if value.is_null() {
                record.attributes.remove(column);
            } else {
                record.attributes.insert(column.clone(), value.clone());
            }
        }
        record.partition_key = key;
        record
            .attributes
            .insert(self.config.schema.partition_column.clone(), Value::Date(key));

        Ok(SchemaValidator::new(&self.config.schema).normalize(record)?)
    }

    /// Removes a record, its index entries and its reservation
    pub fn delete(&self, id: &RecordId) -> EngineResult<Record> {
        let hooks = sync::read(&self.hooks);

        match self.delete_record(id) {
            Ok(record) => {
                self.metrics.add_deletes(1);
                log_event(Event::RecordDeleted, &[("id", id.as_str())]);
                self.run_hooks(&hooks, &[WriteEvent::Deleted(&record)]);
                Ok(record)
            }
            Err(e) => {
                self.reject_write("delete", &e);
                Err(e)
            }
        }
    }

    fn delete_record(&self, id: &RecordId) -> EngineResult<Record> {
        loop {
            let key = self.directory_key(id)?;
            let slot = self.slot_for(key)?;
            let mut partition = sync::write(&slot.partition);
            if partition.is_retired() {
                continue;
            }
            let Some(record) = partition.get(id).cloned() else {
                self.missing_or_moved(id, key)?;
                continue;
            };

            let mut directory = sync::write(&self.directory);
            if let Some(reservation) = &record.reservation {
                sync::write(&self.intervals)
                    .release_interval(&reservation.group, reservation.interval)?;
            }
            directory.remove(id);
            partition.remove(id);
            return Ok(record);
        }
    }

    // ==================
    // Reads
    // ==================

    /// Current version of a record
    pub fn get(&self, id: &RecordId) -> EngineResult<Record> {
        loop {
            let key = self.directory_key(id)?;
            let slot = self.slot_for(key)?;
            let partition = sync::read(&slot.partition);
            if partition.is_retired() {
                continue;
            }
            match partition.get(id) {
                Some(record) => return Ok(record.clone()),
                None => self.missing_or_moved(id, key)?,
            }
        }
    }

    /// Committed intervals of `group` intersecting `[start, end)`
    pub fn overlapping(
        &self,
        group: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> EngineResult<Vec<Interval>> {
        let intervals = sync::read(&self.intervals);
        Ok(intervals.overlapping(group, start, end)?.collect())
    }

    /// Runs a query against the current partition layout
    pub fn query(&self, query: &Query) -> EngineResult<QueryResult> {
        let table = self.partitions.snapshot();
        let executor = QueryExecutor::new(&self.config.schema, self.config.sort_threshold);

        match executor.execute(&table, query) {
            Ok(result) => {
                let trace = &result.explain;
                self.metrics.increment_queries_executed();
                self.metrics.record_query_shape(
                    trace.partitions.len() as u64,
                    trace.pruned_partitions() as u64,
                    trace.index_lookups() as u64,
                    trace.full_scans() as u64,
                );
                log_event(
                    Event::QueryExecuted,
                    &[
                        ("query_id", &trace.query_id.to_string()),
                        ("partitions", &trace.partitions.len().to_string()),
                        ("rows", &result.len().to_string()),
                        ("elapsed_us", &trace.elapsed_ticks.to_string()),
                    ],
                );
                Ok(result)
            }
            Err(e) => {
                if e.code() == ErrorCode::DeadlineExceeded {
                    self.metrics.increment_deadline_expiries();
                    log_event(Event::DeadlineExceeded, &[("reason", e.message())]);
                } else {
                    self.metrics.increment_queries_rejected();
                    log_event(
                        Event::QueryRejected,
                        &[("code", e.code().code()), ("reason", e.message())],
                    );
                }
                Err(e.into())
            }
        }
    }

    // ==================
    // Administration
    // ==================

    /// Defines an index over `columns` in the partitions named by `scope`
    pub fn define_index(&self, scope: IndexScope, columns: Vec<String>) -> EngineResult<IndexId> {
        if let Some(column) = columns.iter().find(|c| !self.config.schema.has_column(c)) {
            return Err(SchemaError::no_such_column(column.clone()).into());
        }

        let joined = columns.join(",");
        let id = self.partitions.define_index(scope, columns)?;

        let scope = match scope {
            IndexScope::All => "all".to_string(),
            IndexScope::Partition(p) => format!("partition:{}", p),
        };
        log_event(
            Event::IndexDefined,
            &[
                ("index_id", &id.to_string()),
                ("columns", &joined),
                ("scope", &scope),
            ],
        );
        Ok(id)
    }

    /// Splits the partition owning `boundary` at `boundary`.
    ///
    /// Returns the id of the new partition ending at `boundary`.
    pub fn insert_boundary(&self, boundary: NaiveDate) -> EngineResult<PartitionId> {
        let scope = ObservationScope::new(Event::PartitionSplit.as_str())
            .with_field("boundary", boundary);

        match self.partitions.insert_boundary(boundary) {
            Ok(id) => {
                self.metrics.add_partitions_created(1);
                scope.complete(&[("partition_id", &id.to_string())]);
                Ok(id)
            }
            Err(e) => {
                scope.fail_as(e.severity().into(), e.message());
                Err(e.into())
            }
        }
    }

    /// Drops a partition and every record in it.
    ///
    /// Returns the number of records removed.
    pub fn drop_partition(&self, id: PartitionId) -> EngineResult<usize> {
        let hooks = sync::read(&self.hooks);
        let scope = ObservationScope::new(Event::PartitionDropped.as_str()).with_field("partition_id", id);

        // Runs under the victim's write lock, before the new layout is published
        let release = |records: &[Record]| {
            let mut directory = sync::write(&self.directory);
            let mut intervals = sync::write(&self.intervals);
            for record in records {
                directory.remove(&record.id);
                if let Some(reservation) = &record.reservation {
                    if let Err(e) = intervals.release_interval(&reservation.group, reservation.interval) {
                        Logger::error(
                            "INTERVAL_RELEASE_FAILED",
                            &[("id", record.id.as_str()), ("reason", e.message())],
                        );
                    }
                }
            }
        };

        let records = match self.partitions.drop_partition_with(id, release) {
            Ok(records) => records,
            Err(e) => {
                scope.fail_as(e.severity().into(), e.message());
                return Err(e.into());
            }
        };

        self.metrics.increment_partitions_dropped();
        self.metrics.add_deletes(records.len() as u64);

        let events: Vec<WriteEvent<'_>> = records.iter().map(WriteEvent::Deleted).collect();
        self.run_hooks(&hooks, &events);

        scope.complete(&[("records", &records.len().to_string())]);
        Ok(records.len())
    }

    // ==================
    // Introspection
    // ==================

    /// Partition layout in range order
    pub fn partitions(&self) -> Vec<PartitionInfo> {
        self.partitions.partitions()
    }

    /// Hit counters of every index instance, in range then definition order
    pub fn index_usage(&self) -> Vec<IndexUsage> {
        let table = self.partitions.snapshot();
        let mut usage = Vec::new();

        for slot in table.slots() {
            let partition = sync::read(&slot.partition);
            let indexes = partition.indexes();
            for definition in indexes.definitions() {
                usage.push(IndexUsage {
                    partition_id: slot.id,
                    index_id: definition.id,
                    name: definition.name(),
                    hits: indexes.hits(definition.id).unwrap_or(0),
                });
            }
        }
        usage
    }

    pub fn metrics(&self) -> MetricsSnapshot {
        self.metrics.snapshot()
    }

    // ==================
    // Hooks
    // ==================

    /// Registers a hook for writes committed from now on
    pub fn add_hook(&self, hook: Arc<dyn PostWriteHook>) {
        sync::write(&self.hooks).push(hook);
    }

    /// Replays every live record to `hook` as an insert, then registers it.
    ///
    /// Writes wait until the replay finishes. If the hook fails during the
    /// replay it is not registered.
    pub fn add_hook_with_backfill(&self, hook: Arc<dyn PostWriteHook>) -> EngineResult<()> {
        let mut hooks = sync::write(&self.hooks);

        let table = self.partitions.snapshot();
        let mut records = Vec::new();
        for slot in table.slots() {
            records.extend(sync::read(&slot.partition).records().cloned());
        }

        for record in &records {
            hook.on_commit(&WriteEvent::Inserted(record))?;
        }
        hooks.push(hook);
        Ok(())
    }

    fn run_hooks(&self, hooks: &[Arc<dyn PostWriteHook>], events: &[WriteEvent<'_>]) {
        for hook in hooks {
            for event in events {
                if let Err(e) = hook.on_commit(event) {
                    self.metrics.increment_hook_failures();
                    log_event(
                        Event::HookFailed,
                        &[
                            ("hook", hook.name()),
                            ("id", event.record().id.as_str()),
                            ("reason", e.message.as_str()),
                        ],
                    );
                }
            }
        }
    }

    // ==================
    // Helpers
    // ==================

    fn auto_split(&self, key: NaiveDate) -> EngineResult<()> {
        let Some(step) = self.config.auto_split else {
            return Ok(());
        };

        let created = self
            .partitions
            .ensure_bounded(key, step, self.config.max_splits_per_write)?;
        if !created.is_empty() {
            self.metrics.add_partitions_created(created.len() as u64);
            log_event(
                Event::PartitionAutoSplit,
                &[
                    ("key", &key.to_string()),
                    ("created", &created.len().to_string()),
                ],
            );
        }
        Ok(())
    }

    fn slot_for(&self, key: NaiveDate) -> EngineResult<PartitionSlot> {
        let table = self.partitions.snapshot();
        let pos = table.locate(key)?;
        Ok(table.slots()[pos].clone())
    }

    fn directory_key(&self, id: &RecordId) -> EngineResult<NaiveDate> {
        sync::read(&self.directory)
            .get(id)
            .copied()
            .ok_or_else(|| EngineError::RecordNotFound(id.clone()))
    }

    /// Called with the partition at `key` locked and `id` absent from it.
    ///
    /// Ok means the record moved and the caller should retry. A directory
    /// entry still pointing at `key` belongs to a partition being dropped.
    fn missing_or_moved(&self, id: &RecordId, key: NaiveDate) -> EngineResult<()> {
        match self.directory_key(id)? {
            current if current != key => Ok(()),
            _ => Err(EngineError::RecordNotFound(id.clone())),
        }
    }

    fn reject_write(&self, op: &str, err: &EngineError) {
        let message = err.message();
        if err.code() == ErrorCode::Conflict {
            self.metrics.increment_conflicts();
            log_event(Event::ReservationConflict, &[("op", op), ("reason", &message)]);
        } else {
            self.metrics.increment_writes_rejected();
            log_event(
                Event::WriteRejected,
                &[("op", op), ("code", err.code().code()), ("reason", &message)],
            );
        }
    }
}
