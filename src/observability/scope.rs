//! ObservationScope for begin/complete logging around admin operations
//!
//! - Logs `{name}_BEGIN` on creation
//! - Logs `{name}_COMPLETE` with elapsed microseconds on `complete`
//! - Logs `{name}_FAILED` on `fail`, or if dropped without either

use std::time::Instant;

use super::logger::{Logger, Severity};

/// Brackets one operation in the log
///
/// ```ignore
/// let scope = ObservationScope::new("INSERT_BOUNDARY").with_field("boundary", b);
/// match manager.insert_boundary(b) {
///     Ok(id) => scope.complete(&[("partition_id", &id.to_string())]),
///     Err(e) => scope.fail_as(e.severity().into(), e.message()),
/// }
/// ```
pub struct ObservationScope {
    name: &'static str,
    fields: Vec<(&'static str, String)>,
    started: Instant,
    finished: bool,
}

impl ObservationScope {
    pub fn new(name: &'static str) -> Self {
        Logger::info(&format!("{}_BEGIN", name), &[]);
        Self {
            name,
            fields: Vec::new(),
            started: Instant::now(),
            finished: false,
        }
    }

    /// Field repeated on the closing line
    pub fn with_field(mut self, key: &'static str, value: impl ToString) -> Self {
        self.fields.push((key, value.to_string()));
        self
    }

    pub fn elapsed_us(&self) -> String {
        self.started.elapsed().as_micros().to_string()
    }

    pub fn complete(mut self, extra: &[(&str, &str)]) {
        self.finish(Severity::Info, "COMPLETE", extra);
    }

    pub fn fail(self, reason: &str) {
        self.fail_as(Severity::Error, reason);
    }

    /// `fail` at a chosen severity; rejected requests log at WARN
    pub fn fail_as(mut self, severity: Severity, reason: &str) {
        self.finish(severity, "FAILED", &[("reason", reason)]);
    }

    fn finish(&mut self, severity: Severity, suffix: &str, extra: &[(&str, &str)]) {
        self.finished = true;
        let elapsed = self.elapsed_us();
        let mut fields: Vec<(&str, &str)> =
            self.fields.iter().map(|(k, v)| (*k, v.as_str())).collect();
        fields.extend_from_slice(extra);
        fields.push(("elapsed_us", elapsed.as_str()));
        Logger::log(severity, &format!("{}_{}", self.name, suffix), &fields);
    }
}

impl Drop for ObservationScope {
    fn drop(&mut self) {
        if !self.finished {
            self.finish(Severity::Warn, "FAILED", &[("reason", "scope dropped without completion")]);
        }
    }
}
