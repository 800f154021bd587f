//! Observability
//!
//! - Structured logging (JSON lines)
//! - Monotonic counters
//! - Typed lifecycle events
//!
//! Observability is read-only: nothing here changes engine behaviour, and a
//! failure to write a log line is ignored.

mod events;
mod logger;
mod metrics;
mod scope;

pub use events::Event;
pub use logger::{Logger, Severity};
pub use metrics::{MetricsRegistry, MetricsSnapshot};
pub use scope::ObservationScope;

/// Logs an event at its own severity
pub fn log_event(event: Event, fields: &[(&str, &str)]) {
    Logger::log(event.severity(), event.as_str(), fields);
}
