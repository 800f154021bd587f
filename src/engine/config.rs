//! Engine configuration
//!
//! Loaded from a JSON file:
//!
//! ```json
//! {
//!   "schema": {
//!     "partition_column": "check_in",
//!     "columns": { "property_id": "int", "status": "text" }
//!   },
//!   "initial_boundaries": ["2024-01-01", "2024-07-01"],
//!   "auto_split": { "months": 1 },
//!   "sort_threshold": 10000,
//!   "log_level": "warn"
//! }
//! ```

use std::fs;
use std::path::Path;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::errors::ConfigError;
use crate::observability::Severity;
use crate::partition::SplitInterval;
use crate::schema::RelationSchema;

fn default_max_splits_per_write() -> u32 {
    24
}

fn default_sort_threshold() -> usize {
    10_000
}

/// Engine configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EngineConfig {
    pub schema: RelationSchema,

    /// Strictly ascending lower bounds; empty means one catch-all
    #[serde(default)]
    pub initial_boundaries: Vec<NaiveDate>,

    /// Step for splitting the catch-all when a write lands past it
    #[serde(default)]
    pub auto_split: Option<SplitInterval>,

    #[serde(default = "default_max_splits_per_write")]
    pub max_splits_per_write: u32,

    /// Largest unindexed, unlimited result set sorted in memory
    #[serde(default = "default_sort_threshold")]
    pub sort_threshold: usize,

    #[serde(default)]
    pub log_level: Severity,
}

impl EngineConfig {
    /// Config with defaults for everything but the schema
    pub fn new(schema: RelationSchema) -> Self {
        Self {
            schema,
            initial_boundaries: Vec::new(),
            auto_split: None,
            max_splits_per_write: default_max_splits_per_write(),
            sort_threshold: default_sort_threshold(),
            log_level: Severity::default(),
        }
    }

    pub fn with_boundaries(mut self, boundaries: Vec<NaiveDate>) -> Self {
        self.initial_boundaries = boundaries;
        self
    }

    pub fn with_auto_split(mut self, step: SplitInterval) -> Self {
        self.auto_split = Some(step);
        self
    }

    pub fn with_sort_threshold(mut self, threshold: usize) -> Self {
        self.sort_threshold = threshold;
        self
    }

    /// Reads and validates a config file
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config: EngineConfig = serde_json::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.schema
            .validate()
            .map_err(|e| ConfigError::Invalid(e.message().to_string()))?;

        for pair in self.initial_boundaries.windows(2) {
            if pair[0] >= pair[1] {
                return Err(ConfigError::Invalid(format!(
                    "initial_boundaries must be strictly ascending: {} is followed by {}",
                    pair[0], pair[1]
                )));
            }
        }

        if self.sort_threshold == 0 {
            return Err(ConfigError::Invalid("sort_threshold must be positive".into()));
        }

        if let Some(step) = self.auto_split {
            if matches!(step, SplitInterval::Days(0) | SplitInterval::Months(0)) {
                return Err(ConfigError::Invalid("auto_split step must be positive".into()));
            }
            if self.max_splits_per_write == 0 {
                return Err(ConfigError::Invalid(
                    "max_splits_per_write must be positive when auto_split is set".into(),
                ));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::ColumnType;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn write_config(content: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_load_with_defaults() {
        let file = write_config(
            r#"{"schema":{"partition_column":"check_in","columns":{"property_id":"int"}}}"#,
        );
        let config = EngineConfig::load(file.path()).unwrap();

        assert_eq!(config.schema.column_type("property_id"), Some(ColumnType::Int));
        assert!(config.initial_boundaries.is_empty());
        assert_eq!(config.auto_split, None);
        assert_eq!(config.max_splits_per_write, 24);
        assert_eq!(config.sort_threshold, 10_000);
        assert_eq!(config.log_level, Severity::Warn);
    }

    #[test]
    fn test_load_full() {
        let file = write_config(
            r#"{
                "schema": {"partition_column": "check_in"},
                "initial_boundaries": ["2024-01-01", "2024-07-01"],
                "auto_split": {"months": 1},
                "max_splits_per_write": 6,
                "sort_threshold": 500,
                "log_level": "info"
            }"#,
        );
        let config = EngineConfig::load(file.path()).unwrap();
        assert_eq!(config.initial_boundaries.len(), 2);
        assert_eq!(config.auto_split, Some(SplitInterval::Months(1)));
        assert_eq!(config.max_splits_per_write, 6);
        assert_eq!(config.log_level, Severity::Info);
    }

    #[test]
    fn test_unordered_boundaries_rejected() {
        let file = write_config(
            r#"{"schema":{"partition_column":"d"},"initial_boundaries":["2024-07-01","2024-01-01"]}"#,
        );
        assert!(matches!(
            EngineConfig::load(file.path()),
            Err(ConfigError::Invalid(_))
        ));
    }

    #[test]
    fn test_zero_threshold_rejected() {
        let config = EngineConfig::new(RelationSchema::new("d")).with_sort_threshold(0);
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_missing_file() {
        let err = EngineConfig::load("/nonexistent/rangestore.json").unwrap_err();
        assert!(matches!(err, ConfigError::Io { .. }));
    }

    #[test]
    fn test_malformed_json() {
        let file = write_config("{ not json");
        assert!(matches!(
            EngineConfig::load(file.path()),
            Err(ConfigError::Parse(_))
        ));
    }
}
