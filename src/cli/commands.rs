//! CLI command implementations
//!
//! `run` serves requests of the form `{"op": "<name>", ...}`:
//!
//! | op | fields | ok payload |
//! |---|---|---|
//! | `insert` | `record` | `{"id"}` |
//! | `update` | `id`, `changes` | record |
//! | `delete` | `id` | record |
//! | `get` | `id` | record |
//! | `query` | `query`, `timeout_ms`? | `{"ids", "explain"}` |
//! | `overlapping` | `group`, `start`, `end` | intervals |
//! | `define_index` | `columns`, `scope`? | `{"index_id"}` |
//! | `insert_boundary` | `boundary` | `{"partition_id"}` |
//! | `drop_partition` | `partition_id` | `{"removed"}` |
//! | `partitions` | | partition layout |
//! | `index_usage` | | hit counters |
//! | `metrics` | | counters |

use std::collections::BTreeMap;
use std::io::{self, BufRead, Write};
use std::path::Path;
use std::time::Duration;

use chrono::NaiveDate;
use serde::Deserialize;
use serde_json::{json, Value as Json};

use crate::engine::{Engine, EngineConfig, EngineResult};
use crate::observability::{log_event, Event};
use crate::partition::{IndexScope, PartitionId};
use crate::planner::Query;
use crate::schema::{Record, RecordId, Value};

use super::args::Command;
use super::errors::CliResult;
use super::io::{error_response, ok_response, read_requests, write_response};

const BAD_REQUEST: &str = "RANGE_CLI_BAD_REQUEST";

/// One request line
#[derive(Debug, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum Request {
    Insert {
        record: Record,
    },
    Update {
        id: RecordId,
        changes: BTreeMap<String, Value>,
    },
    Delete {
        id: RecordId,
    },
    Get {
        id: RecordId,
    },
    Query {
        query: Query,
        #[serde(default)]
        timeout_ms: Option<u64>,
    },
    Overlapping {
        group: String,
        start: NaiveDate,
        end: NaiveDate,
    },
    DefineIndex {
        columns: Vec<String>,
        #[serde(default)]
        scope: Option<IndexScope>,
    },
    InsertBoundary {
        boundary: NaiveDate,
    },
    DropPartition {
        partition_id: PartitionId,
    },
    Partitions,
    IndexUsage,
    Metrics,
}

/// Main CLI entry point
pub fn run() -> CliResult<()> {
    let cli = super::args::Cli::parse_args();
    run_command(cli.command)
}

pub fn run_command(cmd: Command) -> CliResult<()> {
    match cmd {
        Command::Check { config } => check(&config),
        Command::Run { config } => serve(&config),
    }
}

/// Loads the config, opens an engine and prints its layout
pub fn check(config_path: &Path) -> CliResult<()> {
    let engine = open(config_path)?;
    let layout = json!({
        "partition_column": engine.schema().partition_column,
        "partitions": engine.partitions(),
    });
    write_response(&mut io::stdout().lock(), &ok_response(layout))
}

/// Serves stdin requests until end of input
pub fn serve(config_path: &Path) -> CliResult<()> {
    let engine = open(config_path)?;
    let stdin = io::stdin();
    let stdout = io::stdout();
    serve_lines(&engine, stdin.lock(), &mut stdout.lock())
}

/// Answers every request line of `input` on `out`
pub fn serve_lines<R: BufRead, W: Write>(engine: &Engine, input: R, out: &mut W) -> CliResult<()> {
    for line in read_requests(input) {
        let response = handle_line(engine, &line?);
        write_response(out, &response)?;
    }
    Ok(())
}

/// Parses and executes one request line.
///
/// Always produces a response; malformed lines get a `RANGE_CLI_BAD_REQUEST`
/// error.
pub fn handle_line(engine: &Engine, line: &str) -> Json {
    let request: Request = match serde_json::from_str(line) {
        Ok(request) => request,
        Err(e) => return error_response(BAD_REQUEST, &e.to_string()),
    };

    match handle_request(engine, request) {
        Ok(data) => ok_response(data),
        Err(e) => error_response(e.code().code(), &e.message()),
    }
}

pub fn handle_request(engine: &Engine, request: Request) -> EngineResult<Json> {
    let data = match request {
        Request::Insert { record } => json!({ "id": engine.insert(record)? }),
        Request::Update { id, changes } => to_json(&engine.update(&id, changes)?),
        Request::Delete { id } => to_json(&engine.delete(&id)?),
        Request::Get { id } => to_json(&engine.get(&id)?),
        Request::Query { query, timeout_ms } => {
            let query = match timeout_ms {
                Some(ms) => query.with_timeout(Duration::from_millis(ms)),
                None => query,
            };
            to_json(&engine.query(&query)?)
        }
        Request::Overlapping { group, start, end } => {
            to_json(&engine.overlapping(&group, start, end)?)
        }
        Request::DefineIndex { columns, scope } => {
            let id = engine.define_index(scope.unwrap_or(IndexScope::All), columns)?;
            json!({ "index_id": id })
        }
        Request::InsertBoundary { boundary } => {
            json!({ "partition_id": engine.insert_boundary(boundary)? })
        }
        Request::DropPartition { partition_id } => {
            json!({ "removed": engine.drop_partition(partition_id)? })
        }
        Request::Partitions => to_json(&engine.partitions()),
        Request::IndexUsage => to_json(&engine.index_usage()),
        Request::Metrics => to_json(&engine.metrics()),
    };
    Ok(data)
}

fn open(config_path: &Path) -> CliResult<Engine> {
    let config = EngineConfig::load(config_path)?;
    log_event(
        Event::ConfigLoaded,
        &[("path", &config_path.display().to_string())],
    );
    Ok(Engine::open(config)?)
}

// Every response type serializes infallibly (string keys, no non-finite floats).
fn to_json<T: serde::Serialize>(value: &T) -> Json {
    serde_json::to_value(value).unwrap_or(Json::Null)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{ColumnType, RelationSchema};
    use std::io::Cursor;

    fn engine() -> Engine {
        let schema = RelationSchema::new("check_in")
            .with_column("property_id", ColumnType::Int)
            .with_column("status", ColumnType::Text);
        let date = |s| NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap();
        let config =
            EngineConfig::new(schema).with_boundaries(vec![date("2024-01-01"), date("2024-07-01")]);
        Engine::open(config).unwrap()
    }

    fn insert_line(id: &str, start: &str, end: &str) -> String {
        format!(
            r#"{{"op":"insert","record":{{"id":"{id}","partition_key":"{start}","attributes":{{"property_id":{{"int":7}}}},"reservation":{{"group":"P1","interval":{{"start":"{start}","end":"{end}"}}}}}}}}"#
        )
    }

    #[test]
    fn test_insert_then_get() {
        let engine = engine();
        let response = handle_line(&engine, &insert_line("b1", "2024-06-01", "2024-06-05"));
        assert_eq!(response, json!({"ok": {"id": "b1"}}));

        let response = handle_line(&engine, r#"{"op":"get","id":"b1"}"#);
        assert_eq!(response["ok"]["attributes"]["property_id"], json!({"int": 7}));
    }

    #[test]
    fn test_conflict_is_reported() {
        let engine = engine();
        handle_line(&engine, &insert_line("b1", "2024-06-01", "2024-06-05"));
        let response = handle_line(&engine, &insert_line("b2", "2024-06-03", "2024-06-07"));
        assert_eq!(response["error"]["code"], "RANGE_CONFLICT");
    }

    #[test]
    fn test_bad_request() {
        let engine = engine();
        let response = handle_line(&engine, r#"{"op":"explode"}"#);
        assert_eq!(response["error"]["code"], BAD_REQUEST);

        let response = handle_line(&engine, "not json");
        assert_eq!(response["error"]["code"], BAD_REQUEST);
    }

    #[test]
    fn test_query_and_admin_requests() {
        let engine = engine();
        let response = handle_line(&engine, r#"{"op":"define_index","columns":["property_id"]}"#);
        assert_eq!(response, json!({"ok": {"index_id": 1}}));

        handle_line(&engine, &insert_line("b1", "2024-06-01", "2024-06-05"));
        handle_line(&engine, &insert_line("b2", "2024-08-01", "2024-08-05"));

        let response = handle_line(
            &engine,
            r#"{"op":"query","query":{"terms":[{"column":"property_id","eq":{"int":7}}],"order_by":{"column":"check_in","direction":"desc"}},"timeout_ms":5000}"#,
        );
        assert_eq!(response["ok"]["ids"], json!(["b2", "b1"]));
        assert_eq!(response["ok"]["explain"]["merge"], "range_ordered");

        let response = handle_line(&engine, r#"{"op":"insert_boundary","boundary":"2024-10-01"}"#);
        assert_eq!(response, json!({"ok": {"partition_id": 2}}));

        let response = handle_line(&engine, r#"{"op":"partitions"}"#);
        assert_eq!(response["ok"].as_array().unwrap().len(), 3);

        let response = handle_line(&engine, r#"{"op":"drop_partition","partition_id":0}"#);
        assert_eq!(response, json!({"ok": {"removed": 1}}));

        let response = handle_line(&engine, r#"{"op":"metrics"}"#);
        assert_eq!(response["ok"]["inserts"], 2);
        assert_eq!(response["ok"]["partitions_dropped"], 1);
    }

    #[test]
    fn test_serve_lines() {
        let engine = engine();
        let input = format!(
            "{}\n\n{}\n",
            insert_line("b1", "2024-06-01", "2024-06-05"),
            r#"{"op":"overlapping","group":"P1","start":"2024-06-04","end":"2024-06-10"}"#
        );

        let mut out = Vec::new();
        serve_lines(&engine, Cursor::new(input), &mut out).unwrap();

        let text = String::from_utf8(out).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[1], r#"{"ok":[{"end":"2024-06-05","start":"2024-06-01"}]}"#);
    }
}
