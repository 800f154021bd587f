//! JSON line I/O for the CLI
//!
//! - Input: one JSON request object per line
//! - Output: one JSON response object per line, `{"ok": ...}` or
//!   `{"error": {"code": ..., "message": ...}}`
//! - UTF-8 only

use std::io::{BufRead, Write};

use serde_json::{json, Value};

use super::errors::{CliError, CliResult};

/// Non-blank lines of `input`
pub fn read_requests<R: BufRead>(input: R) -> impl Iterator<Item = CliResult<String>> {
    input
        .lines()
        .map(|line| line.map_err(CliError::from))
        .filter(|line| !matches!(line, Ok(l) if l.trim().is_empty()))
}

pub fn ok_response(data: Value) -> Value {
    json!({ "ok": data })
}

pub fn error_response(code: &str, message: &str) -> Value {
    json!({ "error": { "code": code, "message": message } })
}

/// Writes one response line and flushes
pub fn write_response<W: Write>(out: &mut W, response: &Value) -> CliResult<()> {
    serde_json::to_writer(&mut *out, response)?;
    writeln!(out)?;
    out.flush()?;
    Ok(())
}
