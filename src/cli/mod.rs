//! CLI module for rangestore
//!
//! Provides command-line interface for:
//! - check: Validate a config and print the partition layout
//! - run: Serve JSON line requests from stdin against one engine

mod args;
mod commands;
mod errors;
mod io;

pub use args::{Cli, Command};
pub use commands::{check, handle_line, handle_request, run, run_command, serve, serve_lines, Request};
pub use errors::{CliError, CliErrorCode, CliResult};
pub use io::{error_response, ok_response, read_requests, write_response};
