//! rangestore CLI entry point
//!
//! Parses arguments, dispatches to the CLI module, prints fatal errors to
//! stderr and exits non-zero on failure.

use rangestore::cli;

fn main() {
    if let Err(e) = cli::run() {
        eprintln!("{}", e);
        std::process::exit(1);
    }
}
