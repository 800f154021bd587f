//! CLI argument definitions using clap
//!
//! Commands:
//! - rangestore check --config <path>
//! - rangestore run --config <path>

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// rangestore - date-range partitioned record store
#[derive(Parser, Debug)]
#[command(name = "rangestore")]
#[command(version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Validate a configuration file and print the partition layout
    Check {
        /// Path to configuration file
        #[arg(long, default_value = "./rangestore.json")]
        config: PathBuf,
    },

    /// Serve JSON requests from stdin, one per line
    Run {
        /// Path to configuration file
        #[arg(long, default_value = "./rangestore.json")]
        config: PathBuf,
    },
}

impl Cli {
    pub fn parse_args() -> Self {
        Cli::parse()
    }
}
