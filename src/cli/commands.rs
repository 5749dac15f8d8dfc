//! CLI command definitions using clap.
//!
//! Defines the main CLI structure and subcommands:
//! - describe: list the tools a contract declares
//! - dispatch: run a composite request against the calculator toolset

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Toolset - run composite tool requests against a versioned toolset
#[derive(Parser, Debug)]
#[command(name = "toolset")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Optional config file path
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

impl Cli {
    /// Check if verbose mode is enabled
    pub fn is_verbose(&self) -> bool {
        self.verbose
    }
}

/// Main subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// List the tools a contract declares
    Describe {
        /// Contract YAML file (defaults to the calculator contract)
        #[arg(long)]
        contract: Option<PathBuf>,

        /// Only show this version
        #[arg(short = 'V', long)]
        version: Option<String>,
    },

    /// Run a composite request against the calculator toolset
    Dispatch {
        /// Request as a JSON object, e.g. '{"add": {"a": 2, "b": 3}}'
        request: String,

        /// Contract version to target
        #[arg(short = 'V', long, default_value = "1.0.0")]
        version: String,
    },
}
