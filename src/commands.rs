//! CLI command definitions
//!
//! Defines the clap commands for the suite CLI.

use clap::Subcommand;
use std::path::PathBuf;

#[derive(Subcommand)]
pub enum Commands {
    /// Run the built-in scenarios against the target API
    Run {
        /// Only run these scenarios (position or name, repeatable)
        #[arg(long, short)]
        only: Vec<String>,

        /// Output results as JSON
        #[arg(long)]
        json: bool,
    },

    /// List the built-in scenarios
    List,

    /// Execute scenarios defined in YAML files
    Test {
        /// Paths to YAML scenario files
        #[arg(required = true)]
        paths: Vec<PathBuf>,

        /// Output results as JSON
        #[arg(long)]
        json: bool,
    },

    /// Show the effective configuration
    Config,
}
