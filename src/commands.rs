//! CLI command definitions
//!
//! Defines the clap commands for the mini test suite.

use clap::Subcommand;
use std::path::PathBuf;

#[derive(Subcommand)]
pub enum Commands {
    /// Run the scenarios of a scenario file
    Run {
        /// Path to the scenario file (default: ./minitest.yaml, then the config directory)
        #[arg(long, short)]
        config: Option<PathBuf>,

        /// Only run the named scenario (can be specified multiple times)
        #[arg(long = "scenario", short = 's')]
        scenarios: Vec<String>,

        /// Print the final summary as JSON
        #[arg(long)]
        json: bool,
    },

    /// List the discovered test units and their entry points
    List {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}
