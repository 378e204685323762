//! Command-line interface definitions.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(
    name = "casetriage",
    about = "Reconcile test-case transaction tags against a baseline vocabulary and surface near-duplicate test cases",
    version
)]
pub struct Cli {
    /// Increase log verbosity (-v debug, -vv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run the full analysis over a test-case CSV
    Analyze {
        /// Test-case CSV (requires test_case_id, Description, Transactions)
        #[arg(short, long)]
        cases: PathBuf,

        /// Baseline vocabulary CSV (requires a Transaction column)
        #[arg(short = 'b', long)]
        vocabulary: PathBuf,

        /// Optional JSON object of synonym overrides (source -> target label)
        #[arg(short, long)]
        synonyms: Option<PathBuf>,

        /// Directory for the timestamped run output
        #[arg(short, long, default_value = "output")]
        output_dir: PathBuf,

        /// Session file to load before and save after the run; preserves
        /// learned canonical bindings and merged synonyms across runs
        #[arg(long)]
        session: Option<PathBuf>,

        /// Config file path (defaults to ./config/casetriage.toml, falling
        /// back to embedded defaults)
        #[arg(long)]
        config: Option<PathBuf>,
    },

    /// Write the default configuration to ./config/casetriage.toml
    Init,
}
