//! CLI argument definitions using clap.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// DataEater: sniff, load and clean spreadsheet and CSV files
#[derive(Parser)]
#[command(name = "dataeater")]
#[command(version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Enable verbose output (debug logging)
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// JSON configuration file
    #[arg(long, global = true, env = "DATAEATER_CONFIG")]
    pub config: Option<PathBuf>,

    /// Engine memory limit in bytes (overrides the configuration file)
    #[arg(long, global = true, env = "DATAEATER_MEMORY_LIMIT")]
    pub memory_limit: Option<i64>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Detect encoding, delimiter and line endings, and scan for jagged rows
    Sniff {
        /// Path to the data file
        #[arg(value_name = "FILE")]
        file: PathBuf,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Load a file and show its schema and health
    Inspect {
        /// Path to the data file (CSV/TSV/XLSX/ODS)
        #[arg(value_name = "FILE")]
        file: PathBuf,

        /// Also show statistics for this column
        #[arg(short, long)]
        column: Option<String>,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Load a file and run a read-only SQL query against `current_dataset`
    Query {
        /// Path to the data file
        #[arg(value_name = "FILE")]
        file: PathBuf,

        /// SELECT statement
        #[arg(value_name = "SQL")]
        sql: String,

        /// Maximum rows to print
        #[arg(short, long, default_value = "20")]
        limit: usize,
    },

    /// Load a file and apply a JSON script of mutations
    Apply {
        /// Path to the data file
        #[arg(value_name = "FILE")]
        file: PathBuf,

        /// JSON array of {sql, description, kind} steps
        #[arg(value_name = "SCRIPT")]
        script: PathBuf,

        /// Save the history log to this path
        #[arg(long, value_name = "OUT")]
        history: Option<PathBuf>,

        /// Save the history log next to the data file as <file>.history.json
        #[arg(long, conflicts_with = "history")]
        save_history: bool,

        /// Run every step in one transaction
        #[arg(long)]
        transactional: bool,

        /// Write the resulting rows as a JSON array of objects
        #[arg(short, long)]
        export: Option<PathBuf>,
    },

    /// Serve the data store over a local JSON HTTP API
    Serve {
        /// Path to the data file
        #[arg(value_name = "FILE")]
        file: PathBuf,

        /// Port for the web server
        #[arg(short, long, default_value = "3141")]
        port: u16,

        /// Favorites file (default: in memory only)
        #[arg(long)]
        favorites: Option<PathBuf>,
    },
}
