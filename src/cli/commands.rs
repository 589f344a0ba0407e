//! CLI commands and argument parsing

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Teradata FastExport orchestration CLI
#[derive(Parser, Debug)]
#[command(name = "tdexport")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Export configuration file (YAML)
    #[arg(short = 'C', long, global = true)]
    pub config: Option<PathBuf>,

    /// Pretty-print JSON output
    #[arg(long, global = true)]
    pub pretty: bool,

    /// Verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

/// CLI subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Export one table
    Export {
        /// Root directory for scripts, raw data and serialized output
        #[arg(long)]
        abs_path: Option<PathBuf>,

        /// Table to export
        #[arg(short, long)]
        table: Option<String>,

        /// Database the table lives in
        #[arg(long)]
        db: Option<String>,

        /// Plan manifest written by the script generator
        #[arg(short, long)]
        plan: Option<PathBuf>,

        /// Serialization mode: columnar (feather) or generic (pickle)
        #[arg(short, long)]
        serialize: Option<String>,

        /// Stream live progress from the export tool
        #[arg(long)]
        step_detail: bool,

        /// Export tool program
        #[arg(long)]
        exporter: Option<String>,

        /// Extra argument for the export tool (repeatable)
        #[arg(long = "exporter-arg")]
        exporter_args: Vec<String>,
    },

    /// Validate a plan manifest
    Validate {
        /// Plan manifest
        plan: PathBuf,
    },

    /// Run a captured export-tool log through the progress parser
    Replay {
        /// Log file
        log: PathBuf,
    },
}
