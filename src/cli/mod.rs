//! CLI module
//!
//! Command-line interface for exporting tables.
//!
//! # Commands
//!
//! - `export` - Run the export tool over a plan and serialize the result
//! - `validate` - Check a plan manifest
//! - `replay` - Feed a captured export-tool log through the progress parser

mod commands;
mod runner;

pub use commands::{Cli, Commands};
pub use runner::Runner;
