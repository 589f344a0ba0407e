//! Progress module
//!
//! Classifies export-tool output lines and tracks block counters.
//!
//! # Overview
//!
//! FastExport reports progress in free-form text. Two line shapes matter:
//! - `... completed. 1234 data blocks generated.` sets the total block count
//! - `... 2626.60 blocks processed per minute (running average).` advances
//!   the current block count by five times the reported figure
//!
//! Everything else is passed through untouched.

mod parser;
mod types;

pub use parser::{classify, is_operator_visible};
pub use types::{LineClass, LineOutcome, ProgressEvent, ProgressState};
