//! Rule table for export-tool output lines
//!
//! Each rule maps a marker phrase to an extraction function returning a typed
//! event. The first rule whose marker appears in the line wins.

use super::types::ProgressEvent;
use crate::error::{Error, Result};
use once_cell::sync::Lazy;
use regex::Regex;

/// Marker announcing the total number of blocks the export will produce
pub const TOTAL_BLOCKS_MARKER: &str = "data blocks generated.";

/// Marker on the periodic throughput update
pub const RUNNING_AVERAGE_MARKER: &str = "running average";

/// Phrases worth surfacing to the operator even when they carry no counters
const VISIBLE_MARKERS: &[&str] = &[
    "0001",
    "0002",
    "0003",
    "0004",
    "Select request submitted to the RDBMS.",
    TOTAL_BLOCKS_MARKER,
    "Retrieval Rows statistics:",
    "Elapsed time:",
    "CPU time:",
    "MB/sec:",
    "MB/cpusec:",
    "Total processor time",
    "Start :",
    "End   :",
    "Highest return",
    RUNNING_AVERAGE_MARKER,
];

static BLOCKS_RATE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(\S+)\s+blocks\b").expect("valid blocks-rate regex"));

type Extractor = fn(&str) -> Result<ProgressEvent>;

struct Rule {
    marker: &'static str,
    extract: Extractor,
}

const RULES: &[Rule] = &[
    Rule {
        marker: TOTAL_BLOCKS_MARKER,
        extract: extract_total_blocks,
    },
    Rule {
        marker: RUNNING_AVERAGE_MARKER,
        extract: extract_running_average,
    },
];

/// Classify one output line.
///
/// Returns `None` when no rule marker is present, otherwise the extracted
/// event or the reason the embedded number could not be read.
pub fn classify(line: &str) -> Option<Result<ProgressEvent>> {
    RULES
        .iter()
        .find(|rule| line.contains(rule.marker))
        .map(|rule| (rule.extract)(line))
}

/// Whether a line should be shown to the operator
pub fn is_operator_visible(line: &str) -> bool {
    VISIBLE_MARKERS.iter().any(|m| line.contains(m))
}

/// `Select execution completed. 1234 data blocks generated.`
///
/// The count sits between the first `.` and the next space.
fn extract_total_blocks(line: &str) -> Result<ProgressEvent> {
    let dot = line
        .find('.')
        .ok_or_else(|| Error::progress_parse(line, "no '.' before block count"))?;
    let token = line[dot + 1..]
        .trim_start()
        .split(' ')
        .next()
        .unwrap_or_default();

    token
        .parse::<u64>()
        .map(ProgressEvent::TotalBlocks)
        .map_err(|e| Error::progress_parse(line, format!("bad block count '{token}': {e}")))
}

/// `UTY8732 26263.60 blocks processed per minute (running average).`
///
/// Only the integer part of the rate is used.
fn extract_running_average(line: &str) -> Result<ProgressEvent> {
    let caps = BLOCKS_RATE
        .captures(line)
        .ok_or_else(|| Error::progress_parse(line, "no rate before 'blocks'"))?;
    let rate = &caps[1];
    let whole = rate.split('.').next().unwrap_or_default();

    whole
        .parse::<u64>()
        .map(ProgressEvent::BlocksPerMinute)
        .map_err(|e| Error::progress_parse(line, format!("bad block rate '{rate}': {e}")))
}
