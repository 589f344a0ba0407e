//! Progress types

use super::parser::{classify, is_operator_visible};
use tracing::warn;

/// Reporting cadence of the running-average line, in seconds.
///
/// The tool prints a per-minute rate, but each print covers this many seconds.
pub const REPORT_CADENCE_SECS: u64 = 5;

/// Typed result of a matched rule
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProgressEvent {
    /// Total block count for the export
    TotalBlocks(u64),
    /// Reported per-minute block rate
    BlocksPerMinute(u64),
}

/// How a single line was classified
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LineClass {
    /// A rule matched and its counter was applied
    Event(ProgressEvent),
    /// A rule matched but the number could not be read; state untouched
    Malformed,
    /// Informational line the operator should see
    Visible,
    /// Anything else
    Passthrough,
}

/// Outcome of feeding one line to [`ProgressState::apply`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LineOutcome {
    /// The line's classification
    pub class: LineClass,
    /// Human-readable progress summary, set after a counter update
    pub summary: Option<String>,
}

impl LineOutcome {
    /// Whether the raw line should be surfaced to the operator
    pub fn is_visible(&self) -> bool {
        !matches!(self.class, LineClass::Passthrough)
    }
}

/// Per-job block counters
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ProgressState {
    /// Blocks the export will generate (0 until announced)
    pub total_blocks: u64,
    /// Blocks estimated as processed so far
    pub current_blocks: u64,
}

impl ProgressState {
    /// Create a zeroed state
    pub fn new() -> Self {
        Self::default()
    }

    /// Classify a line and apply any counter update it carries
    pub fn apply(&mut self, line: &str) -> LineOutcome {
        match classify(line) {
            Some(Ok(event)) => {
                let summary = match event {
                    ProgressEvent::TotalBlocks(total) => {
                        self.total_blocks = total;
                        None
                    }
                    ProgressEvent::BlocksPerMinute(rate) => {
                        self.current_blocks = self
                            .current_blocks
                            .saturating_add(REPORT_CADENCE_SECS.saturating_mul(rate));
                        Some(self.summary())
                    }
                };
                LineOutcome {
                    class: LineClass::Event(event),
                    summary,
                }
            }
            Some(Err(e)) => {
                warn!("Ignoring progress line: {e}");
                LineOutcome {
                    class: LineClass::Malformed,
                    summary: None,
                }
            }
            None => LineOutcome {
                class: if is_operator_visible(line) {
                    LineClass::Visible
                } else {
                    LineClass::Passthrough
                },
                summary: None,
            },
        }
    }

    /// Percentage complete, clamped to 100.
    ///
    /// `None` until the total block count is known.
    pub fn percent(&self) -> Option<u64> {
        if self.total_blocks == 0 {
            return None;
        }
        let pct = u128::from(self.current_blocks) * 100 / u128::from(self.total_blocks);
        Some(pct.min(100) as u64)
    }

    /// `     1,234/5,678 (21%) Blocks processed`
    pub fn summary(&self) -> String {
        let pct = self
            .percent()
            .map_or_else(|| "?".to_string(), |p| p.to_string());
        format!(
            "     {}/{} ({}%) Blocks processed",
            group_thousands(self.current_blocks),
            group_thousands(self.total_blocks),
            pct
        )
    }
}

/// `1234567` -> `1,234,567`
pub(crate) fn group_thousands(n: u64) -> String {
    let digits = n.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(c);
    }
    out
}
