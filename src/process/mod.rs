//! Process module
//!
//! Runs one export-tool invocation and streams its output line by line.
//!
//! # Overview
//!
//! - [`spawn_interactive`] starts a command whose stdout and stderr are each
//!   attached to a pseudo-terminal, so the tool believes it is interactive and
//!   prints progress text
//! - [`LineBuffer`] turns raw chunks into complete lines, carrying a partial
//!   trailing line across reads
//! - [`ProcessRunner`] multiplexes both streams with `poll(2)`, feeds lines to
//!   a [`ProgressState`](crate::progress::ProgressState) and reports them
//! - [`CancellationToken`] is handed to every run and checked at each wait

mod cancel;
mod pty;
mod runner;
mod stream;

pub use cancel::CancellationToken;
pub use pty::{spawn_interactive, InteractiveChild};
pub use runner::{ExportCommand, LogReporter, ProcessRunner, ProgressReporter};
pub use stream::LineBuffer;

#[cfg(test)]
mod tests;
