//! Export process runner
//!
//! Runs one export command to completion, optionally streaming its output
//! through the progress parser.

use super::cancel::CancellationToken;
use super::pty::{spawn_interactive, InteractiveChild};
use super::stream::LineBuffer;
use crate::error::{Error, Result};
use crate::progress::{LineOutcome, ProgressState};
use std::fmt;
use std::fs::File;
use std::io::{self, Read};
use std::os::fd::AsRawFd;
use std::os::unix::process::CommandExt;
use std::path::PathBuf;
use std::process::{Command, ExitStatus, Stdio};
use std::time::Duration;
use tracing::{debug, info, warn};

/// Bytes requested per read from a terminal
const CHUNK_SIZE: usize = 1000;

/// Default upper bound on a single wait, so cancellation is noticed promptly
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(250);

// ============================================================================
// Command
// ============================================================================

/// One export-tool invocation: `program args... < stdin`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportCommand {
    /// Program to run
    pub program: String,
    /// Arguments
    pub args: Vec<String>,
    /// File fed to the program's standard input (the export script)
    pub stdin: Option<PathBuf>,
}

impl ExportCommand {
    /// Create a command for a program
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            stdin: None,
        }
    }

    /// Add arguments
    #[must_use]
    pub fn with_args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    /// Feed a file on standard input
    #[must_use]
    pub fn with_stdin(mut self, path: impl Into<PathBuf>) -> Self {
        self.stdin = Some(path.into());
        self
    }

    fn build(&self) -> Result<Command> {
        let mut command = Command::new(&self.program);
        command.args(&self.args);
        // Own process group: a terminal interrupt reaches us, not the tool.
        command.process_group(0);

        match &self.stdin {
            Some(path) => {
                let script = File::open(path).map_err(|e| {
                    Error::process(format!("cannot open script '{}': {e}", path.display()))
                })?;
                command.stdin(Stdio::from(script));
            }
            None => {
                command.stdin(Stdio::null());
            }
        }
        Ok(command)
    }
}

impl fmt::Display for ExportCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.program)?;
        for arg in &self.args {
            write!(f, " {arg}")?;
        }
        if let Some(path) = &self.stdin {
            write!(f, " < {}", path.display())?;
        }
        Ok(())
    }
}

// ============================================================================
// Reporting
// ============================================================================

/// Receives every classified output line of a running export
pub trait ProgressReporter {
    /// Called once per complete (or final truncated) line
    fn report(&mut self, line: &str, outcome: &LineOutcome);
}

/// Reporter that writes operator-facing lines through `tracing`
#[derive(Debug, Clone, Default)]
pub struct LogReporter {
    label: String,
}

impl LogReporter {
    /// Create a reporter whose messages are tagged with `label`
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
        }
    }
}

impl ProgressReporter for LogReporter {
    fn report(&mut self, line: &str, outcome: &LineOutcome) {
        if outcome.is_visible() {
            info!(job = %self.label, "{line}");
        } else {
            debug!(job = %self.label, "{line}");
        }
        if let Some(summary) = &outcome.summary {
            info!(job = %self.label, "{summary}");
        }
    }
}

// ============================================================================
// Runner
// ============================================================================

/// Runs export commands, honouring an explicit cancellation token
#[derive(Debug, Clone)]
pub struct ProcessRunner {
    cancel: CancellationToken,
    poll_interval: Duration,
}

impl ProcessRunner {
    /// Create a runner observing `cancel`
    pub fn new(cancel: CancellationToken) -> Self {
        Self {
            cancel,
            poll_interval: DEFAULT_POLL_INTERVAL,
        }
    }

    /// Set the maximum time spent in a single wait
    #[must_use]
    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    /// The token this runner observes
    pub fn cancel_token(&self) -> &CancellationToken {
        &self.cancel
    }

    /// Run `command` to completion and return its exit status.
    ///
    /// With `capture_progress`, stdout and stderr are read through
    /// pseudo-terminals and each line goes through `state` and `reporter`.
    /// Without it, output is discarded and only the exit status is observed.
    pub fn run(
        &self,
        command: &ExportCommand,
        capture_progress: bool,
        state: &mut ProgressState,
        reporter: &mut dyn ProgressReporter,
    ) -> Result<ExitStatus> {
        info!("Running {command}");
        if capture_progress {
            self.run_captured(command, state, reporter)
        } else {
            self.run_quiet(command)
        }
    }

    fn run_quiet(&self, command: &ExportCommand) -> Result<ExitStatus> {
        let mut cmd = command.build()?;
        cmd.stdout(Stdio::null()).stderr(Stdio::null());
        let mut child = cmd
            .spawn()
            .map_err(|e| Error::process(format!("failed to launch '{command}': {e}")))?;

        loop {
            match child.try_wait() {
                Ok(Some(status)) => return Ok(status),
                Ok(None) => {
                    self.acknowledge_interrupt();
                    std::thread::sleep(self.poll_interval);
                }
                Err(e) => {
                    return Err(Error::process(format!("waiting on '{command}': {e}")));
                }
            }
        }
    }

    fn run_captured(
        &self,
        command: &ExportCommand,
        state: &mut ProgressState,
        reporter: &mut dyn ProgressReporter,
    ) -> Result<ExitStatus> {
        let InteractiveChild {
            mut child,
            stdout,
            stderr,
        } = spawn_interactive(command.build()?)
            .map_err(|e| Error::process(format!("failed to launch '{command}': {e}")))?;

        let mut streams = vec![OutStream::new(stdout), OutStream::new(stderr)];
        let mut buf = vec![0u8; CHUNK_SIZE];

        let drained = self.drain(&mut streams, &mut buf, state, reporter);
        if let Err(e) = drained {
            // Don't leave an orphan behind when we can no longer read it.
            let _ = child.kill();
            let _ = child.wait();
            return Err(e);
        }

        child
            .wait()
            .map_err(|e| Error::process(format!("waiting on '{command}': {e}")))
    }

    fn drain(
        &self,
        streams: &mut Vec<OutStream>,
        buf: &mut [u8],
        state: &mut ProgressState,
        reporter: &mut dyn ProgressReporter,
    ) -> Result<()> {
        while !streams.is_empty() {
            let ready = match wait_readable(streams, self.poll_interval) {
                Ok(ready) => ready,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => {
                    self.acknowledge_interrupt();
                    continue;
                }
                Err(e) => return Err(Error::process(format!("poll failed: {e}"))),
            };
            self.acknowledge_interrupt();

            let mut closed = Vec::new();
            for (idx, stream) in streams.iter_mut().enumerate() {
                if !ready[idx] {
                    continue;
                }
                let (lines, open) = stream
                    .read_lines(buf)
                    .map_err(|e| Error::process(format!("terminal read failed: {e}")))?;
                for line in lines {
                    let outcome = state.apply(&line);
                    reporter.report(&line, &outcome);
                }
                if !open {
                    closed.push(idx);
                }
            }
            for idx in closed.into_iter().rev() {
                streams.remove(idx);
            }
        }
        Ok(())
    }

    fn acknowledge_interrupt(&self) {
        if self.cancel.acknowledge() {
            warn!("Received interrupt; waiting for the running export to finish");
        }
    }
}

// ============================================================================
// Terminal streams
// ============================================================================

struct OutStream {
    file: File,
    lines: LineBuffer,
}

impl OutStream {
    fn new(file: File) -> Self {
        Self {
            file,
            lines: LineBuffer::new(),
        }
    }

    /// Read one chunk. Returns the completed lines and whether the stream is
    /// still open; on close, any buffered partial line is returned as well.
    fn read_lines(&mut self, buf: &mut [u8]) -> io::Result<(Vec<String>, bool)> {
        match self.file.read(buf) {
            Ok(0) => Ok((self.lines.finish().into_iter().collect(), false)),
            Ok(n) => Ok((self.lines.feed(&buf[..n]), true)),
            // A terminal master reports EIO once every slave end is closed.
            Err(e) if e.raw_os_error() == Some(libc::EIO) => {
                Ok((self.lines.finish().into_iter().collect(), false))
            }
            Err(e) if e.kind() == io::ErrorKind::Interrupted => Ok((Vec::new(), true)),
            Err(e) => Err(e),
        }
    }
}

/// Wait until any stream is readable (or hung up), or until `timeout` passes.
fn wait_readable(streams: &[OutStream], timeout: Duration) -> io::Result<Vec<bool>> {
    let mut fds: Vec<libc::pollfd> = streams
        .iter()
        .map(|s| libc::pollfd {
            fd: s.file.as_raw_fd(),
            events: libc::POLLIN,
            revents: 0,
        })
        .collect();
    let timeout_ms = libc::c_int::try_from(timeout.as_millis()).unwrap_or(libc::c_int::MAX);

    // SAFETY: `fds` is a valid, exclusively borrowed array of `fds.len()` entries.
    let rc = unsafe { libc::poll(fds.as_mut_ptr(), fds.len() as libc::nfds_t, timeout_ms) };
    if rc < 0 {
        return Err(io::Error::last_os_error());
    }

    Ok(fds
        .iter()
        .map(|p| p.revents & (libc::POLLIN | libc::POLLHUP | libc::POLLERR) != 0)
        .collect())
}
