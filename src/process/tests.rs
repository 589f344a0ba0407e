//! Tests for process module

use super::*;
use crate::error::Error;
use crate::progress::{LineOutcome, ProgressState};
use pretty_assertions::assert_eq;
use std::time::Duration;

#[derive(Default)]
struct Collect {
    lines: Vec<String>,
    summaries: Vec<String>,
}

impl ProgressReporter for Collect {
    fn report(&mut self, line: &str, outcome: &LineOutcome) {
        self.lines.push(line.to_string());
        if let Some(s) = &outcome.summary {
            self.summaries.push(s.clone());
        }
    }
}

fn runner() -> ProcessRunner {
    ProcessRunner::new(CancellationToken::new()).with_poll_interval(Duration::from_millis(50))
}

fn sh(script: &str) -> ExportCommand {
    ExportCommand::new("sh").with_args(["-c", script])
}

// ============================================================================
// LineBuffer Tests
// ============================================================================

#[test]
fn test_line_buffer_splits_and_carries_partial() {
    let mut buf = LineBuffer::new();

    assert_eq!(buf.feed(b"first\nsec"), vec!["first".to_string()]);
    assert!(buf.has_pending());
    assert_eq!(
        buf.feed(b"ond\r\nthird\n"),
        vec!["second".to_string(), "third".to_string()]
    );
    assert!(!buf.has_pending());
    assert_eq!(buf.finish(), None);
}

#[test]
fn test_line_buffer_finish_returns_truncated_tail() {
    let mut buf = LineBuffer::new();
    assert!(buf.feed(b"no newline").is_empty());
    assert_eq!(buf.finish().as_deref(), Some("no newline"));
    assert_eq!(buf.finish(), None);
}

#[test]
fn test_line_buffer_keeps_empty_lines() {
    let mut buf = LineBuffer::new();
    assert_eq!(
        buf.feed(b"a\n\nb\n"),
        vec!["a".to_string(), String::new(), "b".to_string()]
    );
}

#[test]
fn test_line_buffer_utf8_split_across_chunks() {
    let mut buf = LineBuffer::new();
    let text = "caf\u{e9}\n".as_bytes();
    assert!(buf.feed(&text[..4]).is_empty());
    assert_eq!(buf.feed(&text[4..]), vec!["caf\u{e9}".to_string()]);
}

// ============================================================================
// Cancellation Tests
// ============================================================================

#[test]
fn test_cancellation_acknowledged_once() {
    let token = CancellationToken::new();
    assert!(!token.acknowledge());

    let clone = token.clone();
    clone.cancel();

    assert!(token.is_cancelled());
    assert!(token.acknowledge());
    assert!(!clone.acknowledge());
}

// ============================================================================
// ExportCommand Tests
// ============================================================================

#[test]
fn test_export_command_display() {
    let cmd = ExportCommand::new("fexp").with_stdin("/scripts/t.fxs");
    assert_eq!(cmd.to_string(), "fexp < /scripts/t.fxs");

    let cmd = ExportCommand::new("fexp").with_args(["-s", "ON"]);
    assert_eq!(cmd.to_string(), "fexp -s ON");
}

// ============================================================================
// Runner Tests
// ============================================================================

#[test]
fn test_run_captures_progress_lines() {
    let cmd = sh("echo 'Select execution completed. 100 data blocks generated.'; \
                  echo 'UTY8732 4.00 blocks processed per minute (running average).'; \
                  echo 'oops' >&2; \
                  printf 'tail-without-newline'");
    let mut state = ProgressState::new();
    let mut collect = Collect::default();

    let status = runner().run(&cmd, true, &mut state, &mut collect).unwrap();

    assert!(status.success());
    assert_eq!(state.total_blocks, 100);
    assert_eq!(state.current_blocks, 20);
    assert!(collect.lines.iter().any(|l| l == "oops"));
    assert!(collect.lines.iter().any(|l| l == "tail-without-newline"));
    assert_eq!(collect.summaries, vec!["     20/100 (20%) Blocks processed"]);
}

#[test]
fn test_run_output_is_a_terminal() {
    let cmd = sh("if [ -t 1 ]; then echo tty; else echo pipe; fi");
    let mut state = ProgressState::new();
    let mut collect = Collect::default();

    runner().run(&cmd, true, &mut state, &mut collect).unwrap();

    assert_eq!(collect.lines, vec!["tty".to_string()]);
}

#[test]
fn test_run_feeds_script_on_stdin() {
    let dir = tempfile::tempdir().unwrap();
    let script = dir.path().join("job.sh");
    std::fs::write(&script, "echo from-script\n").unwrap();

    let cmd = ExportCommand::new("sh").with_stdin(&script);
    let mut state = ProgressState::new();
    let mut collect = Collect::default();

    runner().run(&cmd, true, &mut state, &mut collect).unwrap();

    assert_eq!(collect.lines, vec!["from-script".to_string()]);
}

#[test]
fn test_run_quiet_reports_nothing() {
    let mut state = ProgressState::new();
    let mut collect = Collect::default();

    let status = runner()
        .run(&sh("echo hidden; exit 3"), false, &mut state, &mut collect)
        .unwrap();

    assert_eq!(status.code(), Some(3));
    assert!(collect.lines.is_empty());
}

#[test]
fn test_run_nonzero_exit_status_captured() {
    let mut state = ProgressState::new();
    let mut collect = Collect::default();

    let status = runner()
        .run(&sh("echo bye; exit 12"), true, &mut state, &mut collect)
        .unwrap();

    assert_eq!(status.code(), Some(12));
    assert_eq!(collect.lines, vec!["bye".to_string()]);
}

#[test]
fn test_run_missing_program_is_process_failure() {
    let mut state = ProgressState::new();
    let mut collect = Collect::default();

    let err = runner()
        .run(
            &ExportCommand::new("definitely-not-a-real-exporter-binary"),
            true,
            &mut state,
            &mut collect,
        )
        .unwrap_err();

    assert!(matches!(err, Error::ExtractionProcess { .. }));
}

#[test]
fn test_run_missing_script_is_process_failure() {
    let mut state = ProgressState::new();
    let mut collect = Collect::default();

    let cmd = ExportCommand::new("sh").with_stdin("/nonexistent/dir/script.fxs");
    let err = runner().run(&cmd, false, &mut state, &mut collect).unwrap_err();

    assert!(matches!(err, Error::ExtractionProcess { .. }));
}

#[test]
fn test_run_cancelled_token_does_not_abort_process() {
    let token = CancellationToken::new();
    token.cancel();
    let runner = ProcessRunner::new(token.clone()).with_poll_interval(Duration::from_millis(20));

    let mut state = ProgressState::new();
    let mut collect = Collect::default();
    let status = runner
        .run(&sh("sleep 0.2; echo finished"), true, &mut state, &mut collect)
        .unwrap();

    assert!(status.success());
    assert_eq!(collect.lines, vec!["finished".to_string()]);
    assert!(!token.acknowledge());
}

fn own_pgid() -> String {
    // SAFETY: getpgrp has no preconditions and cannot fail.
    unsafe { libc::getpgrp() }.to_string()
}

#[test]
fn test_run_captured_child_has_own_process_group() {
    let mut state = ProgressState::new();
    let mut collect = Collect::default();

    runner()
        .run(
            &sh("read -r _ _ _ _ pgid _ < /proc/$$/stat; echo \"$pgid\""),
            true,
            &mut state,
            &mut collect,
        )
        .unwrap();

    assert_eq!(collect.lines.len(), 1);
    assert_ne!(collect.lines[0], own_pgid());
}

#[test]
fn test_run_quiet_child_has_own_process_group() {
    let dir = tempfile::tempdir().unwrap();
    let out = dir.path().join("pgid");
    let script = format!(
        "read -r _ _ _ _ pgid _ < /proc/$$/stat; echo \"$pgid\" > '{}'",
        out.display()
    );
    let mut state = ProgressState::new();
    let mut collect = Collect::default();

    let status = runner().run(&sh(&script), false, &mut state, &mut collect).unwrap();

    assert!(status.success());
    let pgid = std::fs::read_to_string(&out).unwrap();
    assert!(!pgid.trim().is_empty());
    assert_ne!(pgid.trim(), own_pgid());
}
