//! Extraction types
//!
//! Jobs, their status, and what a drive hands to the combiner.

use crate::partition::PartitionBoundary;
use crate::progress::ProgressState;
use std::fmt;
use std::path::PathBuf;

/// Lifecycle of one export-tool invocation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum JobStatus {
    /// Not started yet
    #[default]
    Pending,
    /// Export tool running
    Running,
    /// Exited zero and wrote its output file
    Succeeded,
    /// Exited nonzero or could not be run
    Failed,
}

impl JobStatus {
    /// Whether the job has finished, either way
    pub fn is_terminal(self) -> bool {
        matches!(self, JobStatus::Succeeded | JobStatus::Failed)
    }
}

impl fmt::Display for JobStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            JobStatus::Pending => write!(f, "pending"),
            JobStatus::Running => write!(f, "running"),
            JobStatus::Succeeded => write!(f, "succeeded"),
            JobStatus::Failed => write!(f, "failed"),
        }
    }
}

/// One export-tool invocation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractionJob {
    /// Position in script order
    pub index: usize,
    /// Script fed to the export tool
    pub script: PathBuf,
    /// Raw file the script writes
    pub output_file: PathBuf,
    /// Date bucket of a partitioned job
    pub boundary: Option<PartitionBoundary>,
    /// Block counters fed by the tool's output
    pub progress: ProgressState,
    /// Current status
    pub status: JobStatus,
}

impl ExtractionJob {
    /// Create a pending job
    pub fn new(index: usize, script: impl Into<PathBuf>, output_file: impl Into<PathBuf>) -> Self {
        Self {
            index,
            script: script.into(),
            output_file: output_file.into(),
            boundary: None,
            progress: ProgressState::new(),
            status: JobStatus::Pending,
        }
    }

    /// Label used in logs
    pub fn label(&self) -> String {
        self.boundary
            .map_or_else(|| format!("#{}", self.index + 1), |b| b.to_string())
    }
}

/// Raw output of a completed drive
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawOutput {
    /// Whether the output is split across partitions
    pub partitioned: bool,
    /// Raw files in script order
    pub files: Vec<PathBuf>,
    /// Finished jobs, in script order
    pub jobs: Vec<ExtractionJob>,
}

impl RawOutput {
    /// Block counters summed over all jobs
    pub fn total_progress(&self) -> ProgressState {
        self.jobs.iter().fold(ProgressState::new(), |acc, job| ProgressState {
            total_blocks: acc.total_blocks + job.progress.total_blocks,
            current_blocks: acc.current_blocks + job.progress.current_blocks,
        })
    }
}
