//! Extraction driver
//!
//! Runs the generated scripts through the export tool, one at a time and in
//! partition order.

use super::types::{ExtractionJob, JobStatus, RawOutput};
use crate::error::{Error, Result};
use crate::plan::ScriptRef;
use crate::process::{ExportCommand, LogReporter, ProcessRunner};
use tracing::{debug, info};

/// Sequences export-tool runs for one table
#[derive(Debug, Clone)]
pub struct ExtractionDriver {
    runner: ProcessRunner,
    command: ExportCommand,
}

impl ExtractionDriver {
    /// Create a driver; each script is fed on stdin to `command`
    pub fn new(runner: ProcessRunner, command: ExportCommand) -> Self {
        Self { runner, command }
    }

    /// The runner used for each job
    pub fn runner(&self) -> &ProcessRunner {
        &self.runner
    }

    /// Run every script in order.
    ///
    /// Stops at the first failing job; a cancellation observed between jobs
    /// stops before the next script is launched.
    pub fn drive(
        &self,
        scripts: &[ScriptRef],
        partitioned: bool,
        step_detail: bool,
    ) -> Result<RawOutput> {
        if scripts.is_empty() {
            return Err(Error::plan("No export scripts to run"));
        }
        if !partitioned && scripts.len() > 1 {
            return Err(Error::plan(format!(
                "{} scripts given for an unpartitioned export",
                scripts.len()
            )));
        }

        let mut jobs: Vec<ExtractionJob> = scripts
            .iter()
            .enumerate()
            .map(|(index, script)| {
                let mut job = ExtractionJob::new(index, &script.path, &script.output_file);
                job.boundary = script.boundary;
                job
            })
            .collect();

        let count = jobs.len();
        for job in &mut jobs {
            if self.runner.cancel_token().is_cancelled() {
                info!("Interrupted, not starting job {}", job.label());
                return Err(Error::Cancelled);
            }

            if partitioned {
                info!("Running partition {} ({}/{count})", job.label(), job.index + 1);
            }
            self.run_job(job, step_detail)?;
        }

        let output = RawOutput {
            partitioned,
            files: jobs.iter().map(|j| j.output_file.clone()).collect(),
            jobs,
        };
        if step_detail {
            let total = output.total_progress();
            debug!("All jobs finished:{}", total.summary());
        }
        Ok(output)
    }

    fn run_job(&self, job: &mut ExtractionJob, step_detail: bool) -> Result<()> {
        let command = self.command.clone().with_stdin(&job.script);
        let mut reporter = LogReporter::new(job.label());

        job.status = JobStatus::Running;
        let status = match self
            .runner
            .run(&command, step_detail, &mut job.progress, &mut reporter)
        {
            Ok(status) => status,
            Err(e) => {
                job.status = JobStatus::Failed;
                return Err(e);
            }
        };

        if !status.success() {
            job.status = JobStatus::Failed;
            return Err(Error::process(format!(
                "'{command}' for job {} exited with {status}",
                job.label()
            )));
        }
        if !job.output_file.exists() {
            job.status = JobStatus::Failed;
            return Err(Error::process(format!(
                "job {} finished without writing {}",
                job.label(),
                job.output_file.display()
            )));
        }

        job.status = JobStatus::Succeeded;
        if step_detail {
            info!(job = %job.label(), "Finished:{}", job.progress.summary());
        }
        Ok(())
    }
}
