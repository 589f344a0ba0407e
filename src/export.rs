//! Table export orchestration
//!
//! Ties the stages together for one table: plan, extract, combine,
//! normalize and serialize. Failures after the directories are in place are
//! logged and turned into an absent result.

use crate::config::ExportConfig;
use crate::error::{Error, Result};
use crate::extract::ExtractionDriver;
use crate::normalize::normalize;
use crate::output::{write_delimited, FileSerializer, TableSink};
use crate::partition::{combine, Combined};
use crate::plan::{ExtractionPlan, ManifestPlanSource, PlanSource};
use crate::process::{CancellationToken, ProcessRunner};
use crate::types::{format_elapsed, SerializeMode};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};
use tracing::{error, info};

/// Final artifact of an export
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Artifact {
    /// Serialized table
    Serialized {
        /// Artifact file
        path: PathBuf,
        /// Mode it was written in
        mode: SerializeMode,
        /// Rows written
        rows: usize,
    },
    /// Raw pipe-delimited file, left for the caller to load
    Raw {
        /// Combined raw data file
        data_file: PathBuf,
    },
}

impl Artifact {
    /// Path of the artifact file
    pub fn path(&self) -> &Path {
        match self {
            Artifact::Serialized { path, .. } => path,
            Artifact::Raw { data_file } => data_file,
        }
    }
}

/// What a successful export produced
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportOutcome {
    /// Table name
    pub table: String,
    /// The artifact on disk
    pub artifact: Artifact,
    /// Columns of the artifact, in order
    pub columns: Vec<String>,
    /// Wall-clock time of the export
    pub elapsed: Duration,
}

/// Exports one table
pub struct Exporter {
    config: ExportConfig,
    plan_source: Box<dyn PlanSource + Send + Sync>,
    sink: Box<dyn TableSink + Send + Sync>,
    cancel: CancellationToken,
}

impl Exporter {
    /// Create an exporter reading the plan manifest and writing files
    /// under `<abs_path>/serialized`
    pub fn new(config: ExportConfig) -> Self {
        let sink = FileSerializer::new(config.serialized_dir());
        Self {
            config,
            plan_source: Box::new(ManifestPlanSource::new()),
            sink: Box::new(sink),
            cancel: CancellationToken::new(),
        }
    }

    /// Use another plan source
    #[must_use]
    pub fn with_plan_source(mut self, source: impl PlanSource + Send + Sync + 'static) -> Self {
        self.plan_source = Box::new(source);
        self
    }

    /// Use another serialization sink
    #[must_use]
    pub fn with_sink(mut self, sink: impl TableSink + Send + Sync + 'static) -> Self {
        self.sink = Box::new(sink);
        self
    }

    /// Observe an externally owned cancellation token
    #[must_use]
    pub fn with_cancel(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }

    /// The export config
    pub fn config(&self) -> &ExportConfig {
        &self.config
    }

    /// Export the table.
    ///
    /// Configuration and directory-setup errors are returned. Any later
    /// failure, including an unreadable or invalid plan, is logged with its
    /// kind and location and yields `Ok(None)`, never a partial result.
    pub fn export_table(&self) -> Result<Option<ExportOutcome>> {
        self.config.validate()?;
        self.setup_directories()?;

        let start = Instant::now();
        match self.run(start) {
            Ok(outcome) => Ok(Some(outcome)),
            Err(e) if e.is_fatal_before_work() => Err(e),
            Err(e) => {
                let (file, line) = e.location().unwrap_or((file!(), line!()));
                error!(
                    kind = e.kind(),
                    file,
                    line,
                    "Export of {} failed: {e}",
                    self.config.qualified_name()
                );
                Ok(None)
            }
        }
    }

    fn setup_directories(&self) -> Result<()> {
        for dir in [self.config.data_dir(), self.config.serialized_dir()] {
            fs::create_dir_all(&dir).map_err(|e| Error::directory_setup(&dir, e))?;
        }
        Ok(())
    }

    fn run(&self, start: Instant) -> Result<ExportOutcome> {
        let plan = self.plan_source.plan(&self.config)?;
        info!(
            "Exporting {} ({} scripts, {})",
            self.config.qualified_name(),
            plan.scripts.len(),
            plan.topology
                .map_or_else(|| "unpartitioned".to_string(), |t| t.to_string())
        );

        let runner =
            ProcessRunner::new(self.cancel.clone()).with_poll_interval(self.config.poll_interval());
        let driver = ExtractionDriver::new(runner, self.config.exporter_command());
        let raw = driver.drive(&plan.scripts, plan.is_partitioned(), self.config.step_detail)?;

        let combined = self.combine_outputs(&plan, &raw.files)?;
        let (artifact, columns) = match self.config.serialize {
            Some(mode) => {
                let table = normalize(combined, plan.raw_columns(), &plan.dtypes, mode)?;
                let path = self.sink.serialize(&table, &self.config.table_name, mode)?;
                let artifact = Artifact::Serialized {
                    path,
                    mode,
                    rows: table.num_rows(),
                };
                (artifact, table.column_names())
            }
            None => self.keep_raw(combined, &plan)?,
        };

        let elapsed = start.elapsed();
        info!("Elapsed time: {}", format_elapsed(elapsed));
        info!("Output: {}", artifact.path().display());

        Ok(ExportOutcome {
            table: self.config.table_name.clone(),
            artifact,
            columns,
            elapsed,
        })
    }

    fn combine_outputs(&self, plan: &ExtractionPlan, files: &[PathBuf]) -> Result<Combined> {
        match plan.topology {
            Some(topology) => combine(
                topology,
                &self.config.data_file(),
                &plan.partitions()?,
                &plan.primary_keys,
            ),
            None => files
                .first()
                .cloned()
                .map(Combined::File)
                .ok_or_else(|| Error::combine("extraction produced no output file")),
        }
    }

    fn keep_raw(
        &self,
        combined: Combined,
        plan: &ExtractionPlan,
    ) -> Result<(Artifact, Vec<String>)> {
        match combined {
            Combined::File(data_file) => {
                Ok((Artifact::Raw { data_file }, plan.raw_columns().to_vec()))
            }
            Combined::Table(batch) => {
                let data_file = self.config.data_file();
                write_delimited(&data_file, &batch)?;
                let columns = batch
                    .schema()
                    .fields()
                    .iter()
                    .map(|f| f.name().clone())
                    .collect();
                Ok((Artifact::Raw { data_file }, columns))
            }
        }
    }
}

/// Export one table with the manifest plan source and file serializer
pub fn export_table(
    config: ExportConfig,
    cancel: CancellationToken,
) -> Result<Option<ExportOutcome>> {
    Exporter::new(config).with_cancel(cancel).export_table()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::plan::{load_plan_from_str, ScriptRef};
    use pretty_assertions::assert_eq;
    use tempfile::tempdir;

    struct StaticPlan(ExtractionPlan);

    impl PlanSource for StaticPlan {
        fn plan(&self, _config: &ExportConfig) -> Result<ExtractionPlan> {
            Ok(self.0.clone())
        }
    }

    fn single_script_plan(dir: &Path, body: &str) -> ExtractionPlan {
        let script = dir.join("t.sh");
        fs::write(&script, body).unwrap();
        let mut plan =
            load_plan_from_str("columns: [id, amt]\nscripts:\n  - { path: t.sh, output_file: t.txt }\n")
                .unwrap();
        plan.scripts = vec![ScriptRef {
            path: script,
            output_file: dir.join("data").join("t.txt"),
            boundary: None,
        }];
        plan
    }

    #[test]
    fn test_directory_setup_failure_propagates() {
        let dir = tempdir().unwrap();
        let blocker = dir.path().join("file");
        fs::write(&blocker, "x").unwrap();

        let err = Exporter::new(ExportConfig::new(&blocker, "t"))
            .export_table()
            .unwrap_err();
        assert!(matches!(err, Error::DirectorySetup { .. }));
    }

    #[test]
    fn test_missing_plan_yields_none() {
        let dir = tempdir().unwrap();
        let outcome = Exporter::new(ExportConfig::new(dir.path(), "t"))
            .export_table()
            .unwrap();
        assert!(outcome.is_none());
    }

    #[test]
    fn test_malformed_plan_yields_none() {
        let dir = tempdir().unwrap();
        let config = ExportConfig::new(dir.path(), "t");
        fs::write(config.plan_path(), "columns: [a]\nscripts: []\n").unwrap();

        let outcome = Exporter::new(config).export_table().unwrap();
        assert!(outcome.is_none());
        // Directories were set up before the plan was read
        assert!(dir.path().join("data").is_dir());
    }

    #[test]
    fn test_process_failure_yields_none() {
        let dir = tempdir().unwrap();
        let plan = single_script_plan(dir.path(), "exit 4\n");
        let config = ExportConfig::new(dir.path(), "t").with_exporter("sh");

        let outcome = Exporter::new(config)
            .with_plan_source(StaticPlan(plan))
            .export_table()
            .unwrap();
        assert_eq!(outcome, None);
    }

    #[test]
    fn test_unserialized_export_returns_raw_file() {
        let dir = tempdir().unwrap();
        let out = dir.path().join("data").join("t.txt");
        let plan = single_script_plan(
            dir.path(),
            &format!("printf '1|2\\n' > '{}'\n", out.display()),
        );
        let config = ExportConfig::new(dir.path(), "t").with_exporter("sh");

        let outcome = Exporter::new(config)
            .with_plan_source(StaticPlan(plan))
            .export_table()
            .unwrap()
            .unwrap();

        assert_eq!(outcome.artifact, Artifact::Raw { data_file: out });
        assert_eq!(outcome.columns, vec!["id".to_string(), "amt".to_string()]);
    }

    #[test]
    fn test_empty_raw_file_yields_none() {
        let dir = tempdir().unwrap();
        let out = dir.path().join("data").join("t.txt");
        let plan = single_script_plan(dir.path(), &format!(": > '{}'\n", out.display()));
        let config = ExportConfig::new(dir.path(), "t")
            .with_exporter("sh")
            .with_serialize_mode(Some(SerializeMode::Generic));

        let outcome = Exporter::new(config)
            .with_plan_source(StaticPlan(plan))
            .export_table()
            .unwrap();

        assert_eq!(outcome, None);
        assert!(!dir.path().join("serialized").join("t.jsonl").exists());
    }

    #[test]
    fn test_cancelled_export_yields_none() {
        let dir = tempdir().unwrap();
        let plan = single_script_plan(dir.path(), "true\n");
        let cancel = CancellationToken::new();
        cancel.cancel();

        let outcome = Exporter::new(ExportConfig::new(dir.path(), "t").with_exporter("sh"))
            .with_plan_source(StaticPlan(plan))
            .with_cancel(cancel)
            .export_table()
            .unwrap();
        assert!(outcome.is_none());
    }
}
