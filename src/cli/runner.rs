//! CLI runner - executes commands

use crate::cli::commands::{Cli, Commands};
use crate::config::ExportConfig;
use crate::error::{Error, Result, ResultExt};
use crate::export::{Artifact, Exporter};
use crate::plan::load_plan;
use crate::process::{CancellationToken, LogReporter, ProgressReporter};
use crate::progress::ProgressState;
use crate::types::format_elapsed;
use serde_json::{json, Value};
use std::fs;
use std::path::Path;

/// CLI runner
pub struct Runner {
    cli: Cli,
}

impl Runner {
    /// Create a new runner
    pub fn new(cli: Cli) -> Self {
        Self { cli }
    }

    /// Run the CLI command; blocks until the export tool has finished
    pub fn run(&self, cancel: &CancellationToken) -> Result<()> {
        match &self.cli.command {
            Commands::Export { .. } => self.export(cancel),
            Commands::Validate { plan } => self.validate(plan),
            Commands::Replay { log } => self.replay(log),
        }
    }

    /// Build the export config from the config file and command-line flags
    pub fn export_config(&self) -> Result<ExportConfig> {
        let Commands::Export {
            abs_path,
            table,
            db,
            plan,
            serialize,
            step_detail,
            exporter,
            exporter_args,
        } = &self.cli.command
        else {
            return Err(Error::config("Not an export command"));
        };

        let mut config = match &self.cli.config {
            Some(path) => ExportConfig::from_file(path)?,
            None => {
                let abs_path = abs_path
                    .clone()
                    .ok_or_else(|| Error::config("--abs-path is required without --config"))?;
                let table = table
                    .clone()
                    .ok_or_else(|| Error::config("--table is required without --config"))?;
                ExportConfig::new(abs_path, table)
            }
        };

        if let Some(abs_path) = abs_path {
            config.abs_path.clone_from(abs_path);
        }
        if let Some(table) = table {
            config.table_name.clone_from(table);
        }
        if let Some(db) = db {
            config = config.with_db(db);
        }
        if let Some(plan) = plan {
            config = config.with_plan(plan);
        }
        if let Some(mode) = serialize {
            config = config.with_serialize(mode)?;
        }
        if *step_detail {
            config = config.with_step_detail(true);
        }
        if let Some(exporter) = exporter {
            config = config.with_exporter(exporter);
        }
        if !exporter_args.is_empty() {
            config = config.with_exporter_args(exporter_args.iter().cloned());
        }

        config.validate()?;
        Ok(config)
    }

    fn export(&self, cancel: &CancellationToken) -> Result<()> {
        let config = self.export_config()?;
        let table = config.qualified_name();

        let outcome = Exporter::new(config)
            .with_cancel(cancel.clone())
            .export_table()?
            .ok_or_else(|| Error::Other(format!("Export of {table} produced no result")))?;

        let mut message = json!({
            "type": "EXPORT",
            "table": outcome.table,
            "path": outcome.artifact.path(),
            "columns": outcome.columns,
            "elapsed": format_elapsed(outcome.elapsed),
        });
        if let Artifact::Serialized { mode, rows, .. } = &outcome.artifact {
            message["mode"] = json!(mode);
            message["rows"] = json!(rows);
        }
        self.output_message(&message);
        Ok(())
    }

    fn validate(&self, path: &Path) -> Result<()> {
        let plan = load_plan(path)?;
        // Surfaces missing column lists for every partition
        let partitions = plan.partitions()?;

        self.output_message(&json!({
            "type": "PLAN",
            "scripts": plan.scripts.len(),
            "topology": plan.topology,
            "columns": plan.raw_columns(),
            "partitions": partitions.iter().map(|p| p.label()).collect::<Vec<_>>(),
            "primary_keys": plan.primary_keys,
        }));
        Ok(())
    }

    fn replay(&self, path: &Path) -> Result<()> {
        let bytes = fs::read(path)
            .with_context(|| format!("Failed to read log '{}'", path.display()))?;
        let text = String::from_utf8_lossy(&bytes);

        let mut state = ProgressState::new();
        let mut reporter = LogReporter::new("replay");
        let mut lines = 0usize;
        for line in text.lines() {
            let outcome = state.apply(line.trim_end_matches('\r'));
            reporter.report(line, &outcome);
            lines += 1;
        }

        self.output_message(&json!({
            "type": "PROGRESS",
            "lines": lines,
            "total_blocks": state.total_blocks,
            "current_blocks": state.current_blocks,
            "percent": state.percent(),
        }));
        Ok(())
    }

    /// Output a message
    fn output_message(&self, msg: &Value) {
        if self.cli.pretty {
            println!("{}", serde_json::to_string_pretty(msg).unwrap_or_default());
        } else {
            println!("{}", serde_json::to_string(msg).unwrap_or_default());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    fn runner(args: &[&str]) -> Runner {
        Runner::new(Cli::try_parse_from(args).unwrap())
    }

    #[test]
    fn test_export_config_from_flags() {
        let r = runner(&[
            "tdexport",
            "export",
            "--abs-path",
            "/tmp/x",
            "--table",
            "sales",
            "--serialize",
            "pickle",
            "--exporter",
            "sh",
        ]);
        let config = r.export_config().unwrap();

        assert_eq!(config.table_name, "sales");
        assert_eq!(config.exporter, "sh");
        assert_eq!(
            config.serialize,
            Some(crate::types::SerializeMode::Generic)
        );
    }

    #[test]
    fn test_export_config_rejects_unknown_mode() {
        let r = runner(&[
            "tdexport", "export", "--abs-path", "/x", "--table", "t", "--serialize", "parquet",
        ]);
        let err = r.export_config().unwrap_err();
        assert!(matches!(err, Error::Config { .. }));
    }

    #[test]
    fn test_export_config_requires_table() {
        let r = runner(&["tdexport", "export", "--abs-path", "/x"]);
        assert!(r.export_config().is_err());
    }

    #[test]
    fn test_replay_reads_log() {
        let dir = tempfile::tempdir().unwrap();
        let log = dir.path().join("fexp.log");
        fs::write(
            &log,
            "Select execution completed. 10 data blocks generated.\n\
             UTY8732 1 blocks processed per minute (running average).\n",
        )
        .unwrap();

        let r = runner(&["tdexport", "replay", log.to_str().unwrap()]);
        assert!(r.run(&CancellationToken::new()).is_ok());
    }

    #[test]
    fn test_replay_missing_log_names_the_file() {
        let r = runner(&["tdexport", "replay", "/nonexistent/fexp.log"]);
        let err = r.run(&CancellationToken::new()).unwrap_err();
        assert!(err
            .to_string()
            .starts_with("Failed to read log '/nonexistent/fexp.log'"));
    }
}
