//! Export configuration
//!
//! Settings for one table export, loaded from YAML or assembled by the CLI.

use crate::error::{Error, Result};
use crate::process::ExportCommand;
use crate::types::SerializeMode;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Subdirectory of `abs_path` holding raw export files
pub const DATA_DIR: &str = "data";

/// Subdirectory of `abs_path` holding serialized tables
pub const SERIALIZED_DIR: &str = "serialized";

// ============================================================================
// Export Config
// ============================================================================

/// Configuration of one table export
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExportConfig {
    /// Root directory for scripts, raw data and serialized output
    pub abs_path: PathBuf,

    /// Table to export
    pub table_name: String,

    /// Database the table lives in
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub db: Option<String>,

    /// Export tool program
    #[serde(default = "default_exporter")]
    pub exporter: String,

    /// Extra arguments passed to the export tool
    #[serde(default)]
    pub exporter_args: Vec<String>,

    /// Serialization mode; `None` keeps the raw data file only
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub serialize: Option<SerializeMode>,

    /// Stream live progress from the export tool
    #[serde(default)]
    pub step_detail: bool,

    /// Upper bound on one wait for export-tool output, in milliseconds
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,

    /// Plan manifest; defaults to `<abs_path>/<table>_plan.yaml`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub plan: Option<PathBuf>,
}

fn default_exporter() -> String {
    "fexp".to_string()
}

fn default_poll_interval_ms() -> u64 {
    250
}

impl ExportConfig {
    /// Create a config for `table_name` rooted at `abs_path`
    pub fn new(abs_path: impl Into<PathBuf>, table_name: impl Into<String>) -> Self {
        Self {
            abs_path: abs_path.into(),
            table_name: table_name.into(),
            db: None,
            exporter: default_exporter(),
            exporter_args: Vec::new(),
            serialize: None,
            step_detail: false,
            poll_interval_ms: default_poll_interval_ms(),
            plan: None,
        }
    }

    /// Load a config from a YAML file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|e| {
            Error::config(format!(
                "Failed to read config file '{}': {}",
                path.display(),
                e
            ))
        })?;
        Self::from_yaml(&content)
    }

    /// Parse a config from YAML
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        let config: Self = serde_yaml::from_str(yaml)?;
        Ok(config)
    }

    /// Set the database
    #[must_use]
    pub fn with_db(mut self, db: impl Into<String>) -> Self {
        self.db = Some(db.into());
        self
    }

    /// Set the export tool program
    #[must_use]
    pub fn with_exporter(mut self, exporter: impl Into<String>) -> Self {
        self.exporter = exporter.into();
        self
    }

    /// Set extra export tool arguments
    #[must_use]
    pub fn with_exporter_args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.exporter_args = args.into_iter().map(Into::into).collect();
        self
    }

    /// Set the serialization mode by name (`columnar` or `generic`)
    pub fn with_serialize(mut self, mode: &str) -> Result<Self> {
        self.serialize = Some(mode.parse()?);
        Ok(self)
    }

    /// Set the serialization mode
    #[must_use]
    pub fn with_serialize_mode(mut self, mode: Option<SerializeMode>) -> Self {
        self.serialize = mode;
        self
    }

    /// Enable or disable live progress
    #[must_use]
    pub fn with_step_detail(mut self, step_detail: bool) -> Self {
        self.step_detail = step_detail;
        self
    }

    /// Set the poll interval
    #[must_use]
    pub fn with_poll_interval_ms(mut self, ms: u64) -> Self {
        self.poll_interval_ms = ms;
        self
    }

    /// Set the plan manifest path
    #[must_use]
    pub fn with_plan(mut self, plan: impl Into<PathBuf>) -> Self {
        self.plan = Some(plan.into());
        self
    }

    /// Check the config before any work starts
    pub fn validate(&self) -> Result<()> {
        if self.table_name.trim().is_empty() {
            return Err(Error::config("Table name cannot be empty"));
        }
        if self.table_name.contains(['/', '\\']) {
            return Err(Error::config(format!(
                "Table name '{}' cannot contain path separators",
                self.table_name
            )));
        }
        if self.abs_path.as_os_str().is_empty() {
            return Err(Error::config("abs_path cannot be empty"));
        }
        if self.exporter.trim().is_empty() {
            return Err(Error::config("Exporter program cannot be empty"));
        }
        if self.poll_interval_ms == 0 {
            return Err(Error::config("poll_interval_ms must be positive"));
        }
        Ok(())
    }

    /// Directory of raw export files
    pub fn data_dir(&self) -> PathBuf {
        self.abs_path.join(DATA_DIR)
    }

    /// Directory of serialized tables
    pub fn serialized_dir(&self) -> PathBuf {
        self.abs_path.join(SERIALIZED_DIR)
    }

    /// Combined raw data file
    pub fn data_file(&self) -> PathBuf {
        self.data_dir().join(format!("{}_export.txt", self.table_name))
    }

    /// Plan manifest location
    pub fn plan_path(&self) -> PathBuf {
        self.plan.clone().unwrap_or_else(|| {
            self.abs_path
                .join(format!("{}_plan.yaml", self.table_name))
        })
    }

    /// Poll interval as a duration
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    /// Export tool command template (without the script on stdin)
    pub fn exporter_command(&self) -> ExportCommand {
        ExportCommand::new(&self.exporter).with_args(self.exporter_args.iter().cloned())
    }

    /// Qualified table name for logs
    pub fn qualified_name(&self) -> String {
        match &self.db {
            Some(db) => format!("{db}.{}", self.table_name),
            None => self.table_name.clone(),
        }
    }
}
