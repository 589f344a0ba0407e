//! Plan sources and manifest parsing
//!
//! The script generator writes a YAML manifest next to the scripts it
//! produces. A manifest looks like:
//!
//! ```yaml
//! columns: [id, amt, sale_dt]
//! topology: vertical
//! partition_key: sale_dt
//! scripts:
//!   - path: sales_2018.fx
//!     output_file: data/sales_2018.txt
//!     boundary: { year: 2018 }
//! dtypes:
//!   amt: float
//! ```

use super::types::ExtractionPlan;
use crate::config::ExportConfig;
use crate::error::{Error, Result};
use crate::partition::{ColumnLayout, PartitionTopology};
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Source of the extraction plan for a table
pub trait PlanSource {
    /// Produce the plan for the table named in `config`
    fn plan(&self, config: &ExportConfig) -> Result<ExtractionPlan>;
}

/// Reads the plan from a YAML manifest on disk
#[derive(Debug, Clone, Default)]
pub struct ManifestPlanSource {
    path: Option<PathBuf>,
}

impl ManifestPlanSource {
    /// Use the manifest location derived from the export config
    pub fn new() -> Self {
        Self::default()
    }

    /// Use an explicit manifest file
    pub fn from_path(path: impl Into<PathBuf>) -> Self {
        Self {
            path: Some(path.into()),
        }
    }
}

impl PlanSource for ManifestPlanSource {
    fn plan(&self, config: &ExportConfig) -> Result<ExtractionPlan> {
        let path = self.path.clone().unwrap_or_else(|| config.plan_path());
        load_plan(&path)
    }
}

/// Load a plan manifest; relative paths resolve against its directory
pub fn load_plan(path: impl AsRef<Path>) -> Result<ExtractionPlan> {
    let path = path.as_ref();
    let content = fs::read_to_string(path).map_err(|e| {
        Error::plan(format!(
            "Failed to read plan manifest '{}': {}",
            path.display(),
            e
        ))
    })?;

    let mut plan = load_plan_from_str(&content)?;
    if let Some(base) = path.parent() {
        plan.resolve_paths(base);
    }
    debug!(
        "Loaded plan {} ({} scripts)",
        path.display(),
        plan.scripts.len()
    );
    Ok(plan)
}

/// Parse and validate a plan manifest
pub fn load_plan_from_str(yaml: &str) -> Result<ExtractionPlan> {
    let mut plan: ExtractionPlan = serde_yaml::from_str(yaml)
        .map_err(|e| Error::plan(format!("Failed to parse plan manifest: {e}")))?;

    if plan.topology.is_none()
        && (plan.scripts.len() > 1 || matches!(plan.columns, ColumnLayout::PerPartition(_)))
    {
        plan.topology = Some(PartitionTopology::detect(&plan.columns));
    }

    validate_plan(&plan)?;
    Ok(plan)
}

fn validate_plan(plan: &ExtractionPlan) -> Result<()> {
    if plan.scripts.is_empty() {
        return Err(Error::plan("Plan must list at least one script"));
    }

    let outputs: HashSet<_> = plan.scripts.iter().map(|s| &s.output_file).collect();
    if outputs.len() != plan.scripts.len() {
        return Err(Error::plan("Scripts must write distinct output files"));
    }

    match &plan.columns {
        ColumnLayout::Flat(cols) if cols.is_empty() => {
            return Err(Error::plan("Plan has no columns"));
        }
        ColumnLayout::PerPartition(lists) => {
            if lists.len() != plan.scripts.len() {
                return Err(Error::plan(format!(
                    "Plan has {} column lists for {} scripts",
                    lists.len(),
                    plan.scripts.len()
                )));
            }
            if lists.iter().any(Vec::is_empty) {
                return Err(Error::plan("Every partition needs at least one column"));
            }
        }
        ColumnLayout::Flat(_) => {}
    }

    match plan.topology {
        None => Ok(()),
        Some(PartitionTopology::Vertical) => validate_vertical(plan),
        Some(PartitionTopology::Horizontal) => validate_horizontal(plan),
    }
}

fn validate_vertical(plan: &ExtractionPlan) -> Result<()> {
    if PartitionTopology::detect(&plan.columns) != PartitionTopology::Vertical {
        return Err(Error::plan(
            "Vertical partitions must share one column list",
        ));
    }
    Ok(())
}

fn validate_horizontal(plan: &ExtractionPlan) -> Result<()> {
    let ColumnLayout::PerPartition(lists) = &plan.columns else {
        return Err(Error::plan(
            "Horizontal partitions need one column list per script",
        ));
    };

    if plan.primary_keys.is_empty() {
        return Err(Error::plan("Horizontal partitions need primary keys"));
    }

    for (index, list) in lists.iter().enumerate() {
        if let Some(key) = plan.primary_keys.iter().find(|k| !list.contains(k)) {
            return Err(Error::plan(format!(
                "Primary key '{key}' missing from partition {}",
                index + 1
            )));
        }
    }

    Ok(())
}
