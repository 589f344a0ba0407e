//! Plan types

use crate::error::Result;
use crate::partition::{ColumnLayout, PartitionBoundary, PartitionDescriptor, PartitionTopology};
use crate::types::DtypeMap;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// One generated export script and the raw file it writes
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScriptRef {
    /// Script fed to the export tool
    pub path: PathBuf,
    /// Raw pipe-delimited file the script writes
    pub output_file: PathBuf,
    /// Date bucket covered by this script, for date-keyed partitions
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub boundary: Option<PartitionBoundary>,
}

/// Everything the script generator hands over for one table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExtractionPlan {
    /// Output columns, flat or per partition
    pub columns: ColumnLayout,

    /// Scripts in partition order (sorted by partition key)
    pub scripts: Vec<ScriptRef>,

    /// How partitions recombine; `None` for an unpartitioned export
    #[serde(default)]
    pub topology: Option<PartitionTopology>,

    /// Date column the partitions are keyed on
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub partition_key: Option<String>,

    /// Join keys of horizontal partitions
    #[serde(default)]
    pub primary_keys: Vec<String>,

    /// Declared column types
    #[serde(default)]
    pub dtypes: DtypeMap,
}

impl ExtractionPlan {
    /// Whether the export runs as several partitions
    pub fn is_partitioned(&self) -> bool {
        self.topology.is_some()
    }

    /// Columns of the raw file that gets loaded after combination
    pub fn raw_columns(&self) -> &[String] {
        self.columns.primary()
    }

    /// Per-partition descriptors, in script order
    pub fn partitions(&self) -> Result<Vec<PartitionDescriptor>> {
        self.scripts
            .iter()
            .enumerate()
            .map(|(index, script)| {
                let columns = self.columns.for_partition(index)?.to_vec();
                let dtypes = columns
                    .iter()
                    .filter_map(|c| self.dtypes.get(c).map(|t| (c.clone(), *t)))
                    .collect();
                Ok(PartitionDescriptor {
                    index,
                    boundary: script.boundary,
                    output_file: script.output_file.clone(),
                    columns,
                    dtypes,
                })
            })
            .collect()
    }

    /// Resolve relative script and output paths against `base`
    pub fn resolve_paths(&mut self, base: &Path) {
        for script in &mut self.scripts {
            if script.path.is_relative() {
                script.path = base.join(&script.path);
            }
            if script.output_file.is_relative() {
                script.output_file = base.join(&script.output_file);
            }
        }
    }
}
