//! Partition types
//!
//! Defines the partition topology and per-partition descriptors.

use crate::error::{Error, Result};
use crate::types::{ColumnType, DtypeMap};
use arrow::record_batch::RecordBatch;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

/// How partition outputs relate to each other
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PartitionTopology {
    /// Row slices of one dataset (same columns), concatenated in order
    Vertical,
    /// Column subsets of one row set, joined on the primary keys
    Horizontal,
}

impl PartitionTopology {
    /// Infer the topology from a column layout.
    ///
    /// Only used when a plan does not state its topology explicitly.
    pub fn detect(layout: &ColumnLayout) -> Self {
        match layout {
            ColumnLayout::Flat(_) => PartitionTopology::Vertical,
            ColumnLayout::PerPartition(lists) => {
                if lists.windows(2).all(|w| w[0] == w[1]) {
                    PartitionTopology::Vertical
                } else {
                    PartitionTopology::Horizontal
                }
            }
        }
    }
}

impl fmt::Display for PartitionTopology {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PartitionTopology::Vertical => write!(f, "vertical"),
            PartitionTopology::Horizontal => write!(f, "horizontal"),
        }
    }
}

/// Column names of the export: one list, or one list per partition
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ColumnLayout {
    /// All partitions share these columns
    Flat(Vec<String>),
    /// Partition `i` holds `lists[i]`
    PerPartition(Vec<Vec<String>>),
}

impl ColumnLayout {
    /// Columns of partition `index`
    pub fn for_partition(&self, index: usize) -> Result<&[String]> {
        match self {
            ColumnLayout::Flat(cols) => Ok(cols.as_slice()),
            ColumnLayout::PerPartition(lists) => {
                lists.get(index).map(Vec::as_slice).ok_or_else(|| {
                    Error::combine(format!("no column list for partition {index}"))
                })
            }
        }
    }

    /// Columns of the raw (unpartitioned or vertically combined) file
    pub fn primary(&self) -> &[String] {
        match self {
            ColumnLayout::Flat(cols) => cols.as_slice(),
            ColumnLayout::PerPartition(lists) => lists.first().map_or(&[][..], Vec::as_slice),
        }
    }

    /// Number of per-partition lists (1 for a flat layout)
    pub fn partition_count(&self) -> usize {
        match self {
            ColumnLayout::Flat(_) => 1,
            ColumnLayout::PerPartition(lists) => lists.len(),
        }
    }
}

/// Time bucket of a date-keyed partition.
///
/// Written in manifests as `{ year: 2019 }` or `{ year: 2019, month: 3 }`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "BoundaryFields", into = "BoundaryFields")]
pub enum PartitionBoundary {
    /// One calendar year
    Year(i32),
    /// One calendar month
    Month {
        /// Year
        year: i32,
        /// Month, 1-12
        month: u32,
    },
}

#[derive(Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
struct BoundaryFields {
    year: i32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    month: Option<u32>,
}

impl TryFrom<BoundaryFields> for PartitionBoundary {
    type Error = String;

    fn try_from(fields: BoundaryFields) -> std::result::Result<Self, Self::Error> {
        match fields.month {
            None => Ok(PartitionBoundary::Year(fields.year)),
            Some(month @ 1..=12) => Ok(PartitionBoundary::Month {
                year: fields.year,
                month,
            }),
            Some(month) => Err(format!("month {month} is outside 1-12")),
        }
    }
}

impl From<PartitionBoundary> for BoundaryFields {
    fn from(boundary: PartitionBoundary) -> Self {
        match boundary {
            PartitionBoundary::Year(year) => BoundaryFields { year, month: None },
            PartitionBoundary::Month { year, month } => BoundaryFields {
                year,
                month: Some(month),
            },
        }
    }
}

impl fmt::Display for PartitionBoundary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PartitionBoundary::Year(y) => write!(f, "{y}"),
            PartitionBoundary::Month { year, month } => write!(f, "{year}-{month:02}"),
        }
    }
}

/// One partition: its position, boundary, columns and declared types
#[derive(Debug, Clone, PartialEq)]
pub struct PartitionDescriptor {
    /// Position in script order
    pub index: usize,
    /// Date bucket, for vertical partitions keyed by a date column
    pub boundary: Option<PartitionBoundary>,
    /// Raw output file of this partition
    pub output_file: PathBuf,
    /// Columns present in the raw output, in order
    pub columns: Vec<String>,
    /// Declared types of those columns
    pub dtypes: DtypeMap,
}

impl PartitionDescriptor {
    /// Declared type of a column, if any
    pub fn dtype(&self, column: &str) -> Option<ColumnType> {
        self.dtypes.get(column).copied()
    }

    /// Label used in logs (`2019`, `2019-03` or `#2`)
    pub fn label(&self) -> String {
        self.boundary
            .map_or_else(|| format!("#{}", self.index + 1), |b| b.to_string())
    }
}

/// Vertical instruction: append `sources` into `target`, in order
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConcatPlan {
    /// Combined raw file
    pub target: PathBuf,
    /// Partition files in partition order
    pub sources: Vec<PathBuf>,
}

/// Partition files to delete once they have been consumed
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CleanupPlan {
    /// Files to remove; already-missing files are skipped
    pub files: Vec<PathBuf>,
}

/// Result of planning a combination
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CombinePlan {
    /// Present only for vertical topologies
    pub concat: Option<ConcatPlan>,
    /// Partition files in partition order
    pub partition_files: Vec<PathBuf>,
    /// Deletes the partition files
    pub cleanup: CleanupPlan,
}

/// The combined dataset
#[derive(Debug, Clone)]
pub enum Combined {
    /// A single raw pipe-delimited file still to be loaded
    File(PathBuf),
    /// An in-memory table, already typed
    Table(RecordBatch),
}
