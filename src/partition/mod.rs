//! Partition module
//!
//! Supports: vertical (row-slice) and horizontal (column-subset) partitions
//!
//! # Overview
//!
//! A partitioned export runs one script per partition, each writing its own
//! raw file. Afterwards the files are recombined in partition order:
//! - Vertical partitions (same columns, e.g. one per year of a date key) are
//!   appended into the single raw data file
//! - Horizontal partitions (disjoint columns over the same rows) are loaded
//!   and joined on the primary keys
//!
//! Partition files are deleted once consumed; already-missing files are fine.

mod combiner;
mod join;
mod types;

pub use combiner::{combine, plan_combine};
pub use join::join_on_keys;
pub use types::{
    CleanupPlan, ColumnLayout, Combined, CombinePlan, ConcatPlan, PartitionBoundary,
    PartitionDescriptor, PartitionTopology,
};
