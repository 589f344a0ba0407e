//! Plan module
//!
//! The extraction plan is produced by the script generator: the FastExport
//! scripts to run, in partition order, the columns and declared types of
//! their output, and how partitions recombine.
//!
//! # Overview
//!
//! - [`PlanSource`] is the seam to the script generator
//! - [`ManifestPlanSource`] reads a plan from a YAML manifest written
//!   alongside the scripts

mod loader;
mod types;

pub use loader::{load_plan, load_plan_from_str, ManifestPlanSource, PlanSource};
pub use types::{ExtractionPlan, ScriptRef};
