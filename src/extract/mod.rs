//! Extract module
//!
//! Drives the export tool over the generated scripts.
//!
//! # Overview
//!
//! - [`ExtractionDriver`] runs scripts sequentially in partition order
//! - [`ExtractionJob`] tracks one invocation and its block counters
//! - [`RawOutput`] lists the raw files for the combiner

mod driver;
mod types;

pub use driver::ExtractionDriver;
pub use types::{ExtractionJob, JobStatus, RawOutput};
