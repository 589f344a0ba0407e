//! Partition combiner
//!
//! Reassembles partition outputs into one logical dataset: vertical
//! partitions are appended file by file, horizontal partitions are loaded and
//! joined on the primary keys.

use super::join::join_on_keys;
use super::types::{
    CleanupPlan, Combined, CombinePlan, ConcatPlan, PartitionDescriptor, PartitionTopology,
};
use crate::error::{Error, Result};
use crate::normalize::load_raw;
use std::fs::{self, File, OpenOptions};
use std::io::{self, Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Plan the combination of `partitions` (in partition order) into `data_file`.
pub fn plan_combine(
    topology: PartitionTopology,
    data_file: &Path,
    partitions: &[PartitionDescriptor],
) -> CombinePlan {
    let partition_files: Vec<PathBuf> = partitions.iter().map(|p| p.output_file.clone()).collect();

    let concat = match topology {
        PartitionTopology::Vertical => Some(ConcatPlan {
            target: data_file.to_path_buf(),
            sources: partition_files.clone(),
        }),
        PartitionTopology::Horizontal => None,
    };

    CombinePlan {
        concat,
        cleanup: CleanupPlan {
            files: partition_files.clone(),
        },
        partition_files,
    }
}

/// Combine partition outputs and delete the partition files.
///
/// Vertical partitions yield [`Combined::File`] pointing at `data_file`;
/// horizontal partitions yield the joined [`Combined::Table`].
pub fn combine(
    topology: PartitionTopology,
    data_file: &Path,
    partitions: &[PartitionDescriptor],
    primary_keys: &[String],
) -> Result<Combined> {
    if partitions.is_empty() {
        return Err(Error::combine("no partitions to combine"));
    }
    info!(
        "Combining {} partitions ({topology})",
        partitions.len()
    );

    let plan = plan_combine(topology, data_file, partitions);

    let combined = match &plan.concat {
        Some(concat) => {
            let bytes = concat.execute()?;
            debug!("Wrote {bytes} bytes to {}", concat.target.display());
            Combined::File(concat.target.clone())
        }
        None => {
            if primary_keys.is_empty() {
                return Err(Error::combine(
                    "horizontal partitions need at least one primary key",
                ));
            }
            let mut tables = Vec::with_capacity(partitions.len());
            for partition in partitions {
                debug!("Loading partition {}", partition.label());
                tables.push(load_raw(
                    &partition.output_file,
                    &partition.columns,
                    &partition.dtypes,
                )?);
            }
            Combined::Table(join_on_keys(&tables, primary_keys)?)
        }
    };

    plan.cleanup.execute();
    Ok(combined)
}

impl ConcatPlan {
    /// Append every source into the target, truncating the target first.
    ///
    /// A source whose last line lacks a newline gets one, so rows from
    /// adjacent partitions never merge. Returns the bytes written.
    pub fn execute(&self) -> Result<u64> {
        let mut target = OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(true)
            .open(&self.target)
            .map_err(|e| {
                Error::combine(format!("cannot create '{}': {e}", self.target.display()))
            })?;

        let mut written = 0;
        for source in &self.sources {
            let mut file = File::open(source).map_err(|e| {
                Error::combine(format!("cannot open partition '{}': {e}", source.display()))
            })?;
            written += io::copy(&mut file, &mut target)?;

            if !ends_with_newline(&mut file)? {
                target.write_all(b"\n")?;
                written += 1;
            }
        }
        target.flush()?;
        Ok(written)
    }
}

fn ends_with_newline(file: &mut File) -> io::Result<bool> {
    if file.metadata()?.len() == 0 {
        return Ok(true);
    }
    file.seek(SeekFrom::End(-1))?;
    let mut last = [0u8; 1];
    file.read_exact(&mut last)?;
    Ok(last[0] == b'\n')
}

impl CleanupPlan {
    /// Delete every file, skipping ones that are already gone.
    ///
    /// Returns the number of files actually removed; other failures are
    /// logged and do not stop the export.
    pub fn execute(&self) -> usize {
        let mut removed = 0;
        for file in &self.files {
            match fs::remove_file(file) {
                Ok(()) => removed += 1,
                Err(e) if e.kind() == io::ErrorKind::NotFound => {
                    debug!("Partition file already removed: {}", file.display());
                }
                Err(e) => warn!("Could not remove partition file {}: {e}", file.display()),
            }
        }
        removed
    }
}
