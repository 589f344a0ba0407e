//! Table writers
//!
//! Arrow IPC files, JSON lines and pipe-delimited text.

use crate::error::{Error, Result};
use crate::normalize::NormalizedTable;
use crate::types::SerializeMode;
use arrow::ipc::writer::FileWriter;
use arrow::json::LineDelimitedWriter;
use arrow::record_batch::RecordBatch;
use arrow::util::display::{ArrayFormatter, FormatOptions};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use tracing::info;

/// Written in place of a missing value in delimited output
pub const MISSING_TOKEN: &str = "?";

/// Receives the finished table
pub trait TableSink {
    /// Persist `table` as `name` in `mode`, returning the artifact path
    fn serialize(&self, table: &NormalizedTable, name: &str, mode: SerializeMode)
        -> Result<PathBuf>;
}

/// Writes serialized tables into one directory
#[derive(Debug, Clone)]
pub struct FileSerializer {
    dir: PathBuf,
}

impl FileSerializer {
    /// Create a serializer writing into `dir`
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Target directory
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Artifact path for a table in a mode
    pub fn path_for(&self, name: &str, mode: SerializeMode) -> PathBuf {
        self.dir.join(format!("{name}.{}", mode.extension()))
    }
}

impl TableSink for FileSerializer {
    fn serialize(
        &self,
        table: &NormalizedTable,
        name: &str,
        mode: SerializeMode,
    ) -> Result<PathBuf> {
        let path = self.path_for(name, mode);
        info!("Serializing data ({mode})...");
        let rows = match mode {
            SerializeMode::Columnar => write_columnar(&path, table.batch())?,
            SerializeMode::Generic => write_generic(&path, table.batch())?,
        };
        info!("Wrote {rows} rows to {}", path.display());
        Ok(path)
    }
}

fn create(path: &Path) -> Result<BufWriter<File>> {
    let file = File::create(path).map_err(|e| {
        Error::output(format!("Failed to create file '{}': {e}", path.display()))
    })?;
    Ok(BufWriter::new(file))
}

/// Write an Arrow IPC file (Feather v2)
pub fn write_columnar(path: &Path, batch: &RecordBatch) -> Result<usize> {
    let mut writer = FileWriter::try_new(create(path)?, batch.schema().as_ref())
        .map_err(|e| Error::output(format!("Failed to create IPC writer: {e}")))?;
    writer
        .write(batch)
        .map_err(|e| Error::output(format!("Failed to write batch: {e}")))?;
    writer
        .finish()
        .map_err(|e| Error::output(format!("Failed to finish IPC file: {e}")))?;
    writer.into_inner()?.flush()?;
    Ok(batch.num_rows())
}

/// Write one JSON object per row
pub fn write_generic(path: &Path, batch: &RecordBatch) -> Result<usize> {
    let mut writer = LineDelimitedWriter::new(create(path)?);
    writer
        .write(batch)
        .map_err(|e| Error::output(format!("Failed to write batch: {e}")))?;
    writer
        .finish()
        .map_err(|e| Error::output(format!("Failed to finish JSON lines: {e}")))?;
    writer.into_inner().flush()?;
    Ok(batch.num_rows())
}

/// Write `|`-separated text without a header, `?` for missing values.
///
/// Fields are written verbatim, the way the export tool writes them: no
/// quoting or escaping, so a value containing `|` cannot be read back.
pub fn write_delimited(path: &Path, batch: &RecordBatch) -> Result<usize> {
    let options = FormatOptions::default().with_null(MISSING_TOKEN);
    let formatters = batch
        .columns()
        .iter()
        .map(|column| ArrayFormatter::try_new(column.as_ref(), &options))
        .collect::<std::result::Result<Vec<_>, _>>()
        .map_err(|e| Error::output(format!("Failed to write delimited text: {e}")))?;

    let mut writer = create(path)?;
    for row in 0..batch.num_rows() {
        for (i, formatter) in formatters.iter().enumerate() {
            if i > 0 {
                writer.write_all(b"|")?;
            }
            write!(writer, "{}", formatter.value(row))?;
        }
        writer.write_all(b"\n")?;
    }
    writer.flush()?;
    Ok(batch.num_rows())
}
