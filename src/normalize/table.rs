//! Normalized table

use arrow::array::ArrayRef;
use arrow::record_batch::RecordBatch;

/// A cleaned table ready for serialization.
///
/// No column is entirely null (unless the table has no rows) and every
/// identifier-named column is text.
#[derive(Debug, Clone)]
pub struct NormalizedTable {
    batch: RecordBatch,
}

impl NormalizedTable {
    pub(crate) fn new(batch: RecordBatch) -> Self {
        Self { batch }
    }

    /// The underlying record batch
    pub fn batch(&self) -> &RecordBatch {
        &self.batch
    }

    /// Consume into the underlying record batch
    pub fn into_batch(self) -> RecordBatch {
        self.batch
    }

    /// Number of rows
    pub fn num_rows(&self) -> usize {
        self.batch.num_rows()
    }

    /// Number of columns
    pub fn num_columns(&self) -> usize {
        self.batch.num_columns()
    }

    /// Column names in order
    pub fn column_names(&self) -> Vec<String> {
        self.batch
            .schema()
            .fields()
            .iter()
            .map(|f| f.name().clone())
            .collect()
    }

    /// Column by name
    pub fn column(&self, name: &str) -> Option<&ArrayRef> {
        self.batch.column_by_name(name)
    }
}
