//! Schema-aware cleaning
//!
//! Turns a combined raw dataset into a [`NormalizedTable`].

use super::loader::{load_raw, typed_array};
use super::table::NormalizedTable;
use crate::error::{Error, Result};
use crate::partition::Combined;
use crate::types::{is_date_column, is_identifier_column, ColumnType, DtypeMap, SerializeMode};
use arrow::array::{Array, ArrayRef, StringArray};
use arrow::compute::cast;
use arrow::datatypes::{DataType, Field, Schema};
use arrow::record_batch::{RecordBatch, RecordBatchOptions};
use std::sync::Arc;
use tracing::{info, warn};

/// Load (if needed) and clean a combined dataset.
///
/// Steps, in order:
/// 1. text values are trimmed (nulls stay null)
/// 2. outside columnar mode, date-named text columns become dates when every
///    value parses as `YYYY-MM-DD`; otherwise they are left as they were
/// 3. identifier-named columns are cast to text
/// 4. columns with no non-null value are dropped
pub fn normalize(
    source: Combined,
    columns: &[String],
    dtypes: &DtypeMap,
    mode: SerializeMode,
) -> Result<NormalizedTable> {
    let batch = match source {
        Combined::File(path) => {
            info!("Reading {} into memory...", path.display());
            load_raw(&path, columns, dtypes)?
        }
        Combined::Table(batch) => batch,
    };

    info!("Cleaning data...");
    let mut parts = split(&batch);

    for (_, column) in &mut parts {
        if let Some(strings) = column.as_any().downcast_ref::<StringArray>() {
            *column = Arc::new(strings.iter().map(|v| v.map(str::trim)).collect::<StringArray>());
        }
    }

    if !mode.is_columnar() {
        for (field, column) in &mut parts {
            if is_date_column(field.name()) && field.data_type() == &DataType::Utf8 {
                if let Some(dates) = parse_dates(field.name(), column) {
                    *field = Field::new(field.name(), DataType::Date32, true);
                    *column = dates;
                }
            }
        }
    }

    for (field, column) in &mut parts {
        if is_identifier_column(field.name()) && field.data_type() != &DataType::Utf8 {
            match cast(column.as_ref(), &DataType::Utf8) {
                Ok(text) => {
                    *field = Field::new(field.name(), DataType::Utf8, true);
                    *column = text;
                }
                Err(e) => warn!("{}", Error::coercion(field.name(), e)),
            }
        }
    }

    let rows = batch.num_rows();
    if rows > 0 {
        let before = parts.len();
        parts.retain(|(_, column)| column.null_count() < column.len());
        if parts.len() < before {
            info!("Dropped {} all-null columns", before - parts.len());
        }
    }

    Ok(NormalizedTable::new(rebuild(parts, rows)?))
}

fn parse_dates(name: &str, column: &ArrayRef) -> Option<ArrayRef> {
    let strings = column.as_any().downcast_ref::<StringArray>()?;
    let values: Vec<Option<&str>> = strings.iter().collect();
    let dates = typed_array(&values, ColumnType::Date);
    if dates.is_none() {
        warn!("{}", Error::coercion(name, "not every value is a YYYY-MM-DD date"));
    }
    dates
}

fn split(batch: &RecordBatch) -> Vec<(Field, ArrayRef)> {
    batch
        .schema()
        .fields()
        .iter()
        .zip(batch.columns())
        .map(|(f, c)| (f.as_ref().clone(), Arc::clone(c)))
        .collect()
}

fn rebuild(parts: Vec<(Field, ArrayRef)>, rows: usize) -> Result<RecordBatch> {
    let (fields, columns): (Vec<Field>, Vec<ArrayRef>) = parts.into_iter().unzip();
    let options = RecordBatchOptions::new().with_row_count(Some(rows));
    Ok(RecordBatch::try_new_with_options(
        Arc::new(Schema::new(fields)),
        columns,
        &options,
    )?)
}
