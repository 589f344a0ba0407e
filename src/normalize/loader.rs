//! Raw file loader
//!
//! Parses FastExport text output (`|`-separated, no header, no quoting).

use crate::error::{Error, Result};
use crate::types::{is_identifier_column, is_missing_marker, ColumnType, DtypeMap};
use arrow::array::{ArrayRef, Date32Array, Float64Array, Int64Array, StringArray};
use arrow::datatypes::{Field, Schema};
use arrow::record_batch::RecordBatch;
use chrono::{Datelike, NaiveDate};
use std::fs;
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, warn};

/// Field separator of the raw export files
pub const FIELD_SEPARATOR: char = '|';

/// Format of date values in the raw export files
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// `num_days_from_ce` of 1970-01-01
const UNIX_EPOCH_DAYS_FROM_CE: i32 = 719_163;

/// Load a raw export file.
///
/// The file is decoded as UTF-8 first; if that fails, or parses to zero
/// rows, it is decoded once more as Latin-1. A failure of the second
/// attempt, including a second empty result, is returned as
/// [`Error::LoadEncoding`].
pub fn load_raw(path: &Path, columns: &[String], dtypes: &DtypeMap) -> Result<RecordBatch> {
    let bytes = fs::read(path).map_err(|e| Error::load(path, e))?;

    let first = std::str::from_utf8(&bytes)
        .map_err(|e| Error::load(path, e))
        .and_then(|text| parse_delimited(text, columns, dtypes));

    match first {
        Ok(batch) if batch.num_rows() > 0 => return Ok(batch),
        Ok(_) => debug!("{} has no rows as UTF-8, retrying as Latin-1", path.display()),
        Err(e) => warn!("Retrying {} as Latin-1: {e}", path.display()),
    }

    let text: String = bytes.iter().map(|&b| char::from(b)).collect();
    let batch = parse_delimited(&text, columns, dtypes).map_err(|e| Error::load(path, e))?;
    if batch.num_rows() == 0 {
        return Err(Error::load(path, "no rows after Latin-1 retry"));
    }
    Ok(batch)
}

/// Parse raw export text into a table with the given columns.
///
/// Missing-value markers become nulls, short rows are padded with nulls and
/// blank lines are skipped. Identifier-named columns are always text;
/// other columns use their declared type, or an inferred one.
pub fn parse_delimited(text: &str, columns: &[String], dtypes: &DtypeMap) -> Result<RecordBatch> {
    if columns.is_empty() {
        return Err(Error::raw_parse(0, "no column names supplied"));
    }

    let mut values: Vec<Vec<Option<&str>>> = vec![Vec::new(); columns.len()];
    for (line_no, line) in text.lines().enumerate() {
        if line.trim().is_empty() {
            continue;
        }
        let mut count = 0;
        for field in line.split(FIELD_SEPARATOR) {
            let Some(column) = values.get_mut(count) else {
                return Err(Error::raw_parse(
                    line_no + 1,
                    format!("expected {} fields, found more", columns.len()),
                ));
            };
            column.push((!is_missing_marker(field)).then_some(field));
            count += 1;
        }
        for column in values.iter_mut().skip(count) {
            column.push(None);
        }
    }

    let mut fields = Vec::with_capacity(columns.len());
    let mut arrays = Vec::with_capacity(columns.len());
    for (name, column) in columns.iter().zip(&values) {
        let array = build_column(name, column, dtypes.get(name).copied());
        fields.push(Field::new(name, array.data_type().clone(), true));
        arrays.push(array);
    }

    Ok(RecordBatch::try_new(Arc::new(Schema::new(fields)), arrays)?)
}

fn build_column(name: &str, values: &[Option<&str>], declared: Option<ColumnType>) -> ArrayRef {
    let wanted = if is_identifier_column(name) {
        Some(ColumnType::Text)
    } else {
        declared
    };

    match wanted {
        Some(ColumnType::Text) => text_array(values),
        Some(ty) => typed_array(values, ty).unwrap_or_else(|| {
            warn!(
                "{}",
                Error::coercion(name, format!("values do not fit declared type {ty:?}"))
            );
            text_array(values)
        }),
        None => infer_array(values),
    }
}

fn infer_array(values: &[Option<&str>]) -> ArrayRef {
    if values.iter().all(Option::is_none) {
        return text_array(values);
    }
    typed_array(values, ColumnType::Integer)
        .or_else(|| typed_array(values, ColumnType::Float))
        .unwrap_or_else(|| text_array(values))
}

fn text_array(values: &[Option<&str>]) -> ArrayRef {
    Arc::new(values.iter().copied().collect::<StringArray>())
}

/// Build a typed array, or `None` if any present value does not parse
pub(crate) fn typed_array(values: &[Option<&str>], ty: ColumnType) -> Option<ArrayRef> {
    let array: ArrayRef = match ty {
        ColumnType::Text => text_array(values),
        ColumnType::Integer => Arc::new(Int64Array::from(parse_each(values, |s| {
            s.trim().parse::<i64>().ok()
        })?)),
        ColumnType::Float => Arc::new(Float64Array::from(parse_each(values, |s| {
            s.trim().parse::<f64>().ok()
        })?)),
        ColumnType::Date => Arc::new(Date32Array::from(parse_each(values, date_to_days)?)),
    };
    Some(array)
}

/// Parse every present value; nulls stay null, one failure fails the column
fn parse_each<T>(
    values: &[Option<&str>],
    parse: impl Fn(&str) -> Option<T>,
) -> Option<Vec<Option<T>>> {
    values
        .iter()
        .map(|v| match *v {
            None => Some(None),
            Some(s) => parse(s).map(Some),
        })
        .collect()
}

/// Days since the Unix epoch of a `YYYY-MM-DD` value
pub(crate) fn date_to_days(value: &str) -> Option<i32> {
    NaiveDate::parse_from_str(value.trim(), DATE_FORMAT)
        .ok()
        .map(|d| d.num_days_from_ce() - UNIX_EPOCH_DAYS_FROM_CE)
}
