//! Column-wise join of horizontal partitions

use crate::error::{Error, Result};
use arrow::array::{ArrayRef, UInt32Array};
use arrow::compute::take;
use arrow::datatypes::{Field, Schema};
use arrow::record_batch::RecordBatch;
use arrow::util::display::{ArrayFormatter, FormatOptions};
use std::collections::{HashMap, HashSet};
use std::sync::Arc;

const KEY_SEPARATOR: char = '\u{1f}';

/// Left-join every partition onto the first one by `keys`.
///
/// The result keeps the first partition's rows in order; key columns appear
/// once, followed by each partition's non-key columns in partition order.
/// Rows with no match in a later partition get nulls for its columns; if a
/// later partition repeats a key, its first row wins.
pub fn join_on_keys(parts: &[RecordBatch], keys: &[String]) -> Result<RecordBatch> {
    let (base, rest) = parts
        .split_first()
        .ok_or_else(|| Error::combine("no partitions to join"))?;

    let base_keys = row_keys(base, keys)?;

    let mut fields: Vec<Field> = Vec::new();
    let mut columns: Vec<ArrayRef> = Vec::new();
    let mut seen: HashSet<String> = HashSet::new();

    for key in keys {
        let idx = base.schema().index_of(key)?;
        fields.push(base.schema().field(idx).clone());
        columns.push(Arc::clone(base.column(idx)));
        seen.insert(key.clone());
    }
    append_non_keys(base, None, keys, &mut seen, &mut fields, &mut columns)?;

    for part in rest {
        let lookup = index_by_key(part, keys)?;
        let indices: UInt32Array = base_keys.iter().map(|k| lookup.get(k).copied()).collect();
        append_non_keys(part, Some(&indices), keys, &mut seen, &mut fields, &mut columns)?;
    }

    let schema = Arc::new(Schema::new(fields));
    if columns.is_empty() {
        return Ok(RecordBatch::new_empty(schema));
    }
    Ok(RecordBatch::try_new(schema, columns)?)
}

fn append_non_keys(
    part: &RecordBatch,
    indices: Option<&UInt32Array>,
    keys: &[String],
    seen: &mut HashSet<String>,
    fields: &mut Vec<Field>,
    columns: &mut Vec<ArrayRef>,
) -> Result<()> {
    let schema = part.schema();
    for (idx, field) in schema.fields().iter().enumerate() {
        if keys.contains(field.name()) {
            continue;
        }
        if !seen.insert(field.name().clone()) {
            return Err(Error::combine(format!(
                "column '{}' appears in more than one partition",
                field.name()
            )));
        }
        let column = match indices {
            Some(indices) => take(part.column(idx).as_ref(), indices, None)?,
            None => Arc::clone(part.column(idx)),
        };
        fields.push(Field::new(field.name(), field.data_type().clone(), true));
        columns.push(column);
    }
    Ok(())
}

fn index_by_key(part: &RecordBatch, keys: &[String]) -> Result<HashMap<String, u32>> {
    let mut lookup = HashMap::with_capacity(part.num_rows());
    for (row, key) in row_keys(part, keys)?.into_iter().enumerate() {
        let row = u32::try_from(row)
            .map_err(|_| Error::combine("partition too large to join"))?;
        lookup.entry(key).or_insert(row);
    }
    Ok(lookup)
}

/// Render each row's key columns into one comparable string
fn row_keys(batch: &RecordBatch, keys: &[String]) -> Result<Vec<String>> {
    let options = FormatOptions::default();
    let mut formatters = Vec::with_capacity(keys.len());
    for key in keys {
        let idx = batch.schema().index_of(key).map_err(|_| {
            Error::combine(format!("primary key '{key}' missing from a partition"))
        })?;
        formatters.push(ArrayFormatter::try_new(batch.column(idx).as_ref(), &options)?);
    }

    Ok((0..batch.num_rows())
        .map(|row| {
            formatters
                .iter()
                .map(|f| f.value(row).to_string())
                .collect::<Vec<_>>()
                .join(&KEY_SEPARATOR.to_string())
        })
        .collect())
}
