//! Tests for normalize module

use super::*;
use crate::error::Error;
use crate::partition::Combined;
use crate::types::{ColumnType, DtypeMap, SerializeMode};
use arrow::array::{Array, Date32Array, Float64Array, Int64Array, StringArray};
use arrow::datatypes::DataType;
use pretty_assertions::assert_eq;
use std::fs;
use tempfile::tempdir;

fn cols(names: &[&str]) -> Vec<String> {
    names.iter().map(|s| (*s).to_string()).collect()
}

fn strings(table: &NormalizedTable, name: &str) -> Vec<Option<String>> {
    table
        .column(name)
        .unwrap()
        .as_any()
        .downcast_ref::<StringArray>()
        .unwrap()
        .iter()
        .map(|v| v.map(String::from))
        .collect()
}

// ============================================================================
// Parse Tests
// ============================================================================

#[test]
fn test_parse_delimited_markers_are_null() {
    let text = "1|?|a\n2|~|b\n3|!|null\n4||d\n";
    let batch = parse_delimited(text, &cols(&["n", "x", "s"]), &DtypeMap::new()).unwrap();

    assert_eq!(batch.num_rows(), 4);
    assert_eq!(batch.column(1).null_count(), 4);
    assert_eq!(batch.column(2).null_count(), 1);
}

#[test]
fn test_parse_delimited_infers_numbers() {
    let text = "1|1.5|x\n2|2|y\n";
    let batch = parse_delimited(text, &cols(&["n", "f", "s"]), &DtypeMap::new()).unwrap();
    let schema = batch.schema();

    assert_eq!(schema.field(0).data_type(), &DataType::Int64);
    assert_eq!(schema.field(1).data_type(), &DataType::Float64);
    assert_eq!(schema.field(2).data_type(), &DataType::Utf8);
}

#[test]
fn test_parse_delimited_declared_types() {
    let mut dtypes = DtypeMap::new();
    dtypes.insert("n".to_string(), ColumnType::Text);
    dtypes.insert("f".to_string(), ColumnType::Float);

    let batch = parse_delimited("10|3\n", &cols(&["n", "f"]), &dtypes).unwrap();

    assert_eq!(batch.schema().field(0).data_type(), &DataType::Utf8);
    let f = batch.column(1).as_any().downcast_ref::<Float64Array>().unwrap();
    assert_eq!(f.value(0), 3.0);
}

#[test]
fn test_parse_delimited_declared_type_mismatch_falls_back_to_text() {
    let mut dtypes = DtypeMap::new();
    dtypes.insert("n".to_string(), ColumnType::Integer);

    let batch = parse_delimited("1\nabc\n", &cols(&["n"]), &dtypes).unwrap();
    assert_eq!(batch.schema().field(0).data_type(), &DataType::Utf8);
}

#[test]
fn test_parse_delimited_identifier_always_text() {
    let mut dtypes = DtypeMap::new();
    dtypes.insert("cust_id".to_string(), ColumnType::Integer);

    let batch = parse_delimited("007\n042\n", &cols(&["cust_id"]), &dtypes).unwrap();
    let ids = batch.column(0).as_any().downcast_ref::<StringArray>().unwrap();

    assert_eq!(ids.value(0), "007");
    assert_eq!(ids.value(1), "042");
}

#[test]
fn test_parse_delimited_short_rows_padded_blank_lines_skipped() {
    let batch = parse_delimited("1|a\n\n2\r\n", &cols(&["n", "s"]), &DtypeMap::new()).unwrap();

    assert_eq!(batch.num_rows(), 2);
    assert!(batch.column(1).is_null(1));
}

#[test]
fn test_parse_delimited_too_many_fields() {
    let err = parse_delimited("1|2|3\n", &cols(&["a", "b"]), &DtypeMap::new()).unwrap_err();
    assert!(matches!(err, Error::RawParse { line: 1, .. }));
}

#[test]
fn test_parse_delimited_requires_columns() {
    assert!(parse_delimited("1\n", &[], &DtypeMap::new()).is_err());
}

// ============================================================================
// Load Tests
// ============================================================================

#[test]
fn test_load_raw_latin1_fallback() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("t.txt");
    // 0xE9 is 'é' in Latin-1 and invalid on its own in UTF-8
    fs::write(&path, b"1|caf\xe9\n").unwrap();

    let batch = load_raw(&path, &cols(&["n", "name"]), &DtypeMap::new()).unwrap();
    let names = batch.column(1).as_any().downcast_ref::<StringArray>().unwrap();

    assert_eq!(names.value(0), "caf\u{e9}");
}

#[test]
fn test_load_raw_empty_file_is_load_failure() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("empty.txt");
    fs::write(&path, b"\n\n").unwrap();

    let err = load_raw(&path, &cols(&["a", "b"]), &DtypeMap::new()).unwrap_err();
    assert!(matches!(err, Error::LoadEncoding { .. }));
    assert!(err.to_string().contains("no rows after Latin-1 retry"));
}

#[test]
fn test_load_raw_second_failure_is_fatal() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("bad.txt");
    fs::write(&path, b"1|2|3\n").unwrap();

    let err = load_raw(&path, &cols(&["a"]), &DtypeMap::new()).unwrap_err();
    assert!(matches!(err, Error::LoadEncoding { .. }));
}

#[test]
fn test_load_raw_missing_file() {
    let err = load_raw(
        std::path::Path::new("/nonexistent/raw.txt"),
        &cols(&["a"]),
        &DtypeMap::new(),
    )
    .unwrap_err();
    assert!(matches!(err, Error::LoadEncoding { .. }));
}

// ============================================================================
// Normalize Tests
// ============================================================================

fn normalize_text(text: &str, names: &[&str], mode: SerializeMode) -> NormalizedTable {
    let dir = tempdir().unwrap();
    let path = dir.path().join("raw.txt");
    fs::write(&path, text).unwrap();
    normalize(Combined::File(path), &cols(names), &DtypeMap::new(), mode).unwrap()
}

#[test]
fn test_normalize_trims_text_and_keeps_nulls() {
    let table = normalize_text("  a  |x\n?|y\n", &["name", "tag"], SerializeMode::Generic);

    assert_eq!(
        strings(&table, "name"),
        vec![Some("a".to_string()), None]
    );
}

#[test]
fn test_normalize_drops_all_null_columns() {
    let table = normalize_text("1|?|a\n2||b\n3|null|c\n", &["n", "empty", "s"], SerializeMode::Generic);

    assert_eq!(table.column_names(), cols(&["n", "s"]));
    assert!(table.column("empty").is_none());
}

#[test]
fn test_normalize_identifier_keeps_leading_zeros() {
    let table = normalize_text("007|1\n042|2\n", &["cust_id", "qty"], SerializeMode::Columnar);

    assert_eq!(
        strings(&table, "cust_id"),
        vec![Some("007".to_string()), Some("042".to_string())]
    );
    assert_eq!(
        table.column("qty").unwrap().data_type(),
        &DataType::Int64
    );
}

#[test]
fn test_normalize_casts_numeric_identifier_from_table() {
    let batch = parse_delimited("5|x\n6|y\n", &cols(&["n", "s"]), &DtypeMap::new()).unwrap();
    // Rename "n" to an identifier name after typing it as an integer
    let schema = arrow::datatypes::Schema::new(vec![
        arrow::datatypes::Field::new("acct_key", DataType::Int64, true),
        arrow::datatypes::Field::new("s", DataType::Utf8, true),
    ]);
    let batch = arrow::record_batch::RecordBatch::try_new(
        std::sync::Arc::new(schema),
        batch.columns().to_vec(),
    )
    .unwrap();

    let table = normalize(
        Combined::Table(batch),
        &[],
        &DtypeMap::new(),
        SerializeMode::Generic,
    )
    .unwrap();

    assert_eq!(
        strings(&table, "acct_key"),
        vec![Some("5".to_string()), Some("6".to_string())]
    );
}

#[test]
fn test_normalize_parses_dates_outside_columnar_mode() {
    let table = normalize_text("2019-01-02\n2019-12-31\n?\n", &["sale_dt"], SerializeMode::Generic);
    let dates = table
        .column("sale_dt")
        .unwrap()
        .as_any()
        .downcast_ref::<Date32Array>()
        .unwrap();

    assert_eq!(dates.value(0), 17898); // 2019-01-02
    assert_eq!(dates.value(1), 18261); // 2019-12-31
    assert!(dates.is_null(2));
}

#[test]
fn test_normalize_leaves_dates_as_text_in_columnar_mode() {
    let table = normalize_text("2019-01-02\n", &["sale_dt"], SerializeMode::Columnar);
    assert_eq!(table.column("sale_dt").unwrap().data_type(), &DataType::Utf8);
}

#[test]
fn test_normalize_unparseable_date_column_left_untouched() {
    let table = normalize_text("2019-01-02\nlater\n", &["ship_dt"], SerializeMode::Generic);
    assert_eq!(
        strings(&table, "ship_dt"),
        vec![Some("2019-01-02".to_string()), Some("later".to_string())]
    );
}

#[test]
fn test_normalize_empty_table_keeps_columns() {
    let table = normalize_text("", &["a", "b"], SerializeMode::Generic);
    assert_eq!(table.num_rows(), 0);
    assert_eq!(table.num_columns(), 2);
}

#[test]
fn test_normalize_integer_column_values() {
    let table = normalize_text("1|x\n2|y\n", &["amt", "s"], SerializeMode::Generic);
    let amt = table
        .column("amt")
        .unwrap()
        .as_any()
        .downcast_ref::<Int64Array>()
        .unwrap();
    assert_eq!(amt.values().to_vec(), vec![1, 2]);
}
