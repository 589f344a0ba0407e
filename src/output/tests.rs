//! Tests for output module

use super::*;
use crate::normalize::{normalize, parse_delimited, NormalizedTable};
use crate::partition::Combined;
use crate::types::{DtypeMap, SerializeMode};
use arrow::ipc::reader::FileReader;
use pretty_assertions::assert_eq;
use serde_json::{json, Value};
use std::fs::{self, File};
use tempfile::tempdir;

fn cols(names: &[&str]) -> Vec<String> {
    names.iter().map(|s| (*s).to_string()).collect()
}

fn table(text: &str, names: &[&str], mode: SerializeMode) -> NormalizedTable {
    let batch = parse_delimited(text, &cols(names), &DtypeMap::new()).unwrap();
    normalize(Combined::Table(batch), &[], &DtypeMap::new(), mode).unwrap()
}

#[test]
fn test_path_for_uses_mode_extension() {
    let sink = FileSerializer::new("/out");
    assert_eq!(
        sink.path_for("sales", SerializeMode::Columnar),
        std::path::PathBuf::from("/out/sales.feather")
    );
    assert_eq!(
        sink.path_for("sales", SerializeMode::Generic),
        std::path::PathBuf::from("/out/sales.jsonl")
    );
}

#[test]
fn test_columnar_writes_ipc_file() {
    let dir = tempdir().unwrap();
    let t = table("007|1.5\n042|2.5\n", &["cust_id", "amt"], SerializeMode::Columnar);

    let path = FileSerializer::new(dir.path())
        .serialize(&t, "cust", SerializeMode::Columnar)
        .unwrap();

    let reader = FileReader::try_new(File::open(&path).unwrap(), None).unwrap();
    let schema = reader.schema();
    let rows: usize = reader.map(|b| b.unwrap().num_rows()).sum();
    assert_eq!(rows, 2);
    assert_eq!(schema.field(0).name(), "cust_id");
}

#[test]
fn test_generic_writes_json_lines() {
    let dir = tempdir().unwrap();
    let t = table(
        "007|2019-01-02\n042|?\n",
        &["cust_id", "sale_dt"],
        SerializeMode::Generic,
    );

    let path = FileSerializer::new(dir.path())
        .serialize(&t, "cust", SerializeMode::Generic)
        .unwrap();

    let lines: Vec<Value> = fs::read_to_string(&path)
        .unwrap()
        .lines()
        .map(|l| serde_json::from_str(l).unwrap())
        .collect();
    assert_eq!(lines[0], json!({"cust_id": "007", "sale_dt": "2019-01-02"}));
    assert_eq!(lines[1], json!({"cust_id": "042"}));
}

#[test]
fn test_delimited_marks_missing_values() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("raw.txt");
    let batch = parse_delimited("a|1\n?|2\n", &cols(&["s", "n"]), &DtypeMap::new()).unwrap();

    let rows = write_delimited(&path, &batch).unwrap();

    assert_eq!(rows, 2);
    assert_eq!(fs::read_to_string(&path).unwrap(), "a|1\n?|2\n");
}

#[test]
fn test_delimited_writes_fields_unquoted() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("raw.txt");
    let text = "say \"hi\"|a,b\n";
    let batch = parse_delimited(text, &cols(&["s", "t"]), &DtypeMap::new()).unwrap();

    write_delimited(&path, &batch).unwrap();

    assert_eq!(fs::read_to_string(&path).unwrap(), text);
}

#[test]
fn test_serialize_into_missing_dir_fails() {
    let t = table("1\n", &["n"], SerializeMode::Generic);
    let err = FileSerializer::new("/nonexistent/serialized")
        .serialize(&t, "t", SerializeMode::Generic)
        .unwrap_err();
    assert!(matches!(err, crate::error::Error::Output { .. }));
}
