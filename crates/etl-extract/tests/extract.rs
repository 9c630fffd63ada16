//! Tests for file extraction.

use std::path::Path;

use polars::prelude::DataType;

use etl_core::error::EtlError;
use etl_extract::{extract_from_csv, extract_from_json};

fn write_fixture(dir: &Path, name: &str, content: &str) -> std::path::PathBuf {
    let path = dir.join(name);
    std::fs::write(&path, content).unwrap();
    path
}

#[test]
fn csv_extraction_infers_types_and_nulls() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_fixture(
        dir.path(),
        "sales.csv",
        "transaction_id,region,unit_price\n1,North,10.5\n2,South,\n3,,7\n",
    );

    let frame = extract_from_csv(&path).unwrap();
    assert_eq!(frame.row_count(), 3);
    assert_eq!(frame.column_count(), 3);
    assert_eq!(
        frame.data.column("transaction_id").unwrap().dtype(),
        &DataType::Int64
    );
    assert_eq!(
        frame.data.column("unit_price").unwrap().dtype(),
        &DataType::Float64
    );
    assert_eq!(frame.data.column("unit_price").unwrap().null_count(), 1);
    assert_eq!(frame.data.column("region").unwrap().null_count(), 1);
}

#[test]
fn csv_missing_file_is_not_found() {
    let dir = tempfile::tempdir().unwrap();
    let error = extract_from_csv(&dir.path().join("absent.csv")).unwrap_err();
    assert!(matches!(error, EtlError::NotFound { .. }));
}

#[test]
fn csv_ragged_row_is_a_parse_error() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_fixture(dir.path(), "bad.csv", "a,b\n1,2\n3,4,5\n");
    let error = extract_from_csv(&path).unwrap_err();
    assert!(matches!(error, EtlError::Parse { .. }));
}

#[test]
fn json_array_of_objects_extracts() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_fixture(
        dir.path(),
        "sales.json",
        r#"[
            {"id": 1, "region": "North", "price": 10.5},
            {"id": 2, "price": 3},
            {"id": 3, "region": "East", "price": null}
        ]"#,
    );

    let frame = extract_from_json(&path).unwrap();
    assert_eq!(frame.row_count(), 3);
    assert_eq!(frame.column_names(), vec!["id", "price", "region"]);
    assert_eq!(frame.data.column("id").unwrap().dtype(), &DataType::Int64);
    // 10.5 forces the mixed int/float column to Float64
    assert_eq!(
        frame.data.column("price").unwrap().dtype(),
        &DataType::Float64
    );
    // one object omits "region", one has an explicit null elsewhere
    assert_eq!(frame.data.column("region").unwrap().null_count(), 1);
    assert_eq!(frame.data.column("price").unwrap().null_count(), 1);
}

#[test]
fn json_single_object_is_one_row() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_fixture(dir.path(), "one.json", r#"{"id": 7, "region": "West"}"#);
    let frame = extract_from_json(&path).unwrap();
    assert_eq!(frame.row_count(), 1);
}

#[test]
fn json_nested_value_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_fixture(
        dir.path(),
        "nested.json",
        r#"[{"id": 1, "tags": ["a", "b"]}]"#,
    );
    let error = extract_from_json(&path).unwrap_err();
    assert!(matches!(error, EtlError::Parse { .. }));
}

#[test]
fn json_scalar_top_level_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_fixture(dir.path(), "scalar.json", "42");
    let error = extract_from_json(&path).unwrap_err();
    assert!(matches!(error, EtlError::Parse { .. }));
}
