//! Tests for file outputs.

use std::fs::File;

use polars::prelude::{
    Column, DataFrame, IntoColumn, NamedFrom, ParquetReader, SerReader, Series,
};

use etl_core::config::WriteMode;
use etl_core::error::EtlError;
use etl_core::frame::SourceFrame;
use etl_extract::{extract_from_csv, extract_from_json};
use etl_load::{write_csv, write_json, write_parquet};

fn sample_frame() -> SourceFrame {
    let columns: Vec<Column> = vec![
        Series::new("id".into(), vec![1i64, 2, 3]).into_column(),
        Series::new("region".into(), vec!["North", "South", "East"]).into_column(),
        Series::new("price".into(), vec![10.5f64, 20.0, 30.25]).into_column(),
    ];
    SourceFrame::new("test", DataFrame::new(columns).unwrap())
}

#[test]
fn csv_round_trip_preserves_rows_and_columns() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("out.csv");
    let frame = sample_frame();

    write_csv(&frame, &path, WriteMode::Overwrite).unwrap();
    let back = extract_from_csv(&path).unwrap();

    assert_eq!(back.column_names(), frame.column_names());
    assert!(back.data.equals_missing(&frame.data));
}

#[test]
fn csv_append_concatenates_without_second_header() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("out.csv");
    let frame = sample_frame();

    write_csv(&frame, &path, WriteMode::Overwrite).unwrap();
    write_csv(&frame, &path, WriteMode::Append).unwrap();

    let back = extract_from_csv(&path).unwrap();
    assert_eq!(back.row_count(), 6);

    let text = std::fs::read_to_string(&path).unwrap();
    assert_eq!(text.matches("id,region,price").count(), 1);
}

#[test]
fn csv_overwrite_is_idempotent() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("out.csv");
    let frame = sample_frame();

    write_csv(&frame, &path, WriteMode::Overwrite).unwrap();
    let first = std::fs::read_to_string(&path).unwrap();
    write_csv(&frame, &path, WriteMode::Overwrite).unwrap();
    let second = std::fs::read_to_string(&path).unwrap();
    assert_eq!(first, second);
}

#[test]
fn json_round_trip_preserves_rows() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("out.json");
    let frame = sample_frame();

    write_json(&frame, &path, WriteMode::Overwrite).unwrap();
    let back = extract_from_json(&path).unwrap();
    assert_eq!(back.row_count(), 3);
}

#[test]
fn json_append_concatenates_rows() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("out.json");
    let frame = sample_frame();

    write_json(&frame, &path, WriteMode::Overwrite).unwrap();
    write_json(&frame, &path, WriteMode::Append).unwrap();

    let back = extract_from_json(&path).unwrap();
    assert_eq!(back.row_count(), 6);
}

#[test]
fn json_append_with_different_columns_is_schema_error() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("out.json");
    write_json(&sample_frame(), &path, WriteMode::Overwrite).unwrap();

    let other = SourceFrame::new(
        "test",
        DataFrame::new(vec![
            Series::new("other".into(), vec![1i64]).into_column(),
        ])
        .unwrap(),
    );
    let error = write_json(&other, &path, WriteMode::Append).unwrap_err();
    assert!(matches!(error, EtlError::Schema(_)));
}

#[test]
fn parquet_round_trip() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("out.parquet");
    let frame = sample_frame();

    write_parquet(&frame, &path, WriteMode::Overwrite).unwrap();
    let back = ParquetReader::new(File::open(&path).unwrap()).finish().unwrap();
    assert!(back.equals_missing(&frame.data));
}

#[test]
fn parquet_append_writes_a_new_partition() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("out.parquet");
    let frame = sample_frame();

    write_parquet(&frame, &path, WriteMode::Append).unwrap();
    assert!(path.exists());

    write_parquet(&frame, &path, WriteMode::Append).unwrap();
    let part = dir.path().join("out.part-0001.parquet");
    assert!(part.exists());

    let base = ParquetReader::new(File::open(&path).unwrap()).finish().unwrap();
    let extra = ParquetReader::new(File::open(&part).unwrap()).finish().unwrap();
    assert_eq!(base.height() + extra.height(), 6);
}

#[test]
fn writers_create_parent_directories() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("nested/deep/out.csv");
    write_csv(&sample_frame(), &path, WriteMode::Overwrite).unwrap();
    assert!(path.exists());
}
