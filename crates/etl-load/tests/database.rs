//! Tests for the SQLite loader.

use polars::prelude::{Column, DataFrame, IntoColumn, NamedFrom, Series};
use rusqlite::Connection;

use etl_core::config::DatabaseMode;
use etl_core::error::EtlError;
use etl_core::frame::SourceFrame;
use etl_load::write_database;

fn sample_frame() -> SourceFrame {
    let columns: Vec<Column> = vec![
        Series::new("id".into(), vec![1i64, 2, 3]).into_column(),
        Series::new("region".into(), vec![Some("North"), None, Some("East")]).into_column(),
        Series::new("price".into(), vec![10.5f64, 20.0, 30.25]).into_column(),
    ];
    SourceFrame::new("test", DataFrame::new(columns).unwrap())
}

fn count_rows(db: &std::path::Path, table: &str) -> i64 {
    let conn = Connection::open(db).unwrap();
    conn.query_row(&format!("SELECT COUNT(*) FROM {table}"), [], |row| {
        row.get(0)
    })
    .unwrap()
}

#[test]
fn append_creates_table_and_inserts() {
    let dir = tempfile::tempdir().unwrap();
    let db = dir.path().join("sales.db");
    write_database(&sample_frame(), &db, "sales", DatabaseMode::Append).unwrap();
    assert_eq!(count_rows(&db, "sales"), 3);

    // nulls survive the trip
    let conn = Connection::open(&db).unwrap();
    let nulls: i64 = conn
        .query_row("SELECT COUNT(*) FROM sales WHERE region IS NULL", [], |row| {
            row.get(0)
        })
        .unwrap();
    assert_eq!(nulls, 1);
}

#[test]
fn append_twice_duplicates_rows() {
    let dir = tempfile::tempdir().unwrap();
    let db = dir.path().join("sales.db");
    write_database(&sample_frame(), &db, "sales", DatabaseMode::Append).unwrap();
    write_database(&sample_frame(), &db, "sales", DatabaseMode::Append).unwrap();
    // append adds without deduplication, by design
    assert_eq!(count_rows(&db, "sales"), 6);
}

#[test]
fn replace_recreates_the_table() {
    let dir = tempfile::tempdir().unwrap();
    let db = dir.path().join("sales.db");
    write_database(&sample_frame(), &db, "sales", DatabaseMode::Append).unwrap();
    write_database(&sample_frame(), &db, "sales", DatabaseMode::Replace).unwrap();
    assert_eq!(count_rows(&db, "sales"), 3);
}

#[test]
fn append_to_mismatched_table_is_schema_error() {
    let dir = tempfile::tempdir().unwrap();
    let db = dir.path().join("sales.db");
    {
        let conn = Connection::open(&db).unwrap();
        conn.execute("CREATE TABLE sales (something_else TEXT)", [])
            .unwrap();
    }
    let error = write_database(&sample_frame(), &db, "sales", DatabaseMode::Append).unwrap_err();
    assert!(matches!(error, EtlError::Schema(_)));
}

#[test]
fn unreachable_database_is_connection_error() {
    let dir = tempfile::tempdir().unwrap();
    // a directory path is not a valid sqlite file target
    let error =
        write_database(&sample_frame(), dir.path(), "sales", DatabaseMode::Append).unwrap_err();
    assert!(matches!(error, EtlError::Connection(_)));
}

#[test]
fn hostile_table_name_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let db = dir.path().join("sales.db");
    let error = write_database(
        &sample_frame(),
        &db,
        "sales; DROP TABLE users",
        DatabaseMode::Append,
    )
    .unwrap_err();
    assert!(matches!(error, EtlError::Value(_)));
}
