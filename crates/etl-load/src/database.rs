//! SQLite output via rusqlite.
//!
//! `Replace` drops and recreates the destination table; `Append` creates it
//! if absent and inserts without deduplication. All inserts run inside one
//! transaction, and the connection is released on every exit path.

use std::path::Path;

use polars::prelude::{AnyValue, DataFrame, DataType};
use rusqlite::Connection;
use rusqlite::types::Value as SqlValue;
use tracing::info;

use etl_core::config::DatabaseMode;
use etl_core::error::{EtlError, Result};
use etl_core::frame::SourceFrame;

/// Write the frame into `table` in the SQLite database at `db_path`.
pub fn write_database(
    frame: &SourceFrame,
    db_path: &Path,
    table: &str,
    mode: DatabaseMode,
) -> Result<()> {
    check_identifier(table)?;
    let mut conn = Connection::open(db_path)
        .map_err(|error| EtlError::Connection(format!("{}: {error}", db_path.display())))?;

    let columns = frame.column_names();
    if columns.is_empty() {
        return Err(EtlError::Schema("cannot load a table with no columns".to_string()));
    }

    match mode {
        DatabaseMode::Replace => {
            conn.execute(&format!("DROP TABLE IF EXISTS \"{table}\""), [])
                .map_err(|error| EtlError::Connection(error.to_string()))?;
            create_table(&conn, table, &frame.data)?;
        }
        DatabaseMode::Append => {
            if table_exists(&conn, table)? {
                let existing = existing_columns(&conn, table)?;
                let mut expected = columns.clone();
                expected.sort();
                let mut found = existing.clone();
                found.sort();
                if expected != found {
                    return Err(EtlError::Schema(format!(
                        "table '{table}' has columns [{}], frame has [{}]",
                        existing.join(", "),
                        columns.join(", ")
                    )));
                }
            } else {
                create_table(&conn, table, &frame.data)?;
            }
        }
    }

    insert_rows(&mut conn, table, &frame.data)?;
    info!(
        rows = frame.row_count(),
        table,
        database = %db_path.display(),
        mode = ?mode,
        "database load complete"
    );
    Ok(())
}

/// Destination identifiers are restricted to alphanumerics and underscores;
/// they are interpolated into DDL and cannot be bound as parameters.
fn check_identifier(name: &str) -> Result<()> {
    let valid = !name.is_empty()
        && name
            .chars()
            .all(|ch| ch.is_ascii_alphanumeric() || ch == '_');
    if valid {
        Ok(())
    } else {
        Err(EtlError::Value(format!("invalid table name '{name}'")))
    }
}

fn sqlite_type(dtype: &DataType) -> &'static str {
    match dtype {
        DataType::Int8
        | DataType::Int16
        | DataType::Int32
        | DataType::Int64
        | DataType::UInt8
        | DataType::UInt16
        | DataType::UInt32
        | DataType::UInt64
        | DataType::Boolean => "INTEGER",
        DataType::Float32 | DataType::Float64 => "REAL",
        _ => "TEXT",
    }
}

fn table_exists(conn: &Connection, table: &str) -> Result<bool> {
    let count: i64 = conn
        .query_row(
            "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table' AND name = ?1",
            [table],
            |row| row.get(0),
        )
        .map_err(|error| EtlError::Connection(error.to_string()))?;
    Ok(count > 0)
}

fn existing_columns(conn: &Connection, table: &str) -> Result<Vec<String>> {
    let mut statement = conn
        .prepare(&format!("PRAGMA table_info(\"{table}\")"))
        .map_err(|error| EtlError::Connection(error.to_string()))?;
    let rows = statement
        .query_map([], |row| row.get::<_, String>(1))
        .map_err(|error| EtlError::Connection(error.to_string()))?;
    let mut names = Vec::new();
    for name in rows {
        names.push(name.map_err(|error| EtlError::Connection(error.to_string()))?);
    }
    Ok(names)
}

fn create_table(conn: &Connection, table: &str, df: &DataFrame) -> Result<()> {
    let column_defs: Vec<String> = df
        .get_columns()
        .iter()
        .map(|column| format!("\"{}\" {}", column.name(), sqlite_type(column.dtype())))
        .collect();
    let ddl = format!("CREATE TABLE \"{table}\" ({})", column_defs.join(", "));
    conn.execute(&ddl, [])
        .map_err(|error| EtlError::Schema(format!("create table '{table}': {error}")))?;
    Ok(())
}

fn insert_rows(conn: &mut Connection, table: &str, df: &DataFrame) -> Result<()> {
    let columns = df.get_columns();
    let column_list: Vec<String> = columns
        .iter()
        .map(|column| format!("\"{}\"", column.name()))
        .collect();
    let placeholders: Vec<String> = (1..=columns.len()).map(|i| format!("?{i}")).collect();
    let sql = format!(
        "INSERT INTO \"{table}\" ({}) VALUES ({})",
        column_list.join(", "),
        placeholders.join(", ")
    );

    let tx = conn
        .transaction()
        .map_err(|error| EtlError::Connection(error.to_string()))?;
    {
        let mut statement = tx
            .prepare(&sql)
            .map_err(|error| EtlError::Connection(error.to_string()))?;
        for idx in 0..df.height() {
            let mut params: Vec<SqlValue> = Vec::with_capacity(columns.len());
            for column in columns {
                let value = column.get(idx).unwrap_or(AnyValue::Null);
                params.push(sql_value(&value, column.name(), column.dtype())?);
            }
            statement
                .execute(rusqlite::params_from_iter(params))
                .map_err(|error| EtlError::Schema(format!("insert into '{table}': {error}")))?;
        }
    }
    tx.commit()
        .map_err(|error| EtlError::Connection(error.to_string()))?;
    Ok(())
}

fn sql_value(value: &AnyValue<'_>, column: &str, dtype: &DataType) -> Result<SqlValue> {
    let converted = match value {
        AnyValue::Null => SqlValue::Null,
        AnyValue::Boolean(b) => SqlValue::Integer(i64::from(*b)),
        AnyValue::Int32(v) => SqlValue::Integer(i64::from(*v)),
        AnyValue::Int64(v) => SqlValue::Integer(*v),
        AnyValue::UInt32(v) => SqlValue::Integer(i64::from(*v)),
        AnyValue::UInt64(v) => SqlValue::Integer(i64::try_from(*v).map_err(|_| {
            EtlError::Schema(format!("value in '{column}' exceeds the integer range"))
        })?),
        AnyValue::Float32(v) => SqlValue::Real(f64::from(*v)),
        AnyValue::Float64(v) => SqlValue::Real(*v),
        AnyValue::String(s) => SqlValue::Text((*s).to_string()),
        AnyValue::StringOwned(s) => SqlValue::Text(s.to_string()),
        _ => {
            return Err(EtlError::Schema(format!(
                "column '{column}' of type {dtype} cannot be stored"
            )));
        }
    };
    Ok(converted)
}
