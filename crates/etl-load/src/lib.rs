//! Load stage: write a table to CSV/JSON/Parquet or a SQLite table.

pub mod database;
pub mod file;

pub use database::write_database;
pub use file::{write_csv, write_json, write_parquet};
