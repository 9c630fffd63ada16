//! File outputs: CSV, JSON, and Parquet.
//!
//! `Overwrite` replaces the target and is idempotent. `Append` is not
//! idempotent by design: CSV appends rows without a second header, JSON
//! re-reads the existing array and rewrites it with the new rows
//! concatenated, and Parquet writes a fresh numbered part file next to the
//! base file (a new partition). Parent directories are created as needed.

use std::fs::{File, OpenOptions};
use std::path::{Path, PathBuf};

use polars::prelude::{CsvWriter, JsonFormat, JsonWriter, ParquetWriter, SerWriter};
use tracing::info;

use etl_core::config::WriteMode;
use etl_core::error::{EtlError, Result};
use etl_core::frame::SourceFrame;

fn ensure_parent_dir(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        std::fs::create_dir_all(parent)?;
    }
    Ok(())
}

/// Serialize the frame as comma-delimited text with a header row.
pub fn write_csv(frame: &SourceFrame, path: &Path, mode: WriteMode) -> Result<()> {
    ensure_parent_dir(path)?;
    let mut data = frame.data.clone();
    let appending = mode == WriteMode::Append && path.exists();
    let file = if appending {
        OpenOptions::new().append(true).open(path)?
    } else {
        File::create(path)?
    };
    CsvWriter::new(file)
        .include_header(!appending)
        .finish(&mut data)?;
    info!(
        rows = frame.row_count(),
        output = %path.display(),
        append = appending,
        "csv load complete"
    );
    Ok(())
}

/// Serialize the frame as a JSON array of flat objects.
pub fn write_json(frame: &SourceFrame, path: &Path, mode: WriteMode) -> Result<()> {
    ensure_parent_dir(path)?;
    let mut data = frame.data.clone();
    if mode == WriteMode::Append && path.exists() {
        // Re-read the existing array and concatenate. Readers may order
        // columns differently than the writer did, so match by name.
        let existing = etl_extract::extract_from_json(path)?;
        let mut existing_names = existing.column_names();
        existing_names.sort();
        let mut new_names = frame.column_names();
        new_names.sort();
        if existing_names != new_names {
            return Err(EtlError::Schema(format!(
                "cannot append to {}: column sets differ",
                path.display()
            )));
        }
        let aligned = data.select(existing.column_names())?;
        let mut combined = existing.data;
        combined.vstack_mut(&aligned)?;
        data = combined;
    }
    let file = File::create(path)?;
    JsonWriter::new(file)
        .with_json_format(JsonFormat::Json)
        .finish(&mut data)?;
    info!(
        rows = frame.row_count(),
        output = %path.display(),
        "json load complete"
    );
    Ok(())
}

/// Serialize the frame as Parquet. In append mode, an existing base file is
/// left untouched and the rows land in the next free `*.part-NNNN.parquet`
/// sibling.
pub fn write_parquet(frame: &SourceFrame, path: &Path, mode: WriteMode) -> Result<()> {
    ensure_parent_dir(path)?;
    let target = if mode == WriteMode::Append && path.exists() {
        next_partition_path(path)?
    } else {
        path.to_path_buf()
    };
    let mut data = frame.data.clone();
    let file = File::create(&target)?;
    ParquetWriter::new(file).finish(&mut data)?;
    info!(
        rows = frame.row_count(),
        output = %target.display(),
        "parquet load complete"
    );
    Ok(())
}

fn next_partition_path(base: &Path) -> Result<PathBuf> {
    let stem = base
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("output");
    let dir = base.parent().unwrap_or_else(|| Path::new("."));
    for index in 1..10_000u32 {
        let candidate = dir.join(format!("{stem}.part-{index:04}.parquet"));
        if !candidate.exists() {
            return Ok(candidate);
        }
    }
    Err(EtlError::Value(format!(
        "no free partition slot next to {}",
        base.display()
    )))
}
