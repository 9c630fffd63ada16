//! CSV extraction.

use std::path::Path;

use csv::ReaderBuilder;
use tracing::info;

use etl_core::error::{EtlError, Result};
use etl_core::frame::SourceFrame;

use crate::infer::frame_from_text_rows;

/// Read a comma-delimited file with a header row into a frame.
///
/// Empty cells become nulls; column types are inferred (see [`crate::infer`]).
/// A missing path is [`EtlError::NotFound`]; malformed content (ragged rows,
/// bad quoting, no header) is [`EtlError::Parse`].
pub fn extract_from_csv(path: &Path) -> Result<SourceFrame> {
    if !path.exists() {
        return Err(EtlError::not_found(path));
    }
    let source_id = path.display().to_string();

    let mut reader = ReaderBuilder::new()
        .has_headers(true)
        .from_path(path)
        .map_err(|error| EtlError::parse(source_id.as_str(), error.to_string()))?;
    let headers: Vec<String> = reader
        .headers()
        .map_err(|error| EtlError::parse(source_id.as_str(), error.to_string()))?
        .iter()
        .map(|h| h.trim().to_string())
        .collect();

    let mut rows: Vec<Vec<Option<String>>> = Vec::new();
    for record in reader.records() {
        let record = record.map_err(|error| EtlError::parse(source_id.as_str(), error.to_string()))?;
        let row: Vec<Option<String>> = record
            .iter()
            .map(|cell| {
                let trimmed = cell.trim();
                if trimmed.is_empty() {
                    None
                } else {
                    Some(trimmed.to_string())
                }
            })
            .collect();
        rows.push(row);
    }

    let data = frame_from_text_rows(&headers, &rows, &source_id)?;
    info!(
        source = %source_id,
        rows = data.height(),
        columns = data.width(),
        "csv extraction complete"
    );
    Ok(SourceFrame::new(source_id, data))
}
