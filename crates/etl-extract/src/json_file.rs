//! JSON extraction.
//!
//! The expected shape is an array of flat objects (one object per row); a
//! single top-level object is treated as a one-row table. The column set is
//! the union of keys across objects, in order of first appearance; a key
//! absent from an object yields a null cell. Nested arrays or objects are
//! rejected — this stage deals in flat tabular records only.

use std::collections::BTreeSet;
use std::path::Path;

use serde_json::Value;
use tracing::info;

use etl_core::error::{EtlError, Result};
use etl_core::frame::SourceFrame;

use crate::infer::{JsonCell, frame_from_json_columns};

/// Read a JSON file into a frame.
pub fn extract_from_json(path: &Path) -> Result<SourceFrame> {
    if !path.exists() {
        return Err(EtlError::not_found(path));
    }
    let source_id = path.display().to_string();
    let text = std::fs::read_to_string(path)?;
    let value: Value = serde_json::from_str(&text)
        .map_err(|error| EtlError::parse(source_id.as_str(), error.to_string()))?;
    let frame = frame_from_json_value(&value, &source_id)?;
    info!(
        source = %source_id,
        rows = frame.row_count(),
        columns = frame.column_count(),
        "json extraction complete"
    );
    Ok(frame)
}

/// Map a parsed JSON document to a frame. Shared with API extraction.
pub(crate) fn frame_from_json_value(value: &Value, source_id: &str) -> Result<SourceFrame> {
    let objects: Vec<&serde_json::Map<String, Value>> = match value {
        Value::Array(items) => items
            .iter()
            .map(|item| {
                item.as_object().ok_or_else(|| {
                    EtlError::parse(source_id, "expected an array of flat objects")
                })
            })
            .collect::<Result<_>>()?,
        Value::Object(map) => vec![map],
        _ => {
            return Err(EtlError::parse(
                source_id,
                "expected a JSON array or object at the top level",
            ));
        }
    };

    // Union of keys in order of first appearance.
    let mut headers: Vec<String> = Vec::new();
    let mut seen: BTreeSet<&str> = BTreeSet::new();
    for object in &objects {
        for key in object.keys() {
            if seen.insert(key.as_str()) {
                headers.push(key.clone());
            }
        }
    }

    let mut columns: Vec<Vec<JsonCell>> = vec![Vec::with_capacity(objects.len()); headers.len()];
    for object in &objects {
        for (header, column) in headers.iter().zip(columns.iter_mut()) {
            let cell = match object.get(header) {
                None | Some(Value::Null) => JsonCell::Null,
                Some(Value::Bool(b)) => JsonCell::Bool(*b),
                Some(Value::Number(n)) => {
                    if let Some(v) = n.as_i64() {
                        JsonCell::Int(v)
                    } else if let Some(v) = n.as_f64() {
                        JsonCell::Float(v)
                    } else {
                        return Err(EtlError::parse(
                            source_id,
                            format!("unrepresentable number in field '{header}'"),
                        ));
                    }
                }
                Some(Value::String(s)) => JsonCell::Text(s.clone()),
                Some(Value::Array(_) | Value::Object(_)) => {
                    return Err(EtlError::parse(
                        source_id,
                        format!("nested value in field '{header}'; rows must be flat"),
                    ));
                }
            };
            column.push(cell);
        }
    }

    let data = frame_from_json_columns(&headers, &columns, source_id)?;
    Ok(SourceFrame::new(source_id, data))
}
