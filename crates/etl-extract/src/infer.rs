//! Column type inference and frame assembly.
//!
//! Extracted records arrive either as raw text cells (CSV) or as typed JSON
//! scalars. Both funnel into a `DataFrame` whose column dtypes are inferred:
//! a column where every non-null cell parses as an integer becomes `Int64`,
//! else `Float64` if everything parses numerically, else `String`. Empty CSV
//! cells and JSON nulls become nulls.

use std::collections::BTreeSet;

use polars::prelude::{Column, DataFrame, IntoColumn, NamedFrom, Series};

use etl_core::error::{EtlError, Result};
use etl_core::values::format_numeric;

/// A typed scalar from a JSON document.
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum JsonCell {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
}

/// Validate headers: at least one column, no duplicates.
pub(crate) fn check_headers(headers: &[String], source_id: &str) -> Result<()> {
    if headers.is_empty() {
        return Err(EtlError::parse(source_id, "input has no header row"));
    }
    let mut seen = BTreeSet::new();
    for header in headers {
        if !seen.insert(header.as_str()) {
            return Err(EtlError::parse(
                source_id,
                format!("duplicate column name '{header}'"),
            ));
        }
    }
    Ok(())
}

/// Build a frame from text cells laid out row-major. `None` cells are nulls.
pub(crate) fn frame_from_text_rows(
    headers: &[String],
    rows: &[Vec<Option<String>>],
    source_id: &str,
) -> Result<DataFrame> {
    check_headers(headers, source_id)?;
    let mut columns: Vec<Column> = Vec::with_capacity(headers.len());
    for (col_idx, header) in headers.iter().enumerate() {
        let cells: Vec<Option<&str>> = rows
            .iter()
            .map(|row| row.get(col_idx).and_then(Option::as_deref))
            .collect();
        columns.push(infer_text_column(header, &cells));
    }
    DataFrame::new(columns).map_err(EtlError::from)
}

fn infer_text_column(name: &str, cells: &[Option<&str>]) -> Column {
    let non_null: Vec<&str> = cells.iter().flatten().copied().collect();
    if !non_null.is_empty() && non_null.iter().all(|v| v.trim().parse::<i64>().is_ok()) {
        let values: Vec<Option<i64>> = cells
            .iter()
            .map(|cell| cell.and_then(|v| v.trim().parse::<i64>().ok()))
            .collect();
        return Series::new(name.into(), values).into_column();
    }
    if !non_null.is_empty() && non_null.iter().all(|v| v.trim().parse::<f64>().is_ok()) {
        let values: Vec<Option<f64>> = cells
            .iter()
            .map(|cell| cell.and_then(|v| v.trim().parse::<f64>().ok()))
            .collect();
        return Series::new(name.into(), values).into_column();
    }
    let values: Vec<Option<String>> = cells
        .iter()
        .map(|cell| cell.map(ToString::to_string))
        .collect();
    Series::new(name.into(), values).into_column()
}

/// Build a frame from typed JSON cells laid out column-major.
pub(crate) fn frame_from_json_columns(
    headers: &[String],
    columns: &[Vec<JsonCell>],
    source_id: &str,
) -> Result<DataFrame> {
    check_headers(headers, source_id)?;
    let mut out: Vec<Column> = Vec::with_capacity(headers.len());
    for (header, cells) in headers.iter().zip(columns) {
        out.push(infer_json_column(header, cells));
    }
    DataFrame::new(out).map_err(EtlError::from)
}

fn infer_json_column(name: &str, cells: &[JsonCell]) -> Column {
    let has_text = cells.iter().any(|c| matches!(c, JsonCell::Text(_)));
    let has_float = cells.iter().any(|c| matches!(c, JsonCell::Float(_)));
    let has_int = cells.iter().any(|c| matches!(c, JsonCell::Int(_)));
    let has_bool = cells.iter().any(|c| matches!(c, JsonCell::Bool(_)));

    if has_text || (has_bool && (has_int || has_float)) {
        let values: Vec<Option<String>> = cells.iter().map(json_cell_to_string).collect();
        return Series::new(name.into(), values).into_column();
    }
    if has_float {
        let values: Vec<Option<f64>> = cells
            .iter()
            .map(|cell| match cell {
                JsonCell::Int(v) => Some(*v as f64),
                JsonCell::Float(v) => Some(*v),
                _ => None,
            })
            .collect();
        return Series::new(name.into(), values).into_column();
    }
    if has_int {
        let values: Vec<Option<i64>> = cells
            .iter()
            .map(|cell| match cell {
                JsonCell::Int(v) => Some(*v),
                _ => None,
            })
            .collect();
        return Series::new(name.into(), values).into_column();
    }
    if has_bool {
        let values: Vec<Option<bool>> = cells
            .iter()
            .map(|cell| match cell {
                JsonCell::Bool(v) => Some(*v),
                _ => None,
            })
            .collect();
        return Series::new(name.into(), values).into_column();
    }
    // Entirely null column
    let values: Vec<Option<String>> = cells.iter().map(|_| None).collect();
    Series::new(name.into(), values).into_column()
}

fn json_cell_to_string(cell: &JsonCell) -> Option<String> {
    match cell {
        JsonCell::Null => None,
        JsonCell::Bool(v) => Some(v.to_string()),
        JsonCell::Int(v) => Some(v.to_string()),
        JsonCell::Float(v) => Some(format_numeric(*v)),
        JsonCell::Text(s) => Some(s.clone()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use polars::prelude::DataType;

    #[test]
    fn integer_column_inferred() {
        let headers = vec!["qty".to_string()];
        let rows = vec![
            vec![Some("1".to_string())],
            vec![None],
            vec![Some("3".to_string())],
        ];
        let df = frame_from_text_rows(&headers, &rows, "test").unwrap();
        assert_eq!(df.column("qty").unwrap().dtype(), &DataType::Int64);
        assert_eq!(df.column("qty").unwrap().null_count(), 1);
    }

    #[test]
    fn mixed_numeric_column_becomes_float() {
        let headers = vec!["price".to_string()];
        let rows = vec![
            vec![Some("1".to_string())],
            vec![Some("2.5".to_string())],
        ];
        let df = frame_from_text_rows(&headers, &rows, "test").unwrap();
        assert_eq!(df.column("price").unwrap().dtype(), &DataType::Float64);
    }

    #[test]
    fn non_numeric_column_stays_text() {
        let headers = vec!["region".to_string()];
        let rows = vec![
            vec![Some("North".to_string())],
            vec![Some("7".to_string())],
        ];
        let df = frame_from_text_rows(&headers, &rows, "test").unwrap();
        assert_eq!(df.column("region").unwrap().dtype(), &DataType::String);
    }

    #[test]
    fn duplicate_header_is_a_parse_error() {
        let headers = vec!["a".to_string(), "a".to_string()];
        let error = frame_from_text_rows(&headers, &[], "test").unwrap_err();
        assert!(matches!(error, EtlError::Parse { .. }));
    }

    #[test]
    fn json_ints_widen_to_float_when_mixed() {
        let headers = vec!["x".to_string()];
        let cells = vec![vec![JsonCell::Int(1), JsonCell::Float(2.5), JsonCell::Null]];
        let df = frame_from_json_columns(&headers, &cells, "test").unwrap();
        assert_eq!(df.column("x").unwrap().dtype(), &DataType::Float64);
    }
}
