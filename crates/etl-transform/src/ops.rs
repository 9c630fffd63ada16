//! Table-to-table cleaning and reshaping operations.
//!
//! Every operation takes a `DataFrame` and returns a new one; inputs are
//! never mutated. Column references that do not resolve fail with
//! [`EtlError::Key`]; arguments that do not fit the data fail with
//! [`EtlError::Value`] or [`EtlError::Type`].

use std::collections::{BTreeMap, BTreeSet};

use polars::prelude::{
    AnyValue, BooleanChunked, Column, DataFrame, DataType, IntoLazy, NamedFrom,
    NewChunkedArray, Series, col,
};
use tracing::info;

use etl_core::config::{
    AggFn, Aggregation, CoercionPolicy, ColumnType, CompareOp, Condition, MissingValueStrategy,
    NormalizeMethod, ScalarValue,
};
use etl_core::error::{EtlError, Result};
use etl_core::values::{any_to_string, parse_i64};

/// Cell separator for composite dedupe keys; `\x00` marks a null cell so two
/// nulls compare equal, matching exact-duplicate semantics.
const KEY_SEPARATOR: char = '\x1f';
const NULL_MARKER: &str = "\x00";

fn require_columns(df: &DataFrame, columns: &[String]) -> Result<()> {
    for column in columns {
        if df.column(column).is_err() {
            return Err(EtlError::unknown_column(column.as_str()));
        }
    }
    Ok(())
}

fn all_column_names(df: &DataFrame) -> Vec<String> {
    df.get_column_names()
        .iter()
        .map(|name| name.to_string())
        .collect()
}

fn is_numeric_dtype(dtype: &DataType) -> bool {
    matches!(
        dtype,
        DataType::Int8
            | DataType::Int16
            | DataType::Int32
            | DataType::Int64
            | DataType::UInt8
            | DataType::UInt16
            | DataType::UInt32
            | DataType::UInt64
            | DataType::Float32
            | DataType::Float64
    )
}

/// Drop rows that are exact (or subset-key) duplicates, keeping the first
/// occurrence in original row order. The removed count is reported via the
/// log stream.
pub fn remove_duplicates(df: &DataFrame, subset: Option<&[String]>) -> Result<DataFrame> {
    let key_columns: Vec<String> = match subset {
        Some(columns) => {
            require_columns(df, columns)?;
            columns.to_vec()
        }
        None => all_column_names(df),
    };
    let keyed: Vec<&Column> = key_columns
        .iter()
        .map(|name| df.column(name))
        .collect::<std::result::Result<_, _>>()?;

    let mut seen = BTreeSet::new();
    let mut keep = Vec::with_capacity(df.height());
    for idx in 0..df.height() {
        let mut composite = String::new();
        for (pos, column) in keyed.iter().enumerate() {
            if pos > 0 {
                composite.push(KEY_SEPARATOR);
            }
            let value = column.get(idx).unwrap_or(AnyValue::Null);
            if value.is_null() {
                composite.push_str(NULL_MARKER);
            } else {
                composite.push_str(&any_to_string(&value));
            }
        }
        keep.push(seen.insert(composite));
    }

    let removed = keep.iter().filter(|kept| !**kept).count();
    info!(removed, rows = df.height(), "duplicates removed");
    let mask = BooleanChunked::from_slice("dedupe_keep".into(), &keep);
    Ok(df.filter(&mask)?)
}

/// Handle nulls in the targeted columns (all columns when `columns` is
/// `None`) according to the configured strategy.
pub fn handle_missing_values(
    df: &DataFrame,
    strategy: MissingValueStrategy,
    columns: Option<&[String]>,
    fill: Option<&ScalarValue>,
) -> Result<DataFrame> {
    let targets: Vec<String> = match columns {
        Some(columns) => {
            require_columns(df, columns)?;
            columns.to_vec()
        }
        None => all_column_names(df),
    };
    match strategy {
        MissingValueStrategy::Drop => drop_null_rows(df, &targets),
        MissingValueStrategy::Fill => {
            let value = fill.ok_or_else(|| {
                EtlError::Value("fill strategy requires a fill_value".to_string())
            })?;
            fill_constant(df, &targets, value)
        }
        MissingValueStrategy::Ffill => fill_directional(df, &targets, false),
        MissingValueStrategy::Bfill => fill_directional(df, &targets, true),
    }
}

fn drop_null_rows(df: &DataFrame, targets: &[String]) -> Result<DataFrame> {
    let mut keep = vec![true; df.height()];
    for name in targets {
        let series = df.column(name)?.as_materialized_series();
        for (idx, valid) in series.is_not_null().into_iter().enumerate() {
            if !valid.unwrap_or(false) {
                keep[idx] = false;
            }
        }
    }
    let dropped = keep.iter().filter(|kept| !**kept).count();
    info!(dropped, rows = df.height(), "rows with nulls dropped");
    let mask = BooleanChunked::from_slice("null_keep".into(), &keep);
    Ok(df.filter(&mask)?)
}

fn fill_constant(df: &DataFrame, targets: &[String], value: &ScalarValue) -> Result<DataFrame> {
    let mut out = df.clone();
    for name in targets {
        let series = df.column(name)?.as_materialized_series().clone();
        if series.null_count() == 0 {
            continue;
        }
        let filled = match series.dtype() {
            DataType::Int64 => {
                let constant = scalar_as_i64(value).ok_or_else(|| {
                    EtlError::Value(format!(
                        "fill value '{}' cannot be applied to integer column '{name}'",
                        value.render()
                    ))
                })?;
                let values: Vec<Option<i64>> = series
                    .i64()?
                    .into_iter()
                    .map(|cell| cell.or(Some(constant)))
                    .collect();
                Series::new(name.as_str().into(), values)
            }
            DataType::Float64 => {
                let constant = value.as_f64().ok_or_else(|| {
                    EtlError::Value(format!(
                        "fill value '{}' cannot be applied to numeric column '{name}'",
                        value.render()
                    ))
                })?;
                let values: Vec<Option<f64>> = series
                    .f64()?
                    .into_iter()
                    .map(|cell| cell.or(Some(constant)))
                    .collect();
                Series::new(name.as_str().into(), values)
            }
            DataType::String => {
                let constant = value.render();
                let values: Vec<Option<String>> = series
                    .str()?
                    .into_iter()
                    .map(|cell| {
                        cell.map(ToString::to_string).or_else(|| Some(constant.clone()))
                    })
                    .collect();
                Series::new(name.as_str().into(), values)
            }
            DataType::Boolean => {
                let constant = scalar_as_bool(value).ok_or_else(|| {
                    EtlError::Value(format!(
                        "fill value '{}' cannot be applied to boolean column '{name}'",
                        value.render()
                    ))
                })?;
                let values: Vec<Option<bool>> = series
                    .bool()?
                    .into_iter()
                    .map(|cell| cell.or(Some(constant)))
                    .collect();
                Series::new(name.as_str().into(), values)
            }
            other => {
                return Err(EtlError::Value(format!(
                    "fill is not supported for column '{name}' of type {other}"
                )));
            }
        };
        out.with_column(filled)?;
    }
    Ok(out)
}

fn fill_directional(df: &DataFrame, targets: &[String], backward: bool) -> Result<DataFrame> {
    let mut out = df.clone();
    for name in targets {
        let series = df.column(name)?.as_materialized_series().clone();
        if series.null_count() == 0 {
            continue;
        }
        let filled = match series.dtype() {
            DataType::Int64 => {
                let values = propagate(series.i64()?.into_iter().collect(), backward);
                Series::new(name.as_str().into(), values)
            }
            DataType::Float64 => {
                let values = propagate(series.f64()?.into_iter().collect(), backward);
                Series::new(name.as_str().into(), values)
            }
            DataType::Boolean => {
                let values = propagate(series.bool()?.into_iter().collect(), backward);
                Series::new(name.as_str().into(), values)
            }
            DataType::String => {
                let cells: Vec<Option<String>> = series
                    .str()?
                    .into_iter()
                    .map(|cell| cell.map(ToString::to_string))
                    .collect();
                Series::new(name.as_str().into(), propagate(cells, backward))
            }
            other => {
                return Err(EtlError::Value(format!(
                    "directional fill is not supported for column '{name}' of type {other}"
                )));
            }
        };
        out.with_column(filled)?;
    }
    Ok(out)
}

/// Carry the nearest non-null value forward (or backward). A null with no
/// donor on its side stays null; no synthetic value is invented.
fn propagate<T: Clone>(values: Vec<Option<T>>, backward: bool) -> Vec<Option<T>> {
    let mut out = values;
    let mut carried: Option<T> = None;
    if backward {
        for cell in out.iter_mut().rev() {
            match cell {
                Some(value) => carried = Some(value.clone()),
                None => *cell = carried.clone(),
            }
        }
    } else {
        for cell in out.iter_mut() {
            match cell {
                Some(value) => carried = Some(value.clone()),
                None => *cell = carried.clone(),
            }
        }
    }
    out
}

fn scalar_as_i64(value: &ScalarValue) -> Option<i64> {
    match value {
        ScalarValue::Int(v) => Some(*v),
        ScalarValue::Float(v) if v.fract() == 0.0 => Some(*v as i64),
        ScalarValue::Float(_) | ScalarValue::Bool(_) => None,
        ScalarValue::Text(s) => parse_i64(s),
    }
}

fn scalar_as_bool(value: &ScalarValue) -> Option<bool> {
    match value {
        ScalarValue::Bool(v) => Some(*v),
        ScalarValue::Text(s) => match s.trim().to_ascii_lowercase().as_str() {
            "true" => Some(true),
            "false" => Some(false),
            _ => None,
        },
        _ => None,
    }
}

/// Scale numeric columns in place of their originals. Min-max maps each
/// column onto 0..1; z-score centers on the mean and divides by the sample
/// standard deviation. Columns with no spread are left unchanged, and nulls
/// stay null.
pub fn normalize_columns(
    df: &DataFrame,
    columns: &[String],
    method: NormalizeMethod,
) -> Result<DataFrame> {
    require_columns(df, columns)?;
    let mut out = df.clone();
    for name in columns {
        let series = df.column(name)?.as_materialized_series();
        if !is_numeric_dtype(series.dtype()) {
            return Err(EtlError::Value(format!(
                "cannot normalize non-numeric column '{name}' ({})",
                series.dtype()
            )));
        }
        let as_float = series.cast(&DataType::Float64)?;
        let values: Vec<Option<f64>> = as_float.f64()?.into_iter().collect();
        let present: Vec<f64> = values.iter().flatten().copied().collect();
        if present.is_empty() {
            continue;
        }
        let scaled: Vec<Option<f64>> = match method {
            NormalizeMethod::MinMax => {
                let min = present.iter().copied().fold(f64::INFINITY, f64::min);
                let max = present.iter().copied().fold(f64::NEG_INFINITY, f64::max);
                let span = max - min;
                if span == 0.0 {
                    continue;
                }
                values
                    .iter()
                    .map(|cell| cell.map(|v| (v - min) / span))
                    .collect()
            }
            NormalizeMethod::ZScore => {
                if present.len() < 2 {
                    continue;
                }
                let count = present.len() as f64;
                let mean = present.iter().sum::<f64>() / count;
                let variance = present
                    .iter()
                    .map(|v| (v - mean).powi(2))
                    .sum::<f64>()
                    / (count - 1.0);
                let std = variance.sqrt();
                if std == 0.0 {
                    continue;
                }
                values
                    .iter()
                    .map(|cell| cell.map(|v| (v - mean) / std))
                    .collect()
            }
        };
        out.with_column(Series::new(name.as_str().into(), scaled))?;
    }
    Ok(out)
}

/// Keep rows satisfying every condition. A null cell never satisfies a
/// condition, including `ne`.
pub fn filter_rows(df: &DataFrame, conditions: &[Condition]) -> Result<DataFrame> {
    let mut keep = vec![true; df.height()];
    for condition in conditions {
        let column = df
            .column(&condition.column)
            .map_err(|_| EtlError::unknown_column(condition.column.as_str()))?;
        let series = column.as_materialized_series();
        let numeric_column = is_numeric_dtype(series.dtype());

        match condition.op {
            CompareOp::Gt | CompareOp::Ge | CompareOp::Lt | CompareOp::Le => {
                if !numeric_column {
                    return Err(EtlError::Value(format!(
                        "ordering comparison requires a numeric column, '{}' is {}",
                        condition.column,
                        series.dtype()
                    )));
                }
                let threshold = condition.value.as_f64().ok_or_else(|| {
                    EtlError::Value(format!(
                        "comparison value '{}' is not numeric",
                        condition.value.render()
                    ))
                })?;
                let as_float = series.cast(&DataType::Float64)?;
                for (idx, cell) in as_float.f64()?.into_iter().enumerate() {
                    let satisfied = cell.is_some_and(|v| match condition.op {
                        CompareOp::Gt => v > threshold,
                        CompareOp::Ge => v >= threshold,
                        CompareOp::Lt => v < threshold,
                        CompareOp::Le => v <= threshold,
                        _ => unreachable!(),
                    });
                    if !satisfied {
                        keep[idx] = false;
                    }
                }
            }
            CompareOp::Eq | CompareOp::Ne => {
                let numeric_value = condition.value.as_f64().filter(|_| numeric_column);
                if let Some(threshold) = numeric_value {
                    let as_float = series.cast(&DataType::Float64)?;
                    for (idx, cell) in as_float.f64()?.into_iter().enumerate() {
                        let satisfied = cell.is_some_and(|v| {
                            if condition.op == CompareOp::Eq {
                                v == threshold
                            } else {
                                v != threshold
                            }
                        });
                        if !satisfied {
                            keep[idx] = false;
                        }
                    }
                } else {
                    let expected = condition.value.render();
                    for idx in 0..df.height() {
                        let value = series.get(idx).unwrap_or(AnyValue::Null);
                        let satisfied = if value.is_null() {
                            false
                        } else {
                            let rendered = any_to_string(&value);
                            if condition.op == CompareOp::Eq {
                                rendered == expected
                            } else {
                                rendered != expected
                            }
                        };
                        if !satisfied {
                            keep[idx] = false;
                        }
                    }
                }
            }
            CompareOp::Contains => {
                let ScalarValue::Text(needle) = &condition.value else {
                    return Err(EtlError::Value(format!(
                        "contains requires a text value, got '{}'",
                        condition.value.render()
                    )));
                };
                for idx in 0..df.height() {
                    let value = series.get(idx).unwrap_or(AnyValue::Null);
                    let satisfied =
                        !value.is_null() && any_to_string(&value).contains(needle.as_str());
                    if !satisfied {
                        keep[idx] = false;
                    }
                }
            }
        }
    }
    let kept = keep.iter().filter(|k| **k).count();
    info!(kept, rows = df.height(), "filter applied");
    let mask = BooleanChunked::from_slice("filter_keep".into(), &keep);
    Ok(df.filter(&mask)?)
}

/// Group by one or more columns and apply named aggregations, producing one
/// row per group. Groups are ordered by first appearance in the input.
pub fn aggregate(
    df: &DataFrame,
    group_by: &[String],
    aggregations: &[Aggregation],
) -> Result<DataFrame> {
    if group_by.is_empty() {
        return Err(EtlError::Value(
            "aggregation requires at least one group_by column".to_string(),
        ));
    }
    require_columns(df, group_by)?;
    for aggregation in aggregations {
        let column = df
            .column(&aggregation.column)
            .map_err(|_| EtlError::unknown_column(aggregation.column.as_str()))?;
        if matches!(aggregation.agg, AggFn::Sum | AggFn::Mean)
            && !is_numeric_dtype(column.dtype())
        {
            return Err(EtlError::Value(format!(
                "{} requires a numeric column, '{}' is {}",
                aggregation.agg.name(),
                aggregation.column,
                column.dtype()
            )));
        }
    }

    let group_exprs: Vec<_> = group_by.iter().map(|name| col(name.as_str())).collect();
    let agg_exprs: Vec<_> = aggregations
        .iter()
        .map(|aggregation| {
            let base = col(aggregation.column.as_str());
            let expr = match aggregation.agg {
                AggFn::Sum => base.sum(),
                AggFn::Mean => base.mean(),
                AggFn::Count => base.count(),
                AggFn::Min => base.min(),
                AggFn::Max => base.max(),
            };
            expr.alias(aggregation.output_name())
        })
        .collect();

    let out = df
        .clone()
        .lazy()
        .group_by_stable(group_exprs)
        .agg(agg_exprs)
        .collect()?;
    info!(groups = out.height(), rows = df.height(), "aggregation complete");
    Ok(out)
}

/// Coerce columns to declared types. With [`CoercionPolicy::Fail`] a single
/// non-coercible value fails the whole operation; with
/// [`CoercionPolicy::Null`] it becomes null. Fractional values truncate when
/// converting to int.
pub fn convert_types(
    df: &DataFrame,
    mapping: &BTreeMap<String, ColumnType>,
    policy: CoercionPolicy,
) -> Result<DataFrame> {
    let mut out = df.clone();
    for (name, target) in mapping {
        let series = df
            .column(name)
            .map_err(|_| EtlError::unknown_column(name.as_str()))?
            .as_materialized_series()
            .clone();
        let converted = match target {
            ColumnType::Int => cast_checked(&series, name, DataType::Int64, *target, policy)?,
            ColumnType::Float => cast_checked(&series, name, DataType::Float64, *target, policy)?,
            ColumnType::String => cast_checked(&series, name, DataType::String, *target, policy)?,
            ColumnType::Bool => cast_bool(&series, name, policy)?,
        };
        out.with_column(converted)?;
    }
    Ok(out)
}

fn cast_checked(
    series: &Series,
    name: &str,
    dtype: DataType,
    target: ColumnType,
    policy: CoercionPolicy,
) -> Result<Series> {
    let casted = series.cast(&dtype)?;
    if policy == CoercionPolicy::Fail && casted.null_count() > series.null_count() {
        let offending = first_new_null(series, &casted)
            .map(|value| any_to_string(&value))
            .unwrap_or_default();
        return Err(EtlError::Type {
            column: name.to_string(),
            target: target.name().to_string(),
            value: offending,
        });
    }
    Ok(casted)
}

fn first_new_null<'a>(original: &'a Series, casted: &Series) -> Option<AnyValue<'a>> {
    for idx in 0..original.len() {
        let before = original.get(idx).unwrap_or(AnyValue::Null);
        let after = casted.get(idx).unwrap_or(AnyValue::Null);
        if !before.is_null() && after.is_null() {
            return Some(before);
        }
    }
    None
}

fn cast_bool(series: &Series, name: &str, policy: CoercionPolicy) -> Result<Series> {
    let mut values: Vec<Option<bool>> = Vec::with_capacity(series.len());
    for idx in 0..series.len() {
        let value = series.get(idx).unwrap_or(AnyValue::Null);
        let parsed = match &value {
            AnyValue::Null => Some(None),
            AnyValue::Boolean(b) => Some(Some(*b)),
            _ => {
                let rendered = any_to_string(&value);
                match rendered.trim().to_ascii_lowercase().as_str() {
                    "true" | "1" => Some(Some(true)),
                    "false" | "0" => Some(Some(false)),
                    _ => None,
                }
            }
        };
        match parsed {
            Some(cell) => values.push(cell),
            None => match policy {
                CoercionPolicy::Fail => {
                    return Err(EtlError::Type {
                        column: name.to_string(),
                        target: ColumnType::Bool.name().to_string(),
                        value: any_to_string(&value),
                    });
                }
                CoercionPolicy::Null => values.push(None),
            },
        }
    }
    Ok(Series::new(name.into(), values))
}
