//! Dimension table derivation.
//!
//! Each dimension holds the distinct natural-key combinations from the
//! source table, in order of first appearance, with a sequential integer
//! surrogate key starting at 1.

use chrono::{Datelike, NaiveDate};
use polars::prelude::{Column, DataFrame, IntoColumn, NamedFrom, Series};
use tracing::debug;

use etl_core::error::{EtlError, Result};
use etl_transform::remove_duplicates;

use crate::columns;

/// A derived dimension table.
#[derive(Debug, Clone)]
pub struct Dimension {
    /// Dimension name ("customer", "product", ...).
    pub name: &'static str,
    /// Surrogate key column name (`<name>_key`).
    pub key_column: String,
    /// Natural-key columns used to join back to the source.
    pub natural_keys: Vec<String>,
    /// The dimension rows: surrogate key, natural keys, then attributes.
    pub data: DataFrame,
}

impl Dimension {
    pub fn row_count(&self) -> usize {
        self.data.height()
    }
}

fn require_columns(df: &DataFrame, names: &[&str]) -> Result<()> {
    for name in names {
        if df.column(name).is_err() {
            return Err(EtlError::unknown_column(*name));
        }
    }
    Ok(())
}

/// Distinct natural-key combinations with attributes, keyed 1..=n in order
/// of first appearance.
pub fn build_dimension(
    source: &DataFrame,
    name: &'static str,
    natural_keys: &[&str],
    attributes: &[&str],
) -> Result<Dimension> {
    let selected: Vec<&str> = natural_keys.iter().chain(attributes).copied().collect();
    require_columns(source, &selected)?;

    let projected = source.select(selected.iter().map(|s| (*s).to_string()))?;
    let key_columns: Vec<String> = natural_keys.iter().map(|s| (*s).to_string()).collect();
    let distinct = remove_duplicates(&projected, Some(&key_columns))?;

    let data = with_surrogate_key(&distinct, &format!("{name}_key"))?;
    debug!(dimension = name, rows = data.height(), "dimension built");
    Ok(Dimension {
        name,
        key_column: format!("{name}_key"),
        natural_keys: key_columns,
        data,
    })
}

/// Date dimension: distinct dates with year/month/day/quarter attributes.
///
/// Dates must be ISO `YYYY-MM-DD` strings; a null or unparseable date is a
/// `Value` error since a date that cannot be keyed would break the fact join.
pub fn build_date_dimension(source: &DataFrame) -> Result<Dimension> {
    require_columns(source, &[columns::DATE])?;
    let projected = source.select([columns::DATE.to_string()])?;
    let distinct = remove_duplicates(&projected, None)?;

    let dates = distinct.column(columns::DATE)?.as_materialized_series().clone();
    let mut years: Vec<i64> = Vec::with_capacity(dates.len());
    let mut months: Vec<i64> = Vec::with_capacity(dates.len());
    let mut days: Vec<i64> = Vec::with_capacity(dates.len());
    let mut quarters: Vec<i64> = Vec::with_capacity(dates.len());
    for cell in dates.str()?.into_iter() {
        let Some(text) = cell else {
            return Err(EtlError::Value("null date in source table".to_string()));
        };
        let parsed = NaiveDate::parse_from_str(text.trim(), "%Y-%m-%d").map_err(|_| {
            EtlError::Value(format!("invalid date '{text}', expected YYYY-MM-DD"))
        })?;
        years.push(i64::from(parsed.year()));
        months.push(i64::from(parsed.month()));
        days.push(i64::from(parsed.day()));
        quarters.push(i64::from((parsed.month() - 1) / 3 + 1));
    }

    let mut enriched = distinct;
    enriched.with_column(Series::new("year".into(), years))?;
    enriched.with_column(Series::new("month".into(), months))?;
    enriched.with_column(Series::new("day".into(), days))?;
    enriched.with_column(Series::new("quarter".into(), quarters))?;

    let data = with_surrogate_key(&enriched, "date_key")?;
    debug!(dimension = "date", rows = data.height(), "dimension built");
    Ok(Dimension {
        name: "date",
        key_column: "date_key".to_string(),
        natural_keys: vec![columns::DATE.to_string()],
        data,
    })
}

fn with_surrogate_key(df: &DataFrame, key_name: &str) -> Result<DataFrame> {
    let keys: Vec<i64> = (1..=df.height() as i64).collect();
    let mut cols: Vec<Column> = vec![Series::new(key_name.into(), keys).into_column()];
    cols.extend(df.get_columns().iter().cloned());
    DataFrame::new(cols).map_err(EtlError::from)
}
