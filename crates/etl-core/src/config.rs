//! Pipeline configuration.
//!
//! A run is driven by one YAML document with `extract`, `transform`, and
//! `load` sections. The document is read once at startup and is immutable
//! for the duration of the run; every component receives it (or its slice)
//! by parameter rather than through ambient state.
//!
//! Unknown keys are ignored. Missing sections fall back to the documented
//! defaults: CSV extraction, no transform steps, CSV load in overwrite mode.
//! Strategy values are closed enums, so an unrecognized spelling fails at
//! parse time rather than mid-run.

use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{EtlError, Result};
use crate::values::format_numeric;

/// Top-level configuration for one pipeline run.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PipelineConfig {
    #[serde(default)]
    pub extract: ExtractConfig,
    #[serde(default)]
    pub transform: TransformConfig,
    #[serde(default)]
    pub load: LoadConfig,
}

impl PipelineConfig {
    /// Load configuration from a YAML file.
    pub fn from_yaml_file(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(EtlError::not_found(path));
        }
        let text = std::fs::read_to_string(path)?;
        Self::from_yaml_str(&text, &path.display().to_string())
    }

    /// Parse configuration from YAML text. `source_id` labels parse errors.
    pub fn from_yaml_str(text: &str, source_id: &str) -> Result<Self> {
        serde_yaml::from_str(text).map_err(|error| EtlError::parse(source_id, error.to_string()))
    }
}

/// Where raw records come from.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ExtractConfig {
    /// Input kind; the `run` command's source path is interpreted against it.
    #[serde(default)]
    pub source: SourceKind,
    /// Endpoint for [`SourceKind::Api`]; files ignore it.
    #[serde(default)]
    pub url: Option<String>,
    /// Query parameters for API extraction.
    #[serde(default)]
    pub params: BTreeMap<String, String>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceKind {
    #[default]
    Csv,
    Json,
    Api,
}

/// The ordered transform chain.
///
/// Order is significant: deduplicating before null-handling gives a
/// different result than the reverse, so the configuration carries an
/// explicit sequence rather than a map of stage names.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TransformConfig {
    #[serde(default)]
    pub steps: Vec<StepConfig>,
}

/// One transform step, dispatched on the `op` tag.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum StepConfig {
    /// Drop exact (or subset-key) duplicate rows, keeping first occurrence.
    RemoveDuplicates {
        #[serde(default)]
        subset: Option<Vec<String>>,
    },
    /// Handle nulls in the targeted columns (all columns when unset).
    MissingValues {
        strategy: MissingValueStrategy,
        #[serde(default)]
        columns: Option<Vec<String>>,
        /// Constant for [`MissingValueStrategy::Fill`].
        #[serde(default)]
        fill_value: Option<ScalarValue>,
    },
    /// Scale numeric columns.
    Normalize {
        columns: Vec<String>,
        #[serde(default)]
        method: NormalizeMethod,
    },
    /// Keep rows satisfying every condition.
    Filter { conditions: Vec<Condition> },
    /// Group and aggregate; produces one row per group.
    Aggregate {
        group_by: Vec<String>,
        aggregations: Vec<Aggregation>,
    },
    /// Coerce columns to declared types.
    ConvertTypes {
        mapping: BTreeMap<String, ColumnType>,
        #[serde(default)]
        on_error: CoercionPolicy,
    },
}

impl StepConfig {
    /// Stable name used in logs and step listings.
    pub fn op_name(&self) -> &'static str {
        match self {
            Self::RemoveDuplicates { .. } => "remove_duplicates",
            Self::MissingValues { .. } => "missing_values",
            Self::Normalize { .. } => "normalize",
            Self::Filter { .. } => "filter",
            Self::Aggregate { .. } => "aggregate",
            Self::ConvertTypes { .. } => "convert_types",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MissingValueStrategy {
    /// Remove rows containing a null in a targeted column.
    Drop,
    /// Replace nulls with a supplied constant.
    Fill,
    /// Propagate the nearest preceding non-null value, per column.
    Ffill,
    /// Propagate the nearest following non-null value, per column.
    Bfill,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NormalizeMethod {
    /// Scale each column to the 0..1 range. Constant columns are left
    /// unchanged rather than collapsing to a synthetic value.
    #[default]
    MinMax,
    /// Center on the mean and divide by the sample standard deviation
    /// (ddof = 1). Zero-spread columns are left unchanged.
    ZScore,
}

/// A scalar literal from the configuration: fill constants and filter
/// comparison values.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ScalarValue {
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
}

impl ScalarValue {
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Bool(_) => None,
            Self::Int(v) => Some(*v as f64),
            Self::Float(v) => Some(*v),
            Self::Text(s) => crate::values::parse_f64(s),
        }
    }

    /// Display form used for string comparison and error messages.
    pub fn render(&self) -> String {
        match self {
            Self::Bool(b) => b.to_string(),
            Self::Int(v) => v.to_string(),
            Self::Float(v) => format_numeric(*v),
            Self::Text(s) => s.clone(),
        }
    }
}

/// One filter condition; a step's conditions are ANDed together.
/// Null cells never satisfy a condition.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Condition {
    pub column: String,
    pub op: CompareOp,
    pub value: ScalarValue,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CompareOp {
    Eq,
    Ne,
    Gt,
    Ge,
    Lt,
    Le,
    /// Substring match on the cell's string form.
    Contains,
}

/// One named aggregation over a measure column.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Aggregation {
    pub column: String,
    pub agg: AggFn,
    /// Output column name; defaults to `<column>_<agg>`.
    #[serde(default)]
    pub alias: Option<String>,
}

impl Aggregation {
    pub fn output_name(&self) -> String {
        self.alias
            .clone()
            .unwrap_or_else(|| format!("{}_{}", self.column, self.agg.name()))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AggFn {
    Sum,
    Mean,
    Count,
    Min,
    Max,
}

impl AggFn {
    pub fn name(self) -> &'static str {
        match self {
            Self::Sum => "sum",
            Self::Mean => "mean",
            Self::Count => "count",
            Self::Min => "min",
            Self::Max => "max",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ColumnType {
    Int,
    Float,
    String,
    Bool,
}

impl ColumnType {
    pub fn name(self) -> &'static str {
        match self {
            Self::Int => "int",
            Self::Float => "float",
            Self::String => "string",
            Self::Bool => "bool",
        }
    }
}

/// What to do with a value that cannot be coerced during type conversion.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CoercionPolicy {
    /// Fail the whole operation.
    #[default]
    Fail,
    /// Replace the offending value with null and continue.
    Null,
}

/// Where the result goes.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LoadConfig {
    #[serde(default)]
    pub format: OutputFormat,
    #[serde(default)]
    pub mode: WriteMode,
    /// Required when `format` is `database`.
    #[serde(default)]
    pub database: Option<DatabaseConfig>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Csv,
    Json,
    Parquet,
    Database,
}

/// File write disposition. Re-running with `Overwrite` is idempotent;
/// `Append` is not, by design (duplicate-on-append keeps audit trails).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WriteMode {
    #[default]
    Overwrite,
    Append,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// Destination table name.
    pub table: String,
    #[serde(default)]
    pub mode: DatabaseMode,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DatabaseMode {
    /// Add rows without deduplication.
    #[default]
    Append,
    /// Drop and recreate the destination table.
    Replace,
}
