//! Shared plumbing for the sales ETL pipeline: the frame currency, the error
//! taxonomy, and the run configuration.

pub mod config;
pub mod error;
pub mod frame;
pub mod values;

pub use config::{
    AggFn, Aggregation, CoercionPolicy, ColumnType, CompareOp, Condition, DatabaseConfig,
    DatabaseMode, ExtractConfig, LoadConfig, MissingValueStrategy, NormalizeMethod, OutputFormat,
    PipelineConfig, ScalarValue, SourceKind, StepConfig, TransformConfig, WriteMode,
};
pub use error::{EtlError, Result};
pub use frame::SourceFrame;
pub use values::{any_to_f64, any_to_i64, any_to_string, format_numeric, parse_f64, parse_i64};
