//! Ordered transform execution.
//!
//! Each configured operation becomes a [`TransformStep`]; the pipeline runs
//! them strictly in the order they appear in the configuration. Order is
//! significant: deduplicating before null-handling yields a different result
//! than the reverse, so no reordering or fusion happens here.

use std::collections::BTreeMap;
use std::time::Instant;

use polars::prelude::DataFrame;
use tracing::debug;

use etl_core::config::{
    Aggregation, CoercionPolicy, ColumnType, Condition, MissingValueStrategy, NormalizeMethod,
    ScalarValue, StepConfig, TransformConfig,
};
use etl_core::error::Result;
use etl_core::frame::SourceFrame;

use crate::ops;

/// One operation in the transform chain.
///
/// Implementations must treat the input as immutable and return a new frame.
pub trait TransformStep: Send + Sync {
    fn apply(&self, df: &DataFrame) -> Result<DataFrame>;

    /// Stable name for logs and step listings.
    fn step_name(&self) -> &str;
}

/// An ordered chain of transform steps.
#[derive(Default)]
pub struct TransformPipeline {
    steps: Vec<Box<dyn TransformStep>>,
}

impl TransformPipeline {
    pub fn new() -> Self {
        Self { steps: Vec::new() }
    }

    pub fn add_step(mut self, step: Box<dyn TransformStep>) -> Self {
        self.steps.push(step);
        self
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    /// Step names in execution order.
    pub fn step_names(&self) -> Vec<&str> {
        self.steps.iter().map(|step| step.step_name()).collect()
    }

    /// Run every step in order, logging the row delta per step.
    pub fn execute(&self, frame: &SourceFrame) -> Result<SourceFrame> {
        let mut data = frame.data.clone();
        for step in &self.steps {
            let start = Instant::now();
            let rows_in = data.height();
            data = step.apply(&data)?;
            debug!(
                step = step.step_name(),
                rows_in,
                rows_out = data.height(),
                duration_ms = start.elapsed().as_millis(),
                "transform step complete"
            );
        }
        Ok(frame.with_data(data))
    }
}

/// Build the step chain for a transform configuration.
pub fn build_pipeline(config: &TransformConfig) -> TransformPipeline {
    let mut pipeline = TransformPipeline::new();
    for step in &config.steps {
        let boxed: Box<dyn TransformStep> = match step.clone() {
            StepConfig::RemoveDuplicates { subset } => Box::new(RemoveDuplicatesStep { subset }),
            StepConfig::MissingValues {
                strategy,
                columns,
                fill_value,
            } => Box::new(MissingValuesStep {
                strategy,
                columns,
                fill_value,
            }),
            StepConfig::Normalize { columns, method } => {
                Box::new(NormalizeStep { columns, method })
            }
            StepConfig::Filter { conditions } => Box::new(FilterStep { conditions }),
            StepConfig::Aggregate {
                group_by,
                aggregations,
            } => Box::new(AggregateStep {
                group_by,
                aggregations,
            }),
            StepConfig::ConvertTypes { mapping, on_error } => {
                Box::new(ConvertTypesStep { mapping, on_error })
            }
        };
        pipeline = pipeline.add_step(boxed);
    }
    pipeline
}

struct RemoveDuplicatesStep {
    subset: Option<Vec<String>>,
}

impl TransformStep for RemoveDuplicatesStep {
    fn apply(&self, df: &DataFrame) -> Result<DataFrame> {
        ops::remove_duplicates(df, self.subset.as_deref())
    }

    fn step_name(&self) -> &str {
        "remove_duplicates"
    }
}

struct MissingValuesStep {
    strategy: MissingValueStrategy,
    columns: Option<Vec<String>>,
    fill_value: Option<ScalarValue>,
}

impl TransformStep for MissingValuesStep {
    fn apply(&self, df: &DataFrame) -> Result<DataFrame> {
        ops::handle_missing_values(
            df,
            self.strategy,
            self.columns.as_deref(),
            self.fill_value.as_ref(),
        )
    }

    fn step_name(&self) -> &str {
        "missing_values"
    }
}

struct NormalizeStep {
    columns: Vec<String>,
    method: NormalizeMethod,
}

impl TransformStep for NormalizeStep {
    fn apply(&self, df: &DataFrame) -> Result<DataFrame> {
        ops::normalize_columns(df, &self.columns, self.method)
    }

    fn step_name(&self) -> &str {
        "normalize"
    }
}

struct FilterStep {
    conditions: Vec<Condition>,
}

impl TransformStep for FilterStep {
    fn apply(&self, df: &DataFrame) -> Result<DataFrame> {
        ops::filter_rows(df, &self.conditions)
    }

    fn step_name(&self) -> &str {
        "filter"
    }
}

struct AggregateStep {
    group_by: Vec<String>,
    aggregations: Vec<Aggregation>,
}

impl TransformStep for AggregateStep {
    fn apply(&self, df: &DataFrame) -> Result<DataFrame> {
        ops::aggregate(df, &self.group_by, &self.aggregations)
    }

    fn step_name(&self) -> &str {
        "aggregate"
    }
}

struct ConvertTypesStep {
    mapping: BTreeMap<String, ColumnType>,
    on_error: CoercionPolicy,
}

impl TransformStep for ConvertTypesStep {
    fn apply(&self, df: &DataFrame) -> Result<DataFrame> {
        ops::convert_types(df, &self.mapping, self.on_error)
    }

    fn step_name(&self) -> &str {
        "convert_types"
    }
}
