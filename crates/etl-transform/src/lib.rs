//! Transform stage: pure, composable table-to-table operations and the
//! ordered pipeline that executes them.

pub mod ops;
pub mod pipeline;

pub use ops::{
    aggregate, convert_types, filter_rows, handle_missing_values, normalize_columns,
    remove_duplicates,
};
pub use pipeline::{TransformPipeline, TransformStep, build_pipeline};
