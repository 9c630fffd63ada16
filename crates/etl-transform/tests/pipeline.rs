//! Tests for pipeline construction and ordered execution.

use polars::prelude::{Column, DataFrame, IntoColumn, NamedFrom, Series};

use etl_core::config::{PipelineConfig, TransformConfig};
use etl_core::frame::SourceFrame;
use etl_transform::build_pipeline;

fn frame(columns: Vec<Column>) -> SourceFrame {
    SourceFrame::new("test", DataFrame::new(columns).unwrap())
}

fn float_col(name: &str, values: Vec<Option<f64>>) -> Column {
    Series::new(name.into(), values).into_column()
}

#[test]
fn pipeline_reflects_configured_step_order() {
    let yaml = r"
transform:
  steps:
    - op: missing_values
      strategy: drop
    - op: remove_duplicates
    - op: normalize
      columns: [price]
";
    let config = PipelineConfig::from_yaml_str(yaml, "inline").unwrap();
    let pipeline = build_pipeline(&config.transform);
    assert_eq!(
        pipeline.step_names(),
        vec!["missing_values", "remove_duplicates", "normalize"]
    );
}

#[test]
fn empty_config_builds_empty_pipeline() {
    let pipeline = build_pipeline(&TransformConfig::default());
    assert!(pipeline.is_empty());
}

#[test]
fn step_order_changes_the_result() {
    // Two rows duplicate each other only after the null is dropped from
    // consideration; deduplicating first keeps both.
    let build = |yaml: &str| {
        let config = PipelineConfig::from_yaml_str(yaml, "inline").unwrap();
        build_pipeline(&config.transform)
    };
    let input = frame(vec![
        float_col("price", vec![Some(1.0), None, Some(1.0)]),
    ]);

    let dedupe_first = build(
        r"
transform:
  steps:
    - op: remove_duplicates
    - op: missing_values
      strategy: drop
",
    );
    let drop_first = build(
        r"
transform:
  steps:
    - op: missing_values
      strategy: drop
    - op: remove_duplicates
",
    );

    let a = dedupe_first.execute(&input).unwrap();
    let b = drop_first.execute(&input).unwrap();
    assert_eq!(a.row_count(), 1);
    assert_eq!(b.row_count(), 1);

    // A fill-then-dedupe order produces a different table than dedupe-then-fill.
    let fill_then_dedupe = build(
        r"
transform:
  steps:
    - op: missing_values
      strategy: fill
      fill_value: 1.0
    - op: remove_duplicates
",
    );
    let dedupe_then_fill = build(
        r"
transform:
  steps:
    - op: remove_duplicates
    - op: missing_values
      strategy: fill
      fill_value: 1.0
",
    );
    let filled_first = fill_then_dedupe.execute(&input).unwrap();
    let deduped_first = dedupe_then_fill.execute(&input).unwrap();
    assert_eq!(filled_first.row_count(), 1);
    assert_eq!(deduped_first.row_count(), 2);
}

#[test]
fn execute_preserves_source_identity() {
    let pipeline = build_pipeline(&TransformConfig::default());
    let input = frame(vec![float_col("x", vec![Some(1.0)])]);
    let out = pipeline.execute(&input).unwrap();
    assert_eq!(out.source_id, "test");
    assert_eq!(out.row_count(), 1);
}
