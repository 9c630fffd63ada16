//! End-to-end tests for the pipeline orchestrator and model build.

use std::path::Path;

use etl_core::config::PipelineConfig;
use etl_core::error::EtlError;

use etl_cli::model::run_model;
use etl_cli::pipeline::{RunRequest, run_pipeline};
use etl_cli::sample::generate_sales_csv;

fn write_source(dir: &Path) -> std::path::PathBuf {
    let path = dir.join("sales.csv");
    std::fs::write(
        &path,
        "transaction_id,region,unit_price\n\
         1,North,10.0\n\
         2,South,20.0\n\
         2,South,20.0\n\
         3,East,\n\
         4,West,40.0\n",
    )
    .unwrap();
    path
}

#[test]
fn pipeline_runs_extract_transform_load() {
    let dir = tempfile::tempdir().unwrap();
    let source = write_source(dir.path());
    let output = dir.path().join("out.csv");
    let config = PipelineConfig::from_yaml_str(
        r"
transform:
  steps:
    - op: remove_duplicates
    - op: missing_values
      strategy: drop
      columns: [unit_price]
",
        "inline",
    )
    .unwrap();

    let summary = run_pipeline(&RunRequest {
        source: source.clone(),
        output: output.clone(),
        config,
    })
    .unwrap();

    // 5 rows in, one duplicate and one null row removed
    assert_eq!(summary.stages.len(), 3);
    assert_eq!(summary.stages[0].name, "extract");
    assert_eq!(summary.stages[0].rows, 5);
    assert_eq!(summary.stages[1].rows, 3);
    assert_eq!(summary.stages[2].rows, 3);

    let back = etl_extract::extract_from_csv(&output).unwrap();
    assert_eq!(back.row_count(), 3);
}

#[test]
fn missing_source_fails_with_not_found() {
    let dir = tempfile::tempdir().unwrap();
    let error = run_pipeline(&RunRequest {
        source: dir.path().join("absent.csv"),
        output: dir.path().join("out.csv"),
        config: PipelineConfig::default(),
    })
    .unwrap_err();

    // the taxonomy error survives the stage context wrapper
    let root = error.downcast_ref::<EtlError>().unwrap();
    assert!(matches!(root, EtlError::NotFound { .. }));
    assert!(format!("{error:#}").contains("extracting stage failed"));
}

#[test]
fn bad_transform_column_fails_and_writes_nothing() {
    let dir = tempfile::tempdir().unwrap();
    let source = write_source(dir.path());
    let output = dir.path().join("out.csv");
    let config = PipelineConfig::from_yaml_str(
        r"
transform:
  steps:
    - op: normalize
      columns: [no_such_column]
",
        "inline",
    )
    .unwrap();

    let error = run_pipeline(&RunRequest {
        source,
        output: output.clone(),
        config,
    })
    .unwrap_err();
    let root = error.downcast_ref::<EtlError>().unwrap();
    assert!(matches!(root, EtlError::Key { .. }));
    assert!(!output.exists());
}

#[test]
fn aggregate_pipeline_produces_group_rows() {
    let dir = tempfile::tempdir().unwrap();
    let source = write_source(dir.path());
    let output = dir.path().join("agg.csv");
    let config = PipelineConfig::from_yaml_str(
        r"
transform:
  steps:
    - op: remove_duplicates
    - op: missing_values
      strategy: drop
    - op: aggregate
      group_by: [region]
      aggregations:
        - column: unit_price
          agg: sum
",
        "inline",
    )
    .unwrap();

    let summary = run_pipeline(&RunRequest {
        source,
        output: output.clone(),
        config,
    })
    .unwrap();
    // regions North, South, West survive cleaning
    assert_eq!(summary.stages[1].rows, 3);

    let back = etl_extract::extract_from_csv(&output).unwrap();
    assert_eq!(back.column_names(), vec!["region", "unit_price_sum"]);
}

#[test]
fn model_build_writes_all_layers() {
    let dir = tempfile::tempdir().unwrap();
    let source = dir.path().join("sample.csv");
    generate_sales_csv(&source, 300).unwrap();

    let output_dir = dir.path().join("model");
    let summary = run_model(&source, &output_dir).unwrap();

    for artifact in [
        "raw/sales.parquet",
        "cleaned/sales.parquet",
        "modeled/dim_customer.parquet",
        "modeled/dim_product.parquet",
        "modeled/dim_seller.parquet",
        "modeled/dim_date.parquet",
        "modeled/fact_sales.parquet",
        "modeled/reports/revenue_by_category.csv",
        "modeled/reports/revenue_by_month.csv",
        "modeled/reports/top_customers.csv",
    ] {
        assert!(output_dir.join(artifact).exists(), "missing {artifact}");
    }

    let raw = summary.layers.iter().find(|l| l.name == "raw").unwrap();
    let cleaned = summary.layers.iter().find(|l| l.name == "cleaned").unwrap();
    let fact = summary
        .layers
        .iter()
        .find(|l| l.name == "fact_sales")
        .unwrap();
    // cleaning removes the injected duplicates and incomplete rows
    assert!(cleaned.rows < raw.rows);
    // every cleaned row lands in the fact table
    assert_eq!(fact.rows, cleaned.rows);
}
