//! Command implementations.

use anyhow::{Context, Result};
use comfy_table::Table;

use etl_core::config::{DatabaseConfig, OutputFormat, PipelineConfig, WriteMode};

use crate::cli::{ModelArgs, OutputFormatArg, RunArgs, SampleArgs, WriteModeArg};
use crate::model::{ModelSummary, run_model};
use crate::pipeline::{RunRequest, RunSummary, database_mode_for, run_pipeline};
use crate::sample::{SampleStats, generate_sales_csv};
use crate::summary::apply_table_style;

/// Run the configured pipeline, applying CLI overrides on top of the file.
pub fn run_run(args: &RunArgs) -> Result<RunSummary> {
    let mut config = match &args.config {
        Some(path) => PipelineConfig::from_yaml_file(path)
            .with_context(|| format!("load configuration {}", path.display()))?,
        None => PipelineConfig::default(),
    };

    if let Some(format) = args.format {
        config.load.format = match format {
            OutputFormatArg::Csv => OutputFormat::Csv,
            OutputFormatArg::Json => OutputFormat::Json,
            OutputFormatArg::Parquet => OutputFormat::Parquet,
            OutputFormatArg::Database => OutputFormat::Database,
        };
    }
    if let Some(mode) = args.mode {
        config.load.mode = match mode {
            WriteModeArg::Overwrite => WriteMode::Overwrite,
            WriteModeArg::Append => WriteMode::Append,
        };
        if let Some(database) = config.load.database.as_mut() {
            database.mode = database_mode_for(config.load.mode);
        }
    }
    if let Some(table) = &args.table {
        match config.load.database.as_mut() {
            Some(database) => database.table = table.clone(),
            None => {
                config.load.database = Some(DatabaseConfig {
                    table: table.clone(),
                    mode: database_mode_for(config.load.mode),
                });
            }
        }
    }

    run_pipeline(&RunRequest {
        source: args.source.clone(),
        output: args.output.clone(),
        config,
    })
}

/// Build the raw/cleaned/modeled layers.
pub fn run_model_command(args: &ModelArgs) -> Result<ModelSummary> {
    let output_dir = args.output_dir.clone().unwrap_or_else(|| {
        args.source
            .parent()
            .unwrap_or_else(|| std::path::Path::new("."))
            .join("model")
    });
    run_model(&args.source, &output_dir)
}

/// Generate sample sales data.
pub fn run_sample(args: &SampleArgs) -> Result<SampleStats> {
    generate_sales_csv(&args.output, args.rows)
}

/// List the transform operations the configuration can reference.
pub fn run_operations() -> Result<()> {
    let operations = [
        ("remove_duplicates", "Drop exact or subset-key duplicate rows, keeping the first"),
        ("missing_values", "Drop, fill, forward-fill, or backward-fill nulls"),
        ("normalize", "Min-max or z-score scaling of numeric columns"),
        ("filter", "Keep rows matching every condition"),
        ("aggregate", "Group and apply sum/mean/count/min/max"),
        ("convert_types", "Coerce columns to int/float/string/bool"),
    ];
    let mut table = Table::new();
    table.set_header(vec!["Operation", "Description"]);
    apply_table_style(&mut table);
    for (name, description) in operations {
        table.add_row(vec![name, description]);
    }
    println!("{table}");
    Ok(())
}
