//! CLI argument definitions.

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};
use clap_verbosity_flag::{InfoLevel, Verbosity};
use colorchoice_clap::Color;

#[derive(Parser)]
#[command(
    name = "sales-etl",
    version,
    about = "Batch ETL for tabular sales data",
    long_about = "Extract sales data from CSV/JSON/API sources, run a configured chain of\n\
                  cleaning operations, and load the result to CSV, JSON, Parquet, or SQLite.\n\
                  The model command builds a raw/cleaned/modeled star schema instead."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Adjust log verbosity (-v for debug, -vv for trace, -q for warnings only).
    #[command(flatten)]
    pub verbosity: Verbosity<InfoLevel>,

    /// Control ANSI color output (auto, always, never).
    #[command(flatten)]
    pub color: Color,

    /// Explicit log level (overrides -v/-q flags).
    #[arg(long = "log-level", value_enum, global = true)]
    pub log_level: Option<LogLevelArg>,

    /// Log output format (pretty for human, json for machine parsing).
    #[arg(
        long = "log-format",
        value_enum,
        default_value = "pretty",
        global = true
    )]
    pub log_format: LogFormatArg,

    /// Write logs to a file instead of stderr.
    #[arg(long = "log-file", value_name = "PATH", global = true)]
    pub log_file: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Command {
    /// Run the extract-transform-load pipeline.
    Run(RunArgs),

    /// Build the raw/cleaned/modeled star schema from one sales table.
    Model(ModelArgs),

    /// Generate deterministic sample sales data.
    Sample(SampleArgs),

    /// List the supported transform operations.
    Operations,
}

#[derive(Parser)]
pub struct RunArgs {
    /// Source data path (or URL for API extraction).
    #[arg(value_name = "SOURCE")]
    pub source: PathBuf,

    /// Output path (file, or SQLite database for the database format).
    #[arg(value_name = "OUTPUT")]
    pub output: PathBuf,

    /// Pipeline configuration file (YAML).
    #[arg(long = "config", value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Output format (overrides the configuration).
    #[arg(long = "format", value_enum)]
    pub format: Option<OutputFormatArg>,

    /// Write mode (overrides the configuration).
    #[arg(long = "mode", value_enum)]
    pub mode: Option<WriteModeArg>,

    /// Destination table for the database format (overrides the configuration).
    #[arg(long = "table", value_name = "NAME")]
    pub table: Option<String>,
}

#[derive(Parser)]
pub struct ModelArgs {
    /// Flat sales table (CSV) to model.
    #[arg(value_name = "SOURCE")]
    pub source: PathBuf,

    /// Output directory for the layered artifacts (default: <SOURCE dir>/model).
    #[arg(long = "output-dir", value_name = "DIR")]
    pub output_dir: Option<PathBuf>,
}

#[derive(Parser)]
pub struct SampleArgs {
    /// Number of base rows to generate (duplicates are added on top).
    #[arg(long = "rows", default_value_t = 1000)]
    pub rows: usize,

    /// Where to write the sample CSV.
    #[arg(
        long = "output",
        value_name = "PATH",
        default_value = "data/raw/sample_data.csv"
    )]
    pub output: PathBuf,
}

#[derive(Clone, Copy, ValueEnum)]
pub enum OutputFormatArg {
    Csv,
    Json,
    Parquet,
    Database,
}

#[derive(Clone, Copy, ValueEnum)]
pub enum WriteModeArg {
    Overwrite,
    Append,
}

/// CLI log level choices.
#[derive(Clone, Copy, ValueEnum)]
pub enum LogLevelArg {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

/// CLI log format choices.
#[derive(Clone, Copy, ValueEnum)]
pub enum LogFormatArg {
    Pretty,
    Compact,
    Json,
}
