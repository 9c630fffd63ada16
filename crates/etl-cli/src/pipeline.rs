//! Pipeline orchestration with an explicit stage state machine.
//!
//! One run moves `Idle -> Extracting -> Transforming -> Loading -> Done`;
//! `Failed` is reachable from any non-terminal state. On a stage failure the
//! orchestrator logs the error with stage context and re-raises it — there
//! is no partial retry and no checkpointing between stages, so a failed run
//! restarts from extract.

use std::fmt;
use std::path::PathBuf;
use std::time::Instant;

use anyhow::Result;
use tracing::{error, info, info_span};

use etl_core::config::{DatabaseMode, OutputFormat, PipelineConfig, SourceKind};
use etl_core::error::EtlError;
use etl_core::frame::SourceFrame;
use etl_load::{write_csv, write_database, write_json, write_parquet};
use etl_transform::build_pipeline;

/// Orchestrator states.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineStage {
    Idle,
    Extracting,
    Transforming,
    Loading,
    Done,
    Failed,
}

impl fmt::Display for PipelineStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Idle => "idle",
            Self::Extracting => "extracting",
            Self::Transforming => "transforming",
            Self::Loading => "loading",
            Self::Done => "done",
            Self::Failed => "failed",
        };
        f.write_str(name)
    }
}

/// One run's input: where to read, where to write, and the configuration.
#[derive(Debug, Clone)]
pub struct RunRequest {
    pub source: PathBuf,
    pub output: PathBuf,
    pub config: PipelineConfig,
}

/// Row counts and timings per stage, for the summary table.
#[derive(Debug, Clone)]
pub struct StageReport {
    pub name: &'static str,
    pub rows: usize,
    pub duration_ms: u128,
}

#[derive(Debug, Clone)]
pub struct RunSummary {
    pub source_id: String,
    pub output: PathBuf,
    pub stages: Vec<StageReport>,
    pub total_ms: u128,
}

struct PipelineRun {
    stage: PipelineStage,
}

impl PipelineRun {
    fn new() -> Self {
        Self {
            stage: PipelineStage::Idle,
        }
    }

    fn transition(&mut self, next: PipelineStage) {
        info!(from = %self.stage, to = %next, "stage transition");
        self.stage = next;
    }

    /// Move to `Failed`, log the stage context, and hand the error back for
    /// re-raising.
    fn fail(&mut self, error: EtlError) -> anyhow::Error {
        error!(stage = %self.stage, %error, "pipeline failed");
        let context = format!("{} stage failed", self.stage);
        self.stage = PipelineStage::Failed;
        anyhow::Error::new(error).context(context)
    }
}

/// Execute extract once, the transform steps strictly in configured order,
/// then load once.
pub fn run_pipeline(request: &RunRequest) -> Result<RunSummary> {
    let span = info_span!("pipeline", source = %request.source.display());
    let _guard = span.enter();
    let total_start = Instant::now();
    let mut run = PipelineRun::new();
    let mut stages = Vec::with_capacity(3);

    run.transition(PipelineStage::Extracting);
    let extract_start = Instant::now();
    let extracted = match extract(request) {
        Ok(frame) => frame,
        Err(e) => return Err(run.fail(e)),
    };
    stages.push(StageReport {
        name: "extract",
        rows: extracted.row_count(),
        duration_ms: extract_start.elapsed().as_millis(),
    });
    info!(
        rows = extracted.row_count(),
        columns = extracted.column_count(),
        duration_ms = extract_start.elapsed().as_millis(),
        "extract complete"
    );

    run.transition(PipelineStage::Transforming);
    let transform_start = Instant::now();
    let pipeline = build_pipeline(&request.config.transform);
    let transformed = match pipeline.execute(&extracted) {
        Ok(frame) => frame,
        Err(e) => return Err(run.fail(e)),
    };
    stages.push(StageReport {
        name: "transform",
        rows: transformed.row_count(),
        duration_ms: transform_start.elapsed().as_millis(),
    });
    info!(
        steps = pipeline.len(),
        rows = transformed.row_count(),
        duration_ms = transform_start.elapsed().as_millis(),
        "transform complete"
    );

    run.transition(PipelineStage::Loading);
    let load_start = Instant::now();
    if let Err(e) = load(request, &transformed) {
        return Err(run.fail(e));
    }
    stages.push(StageReport {
        name: "load",
        rows: transformed.row_count(),
        duration_ms: load_start.elapsed().as_millis(),
    });
    info!(
        rows = transformed.row_count(),
        output = %request.output.display(),
        duration_ms = load_start.elapsed().as_millis(),
        "load complete"
    );

    run.transition(PipelineStage::Done);
    Ok(RunSummary {
        source_id: extracted.source_id,
        output: request.output.clone(),
        stages,
        total_ms: total_start.elapsed().as_millis(),
    })
}

fn extract(request: &RunRequest) -> etl_core::Result<SourceFrame> {
    match request.config.extract.source {
        SourceKind::Csv => etl_extract::extract_from_csv(&request.source),
        SourceKind::Json => etl_extract::extract_from_json(&request.source),
        SourceKind::Api => {
            let url = request
                .config
                .extract
                .url
                .clone()
                .unwrap_or_else(|| request.source.display().to_string());
            etl_extract::extract_from_api(&url, &request.config.extract.params)
        }
    }
}

fn load(request: &RunRequest, frame: &SourceFrame) -> etl_core::Result<()> {
    let load_config = &request.config.load;
    match load_config.format {
        OutputFormat::Csv => write_csv(frame, &request.output, load_config.mode),
        OutputFormat::Json => write_json(frame, &request.output, load_config.mode),
        OutputFormat::Parquet => write_parquet(frame, &request.output, load_config.mode),
        OutputFormat::Database => {
            let database = load_config.database.as_ref().ok_or_else(|| {
                EtlError::Value(
                    "database output requires a load.database configuration".to_string(),
                )
            })?;
            write_database(frame, &request.output, &database.table, database.mode)
        }
    }
}

/// Interpret a file write mode as a database mode: overwrite maps to
/// replace, append stays append.
pub fn database_mode_for(mode: etl_core::config::WriteMode) -> DatabaseMode {
    match mode {
        etl_core::config::WriteMode::Overwrite => DatabaseMode::Replace,
        etl_core::config::WriteMode::Append => DatabaseMode::Append,
    }
}
