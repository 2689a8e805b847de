// salesflow-core/src/application/pipeline.rs

use serde::Serialize;
use std::fmt;
use std::path::Path;
use std::time::Instant;
use tracing::{error, info, instrument, warn};

use crate::error::SalesflowError;
use crate::ports::connector::Connector;

// Application Services
use crate::application::extract::extract;
use crate::application::load::load;
use crate::application::report::{Report, report};
use crate::application::transform::{TransformPaths, run_transform};

// Domain
use crate::domain::project::ProjectConfig;

// Infrastructure
use crate::infrastructure::fs::atomic_write;

pub const RUN_RESULTS_FILE: &str = "run_results.json";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    Extract,
    Transform,
    Load,
    Report,
}

impl Stage {
    pub const ALL: [Stage; 4] = [Stage::Extract, Stage::Transform, Stage::Load, Stage::Report];

    pub fn as_str(&self) -> &'static str {
        match self {
            Stage::Extract => "extract",
            Stage::Transform => "transform",
            Stage::Load => "load",
            Stage::Report => "report",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StageStatus {
    Succeeded,
    /// The transform ran but rejected every record.
    EmptyResult,
    Failed,
    /// Not attempted because an earlier stage failed.
    Skipped,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StageResult {
    pub stage: Stage,
    pub status: StageStatus,
    /// Rows the stage produced: extracted rows, aggregated groups, loaded rows, reported rows.
    pub rows: Option<usize>,
    pub error: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct RunResult {
    pub success: bool,
    pub started_at: String,
    pub duration_secs: f64,
    pub stages: Vec<StageResult>,
    pub report: Option<Report>,
}

impl RunResult {
    fn new() -> Self {
        Self {
            success: false,
            started_at: chrono::Utc::now().to_rfc3339(),
            duration_secs: 0.0,
            stages: Vec::with_capacity(Stage::ALL.len()),
            report: None,
        }
    }

    pub fn stage(&self, stage: Stage) -> Option<&StageResult> {
        self.stages.iter().find(|s| s.stage == stage)
    }

    /// Records one stage outcome and hands it back untouched.
    fn record<T>(
        &mut self,
        stage: Stage,
        outcome: Result<T, SalesflowError>,
        rows: impl Fn(&T) -> usize,
    ) -> Result<T, SalesflowError> {
        let entry = match &outcome {
            Ok(value) => {
                let rows = rows(value);
                info!(stage = %stage, rows, "Stage succeeded");
                StageResult {
                    stage,
                    status: StageStatus::Succeeded,
                    rows: Some(rows),
                    error: None,
                }
            }
            Err(e) => {
                let status = if e.is_empty_result() {
                    warn!(stage = %stage, "Stage produced an empty result");
                    StageStatus::EmptyResult
                } else {
                    error!(stage = %stage, error = %e, "Stage failed");
                    StageStatus::Failed
                };
                StageResult {
                    stage,
                    status,
                    rows: None,
                    error: Some(e.to_string()),
                }
            }
        };
        self.stages.push(entry);
        outcome
    }

    fn skip_remaining(&mut self) {
        for stage in Stage::ALL {
            if self.stage(stage).is_none() {
                self.stages.push(StageResult {
                    stage,
                    status: StageStatus::Skipped,
                    rows: None,
                    error: None,
                });
            }
        }
    }
}

/// Extract, transform, load, report. Stops at the first failing stage.
///
/// `run_results.json` is written to the output directory whatever the
/// outcome; a failure is then returned as the stage's own error.
#[instrument(skip_all, fields(project = %config.name))]
pub async fn run_pipeline(
    project_dir: &Path,
    config: &ProjectConfig,
    connector: &dyn Connector,
) -> Result<RunResult, SalesflowError> {
    info!("Starting pipeline");
    let start_time = Instant::now();
    let output_dir = config.output_dir(project_dir);

    let mut run = RunResult::new();
    let outcome = run_stages(&mut run, &output_dir, config, connector).await;

    run.skip_remaining();
    run.success = outcome.is_ok();
    run.duration_secs = start_time.elapsed().as_secs_f64();
    save_json(&output_dir.join(RUN_RESULTS_FILE), &run)?;

    info!(
        success = run.success,
        duration_secs = run.duration_secs,
        "Pipeline finished"
    );
    outcome.map(|_| run)
}

async fn run_stages(
    run: &mut RunResult,
    output_dir: &Path,
    config: &ProjectConfig,
    connector: &dyn Connector,
) -> Result<(), SalesflowError> {
    let db = &config.database;

    let extracted = run.record(
        Stage::Extract,
        extract(connector, &db.source_table, output_dir).await,
        |s| s.rows,
    )?;

    let paths = TransformPaths::in_dir(output_dir, &extracted.output);
    let transformed = run.record(
        Stage::Transform,
        run_transform(&paths, &config.transform),
        |s| s.groups_out,
    )?;
    info!(
        records_in = transformed.records_in,
        groups_out = transformed.groups_out,
        rejected = transformed.total_rejected(),
        "Transform counters"
    );

    run.record(
        Stage::Load,
        load(
            connector,
            &paths.output,
            &db.target_table,
            config.load.mode,
            config.load.backup,
        )
        .await,
        |s| s.rows_loaded,
    )?;

    let reported = run.record(
        Stage::Report,
        report(connector, &db.target_table).await,
        |r| r.rows,
    )?;
    run.report = Some(reported);
    Ok(())
}

fn save_json<T: Serialize>(path: &Path, data: &T) -> Result<(), SalesflowError> {
    let content = serde_json::to_string_pretty(data)
        .map_err(|e| SalesflowError::InternalError(format!("Serialization: {}", e)))?;
    atomic_write(path, content)?;
    Ok(())
}
