// salesflow-core/src/application/transform.rs
//
// USE CASE: the transform stage behind a file boundary.
// CSV in; aggregated CSV, enriched CSV and JSON summary out.

use std::path::{Path, PathBuf};
use tracing::{debug, info, instrument, warn};

use crate::domain::error::TransformError;
use crate::domain::transform::{TransformConfig, TransformSummary, transform};
use crate::error::SalesflowError;
use crate::infrastructure::error::InfrastructureError;
use crate::infrastructure::fs::{atomic_write, remove_if_exists};
use crate::infrastructure::sales_csv::{read_sales_csv, write_aggregated_csv, write_enriched_csv};

pub const TRANSFORMED_FILE: &str = "transformed_data.csv";
pub const TRANSFORMED_FULL_FILE: &str = "transformed_data_full.csv";
pub const SUMMARY_FILE: &str = "transform_summary.json";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransformPaths {
    pub input: PathBuf,
    pub output: PathBuf,
    pub full_output: PathBuf,
    pub summary: PathBuf,
}

impl TransformPaths {
    /// Conventional layout: everything in one directory.
    pub fn in_dir(dir: &Path, input: &Path) -> Self {
        Self {
            input: input.to_path_buf(),
            output: dir.join(TRANSFORMED_FILE),
            full_output: dir.join(TRANSFORMED_FULL_FILE),
            summary: dir.join(SUMMARY_FILE),
        }
    }

    /// Explicit output file; the side artifacts go next to it.
    pub fn for_output(input: &Path, output: &Path) -> Self {
        let dir = match output.parent() {
            Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
            _ => PathBuf::from("."),
        };
        Self {
            input: input.to_path_buf(),
            output: output.to_path_buf(),
            full_output: dir.join(TRANSFORMED_FULL_FILE),
            summary: dir.join(SUMMARY_FILE),
        }
    }
}

fn write_summary(path: &Path, summary: &TransformSummary) -> Result<(), SalesflowError> {
    let json = summary.to_json().map_err(InfrastructureError::from)?;
    atomic_write(path, json)?;
    Ok(())
}

/// Deletes the artifacts a previous run left behind, so a failed or empty run
/// never sits next to stale output.
fn remove_previous_artifacts(paths: &TransformPaths) -> Result<(), SalesflowError> {
    for path in [&paths.output, &paths.full_output, &paths.summary] {
        if *path == paths.input {
            continue;
        }
        if remove_if_exists(path)? {
            debug!(path = %path.display(), "Removed previous artifact");
        }
    }
    Ok(())
}

/// Reads, transforms, writes. Artifacts of a previous run are removed first.
///
/// - input problems (`InputSchema`): nothing is written.
/// - every record rejected (`EmptyResult`): a header-only output and the
///   flagged summary are written, then the error is returned.
/// - success: output, full enriched output and summary are written.
#[instrument(skip_all, fields(input = %paths.input.display()))]
pub fn run_transform(
    paths: &TransformPaths,
    config: &TransformConfig,
) -> Result<TransformSummary, SalesflowError> {
    remove_previous_artifacts(paths)?;
    let raw = read_sales_csv(&paths.input)?;

    match transform(&raw, config) {
        Ok(out) => {
            write_aggregated_csv(&paths.output, &out.aggregated)?;
            write_enriched_csv(&paths.full_output, &out.enriched)?;
            write_summary(&paths.summary, &out.summary)?;
            info!(
                output = %paths.output.display(),
                groups = out.summary.groups_out,
                rejected = out.rejected.len(),
                "Transformed data written"
            );
            Ok(out.summary)
        }
        Err(TransformError::EmptyResult(summary)) => {
            write_aggregated_csv(&paths.output, &[])?;
            write_summary(&paths.summary, &summary)?;
            warn!(
                output = %paths.output.display(),
                "Empty result: header-only output and flagged summary written"
            );
            Err(TransformError::EmptyResult(summary).into())
        }
        Err(err) => Err(err.into()),
    }
}
