// salesflow/src/commands/transform.rs
//
// USE CASE: File-to-file transform. No database involved.

use std::path::PathBuf;

use salesflow_core::application::transform::{TransformPaths, run_transform};
use salesflow_core::application::extract::EXTRACTED_FILE;
use salesflow_core::domain::transform::TransformSummary;

use super::{load_config, new_table};

pub fn execute(
    project_dir: PathBuf,
    input: Option<PathBuf>,
    output: Option<PathBuf>,
) -> anyhow::Result<()> {
    let config = load_config(&project_dir)?;
    let output_dir = config.output_dir(&project_dir);
    let input = input.unwrap_or_else(|| output_dir.join(EXTRACTED_FILE));

    let paths = match output {
        Some(output) => TransformPaths::for_output(&input, &output),
        None => TransformPaths::in_dir(&output_dir, &input),
    };

    println!("🧮 Transforming {}", paths.input.display());
    let summary = run_transform(&paths, &config.transform)?;

    print_summary(&summary);
    println!("✨ Written {}", paths.output.display());
    Ok(())
}

fn print_summary(summary: &TransformSummary) {
    let mut table = new_table(vec!["Stage", "Records"]);
    table
        .add_row(vec!["input".to_string(), summary.records_in.to_string()])
        .add_row(vec!["after dedup".to_string(), summary.records_after_dedup.to_string()])
        .add_row(vec![
            "after null removal".to_string(),
            summary.records_after_null_removal.to_string(),
        ])
        .add_row(vec![
            "after value validation".to_string(),
            summary.records_after_value_validation.to_string(),
        ])
        .add_row(vec![
            "after outlier removal".to_string(),
            summary.records_after_outlier_removal.to_string(),
        ])
        .add_row(vec!["groups".to_string(), summary.groups_out.to_string()]);
    println!("{table}");
    println!(
        "   Net revenue: {}  (reduction {}%)",
        summary.total_net_revenue, summary.reduction_percentage
    );
}
