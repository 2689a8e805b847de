// salesflow/src/commands/extract.rs
//
// USE CASE: Source table -> extracted_data.csv.

use std::path::PathBuf;

use salesflow_core::application::extract;

use super::{load_config, open_database};

pub async fn execute(project_dir: PathBuf) -> anyhow::Result<()> {
    let config = load_config(&project_dir)?;
    let connector = open_database(&project_dir, &config)?;
    let output_dir = config.output_dir(&project_dir);

    let summary = extract(&connector, &config.database.source_table, &output_dir).await?;

    println!(
        "📤 Extracted {} rows from '{}' to {}",
        summary.rows,
        summary.table,
        summary.output.display()
    );
    if let (Some(min), Some(max)) = (&summary.min_date, &summary.max_date) {
        println!("   Date range: {} → {}", min, max);
    }
    println!("   Null cells: {}", summary.null_cells);
    Ok(())
}
