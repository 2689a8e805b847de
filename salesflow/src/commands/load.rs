// salesflow/src/commands/load.rs
//
// USE CASE: transformed_data.csv -> target table.

use std::path::PathBuf;

use salesflow_core::application::load;
use salesflow_core::application::transform::TRANSFORMED_FILE;
use salesflow_core::domain::project::LoadMode;

use super::{load_config, open_database};

pub async fn execute(
    project_dir: PathBuf,
    input: Option<PathBuf>,
    mode: Option<LoadMode>,
) -> anyhow::Result<()> {
    let config = load_config(&project_dir)?;
    let connector = open_database(&project_dir, &config)?;
    let input = input.unwrap_or_else(|| config.output_dir(&project_dir).join(TRANSFORMED_FILE));
    let mode = mode.unwrap_or(config.load.mode);

    let summary = load(
        &connector,
        &input,
        &config.database.target_table,
        mode,
        config.load.backup,
    )
    .await?;

    println!(
        "📥 Loaded {} rows into '{}' (mode: {}), table now holds {}",
        summary.rows_loaded, summary.table, summary.mode, summary.rows_in_table
    );
    if let Some(backup) = &summary.backup_table {
        println!("   Backup: {}", backup);
    }
    if summary.duplicate_keys > 0 {
        println!("   ⚠️  {} duplicate group keys", summary.duplicate_keys);
    }
    Ok(())
}
