// salesflow/src/commands/seed.rs
//
// USE CASE: Fill the source table with demo sales.

use std::path::PathBuf;

use salesflow_core::application::seed;

use super::{load_config, open_database};

pub async fn execute(project_dir: PathBuf, count: usize, rng_seed: u64) -> anyhow::Result<()> {
    let config = load_config(&project_dir)?;
    let connector = open_database(&project_dir, &config)?;

    let summary = seed(&connector, &config.database.source_table, count, rng_seed).await?;

    println!(
        "🌱 Seeded '{}' with {} rows (seed {})",
        summary.table, summary.rows_written, rng_seed
    );
    println!(
        "   Dirt: {} duplicates, {} null discounts, {} null required fields, {} non-positive quantities, {} outliers",
        summary.duplicates,
        summary.null_discounts,
        summary.null_required,
        summary.non_positive_quantities,
        summary.outliers
    );
    Ok(())
}
