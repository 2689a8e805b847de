// salesflow/src/commands/mod.rs

pub mod extract;
pub mod inspect;
pub mod load;
pub mod report;
pub mod run;
pub mod seed;
pub mod transform;

use anyhow::Context;
use comfy_table::presets::UTF8_FULL;
use comfy_table::{ContentArrangement, Table};
use std::path::Path;
use tracing::debug;

use salesflow_core::domain::project::ProjectConfig;
use salesflow_core::infrastructure::adapters::duckdb::DuckDBConnector;
use salesflow_core::infrastructure::config::load_project_config;

pub(crate) fn load_config(project_dir: &Path) -> anyhow::Result<ProjectConfig> {
    let config = load_project_config(project_dir).with_context(|| {
        format!(
            "Failed to load project configuration from {:?}",
            project_dir
        )
    })?;
    debug!(?config, "Configuration resolved");
    println!("⚙️  Project: {}", config.name);
    Ok(config)
}

pub(crate) fn open_database(
    project_dir: &Path,
    config: &ProjectConfig,
) -> anyhow::Result<DuckDBConnector> {
    let db_path = config.db_path(project_dir);
    println!("   Database: {} 🦆", db_path);
    DuckDBConnector::new(&db_path)
        .with_context(|| format!("Failed to initialize DuckDB at {}", db_path))
}

pub(crate) fn new_table(header: Vec<&str>) -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(header);
    table
}
