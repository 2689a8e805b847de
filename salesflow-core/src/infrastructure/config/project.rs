// salesflow-core/src/infrastructure/config/project.rs

use std::fs;
use std::path::Path;
use tracing::{info, instrument, warn};
use validator::Validate;

use crate::domain::project::ProjectConfig;
use crate::infrastructure::error::InfrastructureError;

pub const CONFIG_FILE: &str = "salesflow.yaml";

// --- LOADER ---

/// Loads `salesflow.yaml` from the project directory, then applies
/// `SALESFLOW_*` environment overrides.
///
/// A missing file is not an error: every field has a default. A file that
/// exists but does not parse, or a transform section that fails validation, is.
#[instrument(skip(project_dir), fields(project_dir = %project_dir.display()))]
pub fn load_project_config(project_dir: &Path) -> Result<ProjectConfig, InfrastructureError> {
    let mut config = read_config_file(project_dir)?;

    apply_env_overrides(&mut config, |key| std::env::var(key).ok());

    config
        .transform
        .validate()
        .map_err(|e| InfrastructureError::ConfigError(format!("transform: {}", e)))?;

    Ok(config)
}

fn read_config_file(project_dir: &Path) -> Result<ProjectConfig, InfrastructureError> {
    let config_path = project_dir.join(CONFIG_FILE);
    if !config_path.exists() {
        warn!(path = ?config_path, "No project configuration found, using defaults");
        return Ok(ProjectConfig::default());
    }

    info!(path = ?config_path, "Loading project configuration");
    let content = fs::read_to_string(&config_path)?;
    if content.trim().is_empty() {
        return Ok(ProjectConfig::default());
    }
    let config: ProjectConfig = serde_yaml::from_str(&content)?;
    Ok(config)
}

/// Layering: environment beats file. `lookup` is `std::env::var` outside tests.
pub fn apply_env_overrides<F>(config: &mut ProjectConfig, lookup: F)
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(val) = lookup("SALESFLOW_DB_PATH") {
        info!(old = ?config.database.path, new = ?val, "Overriding database path via ENV");
        config.database.path = val;
    }
    if let Some(val) = lookup("SALESFLOW_OUTPUT_PATH") {
        info!(old = ?config.output_path, new = ?val, "Overriding output path via ENV");
        config.output_path = val;
    }
    if let Some(val) = lookup("SALESFLOW_SOURCE_TABLE") {
        info!(old = ?config.database.source_table, new = ?val, "Overriding source table via ENV");
        config.database.source_table = val;
    }
    if let Some(val) = lookup("SALESFLOW_TARGET_TABLE") {
        info!(old = ?config.database.target_table, new = ?val, "Overriding target table via ENV");
        config.database.target_table = val;
    }
}
