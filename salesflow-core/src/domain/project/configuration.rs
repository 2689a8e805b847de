// salesflow-core/src/domain/project/configuration.rs

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};

use crate::domain::transform::config::TransformConfig;

/// What `load` does when the target table already exists.
#[derive(Debug, Deserialize, Serialize, Clone, Copy, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum LoadMode {
    #[default]
    Replace,
    Append,
    Fail,
}

impl LoadMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Replace => "replace",
            Self::Append => "append",
            Self::Fail => "fail",
        }
    }
}

impl fmt::Display for LoadMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct DatabaseConfig {
    #[serde(default = "default_db_path")]
    pub path: String,
    #[serde(default = "default_source_table")]
    pub source_table: String,
    #[serde(default = "default_target_table")]
    pub target_table: String,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: default_db_path(),
            source_table: default_source_table(),
            target_table: default_target_table(),
        }
    }
}

#[derive(Debug, Deserialize, Serialize, Clone, Default, PartialEq)]
pub struct LoadConfig {
    #[serde(default)]
    pub mode: LoadMode,
    /// Copy the existing target table to `<table>_backup` before writing.
    #[serde(default)]
    pub backup: bool,
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct ProjectConfig {
    #[serde(default = "default_name")]
    pub name: String,

    #[serde(default = "default_output_path")]
    pub output_path: String,

    #[serde(default)]
    pub database: DatabaseConfig,

    #[serde(default)]
    pub transform: TransformConfig,

    #[serde(default)]
    pub load: LoadConfig,
}

impl Default for ProjectConfig {
    fn default() -> Self {
        Self {
            name: default_name(),
            output_path: default_output_path(),
            database: DatabaseConfig::default(),
            transform: TransformConfig::default(),
            load: LoadConfig::default(),
        }
    }
}

impl ProjectConfig {
    /// Output directory, relative paths taken from the project directory.
    pub fn output_dir(&self, project_dir: &Path) -> PathBuf {
        resolve(project_dir, &self.output_path)
    }

    /// Database location; `:memory:` is passed through untouched.
    pub fn db_path(&self, project_dir: &Path) -> String {
        if self.database.path == ":memory:" {
            return self.database.path.clone();
        }
        resolve(project_dir, &self.database.path)
            .to_string_lossy()
            .into_owned()
    }
}

fn resolve(project_dir: &Path, path: &str) -> PathBuf {
    let p = Path::new(path);
    if p.is_absolute() {
        p.to_path_buf()
    } else {
        project_dir.join(p)
    }
}

fn default_name() -> String {
    "salesflow".to_string()
}
fn default_output_path() -> String {
    "data/output".to_string()
}
fn default_db_path() -> String {
    "data/database.duckdb".to_string()
}
fn default_source_table() -> String {
    "sales_data".to_string()
}
fn default_target_table() -> String {
    "sales_transformed".to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_yaml_keeps_defaults() -> anyhow::Result<()> {
        let yaml = "
name: demo
database:
  target_table: daily_sales
load:
  mode: append
";
        let config: ProjectConfig = serde_yaml::from_str(yaml)?;
        assert_eq!(config.name, "demo");
        assert_eq!(config.output_path, "data/output");
        assert_eq!(config.database.path, "data/database.duckdb");
        assert_eq!(config.database.source_table, "sales_data");
        assert_eq!(config.database.target_table, "daily_sales");
        assert_eq!(config.load.mode, LoadMode::Append);
        assert!(!config.load.backup);
        assert_eq!(config.transform, TransformConfig::default());
        Ok(())
    }

    #[test]
    fn test_paths_resolve_against_project_dir() {
        let config = ProjectConfig::default();
        let root = Path::new("/srv/sales");
        assert_eq!(config.output_dir(root), PathBuf::from("/srv/sales/data/output"));
        assert_eq!(config.db_path(root), "/srv/sales/data/database.duckdb");

        let in_memory = ProjectConfig {
            database: DatabaseConfig {
                path: ":memory:".into(),
                ..Default::default()
            },
            ..Default::default()
        };
        assert_eq!(in_memory.db_path(root), ":memory:");
    }

    #[test]
    fn test_unknown_load_mode_is_an_error() {
        let result: Result<ProjectConfig, _> = serde_yaml::from_str("load:\n  mode: upsert\n");
        assert!(result.is_err());
    }
}
