// salesflow-core/src/domain/project/mod.rs

pub mod configuration;

pub use configuration::{DatabaseConfig, LoadConfig, LoadMode, ProjectConfig};
