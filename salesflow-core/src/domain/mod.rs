// salesflow-core/src/domain/mod.rs

pub mod error;
pub mod project;
pub mod sales;
pub mod transform;

// Re-exports to keep call sites short
pub use error::{DomainError, InputSchemaError, InputValueError, TransformError};
pub use transform::{TransformConfig, TransformOutput, TransformSummary, transform};
