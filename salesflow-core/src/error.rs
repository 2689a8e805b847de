// salesflow-core/src/error.rs

use miette::Diagnostic;
use thiserror::Error;

use crate::domain::error::{DomainError, InputSchemaError, TransformError};
use crate::infrastructure::error::InfrastructureError;

#[derive(Error, Debug, Diagnostic)]
pub enum SalesflowError {
    // --- DOMAIN (input shape, empty result, load rules) ---
    #[error(transparent)]
    #[diagnostic(transparent)]
    Domain(#[from] DomainError),

    // --- INFRASTRUCTURE (IO, parsing, database) ---
    #[error(transparent)]
    #[diagnostic(transparent)]
    Infrastructure(#[from] InfrastructureError),

    // --- GENERIC / APPLICATION ---
    #[error("Internal Error: {0}")]
    #[diagnostic(code(salesflow::internal))]
    InternalError(String),
}

impl SalesflowError {
    /// The transform ran but every record was rejected.
    pub fn is_empty_result(&self) -> bool {
        matches!(
            self,
            SalesflowError::Domain(DomainError::Transform(TransformError::EmptyResult(_)))
        )
    }
}

// Shortcuts so `?` works on the layers' own error types
impl From<std::io::Error> for SalesflowError {
    fn from(err: std::io::Error) -> Self {
        SalesflowError::Infrastructure(InfrastructureError::Io(err))
    }
}

impl From<duckdb::Error> for SalesflowError {
    fn from(err: duckdb::Error) -> Self {
        SalesflowError::Infrastructure(InfrastructureError::from(err))
    }
}

impl From<TransformError> for SalesflowError {
    fn from(err: TransformError) -> Self {
        SalesflowError::Domain(DomainError::Transform(err))
    }
}

impl From<InputSchemaError> for SalesflowError {
    fn from(err: InputSchemaError) -> Self {
        SalesflowError::Domain(DomainError::from(err))
    }
}
