// salesflow-core/src/domain/error.rs

use miette::Diagnostic;
use thiserror::Error;

use crate::domain::transform::summary::TransformSummary;

/// The input cannot be processed at all. Always fatal, nothing is written.
#[derive(Error, Debug, Diagnostic, PartialEq)]
pub enum InputSchemaError {
    #[error("Missing required column(s): {}", .0.join(", "))]
    #[diagnostic(
        code(salesflow::domain::input_schema::missing_columns),
        help("The input header must contain sale_date, product_name, category, region, quantity and unit_price.")
    )]
    MissingColumns(Vec<String>),

    #[error("Input contains no records")]
    #[diagnostic(code(salesflow::domain::input_schema::empty))]
    EmptyInput,

    #[error("Column '{column}' could not be parsed in any record ({malformed} malformed values)")]
    #[diagnostic(
        code(salesflow::domain::input_schema::unparseable_column),
        help("Check the column's format: dates are YYYY-MM-DD, numbers use '.' as decimal separator.")
    )]
    UnparseableColumn { column: String, malformed: usize },

    #[error("Input is unreadable: {0}")]
    #[diagnostic(code(salesflow::domain::input_schema::unreadable))]
    Unreadable(String),
}

/// A single value that cleaning cannot interpret. Never raised: it becomes a
/// counted rejection of the record that carries it.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Unparseable {field}: '{raw}'")]
pub struct InputValueError {
    pub field: &'static str,
    pub raw: String,
}

#[derive(Error, Debug, Diagnostic)]
pub enum TransformError {
    #[error(transparent)]
    #[diagnostic(transparent)]
    InputSchema(#[from] InputSchemaError),

    #[error(
        "All {} input records were rejected; nothing to aggregate",
        .0.records_in
    )]
    #[diagnostic(
        code(salesflow::domain::empty_result),
        help("Inspect the summary's rejection counts to see which stage dropped the records.")
    )]
    EmptyResult(Box<TransformSummary>),

    #[error("Invalid transform configuration: {0}")]
    #[diagnostic(code(salesflow::domain::config))]
    InvalidConfig(String),

    #[error("Arithmetic overflow while summing {0}")]
    #[diagnostic(
        code(salesflow::domain::overflow),
        help("Totals exceed the supported range; split the input into smaller batches.")
    )]
    ArithmeticOverflow(String),
}

#[derive(Error, Debug, Diagnostic)]
pub enum DomainError {
    #[error(transparent)]
    #[diagnostic(transparent)]
    Transform(#[from] TransformError),

    #[error("Load validation failed: {0}")]
    #[diagnostic(
        code(salesflow::domain::load_validation),
        help("The transformed file is inconsistent; re-run the transform stage.")
    )]
    LoadValidation(String),

    #[error("Table '{0}' already exists")]
    #[diagnostic(
        code(salesflow::domain::table_exists),
        help("Use load mode 'replace' or 'append', or drop the table first.")
    )]
    TableExists(String),
}

impl From<InputSchemaError> for DomainError {
    fn from(err: InputSchemaError) -> Self {
        DomainError::Transform(TransformError::InputSchema(err))
    }
}
