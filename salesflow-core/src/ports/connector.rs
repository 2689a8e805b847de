// salesflow-core/src/ports/connector.rs

// What the stages need from a relational store, without knowing which engine
// sits behind it. The DuckDB adapter is the only implementation today.

use async_trait::async_trait;

use crate::error::SalesflowError;

/// A column as the store describes it (independent of the engine).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnSchema {
    pub name: String,
    pub data_type: String,
    pub is_nullable: bool,
}

impl ColumnSchema {
    pub fn new(name: &str, data_type: &str) -> Self {
        Self {
            name: name.to_string(),
            data_type: data_type.to_string(),
            is_nullable: true,
        }
    }
}

/// A result row with every value rendered as text; `None` is SQL NULL.
pub type TextRow = Vec<Option<String>>;

#[async_trait]
pub trait Connector: Send + Sync {
    async fn execute(&self, query: &str) -> Result<(), SalesflowError>;

    async fn fetch_columns(&self, table_name: &str) -> Result<Vec<ColumnSchema>, SalesflowError>;

    async fn table_exists(&self, table_name: &str) -> Result<bool, SalesflowError>;

    /// Runs a query whose columns are all text (cast in SQL where needed).
    async fn query_rows(&self, query: &str) -> Result<Vec<TextRow>, SalesflowError>;

    /// First column of the first row, as an integer (`COUNT(*)` and friends).
    async fn query_scalar(&self, query: &str) -> Result<i64, SalesflowError>;

    /// Inserts text rows in one transaction, casting each value to its column's type.
    async fn insert_rows(
        &self,
        table_name: &str,
        columns: &[ColumnSchema],
        rows: &[TextRow],
    ) -> Result<usize, SalesflowError>;
}

/// Double-quotes an identifier for use in generated SQL.
pub fn quote_ident(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}
