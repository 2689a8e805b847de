// salesflow-core/src/application/extract.rs
//
// USE CASE: copy the source table to `extracted_data.csv`, every value as text.

use serde::Serialize;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tracing::{info, instrument, warn};

use crate::domain::error::InputSchemaError;
use crate::domain::sales::record::parse_date;
use crate::domain::sales::schema::{self, INPUT_COLUMNS};
use crate::error::SalesflowError;
use crate::infrastructure::sales_csv::write_extracted_csv;
use crate::ports::connector::{Connector, TextRow, quote_ident};

pub const EXTRACTED_FILE: &str = "extracted_data.csv";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExtractSummary {
    pub table: String,
    pub rows: usize,
    pub columns: usize,
    pub min_date: Option<String>,
    pub max_date: Option<String>,
    pub null_cells: usize,
    pub output: PathBuf,
}

/// Builds the SELECT list in input-column order. Columns the table lacks
/// (only `sale_id` and `discount` may be absent) come back as NULL.
fn select_list(actual: &HashMap<String, String>) -> String {
    INPUT_COLUMNS
        .iter()
        .map(|wanted| match actual.get(*wanted) {
            Some(real) => format!("CAST({} AS VARCHAR) AS {}", quote_ident(real), wanted),
            None => format!("CAST(NULL AS VARCHAR) AS {}", wanted),
        })
        .collect::<Vec<_>>()
        .join(", ")
}

#[instrument(skip(connector, output_dir), fields(output_dir = %output_dir.display()))]
pub async fn extract(
    connector: &dyn Connector,
    table: &str,
    output_dir: &Path,
) -> Result<ExtractSummary, SalesflowError> {
    if !connector.table_exists(table).await? {
        return Err(InputSchemaError::Unreadable(format!("source table '{}' does not exist", table)).into());
    }

    // 1. Schema check, case-insensitive
    let columns = connector.fetch_columns(table).await?;
    let actual: HashMap<String, String> = columns
        .iter()
        .map(|c| (c.name.to_lowercase(), c.name.clone()))
        .collect();
    let names: Vec<&str> = columns.iter().map(|c| c.name.as_str()).collect();
    schema::check_header(&names)?;
    for optional in [schema::SALE_ID, schema::DISCOUNT] {
        if !actual.contains_key(optional) {
            warn!(column = optional, "Optional column missing from source table");
        }
    }

    // 2. Rows
    let rows: Vec<TextRow> = connector
        .query_rows(&format!(
            "SELECT {} FROM {}",
            select_list(&actual),
            quote_ident(table)
        ))
        .await?;
    if rows.is_empty() {
        return Err(InputSchemaError::EmptyInput.into());
    }

    // 3. File
    let output = output_dir.join(EXTRACTED_FILE);
    write_extracted_csv(&output, &rows)?;

    let summary = summarize(table, &rows, output);
    info!(
        rows = summary.rows,
        min_date = ?summary.min_date,
        max_date = ?summary.max_date,
        null_cells = summary.null_cells,
        "Extraction finished"
    );
    Ok(summary)
}

fn summarize(table: &str, rows: &[TextRow], output: PathBuf) -> ExtractSummary {
    let date_idx = INPUT_COLUMNS
        .iter()
        .position(|c| *c == "sale_date")
        .unwrap_or(1);

    let dates: Vec<_> = rows
        .iter()
        .filter_map(|r| r.get(date_idx).and_then(|v| v.as_deref()).and_then(parse_date))
        .collect();

    ExtractSummary {
        table: table.to_string(),
        rows: rows.len(),
        columns: INPUT_COLUMNS.len(),
        min_date: dates.iter().min().map(|d| d.to_string()),
        max_date: dates.iter().max().map(|d| d.to_string()),
        null_cells: rows.iter().flatten().filter(|v| v.is_none()).count(),
        output,
    }
}
