// salesflow-core/src/application/load.rs
//
// USE CASE: validate the transformed file, then write it to the target table.

use rust_decimal::Decimal;
use serde::Serialize;
use std::collections::HashSet;
use std::path::Path;
use tracing::{info, instrument, warn};

use crate::domain::error::DomainError;
use crate::domain::project::LoadMode;
use crate::domain::sales::record::parse_decimal;
use crate::domain::sales::schema::OUTPUT_COLUMNS;
use crate::error::SalesflowError;
use crate::infrastructure::sales_csv::{CsvTable, read_table_csv};
use crate::ports::connector::{ColumnSchema, Connector, TextRow, quote_ident};

/// Columns that may never be NULL in a loadable file.
const CRITICAL_COLUMNS: [&str; 3] = ["sale_date", "product_name", "total_net_revenue"];
const NUMERIC_COLUMNS: [&str; 5] = [
    "total_quantity",
    "avg_unit_price",
    "transaction_count",
    "total_gross_revenue",
    "total_net_revenue",
];
const INDEXED_COLUMNS: [&str; 4] = ["sale_date", "product_name", "category", "region"];

pub fn target_columns() -> Vec<ColumnSchema> {
    OUTPUT_COLUMNS
        .iter()
        .map(|name| {
            let data_type = match *name {
                "sale_date" => "DATE",
                "product_name" | "category" | "region" => "VARCHAR",
                "total_quantity" | "transaction_count" => "BIGINT",
                "avg_discount" => "DECIMAL(10,4)",
                _ => "DECIMAL(18,2)",
            };
            ColumnSchema::new(name, data_type)
        })
        .collect()
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LoadSummary {
    pub table: String,
    pub mode: LoadMode,
    pub rows_loaded: usize,
    pub rows_in_table: usize,
    pub backup_table: Option<String>,
    pub duplicate_keys: usize,
    pub indexes_created: usize,
}

/// Rows reordered to the target column order, plus what validation noticed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadPlan {
    pub rows: Vec<TextRow>,
    pub duplicate_keys: usize,
}

fn invalid(message: impl Into<String>) -> DomainError {
    DomainError::LoadValidation(message.into())
}

/// Pre-write checks on a transformed file. Duplicate group keys only warn.
pub fn validate_for_load(table: &CsvTable) -> Result<LoadPlan, DomainError> {
    if table.rows.is_empty() {
        return Err(invalid("input contains no rows"));
    }

    let missing: Vec<&str> = OUTPUT_COLUMNS
        .iter()
        .copied()
        .filter(|c| table.column_index(c).is_none())
        .collect();
    if !missing.is_empty() {
        return Err(invalid(format!("missing column(s): {}", missing.join(", "))));
    }

    // Every column is present, so the lookups below cannot miss.
    let positions: Vec<usize> = OUTPUT_COLUMNS
        .iter()
        .filter_map(|c| table.column_index(c))
        .collect();

    let mut rows = Vec::with_capacity(table.rows.len());
    for (line, source) in table.rows.iter().enumerate() {
        let row: TextRow = positions
            .iter()
            .map(|&i| source.get(i).cloned().flatten())
            .collect();

        for (col, value) in OUTPUT_COLUMNS.iter().zip(&row) {
            if CRITICAL_COLUMNS.contains(col) && value.is_none() {
                return Err(invalid(format!("row {}: NULL in '{}'", line + 1, col)));
            }
            if NUMERIC_COLUMNS.contains(col) {
                if let Some(text) = value {
                    let parsed = parse_decimal(text).ok_or_else(|| {
                        invalid(format!("row {}: '{}' is not numeric in '{}'", line + 1, text, col))
                    })?;
                    if parsed < Decimal::ZERO {
                        return Err(invalid(format!("row {}: negative value in '{}'", line + 1, col)));
                    }
                }
            }
        }
        rows.push(row);
    }

    let mut seen = HashSet::with_capacity(rows.len());
    let duplicate_keys = rows
        .iter()
        .filter(|r| !seen.insert(r[..4].to_vec()))
        .count();
    if duplicate_keys > 0 {
        warn!(duplicate_keys, "Duplicate group keys in the transformed file");
    }

    Ok(LoadPlan {
        rows,
        duplicate_keys,
    })
}

#[instrument(skip(connector, input), fields(input = %input.display()))]
pub async fn load(
    connector: &dyn Connector,
    input: &Path,
    table: &str,
    mode: LoadMode,
    backup: bool,
) -> Result<LoadSummary, SalesflowError> {
    // 1. Validation
    let plan = validate_for_load(&read_table_csv(input)?)?;

    // 2. Backup / mode handling
    let exists = connector.table_exists(table).await?;
    if exists && mode == LoadMode::Fail {
        return Err(DomainError::TableExists(table.to_string()).into());
    }

    let mut backup_table = None;
    if exists && backup {
        let name = format!("{}_backup", table);
        connector
            .execute(&format!(
                "CREATE OR REPLACE TABLE {} AS SELECT * FROM {}",
                quote_ident(&name),
                quote_ident(table)
            ))
            .await?;
        info!(backup = %name, "Existing table backed up");
        backup_table = Some(name);
    }

    let columns = target_columns();
    let ddl: Vec<String> = columns
        .iter()
        .map(|c| format!("{} {}", quote_ident(&c.name), c.data_type))
        .collect();
    if mode == LoadMode::Replace {
        // Dropping also removes the indexes of the previous load
        connector
            .execute(&format!("DROP TABLE IF EXISTS {}", quote_ident(table)))
            .await?;
    }
    connector
        .execute(&format!(
            "CREATE TABLE IF NOT EXISTS {} ({})",
            quote_ident(table),
            ddl.join(", ")
        ))
        .await?;

    let before = if exists && mode == LoadMode::Append {
        count_rows(connector, table).await?
    } else {
        0
    };

    // 3. Write
    let rows_loaded = connector.insert_rows(table, &columns, &plan.rows).await?;

    // 4. Indexes
    for column in INDEXED_COLUMNS {
        connector
            .execute(&format!(
                "CREATE INDEX IF NOT EXISTS {} ON {} ({})",
                quote_ident(&format!("idx_{}_{}", table, column)),
                quote_ident(table),
                quote_ident(column)
            ))
            .await?;
    }

    // 5. Verification
    let rows_in_table = count_rows(connector, table).await?;
    if rows_in_table != before + rows_loaded {
        return Err(invalid(format!(
            "row count after load is {}, expected {}",
            rows_in_table,
            before + rows_loaded
        ))
        .into());
    }

    info!(table, mode = %mode, rows_loaded, rows_in_table, "Load finished");
    Ok(LoadSummary {
        table: table.to_string(),
        mode,
        rows_loaded,
        rows_in_table,
        backup_table,
        duplicate_keys: plan.duplicate_keys,
        indexes_created: INDEXED_COLUMNS.len(),
    })
}

async fn count_rows(connector: &dyn Connector, table: &str) -> Result<usize, SalesflowError> {
    let count = connector
        .query_scalar(&format!("SELECT COUNT(*) FROM {}", quote_ident(table)))
        .await?;
    usize::try_from(count)
        .map_err(|_| SalesflowError::InternalError(format!("negative row count {}", count)))
}
