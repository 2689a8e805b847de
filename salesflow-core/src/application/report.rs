// salesflow-core/src/application/report.rs
//
// USE CASE: headline numbers of the loaded target table.

use rust_decimal::Decimal;
use serde::Serialize;
use tracing::{info, instrument};

use crate::domain::sales::record::parse_decimal;
use crate::error::SalesflowError;
use crate::ports::connector::{Connector, TextRow, quote_ident};

pub const TOP_N: usize = 5;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RankedTotal {
    pub name: String,
    pub net_revenue: Decimal,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Report {
    pub table: String,
    pub rows: usize,
    pub total_gross_revenue: Decimal,
    pub total_net_revenue: Decimal,
    pub min_date: Option<String>,
    pub max_date: Option<String>,
    pub top_products: Vec<RankedTotal>,
    pub top_regions: Vec<RankedTotal>,
}

fn cell(row: &TextRow, i: usize) -> Option<&str> {
    row.get(i).and_then(|v| v.as_deref())
}

fn decimal_cell(row: &TextRow, i: usize) -> Decimal {
    cell(row, i).and_then(parse_decimal).unwrap_or(Decimal::ZERO)
}

async fn top_by(
    connector: &dyn Connector,
    table: &str,
    column: &str,
) -> Result<Vec<RankedTotal>, SalesflowError> {
    let col = quote_ident(column);
    let rows = connector
        .query_rows(&format!(
            "SELECT CAST({col} AS VARCHAR), CAST(SUM(total_net_revenue) AS VARCHAR) \
             FROM {table} GROUP BY {col} \
             ORDER BY SUM(total_net_revenue) DESC, {col} ASC LIMIT {TOP_N}",
            col = col,
            table = quote_ident(table),
            TOP_N = TOP_N
        ))
        .await?;

    Ok(rows
        .iter()
        .map(|r| RankedTotal {
            name: cell(r, 0).unwrap_or("").to_string(),
            net_revenue: decimal_cell(r, 1),
        })
        .collect())
}

#[instrument(skip(connector))]
pub async fn report(connector: &dyn Connector, table: &str) -> Result<Report, SalesflowError> {
    if !connector.table_exists(table).await? {
        return Err(SalesflowError::InternalError(format!(
            "Table '{}' does not exist, run the load stage first",
            table
        )));
    }

    let totals = connector
        .query_rows(&format!(
            "SELECT CAST(COUNT(*) AS VARCHAR), \
                    CAST(COALESCE(SUM(total_gross_revenue), 0) AS VARCHAR), \
                    CAST(COALESCE(SUM(total_net_revenue), 0) AS VARCHAR), \
                    CAST(MIN(sale_date) AS VARCHAR), \
                    CAST(MAX(sale_date) AS VARCHAR) \
             FROM {}",
            quote_ident(table)
        ))
        .await?;
    let head = totals
        .first()
        .ok_or_else(|| SalesflowError::InternalError("Aggregate query returned no row".into()))?;

    let report = Report {
        table: table.to_string(),
        rows: cell(head, 0).and_then(|v| v.parse().ok()).unwrap_or(0),
        total_gross_revenue: decimal_cell(head, 1),
        total_net_revenue: decimal_cell(head, 2),
        min_date: cell(head, 3).map(str::to_string),
        max_date: cell(head, 4).map(str::to_string),
        top_products: top_by(connector, table, "product_name").await?,
        top_regions: top_by(connector, table, "region").await?,
    };

    info!(
        rows = report.rows,
        total_net_revenue = %report.total_net_revenue,
        "Report computed"
    );
    Ok(report)
}
