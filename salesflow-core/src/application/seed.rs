// salesflow-core/src/application/seed.rs
//
// USE CASE: fill the source table with reproducible demo sales, dirt included,
// so every cleaning step has something to do.

use chrono::{Duration, NaiveDate};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rust_decimal::Decimal;
use serde::Serialize;
use tracing::{info, instrument};

use crate::error::SalesflowError;
use crate::ports::connector::{ColumnSchema, Connector, TextRow, quote_ident};

const PRODUCTS: [&str; 10] = [
    "Laptop",
    "Mouse",
    "Keyboard",
    "Monitor",
    "Webcam",
    "Headphones",
    "Tablet",
    "Smartphone",
    "Printer",
    "Router",
];
const CATEGORIES: [&str; 4] = ["Electronics", "Accessories", "Computers", "Networking"];
const REGIONS: [&str; 5] = ["North", "South", "East", "West", "Central"];

// Shares of dirty rows, in percent of the requested count.
const NULL_DISCOUNT_PCT: usize = 2;
const DUPLICATE_PCT: usize = 5;
const NULL_REQUIRED_PCT: usize = 3;
const NON_POSITIVE_PCT: usize = 2;
const OUTLIER_PCT: usize = 1;

/// Source table layout. `customer_id` rides along and is ignored downstream.
pub fn source_columns() -> Vec<ColumnSchema> {
    vec![
        ColumnSchema::new("sale_id", "INTEGER"),
        ColumnSchema::new("sale_date", "DATE"),
        ColumnSchema::new("product_name", "VARCHAR"),
        ColumnSchema::new("category", "VARCHAR"),
        ColumnSchema::new("region", "VARCHAR"),
        ColumnSchema::new("quantity", "INTEGER"),
        ColumnSchema::new("unit_price", "DECIMAL(10,2)"),
        ColumnSchema::new("discount", "DECIMAL(4,2)"),
        ColumnSchema::new("customer_id", "INTEGER"),
    ]
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SeedSummary {
    pub table: String,
    pub rows_written: usize,
    pub null_discounts: usize,
    pub duplicates: usize,
    pub null_required: usize,
    pub non_positive_quantities: usize,
    pub outliers: usize,
}

/// Generates `count` rows (plus the duplicates) from `seed`. Same inputs, same rows.
pub fn generate_sales(count: usize, seed: u64) -> (Vec<TextRow>, SeedSummary) {
    let mut rng = StdRng::seed_from_u64(seed);
    let start = NaiveDate::from_ymd_opt(2023, 1, 1).unwrap_or_default();
    let mut summary = SeedSummary::default();

    let mut rows: Vec<TextRow> = Vec::with_capacity(count + count * DUPLICATE_PCT / 100);
    for i in 0..count {
        let date = start + Duration::days(rng.random_range(0..365));
        let quantity: i64 = rng.random_range(1..50);
        let price = Decimal::new(rng.random_range(1_000..=150_000), 2);
        let discount = Decimal::new(rng.random_range(0..=30), 2);

        let mut row: TextRow = vec![
            Some((i + 1).to_string()),
            Some(date.format("%Y-%m-%d").to_string()),
            Some(PRODUCTS[rng.random_range(0..PRODUCTS.len())].to_string()),
            Some(CATEGORIES[rng.random_range(0..CATEGORIES.len())].to_string()),
            Some(REGIONS[rng.random_range(0..REGIONS.len())].to_string()),
            Some(quantity.to_string()),
            Some(price.to_string()),
            Some(discount.to_string()),
            Some(rng.random_range(1000..10_000u32).to_string()),
        ];

        // One kind of dirt per row at most.
        let roll = rng.random_range(0..100);
        if roll < NULL_DISCOUNT_PCT {
            row[7] = None;
            summary.null_discounts += 1;
        } else if roll < NULL_DISCOUNT_PCT + NULL_REQUIRED_PCT {
            // Any of sale_date..unit_price
            row[rng.random_range(1..=6)] = None;
            summary.null_required += 1;
        } else if roll < NULL_DISCOUNT_PCT + NULL_REQUIRED_PCT + NON_POSITIVE_PCT {
            row[5] = Some((-rng.random_range(0..3i64)).to_string());
            summary.non_positive_quantities += 1;
        } else if roll < NULL_DISCOUNT_PCT + NULL_REQUIRED_PCT + NON_POSITIVE_PCT + OUTLIER_PCT {
            row[5] = Some(rng.random_range(200..500i64).to_string());
            row[6] = Some(Decimal::new(rng.random_range(500_000..=2_000_000), 2).to_string());
            summary.outliers += 1;
        }

        rows.push(row);
    }

    let duplicates = count * DUPLICATE_PCT / 100;
    for _ in 0..duplicates {
        if rows.is_empty() {
            break;
        }
        let original = rows[rng.random_range(0..rows.len())].clone();
        rows.push(original);
    }
    summary.duplicates = duplicates.min(rows.len());
    summary.rows_written = rows.len();

    (rows, summary)
}

#[instrument(skip(connector))]
pub async fn seed(
    connector: &dyn Connector,
    table: &str,
    count: usize,
    seed: u64,
) -> Result<SeedSummary, SalesflowError> {
    let columns = source_columns();
    let ddl: Vec<String> = columns
        .iter()
        .map(|c| format!("{} {}", quote_ident(&c.name), c.data_type))
        .collect();
    connector
        .execute(&format!(
            "CREATE OR REPLACE TABLE {} ({})",
            quote_ident(table),
            ddl.join(", ")
        ))
        .await?;

    let (rows, mut summary) = generate_sales(count, seed);
    summary.table = table.to_string();
    let inserted = connector.insert_rows(table, &columns, &rows).await?;

    info!(
        table,
        inserted,
        duplicates = summary.duplicates,
        null_required = summary.null_required,
        non_positive = summary.non_positive_quantities,
        outliers = summary.outliers,
        "Source table seeded"
    );
    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::adapters::duckdb::DuckDBConnector;

    #[test]
    fn test_same_seed_same_rows() {
        let (a, _) = generate_sales(200, 7);
        let (b, _) = generate_sales(200, 7);
        let (c, _) = generate_sales(200, 8);
        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn test_dirt_is_accounted_for() {
        let (rows, summary) = generate_sales(1000, 42);
        assert_eq!(summary.duplicates, 50);
        assert_eq!(rows.len(), 1050);
        assert_eq!(summary.rows_written, 1050);
        assert!(summary.null_required > 0);
        assert!(summary.non_positive_quantities > 0);
        assert!(rows.iter().all(|r| r.len() == source_columns().len()));
    }

    #[tokio::test]
    async fn test_seed_creates_table() -> anyhow::Result<()> {
        let connector = DuckDBConnector::new(":memory:")?;
        let summary = seed(&connector, "sales_data", 100, 1).await?;
        let count = connector
            .query_scalar("SELECT COUNT(*) FROM sales_data")
            .await?;
        assert_eq!(count as usize, summary.rows_written);
        Ok(())
    }
}
