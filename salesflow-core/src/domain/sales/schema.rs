// salesflow-core/src/domain/sales/schema.rs
//
// Column contract of the input and output tables.

use crate::domain::error::InputSchemaError;
use crate::domain::sales::record::RawSaleRecord;

pub const SALE_ID: &str = "sale_id";
pub const DISCOUNT: &str = "discount";

/// Columns that must exist for the input to be readable at all.
pub const REQUIRED_COLUMNS: [&str; 6] = [
    "sale_date",
    "product_name",
    "category",
    "region",
    "quantity",
    "unit_price",
];

/// Full input header, in the order extractors write it.
pub const INPUT_COLUMNS: [&str; 8] = [
    SALE_ID,
    "sale_date",
    "product_name",
    "category",
    "region",
    "quantity",
    "unit_price",
    DISCOUNT,
];

pub const OUTPUT_COLUMNS: [&str; 10] = [
    "sale_date",
    "product_name",
    "category",
    "region",
    "total_quantity",
    "avg_unit_price",
    "avg_discount",
    "transaction_count",
    "total_gross_revenue",
    "total_net_revenue",
];

/// Header of the full enriched artifact.
pub const ENRICHED_COLUMNS: [&str; 21] = [
    SALE_ID,
    "sale_date",
    "product_name",
    "category",
    "region",
    "quantity",
    "unit_price",
    DISCOUNT,
    "year",
    "month",
    "day",
    "quarter",
    "day_of_week",
    "day_name",
    "gross_revenue",
    "discount_amount",
    "net_revenue",
    "margin",
    "has_discount",
    "is_high_value",
    "sale_category",
];

/// Checks a header (CSV first line or table columns) for the required columns.
/// Matching is case-insensitive and ignores surrounding whitespace.
pub fn check_header<S: AsRef<str>>(columns: &[S]) -> Result<(), InputSchemaError> {
    let present: Vec<String> = columns
        .iter()
        .map(|c| c.as_ref().trim().to_lowercase())
        .collect();

    let missing: Vec<String> = REQUIRED_COLUMNS
        .iter()
        .filter(|required| !present.iter().any(|p| p == *required))
        .map(|c| c.to_string())
        .collect();

    if missing.is_empty() {
        Ok(())
    } else {
        Err(InputSchemaError::MissingColumns(missing))
    }
}

/// Structural checks on an in-memory batch: it must be non-empty and no typed
/// column may be unparseable from top to bottom.
pub fn check_records(records: &[RawSaleRecord]) -> Result<(), InputSchemaError> {
    if records.is_empty() {
        return Err(InputSchemaError::EmptyInput);
    }

    let columns: [(&str, fn(&RawSaleRecord) -> (bool, bool)); 4] = [
        ("sale_date", |r| {
            (r.sale_date.present().is_some(), r.sale_date.is_malformed())
        }),
        ("quantity", |r| {
            (r.quantity.present().is_some(), r.quantity.is_malformed())
        }),
        ("unit_price", |r| {
            (r.unit_price.present().is_some(), r.unit_price.is_malformed())
        }),
        (DISCOUNT, |r| {
            (r.discount.present().is_some(), r.discount.is_malformed())
        }),
    ];

    for (name, tally) in columns {
        let (mut parsed, mut malformed) = (0usize, 0usize);
        for record in records {
            let (ok, bad) = tally(record);
            parsed += usize::from(ok);
            malformed += usize::from(bad);
        }
        if parsed == 0 && malformed > 0 {
            return Err(InputSchemaError::UnparseableColumn {
                column: name.to_string(),
                malformed,
            });
        }
    }

    Ok(())
}
