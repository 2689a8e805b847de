// salesflow-core/src/domain/sales/record.rs

use chrono::{NaiveDate, NaiveDateTime};
use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

use crate::domain::transform::categorize::SaleCategory;

// Tokens the upstream extractors emit for missing values.
const NULL_TOKENS: [&str; 7] = ["null", "NULL", "NaN", "nan", "None", "NA", "N/A"];

/// One field of an externally read row, after a single typed parse.
///
/// `Malformed` keeps the offending text verbatim so two rows carrying the
/// same garbage still compare as exact duplicates.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Cell<T> {
    Present(T),
    Null,
    Malformed(String),
}

impl<T> Cell<T> {
    pub fn parse_with<F>(raw: Option<&str>, parse: F) -> Self
    where
        F: FnOnce(&str) -> Option<T>,
    {
        let Some(text) = raw else {
            return Cell::Null;
        };
        let trimmed = text.trim();
        if trimmed.is_empty() || NULL_TOKENS.contains(&trimmed) {
            return Cell::Null;
        }
        match parse(trimmed) {
            Some(value) => Cell::Present(value),
            None => Cell::Malformed(text.to_string()),
        }
    }

    pub fn present(&self) -> Option<&T> {
        match self {
            Cell::Present(value) => Some(value),
            _ => None,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Cell::Null)
    }

    pub fn is_malformed(&self) -> bool {
        matches!(self, Cell::Malformed(_))
    }
}

impl Cell<String> {
    /// Text cells keep the untrimmed value; only emptiness is judged on the trimmed form.
    pub fn text(raw: Option<&str>) -> Self {
        match raw {
            Some(text) if !text.trim().is_empty() && !NULL_TOKENS.contains(&text.trim()) => {
                Cell::Present(text.to_string())
            }
            _ => Cell::Null,
        }
    }
}

/// A row as handed over by a reader (CSV file or source table), every value still text.
///
/// Missing optional columns deserialize to `None`; unknown columns are ignored.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct SourceRow {
    #[serde(default)]
    pub sale_id: Option<String>,
    pub sale_date: Option<String>,
    pub product_name: Option<String>,
    pub category: Option<String>,
    pub region: Option<String>,
    pub quantity: Option<String>,
    pub unit_price: Option<String>,
    #[serde(default)]
    pub discount: Option<String>,
}

/// One transaction line as it arrives at the engine. No invariant holds yet.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RawSaleRecord {
    pub sale_id: Cell<String>,
    pub sale_date: Cell<NaiveDate>,
    pub product_name: Cell<String>,
    pub category: Cell<String>,
    pub region: Cell<String>,
    pub quantity: Cell<i64>,
    pub unit_price: Cell<Decimal>,
    pub discount: Cell<Decimal>,
    /// Set by the reader when the row itself is unusable (field count, encoding).
    pub defect: Option<String>,
}

impl From<&SourceRow> for RawSaleRecord {
    fn from(row: &SourceRow) -> Self {
        Self {
            sale_id: Cell::text(row.sale_id.as_deref()),
            sale_date: Cell::parse_with(row.sale_date.as_deref(), parse_date),
            product_name: Cell::text(row.product_name.as_deref()),
            category: Cell::text(row.category.as_deref()),
            region: Cell::text(row.region.as_deref()),
            quantity: Cell::parse_with(row.quantity.as_deref(), parse_quantity),
            unit_price: Cell::parse_with(row.unit_price.as_deref(), parse_decimal),
            discount: Cell::parse_with(row.discount.as_deref(), parse_decimal),
            defect: None,
        }
    }
}

impl From<SourceRow> for RawSaleRecord {
    fn from(row: SourceRow) -> Self {
        Self::from(&row)
    }
}

impl RawSaleRecord {
    pub fn with_defect(mut self, defect: impl Into<String>) -> Self {
        self.defect = Some(defect.into());
        self
    }

    /// Label used in logs and rejection details.
    pub fn label(&self) -> String {
        match &self.sale_id {
            Cell::Present(id) => id.trim().to_string(),
            _ => "<no id>".to_string(),
        }
    }
}

/// Accepts plain dates and the datetime renderings upstream tools tend to write.
pub fn parse_date(text: &str) -> Option<NaiveDate> {
    if let Ok(date) = NaiveDate::parse_from_str(text, "%Y-%m-%d") {
        return Some(date);
    }
    ["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M:%S%.f"]
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(text, fmt).ok())
        .map(|dt| dt.date())
}

/// Integers, plus integral decimals such as `3.0` (float columns with nulls render that way).
pub fn parse_quantity(text: &str) -> Option<i64> {
    if let Ok(value) = text.parse::<i64>() {
        return Some(value);
    }
    let value = parse_decimal(text)?;
    if value.fract().is_zero() {
        value.to_i64()
    } else {
        None
    }
}

pub fn parse_decimal(text: &str) -> Option<Decimal> {
    Decimal::from_str(text)
        .or_else(|_| Decimal::from_scientific(text))
        .ok()
}

/// A record that survived deduplication, null elimination, value validation
/// and outlier removal. Text fields are normalized.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CleanedRecord {
    pub sale_id: Option<String>,
    pub sale_date: NaiveDate,
    pub product_name: String,
    pub category: String,
    pub region: String,
    pub quantity: i64,
    pub unit_price: Decimal,
    pub discount: Decimal,
}

/// A cleaned record plus every derived field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EnrichedRecord {
    pub sale_id: Option<String>,
    pub sale_date: NaiveDate,
    pub product_name: String,
    pub category: String,
    pub region: String,
    pub quantity: i64,
    pub unit_price: Decimal,
    pub discount: Decimal,

    pub year: i32,
    pub month: u32,
    pub day: u32,
    pub quarter: u32,
    pub day_of_week: u32,
    pub day_name: &'static str,

    pub gross_revenue: Decimal,
    pub discount_amount: Decimal,
    pub net_revenue: Decimal,
    pub margin: Decimal,
    pub has_discount: bool,
    pub is_high_value: bool,
    pub sale_category: SaleCategory,
}

impl EnrichedRecord {
    pub fn group_key(&self) -> GroupKey {
        GroupKey {
            sale_date: self.sale_date,
            product_name: self.product_name.clone(),
            category: self.category.clone(),
            region: self.region.clone(),
        }
    }
}

/// (sale_date, product_name, category, region). Field order is the output sort order.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct GroupKey {
    pub sale_date: NaiveDate,
    pub product_name: String,
    pub category: String,
    pub region: String,
}

/// One output row per distinct group key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AggregatedRecord {
    pub sale_date: NaiveDate,
    pub product_name: String,
    pub category: String,
    pub region: String,
    pub total_quantity: i64,
    pub avg_unit_price: Decimal,
    pub avg_discount: Decimal,
    pub transaction_count: u64,
    pub total_gross_revenue: Decimal,
    pub total_net_revenue: Decimal,
}
