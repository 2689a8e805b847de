// salesflow-core/src/domain/transform/clean.rs
//
// Deduplication, null handling, value validation and text normalization.
// Malformed records are rejected and counted here; nothing in this module fails.

use chrono::NaiveDate;
use regex::Regex;
use rust_decimal::Decimal;
use std::collections::HashSet;
use std::sync::OnceLock;
use tracing::debug;

use crate::domain::error::InputValueError;
use crate::domain::sales::record::{Cell, CleanedRecord, RawSaleRecord};
use crate::domain::transform::summary::{Rejection, RejectionReason, RejectionTally};

/// Largest quantity a single line may carry.
pub const MAX_QUANTITY: i64 = 1_000_000_000;

/// Largest unit price, discount, gross or discount amount a single line may carry.
/// Sums of such values over any in-memory batch stay far inside `Decimal`.
pub fn max_amount() -> Decimal {
    Decimal::from(1_000_000_000_000_000_i64)
}

/// Outcome of screening one record at one step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Verdict<T> {
    Kept(T),
    Rejected(Rejection),
}

/// Cleaned records plus the counters each step produced.
#[derive(Debug, Clone, Default)]
pub struct CleanOutcome {
    pub records: Vec<CleanedRecord>,
    pub after_dedup: usize,
    pub after_null_removal: usize,
    pub after_value_validation: usize,
    pub null_discounts_filled: usize,
    pub rejections: RejectionTally,
    pub rejected: Vec<Rejection>,
}

/// A record whose required fields are all present and parsed, text not yet normalized.
#[derive(Debug, Clone)]
struct Complete {
    sale_id: Option<String>,
    sale_date: NaiveDate,
    product_name: String,
    category: String,
    region: String,
    quantity: i64,
    unit_price: Decimal,
    discount: Decimal,
}

/// Runs the four cleaning steps in order. Output keeps the relative order of surviving inputs.
pub fn clean(raw_records: &[RawSaleRecord]) -> CleanOutcome {
    let mut outcome = CleanOutcome::default();

    // 1. Exact duplicates: first occurrence wins.
    let mut seen: HashSet<&RawSaleRecord> = HashSet::with_capacity(raw_records.len());
    let mut unique: Vec<&RawSaleRecord> = Vec::with_capacity(raw_records.len());
    for record in raw_records {
        if seen.insert(record) {
            unique.push(record);
        } else {
            reject(
                &mut outcome,
                Rejection {
                    record: record.label(),
                    reason: RejectionReason::Duplicate,
                    detail: "exact duplicate of an earlier record".to_string(),
                },
            );
        }
    }
    outcome.after_dedup = unique.len();

    // 2. Nulls and unparseable values.
    let mut complete = Vec::with_capacity(unique.len());
    for record in unique {
        match screen_required(record) {
            Verdict::Kept(c) => {
                if record.discount.is_null() {
                    outcome.null_discounts_filled += 1;
                }
                complete.push(c);
            }
            Verdict::Rejected(r) => reject(&mut outcome, r),
        }
    }
    outcome.after_null_removal = complete.len();

    // 3. Value ranges.
    let mut valid = Vec::with_capacity(complete.len());
    for record in complete {
        match screen_values(record) {
            Verdict::Kept(c) => valid.push(c),
            Verdict::Rejected(r) => reject(&mut outcome, r),
        }
    }
    outcome.after_value_validation = valid.len();

    // 4. Text normalization.
    outcome.records = valid.into_iter().map(normalize).collect();

    debug!(
        after_dedup = outcome.after_dedup,
        after_null_removal = outcome.after_null_removal,
        after_value_validation = outcome.after_value_validation,
        "Cleaning finished"
    );

    outcome
}

fn reject(outcome: &mut CleanOutcome, rejection: Rejection) {
    debug!(record = %rejection.record, reason = %rejection.reason, "{}", rejection.detail);
    outcome.rejections.record(rejection.reason);
    outcome.rejected.push(rejection);
}

fn screen_required(record: &RawSaleRecord) -> Verdict<Complete> {
    if let Some(defect) = &record.defect {
        return Verdict::Rejected(Rejection {
            record: record.label(),
            reason: RejectionReason::MalformedRow,
            detail: defect.clone(),
        });
    }

    let missing: Vec<&str> = [
        ("sale_date", record.sale_date.is_null()),
        ("product_name", record.product_name.is_null()),
        ("category", record.category.is_null()),
        ("region", record.region.is_null()),
        ("quantity", record.quantity.is_null()),
        ("unit_price", record.unit_price.is_null()),
    ]
    .into_iter()
    .filter_map(|(name, is_null)| is_null.then_some(name))
    .collect();

    if !missing.is_empty() {
        return Verdict::Rejected(Rejection {
            record: record.label(),
            reason: RejectionReason::MissingRequiredField,
            detail: format!("null in {}", missing.join(", ")),
        });
    }

    match parse_required(record) {
        Ok(complete) => Verdict::Kept(complete),
        Err(err) => Verdict::Rejected(Rejection {
            record: record.label(),
            reason: RejectionReason::UnparseableValue,
            detail: err.to_string(),
        }),
    }
}

fn parse_required(record: &RawSaleRecord) -> Result<Complete, InputValueError> {
    Ok(Complete {
        sale_id: record.sale_id.present().cloned(),
        sale_date: take("sale_date", &record.sale_date)?,
        product_name: take("product_name", &record.product_name)?,
        category: take("category", &record.category)?,
        region: take("region", &record.region)?,
        quantity: take("quantity", &record.quantity)?,
        unit_price: take("unit_price", &record.unit_price)?,
        discount: match &record.discount {
            Cell::Null => Decimal::ZERO,
            other => take("discount", other)?,
        },
    })
}

fn take<T: Clone>(field: &'static str, cell: &Cell<T>) -> Result<T, InputValueError> {
    match cell {
        Cell::Present(value) => Ok(value.clone()),
        Cell::Malformed(raw) => Err(InputValueError {
            field,
            raw: raw.clone(),
        }),
        Cell::Null => Err(InputValueError {
            field,
            raw: String::new(),
        }),
    }
}

fn screen_values(record: Complete) -> Verdict<Complete> {
    let label = record.sale_id.clone().unwrap_or_else(|| "<no id>".to_string());
    let failure = if record.quantity <= 0 {
        Some((
            RejectionReason::NonPositiveQuantity,
            format!("quantity {} <= 0", record.quantity),
        ))
    } else if record.unit_price <= Decimal::ZERO {
        Some((
            RejectionReason::NonPositiveUnitPrice,
            format!("unit_price {} <= 0", record.unit_price),
        ))
    } else if record.discount < Decimal::ZERO {
        Some((
            RejectionReason::NegativeDiscount,
            format!("discount {} < 0", record.discount),
        ))
    } else {
        out_of_range(&record).map(|detail| (RejectionReason::ValueOutOfRange, detail))
    };

    match failure {
        None => Verdict::Kept(record),
        Some((reason, detail)) => Verdict::Rejected(Rejection {
            record: label,
            reason,
            detail,
        }),
    }
}

/// Bounds every per-line product the enrich step computes, so no later sum can overflow.
fn out_of_range(record: &Complete) -> Option<String> {
    let max = max_amount();
    if record.quantity > MAX_QUANTITY {
        return Some(format!("quantity {} > {}", record.quantity, MAX_QUANTITY));
    }
    if record.unit_price > max {
        return Some(format!("unit_price {} > {}", record.unit_price, max));
    }
    if record.discount > max {
        return Some(format!("discount {} > {}", record.discount, max));
    }
    let gross = Decimal::from(record.quantity)
        .checked_mul(record.unit_price)
        .filter(|gross| *gross <= max);
    let Some(gross) = gross else {
        return Some(format!(
            "gross revenue {} x {} exceeds {}",
            record.quantity, record.unit_price, max
        ));
    };
    match gross.checked_mul(record.discount) {
        Some(amount) if amount <= max => None,
        _ => Some(format!(
            "discount amount {} x {} exceeds {}",
            gross, record.discount, max
        )),
    }
}

fn normalize(record: Complete) -> CleanedRecord {
    CleanedRecord {
        sale_id: record.sale_id.map(|id| id.trim().to_string()),
        sale_date: record.sale_date,
        product_name: normalize_text(&record.product_name),
        category: normalize_text(&record.category),
        region: normalize_text(&record.region),
        quantity: record.quantity,
        unit_price: record.unit_price,
        discount: record.discount,
    }
}

fn re_whitespace() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"\s+").unwrap_or_else(|_| {
            // Hardcoded pattern, never taken
            Regex::new("$^").unwrap_or_else(|_| unreachable!())
        })
    })
}

/// Trims, collapses inner whitespace and title-cases: a letter is upper-cased
/// when it does not follow another letter (`"  usb-c   HUB"` -> `"Usb-C Hub"`).
pub fn normalize_text(text: &str) -> String {
    let collapsed = re_whitespace().replace_all(text.trim(), " ");
    let mut out = String::with_capacity(collapsed.len());
    let mut prev_alpha = false;
    for ch in collapsed.chars() {
        if ch.is_alphabetic() {
            if prev_alpha {
                out.extend(ch.to_lowercase());
            } else {
                out.extend(ch.to_uppercase());
            }
            prev_alpha = true;
        } else {
            out.push(ch);
            prev_alpha = false;
        }
    }
    out
}
