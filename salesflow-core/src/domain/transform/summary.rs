// salesflow-core/src/domain/transform/summary.rs

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

use crate::domain::transform::outlier::IqrFence;

/// Why a record was dropped. Declared in pipeline order, which is also the report order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RejectionReason {
    Duplicate,
    /// Row shape or encoding unusable: wrong field count, invalid UTF-8.
    MalformedRow,
    MissingRequiredField,
    UnparseableValue,
    NonPositiveQuantity,
    NonPositiveUnitPrice,
    NegativeDiscount,
    /// Parsed fine but too large for revenue arithmetic.
    ValueOutOfRange,
    Outlier,
}

impl RejectionReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Duplicate => "duplicate",
            Self::MalformedRow => "malformed_row",
            Self::MissingRequiredField => "missing_required_field",
            Self::UnparseableValue => "unparseable_value",
            Self::NonPositiveQuantity => "non_positive_quantity",
            Self::NonPositiveUnitPrice => "non_positive_unit_price",
            Self::NegativeDiscount => "negative_discount",
            Self::ValueOutOfRange => "value_out_of_range",
            Self::Outlier => "outlier",
        }
    }
}

impl fmt::Display for RejectionReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A dropped record with the reason it was dropped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rejection {
    pub record: String,
    pub reason: RejectionReason,
    pub detail: String,
}

/// Per-reason counters, iterated in pipeline order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RejectionTally(BTreeMap<RejectionReason, usize>);

impl RejectionTally {
    pub fn record(&mut self, reason: RejectionReason) {
        *self.0.entry(reason).or_insert(0) += 1;
    }

    pub fn add(&mut self, reason: RejectionReason, count: usize) {
        if count > 0 {
            *self.0.entry(reason).or_insert(0) += count;
        }
    }

    pub fn get(&self, reason: RejectionReason) -> usize {
        self.0.get(&reason).copied().unwrap_or(0)
    }

    pub fn total(&self) -> usize {
        self.0.values().sum()
    }

    pub fn to_counts(&self) -> Vec<RejectionCount> {
        self.0
            .iter()
            .map(|(reason, count)| RejectionCount {
                reason: *reason,
                count: *count,
            })
            .collect()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RejectionCount {
    pub reason: RejectionReason,
    pub count: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunStatus {
    Completed,
    EmptyResult,
}

/// What happened during one transform invocation. Built fresh each time; the
/// engine never persists it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransformSummary {
    pub status: RunStatus,

    // Stage counters, monotonically non-increasing.
    pub records_in: usize,
    pub records_after_dedup: usize,
    pub records_after_null_removal: usize,
    pub records_after_value_validation: usize,
    pub records_after_outlier_removal: usize,
    pub groups_out: usize,

    pub rejections: Vec<RejectionCount>,
    /// Null discounts coerced to 0 (not a rejection).
    pub null_discounts_filled: usize,
    /// Absent when the small-sample guard skipped outlier removal.
    pub iqr_fence: Option<IqrFence>,

    pub total_gross_revenue: Decimal,
    pub total_net_revenue: Decimal,
    /// Share of input rows that did not survive as output rows (records_in -> groups_out).
    pub reduction_percentage: Decimal,
}

impl TransformSummary {
    pub fn rejected(&self, reason: RejectionReason) -> usize {
        self.rejections
            .iter()
            .find(|r| r.reason == reason)
            .map(|r| r.count)
            .unwrap_or(0)
    }

    pub fn total_rejected(&self) -> usize {
        self.rejections.iter().map(|r| r.count).sum()
    }

    pub fn is_empty_result(&self) -> bool {
        self.status == RunStatus::EmptyResult
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}

/// `(before - after) / before * 100`, two decimals, 0 when `before` is 0.
pub fn reduction_percentage(before: usize, after: usize) -> Decimal {
    if before == 0 {
        return Decimal::ZERO;
    }
    let dropped = Decimal::from(before.saturating_sub(after));
    (dropped * Decimal::ONE_HUNDRED / Decimal::from(before)).round_dp(2)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tally_orders_by_pipeline_stage() {
        let mut tally = RejectionTally::default();
        tally.record(RejectionReason::Outlier);
        tally.record(RejectionReason::Duplicate);
        tally.add(RejectionReason::NonPositiveQuantity, 3);
        tally.add(RejectionReason::NegativeDiscount, 0);

        let counts = tally.to_counts();
        let reasons: Vec<_> = counts.iter().map(|c| c.reason).collect();
        assert_eq!(
            reasons,
            vec![
                RejectionReason::Duplicate,
                RejectionReason::NonPositiveQuantity,
                RejectionReason::Outlier
            ]
        );
        assert_eq!(tally.total(), 5);
        assert_eq!(tally.get(RejectionReason::NegativeDiscount), 0);
    }

    #[test]
    fn test_row_and_range_reasons_sit_in_their_steps() {
        let mut tally = RejectionTally::default();
        tally.record(RejectionReason::Outlier);
        tally.record(RejectionReason::ValueOutOfRange);
        tally.record(RejectionReason::MissingRequiredField);
        tally.record(RejectionReason::MalformedRow);

        let names: Vec<&str> = tally.to_counts().iter().map(|c| c.reason.as_str()).collect();
        assert_eq!(
            names,
            vec!["malformed_row", "missing_required_field", "value_out_of_range", "outlier"]
        );
    }

    #[test]
    fn test_reduction_percentage() {
        assert_eq!(reduction_percentage(1000, 250), Decimal::from(75));
        assert_eq!(reduction_percentage(3, 2), Decimal::new(3333, 2));
        assert_eq!(reduction_percentage(0, 0), Decimal::ZERO);
    }

    #[test]
    fn test_reason_serializes_snake_case() -> anyhow::Result<()> {
        let json = serde_json::to_string(&RejectionCount {
            reason: RejectionReason::NonPositiveUnitPrice,
            count: 2,
        })?;
        assert_eq!(json, r#"{"reason":"non_positive_unit_price","count":2}"#);
        Ok(())
    }
}
