// salesflow-core/src/domain/transform/mod.rs
//
// The transform stage: clean -> outliers -> enrich -> aggregate.
// Pure over its input: no I/O, no clock, no randomness.

pub mod aggregate;
pub mod categorize;
pub mod clean;
pub mod config;
pub mod enrich;
pub mod money;
pub mod outlier;
pub mod summary;

use rust_decimal::Decimal;
use tracing::{info, instrument, warn};
use validator::Validate;

use crate::domain::error::TransformError;
use crate::domain::sales::record::{AggregatedRecord, EnrichedRecord, RawSaleRecord};
use crate::domain::sales::schema;

pub use aggregate::aggregate;
pub use categorize::SaleCategory;
pub use clean::{CleanOutcome, Verdict, clean};
pub use config::TransformConfig;
pub use enrich::{enrich, gross_revenue};
pub use money::RoundingMode;
pub use outlier::{IqrFence, OutlierOutcome, remove_outliers};
pub use summary::{
    Rejection, RejectionCount, RejectionReason, RejectionTally, RunStatus, TransformSummary,
};

/// Everything one invocation produces.
#[derive(Debug, Clone, PartialEq)]
pub struct TransformOutput {
    pub aggregated: Vec<AggregatedRecord>,
    pub enriched: Vec<EnrichedRecord>,
    /// Records dropped during cleaning, step by step. Outliers are only counted.
    pub rejected: Vec<Rejection>,
    pub summary: TransformSummary,
}

fn checked_total(
    name: &str,
    mut values: impl Iterator<Item = Decimal>,
) -> Result<Decimal, TransformError> {
    values
        .try_fold(Decimal::ZERO, Decimal::checked_add)
        .ok_or_else(|| TransformError::ArithmeticOverflow(name.to_string()))
}

/// Runs the four stages in their fixed order.
///
/// Row-level problems become counted rejections. Only a structurally unusable
/// input (`InputSchema`) or a configuration error fails the call. When every
/// record is rejected the call returns `EmptyResult` carrying the summary.
#[instrument(skip_all, fields(records_in = raw.len()))]
pub fn transform(
    raw: &[RawSaleRecord],
    config: &TransformConfig,
) -> Result<TransformOutput, TransformError> {
    config
        .validate()
        .map_err(|e| TransformError::InvalidConfig(e.to_string()))?;
    schema::check_records(raw)?;

    let rounding = config.rounding;
    let cleaned = clean(raw);
    let mut rejections = cleaned.rejections.clone();
    let rejected = cleaned.rejected;

    let filtered = remove_outliers(
        cleaned.records,
        |record| gross_revenue(record, rounding),
        config.iqr_multiplier,
        config.min_outlier_sample,
    );
    rejections.add(RejectionReason::Outlier, filtered.removed);
    let after_outliers = filtered.records.len();

    let enriched = enrich(filtered.records, config);
    let (aggregated, groups_out) = aggregate(&enriched, rounding)?;

    let total_gross_revenue = rounding.money(checked_total(
        "total_gross_revenue",
        aggregated.iter().map(|r| r.total_gross_revenue),
    )?);
    let total_net_revenue = rounding.money(checked_total(
        "total_net_revenue",
        aggregated.iter().map(|r| r.total_net_revenue),
    )?);

    let status = if after_outliers == 0 {
        RunStatus::EmptyResult
    } else {
        RunStatus::Completed
    };

    let summary = TransformSummary {
        status,
        records_in: raw.len(),
        records_after_dedup: cleaned.after_dedup,
        records_after_null_removal: cleaned.after_null_removal,
        records_after_value_validation: cleaned.after_value_validation,
        records_after_outlier_removal: after_outliers,
        groups_out,
        rejections: rejections.to_counts(),
        null_discounts_filled: cleaned.null_discounts_filled,
        iqr_fence: filtered.fence,
        total_gross_revenue,
        total_net_revenue,
        reduction_percentage: summary::reduction_percentage(raw.len(), groups_out),
    };

    info!(
        records_in = summary.records_in,
        after_dedup = summary.records_after_dedup,
        after_null_removal = summary.records_after_null_removal,
        after_value_validation = summary.records_after_value_validation,
        after_outlier_removal = summary.records_after_outlier_removal,
        groups_out = summary.groups_out,
        rejected = summary.total_rejected(),
        "Transform finished"
    );

    if summary.is_empty_result() {
        warn!(
            records_in = summary.records_in,
            "Every record was rejected, nothing to aggregate"
        );
        return Err(TransformError::EmptyResult(Box::new(summary)));
    }

    Ok(TransformOutput {
        aggregated,
        enriched,
        rejected,
        summary,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::error::InputSchemaError;
    use crate::domain::sales::record::SourceRow;

    fn row(id: &str, date: &str, product: &str, quantity: &str, price: &str) -> RawSaleRecord {
        RawSaleRecord::from(SourceRow {
            sale_id: Some(id.into()),
            sale_date: Some(date.into()),
            product_name: Some(product.into()),
            category: Some("Tools".into()),
            region: Some("North".into()),
            quantity: Some(quantity.into()),
            unit_price: Some(price.into()),
            discount: None,
        })
    }

    #[test]
    fn test_small_batch_skips_outliers_and_aggregates() -> anyhow::Result<()> {
        let raw = vec![
            row("1", "2023-05-01", "Widget", "2", "10.00"),
            row("2", "2023-05-01", "widget ", "3", "10.00"),
            row("3", "2023-05-02", "Gadget", "0", "10.00"),
        ];
        let out = transform(&raw, &TransformConfig::default())?;

        assert_eq!(out.summary.status, RunStatus::Completed);
        assert_eq!(out.summary.records_in, 3);
        assert_eq!(out.summary.records_after_value_validation, 2);
        assert_eq!(out.summary.records_after_outlier_removal, 2);
        assert!(out.summary.iqr_fence.is_none());
        assert_eq!(out.summary.groups_out, 1);
        assert_eq!(out.aggregated[0].total_quantity, 5);
        assert_eq!(out.summary.total_net_revenue, Decimal::from(50));
        assert_eq!(out.summary.rejected(RejectionReason::NonPositiveQuantity), 1);
        Ok(())
    }

    #[test]
    fn test_outlier_counted_in_summary() -> anyhow::Result<()> {
        let mut raw: Vec<RawSaleRecord> = (0..8)
            .map(|i| row(&i.to_string(), "2023-05-01", "Widget", "1", &format!("{}", 10 + i)))
            .collect();
        raw.push(row("99", "2023-05-01", "Widget", "100", "5000"));

        let out = transform(&raw, &TransformConfig::default())?;
        assert_eq!(out.summary.rejected(RejectionReason::Outlier), 1);
        assert_eq!(out.summary.records_after_outlier_removal, 8);
        assert!(out.summary.iqr_fence.is_some());
        Ok(())
    }

    #[test]
    fn test_out_of_range_line_is_rejected_not_panicking() -> anyhow::Result<()> {
        let raw = vec![
            row("1", "2023-05-01", "Widget", "9000000000000000000", "100000000000"),
            row("2", "2023-05-01", "Widget", "2", "10.00"),
        ];
        let out = transform(&raw, &TransformConfig::default())?;

        assert_eq!(out.summary.records_in, 2);
        assert_eq!(out.summary.records_after_value_validation, 1);
        assert_eq!(out.summary.rejected(RejectionReason::ValueOutOfRange), 1);
        assert_eq!(out.summary.total_net_revenue, Decimal::from(20));
        assert_eq!(out.rejected.len(), 1);
        assert_eq!(out.rejected[0].record, "1");
        assert_eq!(out.rejected[0].reason, RejectionReason::ValueOutOfRange);
        Ok(())
    }

    #[test]
    fn test_rejected_records_are_listed_step_by_step() -> anyhow::Result<()> {
        let mut missing_region = row("2", "2023-05-01", "Widget", "1", "10");
        missing_region.region = crate::domain::sales::record::Cell::Null;
        let raw = vec![
            row("1", "2023-05-01", "Widget", "0", "10"),
            missing_region,
            row("3", "2023-05-01", "Widget", "1", "10"),
            row("3", "2023-05-01", "Widget", "1", "10"),
        ];
        let out = transform(&raw, &TransformConfig::default())?;

        let listed: Vec<(&str, RejectionReason)> = out
            .rejected
            .iter()
            .map(|r| (r.record.as_str(), r.reason))
            .collect();
        // Each cleaning step finishes before the next starts
        assert_eq!(
            listed,
            vec![
                ("3", RejectionReason::Duplicate),
                ("2", RejectionReason::MissingRequiredField),
                ("1", RejectionReason::NonPositiveQuantity),
            ]
        );
        assert_eq!(out.rejected.len(), out.summary.total_rejected());
        Ok(())
    }

    #[test]
    fn test_all_rejected_is_empty_result() {
        let raw = vec![
            row("1", "2023-05-01", "Widget", "0", "10"),
            row("2", "2023-05-01", "Widget", "-2", "10"),
        ];
        match transform(&raw, &TransformConfig::default()) {
            Err(TransformError::EmptyResult(summary)) => {
                assert_eq!(summary.status, RunStatus::EmptyResult);
                assert_eq!(summary.records_in, 2);
                assert_eq!(summary.groups_out, 0);
                assert_eq!(summary.rejected(RejectionReason::NonPositiveQuantity), 2);
            }
            other => panic!("expected EmptyResult, got {:?}", other.map(|o| o.summary)),
        }
    }

    #[test]
    fn test_empty_input_is_schema_error() {
        assert!(matches!(
            transform(&[], &TransformConfig::default()),
            Err(TransformError::InputSchema(InputSchemaError::EmptyInput))
        ));
    }

    #[test]
    fn test_invalid_config_is_rejected_before_work() {
        let config = TransformConfig {
            min_outlier_sample: 0,
            ..Default::default()
        };
        let raw = vec![row("1", "2023-05-01", "Widget", "1", "10")];
        assert!(matches!(
            transform(&raw, &config),
            Err(TransformError::InvalidConfig(_))
        ));
    }
}
