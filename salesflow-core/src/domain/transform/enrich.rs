// salesflow-core/src/domain/transform/enrich.rs

use chrono::{Datelike, NaiveDate, Weekday};
use rust_decimal::Decimal;

use crate::domain::sales::record::{CleanedRecord, EnrichedRecord};
use crate::domain::transform::categorize::SaleCategory;
use crate::domain::transform::config::TransformConfig;
use crate::domain::transform::money::RoundingMode;
use crate::domain::transform::outlier::percentile;

/// quantity x unit_price at money scale. Shared with the outlier step so both
/// see the same number.
///
/// Saturates instead of overflowing; cleaning already rejects lines whose
/// product leaves the accepted range.
pub fn gross_revenue(record: &CleanedRecord, rounding: RoundingMode) -> Decimal {
    rounding.money(Decimal::from(record.quantity).saturating_mul(record.unit_price))
}

pub fn quarter(month: u32) -> u32 {
    (month - 1) / 3 + 1
}

fn day_name(date: NaiveDate) -> &'static str {
    match date.weekday() {
        Weekday::Mon => "Monday",
        Weekday::Tue => "Tuesday",
        Weekday::Wed => "Wednesday",
        Weekday::Thu => "Thursday",
        Weekday::Fri => "Friday",
        Weekday::Sat => "Saturday",
        Weekday::Sun => "Sunday",
    }
}

/// Adds date parts, revenue metrics and categories. Total over its input:
/// nothing is rejected here.
///
/// `is_high_value` compares each record to the median net revenue of the
/// whole batch, so it is computed in a second pass.
pub fn enrich(records: Vec<CleanedRecord>, config: &TransformConfig) -> Vec<EnrichedRecord> {
    let rounding = config.rounding;

    let mut enriched: Vec<EnrichedRecord> = records
        .into_iter()
        .map(|record| enrich_one(record, config))
        .collect();

    let mut nets: Vec<Decimal> = enriched.iter().map(|r| r.net_revenue).collect();
    nets.sort_unstable();
    if let Some(median) = percentile(&nets, 1, 2) {
        let median = rounding.money(median);
        for record in &mut enriched {
            record.is_high_value = record.net_revenue > median;
        }
    }

    enriched
}

fn enrich_one(record: CleanedRecord, config: &TransformConfig) -> EnrichedRecord {
    let rounding = config.rounding;
    let date = record.sale_date;

    let gross = gross_revenue(&record, rounding);
    let discount_amount = rounding.money(gross.saturating_mul(record.discount));
    // Both operands are already at money scale, so the difference is exact.
    let net = gross.saturating_sub(discount_amount);
    let margin = rounding.money(net.saturating_sub(gross.saturating_mul(config.cost_ratio)));

    EnrichedRecord {
        year: date.year(),
        month: date.month(),
        day: date.day(),
        quarter: quarter(date.month()),
        day_of_week: date.weekday().num_days_from_monday(),
        day_name: day_name(date),

        gross_revenue: gross,
        discount_amount,
        net_revenue: net,
        margin,
        has_discount: discount_amount > Decimal::ZERO,
        is_high_value: false,
        sale_category: SaleCategory::classify(net),

        sale_id: record.sale_id,
        sale_date: record.sale_date,
        product_name: record.product_name,
        category: record.category,
        region: record.region,
        quantity: record.quantity,
        unit_price: record.unit_price,
        discount: record.discount,
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn cleaned(date: (i32, u32, u32), quantity: i64, price: Decimal, discount: Decimal) -> CleanedRecord {
        CleanedRecord {
            sale_id: Some("1".into()),
            sale_date: NaiveDate::from_ymd_opt(date.0, date.1, date.2).unwrap(),
            product_name: "Laptop".into(),
            category: "Computers".into(),
            region: "North".into(),
            quantity,
            unit_price: price,
            discount,
        }
    }

    #[test]
    fn test_quarter_boundaries() {
        assert_eq!(quarter(1), 1);
        assert_eq!(quarter(3), 1);
        assert_eq!(quarter(4), 2);
        assert_eq!(quarter(9), 3);
        assert_eq!(quarter(12), 4);
    }

    #[test]
    fn test_date_parts() {
        // 2023-05-01 was a Monday.
        let out = enrich(
            vec![cleaned((2023, 5, 1), 1, Decimal::from(10), Decimal::ZERO)],
            &TransformConfig::default(),
        );
        let r = &out[0];
        assert_eq!((r.year, r.month, r.day, r.quarter), (2023, 5, 1, 2));
        assert_eq!(r.day_of_week, 0);
        assert_eq!(r.day_name, "Monday");
    }

    #[test]
    fn test_revenue_metrics() {
        // 3 x 33.33 = 99.99 gross, 15% off -> 14.9985 -> 15.00, net 84.99
        let out = enrich(
            vec![cleaned((2023, 1, 1), 3, Decimal::new(3333, 2), Decimal::new(15, 2))],
            &TransformConfig::default(),
        );
        let r = &out[0];
        assert_eq!(r.gross_revenue, Decimal::new(9999, 2));
        assert_eq!(r.discount_amount, Decimal::new(1500, 2));
        assert_eq!(r.net_revenue, Decimal::new(8499, 2));
        assert_eq!(r.net_revenue, r.gross_revenue - r.discount_amount);
        // margin = 84.99 - 99.99 * 0.6 = 84.99 - 59.994 = 24.996 -> 25.00
        assert_eq!(r.margin, Decimal::new(2500, 2));
        assert!(r.has_discount);
        assert_eq!(r.sale_category, SaleCategory::Small);
    }

    #[test]
    fn test_categorization_on_net_revenue_boundary() {
        // gross 125.00, 20% off -> net exactly 100.00
        let out = enrich(
            vec![cleaned((2023, 1, 1), 5, Decimal::from(25), Decimal::new(2, 1))],
            &TransformConfig::default(),
        );
        assert_eq!(out[0].net_revenue, Decimal::from(100));
        assert_eq!(out[0].sale_category, SaleCategory::Medium);
    }

    #[test]
    fn test_tiny_discount_rounding_to_zero_is_not_a_discount() {
        let out = enrich(
            vec![cleaned((2023, 1, 1), 1, Decimal::ONE, Decimal::new(1, 3))],
            &TransformConfig::default(),
        );
        assert_eq!(out[0].discount_amount, Decimal::ZERO);
        assert!(!out[0].has_discount);
    }

    #[test]
    fn test_high_value_flag_against_median() {
        let out = enrich(
            vec![
                cleaned((2023, 1, 1), 1, Decimal::from(10), Decimal::ZERO),
                cleaned((2023, 1, 2), 1, Decimal::from(20), Decimal::ZERO),
                cleaned((2023, 1, 3), 1, Decimal::from(30), Decimal::ZERO),
            ],
            &TransformConfig::default(),
        );
        let flags: Vec<bool> = out.iter().map(|r| r.is_high_value).collect();
        assert_eq!(flags, vec![false, false, true]);
    }

    #[test]
    fn test_empty_input_is_fine() {
        assert!(enrich(vec![], &TransformConfig::default()).is_empty());
    }
}
