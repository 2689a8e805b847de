// salesflow-core/src/domain/transform/aggregate.rs

use rust_decimal::Decimal;
use std::collections::BTreeMap;

use crate::domain::error::TransformError;
use crate::domain::sales::record::{AggregatedRecord, EnrichedRecord, GroupKey};
use crate::domain::transform::money::RoundingMode;

#[derive(Debug, Default)]
struct Accumulator {
    quantity: i64,
    unit_price_sum: Decimal,
    discount_sum: Decimal,
    count: u64,
    gross: Decimal,
    net: Decimal,
}

impl Accumulator {
    /// Adds one record. On overflow the accumulator is left untouched and the
    /// name of the offending sum is returned.
    fn push(&mut self, record: &EnrichedRecord) -> Result<(), &'static str> {
        let quantity = self
            .quantity
            .checked_add(record.quantity)
            .ok_or("total_quantity")?;
        let unit_price_sum = self
            .unit_price_sum
            .checked_add(record.unit_price)
            .ok_or("unit_price")?;
        let discount_sum = self
            .discount_sum
            .checked_add(record.discount)
            .ok_or("discount")?;
        let gross = self
            .gross
            .checked_add(record.gross_revenue)
            .ok_or("total_gross_revenue")?;
        let net = self
            .net
            .checked_add(record.net_revenue)
            .ok_or("total_net_revenue")?;

        *self = Self {
            quantity,
            unit_price_sum,
            discount_sum,
            count: self.count + 1,
            gross,
            net,
        };
        Ok(())
    }

    fn finish(self, key: GroupKey, rounding: RoundingMode) -> AggregatedRecord {
        let count = Decimal::from(self.count);
        AggregatedRecord {
            sale_date: key.sale_date,
            product_name: key.product_name,
            category: key.category,
            region: key.region,
            total_quantity: self.quantity,
            avg_unit_price: rounding.money(self.unit_price_sum / count),
            avg_discount: rounding.rate(self.discount_sum / count),
            transaction_count: self.count,
            // Per-record values are already at money scale; the sums stay exact.
            total_gross_revenue: rounding.money(self.gross),
            total_net_revenue: rounding.money(self.net),
        }
    }
}

/// Groups by `(sale_date, product_name, category, region)`.
///
/// Output is sorted by the group key, so it does not depend on input order.
/// A group sum that leaves its numeric range fails the call.
pub fn aggregate(
    records: &[EnrichedRecord],
    rounding: RoundingMode,
) -> Result<(Vec<AggregatedRecord>, usize), TransformError> {
    let mut groups: BTreeMap<GroupKey, Accumulator> = BTreeMap::new();
    for record in records {
        let key = record.group_key();
        groups.entry(key).or_default().push(record).map_err(|sum| {
            TransformError::ArithmeticOverflow(format!(
                "{} of {} / {} / {}",
                sum, record.sale_date, record.product_name, record.region
            ))
        })?;
    }

    let aggregated: Vec<AggregatedRecord> = groups
        .into_iter()
        .map(|(key, acc)| acc.finish(key, rounding))
        .collect();
    let count = aggregated.len();
    Ok((aggregated, count))
}
