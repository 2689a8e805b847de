// salesflow-core/src/domain/transform/outlier.rs

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

/// Acceptance interval `[Q1 - k*IQR, Q3 + k*IQR]` computed once over the full cleaned set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct IqrFence {
    pub q1: Decimal,
    pub q3: Decimal,
    pub iqr: Decimal,
    pub lower: Decimal,
    pub upper: Decimal,
}

impl IqrFence {
    /// Returns `None` for an empty sample.
    pub fn from_values(values: &[Decimal], multiplier: Decimal) -> Option<Self> {
        let mut sorted = values.to_vec();
        sorted.sort_unstable();

        let q1 = percentile(&sorted, 1, 4)?;
        let q3 = percentile(&sorted, 3, 4)?;
        let iqr = q3.saturating_sub(q1);
        // A reach past Decimal's range leaves that side of the fence open.
        let reach = multiplier.saturating_mul(iqr);

        Some(Self {
            q1,
            q3,
            iqr,
            lower: q1.saturating_sub(reach),
            upper: q3.saturating_add(reach),
        })
    }

    /// Bounds are inclusive; only values strictly outside are outliers.
    pub fn contains(&self, value: Decimal) -> bool {
        value >= self.lower && value <= self.upper
    }
}

/// Percentile `numerator/denominator` of an ascending slice, linear
/// interpolation between closest ranks: rank `h = p * (n - 1)`, result
/// `x[floor(h)] + (h - floor(h)) * (x[floor(h) + 1] - x[floor(h)])`.
///
/// The rank is split with integer arithmetic so no rounding enters the index.
pub fn percentile(sorted: &[Decimal], numerator: usize, denominator: usize) -> Option<Decimal> {
    if sorted.is_empty() || denominator == 0 || numerator > denominator {
        return None;
    }
    let scaled = numerator * (sorted.len() - 1);
    let lo = scaled / denominator;
    let remainder = scaled % denominator;

    let base = sorted[lo];
    if remainder == 0 {
        return Some(base);
    }
    let next = sorted.get(lo + 1).copied().unwrap_or(base);
    let fraction = Decimal::from(remainder) / Decimal::from(denominator);
    Some(base.saturating_add(fraction.saturating_mul(next.saturating_sub(base))))
}

/// Filtered records, how many were removed, and the fence (if one was computed).
#[derive(Debug, Clone)]
pub struct OutlierOutcome<T> {
    pub records: Vec<T>,
    pub removed: usize,
    pub fence: Option<IqrFence>,
}

/// Drops records whose `value_fn` falls strictly outside the IQR fence.
///
/// With fewer than `min_sample` records the step is skipped: every record is
/// returned unchanged and nothing is reported as removed.
pub fn remove_outliers<T, F>(
    records: Vec<T>,
    value_fn: F,
    multiplier: Decimal,
    min_sample: usize,
) -> OutlierOutcome<T>
where
    F: Fn(&T) -> Decimal,
{
    if records.len() < min_sample {
        info!(
            records = records.len(),
            min_sample, "Sample too small for IQR bounds, outlier removal skipped"
        );
        return OutlierOutcome {
            records,
            removed: 0,
            fence: None,
        };
    }

    let values: Vec<Decimal> = records.iter().map(&value_fn).collect();
    let Some(fence) = IqrFence::from_values(&values, multiplier) else {
        return OutlierOutcome {
            records,
            removed: 0,
            fence: None,
        };
    };

    let before = records.len();
    let kept: Vec<T> = records
        .into_iter()
        .zip(values)
        .filter_map(|(record, value)| {
            if fence.contains(value) {
                Some(record)
            } else {
                debug!(%value, lower = %fence.lower, upper = %fence.upper, "Outlier removed");
                None
            }
        })
        .collect();

    let removed = before - kept.len();
    info!(
        q1 = %fence.q1,
        q3 = %fence.q3,
        lower = %fence.lower,
        upper = %fence.upper,
        removed,
        "IQR outlier removal"
    );

    OutlierOutcome {
        records: kept,
        removed,
        fence: Some(fence),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(v: i64) -> Decimal {
        Decimal::from(v)
    }

    #[test]
    fn test_percentile_linear_interpolation() {
        // numpy.percentile([1, 2, 3, 4], [25, 75]) == [1.75, 3.25]
        let sorted = [d(1), d(2), d(3), d(4)];
        assert_eq!(percentile(&sorted, 1, 4), Some(Decimal::new(175, 2)));
        assert_eq!(percentile(&sorted, 3, 4), Some(Decimal::new(325, 2)));
        assert_eq!(percentile(&sorted, 1, 2), Some(Decimal::new(25, 1)));
    }

    #[test]
    fn test_percentile_exact_rank_and_edges() {
        let sorted = [d(10), d(20), d(30), d(40), d(50)];
        assert_eq!(percentile(&sorted, 1, 4), Some(d(20)));
        assert_eq!(percentile(&sorted, 0, 4), Some(d(10)));
        assert_eq!(percentile(&sorted, 4, 4), Some(d(50)));
        assert_eq!(percentile(&[], 1, 4), None);
        assert_eq!(percentile(&[d(7)], 3, 4), Some(d(7)));
    }

    #[test]
    fn test_fence_bounds() -> anyhow::Result<()> {
        let values = [d(1), d(2), d(3), d(4)];
        let fence =
            IqrFence::from_values(&values, Decimal::new(15, 1)).ok_or(anyhow::anyhow!("no fence"))?;
        assert_eq!(fence.iqr, Decimal::new(15, 1));
        assert_eq!(fence.lower, Decimal::new(-50, 2));
        assert_eq!(fence.upper, Decimal::new(550, 2));
        assert!(fence.contains(Decimal::new(550, 2)));
        assert!(!fence.contains(Decimal::new(551, 2)));
        Ok(())
    }

    #[test]
    fn test_removes_far_value() {
        let values = vec![d(10), d(11), d(12), d(13), d(14), d(1000)];
        let outcome = remove_outliers(values, |v| *v, Decimal::new(15, 1), 4);
        assert_eq!(outcome.removed, 1);
        assert_eq!(outcome.records, vec![d(10), d(11), d(12), d(13), d(14)]);
        assert!(outcome.fence.is_some());
    }

    #[test]
    fn test_small_sample_guard_returns_everything() {
        let values = vec![d(1), d(2), d(1_000_000)];
        let outcome = remove_outliers(values.clone(), |v| *v, Decimal::new(15, 1), 4);
        assert_eq!(outcome.removed, 0);
        assert_eq!(outcome.records, values);
        assert!(outcome.fence.is_none());
    }

    #[test]
    fn test_constant_values_keep_everything() {
        let values = vec![d(5); 8];
        let outcome = remove_outliers(values, |v| *v, Decimal::new(15, 1), 4);
        assert_eq!(outcome.removed, 0);
        assert_eq!(outcome.records.len(), 8);
    }

    #[test]
    fn test_preserves_relative_order() {
        let values = vec![d(14), d(-500), d(10), d(12), d(13), d(11)];
        let outcome = remove_outliers(values, |v| *v, Decimal::new(15, 1), 4);
        assert_eq!(outcome.records, vec![d(14), d(10), d(12), d(13), d(11)]);
    }
}
