// salesflow-core/src/domain/transform/categorize.rs

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Size bucket of a single sale, by net revenue.
/// Bounds are inclusive-lower / exclusive-upper; variants are declared in ascending order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum SaleCategory {
    Small,
    Medium,
    Large,
    Premium,
}

const MEDIUM_FLOOR: i64 = 100;
const LARGE_FLOOR: i64 = 500;
const PREMIUM_FLOOR: i64 = 1000;

impl SaleCategory {
    pub fn classify(net_revenue: Decimal) -> Self {
        if net_revenue < Decimal::from(MEDIUM_FLOOR) {
            Self::Small
        } else if net_revenue < Decimal::from(LARGE_FLOOR) {
            Self::Medium
        } else if net_revenue < Decimal::from(PREMIUM_FLOOR) {
            Self::Large
        } else {
            Self::Premium
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Small => "Small",
            Self::Medium => "Medium",
            Self::Large => "Large",
            Self::Premium => "Premium",
        }
    }
}

impl fmt::Display for SaleCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
