// salesflow-core/src/domain/transform/money.rs

use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Scale of every monetary value the engine produces.
pub const MONEY_DP: u32 = 2;
/// Scale of averaged discount rates.
pub const RATE_DP: u32 = 4;

/// Midpoint rule applied whenever a value is brought back to its scale.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RoundingMode {
    #[default]
    HalfEven,
    HalfUp,
}

impl RoundingMode {
    fn strategy(self) -> RoundingStrategy {
        match self {
            Self::HalfEven => RoundingStrategy::MidpointNearestEven,
            Self::HalfUp => RoundingStrategy::MidpointAwayFromZero,
        }
    }

    pub fn money(self, value: Decimal) -> Decimal {
        value.round_dp_with_strategy(MONEY_DP, self.strategy())
    }

    pub fn rate(self, value: Decimal) -> Decimal {
        value.round_dp_with_strategy(RATE_DP, self.strategy())
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::HalfEven => "half_even",
            Self::HalfUp => "half_up",
        }
    }
}

impl fmt::Display for RoundingMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Fixed two-decimal rendering (`10` -> `10.00`).
pub fn format_money(value: Decimal) -> String {
    format!("{:.2}", value)
}

pub fn format_rate(value: Decimal) -> String {
    format!("{:.4}", value)
}
