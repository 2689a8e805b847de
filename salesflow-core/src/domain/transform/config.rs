// salesflow-core/src/domain/transform/config.rs

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use validator::{Validate, ValidationError};

use crate::domain::transform::money::RoundingMode;

/// Tunables of one transform invocation. Passed in explicitly; the engine keeps no global state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
#[serde(default)]
pub struct TransformConfig {
    /// Fence width in IQRs on each side of [Q1, Q3].
    #[validate(custom(function = "validate_positive"))]
    pub iqr_multiplier: Decimal,

    /// Below this many cleaned records, outlier removal is skipped.
    #[validate(range(min = 2, message = "Percentiles need at least two records"))]
    pub min_outlier_sample: usize,

    /// Assumed cost as a share of gross revenue, used for `margin`.
    #[validate(custom(function = "validate_unit_interval"))]
    pub cost_ratio: Decimal,

    pub rounding: RoundingMode,
}

impl Default for TransformConfig {
    fn default() -> Self {
        Self {
            iqr_multiplier: Decimal::new(15, 1),
            min_outlier_sample: 4,
            cost_ratio: Decimal::new(6, 1),
            rounding: RoundingMode::HalfEven,
        }
    }
}

fn validate_positive(value: &Decimal) -> Result<(), ValidationError> {
    if value.is_sign_positive() && !value.is_zero() {
        Ok(())
    } else {
        Err(ValidationError::new("must_be_positive"))
    }
}

fn validate_unit_interval(value: &Decimal) -> Result<(), ValidationError> {
    if *value >= Decimal::ZERO && *value <= Decimal::ONE {
        Ok(())
    } else {
        Err(ValidationError::new("must_be_between_0_and_1"))
    }
}
