//! Rounding of quantities to an asset accuracy
//!
//! Values are first rounded half-up at a wider intermediate scale and only then
//! brought to the target accuracy. The intermediate pass absorbs conversion
//! noise far below the last kept digit so it cannot flip that digit.
//!
//! Up/down are *away from zero* / *toward zero*, not ceiling/floor: callers
//! round up amounts charged by the exchange and round down amounts credited to
//! a client, for either sign.

use rust_decimal::{Decimal, RoundingStrategy};

use super::{IntoDecimal, MAX_DECIMAL_SCALE};
use crate::error::{Error, Result};

/// Extra digits kept by the intermediate half-up pass of up/down rounding
pub const ROUNDING_CUSHION: u32 = 10;

/// Upper bound of the intermediate scale of up/down rounding
pub const MAX_INTERMEDIATE_SCALE: u32 = 16;

/// Extra digits kept by the intermediate pass of half-up rounding
pub const HALF_UP_CUSHION: u32 = 8;

/// Working scale of [`divide_with_max_scale`]
pub const MAX_SCALE_DECIMAL_OPERATIONS: u32 = MAX_DECIMAL_SCALE;

/// Working scales used by the rounding functions
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RoundingConfig {
    /// Digits added to the accuracy for the intermediate pass of up/down rounding
    pub cushion: u32,
    /// Cap on the intermediate scale of up/down rounding
    pub max_intermediate_scale: u32,
    /// Digits added to the accuracy for the intermediate pass of half-up rounding
    pub half_up_cushion: u32,
    /// Scale of division results
    pub division_scale: u32,
}

impl Default for RoundingConfig {
    fn default() -> Self {
        Self::DEFAULT
    }
}

impl RoundingConfig {
    pub const DEFAULT: RoundingConfig = RoundingConfig {
        cushion: ROUNDING_CUSHION,
        max_intermediate_scale: MAX_INTERMEDIATE_SCALE,
        half_up_cushion: HALF_UP_CUSHION,
        division_scale: MAX_SCALE_DECIMAL_OPERATIONS,
    };

    /// Scale of the intermediate half-up pass for up/down rounding
    pub fn intermediate_scale(&self, accuracy: u32) -> u32 {
        accuracy
            .saturating_add(self.cushion)
            .min(self.max_intermediate_scale)
    }

    /// Round to `accuracy` digits away from zero
    pub fn set_scale_round_up(&self, value: Decimal, accuracy: u32) -> Decimal {
        let intermediate = value.round_dp_with_strategy(
            self.intermediate_scale(accuracy),
            RoundingStrategy::MidpointAwayFromZero,
        );
        with_scale(
            intermediate.round_dp_with_strategy(accuracy, RoundingStrategy::AwayFromZero),
            accuracy,
        )
    }

    /// Round to `accuracy` digits toward zero
    pub fn set_scale_round_down(&self, value: Decimal, accuracy: u32) -> Decimal {
        let intermediate = value.round_dp_with_strategy(
            self.intermediate_scale(accuracy),
            RoundingStrategy::MidpointAwayFromZero,
        );
        with_scale(
            intermediate.round_dp_with_strategy(accuracy, RoundingStrategy::ToZero),
            accuracy,
        )
    }

    /// Round to `accuracy` digits, away from zero when `round_up`, else toward zero
    pub fn set_scale(&self, value: Decimal, accuracy: u32, round_up: bool) -> Decimal {
        if round_up {
            self.set_scale_round_up(value, accuracy)
        } else {
            self.set_scale_round_down(value, accuracy)
        }
    }

    /// Two-stage half-up rounding to `accuracy` digits
    pub fn set_scale_round_half_up(&self, value: Decimal, accuracy: u32) -> Decimal {
        let intermediate = value.round_dp_with_strategy(
            accuracy.saturating_add(self.half_up_cushion),
            RoundingStrategy::MidpointAwayFromZero,
        );
        with_scale(
            intermediate.round_dp_with_strategy(accuracy, RoundingStrategy::MidpointAwayFromZero),
            accuracy,
        )
    }

    /// Divide keeping `division_scale` fractional digits, rounded half-up
    pub fn divide_with_max_scale(&self, dividend: Decimal, divisor: Decimal) -> Result<Decimal> {
        if divisor.is_zero() {
            return Err(Error::Arithmetic(format!("Division by zero: {} / {}", dividend, divisor)));
        }
        let quotient = dividend.checked_div(divisor).ok_or_else(|| {
            Error::Arithmetic(format!("Division overflow: {} / {}", dividend, divisor))
        })?;
        Ok(quotient.round_dp_with_strategy(
            self.division_scale.min(MAX_DECIMAL_SCALE),
            RoundingStrategy::MidpointAwayFromZero,
        ))
    }
}

/// Pad (never round) `value` to exactly `accuracy` fractional digits where representable
fn with_scale(mut value: Decimal, accuracy: u32) -> Decimal {
    if value.scale() < accuracy {
        value.rescale(accuracy.min(MAX_DECIMAL_SCALE));
    }
    value
}

/// Convert `value` to a decimal and round it to `accuracy` digits
///
/// `round_up` rounds away from zero, otherwise the value is truncated toward
/// zero. Fails only when `value` is not a finite, representable number.
pub fn round<V: IntoDecimal>(value: V, accuracy: u32, round_up: bool) -> Result<Decimal> {
    Ok(set_scale(value.into_decimal()?, accuracy, round_up))
}

/// Round to `accuracy` digits, away from zero when `round_up`, else toward zero
pub fn set_scale(value: Decimal, accuracy: u32, round_up: bool) -> Decimal {
    RoundingConfig::DEFAULT.set_scale(value, accuracy, round_up)
}

/// Round to `accuracy` digits away from zero
pub fn set_scale_round_up(value: Decimal, accuracy: u32) -> Decimal {
    RoundingConfig::DEFAULT.set_scale_round_up(value, accuracy)
}

/// Round to `accuracy` digits toward zero
pub fn set_scale_round_down(value: Decimal, accuracy: u32) -> Decimal {
    RoundingConfig::DEFAULT.set_scale_round_down(value, accuracy)
}

/// Two-stage half-up rounding, for display and intermediate results
pub fn set_scale_round_half_up(value: Decimal, accuracy: u32) -> Decimal {
    RoundingConfig::DEFAULT.set_scale_round_half_up(value, accuracy)
}

/// Divide at the widest working scale so later rounding never starves precision
///
/// A zero divisor is an [`Error::Arithmetic`]; guarding against it is up to the caller.
pub fn divide_with_max_scale(dividend: Decimal, divisor: Decimal) -> Result<Decimal> {
    RoundingConfig::DEFAULT.divide_with_max_scale(dividend, divisor)
}

/// Whether `value` needs no more than `expected_scale` fractional digits
pub fn is_scale_smaller_or_equal(value: Decimal, expected_scale: u32) -> bool {
    value.normalize().scale() <= expected_scale
}
