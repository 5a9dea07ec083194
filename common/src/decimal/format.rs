//! Human readable rendering of quantities
//!
//! Only for logs and display. Rounds half-even to a maximum number of
//! fractional digits and trims trailing zeros.

use rust_decimal::{Decimal, RoundingStrategy};

use super::IntoDecimal;

/// Fractional digits kept by [`round_for_print`]
pub const PRINT_DIGITS: u32 = 8;

/// Fractional digits kept by [`round_for_print2`]
pub const PRINT2_DIGITS: u32 = 2;

// Always writes the integer digit ("0.5", never ".5") and renders negative
// zero as "0", unlike a "#.#" pattern with no minimum integer digits.
fn format_with_max_digits(value: Decimal, digits: u32) -> String {
    let rounded = value.round_dp_with_strategy(digits, RoundingStrategy::MidpointNearestEven);
    if rounded.is_zero() {
        return "0".to_string();
    }
    rounded.normalize().to_string()
}

/// Render with at most 8 fractional digits
pub fn round_for_print(value: Decimal) -> String {
    format_with_max_digits(value, PRINT_DIGITS)
}

/// Render a float with at most 8 fractional digits
pub fn round_for_print_f64(value: f64) -> String {
    match value.into_decimal() {
        Ok(decimal) => round_for_print(decimal),
        Err(_) => value.to_string(),
    }
}

/// Render with at most 2 fractional digits
pub fn round_for_print2(value: Decimal) -> String {
    format_with_max_digits(value, PRINT2_DIGITS)
}

/// Render a float with at most 2 fractional digits; NaN renders as `"0"`
pub fn round_for_print2_f64(value: f64) -> String {
    if value.is_nan() {
        return "0".to_string();
    }
    match value.into_decimal() {
        Ok(decimal) => round_for_print2(decimal),
        Err(_) => value.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::decimal::dec;

    #[test]
    fn test_trailing_zeros_are_trimmed() {
        assert_eq!(round_for_print(dec!(1.50000000)), "1.5");
        assert_eq!(round_for_print(dec!(100)), "100");
        assert_eq!(round_for_print(dec!(0.000)), "0");
        assert_eq!(round_for_print2(dec!(12.3000)), "12.3");
    }

    #[test]
    fn test_max_digits() {
        assert_eq!(round_for_print(dec!(0.123456789)), "0.12345679");
        assert_eq!(round_for_print2(dec!(3.14159)), "3.14");
        assert_eq!(round_for_print2(dec!(-0.001)), "0");
    }

    #[test]
    fn test_integer_digit_is_written() {
        assert_eq!(round_for_print(dec!(0.5)), "0.5");
        assert_eq!(round_for_print2(dec!(-0.25)), "-0.25");
    }

    #[test]
    fn test_ties_round_to_even() {
        assert_eq!(round_for_print2(dec!(0.125)), "0.12");
        assert_eq!(round_for_print2(dec!(0.135)), "0.14");
    }

    #[test]
    fn test_floats() {
        assert_eq!(round_for_print_f64(0.1), "0.1");
        assert_eq!(round_for_print2_f64(2.0 / 3.0), "0.67");
        assert_eq!(round_for_print2_f64(f64::NAN), "0");
        assert_eq!(round_for_print_f64(f64::NAN), "NaN");
    }
}
