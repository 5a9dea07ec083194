//! Decimal type utilities for precise financial calculations
//!
//! Every persisted or compared quantity is a [`Decimal`]. Binary floats only
//! enter through [`IntoDecimal`], which goes via the textual representation so
//! that `0.1_f64` becomes the decimal `0.1`.

use std::str::FromStr;

use rust_decimal::Decimal;
pub use rust_decimal_macros::dec;

use crate::error::{Error, Result};

pub mod compare;
pub mod format;
pub mod rounding;

pub use compare::*;
pub use format::*;
pub use rounding::*;

/// Price type with high precision
pub type Price = Decimal;

/// Quantity type with high precision
pub type Quantity = Decimal;

/// Amount type with high precision (typically Price * Quantity)
pub type Amount = Decimal;

/// Largest scale the decimal type can hold
pub const MAX_DECIMAL_SCALE: u32 = 28;

/// Conversion of caller supplied numbers into a decimal quantity
pub trait IntoDecimal {
    /// Convert to a decimal, failing on non-finite or malformed input
    fn into_decimal(self) -> Result<Decimal>;
}

impl IntoDecimal for Decimal {
    fn into_decimal(self) -> Result<Decimal> {
        Ok(self)
    }
}

impl IntoDecimal for &Decimal {
    fn into_decimal(self) -> Result<Decimal> {
        Ok(*self)
    }
}

impl IntoDecimal for f64 {
    fn into_decimal(self) -> Result<Decimal> {
        if !self.is_finite() {
            return Err(Error::DecimalError(format!("Not a finite number: {}", self)));
        }
        // Display gives the shortest text that round-trips, never an exponent.
        Decimal::from_str(&self.to_string())
            .map_err(|e| Error::DecimalError(format!("Cannot represent {} as a decimal: {}", self, e)))
    }
}

impl IntoDecimal for &str {
    fn into_decimal(self) -> Result<Decimal> {
        let text = self.trim();
        Decimal::from_str(text)
            .or_else(|_| Decimal::from_scientific(text))
            .map_err(|e| Error::DecimalError(format!("Invalid decimal '{}': {}", text, e)))
    }
}

impl IntoDecimal for i64 {
    fn into_decimal(self) -> Result<Decimal> {
        Ok(Decimal::from(self))
    }
}

impl IntoDecimal for u64 {
    fn into_decimal(self) -> Result<Decimal> {
        Ok(Decimal::from(self))
    }
}

impl IntoDecimal for i32 {
    fn into_decimal(self) -> Result<Decimal> {
        Ok(Decimal::from(self))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_float_goes_through_text() {
        assert_eq!(0.1_f64.into_decimal().unwrap(), dec!(0.1));
        assert_eq!(0.1_f64.into_decimal().unwrap().scale(), 1);
        assert_eq!((0.1_f64 + 0.2_f64).into_decimal().unwrap(), dec!(0.30000000000000004));
        assert_eq!(1e-10_f64.into_decimal().unwrap(), dec!(0.0000000001));
    }

    #[test]
    fn test_non_finite_float_is_rejected() {
        assert!(matches!(f64::NAN.into_decimal(), Err(Error::DecimalError(_))));
        assert!(matches!(f64::INFINITY.into_decimal(), Err(Error::DecimalError(_))));
    }

    #[test]
    fn test_text_input() {
        assert_eq!(" 12.50 ".into_decimal().unwrap(), dec!(12.5));
        assert_eq!("1e-3".into_decimal().unwrap(), dec!(0.001));
        assert!("abc".into_decimal().is_err());
    }
}
