//! Asset registry records
//!
//! The registry itself lives with the caller; these are the values it hands to
//! the rounding functions.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::decimal::rounding;

/// An asset and the number of fractional digits its amounts are kept at
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Asset {
    /// Asset identifier (e.g., "BTC", "USD")
    pub id: String,
    /// Canonical number of fractional digits
    pub accuracy: u32,
}

impl Asset {
    pub fn new(id: impl Into<String>, accuracy: u32) -> Self {
        Self {
            id: id.into(),
            accuracy,
        }
    }

    /// Round an amount of this asset, away from zero when `round_up`
    pub fn round(&self, value: Decimal, round_up: bool) -> Decimal {
        rounding::set_scale(value, self.accuracy, round_up)
    }

    /// Round an amount of this asset half-up
    pub fn round_half_up(&self, value: Decimal) -> Decimal {
        rounding::set_scale_round_half_up(value, self.accuracy)
    }
}

/// A tradable pair with accuracies for the price and for its reciprocal
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssetPair {
    /// Pair identifier (e.g., "BTCUSD")
    pub id: String,
    /// Base asset identifier
    pub base_asset_id: String,
    /// Quoting asset identifier
    pub quoting_asset_id: String,
    /// Fractional digits of a price
    pub accuracy: u32,
    /// Fractional digits of an inverted (reciprocal) price
    pub inverted_accuracy: u32,
}

impl AssetPair {
    pub fn new(
        id: impl Into<String>,
        base_asset_id: impl Into<String>,
        quoting_asset_id: impl Into<String>,
        accuracy: u32,
        inverted_accuracy: u32,
    ) -> Self {
        Self {
            id: id.into(),
            base_asset_id: base_asset_id.into(),
            quoting_asset_id: quoting_asset_id.into(),
            accuracy,
            inverted_accuracy,
        }
    }

    /// Round a price of this pair
    pub fn round_price(&self, price: Decimal, round_up: bool) -> Decimal {
        rounding::set_scale(price, self.accuracy, round_up)
    }

    /// Reciprocal of `price` at the inverted accuracy
    pub fn invert_price(&self, price: Decimal, round_up: bool) -> crate::Result<Decimal> {
        let inverted = rounding::divide_with_max_scale(Decimal::ONE, price)?;
        Ok(rounding::set_scale(inverted, self.inverted_accuracy, round_up))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::decimal::dec;

    #[test]
    fn test_asset_rounding() {
        let btc = Asset::new("BTC", 8);
        assert_eq!(btc.round(dec!(0.123456789), true), dec!(0.12345679));
        assert_eq!(btc.round(dec!(0.123456789), false), dec!(0.12345678));
        assert_eq!(btc.round_half_up(dec!(0.123456785)), dec!(0.12345679));
    }

    #[test]
    fn test_pair_inversion() {
        let pair = AssetPair::new("EURUSD", "EUR", "USD", 5, 3);
        assert_eq!(pair.round_price(dec!(1.123456), false), dec!(1.12345));
        assert_eq!(pair.invert_price(dec!(3), false).unwrap(), dec!(0.333));
        assert_eq!(pair.invert_price(dec!(3), true).unwrap(), dec!(0.334));
        assert!(pair.invert_price(Decimal::ZERO, true).is_err());
    }
}
