//! Flat encoding of a client balance set
//!
//! The blob is a JSON array of `{"Asset", "Balance", "Reserved"}` objects.
//! Entries are written sorted by asset with amounts as decimal strings, so the
//! same set always encodes to the same text. Reading accepts numeric amounts
//! and a missing `Reserved` field as zero.

use super::{AssetBalance, ClientBalanceSet};
use crate::error::Result;

impl ClientBalanceSet {
    /// Serialize the set to its blob form
    pub fn encode(&self) -> Result<String> {
        let mut entries: Vec<&AssetBalance> = self.balances.values().collect();
        entries.sort_by(|a, b| a.asset.cmp(&b.asset));
        Ok(serde_json::to_string(&entries)?)
    }

    /// Rebuild a client's set from its blob
    ///
    /// An absent or blank blob is an empty set. Anything else that is not a
    /// well-formed list of distinct assets is an error.
    pub fn decode(client_id: impl Into<String>, blob: Option<&str>) -> Result<Self> {
        let blob = match blob {
            Some(text) if !text.trim().is_empty() => text,
            _ => return Ok(Self::new(client_id)),
        };
        let entries: Vec<AssetBalance> = serde_json::from_str(blob)?;
        Self::from_balances(client_id, entries)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::decimal::{dec, Quantity};
    use crate::error::Error;

    fn sample_set() -> ClientBalanceSet {
        let mut set = ClientBalanceSet::new("client-1");
        set.add_balance("USD", dec!(1000.50), dec!(250)).unwrap();
        set.add_balance("BTC", dec!(0.5), Quantity::ZERO).unwrap();
        set.set_balance("EUR", Quantity::ZERO, dec!(0.3));
        set
    }

    #[test]
    fn test_encoding_is_sorted_and_textual() {
        let blob = sample_set().encode().unwrap();
        assert_eq!(
            blob,
            r#"[{"Asset":"BTC","Balance":"0.5","Reserved":"0"},{"Asset":"EUR","Balance":"0","Reserved":"0.3"},{"Asset":"USD","Balance":"1000.50","Reserved":"250"}]"#
        );
    }

    #[test]
    fn test_decode_of_encoded_set() {
        let set = sample_set();
        let decoded = ClientBalanceSet::decode("client-1", Some(&set.encode().unwrap())).unwrap();

        assert_eq!(decoded, set);
        assert_eq!(decoded.encode().unwrap(), set.encode().unwrap());
    }

    #[test]
    fn test_entry_order_is_not_significant() {
        let blob = r#"[{"Asset":"USD","Balance":"3","Reserved":"1"},{"Asset":"BTC","Balance":"2","Reserved":"0"}]"#;
        let reordered = r#"[{"Asset":"BTC","Balance":"2","Reserved":"0"},{"Asset":"USD","Balance":"3","Reserved":"1"}]"#;

        let first = ClientBalanceSet::decode("client-1", Some(blob)).unwrap();
        let second = ClientBalanceSet::decode("client-1", Some(reordered)).unwrap();
        assert_eq!(first, second);
        assert_eq!(first.encode().unwrap(), reordered);
    }

    #[test]
    fn test_absent_or_blank_blob_is_empty() {
        assert!(ClientBalanceSet::decode("client-1", None).unwrap().is_empty());
        assert!(ClientBalanceSet::decode("client-1", Some("")).unwrap().is_empty());
        assert!(ClientBalanceSet::decode("client-1", Some("  \n")).unwrap().is_empty());
        assert!(ClientBalanceSet::decode("client-1", Some("[]")).unwrap().is_empty());
    }

    #[test]
    fn test_empty_set_encodes_to_empty_list() {
        let empty = ClientBalanceSet::new("client-1");
        let blob = empty.encode().unwrap();

        assert_eq!(blob, "[]");
        assert_eq!(ClientBalanceSet::decode("client-1", Some(&blob)).unwrap(), empty);
    }

    #[test]
    fn test_numeric_amounts_and_missing_reserved() {
        let legacy = r#"[{"Asset":"BTC","Balance":0.25},{"Asset":"USD","Balance":10,"Reserved":2.5}]"#;
        let set = ClientBalanceSet::decode("client-1", Some(legacy)).unwrap();

        assert_eq!(set.get_balance("BTC"), dec!(0.25));
        assert_eq!(set.get_reserved_balance("BTC"), Quantity::ZERO);
        assert_eq!(set.get_balance("USD"), dec!(10));
        assert_eq!(set.get_reserved_balance("USD"), dec!(2.5));
    }

    #[test]
    fn test_malformed_blob_is_an_error() {
        let truncated = ClientBalanceSet::decode("client-1", Some(r#"[{"Asset":"BTC","Bal"#));
        assert!(matches!(truncated, Err(Error::Serialization(_))));

        let not_a_list = ClientBalanceSet::decode("client-1", Some(r#"{"Asset":"BTC"}"#));
        assert!(matches!(not_a_list, Err(Error::Serialization(_))));

        let bad_amount = ClientBalanceSet::decode("client-1", Some(r#"[{"Asset":"BTC","Balance":"abc"}]"#));
        assert!(matches!(bad_amount, Err(Error::Serialization(_))));
    }

    #[test]
    fn test_duplicate_asset_is_an_error() {
        let blob = r#"[{"Asset":"BTC","Balance":"1"},{"Asset":"BTC","Balance":"2"}]"#;
        let result = ClientBalanceSet::decode("client-1", Some(blob));
        assert!(matches!(result, Err(Error::MalformedBalances(_))));
    }
}
