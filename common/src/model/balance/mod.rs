//! Per-client asset balances
//!
//! A [`ClientBalanceSet`] holds one [`AssetBalance`] per asset for a single
//! client. Amounts are expected to be rounded to the asset accuracy by the
//! caller; nothing here rounds. The set is a plain value: it is not
//! synchronized and assumes a single writer per client snapshot.

use std::collections::hash_map::{HashMap, Values};

use serde::{Deserialize, Serialize};

use crate::decimal::Quantity;
use crate::error::{Error, Result};

mod codec;

/// Balance of one asset
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssetBalance {
    /// Asset identifier (e.g., "BTC", "USD")
    #[serde(rename = "Asset")]
    pub asset: String,
    /// Available amount
    #[serde(rename = "Balance")]
    pub available: Quantity,
    /// Reserved amount (e.g., held by open orders)
    #[serde(rename = "Reserved", default)]
    pub reserved: Quantity,
}

impl AssetBalance {
    /// Create a balance with zero amounts
    pub fn new(asset: impl Into<String>) -> Self {
        Self {
            asset: asset.into(),
            available: Quantity::ZERO,
            reserved: Quantity::ZERO,
        }
    }

    /// Create a balance with the given amounts
    pub fn with_amounts(asset: impl Into<String>, available: Quantity, reserved: Quantity) -> Self {
        Self {
            asset: asset.into(),
            available,
            reserved,
        }
    }
}

/// All asset balances of one client, keyed by asset
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ClientBalanceSet {
    client_id: String,
    balances: HashMap<String, AssetBalance>,
}

impl ClientBalanceSet {
    /// Create an empty set for a client
    pub fn new(client_id: impl Into<String>) -> Self {
        Self {
            client_id: client_id.into(),
            balances: HashMap::new(),
        }
    }

    /// Build a set from existing entries; an asset listed twice is an error
    pub fn from_balances<I>(client_id: impl Into<String>, balances: I) -> Result<Self>
    where
        I: IntoIterator<Item = AssetBalance>,
    {
        let mut set = Self::new(client_id);
        for balance in balances {
            if set.balances.contains_key(&balance.asset) {
                return Err(Error::MalformedBalances(format!(
                    "Asset {} listed more than once for client {}",
                    balance.asset, set.client_id
                )));
            }
            set.balances.insert(balance.asset.clone(), balance);
        }
        Ok(set)
    }

    pub fn client_id(&self) -> &str {
        &self.client_id
    }

    /// Adjust the available and reserved amounts of `asset` by the given deltas
    ///
    /// A missing entry starts at zero. When the available amount ends up
    /// exactly zero the entry is removed, whatever its reserved amount, and
    /// `None` is returned. On overflow the set is left untouched.
    pub fn add_balance(
        &mut self,
        asset: &str,
        amount_delta: Quantity,
        reserved_delta: Quantity,
    ) -> Result<Option<&AssetBalance>> {
        let (available, reserved) = self
            .balances
            .get(asset)
            .map(|balance| (balance.available, balance.reserved))
            .unwrap_or((Quantity::ZERO, Quantity::ZERO));

        let available = checked_add(available, amount_delta, asset)?;
        let reserved = checked_add(reserved, reserved_delta, asset)?;

        if available.is_zero() {
            self.balances.remove(asset);
            return Ok(None);
        }

        let balance = self
            .balances
            .entry(asset.to_string())
            .or_insert_with(|| AssetBalance::new(asset));
        balance.available = available;
        balance.reserved = reserved;
        Ok(Some(&*balance))
    }

    /// Overwrite the amounts of `asset`, creating the entry if needed
    ///
    /// Never prunes: a zero available amount set here stays in the set.
    pub fn set_balance(&mut self, asset: &str, amount: Quantity, reserved: Quantity) -> &AssetBalance {
        let balance = self
            .balances
            .entry(asset.to_string())
            .or_insert_with(|| AssetBalance::new(asset));
        balance.available = amount;
        balance.reserved = reserved;
        balance
    }

    /// Drop the entry of `asset`, returning it if there was one
    pub fn remove_balance(&mut self, asset: &str) -> Option<AssetBalance> {
        self.balances.remove(asset)
    }

    /// Available amount of `asset`, zero when the client holds none
    pub fn get_balance(&self, asset: &str) -> Quantity {
        self.balances
            .get(asset)
            .map(|balance| balance.available)
            .unwrap_or(Quantity::ZERO)
    }

    /// Reserved amount of `asset`, zero when the client holds none
    pub fn get_reserved_balance(&self, asset: &str) -> Quantity {
        self.balances
            .get(asset)
            .map(|balance| balance.reserved)
            .unwrap_or(Quantity::ZERO)
    }

    pub fn get(&self, asset: &str) -> Option<&AssetBalance> {
        self.balances.get(asset)
    }

    pub fn contains(&self, asset: &str) -> bool {
        self.balances.contains_key(asset)
    }

    pub fn iter(&self) -> Values<'_, String, AssetBalance> {
        self.balances.values()
    }

    pub fn len(&self) -> usize {
        self.balances.len()
    }

    pub fn is_empty(&self) -> bool {
        self.balances.is_empty()
    }
}

impl<'a> IntoIterator for &'a ClientBalanceSet {
    type Item = &'a AssetBalance;
    type IntoIter = Values<'a, String, AssetBalance>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

fn checked_add(current: Quantity, delta: Quantity, asset: &str) -> Result<Quantity> {
    current.checked_add(delta).ok_or_else(|| {
        Error::Arithmetic(format!("Balance overflow for {}: {} + {}", asset, current, delta))
    })
}
