//! Balance operations and the updates they produce

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::decimal::Quantity;

/// A change to one client's balance of one asset
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WalletOperation {
    /// Client ID
    pub client_id: String,
    /// Asset identifier
    pub asset_id: String,
    /// Change of the available amount
    pub amount: Quantity,
    /// Change of the reserved amount
    pub reserved_amount: Quantity,
}

impl WalletOperation {
    pub fn new(
        client_id: impl Into<String>,
        asset_id: impl Into<String>,
        amount: Quantity,
        reserved_amount: Quantity,
    ) -> Self {
        Self {
            client_id: client_id.into(),
            asset_id: asset_id.into(),
            amount,
            reserved_amount,
        }
    }
}

/// Amounts of one (client, asset) before and after an operation batch
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientBalanceUpdate {
    pub client_id: String,
    pub asset_id: String,
    pub old_balance: Quantity,
    pub new_balance: Quantity,
    pub old_reserved: Quantity,
    pub new_reserved: Quantity,
}

/// All balance changes made by one operation batch
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BalanceUpdate {
    /// Update ID
    pub id: Uuid,
    /// Kind of operation that caused the update (e.g., "CASH_IN")
    pub update_type: String,
    /// Sequence number assigned by the processor
    pub sequence_number: u64,
    /// Processing timestamp
    pub timestamp: DateTime<Utc>,
    /// Changed balances
    pub balances: Vec<ClientBalanceUpdate>,
}

impl BalanceUpdate {
    pub fn is_empty(&self) -> bool {
        self.balances.is_empty()
    }
}
