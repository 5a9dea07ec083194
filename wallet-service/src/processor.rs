//! Batched balance operations
//!
//! Operations are rounded to the accuracy of their asset, accumulated per
//! (client, asset), optionally validated, and applied to each client's balances
//! in one atomic update.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use chrono::Utc;
use common::decimal::{rounding, Quantity};
use common::error::{Error, Result};
use common::model::balance::ClientBalanceSet;
use common::model::operation::{BalanceUpdate, ClientBalanceUpdate, WalletOperation};
use tracing::{debug, error, info};
use uuid::Uuid;

use crate::config::WalletServiceConfig;
use crate::registry::AssetRegistry;
use crate::service::WalletService;

/// Monotonic sequence numbers owned by whoever issues them
#[derive(Debug, Default)]
pub struct SequenceCounter {
    next: AtomicU64,
}

impl SequenceCounter {
    /// Counter whose first number is `start`
    pub fn starting_at(start: u64) -> Self {
        Self {
            next: AtomicU64::new(start),
        }
    }

    /// Take the next number
    pub fn next(&self) -> u64 {
        self.next.fetch_add(1, Ordering::SeqCst)
    }

    /// Number the next call to [`SequenceCounter::next`] will return
    pub fn peek(&self) -> u64 {
        self.next.load(Ordering::SeqCst)
    }
}

/// Applies batches of [`WalletOperation`]s through a [`WalletService`]
pub struct WalletOperationsProcessor {
    service: Arc<WalletService>,
    registry: Arc<dyn AssetRegistry>,
    validate: bool,
    sequence: SequenceCounter,
}

impl WalletOperationsProcessor {
    pub fn new(service: Arc<WalletService>, registry: Arc<dyn AssetRegistry>, validate: bool) -> Self {
        Self::with_sequence(service, registry, validate, SequenceCounter::starting_at(1))
    }

    /// Processor that validates balances as `config.validate_balances` says
    pub fn with_config(
        service: Arc<WalletService>,
        registry: Arc<dyn AssetRegistry>,
        config: &WalletServiceConfig,
    ) -> Self {
        Self::new(service, registry, config.validate_balances)
    }

    pub fn with_sequence(
        service: Arc<WalletService>,
        registry: Arc<dyn AssetRegistry>,
        validate: bool,
        sequence: SequenceCounter,
    ) -> Self {
        Self {
            service,
            registry,
            validate,
            sequence,
        }
    }

    pub fn sequence(&self) -> &SequenceCounter {
        &self.sequence
    }

    /// Apply a batch of operations
    ///
    /// Every asset must be known to the registry before anything is written.
    /// Clients are updated one at a time in client ID order; each client's
    /// changes are atomic, the batch as a whole is not. With `force_apply`
    /// an invalid balance is logged and applied instead of rejected.
    pub async fn process(
        &self,
        update_type: &str,
        operations: &[WalletOperation],
        force_apply: bool,
    ) -> Result<BalanceUpdate> {
        let mut by_client: BTreeMap<&str, Vec<(&WalletOperation, u32)>> = BTreeMap::new();
        for operation in operations {
            let asset = self.registry.asset(&operation.asset_id)?;
            by_client
                .entry(operation.client_id.as_str())
                .or_default()
                .push((operation, asset.accuracy));
        }

        let mut balances = Vec::new();
        for (client_id, client_operations) in by_client {
            let validate = self.validate;
            let updates = self
                .service
                .update(client_id, |set| {
                    apply_client_operations(set, &client_operations, validate, force_apply)
                })
                .await?;
            balances.extend(updates);
        }

        let update = BalanceUpdate {
            id: Uuid::new_v4(),
            update_type: update_type.to_string(),
            sequence_number: self.sequence.next(),
            timestamp: Utc::now(),
            balances,
        };

        info!(
            "Processed {} operations of type {} ({} balances changed, sequence {})",
            operations.len(),
            update.update_type,
            update.balances.len(),
            update.sequence_number
        );
        Ok(update)
    }
}

struct ChangedAssetBalance {
    origin_balance: Quantity,
    origin_reserved: Quantity,
    balance: Quantity,
    reserved: Quantity,
}

impl ChangedAssetBalance {
    fn is_unchanged(&self) -> bool {
        self.origin_balance == self.balance && self.origin_reserved == self.reserved
    }
}

fn apply_client_operations(
    set: &mut ClientBalanceSet,
    operations: &[(&WalletOperation, u32)],
    validate: bool,
    force_apply: bool,
) -> Result<Vec<ClientBalanceUpdate>> {
    let mut changes: BTreeMap<&str, ChangedAssetBalance> = BTreeMap::new();

    for (operation, accuracy) in operations {
        let asset_id = operation.asset_id.as_str();
        let change = changes.entry(asset_id).or_insert_with(|| {
            let balance = set.get_balance(asset_id);
            let reserved = set.get_reserved_balance(asset_id);
            ChangedAssetBalance {
                origin_balance: balance,
                origin_reserved: reserved,
                balance,
                reserved,
            }
        });

        change.balance = rounding::set_scale_round_half_up(
            checked_add(change.balance, operation.amount, asset_id)?,
            *accuracy,
        );
        change.reserved = rounding::set_scale_round_half_up(
            checked_add(change.reserved, operation.reserved_amount, asset_id)?,
            *accuracy,
        );
    }

    if validate {
        for (asset_id, change) in &changes {
            let result = validate_balance_change(
                set.client_id(),
                asset_id,
                change.origin_balance,
                change.origin_reserved,
                change.balance,
                change.reserved,
            );
            if let Err(e) = result {
                if !force_apply {
                    return Err(e);
                }
                error!("Force applying of invalid balance: {}", e);
            }
        }
    }

    let mut updates = Vec::with_capacity(changes.len());
    for (asset_id, change) in changes {
        if change.is_unchanged() {
            continue;
        }
        // An entry goes away only once nothing is left in it, reserved included.
        if change.balance.is_zero() && change.reserved.is_zero() {
            set.remove_balance(asset_id);
        } else {
            set.set_balance(asset_id, change.balance, change.reserved);
        }
        debug!(
            "Client {} {}: balance {} -> {}, reserved {} -> {}",
            set.client_id(),
            asset_id,
            change.origin_balance,
            change.balance,
            change.origin_reserved,
            change.reserved
        );
        updates.push(ClientBalanceUpdate {
            client_id: set.client_id().to_string(),
            asset_id: asset_id.to_string(),
            old_balance: change.origin_balance,
            new_balance: change.balance,
            old_reserved: change.origin_reserved,
            new_reserved: change.reserved,
        });
    }

    Ok(updates)
}

fn checked_add(current: Quantity, delta: Quantity, asset_id: &str) -> Result<Quantity> {
    current.checked_add(delta).ok_or_else(|| {
        Error::Arithmetic(format!("Balance overflow for {}: {} + {}", asset_id, current, delta))
    })
}

/// Check that a balance change leaves the balance valid
///
/// A negative balance is accepted only if it was already negative and the
/// change neither lowered it nor widened the gap to the reserved amount. The
/// reserved amount may not decrease below zero, and may not exceed the balance
/// by more than it did before.
pub fn validate_balance_change(
    client_id: &str,
    asset_id: &str,
    old_balance: Quantity,
    old_reserved: Quantity,
    new_balance: Quantity,
    new_reserved: Quantity,
) -> Result<()> {
    let invalid = || {
        Error::InvalidBalance(format!(
            "client={}, asset={}, oldBalance={}, oldReserved={}, newBalance={}, newReserved={}",
            client_id, asset_id, old_balance, old_reserved, new_balance, new_reserved
        ))
    };

    // Compares the gap between balance and reserved before and after the change
    let gap_not_widened = old_reserved
        .checked_add(new_balance)
        .zip(new_reserved.checked_add(old_balance))
        .map(|(before, after)| before >= after)
        .ok_or_else(|| {
            Error::Arithmetic(format!(
                "Balance overflow validating client={}, asset={}",
                client_id, asset_id
            ))
        })?;

    if new_balance < Quantity::ZERO && !(old_balance < Quantity::ZERO && (old_balance >= new_balance || gap_not_widened)) {
        return Err(invalid());
    }

    if new_reserved < Quantity::ZERO && old_reserved > new_reserved {
        return Err(invalid());
    }

    if new_balance < new_reserved && !gap_not_widened {
        return Err(invalid());
    }

    Ok(())
}
