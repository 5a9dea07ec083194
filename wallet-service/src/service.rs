//! Wallet service implementation

use std::sync::Arc;

use common::decimal::Quantity;
use common::error::{ErrorExt, Result};
use common::model::balance::ClientBalanceSet;
use tracing::{debug, info, warn};

use crate::config::{WalletServiceConfig, DEFAULT_MAX_UPDATE_RETRIES};
use crate::repository::{BalanceRepository, InMemoryBalanceRepository, PostgresBalanceRepository};

/// Wallet service applying balance changes atomically per client
pub struct WalletService {
    /// Repository for balance blobs
    repo: Arc<dyn BalanceRepository>,
    /// Reload-and-retry attempts after a conflicting save
    max_update_retries: u32,
}

/// Repository Type
pub enum RepositoryType {
    /// In-memory repository
    InMemory,
    /// PostgreSQL repository
    Postgres(Option<String>),
}

impl Default for WalletService {
    fn default() -> Self {
        Self::new()
    }
}

impl WalletService {
    /// Create a new wallet service backed by memory
    pub fn new() -> Self {
        Self::with_repo(Arc::new(InMemoryBalanceRepository::new()), DEFAULT_MAX_UPDATE_RETRIES)
    }

    /// Create a wallet service over an existing repository
    pub fn with_repo(repo: Arc<dyn BalanceRepository>, max_update_retries: u32) -> Self {
        Self {
            repo,
            max_update_retries,
        }
    }

    /// Create a new wallet service with a specific repository type
    pub async fn with_repository(repo_type: RepositoryType) -> Result<Self> {
        let repo: Arc<dyn BalanceRepository> = match repo_type {
            RepositoryType::InMemory => Arc::new(InMemoryBalanceRepository::new()),
            RepositoryType::Postgres(database_url) => {
                Arc::new(PostgresBalanceRepository::new(database_url).await?)
            }
        };

        Ok(Self::with_repo(repo, DEFAULT_MAX_UPDATE_RETRIES))
    }

    /// Create a new wallet service with a configuration
    pub async fn with_config(config: &WalletServiceConfig) -> Result<Self> {
        let repo: Arc<dyn BalanceRepository> =
            Arc::new(PostgresBalanceRepository::with_config(config).await?);

        Ok(Self::with_repo(repo, config.max_update_retries))
    }

    pub fn repository(&self) -> &Arc<dyn BalanceRepository> {
        &self.repo
    }

    /// Get all balances of a client
    pub async fn get_balances(&self, client_id: &str) -> Result<ClientBalanceSet> {
        let stored = self
            .repo
            .load(client_id)
            .await
            .with_context(|| format!("Failed to load balances of client {}", client_id))?;

        ClientBalanceSet::decode(client_id, stored.blob.as_deref())
            .with_context(|| format!("Failed to decode balances of client {}", client_id))
    }

    /// Get the available amount of one asset
    pub async fn get_balance(&self, client_id: &str, asset: &str) -> Result<Quantity> {
        Ok(self.get_balances(client_id).await?.get_balance(asset))
    }

    /// Get the reserved amount of one asset
    pub async fn get_reserved_balance(&self, client_id: &str, asset: &str) -> Result<Quantity> {
        Ok(self.get_balances(client_id).await?.get_reserved_balance(asset))
    }

    /// Adjust a balance by the given deltas, pruning it when the available amount reaches zero
    pub async fn add_balance(
        &self,
        client_id: &str,
        asset: &str,
        amount_delta: Quantity,
        reserved_delta: Quantity,
    ) -> Result<ClientBalanceSet> {
        debug!("Adding {} (reserved {}) {} to client {}", amount_delta, reserved_delta, asset, client_id);

        self.update(client_id, |balances| {
            balances.add_balance(asset, amount_delta, reserved_delta)?;
            Ok(balances.clone())
        })
        .await
    }

    /// Overwrite a balance with absolute amounts
    pub async fn set_balance(
        &self,
        client_id: &str,
        asset: &str,
        amount: Quantity,
        reserved: Quantity,
    ) -> Result<ClientBalanceSet> {
        info!("Setting {} balance of client {} to {} (reserved {})", asset, client_id, amount, reserved);

        self.update(client_id, |balances| {
            balances.set_balance(asset, amount, reserved);
            Ok(balances.clone())
        })
        .await
    }

    /// Run `mutate` against the client's current balances and store the result
    ///
    /// The save is conditional on the version that was loaded. When another
    /// writer got there first the balances are reloaded and `mutate` runs
    /// again, up to the configured number of retries. An error from `mutate`
    /// aborts without saving.
    pub async fn update<F, T>(&self, client_id: &str, mut mutate: F) -> Result<T>
    where
        F: FnMut(&mut ClientBalanceSet) -> Result<T> + Send,
        T: Send,
    {
        let mut attempt = 0;
        loop {
            let stored = self
                .repo
                .load(client_id)
                .await
                .with_context(|| format!("Failed to load balances of client {}", client_id))?;
            let mut balances = ClientBalanceSet::decode(client_id, stored.blob.as_deref())
                .with_context(|| format!("Failed to decode balances of client {}", client_id))?;

            let output = mutate(&mut balances)?;

            let blob = balances.encode()?;
            if stored.blob.as_deref() == Some(blob.as_str()) {
                debug!("Balances of client {} unchanged at version {}", client_id, stored.version);
                return Ok(output);
            }

            match self.repo.save(client_id, blob, stored.version).await {
                Ok(version) => {
                    debug!("Saved balances of client {} as version {}", client_id, version);
                    return Ok(output);
                }
                Err(e) if e.is_conflict() && attempt < self.max_update_retries => {
                    attempt += 1;
                    warn!(
                        "Conflicting update of client {} (attempt {}/{}): {}",
                        client_id, attempt, self.max_update_retries, e
                    );
                }
                Err(e) => {
                    return Err(e).with_context(|| format!("Failed to save balances of client {}", client_id));
                }
            }
        }
    }
}
