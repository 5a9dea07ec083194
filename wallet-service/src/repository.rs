//! Storage of encoded client balance sets
//!
//! Each client has one blob and a version number. A save names the version it
//! was based on and fails with [`Error::ConcurrencyConflict`] if the stored
//! version has moved, which makes the load → mutate → save cycle atomic per
//! client without holding locks across it.

use async_trait::async_trait;
use common::db::DbPool;
use common::error::{Error, Result};
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use sqlx::Row;
use tracing::{debug, info};

/// Version of a client that has never been saved
pub const INITIAL_VERSION: i64 = 0;

/// A client's encoded balances as last saved
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredBalances {
    /// Encoded balance set, `None` when nothing was saved yet
    pub blob: Option<String>,
    /// Version the blob was saved under
    pub version: i64,
}

impl StoredBalances {
    /// State of a client with nothing stored
    pub fn empty() -> Self {
        Self {
            blob: None,
            version: INITIAL_VERSION,
        }
    }
}

/// Balance repository trait defining the interface for balance storage
#[async_trait]
pub trait BalanceRepository: Send + Sync {
    /// Load a client's blob and version
    async fn load(&self, client_id: &str) -> Result<StoredBalances>;

    /// Store a client's blob if the stored version still equals `expected_version`
    ///
    /// Returns the new version.
    async fn save(&self, client_id: &str, blob: String, expected_version: i64) -> Result<i64>;

    /// IDs of all clients with stored balances
    async fn client_ids(&self) -> Result<Vec<String>>;
}

fn conflict(client_id: &str, expected_version: i64) -> Error {
    Error::ConcurrencyConflict(format!(
        "Balances of client {} changed since version {}",
        client_id, expected_version
    ))
}

/// In-memory repository for balance blobs
pub struct InMemoryBalanceRepository {
    /// Blob and version by client ID
    pub wallets: DashMap<String, (String, i64)>,
}

impl InMemoryBalanceRepository {
    /// Create a new in-memory balance repository
    pub fn new() -> Self {
        Self {
            wallets: DashMap::new(),
        }
    }
}

impl Default for InMemoryBalanceRepository {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl BalanceRepository for InMemoryBalanceRepository {
    async fn load(&self, client_id: &str) -> Result<StoredBalances> {
        Ok(self
            .wallets
            .get(client_id)
            .map(|stored| StoredBalances {
                blob: Some(stored.0.clone()),
                version: stored.1,
            })
            .unwrap_or_else(StoredBalances::empty))
    }

    async fn save(&self, client_id: &str, blob: String, expected_version: i64) -> Result<i64> {
        // The entry guard holds the shard lock, so check and write are one step.
        match self.wallets.entry(client_id.to_string()) {
            Entry::Occupied(mut occupied) => {
                if occupied.get().1 != expected_version {
                    return Err(conflict(client_id, expected_version));
                }
                let version = expected_version + 1;
                occupied.insert((blob, version));
                Ok(version)
            }
            Entry::Vacant(vacant) => {
                if expected_version != INITIAL_VERSION {
                    return Err(conflict(client_id, expected_version));
                }
                let version = INITIAL_VERSION + 1;
                vacant.insert((blob, version));
                Ok(version)
            }
        }
    }

    async fn client_ids(&self) -> Result<Vec<String>> {
        let mut ids: Vec<String> = self.wallets.iter().map(|entry| entry.key().clone()).collect();
        ids.sort();
        Ok(ids)
    }
}

/// PostgreSQL repository for balance blobs
pub struct PostgresBalanceRepository {
    /// Database connection pool
    pool: DbPool,
}

impl PostgresBalanceRepository {
    /// Create a new PostgreSQL balance repository
    pub async fn new(database_url: Option<String>) -> Result<Self> {
        let database_url = match database_url {
            Some(url) => url,
            None => std::env::var("DATABASE_URL")
                .map_err(|_| Error::ConfigurationError("DATABASE_URL must be set".to_string()))?,
        };

        let pool = common::db::init_db_pool(&database_url, 5).await?;
        Ok(Self { pool })
    }

    /// Create a new PostgreSQL balance repository with configuration
    pub async fn with_config(config: &crate::config::WalletServiceConfig) -> Result<Self> {
        info!("Connecting to PostgreSQL database with pool size: {}", config.db_pool_size);

        let pool = common::db::init_db_pool(&config.database_url, config.db_pool_size).await?;
        Ok(Self { pool })
    }

    /// Wrap an existing pool
    pub fn with_pool(pool: DbPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &DbPool {
        &self.pool
    }
}

#[async_trait]
impl BalanceRepository for PostgresBalanceRepository {
    async fn load(&self, client_id: &str) -> Result<StoredBalances> {
        debug!("Loading balances from database for client {}", client_id);

        let row = sqlx::query("SELECT balances, version FROM client_balances WHERE client_id = $1")
            .bind(client_id)
            .fetch_optional(&self.pool)
            .await?;

        match row {
            Some(row) => Ok(StoredBalances {
                blob: row.get("balances"),
                version: row.get("version"),
            }),
            None => Ok(StoredBalances::empty()),
        }
    }

    async fn save(&self, client_id: &str, blob: String, expected_version: i64) -> Result<i64> {
        debug!("Saving balances for client {} over version {}", client_id, expected_version);

        let version = expected_version + 1;
        let result = if expected_version == INITIAL_VERSION {
            sqlx::query(
                "INSERT INTO client_balances (client_id, balances, version)
                 VALUES ($1, $2, $3)
                 ON CONFLICT (client_id) DO NOTHING",
            )
            .bind(client_id)
            .bind(&blob)
            .bind(version)
            .execute(&self.pool)
            .await?
        } else {
            sqlx::query(
                "UPDATE client_balances
                 SET balances = $2, version = $3, updated_at = NOW()
                 WHERE client_id = $1 AND version = $4",
            )
            .bind(client_id)
            .bind(&blob)
            .bind(version)
            .bind(expected_version)
            .execute(&self.pool)
            .await?
        };

        if result.rows_affected() == 0 {
            return Err(conflict(client_id, expected_version));
        }

        Ok(version)
    }

    async fn client_ids(&self) -> Result<Vec<String>> {
        let rows = sqlx::query("SELECT client_id FROM client_balances ORDER BY client_id")
            .fetch_all(&self.pool)
            .await?;

        Ok(rows.into_iter().map(|row| row.get("client_id")).collect())
    }
}
