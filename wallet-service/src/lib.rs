//! Wallet service: persistence and batched updates of client balances

pub mod config;
pub mod processor;
pub mod registry;
pub mod repository;
pub mod service;

pub use config::WalletServiceConfig;
pub use processor::{validate_balance_change, SequenceCounter, WalletOperationsProcessor};
pub use registry::{AssetRegistry, InMemoryAssetRegistry};
pub use repository::{BalanceRepository, InMemoryBalanceRepository, PostgresBalanceRepository, StoredBalances};
pub use service::{RepositoryType, WalletService};
