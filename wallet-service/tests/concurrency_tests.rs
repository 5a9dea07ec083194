use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use common::decimal::{dec, Quantity};
use common::error::{Error, Result};
use common::model::balance::ClientBalanceSet;
use wallet_service::{BalanceRepository, InMemoryBalanceRepository, StoredBalances, WalletService};

/// Lets another writer slip in between a load and the first save
struct InterleavingRepository {
    inner: InMemoryBalanceRepository,
    saves: AtomicUsize,
}

impl InterleavingRepository {
    fn new() -> Self {
        Self {
            inner: InMemoryBalanceRepository::new(),
            saves: AtomicUsize::new(0),
        }
    }
}

#[async_trait]
impl BalanceRepository for InterleavingRepository {
    async fn load(&self, client_id: &str) -> Result<StoredBalances> {
        self.inner.load(client_id).await
    }

    async fn save(&self, client_id: &str, blob: String, expected_version: i64) -> Result<i64> {
        if self.saves.fetch_add(1, Ordering::SeqCst) == 0 {
            let competing = self.inner.load(client_id).await?;
            let mut balances = ClientBalanceSet::decode(client_id, competing.blob.as_deref())?;
            balances.add_balance("ETH", dec!(3), Quantity::ZERO)?;
            self.inner.save(client_id, balances.encode()?, competing.version).await?;
        }
        self.inner.save(client_id, blob, expected_version).await
    }

    async fn client_ids(&self) -> Result<Vec<String>> {
        self.inner.client_ids().await
    }
}

/// Every save loses the race
struct AlwaysConflictingRepository {
    saves: AtomicUsize,
}

#[async_trait]
impl BalanceRepository for AlwaysConflictingRepository {
    async fn load(&self, _client_id: &str) -> Result<StoredBalances> {
        Ok(StoredBalances::empty())
    }

    async fn save(&self, client_id: &str, _blob: String, _expected_version: i64) -> Result<i64> {
        self.saves.fetch_add(1, Ordering::SeqCst);
        Err(Error::ConcurrencyConflict(client_id.to_string()))
    }

    async fn client_ids(&self) -> Result<Vec<String>> {
        Ok(Vec::new())
    }
}

#[tokio::test]
async fn test_interleaved_load_mutate_save() {
    let repo = InMemoryBalanceRepository::new();

    // Two writers load the same snapshot.
    let first = repo.load("client-1").await.unwrap();
    let second = repo.load("client-1").await.unwrap();

    let mut first_set = ClientBalanceSet::decode("client-1", first.blob.as_deref()).unwrap();
    first_set.add_balance("BTC", dec!(1), Quantity::ZERO).unwrap();
    repo.save("client-1", first_set.encode().unwrap(), first.version).await.unwrap();

    let mut second_set = ClientBalanceSet::decode("client-1", second.blob.as_deref()).unwrap();
    second_set.add_balance("USD", dec!(100), Quantity::ZERO).unwrap();
    let stale = repo.save("client-1", second_set.encode().unwrap(), second.version).await;
    assert!(matches!(stale, Err(Error::ConcurrencyConflict(_))));

    // The losing writer redoes its cycle on fresh state.
    let reloaded = repo.load("client-1").await.unwrap();
    let mut retried = ClientBalanceSet::decode("client-1", reloaded.blob.as_deref()).unwrap();
    retried.add_balance("USD", dec!(100), Quantity::ZERO).unwrap();
    repo.save("client-1", retried.encode().unwrap(), reloaded.version).await.unwrap();

    let stored = repo.load("client-1").await.unwrap();
    let balances = ClientBalanceSet::decode("client-1", stored.blob.as_deref()).unwrap();
    assert_eq!(balances.get_balance("BTC"), dec!(1));
    assert_eq!(balances.get_balance("USD"), dec!(100));
}

#[tokio::test]
async fn test_service_retries_after_conflict() {
    let repo = Arc::new(InterleavingRepository::new());
    let service = WalletService::with_repo(repo.clone(), 3);

    let balances = service.add_balance("client-1", "BTC", dec!(0.5), Quantity::ZERO).await.unwrap();

    assert_eq!(balances.get_balance("BTC"), dec!(0.5));
    assert_eq!(balances.get_balance("ETH"), dec!(3));
    assert_eq!(repo.saves.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn test_retries_are_bounded() {
    let repo = Arc::new(AlwaysConflictingRepository { saves: AtomicUsize::new(0) });
    let service = WalletService::with_repo(repo.clone(), 2);

    let result = service.add_balance("client-1", "BTC", dec!(1), Quantity::ZERO).await;

    assert!(matches!(result, Err(Error::ConcurrencyConflict(_))));
    assert_eq!(repo.saves.load(Ordering::SeqCst), 3);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_adds_on_different_assets_survive() {
    let service = Arc::new(WalletService::with_repo(Arc::new(InMemoryBalanceRepository::new()), 100));

    let tasks: Vec<_> = (0..16)
        .map(|i| {
            let service = service.clone();
            tokio::spawn(async move {
                service
                    .add_balance("client-1", &format!("ASSET{}", i), Quantity::from(i + 1), Quantity::ZERO)
                    .await
            })
        })
        .collect();

    for task in futures::future::join_all(tasks).await {
        task.unwrap().unwrap();
    }

    let balances = service.get_balances("client-1").await.unwrap();
    assert_eq!(balances.len(), 16);
    for i in 0..16 {
        assert_eq!(balances.get_balance(&format!("ASSET{}", i)), Quantity::from(i + 1));
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_adds_on_same_asset_accumulate() {
    let service = Arc::new(WalletService::with_repo(Arc::new(InMemoryBalanceRepository::new()), 100));

    let tasks: Vec<_> = (0..10)
        .map(|_| {
            let service = service.clone();
            tokio::spawn(async move { service.add_balance("client-1", "USD", dec!(1.5), dec!(0.5)).await })
        })
        .collect();

    for task in futures::future::join_all(tasks).await {
        task.unwrap().unwrap();
    }

    assert_eq!(service.get_balance("client-1", "USD").await.unwrap(), dec!(15));
    assert_eq!(service.get_reserved_balance("client-1", "USD").await.unwrap(), dec!(5));
}
