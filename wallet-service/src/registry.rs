//! Asset registry consulted for accuracies

use common::error::{Error, Result};
use common::model::asset::{Asset, AssetPair};
use dashmap::DashMap;

/// Source of asset and asset pair definitions
pub trait AssetRegistry: Send + Sync {
    /// Look up an asset by ID
    fn asset(&self, asset_id: &str) -> Result<Asset>;

    /// Look up an asset pair by ID
    fn asset_pair(&self, asset_pair_id: &str) -> Result<AssetPair>;
}

/// In-memory asset registry
#[derive(Default)]
pub struct InMemoryAssetRegistry {
    assets: DashMap<String, Asset>,
    asset_pairs: DashMap<String, AssetPair>,
}

impl InMemoryAssetRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a registry from asset definitions
    pub fn with_assets<I: IntoIterator<Item = Asset>>(assets: I) -> Self {
        let registry = Self::new();
        for asset in assets {
            registry.add_asset(asset);
        }
        registry
    }

    /// Add or replace an asset
    pub fn add_asset(&self, asset: Asset) {
        self.assets.insert(asset.id.clone(), asset);
    }

    /// Add or replace an asset pair
    pub fn add_asset_pair(&self, asset_pair: AssetPair) {
        self.asset_pairs.insert(asset_pair.id.clone(), asset_pair);
    }
}

impl AssetRegistry for InMemoryAssetRegistry {
    fn asset(&self, asset_id: &str) -> Result<Asset> {
        self.assets
            .get(asset_id)
            .map(|asset| asset.clone())
            .ok_or_else(|| Error::AssetNotFound(asset_id.to_string()))
    }

    fn asset_pair(&self, asset_pair_id: &str) -> Result<AssetPair> {
        self.asset_pairs
            .get(asset_pair_id)
            .map(|pair| pair.clone())
            .ok_or_else(|| Error::AssetNotFound(format!("asset pair {}", asset_pair_id)))
    }
}
