//! 内存仓储实现
//!
//! 未配置数据库时使用，也用于测试。BTreeMap 保证分页顺序稳定。

use std::collections::{BTreeMap, HashMap};

use anyhow::Result;
use async_trait::async_trait;
use tokio::sync::RwLock;
use uuid::Uuid;

use super::wallet_repository::{
    decode_continuation_token, encode_continuation_token, AdditionalWalletRepository,
    LegacyCredentialsRepository, WalletRepository,
};
use crate::domain::{LegacyCredentialsRecord, Page, Wallet};

type DefaultKey = (String, String, Uuid);
type AdditionalKey = (String, String, Uuid, String);

fn paginate<'a>(
    wallets: impl Iterator<Item = &'a Wallet>,
    take: usize,
    continuation_token: Option<&str>,
) -> Result<Page<Wallet>> {
    let offset = decode_continuation_token(continuation_token)?;
    let mut rest = wallets.skip(offset);
    let items: Vec<Wallet> = rest.by_ref().take(take).cloned().collect();
    let has_more = rest.next().is_some();

    Ok(Page {
        continuation_token: encode_continuation_token(offset, items.len(), has_more),
        items,
    })
}

#[derive(Default)]
pub struct InMemoryWalletRepository {
    wallets: RwLock<BTreeMap<DefaultKey, Wallet>>,
}

impl InMemoryWalletRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl WalletRepository for InMemoryWalletRepository {
    async fn add(
        &self,
        blockchain_type: &str,
        asset_id: &str,
        client_id: Uuid,
        address: &str,
    ) -> Result<()> {
        let key = (blockchain_type.to_string(), asset_id.to_string(), client_id);
        let mut wallets = self.wallets.write().await;
        if wallets.contains_key(&key) {
            anyhow::bail!(
                "Default wallet already exists: blockchain_type={}, asset_id={}, client_id={}",
                blockchain_type,
                asset_id,
                client_id
            );
        }
        wallets.insert(
            key,
            Wallet::new(blockchain_type, asset_id, client_id, address),
        );
        Ok(())
    }

    async fn try_get(
        &self,
        blockchain_type: &str,
        asset_id: &str,
        client_id: Uuid,
    ) -> Result<Option<Wallet>> {
        let key = (blockchain_type.to_string(), asset_id.to_string(), client_id);
        Ok(self.wallets.read().await.get(&key).cloned())
    }

    async fn try_get_by_address(
        &self,
        blockchain_type: &str,
        address: &str,
    ) -> Result<Option<Wallet>> {
        Ok(self
            .wallets
            .read()
            .await
            .values()
            .find(|w| w.blockchain_type == blockchain_type && w.address == address)
            .cloned())
    }

    async fn exists(
        &self,
        blockchain_type: &str,
        asset_id: &str,
        client_id: Uuid,
    ) -> Result<bool> {
        Ok(self
            .try_get(blockchain_type, asset_id, client_id)
            .await?
            .is_some())
    }

    async fn delete_if_exists(
        &self,
        blockchain_type: &str,
        asset_id: &str,
        client_id: Uuid,
    ) -> Result<()> {
        let key = (blockchain_type.to_string(), asset_id.to_string(), client_id);
        self.wallets.write().await.remove(&key);
        Ok(())
    }

    async fn get_all(
        &self,
        client_id: Uuid,
        take: usize,
        continuation_token: Option<&str>,
    ) -> Result<Page<Wallet>> {
        let wallets = self.wallets.read().await;
        paginate(
            wallets.values().filter(|w| w.client_id == client_id),
            take,
            continuation_token,
        )
    }

    async fn get_by_asset(
        &self,
        blockchain_type: &str,
        asset_id: &str,
        take: usize,
        continuation_token: Option<&str>,
    ) -> Result<Page<Wallet>> {
        let wallets = self.wallets.read().await;
        paginate(
            wallets
                .values()
                .filter(|w| w.blockchain_type == blockchain_type && w.asset_id == asset_id),
            take,
            continuation_token,
        )
    }
}

#[derive(Default)]
pub struct InMemoryAdditionalWalletRepository {
    wallets: RwLock<BTreeMap<AdditionalKey, Wallet>>,
}

impl InMemoryAdditionalWalletRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl AdditionalWalletRepository for InMemoryAdditionalWalletRepository {
    async fn add(
        &self,
        blockchain_type: &str,
        asset_id: &str,
        client_id: Uuid,
        address: &str,
    ) -> Result<()> {
        let key = (
            blockchain_type.to_string(),
            asset_id.to_string(),
            client_id,
            address.to_string(),
        );
        self.wallets.write().await.insert(
            key,
            Wallet::new(blockchain_type, asset_id, client_id, address),
        );
        Ok(())
    }

    async fn exists(
        &self,
        blockchain_type: &str,
        asset_id: &str,
        client_id: Uuid,
    ) -> Result<bool> {
        Ok(self.wallets.read().await.values().any(|w| {
            w.blockchain_type == blockchain_type && w.asset_id == asset_id && w.client_id == client_id
        }))
    }

    async fn try_get_by_address(
        &self,
        blockchain_type: &str,
        address: &str,
    ) -> Result<Option<Wallet>> {
        Ok(self
            .wallets
            .read()
            .await
            .values()
            .find(|w| w.blockchain_type == blockchain_type && w.address == address)
            .cloned())
    }

    async fn delete_all(
        &self,
        blockchain_type: &str,
        asset_id: &str,
        client_id: Uuid,
    ) -> Result<()> {
        self.wallets.write().await.retain(|(bt, asset, client, _), _| {
            !(bt == blockchain_type && asset == asset_id && *client == client_id)
        });
        Ok(())
    }
}

#[derive(Default)]
pub struct InMemoryLegacyCredentialsRepository {
    records: RwLock<HashMap<(Uuid, String), LegacyCredentialsRecord>>,
}

impl InMemoryLegacyCredentialsRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl LegacyCredentialsRepository for InMemoryLegacyCredentialsRepository {
    async fn insert_or_replace(&self, record: LegacyCredentialsRecord) -> Result<()> {
        self.records
            .write()
            .await
            .insert((record.client_id, record.asset_id.clone()), record);
        Ok(())
    }

    async fn try_get(
        &self,
        client_id: Uuid,
        asset_id: &str,
    ) -> Result<Option<LegacyCredentialsRecord>> {
        Ok(self
            .records
            .read()
            .await
            .get(&(client_id, asset_id.to_string()))
            .cloned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_default_tier_is_unique_per_key() {
        let repo = InMemoryWalletRepository::new();
        let client_id = Uuid::new_v4();

        repo.add("Ripple", "XRP", client_id, "r1").await.unwrap();
        assert!(repo.add("Ripple", "XRP", client_id, "r2").await.is_err());
        assert!(repo.exists("Ripple", "XRP", client_id).await.unwrap());

        repo.delete_if_exists("Ripple", "XRP", client_id).await.unwrap();
        repo.delete_if_exists("Ripple", "XRP", client_id).await.unwrap();
        assert!(!repo.exists("Ripple", "XRP", client_id).await.unwrap());
    }

    #[tokio::test]
    async fn test_get_all_paginates() {
        let repo = InMemoryWalletRepository::new();
        let client_id = Uuid::new_v4();
        let other_client = Uuid::new_v4();

        for asset in ["A", "B", "C"] {
            repo.add("Ripple", asset, client_id, &format!("r-{asset}"))
                .await
                .unwrap();
        }
        repo.add("Ripple", "A", other_client, "r-other").await.unwrap();

        let first = repo.get_all(client_id, 2, None).await.unwrap();
        assert_eq!(first.items.len(), 2);
        assert_eq!(first.continuation_token.as_deref(), Some("2"));

        let second = repo
            .get_all(client_id, 2, first.continuation_token.as_deref())
            .await
            .unwrap();
        assert_eq!(second.items.len(), 1);
        assert_eq!(second.items[0].address, "r-C");
        assert!(second.continuation_token.is_none());
    }

    #[tokio::test]
    async fn test_additional_tier_delete_all() {
        let repo = InMemoryAdditionalWalletRepository::new();
        let client_id = Uuid::new_v4();

        repo.add("Ripple", "XRP", client_id, "r1").await.unwrap();
        repo.add("Ripple", "XRP", client_id, "r2").await.unwrap();
        repo.add("Ripple", "XRP2", client_id, "r3").await.unwrap();

        repo.delete_all("Ripple", "XRP", client_id).await.unwrap();

        assert!(!repo.exists("Ripple", "XRP", client_id).await.unwrap());
        assert!(repo.exists("Ripple", "XRP2", client_id).await.unwrap());
        assert!(repo.try_get_by_address("Ripple", "r1").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_legacy_insert_or_replace() {
        let repo = InMemoryLegacyCredentialsRepository::new();
        let client_id = Uuid::new_v4();

        let mut record = LegacyCredentialsRecord::for_modern_wallet("Ripple", "XRP", client_id, "r1");
        repo.insert_or_replace(record.clone()).await.unwrap();
        record.asset_address = "r2".into();
        repo.insert_or_replace(record).await.unwrap();

        let stored = repo.try_get(client_id, "Ripple (XRP)").await.unwrap().unwrap();
        assert_eq!(stored.asset_address, "r2");
    }
}
