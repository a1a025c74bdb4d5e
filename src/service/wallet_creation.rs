//! 钱包创建策略
//!
//! - `ModernWalletCreation`：签名门面生成地址，写入默认层与旧格式兼容记录，发布 `WalletCreated`
//! - `LegacyWalletCreation`：委托给第一代钱包服务，不发布事件，不支持删除

use std::sync::Arc;

use async_trait::async_trait;
use uuid::Uuid;

use crate::{
    domain::{
        LegacyCredentialsRecord, Wallet, WalletError, WalletGeneration, WalletResult, WalletView,
    },
    infrastructure::event_bus::{DomainEvent, EventBus},
    repository::{AdditionalWalletRepository, LegacyCredentialsRepository, WalletRepository},
    service::{
        address_codec::AddressCodec, address_mapping::AddressMapper,
        legacy_wallets::LegacyWalletService, sign_facade::SignFacadeClient,
    },
};

#[async_trait]
pub trait WalletCreationStrategy: Send + Sync {
    fn generation(&self) -> WalletGeneration;

    /// 创建钱包时是否发布领域事件
    fn emits_events(&self) -> bool;

    async fn create_wallet(
        &self,
        blockchain_type: &str,
        asset_id: &str,
        client_id: Uuid,
    ) -> WalletResult<WalletView>;

    async fn try_get_default_address(
        &self,
        blockchain_type: &str,
        asset_id: &str,
        client_id: Uuid,
    ) -> WalletResult<Option<WalletView>>;

    /// 默认层或附加层任一存在即为存在
    async fn wallet_exists(
        &self,
        blockchain_type: &str,
        asset_id: &str,
        client_id: Uuid,
    ) -> WalletResult<bool>;

    /// 只检查默认钱包
    async fn default_wallet_exists(
        &self,
        blockchain_type: &str,
        asset_id: &str,
        client_id: Uuid,
    ) -> WalletResult<bool>;

    /// 删除客户在该资产下的全部钱包
    async fn delete_wallets(
        &self,
        blockchain_type: &str,
        asset_id: &str,
        client_id: Uuid,
    ) -> WalletResult<()>;
}

// ============ 新一代 ============

pub struct ModernWalletCreation {
    sign_facade: Arc<dyn SignFacadeClient>,
    mapper: Arc<AddressMapper>,
    codec: Arc<AddressCodec>,
    wallets: Arc<dyn WalletRepository>,
    additional_wallets: Arc<dyn AdditionalWalletRepository>,
    legacy_credentials: Arc<dyn LegacyCredentialsRepository>,
    event_bus: Arc<dyn EventBus>,
}

impl ModernWalletCreation {
    pub fn new(
        sign_facade: Arc<dyn SignFacadeClient>,
        mapper: Arc<AddressMapper>,
        codec: Arc<AddressCodec>,
        wallets: Arc<dyn WalletRepository>,
        additional_wallets: Arc<dyn AdditionalWalletRepository>,
        legacy_credentials: Arc<dyn LegacyCredentialsRepository>,
        event_bus: Arc<dyn EventBus>,
    ) -> Self {
        Self {
            sign_facade,
            mapper,
            codec,
            wallets,
            additional_wallets,
            legacy_credentials,
            event_bus,
        }
    }

    /// 需要映射时返回底层地址，映射缺失视为数据不一致
    async fn require_underlying_address(
        &self,
        blockchain_type: &str,
        address: &str,
    ) -> WalletResult<Option<String>> {
        if !self.mapper.mapping_required(blockchain_type) {
            return Ok(None);
        }

        match self
            .mapper
            .get_underlying_address(blockchain_type, address)
            .await?
        {
            Some(underlying) => Ok(Some(underlying)),
            None => Err(WalletError::Inconsistency(format!(
                "Failed to get underlying address for blockchain_type={} and address={}",
                blockchain_type, address
            ))),
        }
    }
}

#[async_trait]
impl WalletCreationStrategy for ModernWalletCreation {
    fn generation(&self) -> WalletGeneration {
        WalletGeneration::Modern
    }

    fn emits_events(&self) -> bool {
        true
    }

    async fn create_wallet(
        &self,
        blockchain_type: &str,
        asset_id: &str,
        client_id: Uuid,
    ) -> WalletResult<WalletView> {
        let address = self.sign_facade.create_wallet(blockchain_type).await?;
        let underlying = self
            .require_underlying_address(blockchain_type, &address)
            .await?;

        self.wallets
            .add(blockchain_type, asset_id, client_id, &address)
            .await?;

        self.legacy_credentials
            .insert_or_replace(LegacyCredentialsRecord::for_modern_wallet(
                blockchain_type,
                asset_id,
                client_id,
                &address,
            ))
            .await?;

        self.event_bus
            .publish(DomainEvent::WalletCreated {
                address: address.clone(),
                asset_id: asset_id.to_string(),
                blockchain_type: blockchain_type.to_string(),
            })
            .await?;

        tracing::info!(
            blockchain_type,
            asset_id,
            %client_id,
            address = %address,
            "Wallet created"
        );

        Ok(self.codec.view(Wallet::new(
            blockchain_type,
            asset_id,
            client_id,
            underlying.unwrap_or(address),
        )))
    }

    async fn try_get_default_address(
        &self,
        blockchain_type: &str,
        asset_id: &str,
        client_id: Uuid,
    ) -> WalletResult<Option<WalletView>> {
        let Some(mut wallet) = self
            .wallets
            .try_get(blockchain_type, asset_id, client_id)
            .await?
        else {
            return Ok(None);
        };

        if let Some(underlying) = self
            .require_underlying_address(blockchain_type, &wallet.address)
            .await?
        {
            wallet.address = underlying;
        }

        Ok(Some(self.codec.view(wallet)))
    }

    async fn wallet_exists(
        &self,
        blockchain_type: &str,
        asset_id: &str,
        client_id: Uuid,
    ) -> WalletResult<bool> {
        Ok(self
            .wallets
            .exists(blockchain_type, asset_id, client_id)
            .await?
            || self
                .additional_wallets
                .exists(blockchain_type, asset_id, client_id)
                .await?)
    }

    async fn default_wallet_exists(
        &self,
        blockchain_type: &str,
        asset_id: &str,
        client_id: Uuid,
    ) -> WalletResult<bool> {
        Ok(self
            .wallets
            .exists(blockchain_type, asset_id, client_id)
            .await?)
    }

    /// 先清空附加层，再删除默认钱包并发布一次 `WalletDeleted`
    ///
    /// 默认钱包不存在时返回 `Inconsistency`，此时附加层可能已被清空。
    async fn delete_wallets(
        &self,
        blockchain_type: &str,
        asset_id: &str,
        client_id: Uuid,
    ) -> WalletResult<()> {
        self.additional_wallets
            .delete_all(blockchain_type, asset_id, client_id)
            .await?;

        let wallet = self
            .wallets
            .try_get(blockchain_type, asset_id, client_id)
            .await?
            .ok_or_else(|| {
                WalletError::Inconsistency(format!(
                    "Default wallet not found: blockchain_type={}, asset_id={}, client_id={}",
                    blockchain_type, asset_id, client_id
                ))
            })?;

        self.wallets
            .delete_if_exists(blockchain_type, asset_id, client_id)
            .await?;

        self.event_bus
            .publish(DomainEvent::WalletDeleted {
                address: wallet.address.clone(),
                asset_id: asset_id.to_string(),
                blockchain_type: blockchain_type.to_string(),
            })
            .await?;

        tracing::info!(
            blockchain_type,
            asset_id,
            %client_id,
            address = %wallet.address,
            "Wallets deleted"
        );

        Ok(())
    }
}

// ============ 第一代 ============

pub struct LegacyWalletCreation {
    legacy_wallets: Arc<dyn LegacyWalletService>,
}

impl LegacyWalletCreation {
    pub fn new(legacy_wallets: Arc<dyn LegacyWalletService>) -> Self {
        Self { legacy_wallets }
    }
}

#[async_trait]
impl WalletCreationStrategy for LegacyWalletCreation {
    fn generation(&self) -> WalletGeneration {
        WalletGeneration::Legacy
    }

    fn emits_events(&self) -> bool {
        false
    }

    async fn create_wallet(
        &self,
        _blockchain_type: &str,
        asset_id: &str,
        client_id: Uuid,
    ) -> WalletResult<WalletView> {
        let address = self.legacy_wallets.create_wallet(client_id, asset_id).await?;

        tracing::info!(asset_id, %client_id, address = %address, "Legacy wallet created");

        Ok(WalletView::legacy(asset_id, client_id, address))
    }

    async fn try_get_default_address(
        &self,
        _blockchain_type: &str,
        asset_id: &str,
        client_id: Uuid,
    ) -> WalletResult<Option<WalletView>> {
        Ok(self
            .legacy_wallets
            .try_get_address(client_id, asset_id)
            .await?
            .map(|address| WalletView::legacy(asset_id, client_id, address)))
    }

    async fn wallet_exists(
        &self,
        _blockchain_type: &str,
        asset_id: &str,
        client_id: Uuid,
    ) -> WalletResult<bool> {
        Ok(self
            .legacy_wallets
            .try_get_address(client_id, asset_id)
            .await?
            .is_some())
    }

    /// 第一代只有一个钱包
    async fn default_wallet_exists(
        &self,
        blockchain_type: &str,
        asset_id: &str,
        client_id: Uuid,
    ) -> WalletResult<bool> {
        self.wallet_exists(blockchain_type, asset_id, client_id).await
    }

    async fn delete_wallets(
        &self,
        blockchain_type: &str,
        _asset_id: &str,
        _client_id: Uuid,
    ) -> WalletResult<()> {
        Err(WalletError::NotSupported(format!(
            "Wallets of {} can not be deleted",
            blockchain_type
        )))
    }
}
