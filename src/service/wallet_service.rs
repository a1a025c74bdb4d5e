// 钱包编排服务
// 按区块链类型在第一代与新一代之间路由，负责创建、删除与查询
//
// 写操作由创建策略完成，顺序为 读 -> 修改 -> 发布事件，不跨仓储事务，失败不做补偿。

use std::sync::Arc;

use uuid::Uuid;

use crate::{
    domain::{Page, WalletGeneration, WalletResult, WalletView},
    repository::{AdditionalWalletRepository, WalletRepository},
    service::{
        address_codec::AddressCodec,
        address_mapping::AddressMapper,
        blockchain_integration::BlockchainIntegrationService,
        wallet_creation::WalletCreationStrategy,
    },
};

pub struct WalletService {
    modern: Arc<dyn WalletCreationStrategy>,
    legacy: Arc<dyn WalletCreationStrategy>,
    wallets: Arc<dyn WalletRepository>,
    additional_wallets: Arc<dyn AdditionalWalletRepository>,
    mapper: Arc<AddressMapper>,
    codec: Arc<AddressCodec>,
    integration: Arc<BlockchainIntegrationService>,
}

pub struct WalletServiceDeps {
    pub modern: Arc<dyn WalletCreationStrategy>,
    pub legacy: Arc<dyn WalletCreationStrategy>,
    pub wallets: Arc<dyn WalletRepository>,
    pub additional_wallets: Arc<dyn AdditionalWalletRepository>,
    pub mapper: Arc<AddressMapper>,
    pub codec: Arc<AddressCodec>,
    pub integration: Arc<BlockchainIntegrationService>,
}

impl WalletService {
    pub fn new(deps: WalletServiceDeps) -> Self {
        Self {
            modern: deps.modern,
            legacy: deps.legacy,
            wallets: deps.wallets,
            additional_wallets: deps.additional_wallets,
            mapper: deps.mapper,
            codec: deps.codec,
            integration: deps.integration,
        }
    }

    /// 按区块链类型选择创建策略
    pub fn strategy(&self, blockchain_type: &str) -> &dyn WalletCreationStrategy {
        match WalletGeneration::for_blockchain(blockchain_type) {
            WalletGeneration::Legacy => self.legacy.as_ref(),
            WalletGeneration::Modern => self.modern.as_ref(),
        }
    }

    pub async fn create_wallet(
        &self,
        blockchain_type: &str,
        asset_id: &str,
        client_id: Uuid,
    ) -> WalletResult<WalletView> {
        self.strategy(blockchain_type)
            .create_wallet(blockchain_type, asset_id, client_id)
            .await
    }

    /// 默认层或附加层任一存在即为存在
    pub async fn wallet_exists(
        &self,
        blockchain_type: &str,
        asset_id: &str,
        client_id: Uuid,
    ) -> WalletResult<bool> {
        self.strategy(blockchain_type)
            .wallet_exists(blockchain_type, asset_id, client_id)
            .await
    }

    pub async fn default_wallet_exists(
        &self,
        blockchain_type: &str,
        asset_id: &str,
        client_id: Uuid,
    ) -> WalletResult<bool> {
        self.strategy(blockchain_type)
            .default_wallet_exists(blockchain_type, asset_id, client_id)
            .await
    }

    pub async fn asset_is_supported(
        &self,
        blockchain_type: &str,
        asset_id: &str,
    ) -> WalletResult<bool> {
        Ok(self
            .integration
            .asset_is_supported(blockchain_type, asset_id)
            .await?)
    }

    /// 第一代区块链的钱包不能删除
    pub async fn delete_wallets(
        &self,
        blockchain_type: &str,
        asset_id: &str,
        client_id: Uuid,
    ) -> WalletResult<()> {
        self.strategy(blockchain_type)
            .delete_wallets(blockchain_type, asset_id, client_id)
            .await
    }

    pub async fn try_get_default_address(
        &self,
        blockchain_type: &str,
        asset_id: &str,
        client_id: Uuid,
    ) -> WalletResult<Option<WalletView>> {
        self.strategy(blockchain_type)
            .try_get_default_address(blockchain_type, asset_id, client_id)
            .await
    }

    /// 分页列出客户的默认钱包，单个钱包映射失败时跳过
    pub async fn get_client_wallets(
        &self,
        client_id: Uuid,
        take: usize,
        continuation_token: Option<&str>,
    ) -> WalletResult<Page<WalletView>> {
        let page = self
            .wallets
            .get_all(client_id, take, continuation_token)
            .await?;

        let mut items = Vec::with_capacity(page.items.len());

        for mut wallet in page.items {
            if self.mapper.mapping_required(&wallet.blockchain_type) {
                match self
                    .mapper
                    .get_underlying_address(&wallet.blockchain_type, &wallet.address)
                    .await
                {
                    Ok(Some(underlying)) => wallet.address = underlying,
                    Ok(None) => {
                        tracing::error!(
                            blockchain_type = %wallet.blockchain_type,
                            address = %wallet.address,
                            "Failed to get underlying address"
                        );
                        continue;
                    }
                    Err(e) => {
                        tracing::error!(
                            blockchain_type = %wallet.blockchain_type,
                            address = %wallet.address,
                            error = ?e,
                            "Failed to get underlying address"
                        );
                        continue;
                    }
                }
            }

            items.push(self.codec.view(wallet));
        }

        Ok(Page {
            items,
            continuation_token: page.continuation_token,
        })
    }

    /// 根据地址查找客户，先查默认层再查附加层
    ///
    /// 需要映射时先把地址转换为虚拟地址，没有映射则按原地址查找。
    pub async fn try_get_client_id(
        &self,
        blockchain_type: &str,
        address: &str,
    ) -> WalletResult<Option<Uuid>> {
        let address = self
            .mapper
            .get_virtual_address(blockchain_type, address)
            .await?
            .unwrap_or_else(|| address.to_string());

        if let Some(wallet) = self
            .wallets
            .try_get_by_address(blockchain_type, &address)
            .await?
        {
            return Ok(Some(wallet.client_id));
        }

        Ok(self
            .additional_wallets
            .try_get_by_address(blockchain_type, &address)
            .await?
            .map(|w| w.client_id))
    }
}
