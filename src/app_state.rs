use std::{sync::Arc, time::Duration};

use crate::{
    config::Config,
    infrastructure::{
        db::PgPool,
        event_bus::{EventBus, InMemoryEventBus},
    },
    repository::{
        AdditionalWalletRepository, InMemoryAdditionalWalletRepository,
        InMemoryLegacyCredentialsRepository, InMemoryWalletRepository,
        LegacyCredentialsRepository, PgAdditionalWalletRepository, PgLegacyCredentialsRepository,
        PgWalletRepository, WalletRepository,
    },
    service::{
        address_codec::AddressCodec,
        address_mapping::AddressMapper,
        balance_observation::BalanceObservationHandler,
        blockchain_extensions::BlockchainExtensionsService,
        blockchain_integration::BlockchainIntegrationService,
        legacy_wallets::{HttpLegacyWalletService, LegacyWalletService},
        sign_facade::{HttpSignFacadeClient, SignFacadeClient},
        wallet_creation::{LegacyWalletCreation, ModernWalletCreation},
        wallet_service::{WalletService, WalletServiceDeps},
    },
};

/// 外部协作方：HTTP 客户端、仓储与事件总线
pub struct Collaborators {
    pub integration: Arc<BlockchainIntegrationService>,
    pub sign_facade: Arc<dyn SignFacadeClient>,
    pub legacy_wallets: Arc<dyn LegacyWalletService>,
    pub wallets: Arc<dyn WalletRepository>,
    pub additional_wallets: Arc<dyn AdditionalWalletRepository>,
    pub legacy_credentials: Arc<dyn LegacyCredentialsRepository>,
    pub event_bus: Arc<dyn EventBus>,
}

/// 应用状态
/// 包含所有共享资源
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub pool: Option<PgPool>,
    pub integration: Arc<BlockchainIntegrationService>,
    pub extensions: Arc<BlockchainExtensionsService>,
    pub codec: Arc<AddressCodec>,
    pub wallet_service: Arc<WalletService>,
    pub event_bus: Arc<dyn EventBus>,
}

impl AppState {
    /// 根据配置创建应用状态；没有数据库时使用内存仓储
    ///
    /// 需要在 tokio 运行时内调用
    pub fn build(config: Config, pool: Option<PgPool>) -> Self {
        let timeout = Duration::from_secs(config.blockchain_integration.request_timeout_secs);

        let (wallets, additional_wallets, legacy_credentials): (
            Arc<dyn WalletRepository>,
            Arc<dyn AdditionalWalletRepository>,
            Arc<dyn LegacyCredentialsRepository>,
        ) = match &pool {
            Some(pool) => (
                Arc::new(PgWalletRepository::new(pool.clone())),
                Arc::new(PgAdditionalWalletRepository::new(pool.clone())),
                Arc::new(PgLegacyCredentialsRepository::new(pool.clone())),
            ),
            None => {
                tracing::warn!("DATABASE_URL is not configured, using in-memory repositories");
                (
                    Arc::new(InMemoryWalletRepository::new()),
                    Arc::new(InMemoryAdditionalWalletRepository::new()),
                    Arc::new(InMemoryLegacyCredentialsRepository::new()),
                )
            }
        };

        let collaborators = Collaborators {
            integration: Arc::new(BlockchainIntegrationService::from_config(
                &config.blockchain_integration,
            )),
            sign_facade: Arc::new(HttpSignFacadeClient::new(&config.sign_facade, timeout)),
            legacy_wallets: Arc::new(HttpLegacyWalletService::new(
                &config.legacy_wallets,
                timeout,
            )),
            wallets,
            additional_wallets,
            legacy_credentials,
            event_bus: Arc::new(InMemoryEventBus::new(pool.clone())),
        };

        Self::assemble(config, pool, collaborators)
    }

    /// 用给定的协作方组装服务
    pub fn assemble(config: Config, pool: Option<PgPool>, deps: Collaborators) -> Self {
        let extensions = Arc::new(BlockchainExtensionsService::new(
            deps.integration.clone(),
            config.extensions.backoff(),
        ));
        let codec = Arc::new(AddressCodec::new(extensions.clone()));
        let mapper = Arc::new(AddressMapper::new(
            deps.integration.clone(),
            extensions.clone(),
        ));

        let modern = Arc::new(ModernWalletCreation::new(
            deps.sign_facade,
            mapper.clone(),
            codec.clone(),
            deps.wallets.clone(),
            deps.additional_wallets.clone(),
            deps.legacy_credentials,
            deps.event_bus.clone(),
        ));
        let legacy = Arc::new(LegacyWalletCreation::new(deps.legacy_wallets));

        let wallet_service = Arc::new(WalletService::new(WalletServiceDeps {
            modern,
            legacy,
            wallets: deps.wallets,
            additional_wallets: deps.additional_wallets,
            mapper,
            codec: codec.clone(),
            integration: deps.integration.clone(),
        }));

        Self {
            config: Arc::new(config),
            pool,
            integration: deps.integration,
            extensions,
            codec,
            wallet_service,
            event_bus: deps.event_bus,
        }
    }

    /// 订阅事件处理器并启动能力发现
    pub async fn start(&self) {
        self.event_bus
            .subscribe(Arc::new(BalanceObservationHandler::new(
                self.integration.clone(),
            )))
            .await;

        self.extensions.fire_initialization_and_forget();
    }

    pub async fn shutdown(&self) {
        self.extensions.shutdown().await;
    }
}
