//! 测试辅助模块
//! 提供外部协作方的内存替身和服务组装

#![allow(dead_code)]

use std::{
    collections::{HashMap, HashSet},
    sync::{
        atomic::{AtomicBool, AtomicUsize, Ordering},
        Arc, Mutex,
    },
    time::Duration,
};

use anyhow::Result;
use async_trait::async_trait;
use blockchain_wallets::{
    app_state::{AppState, Collaborators},
    config::Config,
    domain::{AddressExtensionDescriptor, DiscoveredCapabilities},
    infrastructure::event_bus::{DomainEvent, EventBus, EventEnvelope, EventHandler},
    repository::{
        InMemoryAdditionalWalletRepository, InMemoryLegacyCredentialsRepository,
        InMemoryWalletRepository,
    },
    service::{
        blockchain_integration::{BlockchainApiClient, BlockchainAsset, BlockchainIntegrationService},
        legacy_wallets::LegacyWalletService,
        sign_facade::SignFacadeClient,
    },
};
use uuid::Uuid;

// ============ 区块链集成 API 替身 ============

#[derive(Default)]
pub struct FakeBlockchainApi {
    pub capabilities: Mutex<DiscoveredCapabilities>,
    pub descriptor: Mutex<Option<AddressExtensionDescriptor>>,
    /// 虚拟地址 -> 底层地址
    pub underlying: Mutex<HashMap<String, String>>,
    pub failing_underlying: Mutex<HashSet<String>>,
    pub assets: Mutex<HashSet<String>>,
    pub observed: Mutex<HashSet<String>>,
    /// 前 N 次能力查询失败
    pub failures_remaining: AtomicUsize,
    pub capability_calls: AtomicUsize,
}

impl FakeBlockchainApi {
    pub fn plain() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn with_separator(separator: char) -> Arc<Self> {
        let api = Self::default();
        *api.capabilities.lock().unwrap() = DiscoveredCapabilities {
            address_extension_required: true,
            address_mapping_required: false,
        };
        *api.descriptor.lock().unwrap() = Some(AddressExtensionDescriptor {
            separator: Some(separator),
            display_name: Some("Tag".into()),
            base_display_name: Some("Address".into()),
        });
        Arc::new(api)
    }

    pub fn with_mapping() -> Arc<Self> {
        let api = Self::default();
        *api.capabilities.lock().unwrap() = DiscoveredCapabilities {
            address_extension_required: false,
            address_mapping_required: true,
        };
        Arc::new(api)
    }

    pub fn map_address(&self, virtual_address: &str, underlying_address: &str) {
        self.underlying
            .lock()
            .unwrap()
            .insert(virtual_address.to_string(), underlying_address.to_string());
    }

    pub fn fail_mapping_for(&self, virtual_address: &str) {
        self.failing_underlying
            .lock()
            .unwrap()
            .insert(virtual_address.to_string());
    }

    pub fn add_asset(&self, asset_id: &str) {
        self.assets.lock().unwrap().insert(asset_id.to_string());
    }

    pub fn fail_next(&self, times: usize) {
        self.failures_remaining.store(times, Ordering::SeqCst);
    }

    pub fn is_observed(&self, address: &str) -> bool {
        self.observed.lock().unwrap().contains(address)
    }
}

#[async_trait]
impl BlockchainApiClient for FakeBlockchainApi {
    async fn get_capabilities(&self) -> Result<DiscoveredCapabilities> {
        self.capability_calls.fetch_add(1, Ordering::SeqCst);
        let remaining = self.failures_remaining.load(Ordering::SeqCst);
        if remaining > 0 {
            self.failures_remaining.store(remaining - 1, Ordering::SeqCst);
            anyhow::bail!("integration is unavailable");
        }
        Ok(*self.capabilities.lock().unwrap())
    }

    async fn get_constants(&self) -> Result<Option<AddressExtensionDescriptor>> {
        Ok(self.descriptor.lock().unwrap().clone())
    }

    async fn get_underlying_address(&self, address: &str) -> Result<Option<String>> {
        if self.failing_underlying.lock().unwrap().contains(address) {
            anyhow::bail!("mapping lookup failed for {}", address);
        }
        Ok(self.underlying.lock().unwrap().get(address).cloned())
    }

    async fn get_virtual_address(&self, address: &str) -> Result<Option<String>> {
        Ok(self
            .underlying
            .lock()
            .unwrap()
            .iter()
            .find(|(_, underlying)| underlying.as_str() == address)
            .map(|(virtual_address, _)| virtual_address.clone()))
    }

    async fn get_asset(&self, asset_id: &str) -> Result<Option<BlockchainAsset>> {
        Ok(self
            .assets
            .lock()
            .unwrap()
            .contains(asset_id)
            .then(|| BlockchainAsset {
                asset_id: asset_id.to_string(),
                address: None,
                name: None,
                accuracy: None,
            }))
    }

    async fn start_balance_observation(&self, address: &str) -> Result<()> {
        self.observed.lock().unwrap().insert(address.to_string());
        Ok(())
    }

    async fn stop_balance_observation(&self, address: &str) -> Result<()> {
        self.observed.lock().unwrap().remove(address);
        Ok(())
    }
}

// ============ 签名门面替身 ============

#[derive(Default)]
pub struct FakeSignFacade {
    pub next_addresses: Mutex<Vec<String>>,
    pub counter: AtomicUsize,
}

impl FakeSignFacade {
    /// 按顺序返回给定地址，用完后生成 "<blockchain_type>-addr-N"
    pub fn returning(addresses: &[&str]) -> Arc<Self> {
        let facade = Self::default();
        let mut queue: Vec<String> = addresses.iter().map(|a| a.to_string()).collect();
        queue.reverse();
        *facade.next_addresses.lock().unwrap() = queue;
        Arc::new(facade)
    }
}

#[async_trait]
impl SignFacadeClient for FakeSignFacade {
    async fn create_wallet(&self, blockchain_type: &str) -> Result<String> {
        if let Some(address) = self.next_addresses.lock().unwrap().pop() {
            return Ok(address);
        }
        let n = self.counter.fetch_add(1, Ordering::SeqCst);
        Ok(format!("{}-addr-{}", blockchain_type, n))
    }
}

// ============ 第一代钱包服务替身 ============

#[derive(Default)]
pub struct FakeLegacyWallets {
    pub wallets: Mutex<HashMap<(Uuid, String), String>>,
}

#[async_trait]
impl LegacyWalletService for FakeLegacyWallets {
    async fn create_wallet(&self, client_id: Uuid, asset_id: &str) -> Result<String> {
        let address = format!("legacy-{}-{}", asset_id, client_id.simple());
        self.wallets
            .lock()
            .unwrap()
            .insert((client_id, asset_id.to_string()), address.clone());
        Ok(address)
    }

    async fn try_get_address(&self, client_id: Uuid, asset_id: &str) -> Result<Option<String>> {
        Ok(self
            .wallets
            .lock()
            .unwrap()
            .get(&(client_id, asset_id.to_string()))
            .cloned())
    }
}

// ============ 事件总线替身 ============

#[derive(Default)]
pub struct RecordingEventBus {
    pub events: Mutex<Vec<DomainEvent>>,
    pub fail: AtomicBool,
}

impl RecordingEventBus {
    pub fn published(&self) -> Vec<DomainEvent> {
        self.events.lock().unwrap().clone()
    }

    pub fn created_count(&self) -> usize {
        self.published()
            .iter()
            .filter(|e| matches!(e, DomainEvent::WalletCreated { .. }))
            .count()
    }

    pub fn deleted_count(&self) -> usize {
        self.published()
            .iter()
            .filter(|e| matches!(e, DomainEvent::WalletDeleted { .. }))
            .count()
    }
}

#[async_trait]
impl EventBus for RecordingEventBus {
    async fn publish(&self, event: DomainEvent) -> Result<()> {
        if self.fail.load(Ordering::SeqCst) {
            anyhow::bail!("event bus is unavailable");
        }
        self.events.lock().unwrap().push(event);
        Ok(())
    }

    async fn subscribe(&self, _handler: Arc<dyn EventHandler>) {}

    async fn get_event_history(&self, _limit: i64, _offset: i64) -> Result<Vec<EventEnvelope>> {
        Ok(Vec::new())
    }
}

// ============ 服务组装 ============

pub struct TestHarness {
    pub state: AppState,
    pub apis: Vec<(String, Arc<FakeBlockchainApi>)>,
    pub sign_facade: Arc<FakeSignFacade>,
    pub legacy_wallets: Arc<FakeLegacyWallets>,
    pub wallets: Arc<InMemoryWalletRepository>,
    pub additional_wallets: Arc<InMemoryAdditionalWalletRepository>,
    pub legacy_credentials: Arc<InMemoryLegacyCredentialsRepository>,
    pub events: Arc<RecordingEventBus>,
}

pub fn integration_with(apis: &[(String, Arc<FakeBlockchainApi>)]) -> Arc<BlockchainIntegrationService> {
    Arc::new(BlockchainIntegrationService::from_clients(
        apis.iter()
            .map(|(bt, api)| (bt.clone(), api.clone() as Arc<dyn BlockchainApiClient>)),
    ))
}

impl TestHarness {
    pub fn new(apis: Vec<(&str, Arc<FakeBlockchainApi>)>, sign_facade: Arc<FakeSignFacade>) -> Self {
        let apis: Vec<(String, Arc<FakeBlockchainApi>)> = apis
            .into_iter()
            .map(|(bt, api)| (bt.to_string(), api))
            .collect();

        let legacy_wallets = Arc::new(FakeLegacyWallets::default());
        let wallets = Arc::new(InMemoryWalletRepository::new());
        let additional_wallets = Arc::new(InMemoryAdditionalWalletRepository::new());
        let legacy_credentials = Arc::new(InMemoryLegacyCredentialsRepository::new());
        let events = Arc::new(RecordingEventBus::default());

        let mut config = Config::from_env().unwrap();
        config.blockchain_integration.blockchains.clear();

        let state = AppState::assemble(
            config,
            None,
            Collaborators {
                integration: integration_with(&apis),
                sign_facade: sign_facade.clone(),
                legacy_wallets: legacy_wallets.clone(),
                wallets: wallets.clone(),
                additional_wallets: additional_wallets.clone(),
                legacy_credentials: legacy_credentials.clone(),
                event_bus: events.clone(),
            },
        );

        Self {
            state,
            apis,
            sign_facade,
            legacy_wallets,
            wallets,
            additional_wallets,
            legacy_credentials,
            events,
        }
    }

    /// 同步完成所有区块链的能力发现
    pub async fn discover_all(&self) {
        for (blockchain_type, _) in &self.apis {
            self.state
                .extensions
                .try_discover(blockchain_type)
                .await
                .unwrap();
        }
    }
}

/// 轮询等待条件成立
pub async fn wait_until<F: Fn() -> bool>(condition: F, timeout: Duration) -> bool {
    let deadline = tokio::time::Instant::now() + timeout;
    while tokio::time::Instant::now() < deadline {
        if condition() {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    condition()
}
