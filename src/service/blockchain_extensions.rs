//! 区块链扩展能力缓存
//!
//! 启动后为每个已配置的区块链启动一个发现任务，查询能力标志与地址扩展常量。
//! 查询失败按指数退避重试直到成功；缓存每个区块链只写入一次。
//! 读取方从不阻塞：尚未发现的区块链返回 `CapabilityFlag::Unknown`。

use std::{
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc, Mutex,
    },
    time::Duration,
};

use anyhow::Result;
use dashmap::DashMap;
use tokio::{sync::watch, task::JoinHandle};

use crate::{
    domain::{
        AddressExtensionConstants, BlockchainCapability, CapabilityFlag, DiscoveredCapabilities,
    },
    infrastructure::backoff::BackoffConfig,
    service::blockchain_integration::BlockchainIntegrationService,
};

pub struct BlockchainExtensionsService {
    integration: Arc<BlockchainIntegrationService>,
    capabilities: DashMap<String, DiscoveredCapabilities>,
    constants: DashMap<String, Arc<AddressExtensionConstants>>,
    retry_delays: DashMap<String, Duration>,
    backoff: BackoffConfig,
    shutdown_tx: watch::Sender<bool>,
    workers: Mutex<Vec<JoinHandle<()>>>,
    started: AtomicBool,
}

impl BlockchainExtensionsService {
    pub fn new(integration: Arc<BlockchainIntegrationService>, backoff: BackoffConfig) -> Self {
        let (shutdown_tx, _) = watch::channel(false);

        Self {
            integration,
            capabilities: DashMap::new(),
            constants: DashMap::new(),
            retry_delays: DashMap::new(),
            backoff,
            shutdown_tx,
            workers: Mutex::new(Vec::new()),
            started: AtomicBool::new(false),
        }
    }

    /// 为每个集成启动发现任务后立即返回
    pub fn fire_initialization_and_forget(self: &Arc<Self>) {
        if self.started.swap(true, Ordering::SeqCst) {
            tracing::warn!("Blockchain extensions initialization already started, ignoring");
            return;
        }

        let handles: Vec<JoinHandle<()>> = self
            .integration
            .api_clients()
            .map(|(blockchain_type, _)| {
                let service = Arc::clone(self);
                let blockchain_type = blockchain_type.clone();
                let shutdown = self.shutdown_tx.subscribe();
                tokio::spawn(async move { service.discover_until_success(blockchain_type, shutdown).await })
            })
            .collect();

        tracing::info!(
            workers = handles.len(),
            "Blockchain extensions discovery started"
        );

        match self.workers.lock() {
            Ok(mut workers) => workers.extend(handles),
            Err(poisoned) => poisoned.into_inner().extend(handles),
        }
    }

    async fn discover_until_success(
        self: Arc<Self>,
        blockchain_type: String,
        mut shutdown: watch::Receiver<bool>,
    ) {
        loop {
            if *shutdown.borrow() {
                return;
            }

            let error = match self.try_discover(&blockchain_type).await {
                Ok(()) => {
                    tracing::info!(
                        blockchain_type = %blockchain_type,
                        "Blockchain capabilities discovered"
                    );
                    return;
                }
                Err(e) => e,
            };

            let delay = *self
                .retry_delays
                .entry(blockchain_type.clone())
                .or_insert_with(|| self.backoff.initial_delay.min(self.backoff.max_delay));

            tracing::warn!(
                blockchain_type = %blockchain_type,
                error = ?error,
                retry_in_secs = delay.as_secs_f64(),
                "Unable to obtain capabilities or constants, will retry till success"
            );

            tokio::select! {
                _ = tokio::time::sleep(delay) => {}
                _ = shutdown.changed() => {
                    tracing::debug!(blockchain_type = %blockchain_type, "Discovery worker stopped");
                    return;
                }
            }

            self.retry_delays
                .insert(blockchain_type.clone(), self.backoff.next_delay(delay));
        }
    }

    /// 单次发现：成功时写入缓存并清除重试状态
    ///
    /// 先写常量再写能力标志，读取方看到 `address_extension_required = true` 时常量一定已存在。
    pub async fn try_discover(&self, blockchain_type: &str) -> Result<()> {
        let client = self
            .integration
            .try_get_api_client(blockchain_type)
            .ok_or_else(|| anyhow::anyhow!("Blockchain type {} is not supported", blockchain_type))?;

        let capabilities = client.get_capabilities().await?;

        if capabilities.address_extension_required {
            let descriptor = client.get_constants().await?;
            let constants = AddressExtensionConstants::from_descriptor(blockchain_type, descriptor);
            self.constants
                .entry(blockchain_type.to_string())
                .or_insert_with(|| Arc::new(constants));
        }

        self.capabilities
            .entry(blockchain_type.to_string())
            .or_insert(capabilities);

        self.retry_delays.remove(blockchain_type);
        Ok(())
    }

    fn try_get_capabilities(&self, blockchain_type: &str, capability: &str) -> Option<DiscoveredCapabilities> {
        if !self.integration.blockchain_is_supported(blockchain_type) {
            tracing::warn!(
                blockchain_type,
                capability,
                "Capability for unsupported blockchain type was queried"
            );
            return None;
        }

        let cached = self.capabilities.get(blockchain_type).map(|c| *c);
        if cached.is_none() {
            tracing::warn!(
                blockchain_type,
                capability,
                "Capability is not discovered yet"
            );
        }
        cached
    }

    pub fn is_address_extension_required(&self, blockchain_type: &str) -> CapabilityFlag {
        self.try_get_capabilities(blockchain_type, "IsPublicAddressExtensionRequired")
            .map(|c| c.address_extension_required)
            .into()
    }

    pub fn is_address_mapping_required(&self, blockchain_type: &str) -> CapabilityFlag {
        self.try_get_capabilities(blockchain_type, "IsAddressMappingRequired")
            .map(|c| c.address_mapping_required)
            .into()
    }

    pub fn capability(&self, blockchain_type: &str) -> BlockchainCapability {
        BlockchainCapability {
            blockchain_type: blockchain_type.to_string(),
            address_extension_required: self.is_address_extension_required(blockchain_type),
            address_mapping_required: self.is_address_mapping_required(blockchain_type),
        }
    }

    pub fn try_get_address_extension_constants(
        &self,
        blockchain_type: &str,
    ) -> Option<Arc<AddressExtensionConstants>> {
        if !self.integration.blockchain_is_supported(blockchain_type) {
            tracing::warn!(
                blockchain_type,
                "Constants for unsupported blockchain type were queried"
            );
            return None;
        }

        self.constants.get(blockchain_type).map(|c| c.value().clone())
    }

    /// 当前的重试等待时间，未处于重试中时返回 None
    pub fn current_retry_delay(&self, blockchain_type: &str) -> Option<Duration> {
        self.retry_delays.get(blockchain_type).map(|d| *d)
    }

    /// 通知所有发现任务停止并等待其退出
    pub async fn shutdown(&self) {
        self.shutdown_tx.send_replace(true);

        let handles = match self.workers.lock() {
            Ok(mut workers) => std::mem::take(&mut *workers),
            Err(poisoned) => std::mem::take(&mut *poisoned.into_inner()),
        };

        for result in futures::future::join_all(handles).await {
            if let Err(e) = result {
                tracing::error!(error = ?e, "Discovery worker terminated abnormally");
            }
        }

        tracing::info!("Blockchain extensions discovery stopped");
    }
}
