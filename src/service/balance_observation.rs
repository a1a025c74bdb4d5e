// 余额观察
// 钱包创建后开始观察地址余额，删除后停止

use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;

use crate::{
    infrastructure::event_bus::{DomainEvent, EventHandler},
    service::blockchain_integration::BlockchainIntegrationService,
};

pub struct BalanceObservationHandler {
    integration: Arc<BlockchainIntegrationService>,
}

impl BalanceObservationHandler {
    pub fn new(integration: Arc<BlockchainIntegrationService>) -> Self {
        Self { integration }
    }
}

#[async_trait]
impl EventHandler for BalanceObservationHandler {
    async fn handle(&self, event: &DomainEvent) -> Result<()> {
        let (blockchain_type, address, start) = match event {
            DomainEvent::WalletCreated {
                blockchain_type,
                address,
                ..
            } => (blockchain_type, address, true),
            DomainEvent::WalletDeleted {
                blockchain_type,
                address,
                ..
            } => (blockchain_type, address, false),
        };

        let Some(client) = self.integration.try_get_api_client(blockchain_type) else {
            tracing::debug!(
                blockchain_type = %blockchain_type,
                "No integration for balance observation"
            );
            return Ok(());
        };

        if start {
            client.start_balance_observation(address).await?;
        } else {
            client.stop_balance_observation(address).await?;
        }

        tracing::debug!(
            blockchain_type = %blockchain_type,
            address = %address,
            observing = start,
            "Balance observation updated"
        );
        Ok(())
    }

    fn event_types(&self) -> Vec<&'static str> {
        vec!["WalletCreated", "WalletDeleted"]
    }
}
