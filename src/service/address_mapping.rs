//! 虚拟地址与底层地址之间的映射
//!
//! 仅当区块链声明 `address_mapping_required = true` 时才调用集成 API；
//! 其余情况（包括能力未知）一律视为无映射。

use std::sync::Arc;

use anyhow::Result;

use crate::service::{
    blockchain_extensions::BlockchainExtensionsService,
    blockchain_integration::BlockchainIntegrationService,
};

pub struct AddressMapper {
    integration: Arc<BlockchainIntegrationService>,
    extensions: Arc<BlockchainExtensionsService>,
}

impl AddressMapper {
    pub fn new(
        integration: Arc<BlockchainIntegrationService>,
        extensions: Arc<BlockchainExtensionsService>,
    ) -> Self {
        Self {
            integration,
            extensions,
        }
    }

    pub fn mapping_required(&self, blockchain_type: &str) -> bool {
        self.extensions
            .is_address_mapping_required(blockchain_type)
            .is_true()
    }

    pub async fn get_underlying_address(
        &self,
        blockchain_type: &str,
        address: &str,
    ) -> Result<Option<String>> {
        if !self.mapping_required(blockchain_type) {
            return Ok(None);
        }

        match self.integration.try_get_api_client(blockchain_type) {
            Some(client) => client.get_underlying_address(address).await,
            None => Ok(None),
        }
    }

    pub async fn get_virtual_address(
        &self,
        blockchain_type: &str,
        address: &str,
    ) -> Result<Option<String>> {
        if !self.mapping_required(blockchain_type) {
            return Ok(None);
        }

        match self.integration.try_get_api_client(blockchain_type) {
            Some(client) => client.get_virtual_address(address).await,
            None => Ok(None),
        }
    }
}
