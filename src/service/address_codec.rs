// 地址扩展编解码
// 合并：base + separator + extension；解析：在第一个分隔符处拆分

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::{
    domain::{OperationErrorCode, Wallet, WalletError, WalletGeneration, WalletResult, WalletView},
    service::blockchain_extensions::BlockchainExtensionsService,
};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddressParts {
    pub base_address: String,
    pub address_extension: String,
}

pub struct AddressCodec {
    extensions: Arc<BlockchainExtensionsService>,
}

impl AddressCodec {
    pub fn new(extensions: Arc<BlockchainExtensionsService>) -> Self {
        Self { extensions }
    }

    /// 合并基础地址与扩展
    ///
    /// 能力未知时按不支持处理
    pub fn merge(
        &self,
        blockchain_type: &str,
        base_address: &str,
        address_extension: &str,
    ) -> WalletResult<String> {
        if base_address.is_empty() {
            return Err(WalletError::invalid_input(
                OperationErrorCode::BaseAddressIsEmpty,
                "Base address is empty",
            ));
        }

        if address_extension.is_empty() {
            return Ok(base_address.to_string());
        }

        if !self
            .extensions
            .is_address_extension_required(blockchain_type)
            .is_true()
        {
            return Err(WalletError::NotSupported(format!(
                "Blockchain type [{}] does not support address extensions",
                blockchain_type
            )));
        }

        let separator = self
            .extensions
            .try_get_address_extension_constants(blockchain_type)
            .and_then(|c| c.usable_separator())
            .ok_or_else(|| {
                WalletError::NotSupported(format!(
                    "Blockchain type [{}] has no address extension separator",
                    blockchain_type
                ))
            })?;

        if base_address.contains(separator) {
            return Err(WalletError::invalid_input(
                OperationErrorCode::BaseAddressShouldNotContainSeparator,
                format!("Base address should not contain a separator ({})", separator),
            ));
        }

        if address_extension.contains(separator) {
            return Err(WalletError::invalid_input(
                OperationErrorCode::ExtensionAddressShouldNotContainSeparator,
                format!("Extension address should not contain a separator ({})", separator),
            ));
        }

        Ok(format!("{}{}{}", base_address, separator, address_extension))
    }

    pub fn parse(&self, blockchain_type: &str, address: &str) -> AddressParts {
        let separator = if self
            .extensions
            .is_address_extension_required(blockchain_type)
            .is_true()
        {
            self.extensions
                .try_get_address_extension_constants(blockchain_type)
                .and_then(|c| c.usable_separator())
        } else {
            None
        };

        match separator.and_then(|sep| address.split_once(sep)) {
            Some((base, extension)) => AddressParts {
                base_address: base.to_string(),
                address_extension: extension.to_string(),
            },
            None => AddressParts {
                base_address: address.to_string(),
                address_extension: String::new(),
            },
        }
    }

    /// 用解析结果构造新一代钱包的视图
    pub fn view(&self, wallet: Wallet) -> WalletView {
        let parts = self.parse(&wallet.blockchain_type, &wallet.address);

        WalletView {
            blockchain_type: wallet.blockchain_type,
            asset_id: wallet.asset_id,
            client_id: wallet.client_id,
            address: wallet.address,
            base_address: parts.base_address,
            address_extension: parts.address_extension,
            generation: WalletGeneration::Modern,
        }
    }
}
