//! 钱包领域模型

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// 第一代（旧）钱包子系统的区块链标识
pub const LEGACY_BLOCKCHAIN_TYPE: &str = "FirstGenerationBlockchain";

/// 钱包代际
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum WalletGeneration {
    /// 旧的单链钱包服务
    Legacy,
    /// 多链钱包仓储
    Modern,
}

impl WalletGeneration {
    pub fn for_blockchain(blockchain_type: &str) -> Self {
        if blockchain_type == LEGACY_BLOCKCHAIN_TYPE {
            WalletGeneration::Legacy
        } else {
            WalletGeneration::Modern
        }
    }
}

/// 持久化的钱包记录（默认层或附加层）
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Wallet {
    pub blockchain_type: String,
    pub asset_id: String,
    pub client_id: Uuid,
    /// 合并后的地址（可能包含扩展）
    pub address: String,
}

impl Wallet {
    pub fn new(
        blockchain_type: impl Into<String>,
        asset_id: impl Into<String>,
        client_id: Uuid,
        address: impl Into<String>,
    ) -> Self {
        Self {
            blockchain_type: blockchain_type.into(),
            asset_id: asset_id.into(),
            client_id,
            address: address.into(),
        }
    }
}

/// 对外返回的钱包视图，地址已拆分为基础地址与扩展
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WalletView {
    pub blockchain_type: String,
    pub asset_id: String,
    pub client_id: Uuid,
    pub address: String,
    pub base_address: String,
    pub address_extension: String,
    pub generation: WalletGeneration,
}

impl WalletView {
    /// 第一代钱包没有地址扩展
    pub fn legacy(asset_id: impl Into<String>, client_id: Uuid, address: impl Into<String>) -> Self {
        let address = address.into();
        Self {
            blockchain_type: LEGACY_BLOCKCHAIN_TYPE.to_string(),
            asset_id: asset_id.into(),
            client_id,
            base_address: address.clone(),
            address,
            address_extension: String::new(),
            generation: WalletGeneration::Legacy,
        }
    }
}

/// 分页结果
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub continuation_token: Option<String>,
}

/// 旧格式存储中的兼容记录
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LegacyCredentialsRecord {
    pub client_id: Uuid,
    /// 形如 "<blockchain_type> (<asset_id>)"
    pub asset_id: String,
    pub asset_address: String,
    pub address: String,
    pub public_key: String,
    pub encoded_key: String,
}

impl LegacyCredentialsRecord {
    /// 新一代钱包在旧存储中的镜像记录
    pub fn for_modern_wallet(
        blockchain_type: &str,
        asset_id: &str,
        client_id: Uuid,
        address: &str,
    ) -> Self {
        Self {
            client_id,
            asset_id: format!("{} ({})", blockchain_type, asset_id),
            asset_address: address.to_string(),
            address: String::new(),
            public_key: String::new(),
            encoded_key: String::new(),
        }
    }
}
