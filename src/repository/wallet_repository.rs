// 钱包数据访问 Repository
//
// 三个存储：
// - 默认层：每个 (blockchain_type, asset_id, client_id) 最多一个钱包
// - 附加层：同一组合下可以有多个附加钱包
// - 旧格式存储：第一代钱包服务读取的兼容记录

use anyhow::Result;
use async_trait::async_trait;
use uuid::Uuid;

use crate::domain::{LegacyCredentialsRecord, Page, Wallet};

/// 分页大小上限
pub const MAX_PAGE_SIZE: usize = 1000;

// ============ Repository Trait ============

#[async_trait]
pub trait WalletRepository: Send + Sync {
    /// 新增默认钱包
    async fn add(
        &self,
        blockchain_type: &str,
        asset_id: &str,
        client_id: Uuid,
        address: &str,
    ) -> Result<()>;

    async fn try_get(
        &self,
        blockchain_type: &str,
        asset_id: &str,
        client_id: Uuid,
    ) -> Result<Option<Wallet>>;

    /// 根据地址查询钱包
    async fn try_get_by_address(
        &self,
        blockchain_type: &str,
        address: &str,
    ) -> Result<Option<Wallet>>;

    async fn exists(&self, blockchain_type: &str, asset_id: &str, client_id: Uuid)
        -> Result<bool>;

    async fn delete_if_exists(
        &self,
        blockchain_type: &str,
        asset_id: &str,
        client_id: Uuid,
    ) -> Result<()>;

    /// 列出客户的全部默认钱包
    async fn get_all(
        &self,
        client_id: Uuid,
        take: usize,
        continuation_token: Option<&str>,
    ) -> Result<Page<Wallet>>;

    /// 列出某链某资产下的全部默认钱包（地址迁移工具使用）
    async fn get_by_asset(
        &self,
        blockchain_type: &str,
        asset_id: &str,
        take: usize,
        continuation_token: Option<&str>,
    ) -> Result<Page<Wallet>>;
}

#[async_trait]
pub trait AdditionalWalletRepository: Send + Sync {
    async fn add(
        &self,
        blockchain_type: &str,
        asset_id: &str,
        client_id: Uuid,
        address: &str,
    ) -> Result<()>;

    async fn exists(&self, blockchain_type: &str, asset_id: &str, client_id: Uuid)
        -> Result<bool>;

    async fn try_get_by_address(
        &self,
        blockchain_type: &str,
        address: &str,
    ) -> Result<Option<Wallet>>;

    /// 删除该组合下的全部附加钱包
    async fn delete_all(&self, blockchain_type: &str, asset_id: &str, client_id: Uuid)
        -> Result<()>;
}

#[async_trait]
pub trait LegacyCredentialsRepository: Send + Sync {
    async fn insert_or_replace(&self, record: LegacyCredentialsRecord) -> Result<()>;

    async fn try_get(&self, client_id: Uuid, asset_id: &str)
        -> Result<Option<LegacyCredentialsRecord>>;
}

// ============ 分页令牌 ============

/// 续传令牌是不透明字符串，内部编码为偏移量
pub fn decode_continuation_token(token: Option<&str>) -> Result<usize> {
    match token {
        None => Ok(0),
        Some(t) if t.is_empty() => Ok(0),
        Some(t) => t
            .parse::<usize>()
            .map_err(|_| anyhow::anyhow!("Invalid continuation token: {}", t)),
    }
}

/// 还有剩余数据时返回下一页令牌
pub fn encode_continuation_token(offset: usize, returned: usize, has_more: bool) -> Option<String> {
    has_more.then(|| (offset + returned).to_string())
}
