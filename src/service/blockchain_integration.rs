// 区块链集成服务
// 每个 blockchain_type 对应一个集成 API 客户端（HTTP + JSON）

use std::{collections::BTreeMap, sync::Arc, time::Duration};

use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::{
    config::BlockchainIntegrationConfig,
    domain::{AddressExtensionDescriptor, DiscoveredCapabilities, LEGACY_BLOCKCHAIN_TYPE},
};

// ============ 集成 API 数据结构 ============

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CapabilitiesResponse {
    #[serde(default)]
    pub is_public_address_extension_required: bool,
    #[serde(default)]
    pub is_address_mapping_required: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PublicAddressExtensionResponse {
    pub separator: Option<char>,
    pub display_name: Option<String>,
    pub base_display_name: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConstantsResponse {
    pub public_address_extension: Option<PublicAddressExtensionResponse>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct UnderlyingAddressResponse {
    underlying_address: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct VirtualAddressResponse {
    virtual_address: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BlockchainAsset {
    pub asset_id: String,
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub accuracy: Option<i32>,
}

impl From<PublicAddressExtensionResponse> for AddressExtensionDescriptor {
    fn from(r: PublicAddressExtensionResponse) -> Self {
        Self {
            separator: r.separator,
            display_name: r.display_name,
            base_display_name: r.base_display_name,
        }
    }
}

// ============ 集成 API 客户端 ============

#[async_trait]
pub trait BlockchainApiClient: Send + Sync {
    async fn get_capabilities(&self) -> Result<DiscoveredCapabilities>;

    /// 集成未声明地址扩展时返回 None
    async fn get_constants(&self) -> Result<Option<AddressExtensionDescriptor>>;

    /// 虚拟地址 -> 底层地址，无映射时返回 None
    async fn get_underlying_address(&self, address: &str) -> Result<Option<String>>;

    /// 底层地址 -> 虚拟地址，无映射时返回 None
    async fn get_virtual_address(&self, address: &str) -> Result<Option<String>>;

    async fn get_asset(&self, asset_id: &str) -> Result<Option<BlockchainAsset>>;

    async fn start_balance_observation(&self, address: &str) -> Result<()>;

    async fn stop_balance_observation(&self, address: &str) -> Result<()>;
}

pub struct HttpBlockchainApiClient {
    http_client: reqwest::Client,
    base_url: String,
}

impl HttpBlockchainApiClient {
    pub fn new(base_url: &str, timeout: Duration) -> Self {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .connect_timeout(Duration::from_secs(10))
            .pool_idle_timeout(Duration::from_secs(90))
            .pool_max_idle_per_host(10)
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());

        Self {
            http_client: client,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    fn url(&self, segments: &[&str]) -> Result<reqwest::Url> {
        endpoint_url(&self.base_url, segments)
    }

    /// GET 请求，404/204 视为不存在
    async fn get_optional<T: serde::de::DeserializeOwned>(
        &self,
        segments: &[&str],
    ) -> Result<Option<T>> {
        let url = self.url(segments)?;
        let response = self
            .http_client
            .get(url.clone())
            .send()
            .await
            .with_context(|| format!("Failed to send request to {}", url))?;

        let status = response.status();
        if status == reqwest::StatusCode::NOT_FOUND || status == reqwest::StatusCode::NO_CONTENT {
            return Ok(None);
        }
        if !status.is_success() {
            anyhow::bail!("Blockchain API {} returned {}", url, status);
        }

        let body = response
            .json::<T>()
            .await
            .with_context(|| format!("Failed to parse response from {}", url))?;
        Ok(Some(body))
    }

    async fn get_required<T: serde::de::DeserializeOwned>(&self, segments: &[&str]) -> Result<T> {
        self.get_optional(segments)
            .await?
            .with_context(|| format!("Empty response from {}/{}", self.base_url, segments.join("/")))
    }

    async fn send_observation(&self, method: reqwest::Method, address: &str) -> Result<()> {
        let url = self.url(&["api", "balances", address, "observation"])?;
        let response = self
            .http_client
            .request(method, url.clone())
            .send()
            .await
            .with_context(|| format!("Failed to send request to {}", url))?;

        // 409: 已在观察中；204: 未在观察中
        let status = response.status();
        if status.is_success() || status == reqwest::StatusCode::CONFLICT {
            return Ok(());
        }
        anyhow::bail!("Blockchain API {} returned {}", url, status)
    }
}

/// 在基础 URL 后逐段追加路径，每段单独做百分号编码
///
/// 地址中的 `#`、`?`、`/` 不会改变请求的路径结构。
pub(crate) fn endpoint_url(base_url: &str, segments: &[&str]) -> Result<reqwest::Url> {
    let mut url = reqwest::Url::parse(base_url)
        .with_context(|| format!("Invalid service url: {}", base_url))?;
    url.path_segments_mut()
        .map_err(|_| anyhow::anyhow!("Service url can not be a base: {}", base_url))?
        .pop_if_empty()
        .extend(segments);
    Ok(url)
}

#[async_trait]
impl BlockchainApiClient for HttpBlockchainApiClient {
    async fn get_capabilities(&self) -> Result<DiscoveredCapabilities> {
        let response: CapabilitiesResponse = self.get_required(&["api", "capabilities"]).await?;
        Ok(DiscoveredCapabilities {
            address_extension_required: response.is_public_address_extension_required,
            address_mapping_required: response.is_address_mapping_required,
        })
    }

    async fn get_constants(&self) -> Result<Option<AddressExtensionDescriptor>> {
        let response: ConstantsResponse = self.get_required(&["api", "constants"]).await?;
        Ok(response.public_address_extension.map(Into::into))
    }

    async fn get_underlying_address(&self, address: &str) -> Result<Option<String>> {
        let response: Option<UnderlyingAddressResponse> = self
            .get_optional(&["api", "addresses", address, "underlying-address"])
            .await?;
        Ok(response
            .and_then(|r| r.underlying_address)
            .filter(|a| !a.is_empty()))
    }

    async fn get_virtual_address(&self, address: &str) -> Result<Option<String>> {
        let response: Option<VirtualAddressResponse> = self
            .get_optional(&["api", "addresses", address, "virtual-address"])
            .await?;
        Ok(response
            .and_then(|r| r.virtual_address)
            .filter(|a| !a.is_empty()))
    }

    async fn get_asset(&self, asset_id: &str) -> Result<Option<BlockchainAsset>> {
        self.get_optional(&["api", "assets", asset_id]).await
    }

    async fn start_balance_observation(&self, address: &str) -> Result<()> {
        self.send_observation(reqwest::Method::POST, address).await
    }

    async fn stop_balance_observation(&self, address: &str) -> Result<()> {
        self.send_observation(reqwest::Method::DELETE, address).await
    }
}

// ============ 集成服务 ============

/// 已配置的集成客户端集合
pub struct BlockchainIntegrationService {
    clients: BTreeMap<String, Arc<dyn BlockchainApiClient>>,
}

impl BlockchainIntegrationService {
    pub fn from_config(config: &BlockchainIntegrationConfig) -> Self {
        let timeout = Duration::from_secs(config.request_timeout_secs);
        let clients = config
            .blockchains
            .iter()
            .map(|entry| {
                let client: Arc<dyn BlockchainApiClient> =
                    Arc::new(HttpBlockchainApiClient::new(&entry.api_url, timeout));
                (entry.blockchain_type.clone(), client)
            })
            .collect();

        Self { clients }
    }

    pub fn from_clients(
        clients: impl IntoIterator<Item = (String, Arc<dyn BlockchainApiClient>)>,
    ) -> Self {
        Self {
            clients: clients.into_iter().collect(),
        }
    }

    pub fn blockchain_is_supported(&self, blockchain_type: &str) -> bool {
        self.clients.contains_key(blockchain_type)
    }

    pub fn try_get_api_client(&self, blockchain_type: &str) -> Option<Arc<dyn BlockchainApiClient>> {
        self.clients.get(blockchain_type).cloned()
    }

    pub fn api_clients(&self) -> impl Iterator<Item = (&String, &Arc<dyn BlockchainApiClient>)> {
        self.clients.iter()
    }

    /// 第一代区块链的资产始终视为受支持
    pub async fn asset_is_supported(&self, blockchain_type: &str, asset_id: &str) -> Result<bool> {
        if blockchain_type == LEGACY_BLOCKCHAIN_TYPE {
            return Ok(true);
        }

        match self.try_get_api_client(blockchain_type) {
            Some(client) => Ok(client.get_asset(asset_id).await?.is_some()),
            None => Ok(false),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_capabilities_response_parsing() {
        let json = r#"{"isPublicAddressExtensionRequired":true,"isAddressMappingRequired":false,"areManyInputsSupported":true}"#;
        let parsed: CapabilitiesResponse = serde_json::from_str(json).unwrap();

        assert!(parsed.is_public_address_extension_required);
        assert!(!parsed.is_address_mapping_required);
    }

    #[test]
    fn test_constants_response_parsing() {
        let json = r#"{"publicAddressExtension":{"separator":"$","displayName":"Tag","baseDisplayName":"Address"}}"#;
        let parsed: ConstantsResponse = serde_json::from_str(json).unwrap();
        let descriptor: AddressExtensionDescriptor =
            parsed.public_address_extension.unwrap().into();

        assert_eq!(descriptor.separator, Some('$'));
        assert_eq!(descriptor.display_name.as_deref(), Some("Tag"));

        let empty: ConstantsResponse = serde_json::from_str("{}").unwrap();
        assert!(empty.public_address_extension.is_none());
    }

    #[test]
    fn test_supported_blockchains_from_config() {
        let config = BlockchainIntegrationConfig {
            blockchains: vec![crate::config::BlockchainIntegrationEntry {
                blockchain_type: "Ripple".into(),
                api_url: "http://ripple-api/".into(),
            }],
            request_timeout_secs: 5,
        };
        let service = BlockchainIntegrationService::from_config(&config);

        assert!(service.blockchain_is_supported("Ripple"));
        assert!(!service.blockchain_is_supported("Stellar"));
        assert_eq!(service.api_clients().count(), 1);
    }

    #[test]
    fn test_endpoint_url_escapes_address_segments() {
        let url = endpoint_url(
            "http://ripple-api",
            &["api", "addresses", "rAddr#123", "underlying-address"],
        )
        .unwrap();
        assert_eq!(url.path(), "/api/addresses/rAddr%23123/underlying-address");
        assert!(url.fragment().is_none());

        let url = endpoint_url(
            "http://stellar-api/v1/",
            &["api", "balances", "GA/5X?memo=1", "observation"],
        )
        .unwrap();
        assert_eq!(url.path(), "/v1/api/balances/GA%2F5X%3Fmemo=1/observation");
        assert!(url.query().is_none());

        assert!(endpoint_url("not a url", &["api"]).is_err());
    }

    #[tokio::test]
    async fn test_legacy_asset_is_always_supported() {
        let service = BlockchainIntegrationService::from_clients(Vec::new());

        assert!(service
            .asset_is_supported(LEGACY_BLOCKCHAIN_TYPE, "ETH")
            .await
            .unwrap());
        assert!(!service.asset_is_supported("Ripple", "XRP").await.unwrap());
    }
}
