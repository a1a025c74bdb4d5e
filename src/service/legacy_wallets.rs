// 第一代钱包服务客户端
// 第一代区块链的钱包由独立服务创建和查询

use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{config::LegacyWalletsConfig, service::blockchain_integration::endpoint_url};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CreateLegacyWalletRequest {
    client_id: Uuid,
    asset_id: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct LegacyWalletResponse {
    address: String,
}

#[async_trait]
pub trait LegacyWalletService: Send + Sync {
    async fn create_wallet(&self, client_id: Uuid, asset_id: &str) -> Result<String>;

    async fn try_get_address(&self, client_id: Uuid, asset_id: &str) -> Result<Option<String>>;
}

pub struct HttpLegacyWalletService {
    http_client: reqwest::Client,
    service_url: String,
}

impl HttpLegacyWalletService {
    pub fn new(config: &LegacyWalletsConfig, timeout: Duration) -> Self {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .connect_timeout(Duration::from_secs(10))
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());

        Self {
            http_client: client,
            service_url: config.service_url.trim_end_matches('/').to_string(),
        }
    }
}

#[async_trait]
impl LegacyWalletService for HttpLegacyWalletService {
    async fn create_wallet(&self, client_id: Uuid, asset_id: &str) -> Result<String> {
        let url = format!("{}/api/wallets", self.service_url);

        let response = self
            .http_client
            .post(&url)
            .json(&CreateLegacyWalletRequest {
                client_id,
                asset_id: asset_id.to_string(),
            })
            .send()
            .await
            .context("Failed to send legacy wallet request")?;

        let status = response.status();
        if !status.is_success() {
            anyhow::bail!("Legacy wallet service returned {} for asset {}", status, asset_id);
        }

        let wallet: LegacyWalletResponse = response
            .json()
            .await
            .context("Failed to parse legacy wallet response")?;
        Ok(wallet.address)
    }

    async fn try_get_address(&self, client_id: Uuid, asset_id: &str) -> Result<Option<String>> {
        let client_id = client_id.to_string();
        let url = endpoint_url(
            &self.service_url,
            &["api", "wallets", asset_id, "by-client-ids", client_id.as_str()],
        )?;

        let response = self
            .http_client
            .get(url)
            .send()
            .await
            .context("Failed to send legacy wallet request")?;

        let status = response.status();
        if status == reqwest::StatusCode::NOT_FOUND || status == reqwest::StatusCode::NO_CONTENT {
            return Ok(None);
        }
        if !status.is_success() {
            anyhow::bail!("Legacy wallet service returned {} for asset {}", status, asset_id);
        }

        let wallet: LegacyWalletResponse = response
            .json()
            .await
            .context("Failed to parse legacy wallet response")?;
        Ok(Some(wallet.address).filter(|a| !a.is_empty()))
    }
}
