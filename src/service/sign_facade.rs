// 签名门面客户端
// 为新一代区块链生成钱包，返回公开地址

use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::{config::SignFacadeConfig, service::blockchain_integration::endpoint_url};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CreatedWalletResponse {
    public_address: String,
}

#[async_trait]
pub trait SignFacadeClient: Send + Sync {
    async fn create_wallet(&self, blockchain_type: &str) -> Result<String>;
}

pub struct HttpSignFacadeClient {
    http_client: reqwest::Client,
    service_url: String,
    api_key: String,
}

impl HttpSignFacadeClient {
    pub fn new(config: &SignFacadeConfig, timeout: Duration) -> Self {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .connect_timeout(Duration::from_secs(10))
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());

        Self {
            http_client: client,
            service_url: config.service_url.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone(),
        }
    }
}

#[async_trait]
impl SignFacadeClient for HttpSignFacadeClient {
    async fn create_wallet(&self, blockchain_type: &str) -> Result<String> {
        let url = endpoint_url(&self.service_url, &["api", blockchain_type, "wallets"])?;

        let response = self
            .http_client
            .post(url)
            .header("ApiKey", &self.api_key)
            .send()
            .await
            .context("Failed to send sign facade request")?;

        let status = response.status();
        if !status.is_success() {
            anyhow::bail!("Sign facade returned {} for {}", status, blockchain_type);
        }

        let wallet: CreatedWalletResponse = response
            .json()
            .await
            .context("Failed to parse sign facade response")?;

        if wallet.public_address.is_empty() {
            anyhow::bail!("Sign facade returned an empty address for {}", blockchain_type);
        }

        Ok(wallet.public_address)
    }
}
