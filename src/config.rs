//! 配置管理模块
//! 支持从环境变量和配置文件加载配置

use std::{collections::HashSet, path::Path, time::Duration};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::infrastructure::backoff::{
    BackoffConfig, DEFAULT_INITIAL_RETRY_DELAY_SECS, DEFAULT_MAX_RETRY_DELAY_SECS,
};

/// 应用配置结构体
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub server: ServerConfig,
    pub logging: LoggingConfig,
    #[serde(default)]
    pub database: DatabaseConfig,
    #[serde(default)]
    pub blockchain_integration: BlockchainIntegrationConfig,
    #[serde(default)]
    pub sign_facade: SignFacadeConfig,
    #[serde(default)]
    pub legacy_wallets: LegacyWalletsConfig,
    #[serde(default)]
    pub extensions: ExtensionsDiscoveryConfig,
}

/// 服务器配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub bind_addr: String,
}

/// 日志配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    pub level: String,
    pub format: String, // "json" or "text"
}

/// 数据库配置；未配置 url 时使用内存仓储
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    pub url: Option<String>,
    pub max_connections: u32,
    pub min_connections: u32,
    pub acquire_timeout_secs: u64,
    pub idle_timeout_secs: u64,
}

/// 单个区块链集成层
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockchainIntegrationEntry {
    pub blockchain_type: String,
    pub api_url: String,
}

/// 区块链集成层配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BlockchainIntegrationConfig {
    #[serde(default)]
    pub blockchains: Vec<BlockchainIntegrationEntry>,
    pub request_timeout_secs: u64,
}

/// 签名服务配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SignFacadeConfig {
    pub service_url: String,
    pub api_key: String,
}

/// 第一代钱包服务配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LegacyWalletsConfig {
    pub service_url: String,
}

/// 能力发现的重试配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtensionsDiscoveryConfig {
    pub initial_retry_delay_secs: u64,
    pub max_retry_delay_secs: u64,
}

fn env_parse<T: std::str::FromStr>(key: &str) -> Option<T> {
    std::env::var(key).ok().and_then(|s| s.parse().ok())
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: std::env::var("BIND_ADDR").unwrap_or_else(|_| "0.0.0.0:8088".into()),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: std::env::var("LOG_LEVEL").unwrap_or_else(|_| "info".into()),
            format: std::env::var("LOG_FORMAT").unwrap_or_else(|_| "text".into()),
        }
    }
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: std::env::var("DATABASE_URL").ok().filter(|s| !s.is_empty()),
            max_connections: env_parse("DB_MAX_CONNS").unwrap_or(16),
            min_connections: env_parse("DB_MIN_CONNS").unwrap_or(2),
            acquire_timeout_secs: env_parse("DB_ACQ_TIMEOUT_SECS").unwrap_or(5),
            idle_timeout_secs: env_parse("DB_IDLE_TIMEOUT_SECS").unwrap_or(300),
        }
    }
}

impl Default for BlockchainIntegrationConfig {
    fn default() -> Self {
        let blockchains = std::env::var("BLOCKCHAIN_INTEGRATIONS")
            .ok()
            .map(|raw| match parse_integrations(&raw) {
                Ok(entries) => entries,
                Err(e) => {
                    tracing::warn!("Ignoring malformed BLOCKCHAIN_INTEGRATIONS: {}", e);
                    Vec::new()
                }
            })
            .unwrap_or_default();

        Self {
            blockchains,
            request_timeout_secs: env_parse("INTEGRATION_TIMEOUT_SECS").unwrap_or(30),
        }
    }
}

impl Default for SignFacadeConfig {
    fn default() -> Self {
        Self {
            service_url: std::env::var("SIGN_FACADE_URL")
                .unwrap_or_else(|_| "http://blockchain-sign-facade.services.svc.cluster.local".into()),
            api_key: std::env::var("SIGN_FACADE_API_KEY").unwrap_or_default(),
        }
    }
}

impl Default for LegacyWalletsConfig {
    fn default() -> Self {
        Self {
            service_url: std::env::var("LEGACY_WALLETS_URL")
                .unwrap_or_else(|_| "http://legacy-wallets.services.svc.cluster.local".into()),
        }
    }
}

impl Default for ExtensionsDiscoveryConfig {
    fn default() -> Self {
        Self {
            initial_retry_delay_secs: env_parse("EXTENSIONS_INITIAL_RETRY_DELAY_SECS")
                .unwrap_or(DEFAULT_INITIAL_RETRY_DELAY_SECS),
            max_retry_delay_secs: env_parse("EXTENSIONS_MAX_RETRY_DELAY_SECS")
                .unwrap_or(DEFAULT_MAX_RETRY_DELAY_SECS),
        }
    }
}

impl ExtensionsDiscoveryConfig {
    pub fn backoff(&self) -> BackoffConfig {
        BackoffConfig::new(
            Duration::from_secs(self.initial_retry_delay_secs),
            Duration::from_secs(self.max_retry_delay_secs),
        )
    }
}

/// 解析 "Ripple=http://ripple-api,Stellar=http://stellar-api"
pub fn parse_integrations(raw: &str) -> Result<Vec<BlockchainIntegrationEntry>> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|pair| {
            let (blockchain_type, api_url) = pair
                .split_once('=')
                .with_context(|| format!("Expected <blockchain_type>=<api_url>, got '{}'", pair))?;
            let blockchain_type = blockchain_type.trim();
            let api_url = api_url.trim();
            if blockchain_type.is_empty() || api_url.is_empty() {
                anyhow::bail!("Empty blockchain type or api url in '{}'", pair);
            }
            Ok(BlockchainIntegrationEntry {
                blockchain_type: blockchain_type.to_string(),
                api_url: api_url.trim_end_matches('/').to_string(),
            })
        })
        .collect()
}

impl Config {
    /// 从环境变量加载配置
    pub fn from_env() -> Result<Self> {
        Ok(Self {
            server: ServerConfig::default(),
            logging: LoggingConfig::default(),
            database: DatabaseConfig::default(),
            blockchain_integration: BlockchainIntegrationConfig::default(),
            sign_facade: SignFacadeConfig::default(),
            legacy_wallets: LegacyWalletsConfig::default(),
            extensions: ExtensionsDiscoveryConfig::default(),
        })
    }

    /// 从配置文件加载配置
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref())
            .with_context(|| format!("Failed to read config file: {:?}", path.as_ref()))?;

        let config: Config =
            toml::from_str(&content).with_context(|| "Failed to parse config file as TOML")?;

        Ok(config)
    }

    /// 从环境变量和配置文件合并加载（配置文件优先级更高）
    pub fn from_env_and_file<P: AsRef<Path>>(path: Option<P>) -> Result<Self> {
        let mut config = Self::from_env()?;

        if let Some(path) = path {
            if path.as_ref().exists() {
                config = Self::from_file(path)?;
            }
        }

        Ok(config)
    }

    /// 验证配置有效性
    pub fn validate(&self) -> Result<()> {
        if let Some(url) = &self.database.url {
            if !url.starts_with("postgres://") && !url.starts_with("postgresql://") {
                anyhow::bail!("DATABASE_URL must start with postgres:// or postgresql://");
            }
        }

        let valid_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_levels.contains(&self.logging.level.to_lowercase().as_str()) {
            anyhow::bail!("LOG_LEVEL must be one of: {:?}", valid_levels);
        }

        if self.logging.format != "json" && self.logging.format != "text" {
            anyhow::bail!("LOG_FORMAT must be 'json' or 'text'");
        }

        let mut seen = HashSet::new();
        for entry in &self.blockchain_integration.blockchains {
            if entry.blockchain_type.trim().is_empty() {
                anyhow::bail!("Blockchain integration with empty blockchain_type");
            }
            if !seen.insert(entry.blockchain_type.as_str()) {
                anyhow::bail!(
                    "Blockchain integration '{}' is configured more than once",
                    entry.blockchain_type
                );
            }
        }

        if self.extensions.initial_retry_delay_secs == 0
            || self.extensions.initial_retry_delay_secs > self.extensions.max_retry_delay_secs
        {
            anyhow::bail!("Extensions retry delays must satisfy 0 < initial <= max");
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use tempfile::NamedTempFile;

    use super::*;

    #[test]
    fn test_parse_integrations() {
        let entries =
            parse_integrations("Ripple=http://ripple-api/, Stellar = http://stellar-api").unwrap();

        assert_eq!(
            entries,
            vec![
                BlockchainIntegrationEntry {
                    blockchain_type: "Ripple".into(),
                    api_url: "http://ripple-api".into(),
                },
                BlockchainIntegrationEntry {
                    blockchain_type: "Stellar".into(),
                    api_url: "http://stellar-api".into(),
                },
            ]
        );
    }

    #[test]
    fn test_parse_integrations_rejects_malformed() {
        assert!(parse_integrations("Ripple").is_err());
        assert!(parse_integrations("=http://x").is_err());
        assert!(parse_integrations("").unwrap().is_empty());
    }

    #[test]
    fn test_config_from_file() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(
            file,
            r#"
[server]
bind_addr = "0.0.0.0:9090"

[logging]
level = "debug"
format = "json"

[blockchain_integration]
request_timeout_secs = 10

[[blockchain_integration.blockchains]]
blockchain_type = "Ripple"
api_url = "http://ripple-api"

[sign_facade]
service_url = "http://sign-facade"
api_key = "secret"

[legacy_wallets]
service_url = "http://legacy"

[extensions]
initial_retry_delay_secs = 30
max_retry_delay_secs = 600
"#
        )
        .unwrap();

        let config = Config::from_file(file.path()).unwrap();
        assert_eq!(config.server.bind_addr, "0.0.0.0:9090");
        assert_eq!(config.blockchain_integration.blockchains.len(), 1);
        assert_eq!(config.sign_facade.api_key, "secret");
        assert_eq!(config.extensions.backoff(), BackoffConfig::default());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_validation_rejects_duplicates() {
        let mut config = Config::from_env().unwrap();
        config.logging.level = "info".into();
        config.logging.format = "text".into();
        config.database.url = None;
        config.extensions = ExtensionsDiscoveryConfig {
            initial_retry_delay_secs: 30,
            max_retry_delay_secs: 600,
        };
        config.blockchain_integration.blockchains = vec![
            BlockchainIntegrationEntry {
                blockchain_type: "Ripple".into(),
                api_url: "http://a".into(),
            },
            BlockchainIntegrationEntry {
                blockchain_type: "Ripple".into(),
                api_url: "http://b".into(),
            },
        ];

        assert!(config.validate().is_err());

        config.blockchain_integration.blockchains.pop();
        assert!(config.validate().is_ok());

        config.extensions.initial_retry_delay_secs = 900;
        assert!(config.validate().is_err());
    }
}
