//! 钱包 API
//!
//! POST   /api/wallets/:blockchain_type/:asset_id/by-client-ids/:client_id
//! DELETE /api/wallets/:blockchain_type/:asset_id/by-client-ids/:client_id
//! GET    /api/wallets/:blockchain_type/:asset_id/by-client-ids/:client_id/address
//! GET    /api/wallets/:blockchain_type/:asset_id/by-addresses/:address/client-id
//! GET    /api/clients/:client_id/wallets

use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    response::Response,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
    api::response::{accepted_response, optional_response, success_response},
    app_state::AppState,
    domain::WalletView,
    error::AppError,
    repository::{wallet_repository::decode_continuation_token, MAX_PAGE_SIZE},
    service::wallet_service::WalletService,
};

#[derive(Debug, Deserialize)]
pub struct ClientWalletPath {
    pub blockchain_type: String,
    pub asset_id: String,
    pub client_id: String,
}

#[derive(Debug, Deserialize)]
pub struct AddressPath {
    pub blockchain_type: String,
    pub asset_id: String,
    pub address: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClientWalletsQuery {
    pub take: Option<usize>,
    pub continuation_token: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ClientIdResponse {
    pub client_id: Uuid,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ClientWalletsResponse {
    pub wallets: Vec<WalletView>,
    pub continuation_token: Option<String>,
}

// ========== 参数校验 ==========

pub(crate) fn require_non_blank(name: &str, value: &str) -> Result<(), AppError> {
    if value.trim().is_empty() {
        return Err(AppError::invalid_parameter(format!(
            "{} should not be empty",
            name
        )));
    }
    Ok(())
}

fn parse_client_id(raw: &str) -> Result<Uuid, AppError> {
    let client_id = Uuid::parse_str(raw)
        .map_err(|_| AppError::invalid_parameter(format!("Invalid client id: {}", raw)))?;
    if client_id.is_nil() {
        return Err(AppError::invalid_parameter("Client id should not be empty"));
    }
    Ok(client_id)
}

fn validate_take(take: Option<usize>) -> Result<usize, AppError> {
    match take {
        Some(take) if (1..=MAX_PAGE_SIZE).contains(&take) => Ok(take),
        Some(take) => Err(AppError::invalid_parameter(format!(
            "take should be between 1 and {}, got {}",
            MAX_PAGE_SIZE, take
        ))),
        None => Err(AppError::invalid_parameter("take is required")),
    }
}

/// 续传令牌由服务端生成，客户端篡改时按参数错误处理
fn validate_continuation_token(token: Option<&str>) -> Result<(), AppError> {
    decode_continuation_token(token).map_err(|_| {
        AppError::invalid_parameter(format!(
            "Invalid continuation token: {}",
            token.unwrap_or_default()
        ))
    })?;
    Ok(())
}

async fn ensure_asset_supported(
    wallets: &WalletService,
    path: &ClientWalletPath,
) -> Result<(), AppError> {
    if !wallets
        .asset_is_supported(&path.blockchain_type, &path.asset_id)
        .await?
    {
        return Err(AppError::asset_not_supported(format!(
            "Asset [{}] is not supported for blockchain type [{}]",
            path.asset_id, path.blockchain_type
        )));
    }
    Ok(())
}

impl ClientWalletPath {
    fn validate(&self) -> Result<Uuid, AppError> {
        require_non_blank("blockchain_type", &self.blockchain_type)?;
        require_non_blank("asset_id", &self.asset_id)?;
        parse_client_id(&self.client_id)
    }
}

// ========== API 处理器 ==========

/// 创建默认钱包
pub async fn create_wallet(
    State(state): State<Arc<AppState>>,
    Path(path): Path<ClientWalletPath>,
) -> Result<Response, AppError> {
    let client_id = path.validate()?;
    let wallets = &state.wallet_service;

    ensure_asset_supported(wallets, &path).await?;

    if wallets
        .default_wallet_exists(&path.blockchain_type, &path.asset_id, client_id)
        .await?
    {
        return Err(AppError::wallet_already_exists(format!(
            "Wallet for asset [{}] of blockchain type [{}] already exists for client [{}]",
            path.asset_id, path.blockchain_type, client_id
        )));
    }

    let wallet = wallets
        .create_wallet(&path.blockchain_type, &path.asset_id, client_id)
        .await?;

    success_response(wallet)
}

/// 删除客户在该资产下的全部钱包
pub async fn delete_wallet(
    State(state): State<Arc<AppState>>,
    Path(path): Path<ClientWalletPath>,
) -> Result<Response, AppError> {
    let client_id = path.validate()?;
    let wallets = &state.wallet_service;

    ensure_asset_supported(wallets, &path).await?;

    if !wallets
        .wallet_exists(&path.blockchain_type, &path.asset_id, client_id)
        .await?
    {
        return Err(AppError::wallet_not_found(format!(
            "Wallet for asset [{}] of blockchain type [{}] not found for client [{}]",
            path.asset_id, path.blockchain_type, client_id
        )));
    }

    wallets
        .delete_wallets(&path.blockchain_type, &path.asset_id, client_id)
        .await?;

    accepted_response()
}

/// 查询默认地址，不存在时返回 204
pub async fn get_address(
    State(state): State<Arc<AppState>>,
    Path(path): Path<ClientWalletPath>,
) -> Result<Response, AppError> {
    let client_id = path.validate()?;

    let wallet = state
        .wallet_service
        .try_get_default_address(&path.blockchain_type, &path.asset_id, client_id)
        .await?;

    optional_response(wallet)
}

/// 根据地址查找客户
pub async fn get_client_id(
    State(state): State<Arc<AppState>>,
    Path(path): Path<AddressPath>,
) -> Result<Response, AppError> {
    require_non_blank("blockchain_type", &path.blockchain_type)?;
    require_non_blank("asset_id", &path.asset_id)?;
    require_non_blank("address", &path.address)?;

    let client_id = state
        .wallet_service
        .try_get_client_id(&path.blockchain_type, &path.address)
        .await?;

    optional_response(client_id.map(|client_id| ClientIdResponse { client_id }))
}

/// 分页列出客户的钱包
pub async fn get_client_wallets(
    State(state): State<Arc<AppState>>,
    Path(client_id): Path<String>,
    Query(query): Query<ClientWalletsQuery>,
) -> Result<Response, AppError> {
    let client_id = parse_client_id(&client_id)?;
    let take = validate_take(query.take)?;
    validate_continuation_token(query.continuation_token.as_deref())?;

    let page = state
        .wallet_service
        .get_client_wallets(client_id, take, query.continuation_token.as_deref())
        .await?;

    if page.items.is_empty() && page.continuation_token.is_none() {
        return optional_response(None::<ClientWalletsResponse>);
    }

    success_response(ClientWalletsResponse {
        wallets: page.items,
        continuation_token: page.continuation_token,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_take() {
        assert_eq!(validate_take(Some(1)).unwrap(), 1);
        assert_eq!(validate_take(Some(1000)).unwrap(), 1000);
        assert!(validate_take(Some(0)).is_err());
        assert!(validate_take(Some(1001)).is_err());
        assert!(validate_take(None).is_err());
    }

    #[test]
    fn test_validate_continuation_token() {
        assert!(validate_continuation_token(None).is_ok());
        assert!(validate_continuation_token(Some("")).is_ok());
        assert!(validate_continuation_token(Some("20")).is_ok());
        assert!(validate_continuation_token(Some("garbage")).is_err());
        assert!(validate_continuation_token(Some("-1")).is_err());
    }

    #[test]
    fn test_parse_client_id() {
        let id = Uuid::new_v4();
        assert_eq!(parse_client_id(&id.to_string()).unwrap(), id);
        assert!(parse_client_id("not-a-uuid").is_err());
        assert!(parse_client_id(&Uuid::nil().to_string()).is_err());
    }

    #[test]
    fn test_path_validation() {
        let path = ClientWalletPath {
            blockchain_type: " ".into(),
            asset_id: "XRP".into(),
            client_id: Uuid::new_v4().to_string(),
        };
        assert!(path.validate().is_err());
    }
}
