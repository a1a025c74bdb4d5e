//! 区块链能力、地址扩展常量与地址编解码 API

use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    response::Response,
};
use serde::{Deserialize, Serialize};

use crate::{
    api::{
        response::{optional_response, success_response},
        wallets_api::require_non_blank,
    },
    app_state::AppState,
    domain::LEGACY_BLOCKCHAIN_TYPE,
    error::AppError,
};

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CapabilitiesResponse {
    pub blockchain_type: String,
    /// null 表示尚未发现
    pub is_public_address_extension_required: Option<bool>,
    pub is_address_mapping_required: Option<bool>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MergeQuery {
    pub base_address: Option<String>,
    pub address_extension: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ParseQuery {
    pub address: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct MergedAddressResponse {
    pub address: String,
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub database: Option<bool>,
    pub blockchains: usize,
}

fn require_supported(state: &AppState, blockchain_type: &str) -> Result<(), AppError> {
    require_non_blank("blockchain_type", blockchain_type)?;
    if blockchain_type != LEGACY_BLOCKCHAIN_TYPE
        && !state.integration.blockchain_is_supported(blockchain_type)
    {
        return Err(AppError::chain_not_supported(format!(
            "Blockchain type [{}] is not supported",
            blockchain_type
        )));
    }
    Ok(())
}

/// GET /api/capabilities/:blockchain_type
pub async fn get_capabilities(
    State(state): State<Arc<AppState>>,
    Path(blockchain_type): Path<String>,
) -> Result<Response, AppError> {
    require_supported(&state, &blockchain_type)?;

    let capability = state.extensions.capability(&blockchain_type);

    success_response(CapabilitiesResponse {
        blockchain_type: capability.blockchain_type,
        is_public_address_extension_required: capability.address_extension_required.as_option(),
        is_address_mapping_required: capability.address_mapping_required.as_option(),
    })
}

/// GET /api/constants/:blockchain_type，未发现或不需要扩展时返回 204
pub async fn get_constants(
    State(state): State<Arc<AppState>>,
    Path(blockchain_type): Path<String>,
) -> Result<Response, AppError> {
    require_supported(&state, &blockchain_type)?;

    let constants = state
        .extensions
        .try_get_address_extension_constants(&blockchain_type)
        .map(|c| c.as_ref().clone());

    optional_response(constants)
}

/// GET /api/addresses/:blockchain_type/merged?baseAddress=&addressExtension=
pub async fn merge_address(
    State(state): State<Arc<AppState>>,
    Path(blockchain_type): Path<String>,
    Query(query): Query<MergeQuery>,
) -> Result<Response, AppError> {
    require_supported(&state, &blockchain_type)?;

    let address = state.codec.merge(
        &blockchain_type,
        query.base_address.as_deref().unwrap_or_default(),
        query.address_extension.as_deref().unwrap_or_default(),
    )?;

    success_response(MergedAddressResponse { address })
}

/// GET /api/addresses/:blockchain_type/parsed?address=
pub async fn parse_address(
    State(state): State<Arc<AppState>>,
    Path(blockchain_type): Path<String>,
    Query(query): Query<ParseQuery>,
) -> Result<Response, AppError> {
    require_supported(&state, &blockchain_type)?;
    let address = query.address.unwrap_or_default();
    require_non_blank("address", &address)?;

    success_response(state.codec.parse(&blockchain_type, &address))
}

/// GET /api/health
pub async fn health(State(state): State<Arc<AppState>>) -> Result<Response, AppError> {
    let database = match &state.pool {
        Some(pool) => Some(crate::infrastructure::db::health_check(pool).await.is_ok()),
        None => None,
    };

    success_response(HealthResponse {
        status: if database == Some(false) { "degraded" } else { "ok" },
        database,
        blockchains: state.integration.api_clients().count(),
    })
}
