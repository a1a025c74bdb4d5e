use std::{sync::Arc, time::Instant};

use axum::{
    extract::Request,
    http::HeaderValue,
    middleware::{from_fn, Next},
    response::Response,
    routing::{get, post},
    Router,
};
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::Level;
use uuid::Uuid;

use crate::app_state::AppState;

pub mod blockchains_api;
pub mod response; // 统一响应格式
pub mod wallets_api;

pub fn routes(state: Arc<AppState>) -> Router {
    Router::new()
        // 钱包
        .route(
            "/api/wallets/:blockchain_type/:asset_id/by-client-ids/:client_id",
            post(wallets_api::create_wallet).delete(wallets_api::delete_wallet),
        )
        .route(
            "/api/wallets/:blockchain_type/:asset_id/by-client-ids/:client_id/address",
            get(wallets_api::get_address),
        )
        .route(
            "/api/wallets/:blockchain_type/:asset_id/by-addresses/:address/client-id",
            get(wallets_api::get_client_id),
        )
        .route(
            "/api/clients/:client_id/wallets",
            get(wallets_api::get_client_wallets),
        )
        // 区块链能力与地址
        .route(
            "/api/capabilities/:blockchain_type",
            get(blockchains_api::get_capabilities),
        )
        .route(
            "/api/constants/:blockchain_type",
            get(blockchains_api::get_constants),
        )
        .route(
            "/api/addresses/:blockchain_type/merged",
            get(blockchains_api::merge_address),
        )
        .route(
            "/api/addresses/:blockchain_type/parsed",
            get(blockchains_api::parse_address),
        )
        .route("/api/health", get(blockchains_api::health))
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(CorsLayer::permissive())
                .layer(from_fn(trace_id_middleware))
                .layer(from_fn(add_response_time_header))
                .layer(from_fn(trace_log)),
        )
        .with_state(state)
}

/// 为每个请求生成或沿用 X-Trace-Id，写入请求扩展和响应头
async fn trace_id_middleware(mut req: Request, next: Next) -> Response {
    let trace_id = req
        .headers()
        .get("X-Trace-Id")
        .and_then(|h| h.to_str().ok())
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .unwrap_or_else(|| Uuid::new_v4().to_string());

    req.extensions_mut().insert(trace_id.clone());

    let mut response = next.run(req).await;

    if let Ok(header_value) = HeaderValue::from_str(&trace_id) {
        response.headers_mut().insert("X-Trace-Id", header_value);
    }

    response
}

async fn add_response_time_header(req: Request, next: Next) -> Response {
    let start = Instant::now();
    let mut resp = next.run(req).await;
    let elapsed_ms = start.elapsed().as_millis().to_string();
    resp.headers_mut().insert(
        "x-response-time",
        HeaderValue::from_str(&format!("{}ms", elapsed_ms))
            .unwrap_or(HeaderValue::from_static("0ms")),
    );
    resp
}

async fn trace_log(req: Request, next: Next) -> Response {
    let method = req.method().clone();
    let path = req.uri().path().to_string();
    let start = Instant::now();
    let trace_id = req
        .extensions()
        .get::<String>()
        .cloned()
        .unwrap_or_else(|| "-".to_string());
    let resp = next.run(req).await;
    let status = resp.status();
    let elapsed = start.elapsed().as_millis();
    tracing::event!(Level::INFO, trace_id=%trace_id, method=%method, path=%path, status=%status.as_u16(), elapsed_ms=%elapsed, "http_request");
    resp
}
