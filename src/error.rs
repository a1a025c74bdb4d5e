use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

use crate::domain::WalletError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppErrorCode {
    // HTTP 基础错误码
    BadRequest,
    NotFound,
    Conflict,
    Internal,

    // 业务错误码
    WalletNotFound,
    WalletAlreadyExists,
    AssetNotSupported,
    ChainNotSupported,
    InvalidParameter,
    InvalidAddress,
    Inconsistency,
    ExternalServiceError,
}

impl AppErrorCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            AppErrorCode::BadRequest => "bad_request",
            AppErrorCode::NotFound => "not_found",
            AppErrorCode::Conflict => "conflict",
            AppErrorCode::Internal => "internal",

            AppErrorCode::WalletNotFound => "wallet_not_found",
            AppErrorCode::WalletAlreadyExists => "wallet_already_exists",
            AppErrorCode::AssetNotSupported => "asset_not_supported",
            AppErrorCode::ChainNotSupported => "chain_not_supported",
            AppErrorCode::InvalidParameter => "invalid_parameter",
            AppErrorCode::InvalidAddress => "invalid_address",
            AppErrorCode::Inconsistency => "inconsistency",
            AppErrorCode::ExternalServiceError => "external_service_error",
        }
    }
}

#[derive(Debug, Clone)]
pub struct AppError {
    pub code: AppErrorCode,
    pub message: String,
    pub status: StatusCode,
    pub trace_id: Option<String>,
}

#[derive(Serialize)]
struct ErrorBody<'a> {
    code: &'a str,
    message: &'a str,
    trace_id: Option<&'a str>,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let body = ErrorBody {
            code: self.code.as_str(),
            message: &self.message,
            trace_id: self.trace_id.as_deref(),
        };
        (self.status, Json(body)).into_response()
    }
}

impl AppError {
    fn new(code: AppErrorCode, status: StatusCode, msg: impl Into<String>) -> Self {
        Self {
            code,
            message: msg.into(),
            status,
            trace_id: None,
        }
    }

    pub fn bad_request(msg: impl Into<String>) -> Self {
        Self::new(AppErrorCode::BadRequest, StatusCode::BAD_REQUEST, msg)
    }

    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::new(AppErrorCode::NotFound, StatusCode::NOT_FOUND, msg)
    }

    pub fn conflict(msg: impl Into<String>) -> Self {
        Self::new(AppErrorCode::Conflict, StatusCode::CONFLICT, msg)
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        let msg = msg.into();
        tracing::error!("Internal error: {}", msg);
        Self::new(AppErrorCode::Internal, StatusCode::INTERNAL_SERVER_ERROR, msg)
    }

    /// 设置追踪ID
    pub fn with_trace_id(mut self, trace_id: String) -> Self {
        self.trace_id = Some(trace_id);
        self
    }

    pub fn wallet_not_found(msg: impl Into<String>) -> Self {
        Self::new(AppErrorCode::WalletNotFound, StatusCode::NOT_FOUND, msg)
    }

    pub fn wallet_already_exists(msg: impl Into<String>) -> Self {
        Self::new(AppErrorCode::WalletAlreadyExists, StatusCode::CONFLICT, msg)
    }

    pub fn asset_not_supported(msg: impl Into<String>) -> Self {
        Self::new(AppErrorCode::AssetNotSupported, StatusCode::BAD_REQUEST, msg)
    }

    pub fn chain_not_supported(msg: impl Into<String>) -> Self {
        Self::new(AppErrorCode::ChainNotSupported, StatusCode::BAD_REQUEST, msg)
    }

    pub fn invalid_parameter(msg: impl Into<String>) -> Self {
        Self::new(AppErrorCode::InvalidParameter, StatusCode::BAD_REQUEST, msg)
    }

    pub fn invalid_address(msg: impl Into<String>) -> Self {
        Self::new(AppErrorCode::InvalidAddress, StatusCode::BAD_REQUEST, msg)
    }

    pub fn inconsistency(msg: impl Into<String>) -> Self {
        let msg = msg.into();
        tracing::error!("Data inconsistency: {}", msg);
        Self::new(
            AppErrorCode::Inconsistency,
            StatusCode::INTERNAL_SERVER_ERROR,
            msg,
        )
    }

    pub fn external_service_error(msg: impl Into<String>) -> Self {
        let msg = msg.into();
        tracing::error!("Upstream failure: {}", msg);
        Self::new(
            AppErrorCode::ExternalServiceError,
            StatusCode::BAD_GATEWAY,
            msg,
        )
    }
}

impl std::fmt::Display for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.code.as_str(), self.message)
    }
}

impl std::error::Error for AppError {}

// 从领域错误转换
impl From<WalletError> for AppError {
    fn from(err: WalletError) -> Self {
        match err {
            WalletError::InvalidInput { code, message } => Self {
                code: AppErrorCode::InvalidAddress,
                message: format!("{}: {}", code.as_str(), message),
                status: StatusCode::BAD_REQUEST,
                trace_id: None,
            },
            WalletError::NotSupported(msg) => Self::chain_not_supported(msg),
            WalletError::Inconsistency(msg) => Self::inconsistency(msg),
            WalletError::Upstream(e) => Self::external_service_error(format!("{:#}", e)),
        }
    }
}

// 从 anyhow 错误转换
impl From<anyhow::Error> for AppError {
    fn from(err: anyhow::Error) -> Self {
        Self::internal(format!("{}", err))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::OperationErrorCode;

    #[test]
    fn test_wallet_error_mapping() {
        let err: AppError = WalletError::invalid_input(
            OperationErrorCode::BaseAddressIsEmpty,
            "Base address is empty",
        )
        .into();
        assert_eq!(err.status, StatusCode::BAD_REQUEST);
        assert!(err.message.starts_with("base_address_is_empty"));

        let err: AppError = WalletError::NotSupported("Ripple".into()).into();
        assert_eq!(err.status, StatusCode::BAD_REQUEST);
        assert_eq!(err.code, AppErrorCode::ChainNotSupported);

        let err: AppError = WalletError::Inconsistency("missing".into()).into();
        assert_eq!(err.status, StatusCode::INTERNAL_SERVER_ERROR);

        let err: AppError = WalletError::Upstream(anyhow::anyhow!("timeout")).into();
        assert_eq!(err.status, StatusCode::BAD_GATEWAY);
        assert_eq!(err.code, AppErrorCode::ExternalServiceError);
    }
}
