//! 统一 API 响应格式
//!
//! 所有 API 接口使用统一的响应格式：{ code, message, data }
//! 错误响应格式见 AppError：{ code: "error_code", message, trace_id? }

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

use crate::error::AppError;

/// 统一成功响应格式
#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    pub code: i32,
    pub message: String,
    pub data: T,
}

impl<T> ApiResponse<T> {
    /// 创建成功响应
    pub fn success(data: T) -> Self {
        Self {
            code: 0,
            message: "success".to_string(),
            data,
        }
    }
}

/// 辅助函数：将数据包装为统一响应格式
pub fn success_response<T: Serialize>(data: T) -> Result<Response, AppError> {
    Ok(Json(ApiResponse::success(data)).into_response())
}

/// 可能为空的查询结果：无数据时返回 204
pub fn optional_response<T: Serialize>(data: Option<T>) -> Result<Response, AppError> {
    match data {
        Some(data) => success_response(data),
        None => Ok(StatusCode::NO_CONTENT.into_response()),
    }
}

pub fn accepted_response() -> Result<Response, AppError> {
    Ok(StatusCode::ACCEPTED.into_response())
}
