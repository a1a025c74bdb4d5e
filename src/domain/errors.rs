//! 钱包领域错误

use thiserror::Error;

/// 输入校验错误码
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OperationErrorCode {
    BaseAddressIsEmpty,
    BaseAddressShouldNotContainSeparator,
    ExtensionAddressShouldNotContainSeparator,
}

impl OperationErrorCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            OperationErrorCode::BaseAddressIsEmpty => "base_address_is_empty",
            OperationErrorCode::BaseAddressShouldNotContainSeparator => {
                "base_address_should_not_contain_separator"
            }
            OperationErrorCode::ExtensionAddressShouldNotContainSeparator => {
                "extension_address_should_not_contain_separator"
            }
        }
    }
}

#[derive(Debug, Error)]
pub enum WalletError {
    #[error("invalid input ({}): {message}", .code.as_str())]
    InvalidInput {
        code: OperationErrorCode,
        message: String,
    },

    #[error("not supported: {0}")]
    NotSupported(String),

    /// 已持久化或刚生成的地址在需要映射时无法映射
    #[error("inconsistency: {0}")]
    Inconsistency(String),

    /// 仓储、签名服务、集成层或事件总线失败
    #[error("upstream failure: {0:#}")]
    Upstream(#[from] anyhow::Error),
}

impl WalletError {
    pub fn invalid_input(code: OperationErrorCode, message: impl Into<String>) -> Self {
        WalletError::InvalidInput {
            code,
            message: message.into(),
        }
    }
}

pub type WalletResult<T> = Result<T, WalletError>;
