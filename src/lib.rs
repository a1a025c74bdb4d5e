//! 区块链充值钱包服务
//!
//! 在第一代与新一代两种钱包存储之间路由客户钱包，
//! 并按各区块链声明的能力处理地址扩展与地址映射。

pub mod api;
pub mod app_state;
pub mod config;
pub mod domain;
pub mod error;
pub mod infrastructure;
pub mod repository;
pub mod service;

// 重新导出常用类型
pub use app_state::AppState;
pub use error::{AppError, AppErrorCode};
