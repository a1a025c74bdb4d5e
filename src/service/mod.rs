pub mod address_codec;
pub mod address_mapping;
pub mod balance_observation; // 钱包事件驱动的余额观察
pub mod blockchain_extensions; // 能力缓存与后台发现
pub mod blockchain_integration;
pub mod legacy_wallets;
pub mod sign_facade;
pub mod wallet_creation;
pub mod wallet_service;
