//! Domain 模块
//!
//! 钱包、能力与错误等领域模型

pub mod capability;
pub mod errors;
pub mod wallet;

// 重新导出常用类型
pub use capability::{
    AddressExtensionConstants, AddressExtensionDescriptor, AddressExtensionTypeForDeposit,
    AddressExtensionTypeForWithdrawal, BlockchainCapability, CapabilityFlag,
    DiscoveredCapabilities,
};
pub use errors::{OperationErrorCode, WalletError, WalletResult};
pub use wallet::{
    LegacyCredentialsRecord, Page, Wallet, WalletGeneration, WalletView, LEGACY_BLOCKCHAIN_TYPE,
};
