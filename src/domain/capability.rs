//! 区块链能力与地址扩展常量
//!
//! 能力在启动后异步发现，"尚未发现" 与 "发现为 false" 必须区分开

use serde::{Deserialize, Serialize};

/// 三值能力标志
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CapabilityFlag {
    True,
    False,
    /// 区块链不受支持，或发现流程尚未完成
    Unknown,
}

impl CapabilityFlag {
    /// 只有明确发现为 true 时才返回 true
    pub fn is_true(self) -> bool {
        matches!(self, CapabilityFlag::True)
    }

    pub fn is_known(self) -> bool {
        !matches!(self, CapabilityFlag::Unknown)
    }

    /// 对外接口（JSON）使用可空布尔
    pub fn as_option(self) -> Option<bool> {
        match self {
            CapabilityFlag::True => Some(true),
            CapabilityFlag::False => Some(false),
            CapabilityFlag::Unknown => None,
        }
    }
}

impl From<bool> for CapabilityFlag {
    fn from(value: bool) -> Self {
        if value {
            CapabilityFlag::True
        } else {
            CapabilityFlag::False
        }
    }
}

impl From<Option<bool>> for CapabilityFlag {
    fn from(value: Option<bool>) -> Self {
        value.map(CapabilityFlag::from).unwrap_or(CapabilityFlag::Unknown)
    }
}

/// 集成层返回的能力（已发现，进程生命周期内不变）
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiscoveredCapabilities {
    pub address_extension_required: bool,
    pub address_mapping_required: bool,
}

/// 某条链当前的能力视图
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BlockchainCapability {
    pub blockchain_type: String,
    pub address_extension_required: CapabilityFlag,
    pub address_mapping_required: CapabilityFlag,
}

/// 充值时地址扩展的要求
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AddressExtensionTypeForDeposit {
    NotSupported,
    Required,
}

/// 提现时地址扩展的要求
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AddressExtensionTypeForWithdrawal {
    NotSupported,
    Optional,
}

/// 集成层 `constants` 接口中的地址扩展描述
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct AddressExtensionDescriptor {
    pub separator: Option<char>,
    pub display_name: Option<String>,
    pub base_display_name: Option<String>,
}

/// 地址扩展常量（仅对需要扩展的链存在，写入后不可变）
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddressExtensionConstants {
    pub blockchain_type: String,
    pub separator: Option<char>,
    pub base_address_display_name: Option<String>,
    pub address_extension_display_name: Option<String>,
    pub type_for_deposit: AddressExtensionTypeForDeposit,
    pub type_for_withdrawal: AddressExtensionTypeForWithdrawal,
    pub separator_exists: bool,
}

impl AddressExtensionConstants {
    /// 由集成层描述构建常量；描述缺失时两种类型均为 NotSupported
    pub fn from_descriptor(
        blockchain_type: &str,
        descriptor: Option<AddressExtensionDescriptor>,
    ) -> Self {
        match descriptor {
            Some(d) => {
                // '\0' 等同于 "未设置分隔符"
                let separator_exists = d.separator.map_or(false, |c| c != char::default());
                Self {
                    blockchain_type: blockchain_type.to_string(),
                    separator: d.separator.filter(|_| separator_exists),
                    base_address_display_name: d.base_display_name,
                    address_extension_display_name: d.display_name,
                    type_for_deposit: AddressExtensionTypeForDeposit::Required,
                    type_for_withdrawal: AddressExtensionTypeForWithdrawal::Optional,
                    separator_exists,
                }
            }
            None => Self {
                blockchain_type: blockchain_type.to_string(),
                separator: None,
                base_address_display_name: None,
                address_extension_display_name: None,
                type_for_deposit: AddressExtensionTypeForDeposit::NotSupported,
                type_for_withdrawal: AddressExtensionTypeForWithdrawal::NotSupported,
                separator_exists: false,
            },
        }
    }

    /// 可用于合并/拆分的分隔符
    pub fn usable_separator(&self) -> Option<char> {
        if self.separator_exists {
            self.separator
        } else {
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_capability_flag_from_option() {
        assert_eq!(CapabilityFlag::from(Some(true)), CapabilityFlag::True);
        assert_eq!(CapabilityFlag::from(Some(false)), CapabilityFlag::False);
        assert_eq!(CapabilityFlag::from(None), CapabilityFlag::Unknown);
        assert!(!CapabilityFlag::Unknown.is_true());
        assert!(!CapabilityFlag::Unknown.is_known());
        assert!(CapabilityFlag::False.is_known());
    }

    #[test]
    fn test_constants_with_separator() {
        let constants = AddressExtensionConstants::from_descriptor(
            "Ripple",
            Some(AddressExtensionDescriptor {
                separator: Some('+'),
                display_name: Some("Destination tag".into()),
                base_display_name: Some("Address".into()),
            }),
        );

        assert!(constants.separator_exists);
        assert_eq!(constants.usable_separator(), Some('+'));
        assert_eq!(constants.type_for_deposit, AddressExtensionTypeForDeposit::Required);
        assert_eq!(
            constants.type_for_withdrawal,
            AddressExtensionTypeForWithdrawal::Optional
        );
    }

    #[test]
    fn test_constants_with_default_char_separator() {
        let constants = AddressExtensionConstants::from_descriptor(
            "Stellar",
            Some(AddressExtensionDescriptor {
                separator: Some('\0'),
                ..Default::default()
            }),
        );

        assert!(!constants.separator_exists);
        assert_eq!(constants.usable_separator(), None);
    }

    #[test]
    fn test_constants_without_descriptor() {
        let constants = AddressExtensionConstants::from_descriptor("EOS", None);

        assert!(!constants.separator_exists);
        assert_eq!(
            constants.type_for_deposit,
            AddressExtensionTypeForDeposit::NotSupported
        );
        assert_eq!(
            constants.type_for_withdrawal,
            AddressExtensionTypeForWithdrawal::NotSupported
        );
    }
}
