// ==========================================
// 制造台账系统 - 领域类型定义
// ==========================================

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

// ==========================================
// 库存品类别 (Item Kind)
// ==========================================
// 原料由采购入库、生产投入消耗；成品由生产产出、销售出库
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ItemKind {
    #[serde(alias = "material")]
    Material,
    #[serde(alias = "product")]
    Product,
}

impl ItemKind {
    /// 对应的表名
    pub fn table(&self) -> &'static str {
        match self {
            ItemKind::Material => "material",
            ItemKind::Product => "product",
        }
    }

    /// 代理主键列
    pub fn id_column(&self) -> &'static str {
        match self {
            ItemKind::Material => "material_id",
            ItemKind::Product => "product_id",
        }
    }

    /// 自然键列
    pub fn name_column(&self) -> &'static str {
        match self {
            ItemKind::Material => "material_name",
            ItemKind::Product => "product_name",
        }
    }
}

impl fmt::Display for ItemKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ItemKind::Material => write!(f, "Material"),
            ItemKind::Product => write!(f, "Product"),
        }
    }
}

// ==========================================
// 业务活动类型 (Activity Type)
// ==========================================
// Purchase: 供应商供货（sells 单据）
// Sale:     买方购货（buys 单据）
// Production: 部门生产
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ActivityType {
    Purchase,
    Sale,
    Production,
}

impl fmt::Display for ActivityType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ActivityType::Purchase => write!(f, "Purchase"),
            ActivityType::Sale => write!(f, "Sale"),
            ActivityType::Production => write!(f, "Production"),
        }
    }
}

impl FromStr for ActivityType {
    type Err = String;

    /// 解析过滤条件字符串（大小写不敏感）
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "purchase" => Ok(ActivityType::Purchase),
            "sale" => Ok(ActivityType::Sale),
            "production" => Ok(ActivityType::Production),
            other => Err(format!("未知的交易类型: {}", other)),
        }
    }
}

// ==========================================
// 事务状态 (Transaction State)
// ==========================================
// 唯一成功终态为 Committed，其余退出路径都落到 RolledBack
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TxState {
    Started,
    ItemsApplied,
    Committed,
    RolledBack,
}

impl TxState {
    /// 是否为终态
    pub fn is_terminal(&self) -> bool {
        matches!(self, TxState::Committed | TxState::RolledBack)
    }
}

impl fmt::Display for TxState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TxState::Started => write!(f, "STARTED"),
            TxState::ItemsApplied => write!(f, "ITEMS_APPLIED"),
            TxState::Committed => write!(f, "COMMITTED"),
            TxState::RolledBack => write!(f, "ROLLED_BACK"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_activity_type_parse() {
        assert_eq!("sale".parse::<ActivityType>().unwrap(), ActivityType::Sale);
        assert_eq!(
            " Purchase ".parse::<ActivityType>().unwrap(),
            ActivityType::Purchase
        );
        assert!("refund".parse::<ActivityType>().is_err());
    }

    #[test]
    fn test_tx_state_terminal() {
        assert!(TxState::Committed.is_terminal());
        assert!(TxState::RolledBack.is_terminal());
        assert!(!TxState::ItemsApplied.is_terminal());
    }
}
