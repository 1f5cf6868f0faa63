// ==========================================
// 制造台账系统 - 库存品领域模型
// ==========================================
// 原料(Material) 与 成品(Product) 共用同一结构
// 红线: stock 只能通过事务内的增量语句变动，不允许整体覆写
// ==========================================

use serde::{Deserialize, Serialize};

use crate::domain::types::ItemKind;

/// 库存品
///
/// - id 为代理主键，明细行引用 id，改名不影响历史单据
/// - name 为对外使用的自然键（唯一）
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InventoryItem {
    pub id: i64,
    pub kind: ItemKind,
    pub name: String,
    pub stock: f64,
    pub unit: String,
}

/// 新建库存品（初始库存只在创建时给定）
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewInventoryItem {
    pub name: String,
    #[serde(default)]
    pub stock: f64,
    pub unit: String,
}

/// 库存品属性修改（改名 / 改单位），不含 stock
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct InventoryItemUpdate {
    #[serde(default)]
    pub new_name: Option<String>,
    #[serde(default)]
    pub unit: Option<String>,
}

impl InventoryItemUpdate {
    pub fn is_empty(&self) -> bool {
        self.new_name.is_none() && self.unit.is_none()
    }
}
