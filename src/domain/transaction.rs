// ==========================================
// 制造台账系统 - 交易领域模型
// ==========================================
// Sell:       供应商供货 → 原料入库（sells + sells_item）
// Buy:        买方购货   → 成品出库（buys + buys_item）
// Production: 部门生产   → 原料投入 + 成品产出（production_input / production_output）
// 单据一经提交不可修改
// ==========================================

use serde::{Deserialize, Serialize};

/// 采购明细（供应商供货的一行）
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SellLine {
    pub material_name: String,
    pub quantity: f64,
    pub cost: f64,
}

impl SellLine {
    pub fn new(material_name: &str, quantity: f64, cost: f64) -> Self {
        Self {
            material_name: material_name.to_string(),
            quantity,
            cost,
        }
    }
}

/// 销售明细（买方购货的一行）
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BuyLine {
    pub product_name: String,
    pub quantity: f64,
    pub cost: f64,
}

impl BuyLine {
    pub fn new(product_name: &str, quantity: f64, cost: f64) -> Self {
        Self {
            product_name: product_name.to_string(),
            quantity,
            cost,
        }
    }
}

/// 生产投入/产出的一行
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductionLine {
    pub name: String,
    pub quantity: f64,
    #[serde(default)]
    pub unit: Option<String>,
}

impl ProductionLine {
    pub fn new(name: &str, quantity: f64, unit: &str) -> Self {
        Self {
            name: name.to_string(),
            quantity,
            unit: Some(unit.to_string()),
        }
    }
}

/// 单据回执：成功提交后返回生成的单据号
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BillReceipt {
    pub bill_id: i64,
}
