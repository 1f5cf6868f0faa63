// ==========================================
// 制造台账系统 - 聚合视图模型
// ==========================================
// 驾驶舱统计 / 最近动态 / 交易历史
// ==========================================

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::domain::types::ActivityType;

/// 驾驶舱统计（全部成功或整体失败，不存在部分结果）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DashboardStats {
    pub supplier_count: i64,
    pub employee_count: i64,
    pub product_count: i64,
    pub low_stock_count: i64,
}

/// 最近动态中的一条
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActivityEntry {
    #[serde(rename = "type")]
    pub activity_type: ActivityType,
    pub date: NaiveDateTime,
    pub party: String,
    pub item: String,
}

/// 交易历史中的一行
///
/// total_value:
/// - 采购/销售: 明细 quantity × cost 之和
/// - 生产: 恒为 None（不记录金额），序列化为 null，绝不折算为 0
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryRow {
    #[serde(rename = "type")]
    pub activity_type: ActivityType,
    pub id: i64,
    pub date: NaiveDateTime,
    pub party: String,
    pub total_value: Option<f64>,
}

/// 交易历史过滤条件
///
/// type_filter: "purchase" / "sale" / "production"；None、空串或 "all" 表示全部
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct HistoryFilter {
    #[serde(default, alias = "typeFilter")]
    pub type_filter: Option<String>,
}

impl HistoryFilter {
    pub fn all() -> Self {
        Self { type_filter: None }
    }

    pub fn only(activity_type: ActivityType) -> Self {
        Self {
            type_filter: Some(activity_type.to_string().to_ascii_lowercase()),
        }
    }

    /// 解析为具体类型（None 表示全部）
    pub fn activity_type(&self) -> Result<Option<ActivityType>, String> {
        match self.type_filter.as_deref().map(str::trim) {
            None | Some("") => Ok(None),
            Some(s) if s.eq_ignore_ascii_case("all") => Ok(None),
            Some(s) => s.parse::<ActivityType>().map(Some),
        }
    }
}
