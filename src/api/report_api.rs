// ==========================================
// 制造台账系统 - 报表 API
// ==========================================
// 职责: 驾驶舱统计 / 最近动态 / 交易历史（只读）
// ==========================================

use std::sync::Arc;

use crate::api::error::{ApiError, ApiResult};
use crate::domain::report::{ActivityEntry, DashboardStats, HistoryFilter, HistoryRow};
use crate::engine::aggregation::AggregationEngine;

// ==========================================
// ReportApi - 报表 API
// ==========================================
pub struct ReportApi {
    aggregation: Arc<AggregationEngine>,
}

impl ReportApi {
    pub fn new(aggregation: Arc<AggregationEngine>) -> Self {
        Self { aggregation }
    }

    pub fn dashboard_stats(&self) -> ApiResult<DashboardStats> {
        let _perf = crate::perf::PerfGuard::new("api.dashboard_stats");
        Ok(self.aggregation.dashboard_stats()?)
    }

    /// 最近动态
    ///
    /// # 参数
    /// - limit: 返回条数上限，None 使用默认值；0 视为非法
    pub fn recent_activity(&self, limit: Option<u32>) -> ApiResult<Vec<ActivityEntry>> {
        let _perf = crate::perf::PerfGuard::new("api.recent_activity");
        if limit == Some(0) {
            return Err(ApiError::ValidationError("limit 必须大于0".to_string()));
        }
        Ok(self.aggregation.recent_activity(limit)?)
    }

    /// 交易历史
    ///
    /// # 参数
    /// - filter: "purchase" / "sale" / "production"，缺省或 "all" 为全部
    pub fn transaction_history(&self, filter: &HistoryFilter) -> ApiResult<Vec<HistoryRow>> {
        let _perf = crate::perf::PerfGuard::new("api.transaction_history");
        Ok(self.aggregation.transaction_history(filter)?)
    }
}
