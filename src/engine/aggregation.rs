// ==========================================
// 制造台账系统 - 聚合引擎
// ==========================================
// 驾驶舱统计: 四个计数查询并发执行，整体成功或整体失败
// 最近动态:   每类先取前 N 条，合并后全局按时间倒序截断
// 交易历史:   按类型过滤或三类合并，按时间倒序
// ==========================================

use std::sync::{Arc, RwLock};
use std::thread;
use tracing::debug;

use crate::config::ReportConfig;
use crate::domain::report::{ActivityEntry, DashboardStats, HistoryFilter, HistoryRow};
use crate::domain::types::ActivityType;
use crate::repository::connection::ConnectionManager;
use crate::repository::error::{RepositoryError, RepositoryResult};
use crate::repository::report_repo::ReportRepository;

const ALL_TYPES: [ActivityType; 3] = [
    ActivityType::Purchase,
    ActivityType::Sale,
    ActivityType::Production,
];

// ==========================================
// AggregationEngine - 聚合引擎
// ==========================================
pub struct AggregationEngine {
    reports: ReportRepository,
    config: RwLock<ReportConfig>,
}

impl AggregationEngine {
    pub fn new(connections: Arc<ConnectionManager>, config: ReportConfig) -> Self {
        Self {
            reports: ReportRepository::new(connections),
            config: RwLock::new(config),
        }
    }

    pub fn config(&self) -> ReportConfig {
        match self.config.read() {
            Ok(config) => *config,
            Err(poisoned) => *poisoned.into_inner(),
        }
    }

    /// 替换聚合参数（配置变更后热加载）
    pub fn set_config(&self, config: ReportConfig) {
        match self.config.write() {
            Ok(mut current) => *current = config,
            Err(poisoned) => *poisoned.into_inner() = config,
        }
        debug!(?config, "聚合参数已更新");
    }

    /// 驾驶舱统计
    ///
    /// 四个计数各自占用一条池连接并发执行；任一失败则整体失败
    pub fn dashboard_stats(&self) -> RepositoryResult<DashboardStats> {
        let threshold = self.config().low_stock_threshold;
        let reports = &self.reports;

        let (suppliers, employees, products, low_stock) = thread::scope(|s| {
            let suppliers = s.spawn(|| reports.count_suppliers());
            let employees = s.spawn(|| reports.count_employees());
            let products = s.spawn(|| reports.count_products());
            let low_stock = s.spawn(move || reports.count_low_stock_products(threshold));
            (
                join_count(suppliers.join()),
                join_count(employees.join()),
                join_count(products.join()),
                join_count(low_stock.join()),
            )
        });

        let stats = DashboardStats {
            supplier_count: suppliers?,
            employee_count: employees?,
            product_count: products?,
            low_stock_count: low_stock?,
        };
        debug!(?stats, threshold, "驾驶舱统计完成");
        Ok(stats)
    }

    /// 最近动态
    ///
    /// # 参数
    /// - limit: 全局截断条数，None 使用配置值
    ///
    /// 两级排序: 每类只取前 recent_per_type 条，某类近期集中发生时其他类可能不足额出现
    pub fn recent_activity(&self, limit: Option<u32>) -> RepositoryResult<Vec<ActivityEntry>> {
        let config = self.config();
        let limit = limit.unwrap_or(config.recent_limit);
        let per_type = config.recent_per_type;

        let mut groups = Vec::with_capacity(ALL_TYPES.len());
        for activity_type in ALL_TYPES {
            groups.push(self.reports.recent_activity(activity_type, per_type)?);
        }

        let merged = merge_recent(groups, limit as usize);
        debug!(per_type, limit, returned = merged.len(), "最近动态查询完成");
        Ok(merged)
    }

    /// 交易历史
    ///
    /// 过滤到单一类型时只执行该类型的查询；否则三类合并后按时间倒序
    pub fn transaction_history(&self, filter: &HistoryFilter) -> RepositoryResult<Vec<HistoryRow>> {
        let selected = filter
            .activity_type()
            .map_err(RepositoryError::ValidationError)?;

        let rows = match selected {
            Some(activity_type) => self.reports.transaction_history(activity_type)?,
            None => {
                let mut rows = Vec::new();
                for activity_type in ALL_TYPES {
                    rows.extend(self.reports.transaction_history(activity_type)?);
                }
                rows.sort_by(|a, b| b.date.cmp(&a.date));
                rows
            }
        };

        debug!(filter = ?selected, returned = rows.len(), "交易历史查询完成");
        Ok(rows)
    }
}

fn join_count(
    joined: thread::Result<RepositoryResult<i64>>,
) -> RepositoryResult<i64> {
    joined.unwrap_or_else(|_| {
        Err(RepositoryError::InternalError(
            "统计查询线程异常退出".to_string(),
        ))
    })
}

/// 合并各类型的动态，按时间倒序（稳定排序）后截断
fn merge_recent(groups: Vec<Vec<ActivityEntry>>, limit: usize) -> Vec<ActivityEntry> {
    let mut merged: Vec<ActivityEntry> = groups.into_iter().flatten().collect();
    merged.sort_by(|a, b| b.date.cmp(&a.date));
    merged.truncate(limit);
    merged
}
