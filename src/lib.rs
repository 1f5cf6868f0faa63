// ==========================================
// 制造台账系统 - 核心库
// ==========================================
// 技术栈: Rust + SQLite
// 系统定位: 小型制造企业的库存与往来台账事务核心
// ==========================================

// ==========================================
// 模块声明
// ==========================================

// 领域层 - 实体与类型
pub mod domain;

// 数据仓储层 - 数据访问
pub mod repository;

// 引擎层 - 事务编排与聚合
pub mod engine;

// 配置层 - 系统配置
pub mod config;

// 数据库基础设施（连接初始化/PRAGMA 统一/建表）
pub mod db;

// 日志系统
pub mod logging;

// SQL 性能统计
pub mod perf;

// API 层 - 业务接口
pub mod api;

// 应用层 - 状态与命令分发
pub mod app;

// ==========================================
// 重导出核心类型
// ==========================================

// 领域类型
pub use domain::types::{ActivityType, ItemKind, TxState};

// 领域实体
pub use domain::{
    ActivityEntry, BillReceipt, BuyLine, DashboardStats, HistoryFilter, HistoryRow,
    InventoryItem, ProductionLine, SellLine,
};

// 引擎
pub use engine::{AggregationEngine, TransactionOrchestrator};

// API
pub use api::{ApiError, ApiResult, Envelope, ReferenceApi, ReportApi, TransactionApi};

// 应用
pub use app::AppState;

// ==========================================
// 常量定义
// ==========================================

// 系统版本
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

// 系统名称
pub const APP_NAME: &str = "制造台账系统";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        assert!(!VERSION.is_empty());
    }
}
