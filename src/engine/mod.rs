// ==========================================
// 制造台账系统 - 引擎层
// ==========================================
// 职责: 事务编排与聚合视图，SQL 留在仓储层
// 红线: 写操作的事务边界只在编排器中开启与结束
// ==========================================

pub mod aggregation;
pub mod orchestrator;

// 重导出核心引擎
pub use aggregation::AggregationEngine;
pub use orchestrator::TransactionOrchestrator;
