// ==========================================
// 制造台账系统 - 领域模型层
// ==========================================
// 职责: 定义领域实体、类型
// 红线: 不含数据访问逻辑,不含引擎逻辑
// ==========================================

pub mod inventory;
pub mod party;
pub mod report;
pub mod transaction;
pub mod types;

// 重导出核心类型
pub use inventory::{InventoryItem, InventoryItemUpdate, NewInventoryItem};
pub use party::{
    Buyer, CompanyFields, Department, DepartmentFields, Employee, EmployeeFields, Supplier,
};
pub use report::{ActivityEntry, DashboardStats, HistoryFilter, HistoryRow};
pub use transaction::{BillReceipt, BuyLine, ProductionLine, SellLine};
pub use types::{ActivityType, ItemKind, TxState};
