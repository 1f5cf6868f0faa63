// ==========================================
// 制造台账系统 - 数据仓储层
// ==========================================
// 红线: Repository 不含编排逻辑，事务边界由引擎层控制
// 约束: 所有查询使用参数化，防止 SQL 注入
// ==========================================

pub mod bill_repo;
pub mod connection;
pub mod error;
pub mod inventory_repo;
pub mod party_repo;
pub mod production_repo;
pub mod report_repo;
pub mod stock_repo;

// 重导出核心仓储
pub use bill_repo::{BillLineRecord, BillRepository};
pub use connection::{
    ConnectionManager, ConnectionPool, ConnectionSource, PoolStatus, PooledConnection,
    SqliteFileSource,
};
pub use error::{RepositoryError, RepositoryResult};
pub use inventory_repo::InventoryRepository;
pub use party_repo::{
    ensure_party_exists, BuyerRepository, DepartmentRepository, EmployeeRepository, PartyKind,
    SupplierRepository,
};
pub use production_repo::ProductionRepository;
pub use report_repo::ReportRepository;
pub use stock_repo::StockRepository;
