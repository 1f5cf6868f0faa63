// ==========================================
// 制造台账系统 - API 层
// ==========================================
// 职责: 对外业务接口，统一错误分类与返回信封
// ==========================================

pub mod envelope;
pub mod error;
pub mod reference_api;
pub mod report_api;
pub mod transaction_api;

// 重导出核心类型
pub use envelope::Envelope;
pub use error::{ApiError, ApiResult};
pub use reference_api::ReferenceApi;
pub use report_api::ReportApi;
pub use transaction_api::TransactionApi;
