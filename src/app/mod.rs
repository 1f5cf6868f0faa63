// ==========================================
// 制造台账系统 - 应用层
// ==========================================
// 职责: 组装应用状态，把请求分发到各 API
// ==========================================

pub mod commands;
pub mod state;

// 重导出
pub use commands::{dispatch, dispatch_json, parse_request, Request};
pub use state::AppState;
