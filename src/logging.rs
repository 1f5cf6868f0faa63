// ==========================================
// 制造台账系统 - 日志
// ==========================================
// tracing-subscriber 输出到 stderr（stdout 专用于请求应答）
// RUST_LOG 控制级别，FACTORY_LEDGER_LOG_JSON=1 切换为 JSON 行
// ==========================================

use tracing_subscriber::{fmt, EnvFilter};

const LOG_JSON_ENV: &str = "FACTORY_LEDGER_LOG_JSON";
const DEFAULT_DIRECTIVE: &str = "info";

/// 日志输出格式
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    /// 人读格式
    Pretty,
    /// 每行一个 JSON 对象，便于采集
    Json,
}

impl LogFormat {
    /// 由环境变量决定（"1" / "true" 为 JSON）
    pub fn from_env() -> Self {
        match std::env::var(LOG_JSON_ENV) {
            Ok(v) if matches!(v.trim().to_ascii_lowercase().as_str(), "1" | "true") => {
                LogFormat::Json
            }
            _ => LogFormat::Pretty,
        }
    }
}

fn env_filter() -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_DIRECTIVE))
}

/// 按环境变量初始化全局日志
///
/// 已初始化过时忽略（不 panic）
pub fn init() {
    init_with(LogFormat::from_env());
}

pub fn init_with(format: LogFormat) {
    let builder = fmt()
        .with_env_filter(env_filter())
        .with_target(true)
        .with_line_number(true)
        .with_writer(std::io::stderr);

    let installed = match format {
        LogFormat::Pretty => builder.try_init(),
        LogFormat::Json => builder.json().with_current_span(true).try_init(),
    };
    if installed.is_err() {
        tracing::debug!("全局日志已初始化，跳过");
    }
}

/// 测试日志（debug 级别，写入测试捕获输出）
pub fn init_test() {
    let _ = fmt()
        .with_env_filter(EnvFilter::new("factory_ledger=debug"))
        .with_test_writer()
        .try_init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_init_is_idempotent() {
        init_test();
        init_test();
        init_with(LogFormat::Pretty);
        tracing::debug!("logging ready");
    }
}
