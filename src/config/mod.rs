// ==========================================
// 制造台账系统 - 配置层
// ==========================================
// 职责: 系统配置管理
// - 启动配置（数据库路径/连接池）: 默认值 + 环境变量
// - 业务参数（低库存阈值等）: config_kv 表覆写默认值
// ==========================================

pub mod config_manager;

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

pub use config_manager::ConfigManager;

/// 环境变量名
pub mod env_keys {
    pub const DB_PATH: &str = "FACTORY_LEDGER_DB";
    pub const POOL_SIZE: &str = "FACTORY_LEDGER_POOL_SIZE";
    pub const CONNECT_ATTEMPTS: &str = "FACTORY_LEDGER_CONNECT_ATTEMPTS";
    pub const CONNECT_BACKOFF_MS: &str = "FACTORY_LEDGER_CONNECT_BACKOFF_MS";
}

/// config_kv 表中的配置键
pub mod config_keys {
    pub const LOW_STOCK_THRESHOLD: &str = "low_stock_threshold";
    pub const RECENT_ACTIVITY_PER_TYPE: &str = "recent_activity_per_type";
    pub const RECENT_ACTIVITY_LIMIT: &str = "recent_activity_limit";
}

// ==========================================
// PoolConfig - 连接池与重试
// ==========================================
// 退避为固定间隔（非指数）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PoolConfig {
    pub pool_size: usize,
    pub max_attempts: u32,
    pub backoff_ms: u64,
}

impl PoolConfig {
    pub fn backoff(&self) -> Duration {
        Duration::from_millis(self.backoff_ms)
    }
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            pool_size: 10,
            max_attempts: 3,
            backoff_ms: 1_000,
        }
    }
}

// ==========================================
// ReportConfig - 聚合查询参数
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ReportConfig {
    /// 低库存阈值（库存 <= 阈值即为低库存）
    pub low_stock_threshold: f64,
    /// 最近动态: 每种类型先取的条数
    pub recent_per_type: u32,
    /// 最近动态: 全局截断条数
    pub recent_limit: u32,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            low_stock_threshold: 10.0,
            recent_per_type: 5,
            recent_limit: 10,
        }
    }
}

// ==========================================
// AppConfig - 应用配置
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AppConfig {
    pub db_path: String,
    pub pool: PoolConfig,
    pub report: ReportConfig,
}

impl AppConfig {
    /// 使用指定数据库路径与默认参数
    pub fn with_db_path(db_path: impl Into<String>) -> Self {
        Self {
            db_path: db_path.into(),
            pool: PoolConfig::default(),
            report: ReportConfig::default(),
        }
    }

    /// 默认值 + 环境变量覆写
    ///
    /// 无法解析的环境变量值会被忽略并记录告警
    pub fn from_env() -> Self {
        let db_path = std::env::var(env_keys::DB_PATH)
            .ok()
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
            .unwrap_or_else(get_default_db_path);

        let mut config = Self::with_db_path(db_path);
        if let Some(v) = parse_env::<usize>(env_keys::POOL_SIZE) {
            config.pool.pool_size = v.max(1);
        }
        if let Some(v) = parse_env::<u32>(env_keys::CONNECT_ATTEMPTS) {
            config.pool.max_attempts = v.max(1);
        }
        if let Some(v) = parse_env::<u64>(env_keys::CONNECT_BACKOFF_MS) {
            config.pool.backoff_ms = v;
        }
        config
    }
}

fn parse_env<T: std::str::FromStr>(key: &str) -> Option<T> {
    let raw = std::env::var(key).ok()?;
    match raw.trim().parse::<T>() {
        Ok(v) => Some(v),
        Err(_) => {
            tracing::warn!("环境变量 {} 的值无法解析，已忽略: {}", key, raw);
            None
        }
    }
}

/// 获取默认数据库路径
///
/// - 用户本地数据目录/factory-ledger/factory_ledger.db
/// - 取不到数据目录时回退到当前目录
pub fn get_default_db_path() -> String {
    let mut path = PathBuf::from("./factory_ledger.db");

    if let Some(data_dir) = dirs::data_local_dir() {
        let dir = data_dir.join("factory-ledger");
        // best-effort: 目录创建失败时由打开连接报错
        std::fs::create_dir_all(&dir).ok();
        path = dir.join("factory_ledger.db");
    }

    path.to_string_lossy().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = AppConfig::with_db_path("x.db");
        assert_eq!(config.pool.max_attempts, 3);
        assert_eq!(config.pool.backoff(), Duration::from_secs(1));
        assert_eq!(config.report.low_stock_threshold, 10.0);
        assert_eq!(config.report.recent_per_type, 5);
        assert_eq!(config.report.recent_limit, 10);
    }

    #[test]
    fn test_get_default_db_path() {
        let path = get_default_db_path();
        assert!(path.ends_with(".db"));
    }
}
