// ==========================================
// 制造台账系统 - 配置管理器
// ==========================================
// 存储: config_kv 表 (scope_id='global' + key → value)
// ==========================================

use rusqlite::{params, OptionalExtension};
use std::sync::Arc;

use crate::config::{config_keys, ReportConfig};
use crate::repository::connection::ConnectionManager;
use crate::repository::error::{RepositoryError, RepositoryResult};

// ==========================================
// ConfigManager - 配置管理器
// ==========================================
pub struct ConfigManager {
    connections: Arc<ConnectionManager>,
}

impl ConfigManager {
    pub fn new(connections: Arc<ConnectionManager>) -> Self {
        Self { connections }
    }

    /// 读取 global scope 的配置值
    ///
    /// # 返回
    /// - Some(String): 配置值
    /// - None: 配置不存在
    pub fn get_global_config_value(&self, key: &str) -> RepositoryResult<Option<String>> {
        let conn = self.connections.acquire()?;
        let value = conn
            .query_row(
                "SELECT value FROM config_kv WHERE scope_id = 'global' AND key = ?1",
                params![key],
                |row| row.get::<_, String>(0),
            )
            .optional()?;
        Ok(value)
    }

    /// 写入 global scope 的配置值（UPSERT）
    ///
    /// 聚合参数键按取值范围校验，不合法时不写入
    pub fn set_config_value(&self, key: &str, value: &str) -> RepositoryResult<()> {
        if key.trim().is_empty() {
            return Err(RepositoryError::ValidationError("配置键不能为空".to_string()));
        }
        check_report_value(key, value).map_err(RepositoryError::ValidationError)?;

        let conn = self.connections.acquire()?;
        conn.execute(
            "INSERT INTO config_kv (scope_id, key, value) VALUES ('global', ?1, ?2)
             ON CONFLICT(scope_id, key) DO UPDATE SET value = ?2, updated_at = datetime('now')",
            params![key, value],
        )?;
        tracing::info!("配置已更新: {}={}", key, value);
        Ok(())
    }

    /// 读取聚合参数，缺失或不合法时回退 fallback
    fn get_report_value<T: std::str::FromStr>(&self, key: &str, fallback: T) -> RepositoryResult<T> {
        let Some(raw) = self.get_global_config_value(key)? else {
            return Ok(fallback);
        };
        if let Err(reason) = check_report_value(key, &raw) {
            tracing::warn!("配置 {} 不合法，使用默认值: {}", key, reason);
            return Ok(fallback);
        }
        Ok(raw.trim().parse::<T>().unwrap_or(fallback))
    }

    /// 加载聚合查询参数（config_kv 覆写 base）
    pub fn load_report_config(&self, base: ReportConfig) -> RepositoryResult<ReportConfig> {
        Ok(ReportConfig {
            low_stock_threshold: self
                .get_report_value(config_keys::LOW_STOCK_THRESHOLD, base.low_stock_threshold)?,
            recent_per_type: self
                .get_report_value(config_keys::RECENT_ACTIVITY_PER_TYPE, base.recent_per_type)?,
            recent_limit: self
                .get_report_value(config_keys::RECENT_ACTIVITY_LIMIT, base.recent_limit)?,
        })
    }
}

/// 聚合参数取值范围
///
/// - low_stock_threshold: 有限且 >= 0
/// - recent_activity_per_type / recent_activity_limit: 正整数
/// - 其他键不校验
fn check_report_value(key: &str, raw: &str) -> Result<(), String> {
    let raw = raw.trim();
    match key {
        config_keys::LOW_STOCK_THRESHOLD => match raw.parse::<f64>() {
            Ok(v) if v.is_finite() && v >= 0.0 => Ok(()),
            _ => Err(format!("{} 必须是不小于0的有限数: {}", key, raw)),
        },
        config_keys::RECENT_ACTIVITY_PER_TYPE | config_keys::RECENT_ACTIVITY_LIMIT => {
            match raw.parse::<u32>() {
                Ok(v) if v > 0 => Ok(()),
                _ => Err(format!("{} 必须是正整数: {}", key, raw)),
            }
        }
        _ => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_report_value_bounds() {
        assert!(check_report_value(config_keys::LOW_STOCK_THRESHOLD, "0").is_ok());
        assert!(check_report_value(config_keys::LOW_STOCK_THRESHOLD, " 12.5 ").is_ok());
        assert!(check_report_value(config_keys::LOW_STOCK_THRESHOLD, "NaN").is_err());
        assert!(check_report_value(config_keys::LOW_STOCK_THRESHOLD, "inf").is_err());
        assert!(check_report_value(config_keys::LOW_STOCK_THRESHOLD, "-1").is_err());

        assert!(check_report_value(config_keys::RECENT_ACTIVITY_LIMIT, "0").is_err());
        assert!(check_report_value(config_keys::RECENT_ACTIVITY_LIMIT, "abc").is_err());
        assert!(check_report_value(config_keys::RECENT_ACTIVITY_PER_TYPE, "0").is_err());
        assert!(check_report_value(config_keys::RECENT_ACTIVITY_PER_TYPE, "3").is_ok());

        assert!(check_report_value("ui_theme", "anything").is_ok());
    }
}
