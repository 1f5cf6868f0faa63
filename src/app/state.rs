// ==========================================
// 制造台账系统 - 应用状态
// ==========================================
// 职责: 组装连接管理、引擎与各 API 实例
// ==========================================

use std::sync::Arc;

use crate::api::{ReferenceApi, ReportApi, TransactionApi};
use crate::config::config_manager::ConfigManager;
use crate::config::AppConfig;
use crate::engine::{AggregationEngine, TransactionOrchestrator};
use crate::repository::connection::ConnectionManager;
use crate::repository::error::RepositoryResult;

/// 应用状态
///
/// 所有 API 共享同一个连接管理器（连接池）
pub struct AppState {
    /// 数据库路径
    pub db_path: String,

    /// 连接管理器
    pub connections: Arc<ConnectionManager>,

    /// 配置管理器（config_kv）
    pub config_manager: Arc<ConfigManager>,

    /// 聚合引擎（配置热加载用）
    pub aggregation: Arc<AggregationEngine>,

    /// 交易API
    pub transaction_api: Arc<TransactionApi>,

    /// 报表API
    pub report_api: Arc<ReportApi>,

    /// 主数据API
    pub reference_api: Arc<ReferenceApi>,
}

impl AppState {
    /// 创建新的AppState实例
    ///
    /// # 说明
    /// 1. 创建连接池并初始化表结构
    /// 2. 从 config_kv 加载聚合参数
    /// 3. 创建引擎与 API 实例
    ///
    /// # 返回
    /// - Err(String): 初始化错误（数据库不可用等）
    pub fn new(config: AppConfig) -> Result<Self, String> {
        tracing::info!("初始化AppState，数据库路径: {}", config.db_path);

        let connections = Arc::new(ConnectionManager::open(&config.db_path, config.pool));

        {
            let conn = connections
                .acquire()
                .map_err(|e| format!("无法连接数据库: {}", e))?;
            crate::db::init_schema(&conn).map_err(|e| format!("初始化表结构失败: {}", e))?;
        }

        let config_manager = Arc::new(ConfigManager::new(connections.clone()));
        let report_config = config_manager
            .load_report_config(config.report)
            .map_err(|e| format!("加载聚合参数失败: {}", e))?;
        tracing::debug!(?report_config, "聚合参数已加载");

        // ==========================================
        // 引擎层
        // ==========================================
        let orchestrator = Arc::new(TransactionOrchestrator::new(connections.clone()));
        let aggregation = Arc::new(AggregationEngine::new(connections.clone(), report_config));

        // ==========================================
        // API 层
        // ==========================================
        let transaction_api = Arc::new(TransactionApi::new(orchestrator.clone()));
        let report_api = Arc::new(ReportApi::new(aggregation.clone()));
        let reference_api = Arc::new(ReferenceApi::new(connections.clone(), orchestrator));

        tracing::info!("AppState初始化完成");

        Ok(Self {
            db_path: config.db_path,
            connections,
            config_manager,
            aggregation,
            transaction_api,
            report_api,
            reference_api,
        })
    }

    /// 重新从 config_kv 加载聚合参数
    pub fn reload_report_config(&self) -> RepositoryResult<()> {
        let current = self.aggregation.config();
        let reloaded = self.config_manager.load_report_config(current)?;
        self.aggregation.set_config(reloaded);
        Ok(())
    }
}
