// ==========================================
// 制造台账系统 - 连接管理
// ==========================================
// ConnectionSource: 产生一条已配置的新连接
// ConnectionPool:   固定容量，空闲连接复用，归还由 PooledConnection 的 Drop 保证
// ConnectionManager: 带固定退避的有限次重试获取
// ==========================================

use rusqlite::Connection;
use std::ops::{Deref, DerefMut};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use crate::config::PoolConfig;
use crate::db::open_sqlite_connection;
use crate::repository::error::{RepositoryError, RepositoryResult};

// ==========================================
// ConnectionSource - 连接来源
// ==========================================
pub trait ConnectionSource: Send + Sync {
    /// 打开一条新连接（失败视为可重试的连接错误）
    fn connect(&self) -> RepositoryResult<Connection>;
}

/// SQLite 文件数据库连接来源
pub struct SqliteFileSource {
    db_path: String,
}

impl SqliteFileSource {
    pub fn new(db_path: impl Into<String>) -> Self {
        Self {
            db_path: db_path.into(),
        }
    }

    pub fn db_path(&self) -> &str {
        &self.db_path
    }
}

impl ConnectionSource for SqliteFileSource {
    fn connect(&self) -> RepositoryResult<Connection> {
        let mut conn = open_sqlite_connection(&self.db_path).map_err(|e| {
            RepositoryError::DatabaseConnectionError(format!("无法打开数据库: {}", e))
        })?;
        crate::perf::install_sqlite_tracing(&mut conn);
        Ok(conn)
    }
}

// ==========================================
// ConnectionPool - 固定容量连接池
// ==========================================

/// 连接池状态快照
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PoolStatus {
    pub capacity: usize,
    pub idle: usize,
    pub checked_out: usize,
}

struct PoolState {
    idle: Vec<Connection>,
    checked_out: usize,
}

pub struct ConnectionPool {
    source: Arc<dyn ConnectionSource>,
    capacity: usize,
    state: Mutex<PoolState>,
}

impl ConnectionPool {
    /// 创建连接池（连接按需创建，capacity 至少为 1）
    pub fn new(source: Arc<dyn ConnectionSource>, capacity: usize) -> Arc<Self> {
        Arc::new(Self {
            source,
            capacity: capacity.max(1),
            state: Mutex::new(PoolState {
                idle: Vec::new(),
                checked_out: 0,
            }),
        })
    }

    fn lock_state(&self) -> RepositoryResult<MutexGuard<'_, PoolState>> {
        self.state
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    /// 尝试取出一条连接（不等待）
    ///
    /// - 优先复用空闲连接
    /// - 未满容量时新建
    /// - 已满容量返回 PoolExhausted
    pub fn try_get(self: &Arc<Self>) -> RepositoryResult<PooledConnection> {
        {
            let mut state = self.lock_state()?;
            if let Some(conn) = state.idle.pop() {
                state.checked_out += 1;
                return Ok(PooledConnection::new(conn, Arc::clone(self)));
            }
            if state.checked_out >= self.capacity {
                return Err(RepositoryError::PoolExhausted {
                    capacity: self.capacity,
                });
            }
            // 先占位，建连期间不持有锁
            state.checked_out += 1;
        }

        match self.source.connect() {
            Ok(conn) => Ok(PooledConnection::new(conn, Arc::clone(self))),
            Err(e) => {
                if let Ok(mut state) = self.state.lock() {
                    state.checked_out = state.checked_out.saturating_sub(1);
                }
                Err(e)
            }
        }
    }

    pub fn status(&self) -> RepositoryResult<PoolStatus> {
        let state = self.lock_state()?;
        Ok(PoolStatus {
            capacity: self.capacity,
            idle: state.idle.len(),
            checked_out: state.checked_out,
        })
    }

    fn give_back(&self, conn: Option<Connection>) {
        let mut state = match self.state.lock() {
            Ok(state) => state,
            Err(poisoned) => poisoned.into_inner(),
        };
        state.checked_out = state.checked_out.saturating_sub(1);
        if let Some(conn) = conn {
            state.idle.push(conn);
        }
    }
}

// ==========================================
// PooledConnection - 作用域连接
// ==========================================
// Drop 时无论成功/失败/panic 都归还连接池；
// 若连接仍处于未结束的事务中，先回滚再归还
pub struct PooledConnection {
    conn: Option<Connection>,
    pool: Arc<ConnectionPool>,
}

impl PooledConnection {
    fn new(conn: Connection, pool: Arc<ConnectionPool>) -> Self {
        Self {
            conn: Some(conn),
            pool,
        }
    }
}

impl Deref for PooledConnection {
    type Target = Connection;

    fn deref(&self) -> &Connection {
        // conn 仅在 drop 中被取走
        self.conn.as_ref().expect("pooled connection already released")
    }
}

impl DerefMut for PooledConnection {
    fn deref_mut(&mut self) -> &mut Connection {
        self.conn.as_mut().expect("pooled connection already released")
    }
}

impl Drop for PooledConnection {
    fn drop(&mut self) {
        let mut conn = self.conn.take();
        if let Some(c) = conn.as_ref() {
            if !c.is_autocommit() {
                tracing::warn!("连接归还时仍处于事务中，执行回滚");
                if let Err(e) = c.execute_batch("ROLLBACK") {
                    tracing::error!("归还前回滚失败，丢弃该连接: {}", e);
                    conn = None;
                }
            }
        }
        self.pool.give_back(conn);
    }
}

// ==========================================
// ConnectionManager - 带重试的连接获取
// ==========================================
pub struct ConnectionManager {
    pool: Arc<ConnectionPool>,
    config: PoolConfig,
}

impl ConnectionManager {
    pub fn new(source: Arc<dyn ConnectionSource>, config: PoolConfig) -> Self {
        Self {
            pool: ConnectionPool::new(source, config.pool_size),
            config,
        }
    }

    /// 基于 SQLite 文件创建
    pub fn open(db_path: &str, config: PoolConfig) -> Self {
        Self::new(Arc::new(SqliteFileSource::new(db_path)), config)
    }

    pub fn config(&self) -> &PoolConfig {
        &self.config
    }

    pub fn pool_status(&self) -> RepositoryResult<PoolStatus> {
        self.pool.status()
    }

    /// 按配置的次数与退避获取连接
    pub fn acquire(&self) -> RepositoryResult<PooledConnection> {
        self.acquire_with(self.config.max_attempts, self.config.backoff())
    }

    /// 获取连接
    ///
    /// # 参数
    /// - max_attempts: 最大尝试次数（0 按 1 处理）
    /// - backoff: 每次失败后的固定等待时间
    ///
    /// # 返回
    /// - Ok(PooledConnection): 作用域连接，drop 即归还
    /// - Err(DatabaseConnectionError): 尝试耗尽，包装最后一次失败原因
    /// - Err(其他): 非连接层错误，立即返回不重试
    pub fn acquire_with(
        &self,
        max_attempts: u32,
        backoff: Duration,
    ) -> RepositoryResult<PooledConnection> {
        let max_attempts = max_attempts.max(1);
        let mut remaining = max_attempts;

        loop {
            match self.pool.try_get() {
                Ok(conn) => return Ok(conn),
                // 非连接层错误（如锁失效）重试无意义
                Err(e) if !e.is_transient() => return Err(e),
                Err(e) => {
                    remaining -= 1;
                    if remaining == 0 {
                        tracing::error!(
                            attempts = max_attempts,
                            error = %e,
                            "数据库连接重试耗尽"
                        );
                        return Err(RepositoryError::DatabaseConnectionError(format!(
                            "重试{}次后仍无法获取连接: {}",
                            max_attempts, e
                        )));
                    }
                    tracing::warn!(
                        remaining,
                        backoff_ms = backoff.as_millis() as u64,
                        error = %e,
                        "数据库连接失败，等待重试"
                    );
                    std::thread::sleep(backoff);
                }
            }
        }
    }

    /// 连通性检查：取连接并读取数据库时间
    pub fn test_connection(&self) -> bool {
        let conn = match self.acquire() {
            Ok(conn) => conn,
            Err(e) => {
                tracing::error!("连通性检查失败: {}", e);
                return false;
            }
        };

        match conn.query_row("SELECT datetime('now')", [], |row| row.get::<_, String>(0)) {
            Ok(now) => {
                tracing::info!("数据库连接正常，数据库时间: {}", now);
                true
            }
            Err(e) => {
                tracing::error!("连通性检查查询失败: {}", e);
                false
            }
        }
    }
}
