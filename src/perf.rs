// ==========================================
// 制造台账系统 - 性能统计
// ==========================================
// 每个 API 操作一条 perf 日志: 耗时 / SQL 数 / 库存写入数 / 慢 SQL 数
// 统计依赖池化连接上的 profile 回调，仅在 PerfGuard 存活期间计数
// ==========================================

use rusqlite::Connection;
use std::cell::Cell;
use std::sync::OnceLock;
use std::time::{Duration, Instant};

/// 开关环境变量
pub const ENV_PERF_SQL: &str = "FACTORY_LEDGER_PERF_SQL";
/// 慢 SQL 阈值环境变量（毫秒，0 表示不记录）
pub const ENV_SLOW_SQL_MS: &str = "FACTORY_LEDGER_SLOW_SQL_MS";

const SQL_LOG_CHARS: usize = 400;

/// 进程级统计设置，首次使用时从环境变量读取
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PerfSettings {
    pub enabled: bool,
    pub slow_ms: u64,
}

impl PerfSettings {
    pub fn from_env() -> Self {
        let enabled = std::env::var(ENV_PERF_SQL)
            .map(|v| {
                matches!(
                    v.trim().to_ascii_lowercase().as_str(),
                    "1" | "true" | "yes" | "on"
                )
            })
            .unwrap_or(cfg!(debug_assertions));
        let slow_ms = std::env::var(ENV_SLOW_SQL_MS)
            .ok()
            .and_then(|v| v.trim().parse::<u64>().ok())
            .unwrap_or(if cfg!(debug_assertions) { 50 } else { 200 });
        Self { enabled, slow_ms }
    }
}

pub fn settings() -> PerfSettings {
    static SETTINGS: OnceLock<PerfSettings> = OnceLock::new();
    *SETTINGS.get_or_init(PerfSettings::from_env)
}

/// 本线程的累计计数
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SqlCounters {
    pub statements: u64,
    pub stock_writes: u64,
    pub slow: u64,
}

impl SqlCounters {
    fn since(self, start: SqlCounters) -> SqlCounters {
        SqlCounters {
            statements: self.statements.saturating_sub(start.statements),
            stock_writes: self.stock_writes.saturating_sub(start.stock_writes),
            slow: self.slow.saturating_sub(start.slow),
        }
    }
}

thread_local! {
    static ACTIVE_GUARDS: Cell<u32> = const { Cell::new(0) };
    static COUNTERS: Cell<SqlCounters> = const {
        Cell::new(SqlCounters { statements: 0, stock_writes: 0, slow: 0 })
    };
}

fn current() -> SqlCounters {
    COUNTERS.with(Cell::get)
}

/// 库存守卫语句: UPDATE material / product ... SET stock = ...
fn is_stock_write(sql: &str) -> bool {
    let head: String = sql
        .split_whitespace()
        .take(4)
        .collect::<Vec<_>>()
        .join(" ")
        .to_ascii_uppercase();
    (head.starts_with("UPDATE MATERIAL") || head.starts_with("UPDATE PRODUCT"))
        && sql.to_ascii_lowercase().contains("stock")
}

fn one_line(sql: &str, max_chars: usize) -> String {
    let flat = sql.split_whitespace().collect::<Vec<_>>().join(" ");
    match flat.char_indices().nth(max_chars) {
        Some((cut, _)) => format!("{}…", &flat[..cut]),
        None => flat,
    }
}

/// 在连接上按进程设置安装统计回调
pub fn install_sqlite_tracing(conn: &mut Connection) {
    install_with(conn, settings());
}

pub fn install_with(conn: &mut Connection, settings: PerfSettings) {
    if settings.enabled {
        conn.profile(Some(on_statement_done));
    } else {
        // 连接可能被复用，清掉旧回调
        conn.profile(None);
    }
}

fn on_statement_done(sql: &str, duration: Duration) {
    let threshold = settings().slow_ms;
    let ms = duration.as_millis() as u64;
    let slow = threshold > 0 && ms >= threshold;
    if slow {
        tracing::warn!(
            target: "slow_sql",
            duration_ms = ms,
            sql = %one_line(sql, SQL_LOG_CHARS),
            "slow sql"
        );
    }

    if ACTIVE_GUARDS.with(Cell::get) == 0 {
        return;
    }
    let mut c = current();
    c.statements = c.statements.saturating_add(1);
    if is_stock_write(sql) {
        c.stock_writes = c.stock_writes.saturating_add(1);
    }
    if slow {
        c.slow = c.slow.saturating_add(1);
    }
    COUNTERS.with(|cell| cell.set(c));
}

/// 操作级统计，drop 时输出一条 target = "perf" 的日志
///
/// ```ignore
/// let _perf = factory_ledger::perf::PerfGuard::new("api.sell");
/// ```
pub struct PerfGuard {
    op: &'static str,
    started: Instant,
    at_start: SqlCounters,
}

impl PerfGuard {
    pub fn new(op: &'static str) -> Self {
        ACTIVE_GUARDS.with(|d| d.set(d.get().saturating_add(1)));
        Self {
            op,
            started: Instant::now(),
            at_start: current(),
        }
    }

    /// Guard 创建以来本线程的计数
    pub fn counters(&self) -> SqlCounters {
        current().since(self.at_start)
    }
}

impl Drop for PerfGuard {
    fn drop(&mut self) {
        let SqlCounters {
            statements,
            stock_writes,
            slow,
        } = self.counters();

        tracing::info!(
            target: "perf",
            op = self.op,
            elapsed_ms = self.started.elapsed().as_millis() as u64,
            sql_count = statements,
            stock_writes,
            slow_sql_count = slow,
            "done"
        );

        ACTIVE_GUARDS.with(|d| d.set(d.get().saturating_sub(1)));
    }
}
