// ==========================================
// 制造台账系统 - SQLite 连接初始化与建表
// ==========================================
// 目标:
// - 统一所有连接的 PRAGMA 行为（外键/WAL/busy_timeout）
// - 幂等建表，schema_version 记录当前版本
// - 库存只通过应用层增量语句变动：不建触发器，不依赖存储过程
// ==========================================

use rusqlite::Connection;
use rusqlite::OptionalExtension;
use std::time::Duration;

/// 默认 busy_timeout（毫秒）
pub const DEFAULT_BUSY_TIMEOUT_MS: u64 = 5_000;

/// 当前代码所期望的 schema_version
pub const CURRENT_SCHEMA_VERSION: i64 = 1;

/// 配置 SQLite 连接的统一 PRAGMA
///
/// 说明：
/// - foreign_keys 需要“每个连接”单独开启
/// - busy_timeout 需要“每个连接”单独配置
/// - WAL 模式下读者不阻塞写者，读侧只能看到已提交数据
pub fn configure_sqlite_connection(conn: &Connection) -> rusqlite::Result<()> {
    // 先设 busy_timeout，切换 WAL 时若有其他连接持锁可等待
    conn.busy_timeout(Duration::from_millis(DEFAULT_BUSY_TIMEOUT_MS))?;
    conn.execute_batch("PRAGMA foreign_keys = ON;")?;
    // 内存库不支持 WAL，返回值为实际生效的模式，这里不关心
    let _mode: String = conn.query_row("PRAGMA journal_mode = WAL", [], |row| row.get(0))?;
    Ok(())
}

/// 打开 SQLite 连接并应用统一配置
pub fn open_sqlite_connection(db_path: &str) -> rusqlite::Result<Connection> {
    let conn = Connection::open(db_path)?;
    configure_sqlite_connection(&conn)?;
    Ok(conn)
}

/// 读取 schema_version（若表不存在则返回 None）
pub fn read_schema_version(conn: &Connection) -> rusqlite::Result<Option<i64>> {
    let has_table: bool = conn
        .query_row(
            "SELECT 1 FROM sqlite_master WHERE type='table' AND name='schema_version' LIMIT 1",
            [],
            |_row| Ok(true),
        )
        .optional()?
        .unwrap_or(false);

    if !has_table {
        return Ok(None);
    }

    let v: Option<i64> =
        conn.query_row("SELECT MAX(version) FROM schema_version", [], |row| row.get(0))?;
    Ok(v)
}

/// 初始化数据库 schema（幂等）
///
/// 约定:
/// - material/product 使用代理主键 id，name 仅作为唯一自然键；明细行引用 id
/// - stock 由 CHECK 约束兜底不允许为负
/// - 单据头与明细一经提交不可修改
pub fn init_schema(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch(
        r#"
        CREATE TABLE IF NOT EXISTS schema_version (
            version INTEGER PRIMARY KEY,
            applied_at TEXT NOT NULL DEFAULT (datetime('now'))
        );

        CREATE TABLE IF NOT EXISTS config_kv (
            scope_id TEXT NOT NULL DEFAULT 'global',
            key TEXT NOT NULL,
            value TEXT NOT NULL,
            updated_at TEXT NOT NULL DEFAULT (datetime('now')),
            PRIMARY KEY (scope_id, key)
        );

        -- ===== 往来单位 =====
        CREATE TABLE IF NOT EXISTS supplier (
            s_id INTEGER PRIMARY KEY AUTOINCREMENT,
            company_name TEXT NOT NULL,
            contact_name TEXT,
            phone_no TEXT,
            email TEXT,
            address TEXT
        );

        CREATE TABLE IF NOT EXISTS buyer (
            b_id INTEGER PRIMARY KEY AUTOINCREMENT,
            company_name TEXT NOT NULL,
            contact_name TEXT,
            phone_no TEXT,
            email TEXT,
            address TEXT
        );

        CREATE TABLE IF NOT EXISTS department (
            d_id INTEGER PRIMARY KEY AUTOINCREMENT,
            department_name TEXT NOT NULL UNIQUE
        );

        CREATE TABLE IF NOT EXISTS employee (
            e_id INTEGER PRIMARY KEY AUTOINCREMENT,
            employee_name TEXT NOT NULL,
            age INTEGER,
            gender TEXT,
            employee_type TEXT,
            role TEXT,
            salary REAL NOT NULL DEFAULT 0 CHECK (salary >= 0),
            phone_no TEXT,
            email TEXT,
            address TEXT
        );

        -- ===== 库存品 =====
        CREATE TABLE IF NOT EXISTS material (
            material_id INTEGER PRIMARY KEY AUTOINCREMENT,
            material_name TEXT NOT NULL UNIQUE,
            stock REAL NOT NULL DEFAULT 0 CHECK (stock >= 0),
            unit TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS product (
            product_id INTEGER PRIMARY KEY AUTOINCREMENT,
            product_name TEXT NOT NULL UNIQUE,
            stock REAL NOT NULL DEFAULT 0 CHECK (stock >= 0),
            unit TEXT NOT NULL
        );

        -- ===== 采购单（供应商 → 原料入库）=====
        CREATE TABLE IF NOT EXISTS sells (
            bill_id INTEGER PRIMARY KEY AUTOINCREMENT,
            s_id INTEGER NOT NULL REFERENCES supplier(s_id),
            created_at TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS sells_item (
            line_id INTEGER PRIMARY KEY AUTOINCREMENT,
            bill_id INTEGER NOT NULL REFERENCES sells(bill_id),
            material_id INTEGER NOT NULL REFERENCES material(material_id),
            quantity REAL NOT NULL CHECK (quantity > 0),
            cost REAL NOT NULL CHECK (cost >= 0)
        );

        -- ===== 销售单（成品出库 → 买方）=====
        CREATE TABLE IF NOT EXISTS buys (
            bill_id INTEGER PRIMARY KEY AUTOINCREMENT,
            b_id INTEGER NOT NULL REFERENCES buyer(b_id),
            created_at TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS buys_item (
            line_id INTEGER PRIMARY KEY AUTOINCREMENT,
            bill_id INTEGER NOT NULL REFERENCES buys(bill_id),
            product_id INTEGER NOT NULL REFERENCES product(product_id),
            quantity REAL NOT NULL CHECK (quantity > 0),
            cost REAL NOT NULL CHECK (cost >= 0)
        );

        -- ===== 生产（部门: 原料投入 / 成品产出）=====
        CREATE TABLE IF NOT EXISTS production_input (
            line_id INTEGER PRIMARY KEY AUTOINCREMENT,
            d_id INTEGER NOT NULL REFERENCES department(d_id),
            material_id INTEGER NOT NULL REFERENCES material(material_id),
            quantity REAL NOT NULL CHECK (quantity > 0),
            unit TEXT,
            produced_at TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS production_output (
            line_id INTEGER PRIMARY KEY AUTOINCREMENT,
            d_id INTEGER NOT NULL REFERENCES department(d_id),
            product_id INTEGER NOT NULL REFERENCES product(product_id),
            quantity REAL NOT NULL CHECK (quantity > 0),
            unit TEXT,
            produced_at TEXT NOT NULL
        );

        CREATE INDEX IF NOT EXISTS idx_sells_created_at ON sells(created_at);
        CREATE INDEX IF NOT EXISTS idx_buys_created_at ON buys(created_at);
        CREATE INDEX IF NOT EXISTS idx_production_output_at ON production_output(produced_at);
        CREATE INDEX IF NOT EXISTS idx_sells_item_bill ON sells_item(bill_id);
        CREATE INDEX IF NOT EXISTS idx_buys_item_bill ON buys_item(bill_id);
        "#,
    )?;

    conn.execute(
        "INSERT OR IGNORE INTO schema_version (version) VALUES (?1)",
        [CURRENT_SCHEMA_VERSION],
    )?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_init_schema_is_idempotent() {
        let conn = Connection::open_in_memory().unwrap();
        configure_sqlite_connection(&conn).unwrap();

        assert_eq!(read_schema_version(&conn).unwrap(), None);

        init_schema(&conn).unwrap();
        init_schema(&conn).unwrap();

        assert_eq!(
            read_schema_version(&conn).unwrap(),
            Some(CURRENT_SCHEMA_VERSION)
        );
    }

    #[test]
    fn test_negative_stock_rejected_by_schema() {
        let conn = Connection::open_in_memory().unwrap();
        configure_sqlite_connection(&conn).unwrap();
        init_schema(&conn).unwrap();

        let result = conn.execute(
            "INSERT INTO material (material_name, stock, unit) VALUES ('Resin', -1, 'kg')",
            [],
        );
        assert!(result.is_err());
    }
}
