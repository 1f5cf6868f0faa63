// ==========================================
// 测试辅助函数
// ==========================================
// 职责: 临时数据库、应用状态构建、基础数据与库存快照
// ==========================================

#![allow(dead_code)]

use factory_ledger::app::AppState;
use factory_ledger::config::{AppConfig, PoolConfig};
use factory_ledger::db::{init_schema, open_sqlite_connection};
use rusqlite::Connection;
use std::collections::BTreeMap;
use std::error::Error;
use tempfile::NamedTempFile;

/// 创建临时测试数据库并初始化 schema
///
/// # 返回
/// - NamedTempFile: 临时数据库文件（需要保持存活）
/// - String: 数据库文件路径
pub fn create_test_db() -> Result<(NamedTempFile, String), Box<dyn Error>> {
    let temp_file = NamedTempFile::new()?;
    let db_path = temp_file.path().to_str().unwrap().to_string();

    let conn = open_sqlite_connection(&db_path)?;
    init_schema(&conn)?;

    Ok((temp_file, db_path))
}

/// 测试用配置：小退避，避免重试拖慢测试
pub fn test_config(db_path: &str) -> AppConfig {
    let mut config = AppConfig::with_db_path(db_path);
    config.pool = PoolConfig {
        pool_size: 8,
        max_attempts: 3,
        backoff_ms: 10,
    };
    config
}

/// 打开一条独立连接（用于造数与断言）
pub fn open(db_path: &str) -> Connection {
    open_sqlite_connection(db_path).unwrap()
}

/// 基础数据
///
/// - 供应商 Acme(s_id=1)、Initech(s_id=2)
/// - 买方 Globex(b_id=1)
/// - 部门 Assembly(d_id=1)
/// - 原料 Resin 50kg、Steel 20kg
/// - 成品 Chair 5pcs、Table 2pcs
pub fn seed_reference_data(db_path: &str) {
    let conn = open(db_path);
    conn.execute_batch(
        r#"
        INSERT INTO supplier (company_name, contact_name) VALUES ('Acme', 'Wile');
        INSERT INTO supplier (company_name) VALUES ('Initech');
        INSERT INTO buyer (company_name) VALUES ('Globex');
        INSERT INTO department (department_name) VALUES ('Assembly');
        INSERT INTO material (material_name, stock, unit) VALUES ('Resin', 50, 'kg');
        INSERT INTO material (material_name, stock, unit) VALUES ('Steel', 20, 'kg');
        INSERT INTO product (product_name, stock, unit) VALUES ('Chair', 5, 'pcs');
        INSERT INTO product (product_name, stock, unit) VALUES ('Table', 2, 'pcs');
        "#,
    )
    .unwrap();
}

/// 创建带基础数据的应用状态
pub fn setup_app() -> (NamedTempFile, String, AppState) {
    factory_ledger::logging::init_test();
    let (temp_file, db_path) = create_test_db().unwrap();
    seed_reference_data(&db_path);
    let state = AppState::new(test_config(&db_path)).unwrap();
    (temp_file, db_path, state)
}

/// 数据库快照：库存 + 各单据表行数
#[derive(Debug, Clone, PartialEq)]
pub struct Snapshot {
    pub materials: BTreeMap<String, f64>,
    pub products: BTreeMap<String, f64>,
    pub row_counts: BTreeMap<&'static str, i64>,
}

const LEDGER_TABLES: [&str; 6] = [
    "sells",
    "sells_item",
    "buys",
    "buys_item",
    "production_input",
    "production_output",
];

pub fn snapshot(db_path: &str) -> Snapshot {
    let conn = open(db_path);

    let read_stock = |sql: &str| -> BTreeMap<String, f64> {
        let mut stmt = conn.prepare(sql).unwrap();
        let rows = stmt
            .query_map([], |row| Ok((row.get::<_, String>(0)?, row.get::<_, f64>(1)?)))
            .unwrap();
        let stocks: BTreeMap<String, f64> = rows.map(|r| r.unwrap()).collect();
        stocks
    };

    let materials = read_stock("SELECT material_name, stock FROM material");
    let products = read_stock("SELECT product_name, stock FROM product");

    let mut row_counts = BTreeMap::new();
    for table in LEDGER_TABLES {
        let count: i64 = conn
            .query_row(&format!("SELECT COUNT(*) FROM {}", table), [], |row| row.get(0))
            .unwrap();
        row_counts.insert(table, count);
    }

    Snapshot {
        materials,
        products,
        row_counts,
    }
}

pub fn material_stock(db_path: &str, name: &str) -> f64 {
    snapshot(db_path).materials[name]
}

pub fn product_stock(db_path: &str, name: &str) -> f64 {
    snapshot(db_path).products[name]
}
