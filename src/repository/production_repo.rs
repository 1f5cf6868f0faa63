// ==========================================
// 制造台账系统 - 生产记录仓储
// ==========================================
// 一次生产 = 同一部门 + 同一 produced_at 下的投入行与产出行
// 红线: 只在调用方事务内执行
// ==========================================

use chrono::NaiveDateTime;
use rusqlite::{params, Connection};

// ==========================================
// ProductionRepository - 生产记录仓储
// ==========================================
#[derive(Debug, Default, Clone, Copy)]
pub struct ProductionRepository;

impl ProductionRepository {
    pub fn new() -> Self {
        Self
    }

    /// 插入一行原料投入
    pub fn insert_input(
        &self,
        conn: &Connection,
        department_id: i64,
        material_id: i64,
        quantity: f64,
        unit: Option<&str>,
        produced_at: NaiveDateTime,
    ) -> rusqlite::Result<()> {
        conn.execute(
            r#"
            INSERT INTO production_input (d_id, material_id, quantity, unit, produced_at)
            VALUES (?1, ?2, ?3, ?4, ?5)
            "#,
            params![department_id, material_id, quantity, unit, produced_at],
        )?;
        Ok(())
    }

    /// 插入一行成品产出
    pub fn insert_output(
        &self,
        conn: &Connection,
        department_id: i64,
        product_id: i64,
        quantity: f64,
        unit: Option<&str>,
        produced_at: NaiveDateTime,
    ) -> rusqlite::Result<()> {
        conn.execute(
            r#"
            INSERT INTO production_output (d_id, product_id, quantity, unit, produced_at)
            VALUES (?1, ?2, ?3, ?4, ?5)
            "#,
            params![department_id, product_id, quantity, unit, produced_at],
        )?;
        Ok(())
    }

    /// 投入/产出行数（快照对比用）
    pub fn count_rows(&self, conn: &Connection) -> rusqlite::Result<(i64, i64)> {
        let inputs = conn.query_row("SELECT COUNT(*) FROM production_input", [], |row| row.get(0))?;
        let outputs =
            conn.query_row("SELECT COUNT(*) FROM production_output", [], |row| row.get(0))?;
        Ok((inputs, outputs))
    }
}
