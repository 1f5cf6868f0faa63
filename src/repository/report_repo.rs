// ==========================================
// 制造台账系统 - 聚合查询仓储（只读）
// ==========================================
// 每个查询独立获取连接，便于并发执行
// 红线: 只读，不修改任何数据
// ==========================================

use chrono::NaiveDateTime;
use rusqlite::{params, Row};
use std::sync::Arc;

use crate::domain::report::{ActivityEntry, HistoryRow};
use crate::domain::types::ActivityType;
use crate::repository::connection::ConnectionManager;
use crate::repository::error::RepositoryResult;

// ==========================================
// ReportRepository - 聚合查询仓储
// ==========================================
pub struct ReportRepository {
    connections: Arc<ConnectionManager>,
}

impl ReportRepository {
    pub fn new(connections: Arc<ConnectionManager>) -> Self {
        Self { connections }
    }

    fn count(&self, sql: &str) -> RepositoryResult<i64> {
        let conn = self.connections.acquire()?;
        Ok(conn.query_row(sql, [], |row| row.get(0))?)
    }

    // ==========================================
    // 驾驶舱计数
    // ==========================================

    pub fn count_suppliers(&self) -> RepositoryResult<i64> {
        self.count("SELECT COUNT(*) FROM supplier")
    }

    pub fn count_employees(&self) -> RepositoryResult<i64> {
        self.count("SELECT COUNT(*) FROM employee")
    }

    pub fn count_products(&self) -> RepositoryResult<i64> {
        self.count("SELECT COUNT(*) FROM product")
    }

    /// 低库存成品数（stock <= threshold）
    pub fn count_low_stock_products(&self, threshold: f64) -> RepositoryResult<i64> {
        let conn = self.connections.acquire()?;
        Ok(conn.query_row(
            "SELECT COUNT(*) FROM product WHERE stock <= ?1",
            params![threshold],
            |row| row.get(0),
        )?)
    }

    // ==========================================
    // 最近动态（每种类型各取 limit 条，按时间倒序，一条明细一行）
    // ==========================================

    pub fn recent_activity(
        &self,
        activity_type: ActivityType,
        limit: u32,
    ) -> RepositoryResult<Vec<ActivityEntry>> {
        let sql = match activity_type {
            ActivityType::Purchase => {
                r#"
                SELECT s.created_at, su.company_name, m.material_name
                FROM sells s
                JOIN supplier su ON su.s_id = s.s_id
                JOIN sells_item si ON si.bill_id = s.bill_id
                JOIN material m ON m.material_id = si.material_id
                ORDER BY s.created_at DESC, si.line_id DESC
                LIMIT ?1
                "#
            }
            ActivityType::Sale => {
                r#"
                SELECT b.created_at, bu.company_name, p.product_name
                FROM buys b
                JOIN buyer bu ON bu.b_id = b.b_id
                JOIN buys_item bi ON bi.bill_id = b.bill_id
                JOIN product p ON p.product_id = bi.product_id
                ORDER BY b.created_at DESC, bi.line_id DESC
                LIMIT ?1
                "#
            }
            ActivityType::Production => {
                r#"
                SELECT o.produced_at, d.department_name, p.product_name
                FROM production_output o
                JOIN department d ON d.d_id = o.d_id
                JOIN product p ON p.product_id = o.product_id
                ORDER BY o.produced_at DESC, o.line_id DESC
                LIMIT ?1
                "#
            }
        };

        let conn = self.connections.acquire()?;
        let mut stmt = conn.prepare(sql)?;
        let rows = stmt
            .query_map(params![limit], |row| {
                Ok(ActivityEntry {
                    activity_type,
                    date: row.get::<_, NaiveDateTime>(0)?,
                    party: row.get(1)?,
                    item: row.get(2)?,
                })
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
    }

    // ==========================================
    // 交易历史（按时间倒序）
    // ==========================================
    // 采购/销售: 一张单据一行，total_value = Σ quantity × cost
    // 生产: 按 (部门, produced_at) 归并，id 为部门ID，total_value 为空

    pub fn transaction_history(&self, activity_type: ActivityType) -> RepositoryResult<Vec<HistoryRow>> {
        let sql = match activity_type {
            ActivityType::Purchase => {
                r#"
                SELECT s.bill_id, s.created_at, su.company_name, SUM(si.quantity * si.cost)
                FROM sells s
                JOIN supplier su ON su.s_id = s.s_id
                JOIN sells_item si ON si.bill_id = s.bill_id
                GROUP BY s.bill_id, s.created_at, su.company_name
                ORDER BY s.created_at DESC, s.bill_id DESC
                "#
            }
            ActivityType::Sale => {
                r#"
                SELECT b.bill_id, b.created_at, bu.company_name, SUM(bi.quantity * bi.cost)
                FROM buys b
                JOIN buyer bu ON bu.b_id = b.b_id
                JOIN buys_item bi ON bi.bill_id = b.bill_id
                GROUP BY b.bill_id, b.created_at, bu.company_name
                ORDER BY b.created_at DESC, b.bill_id DESC
                "#
            }
            ActivityType::Production => {
                r#"
                SELECT o.d_id, o.produced_at, d.department_name, NULL
                FROM production_output o
                JOIN department d ON d.d_id = o.d_id
                GROUP BY o.d_id, o.produced_at, d.department_name
                ORDER BY o.produced_at DESC, o.d_id DESC
                "#
            }
        };

        let conn = self.connections.acquire()?;
        let mut stmt = conn.prepare(sql)?;
        let rows = stmt
            .query_map([], |row| map_history(row, activity_type))?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
    }
}

fn map_history(row: &Row<'_>, activity_type: ActivityType) -> rusqlite::Result<HistoryRow> {
    Ok(HistoryRow {
        activity_type,
        id: row.get(0)?,
        date: row.get::<_, NaiveDateTime>(1)?,
        party: row.get(2)?,
        total_value: row.get::<_, Option<f64>>(3)?,
    })
}
