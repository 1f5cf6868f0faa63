// ==========================================
// 制造台账系统 - 单据仓储（采购 sells / 销售 buys）
// ==========================================
// 红线: 只在调用方事务内执行，不自行提交
// 红线: 单据头与明细只插入，不修改不删除
// ==========================================

use chrono::NaiveDateTime;
use rusqlite::{params, Connection, OptionalExtension};

use crate::domain::transaction::BuyLine;
use crate::domain::types::ItemKind;
use crate::repository::error::{RepositoryError, RepositoryResult};
use crate::repository::stock_repo::StockRepository;

/// 单据明细（读侧）
#[derive(Debug, Clone, PartialEq)]
pub struct BillLineRecord {
    pub bill_id: i64,
    pub item_id: i64,
    pub item_name: String,
    pub quantity: f64,
    pub cost: f64,
}

// ==========================================
// BillRepository - 单据仓储
// ==========================================
#[derive(Debug, Default, Clone, Copy)]
pub struct BillRepository {
    stock: StockRepository,
}

impl BillRepository {
    pub fn new() -> Self {
        Self {
            stock: StockRepository::new(),
        }
    }

    // ==========================================
    // 采购单（供应商供货）
    // ==========================================

    /// 插入采购单头，返回生成的 bill_id
    pub fn insert_sell_header(
        &self,
        conn: &Connection,
        supplier_id: i64,
        created_at: NaiveDateTime,
    ) -> RepositoryResult<i64> {
        conn.execute(
            "INSERT INTO sells (s_id, created_at) VALUES (?1, ?2)",
            params![supplier_id, created_at],
        )?;
        Ok(conn.last_insert_rowid())
    }

    /// 插入采购明细
    pub fn insert_sell_line(
        &self,
        conn: &Connection,
        bill_id: i64,
        material_id: i64,
        quantity: f64,
        cost: f64,
    ) -> RepositoryResult<()> {
        conn.execute(
            "INSERT INTO sells_item (bill_id, material_id, quantity, cost) VALUES (?1, ?2, ?3, ?4)",
            params![bill_id, material_id, quantity, cost],
        )?;
        Ok(())
    }

    /// 查询采购单明细
    pub fn find_sell_lines(&self, conn: &Connection, bill_id: i64) -> RepositoryResult<Vec<BillLineRecord>> {
        let mut stmt = conn.prepare(
            r#"
            SELECT si.bill_id, si.material_id, m.material_name, si.quantity, si.cost
            FROM sells_item si
            JOIN material m ON m.material_id = si.material_id
            WHERE si.bill_id = ?1
            ORDER BY si.line_id
            "#,
        )?;
        let lines = stmt
            .query_map(params![bill_id], map_line)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(lines)
    }

    // ==========================================
    // 销售单（买方购货）
    // ==========================================

    /// 插入销售单头，返回生成的 bill_id
    pub fn insert_buy_header(
        &self,
        conn: &Connection,
        buyer_id: i64,
        created_at: NaiveDateTime,
    ) -> RepositoryResult<i64> {
        conn.execute(
            "INSERT INTO buys (b_id, created_at) VALUES (?1, ?2)",
            params![buyer_id, created_at],
        )?;
        Ok(conn.last_insert_rowid())
    }

    /// 插入销售明细
    pub fn insert_buy_line(
        &self,
        conn: &Connection,
        bill_id: i64,
        product_id: i64,
        quantity: f64,
        cost: f64,
    ) -> RepositoryResult<()> {
        conn.execute(
            "INSERT INTO buys_item (bill_id, product_id, quantity, cost) VALUES (?1, ?2, ?3, ?4)",
            params![bill_id, product_id, quantity, cost],
        )?;
        Ok(())
    }

    /// 查询销售单明细
    pub fn find_buy_lines(&self, conn: &Connection, bill_id: i64) -> RepositoryResult<Vec<BillLineRecord>> {
        let mut stmt = conn.prepare(
            r#"
            SELECT bi.bill_id, bi.product_id, p.product_name, bi.quantity, bi.cost
            FROM buys_item bi
            JOIN product p ON p.product_id = bi.product_id
            WHERE bi.bill_id = ?1
            ORDER BY bi.line_id
            "#,
        )?;
        let lines = stmt
            .query_map(params![bill_id], map_line)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(lines)
    }

    /// 处理一行销售（单行销售过程）
    ///
    /// 在调用方事务内:
    /// 1. 扣减成品库存（库存不足由增量语句的守卫条件拦截）
    /// 2. bill_id 为 None 时创建销售单头；否则校验单头属于同一买方
    /// 3. 追加一行 buys_item
    ///
    /// 扣减放在建单头之前，首行失败时不产生任何写入
    ///
    /// # 返回
    /// - Ok(bill_id): 后续调用应传回该值，使所有行挂在同一张单据上
    /// - Err(BusinessRuleViolation): 业务规则失败，消息原样透传给调用方
    /// - Err(NotFound): 成品不存在
    pub fn process_sale(
        &self,
        conn: &Connection,
        buyer_id: i64,
        line: &BuyLine,
        bill_id: Option<i64>,
        created_at: NaiveDateTime,
    ) -> RepositoryResult<i64> {
        let product_id =
            self.stock
                .adjust(conn, &line.product_name, ItemKind::Product, -line.quantity)?;

        let bill_id = match bill_id {
            None => self.insert_buy_header(conn, buyer_id, created_at)?,
            Some(id) => {
                let owner: Option<i64> = conn
                    .query_row("SELECT b_id FROM buys WHERE bill_id = ?1", params![id], |row| {
                        row.get(0)
                    })
                    .optional()?;
                match owner {
                    Some(owner) if owner == buyer_id => id,
                    Some(owner) => {
                        return Err(RepositoryError::BusinessRuleViolation(format!(
                            "销售单 {} 属于买方 {}，不能追加买方 {} 的明细",
                            id, owner, buyer_id
                        )))
                    }
                    None => {
                        return Err(RepositoryError::BusinessRuleViolation(format!(
                            "销售单 {} 不存在",
                            id
                        )))
                    }
                }
            }
        };

        self.insert_buy_line(conn, bill_id, product_id, line.quantity, line.cost)?;
        Ok(bill_id)
    }

    // ==========================================
    // 计数（快照对比用）
    // ==========================================

    pub fn count_sell_headers(&self, conn: &Connection) -> RepositoryResult<i64> {
        Ok(conn.query_row("SELECT COUNT(*) FROM sells", [], |row| row.get(0))?)
    }

    pub fn count_buy_headers(&self, conn: &Connection) -> RepositoryResult<i64> {
        Ok(conn.query_row("SELECT COUNT(*) FROM buys", [], |row| row.get(0))?)
    }
}

fn map_line(row: &rusqlite::Row<'_>) -> rusqlite::Result<BillLineRecord> {
    Ok(BillLineRecord {
        bill_id: row.get(0)?,
        item_id: row.get(1)?,
        item_name: row.get(2)?,
        quantity: row.get(3)?,
        cost: row.get(4)?,
    })
}
