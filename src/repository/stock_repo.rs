// ==========================================
// 制造台账系统 - 库存增量仓储
// ==========================================
// 红线: 库存只做相对变动 stock = stock + delta，绝不读出后整体写回
// 红线: 不开启/不结束事务，只在调用方的事务内执行
// 并发: 同一行的并发增量由存储引擎的行(库)锁串行化，结果与顺序无关
// ==========================================

use rusqlite::{params, Connection, OptionalExtension};

use crate::domain::types::ItemKind;
use crate::repository::error::{RepositoryError, RepositoryResult};

// ==========================================
// StockRepository - 库存增量仓储
// ==========================================
#[derive(Debug, Default, Clone, Copy)]
pub struct StockRepository;

impl StockRepository {
    pub fn new() -> Self {
        Self
    }

    /// 按自然键解析代理主键
    ///
    /// # 返回
    /// - Ok(id)
    /// - Err(NotFound): 名称不存在
    pub fn resolve_id(&self, conn: &Connection, kind: ItemKind, name: &str) -> RepositoryResult<i64> {
        let sql = format!(
            "SELECT {} FROM {} WHERE {} = ?1",
            kind.id_column(),
            kind.table(),
            kind.name_column()
        );
        conn.query_row(&sql, params![name], |row| row.get::<_, i64>(0))
            .optional()?
            .ok_or_else(|| RepositoryError::not_found(&kind.to_string(), name))
    }

    /// 查询当前库存
    pub fn current_stock(&self, conn: &Connection, kind: ItemKind, name: &str) -> RepositoryResult<f64> {
        let sql = format!(
            "SELECT stock FROM {} WHERE {} = ?1",
            kind.table(),
            kind.name_column()
        );
        conn.query_row(&sql, params![name], |row| row.get::<_, f64>(0))
            .optional()?
            .ok_or_else(|| RepositoryError::not_found(&kind.to_string(), name))
    }

    /// 按名称做库存增量
    ///
    /// # 参数
    /// - item_name: 库存品名称
    /// - kind: 原料 / 成品
    /// - delta: 变动量（可为负）
    ///
    /// # 返回
    /// - Ok(id): 被调整库存品的代理主键
    /// - Err(NotFound): 名称不存在
    /// - Err(BusinessRuleViolation): 调整后库存为负
    pub fn adjust(
        &self,
        conn: &Connection,
        item_name: &str,
        kind: ItemKind,
        delta: f64,
    ) -> RepositoryResult<i64> {
        let id = self.resolve_id(conn, kind, item_name)?;
        self.adjust_by_id(conn, kind, id, item_name, delta)?;
        Ok(id)
    }

    /// 按代理主键做库存增量（单条语句，负库存由 WHERE 条件拦截）
    pub fn adjust_by_id(
        &self,
        conn: &Connection,
        kind: ItemKind,
        id: i64,
        item_name: &str,
        delta: f64,
    ) -> RepositoryResult<()> {
        if !delta.is_finite() {
            return Err(RepositoryError::ValidationError(format!(
                "库存变动量无效: {}",
                delta
            )));
        }

        let sql = format!(
            "UPDATE {table} SET stock = stock + ?1 WHERE {id_col} = ?2 AND stock + ?1 >= 0",
            table = kind.table(),
            id_col = kind.id_column()
        );
        let affected = conn.execute(&sql, params![delta, id])?;
        if affected == 1 {
            tracing::debug!(kind = %kind, item = item_name, delta, "库存已调整");
            return Ok(());
        }

        // 未命中: 区分“不存在”与“库存不足”，NotFound 由 current_stock 给出
        let stock = self.current_stock(conn, kind, item_name)?;
        Err(RepositoryError::BusinessRuleViolation(format!(
            "库存不足: {} {} 当前库存 {}，需求 {}",
            kind, item_name, stock, -delta
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn setup() -> Connection {
        let conn = Connection::open_in_memory().unwrap();
        crate::db::configure_sqlite_connection(&conn).unwrap();
        crate::db::init_schema(&conn).unwrap();
        conn.execute(
            "INSERT INTO material (material_name, stock, unit) VALUES ('Resin', 20, 'kg')",
            [],
        )
        .unwrap();
        conn
    }

    #[test]
    fn test_adjust_is_relative() {
        let conn = setup();
        let repo = StockRepository::new();

        repo.adjust(&conn, "Resin", ItemKind::Material, 5.0).unwrap();
        repo.adjust(&conn, "Resin", ItemKind::Material, -8.0).unwrap();

        let stock = repo.current_stock(&conn, ItemKind::Material, "Resin").unwrap();
        assert_eq!(stock, 17.0);
    }

    #[test]
    fn test_adjust_unknown_item() {
        let conn = setup();
        let repo = StockRepository::new();

        let err = repo
            .adjust(&conn, "Unknown", ItemKind::Material, 1.0)
            .unwrap_err();
        assert!(matches!(err, RepositoryError::NotFound { .. }));
    }

    #[test]
    fn test_negative_result_rejected() {
        let conn = setup();
        let repo = StockRepository::new();

        let err = repo
            .adjust(&conn, "Resin", ItemKind::Material, -21.0)
            .unwrap_err();
        match err {
            RepositoryError::BusinessRuleViolation(msg) => assert!(msg.contains("库存不足")),
            other => panic!("unexpected error: {}", other),
        }
        let stock = repo.current_stock(&conn, ItemKind::Material, "Resin").unwrap();
        assert_eq!(stock, 20.0);
    }

    #[test]
    fn test_wrong_kind_is_not_found() {
        let conn = setup();
        let repo = StockRepository::new();

        let err = repo.adjust(&conn, "Resin", ItemKind::Product, 1.0).unwrap_err();
        assert!(matches!(err, RepositoryError::NotFound { .. }));
    }
}
