// ==========================================
// 制造台账系统 - 库存品主数据仓储
// ==========================================
// 原料 / 成品 的单表增删改查（按名称寻址）
// 红线: 修改只允许改名/改单位，stock 只由交易中的增量语句变动
// ==========================================

use rusqlite::{params, OptionalExtension, Row};
use std::sync::Arc;

use crate::domain::inventory::{InventoryItem, InventoryItemUpdate, NewInventoryItem};
use crate::domain::types::ItemKind;
use crate::repository::connection::ConnectionManager;
use crate::repository::error::{RepositoryError, RepositoryResult};

// ==========================================
// InventoryRepository - 库存品仓储
// ==========================================
pub struct InventoryRepository {
    kind: ItemKind,
    connections: Arc<ConnectionManager>,
}

impl InventoryRepository {
    pub fn new(kind: ItemKind, connections: Arc<ConnectionManager>) -> Self {
        Self { kind, connections }
    }

    pub fn kind(&self) -> ItemKind {
        self.kind
    }

    fn columns(&self) -> String {
        format!(
            "{}, {}, stock, unit",
            self.kind.id_column(),
            self.kind.name_column()
        )
    }

    fn map_row(&self, row: &Row<'_>) -> rusqlite::Result<InventoryItem> {
        Ok(InventoryItem {
            id: row.get(0)?,
            kind: self.kind,
            name: row.get(1)?,
            stock: row.get(2)?,
            unit: row.get(3)?,
        })
    }

    /// 按名称排序列出全部
    pub fn list(&self) -> RepositoryResult<Vec<InventoryItem>> {
        let conn = self.connections.acquire()?;
        let sql = format!(
            "SELECT {} FROM {} ORDER BY {}",
            self.columns(),
            self.kind.table(),
            self.kind.name_column()
        );
        let mut stmt = conn.prepare(&sql)?;
        let items = stmt
            .query_map([], |row| self.map_row(row))?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(items)
    }

    pub fn find_by_name(&self, name: &str) -> RepositoryResult<Option<InventoryItem>> {
        let conn = self.connections.acquire()?;
        let sql = format!(
            "SELECT {} FROM {} WHERE {} = ?1",
            self.columns(),
            self.kind.table(),
            self.kind.name_column()
        );
        Ok(conn
            .query_row(&sql, params![name], |row| self.map_row(row))
            .optional()?)
    }

    /// 新增库存品（初始库存只在此处给定）
    pub fn insert(&self, item: &NewInventoryItem) -> RepositoryResult<InventoryItem> {
        let name = item.name.trim();
        if name.is_empty() {
            return Err(RepositoryError::ValidationError("名称不能为空".to_string()));
        }
        if item.unit.trim().is_empty() {
            return Err(RepositoryError::ValidationError("单位不能为空".to_string()));
        }
        if !item.stock.is_finite() || item.stock < 0.0 {
            return Err(RepositoryError::ValidationError(format!(
                "初始库存无效: {}",
                item.stock
            )));
        }

        let conn = self.connections.acquire()?;
        let sql = format!(
            "INSERT INTO {} ({}, stock, unit) VALUES (?1, ?2, ?3) RETURNING {}",
            self.kind.table(),
            self.kind.name_column(),
            self.columns()
        );
        let created = conn.query_row(&sql, params![name, item.stock, item.unit.trim()], |row| {
            self.map_row(row)
        })?;
        tracing::info!(kind = %self.kind, name = %created.name, "新增库存品");
        Ok(created)
    }

    /// 改名 / 改单位
    ///
    /// 明细行引用代理主键，改名不影响历史单据
    pub fn update(&self, name: &str, update: &InventoryItemUpdate) -> RepositoryResult<InventoryItem> {
        if update.is_empty() {
            return Err(RepositoryError::ValidationError("没有需要修改的字段".to_string()));
        }
        let new_name = update.new_name.as_deref().map(str::trim);
        if matches!(new_name, Some("")) {
            return Err(RepositoryError::ValidationError("名称不能为空".to_string()));
        }
        let unit = update.unit.as_deref().map(str::trim);
        if matches!(unit, Some("")) {
            return Err(RepositoryError::ValidationError("单位不能为空".to_string()));
        }

        let conn = self.connections.acquire()?;
        let sql = format!(
            "UPDATE {table} SET {name_col} = COALESCE(?1, {name_col}), unit = COALESCE(?2, unit)
             WHERE {name_col} = ?3 RETURNING {cols}",
            table = self.kind.table(),
            name_col = self.kind.name_column(),
            cols = self.columns()
        );
        conn.query_row(&sql, params![new_name, unit, name], |row| self.map_row(row))
            .optional()?
            .ok_or_else(|| RepositoryError::not_found(&self.kind.to_string(), name))
    }

    pub fn delete(&self, name: &str) -> RepositoryResult<()> {
        let conn = self.connections.acquire()?;
        let sql = format!(
            "DELETE FROM {} WHERE {} = ?1",
            self.kind.table(),
            self.kind.name_column()
        );
        let affected = conn.execute(&sql, params![name])?;
        if affected == 0 {
            return Err(RepositoryError::not_found(&self.kind.to_string(), name));
        }
        tracing::info!(kind = %self.kind, name, "删除库存品");
        Ok(())
    }
}
