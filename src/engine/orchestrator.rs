// ==========================================
// 制造台账系统 - 交易编排器
// ==========================================
// 用途: 把连接管理 + 库存仓储 + 单据仓储组合成原子业务操作
// Sell:       单据头 → 原料入库 + 明细
// Buy:        逐行调用销售过程，串联同一 bill_id
// Production: 原料投入(扣减) → 成品产出(增加)
// 红线: 库存只在这里按增量变动，任何失败整单回滚
// ==========================================

use chrono::NaiveDateTime;
use rusqlite::{Transaction, TransactionBehavior};
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::domain::transaction::{BillReceipt, BuyLine, ProductionLine, SellLine};
use crate::domain::types::{ItemKind, TxState};
use crate::repository::bill_repo::BillRepository;
use crate::repository::connection::ConnectionManager;
use crate::repository::error::{RepositoryError, RepositoryResult};
use crate::repository::party_repo::{ensure_party_exists, EmployeeRepository, PartyKind};
use crate::repository::production_repo::ProductionRepository;
use crate::repository::stock_repo::StockRepository;

// ==========================================
// TxProgress - 单次操作的状态跟踪
// ==========================================
struct TxProgress {
    op: &'static str,
    state: TxState,
}

impl TxProgress {
    fn start(op: &'static str) -> Self {
        debug!(op, state = %TxState::Started, "事务开始");
        Self {
            op,
            state: TxState::Started,
        }
    }

    fn advance(&mut self, next: TxState) {
        debug!(op = self.op, from = %self.state, to = %next, "事务状态变更");
        self.state = next;
    }
}

impl Drop for TxProgress {
    fn drop(&mut self) {
        // 未到终态即离开（如 body panic），连接归还时回滚
        if !self.state.is_terminal() {
            warn!(op = self.op, state = %self.state, "事务未到达终态，按回滚处理");
        }
    }
}

// ==========================================
// TransactionOrchestrator - 交易编排器
// ==========================================
pub struct TransactionOrchestrator {
    connections: Arc<ConnectionManager>,
    stock: StockRepository,
    bills: BillRepository,
    production: ProductionRepository,
    employees: EmployeeRepository,
}

impl TransactionOrchestrator {
    pub fn new(connections: Arc<ConnectionManager>) -> Self {
        Self {
            stock: StockRepository::new(),
            bills: BillRepository::new(),
            production: ProductionRepository::new(),
            employees: EmployeeRepository::new(connections.clone()),
            connections,
        }
    }

    /// 在一个 IMMEDIATE 事务中执行 body
    ///
    /// body 成功则提交；body 或提交失败都回滚并原样返回错误
    fn run_atomic<T, F>(&self, op: &'static str, body: F) -> RepositoryResult<T>
    where
        F: FnOnce(&Transaction<'_>, &mut TxProgress) -> RepositoryResult<T>,
    {
        let mut conn = self.connections.acquire()?;
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
        let mut progress = TxProgress::start(op);

        let outcome = body(&tx, &mut progress);
        match outcome {
            Ok(value) => match tx.commit() {
                Ok(()) => {
                    progress.advance(TxState::Committed);
                    Ok(value)
                }
                Err(e) => {
                    // 提交失败时 Transaction 在 drop 中回滚
                    progress.advance(TxState::RolledBack);
                    warn!(op, error = %e, "事务提交失败，已回滚");
                    Err(e.into())
                }
            },
            Err(err) => {
                if let Err(rollback_err) = tx.rollback() {
                    warn!(op, error = %rollback_err, "显式回滚失败，连接归还时再次回滚");
                }
                progress.advance(TxState::RolledBack);
                warn!(op, reason = %err, "事务已回滚");
                Err(err)
            }
        }
    }

    fn now() -> NaiveDateTime {
        chrono::Local::now().naive_local()
    }

    // ==========================================
    // Sell - 供应商供货（原料入库）
    // ==========================================

    /// 记录一张采购单
    ///
    /// # 参数
    /// - supplier_id: 供应商ID
    /// - items: 明细（非空）
    ///
    /// # 返回
    /// - Ok(BillReceipt): 生成的单据号
    /// - Err(ValidationError): 入参不合法，未发出任何语句
    /// - Err(NotFound): 供应商或原料不存在
    pub fn sell(&self, supplier_id: i64, items: &[SellLine]) -> RepositoryResult<BillReceipt> {
        validate_party_id("供应商", supplier_id)?;
        validate_non_empty("采购明细", items.len())?;
        for item in items {
            validate_line(&item.material_name, item.quantity, Some(item.cost))?;
        }

        let created_at = Self::now();
        let receipt = self.run_atomic("sell", |tx, progress| {
            ensure_party_exists(tx, PartyKind::Supplier, supplier_id)?;
            let bill_id = self.bills.insert_sell_header(tx, supplier_id, created_at)?;

            for item in items {
                let material_id =
                    self.stock
                        .adjust(tx, &item.material_name, ItemKind::Material, item.quantity)?;
                self.bills
                    .insert_sell_line(tx, bill_id, material_id, item.quantity, item.cost)?;
            }
            progress.advance(TxState::ItemsApplied);

            Ok(BillReceipt { bill_id })
        })?;

        info!(
            bill_id = receipt.bill_id,
            supplier_id,
            items = items.len(),
            "采购单已提交"
        );
        Ok(receipt)
    }

    // ==========================================
    // Buy - 买方购货（成品出库）
    // ==========================================

    /// 记录一张销售单
    ///
    /// 每行交给销售过程处理，首行生成的 bill_id 传给后续各行；
    /// 销售过程给出的业务失败原因原样返回
    pub fn buy(&self, buyer_id: i64, items: &[BuyLine]) -> RepositoryResult<BillReceipt> {
        validate_party_id("买方", buyer_id)?;
        validate_non_empty("销售明细", items.len())?;
        for item in items {
            validate_line(&item.product_name, item.quantity, Some(item.cost))?;
        }

        let created_at = Self::now();
        let receipt = self.run_atomic("buy", |tx, progress| {
            ensure_party_exists(tx, PartyKind::Buyer, buyer_id)?;

            let mut bill_id = None;
            for item in items {
                bill_id = Some(self.bills.process_sale(tx, buyer_id, item, bill_id, created_at)?);
            }
            progress.advance(TxState::ItemsApplied);

            bill_id
                .map(|bill_id| BillReceipt { bill_id })
                .ok_or_else(|| RepositoryError::InternalError("销售单未生成单据号".to_string()))
        })?;

        info!(
            bill_id = receipt.bill_id,
            buyer_id,
            items = items.len(),
            "销售单已提交"
        );
        Ok(receipt)
    }

    // ==========================================
    // Production - 部门生产
    // ==========================================

    /// 记录一次生产：投入与产出共享同一 produced_at
    ///
    /// # 返回
    /// - Ok(()): 生产不生成单据号，以 (部门, 时间) 标识
    /// - Err(ValidationError): inputs 或 outputs 为空
    /// - Err(BusinessRuleViolation): 原料库存不足
    pub fn produce(
        &self,
        department_id: i64,
        inputs: &[ProductionLine],
        outputs: &[ProductionLine],
    ) -> RepositoryResult<()> {
        validate_party_id("部门", department_id)?;
        validate_non_empty("生产投入", inputs.len())?;
        validate_non_empty("生产产出", outputs.len())?;
        for line in inputs.iter().chain(outputs) {
            validate_line(&line.name, line.quantity, None)?;
        }

        let produced_at = Self::now();
        self.run_atomic("produce", |tx, progress| {
            ensure_party_exists(tx, PartyKind::Department, department_id)?;

            for input in inputs {
                let material_id =
                    self.stock
                        .adjust(tx, &input.name, ItemKind::Material, -input.quantity)?;
                self.production.insert_input(
                    tx,
                    department_id,
                    material_id,
                    input.quantity,
                    input.unit.as_deref(),
                    produced_at,
                )?;
            }
            progress.advance(TxState::ItemsApplied);

            for output in outputs {
                let product_id =
                    self.stock
                        .adjust(tx, &output.name, ItemKind::Product, output.quantity)?;
                self.production.insert_output(
                    tx,
                    department_id,
                    product_id,
                    output.quantity,
                    output.unit.as_deref(),
                    produced_at,
                )?;
            }

            Ok(())
        })?;

        info!(
            department_id,
            inputs = inputs.len(),
            outputs = outputs.len(),
            produced_at = %produced_at,
            "生产记录已提交"
        );
        Ok(())
    }

    // ==========================================
    // 按岗位调薪
    // ==========================================

    /// 对某岗位全部员工按百分比调薪（单事务）
    ///
    /// # 参数
    /// - role: 岗位
    /// - percentage: 调整百分比，须大于 -100
    ///
    /// # 返回
    /// 被调整的员工数
    pub fn apply_raise_to_role(&self, role: &str, percentage: f64) -> RepositoryResult<usize> {
        let role = role.trim();
        if role.is_empty() {
            return Err(RepositoryError::ValidationError("岗位不能为空".to_string()));
        }
        if !percentage.is_finite() || percentage <= -100.0 {
            return Err(RepositoryError::ValidationError(format!(
                "调薪比例无效: {}",
                percentage
            )));
        }

        let affected = self.run_atomic("apply_raise", |tx, progress| {
            let rows = self.employees.apply_raise(tx, role, percentage)?;
            progress.advance(TxState::ItemsApplied);
            Ok(rows)
        })?;

        info!(role, percentage, affected, "岗位调薪完成");
        Ok(affected)
    }
}

// ==========================================
// 入参校验（在发出任何语句之前）
// ==========================================

fn validate_party_id(label: &str, id: i64) -> RepositoryResult<()> {
    if id <= 0 {
        return Err(RepositoryError::ValidationError(format!(
            "{}ID无效: {}",
            label, id
        )));
    }
    Ok(())
}

fn validate_non_empty(label: &str, len: usize) -> RepositoryResult<()> {
    if len == 0 {
        return Err(RepositoryError::ValidationError(format!("{}不能为空", label)));
    }
    Ok(())
}

fn validate_line(name: &str, quantity: f64, cost: Option<f64>) -> RepositoryResult<()> {
    if name.trim().is_empty() {
        return Err(RepositoryError::ValidationError("明细名称不能为空".to_string()));
    }
    if !quantity.is_finite() || quantity <= 0.0 {
        return Err(RepositoryError::ValidationError(format!(
            "{} 的数量必须大于0: {}",
            name, quantity
        )));
    }
    if let Some(cost) = cost {
        if !cost.is_finite() || cost < 0.0 {
            return Err(RepositoryError::ValidationError(format!(
                "{} 的单价不能为负: {}",
                name, cost
            )));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::PoolConfig;
    use crate::repository::connection::ConnectionSource;
    use rusqlite::Connection;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// 记录被调用次数、始终失败的连接来源
    struct CountingSource {
        calls: AtomicUsize,
    }

    impl ConnectionSource for CountingSource {
        fn connect(&self) -> RepositoryResult<Connection> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Err(RepositoryError::DatabaseConnectionError("offline".to_string()))
        }
    }

    fn offline() -> (Arc<CountingSource>, TransactionOrchestrator) {
        let source = Arc::new(CountingSource {
            calls: AtomicUsize::new(0),
        });
        let config = PoolConfig {
            pool_size: 1,
            max_attempts: 1,
            backoff_ms: 0,
        };
        let manager = Arc::new(ConnectionManager::new(source.clone(), config));
        (source, TransactionOrchestrator::new(manager))
    }

    #[test]
    fn test_empty_lists_fail_before_connecting() {
        let (source, orchestrator) = offline();

        let err = orchestrator.sell(1, &[]).unwrap_err();
        assert!(matches!(err, RepositoryError::ValidationError(_)));

        let err = orchestrator.buy(1, &[]).unwrap_err();
        assert!(matches!(err, RepositoryError::ValidationError(_)));

        let inputs = vec![ProductionLine::new("Resin", 1.0, "kg")];
        let err = orchestrator.produce(1, &inputs, &[]).unwrap_err();
        assert!(matches!(err, RepositoryError::ValidationError(_)));
        let err = orchestrator.produce(1, &[], &inputs).unwrap_err();
        assert!(matches!(err, RepositoryError::ValidationError(_)));

        assert_eq!(source.calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_line_validation() {
        let (source, orchestrator) = offline();

        let err = orchestrator
            .sell(1, &[SellLine::new("Resin", 0.0, 1.0)])
            .unwrap_err();
        assert!(matches!(err, RepositoryError::ValidationError(_)));

        let err = orchestrator
            .sell(1, &[SellLine::new("Resin", 1.0, -1.0)])
            .unwrap_err();
        assert!(matches!(err, RepositoryError::ValidationError(_)));

        let err = orchestrator
            .buy(1, &[BuyLine::new("  ", 1.0, 1.0)])
            .unwrap_err();
        assert!(matches!(err, RepositoryError::ValidationError(_)));

        let err = orchestrator
            .buy(0, &[BuyLine::new("Chair", 1.0, 1.0)])
            .unwrap_err();
        assert!(matches!(err, RepositoryError::ValidationError(_)));

        let err = orchestrator.apply_raise_to_role("Welder", -100.0).unwrap_err();
        assert!(matches!(err, RepositoryError::ValidationError(_)));

        assert_eq!(source.calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_progress_reaches_terminal_state() {
        let mut progress = TxProgress::start("test");
        assert!(!progress.state.is_terminal());
        progress.advance(TxState::ItemsApplied);
        assert!(!progress.state.is_terminal());
        progress.advance(TxState::Committed);
        assert!(progress.state.is_terminal());
    }

    #[test]
    fn test_connection_failure_is_terminal() {
        let (source, orchestrator) = offline();

        let err = orchestrator
            .sell(1, &[SellLine::new("Resin", 1.0, 1.0)])
            .unwrap_err();
        assert!(matches!(err, RepositoryError::DatabaseConnectionError(_)));
        assert_eq!(source.calls.load(Ordering::SeqCst), 1);
    }
}
