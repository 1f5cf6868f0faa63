// ==========================================
// 制造台账系统 - 交易 API
// ==========================================
// 职责: 采购 / 销售 / 生产三类原子操作的对外入口
// ==========================================

use std::sync::Arc;

use crate::api::error::ApiResult;
use crate::domain::transaction::{BillReceipt, BuyLine, ProductionLine, SellLine};
use crate::engine::orchestrator::TransactionOrchestrator;

// ==========================================
// TransactionApi - 交易 API
// ==========================================
pub struct TransactionApi {
    orchestrator: Arc<TransactionOrchestrator>,
}

impl TransactionApi {
    pub fn new(orchestrator: Arc<TransactionOrchestrator>) -> Self {
        Self { orchestrator }
    }

    /// 供应商供货（原料入库）
    ///
    /// # 返回
    /// - Ok(BillReceipt): 生成的采购单号
    /// - Err(ApiError): 整单已回滚
    pub fn sell(&self, supplier_id: i64, items: &[SellLine]) -> ApiResult<BillReceipt> {
        let _perf = crate::perf::PerfGuard::new("api.sell");
        Ok(self.orchestrator.sell(supplier_id, items)?)
    }

    /// 买方购货（成品出库）
    ///
    /// 库存不足等业务失败的原因原样返回
    pub fn buy(&self, buyer_id: i64, items: &[BuyLine]) -> ApiResult<BillReceipt> {
        let _perf = crate::perf::PerfGuard::new("api.buy");
        Ok(self.orchestrator.buy(buyer_id, items)?)
    }

    /// 部门生产（原料投入 + 成品产出）
    pub fn produce(
        &self,
        department_id: i64,
        inputs: &[ProductionLine],
        outputs: &[ProductionLine],
    ) -> ApiResult<()> {
        let _perf = crate::perf::PerfGuard::new("api.produce");
        Ok(self.orchestrator.produce(department_id, inputs, outputs)?)
    }
}
