// ==========================================
// 制造台账系统 - 命令分发
// ==========================================
// 请求: {"op": "<命令名>", "args": {...}}（无参数或参数全部可选的命令可省略 args）
// 响应: 统一信封 {"success": bool, "data"?: ..., "error"?: "..."}
// ==========================================

use serde::Deserialize;
use serde_json::Value;

use crate::api::{ApiError, ApiResult, Envelope};
use crate::app::state::AppState;
use crate::domain::inventory::{InventoryItemUpdate, NewInventoryItem};
use crate::domain::party::{CompanyFields, DepartmentFields, EmployeeFields};
use crate::domain::report::HistoryFilter;
use crate::domain::transaction::{BuyLine, ProductionLine, SellLine};
use crate::domain::types::ItemKind;

/// 全部可分发的命令
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "op", content = "args", rename_all = "snake_case")]
pub enum Request {
    // ===== 交易 =====
    Sell {
        supplier_id: i64,
        items: Vec<SellLine>,
    },
    Buy {
        buyer_id: i64,
        items: Vec<BuyLine>,
    },
    Produce {
        department_id: i64,
        inputs: Vec<ProductionLine>,
        outputs: Vec<ProductionLine>,
    },

    // ===== 报表 =====
    DashboardStats,
    RecentActivity {
        #[serde(default)]
        limit: Option<u32>,
    },
    TransactionHistory {
        #[serde(flatten)]
        filter: HistoryFilter,
    },

    // ===== 供应商 / 买方 =====
    ListSuppliers,
    GetSupplier { id: i64 },
    AddSupplier { fields: CompanyFields },
    UpdateSupplier { id: i64, fields: CompanyFields },
    DeleteSupplier { id: i64 },
    ListBuyers,
    GetBuyer { id: i64 },
    AddBuyer { fields: CompanyFields },
    UpdateBuyer { id: i64, fields: CompanyFields },
    DeleteBuyer { id: i64 },

    // ===== 部门 / 员工 =====
    ListDepartments,
    AddDepartment { fields: DepartmentFields },
    UpdateDepartment { id: i64, fields: DepartmentFields },
    DeleteDepartment { id: i64 },
    ListEmployees {
        #[serde(default)]
        search: Option<String>,
    },
    GetEmployee { id: i64 },
    AddEmployee { fields: EmployeeFields },
    UpdateEmployee { id: i64, fields: EmployeeFields },
    DeleteEmployee { id: i64 },
    ApplyRaiseToRole { role: String, percentage: f64 },

    // ===== 原料 / 成品 =====
    ListItems { kind: ItemKind },
    GetItem { kind: ItemKind, name: String },
    AddItem { kind: ItemKind, item: NewInventoryItem },
    UpdateItem {
        kind: ItemKind,
        name: String,
        update: InventoryItemUpdate,
    },
    DeleteItem { kind: ItemKind, name: String },

    // ===== 配置 / 运维 =====
    GetConfig { key: String },
    SetConfig { key: String, value: String },
    TestConnection,
}

impl Request {
    /// 命令名（日志用）
    pub fn op_name(&self) -> &'static str {
        match self {
            Request::Sell { .. } => "sell",
            Request::Buy { .. } => "buy",
            Request::Produce { .. } => "produce",
            Request::DashboardStats => "dashboard_stats",
            Request::RecentActivity { .. } => "recent_activity",
            Request::TransactionHistory { .. } => "transaction_history",
            Request::ListSuppliers => "list_suppliers",
            Request::GetSupplier { .. } => "get_supplier",
            Request::AddSupplier { .. } => "add_supplier",
            Request::UpdateSupplier { .. } => "update_supplier",
            Request::DeleteSupplier { .. } => "delete_supplier",
            Request::ListBuyers => "list_buyers",
            Request::GetBuyer { .. } => "get_buyer",
            Request::AddBuyer { .. } => "add_buyer",
            Request::UpdateBuyer { .. } => "update_buyer",
            Request::DeleteBuyer { .. } => "delete_buyer",
            Request::ListDepartments => "list_departments",
            Request::AddDepartment { .. } => "add_department",
            Request::UpdateDepartment { .. } => "update_department",
            Request::DeleteDepartment { .. } => "delete_department",
            Request::ListEmployees { .. } => "list_employees",
            Request::GetEmployee { .. } => "get_employee",
            Request::AddEmployee { .. } => "add_employee",
            Request::UpdateEmployee { .. } => "update_employee",
            Request::DeleteEmployee { .. } => "delete_employee",
            Request::ApplyRaiseToRole { .. } => "apply_raise_to_role",
            Request::ListItems { .. } => "list_items",
            Request::GetItem { .. } => "get_item",
            Request::AddItem { .. } => "add_item",
            Request::UpdateItem { .. } => "update_item",
            Request::DeleteItem { .. } => "delete_item",
            Request::GetConfig { .. } => "get_config",
            Request::SetConfig { .. } => "set_config",
            Request::TestConnection => "test_connection",
        }
    }
}

/// 执行一条命令并包装为信封
pub fn dispatch(state: &AppState, request: Request) -> Value {
    let op = request.op_name();
    let result = execute(state, request);
    if let Err(err) = &result {
        tracing::warn!(op, code = err.code(), error = %err, "命令执行失败");
    }
    Envelope::from_result(result).to_value()
}

/// 参数全部可选的命令，请求中可省略 args
const OPTIONAL_ARGS_OPS: [&str; 3] = ["recent_activity", "transaction_history", "list_employees"];

/// 解析一行 JSON 请求
///
/// 参数全部可选的命令缺少 args 时按空参数处理
pub fn parse_request(raw: &str) -> serde_json::Result<Request> {
    let mut value: Value = serde_json::from_str(raw)?;
    if let Value::Object(map) = &mut value {
        let optional = map
            .get("op")
            .and_then(Value::as_str)
            .is_some_and(|op| OPTIONAL_ARGS_OPS.contains(&op));
        if optional && !map.contains_key("args") {
            map.insert("args".to_string(), Value::Object(Default::default()));
        }
    }
    serde_json::from_value(value)
}

/// 解析一行 JSON 请求并执行
pub fn dispatch_json(state: &AppState, raw: &str) -> Value {
    match parse_request(raw) {
        Ok(request) => dispatch(state, request),
        Err(e) => {
            tracing::warn!(error = %e, "请求解析失败");
            Envelope::fail(format!("请求格式错误: {}", e)).to_value()
        }
    }
}

fn to_data<T: serde::Serialize>(result: ApiResult<T>) -> ApiResult<Value> {
    let value = result?;
    serde_json::to_value(value).map_err(|e| ApiError::InternalError(format!("结果序列化失败: {}", e)))
}

fn execute(state: &AppState, request: Request) -> ApiResult<Value> {
    let transactions = &state.transaction_api;
    let reports = &state.report_api;
    let reference = &state.reference_api;

    match request {
        Request::Sell { supplier_id, items } => to_data(transactions.sell(supplier_id, &items)),
        Request::Buy { buyer_id, items } => to_data(transactions.buy(buyer_id, &items)),
        Request::Produce {
            department_id,
            inputs,
            outputs,
        } => to_data(transactions.produce(department_id, &inputs, &outputs)),

        Request::DashboardStats => to_data(reports.dashboard_stats()),
        Request::RecentActivity { limit } => to_data(reports.recent_activity(limit)),
        Request::TransactionHistory { filter } => to_data(reports.transaction_history(&filter)),

        Request::ListSuppliers => to_data(reference.list_suppliers()),
        Request::GetSupplier { id } => to_data(reference.get_supplier(id)),
        Request::AddSupplier { fields } => to_data(reference.add_supplier(&fields)),
        Request::UpdateSupplier { id, fields } => to_data(reference.update_supplier(id, &fields)),
        Request::DeleteSupplier { id } => to_data(reference.delete_supplier(id)),
        Request::ListBuyers => to_data(reference.list_buyers()),
        Request::GetBuyer { id } => to_data(reference.get_buyer(id)),
        Request::AddBuyer { fields } => to_data(reference.add_buyer(&fields)),
        Request::UpdateBuyer { id, fields } => to_data(reference.update_buyer(id, &fields)),
        Request::DeleteBuyer { id } => to_data(reference.delete_buyer(id)),

        Request::ListDepartments => to_data(reference.list_departments()),
        Request::AddDepartment { fields } => to_data(reference.add_department(&fields)),
        Request::UpdateDepartment { id, fields } => {
            to_data(reference.update_department(id, &fields))
        }
        Request::DeleteDepartment { id } => to_data(reference.delete_department(id)),
        Request::ListEmployees { search } => to_data(reference.list_employees(search.as_deref())),
        Request::GetEmployee { id } => to_data(reference.get_employee(id)),
        Request::AddEmployee { fields } => to_data(reference.add_employee(&fields)),
        Request::UpdateEmployee { id, fields } => to_data(reference.update_employee(id, &fields)),
        Request::DeleteEmployee { id } => to_data(reference.delete_employee(id)),
        Request::ApplyRaiseToRole { role, percentage } => {
            to_data(reference.apply_raise_to_role(&role, percentage))
        }

        Request::ListItems { kind } => to_data(reference.list_items(kind)),
        Request::GetItem { kind, name } => to_data(reference.get_item(kind, &name)),
        Request::AddItem { kind, item } => to_data(reference.add_item(kind, &item)),
        Request::UpdateItem { kind, name, update } => {
            to_data(reference.update_item(kind, &name, &update))
        }
        Request::DeleteItem { kind, name } => to_data(reference.delete_item(kind, &name)),

        Request::GetConfig { key } => {
            to_data(state.config_manager.get_global_config_value(&key).map_err(ApiError::from))
        }
        Request::SetConfig { key, value } => {
            state.config_manager.set_config_value(&key, &value)?;
            state.reload_report_config()?;
            Ok(Value::Null)
        }
        Request::TestConnection => Ok(Value::Bool(state.connections.test_connection())),
    }
}
