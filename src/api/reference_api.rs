// ==========================================
// 制造台账系统 - 主数据 API
// ==========================================
// 职责: 供应商 / 买方 / 部门 / 员工 / 原料 / 成品 的单表增删改查
// 约束: 每个调用接收 ID 或名称 + 字段集，返回受影响的行或错误
// ==========================================

use std::sync::Arc;

use crate::api::error::{ApiError, ApiResult};
use crate::domain::inventory::{InventoryItem, InventoryItemUpdate, NewInventoryItem};
use crate::domain::party::{
    Buyer, CompanyFields, Department, DepartmentFields, Employee, EmployeeFields, Supplier,
};
use crate::domain::types::ItemKind;
use crate::engine::orchestrator::TransactionOrchestrator;
use crate::repository::connection::ConnectionManager;
use crate::repository::error::RepositoryError;
use crate::repository::inventory_repo::InventoryRepository;
use crate::repository::party_repo::{
    BuyerRepository, DepartmentRepository, EmployeeRepository, SupplierRepository,
};

// ==========================================
// ReferenceApi - 主数据 API
// ==========================================
pub struct ReferenceApi {
    suppliers: SupplierRepository,
    buyers: BuyerRepository,
    departments: DepartmentRepository,
    employees: EmployeeRepository,
    materials: InventoryRepository,
    products: InventoryRepository,
    orchestrator: Arc<TransactionOrchestrator>,
}

impl ReferenceApi {
    pub fn new(
        connections: Arc<ConnectionManager>,
        orchestrator: Arc<TransactionOrchestrator>,
    ) -> Self {
        Self {
            suppliers: SupplierRepository::new(connections.clone()),
            buyers: BuyerRepository::new(connections.clone()),
            departments: DepartmentRepository::new(connections.clone()),
            employees: EmployeeRepository::new(connections.clone()),
            materials: InventoryRepository::new(ItemKind::Material, connections.clone()),
            products: InventoryRepository::new(ItemKind::Product, connections),
            orchestrator,
        }
    }

    fn inventory(&self, kind: ItemKind) -> &InventoryRepository {
        match kind {
            ItemKind::Material => &self.materials,
            ItemKind::Product => &self.products,
        }
    }

    // ==========================================
    // 供应商
    // ==========================================

    pub fn list_suppliers(&self) -> ApiResult<Vec<Supplier>> {
        Ok(self.suppliers.list()?)
    }

    pub fn get_supplier(&self, id: i64) -> ApiResult<Supplier> {
        self.suppliers
            .find_by_id(id)?
            .ok_or_else(|| RepositoryError::not_found("Supplier", id).into())
    }

    pub fn add_supplier(&self, fields: &CompanyFields) -> ApiResult<Supplier> {
        Ok(self.suppliers.insert(fields)?)
    }

    pub fn update_supplier(&self, id: i64, fields: &CompanyFields) -> ApiResult<Supplier> {
        Ok(self.suppliers.update(id, fields)?)
    }

    pub fn delete_supplier(&self, id: i64) -> ApiResult<()> {
        Ok(self.suppliers.delete(id)?)
    }

    // ==========================================
    // 买方
    // ==========================================

    pub fn list_buyers(&self) -> ApiResult<Vec<Buyer>> {
        Ok(self.buyers.list()?)
    }

    pub fn get_buyer(&self, id: i64) -> ApiResult<Buyer> {
        self.buyers
            .find_by_id(id)?
            .ok_or_else(|| RepositoryError::not_found("Buyer", id).into())
    }

    pub fn add_buyer(&self, fields: &CompanyFields) -> ApiResult<Buyer> {
        Ok(self.buyers.insert(fields)?)
    }

    pub fn update_buyer(&self, id: i64, fields: &CompanyFields) -> ApiResult<Buyer> {
        Ok(self.buyers.update(id, fields)?)
    }

    pub fn delete_buyer(&self, id: i64) -> ApiResult<()> {
        Ok(self.buyers.delete(id)?)
    }

    // ==========================================
    // 部门
    // ==========================================

    pub fn list_departments(&self) -> ApiResult<Vec<Department>> {
        Ok(self.departments.list()?)
    }

    /// 新增部门；名称重复返回约束冲突
    pub fn add_department(&self, fields: &DepartmentFields) -> ApiResult<Department> {
        Ok(self.departments.insert(fields)?)
    }

    pub fn update_department(&self, id: i64, fields: &DepartmentFields) -> ApiResult<Department> {
        Ok(self.departments.update(id, fields)?)
    }

    pub fn delete_department(&self, id: i64) -> ApiResult<()> {
        Ok(self.departments.delete(id)?)
    }

    // ==========================================
    // 员工
    // ==========================================

    /// 员工列表（search 按姓名/岗位/邮箱模糊匹配）
    pub fn list_employees(&self, search: Option<&str>) -> ApiResult<Vec<Employee>> {
        Ok(self.employees.list(search)?)
    }

    pub fn get_employee(&self, id: i64) -> ApiResult<Employee> {
        self.employees
            .find_by_id(id)?
            .ok_or_else(|| RepositoryError::not_found("Employee", id).into())
    }

    pub fn add_employee(&self, fields: &EmployeeFields) -> ApiResult<Employee> {
        Ok(self.employees.insert(fields)?)
    }

    pub fn update_employee(&self, id: i64, fields: &EmployeeFields) -> ApiResult<Employee> {
        Ok(self.employees.update(id, fields)?)
    }

    pub fn delete_employee(&self, id: i64) -> ApiResult<()> {
        Ok(self.employees.delete(id)?)
    }

    /// 按岗位调薪，返回被调整人数
    pub fn apply_raise_to_role(&self, role: &str, percentage: f64) -> ApiResult<usize> {
        let _perf = crate::perf::PerfGuard::new("api.apply_raise_to_role");
        Ok(self.orchestrator.apply_raise_to_role(role, percentage)?)
    }

    // ==========================================
    // 原料 / 成品
    // ==========================================

    pub fn list_items(&self, kind: ItemKind) -> ApiResult<Vec<InventoryItem>> {
        Ok(self.inventory(kind).list()?)
    }

    pub fn get_item(&self, kind: ItemKind, name: &str) -> ApiResult<InventoryItem> {
        self.inventory(kind)
            .find_by_name(name)?
            .ok_or_else(|| ApiError::NotFound(format!("{}({})不存在", kind, name)))
    }

    pub fn add_item(&self, kind: ItemKind, item: &NewInventoryItem) -> ApiResult<InventoryItem> {
        Ok(self.inventory(kind).insert(item)?)
    }

    /// 改名 / 改单位（库存只能通过交易变动）
    pub fn update_item(
        &self,
        kind: ItemKind,
        name: &str,
        update: &InventoryItemUpdate,
    ) -> ApiResult<InventoryItem> {
        Ok(self.inventory(kind).update(name, update)?)
    }

    pub fn delete_item(&self, kind: ItemKind, name: &str) -> ApiResult<()> {
        Ok(self.inventory(kind).delete(name)?)
    }
}
