// ==========================================
// 制造台账系统 - 往来单位与人员仓储
// ==========================================
// 供应商 / 买方 / 部门 / 员工: 单表增删改查
// 每次调用独立获取连接，调用结束即归还
// 被交易引用的记录删除时由外键约束拒绝
// ==========================================

use rusqlite::{params, Connection, OptionalExtension, Row};
use std::sync::Arc;

use crate::domain::party::{
    Buyer, CompanyFields, Department, DepartmentFields, Employee, EmployeeFields, Supplier,
};
use crate::repository::connection::ConnectionManager;
use crate::repository::error::{RepositoryError, RepositoryResult};

// ==========================================
// PartyKind - 被交易引用的往来方
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PartyKind {
    Supplier,
    Buyer,
    Department,
}

impl PartyKind {
    fn table(&self) -> &'static str {
        match self {
            PartyKind::Supplier => "supplier",
            PartyKind::Buyer => "buyer",
            PartyKind::Department => "department",
        }
    }

    fn id_column(&self) -> &'static str {
        match self {
            PartyKind::Supplier => "s_id",
            PartyKind::Buyer => "b_id",
            PartyKind::Department => "d_id",
        }
    }

    pub fn entity_name(&self) -> &'static str {
        match self {
            PartyKind::Supplier => "Supplier",
            PartyKind::Buyer => "Buyer",
            PartyKind::Department => "Department",
        }
    }
}

/// 校验往来方存在（可在事务内调用）
pub fn ensure_party_exists(conn: &Connection, kind: PartyKind, id: i64) -> RepositoryResult<()> {
    let sql = format!(
        "SELECT 1 FROM {} WHERE {} = ?1",
        kind.table(),
        kind.id_column()
    );
    let found: Option<i64> = conn.query_row(&sql, params![id], |row| row.get(0)).optional()?;
    match found {
        Some(_) => Ok(()),
        None => Err(RepositoryError::not_found(kind.entity_name(), id)),
    }
}

// ==========================================
// 供应商 / 买方（同构的公司类往来方）
// ==========================================

const COMPANY_COLUMNS: &str = "company_name, contact_name, phone_no, email, address";

fn map_company(row: &Row<'_>) -> rusqlite::Result<(i64, CompanyFields)> {
    Ok((
        row.get(0)?,
        CompanyFields {
            company_name: row.get(1)?,
            contact_name: row.get(2)?,
            phone_no: row.get(3)?,
            email: row.get(4)?,
            address: row.get(5)?,
        },
    ))
}

fn validate_company(fields: &CompanyFields) -> RepositoryResult<()> {
    if fields.company_name.trim().is_empty() {
        return Err(RepositoryError::ValidationError(
            "公司名称不能为空".to_string(),
        ));
    }
    Ok(())
}

/// 公司类往来方的通用增删改查
struct CompanyTable {
    kind: PartyKind,
    connections: Arc<ConnectionManager>,
}

impl CompanyTable {
    fn select_sql(&self) -> String {
        format!(
            "SELECT {}, {} FROM {}",
            self.kind.id_column(),
            COMPANY_COLUMNS,
            self.kind.table()
        )
    }

    fn list(&self) -> RepositoryResult<Vec<(i64, CompanyFields)>> {
        let conn = self.connections.acquire()?;
        let sql = format!("{} ORDER BY {}", self.select_sql(), self.kind.id_column());
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt
            .query_map([], map_company)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
    }

    fn find_by_id(&self, id: i64) -> RepositoryResult<Option<(i64, CompanyFields)>> {
        let conn = self.connections.acquire()?;
        let sql = format!("{} WHERE {} = ?1", self.select_sql(), self.kind.id_column());
        Ok(conn.query_row(&sql, params![id], map_company).optional()?)
    }

    fn insert(&self, fields: &CompanyFields) -> RepositoryResult<(i64, CompanyFields)> {
        validate_company(fields)?;
        let conn = self.connections.acquire()?;
        let sql = format!(
            "INSERT INTO {} ({}) VALUES (?1, ?2, ?3, ?4, ?5) RETURNING {}, {}",
            self.kind.table(),
            COMPANY_COLUMNS,
            self.kind.id_column(),
            COMPANY_COLUMNS
        );
        let row = conn.query_row(
            &sql,
            params![
                fields.company_name,
                fields.contact_name,
                fields.phone_no,
                fields.email,
                fields.address
            ],
            map_company,
        )?;
        tracing::info!("新增{}: id={}", self.kind.entity_name(), row.0);
        Ok(row)
    }

    fn update(&self, id: i64, fields: &CompanyFields) -> RepositoryResult<(i64, CompanyFields)> {
        validate_company(fields)?;
        let conn = self.connections.acquire()?;
        let sql = format!(
            "UPDATE {} SET company_name = ?1, contact_name = ?2, phone_no = ?3, email = ?4, address = ?5
             WHERE {} = ?6 RETURNING {}, {}",
            self.kind.table(),
            self.kind.id_column(),
            self.kind.id_column(),
            COMPANY_COLUMNS
        );
        conn.query_row(
            &sql,
            params![
                fields.company_name,
                fields.contact_name,
                fields.phone_no,
                fields.email,
                fields.address,
                id
            ],
            map_company,
        )
        .optional()?
        .ok_or_else(|| RepositoryError::not_found(self.kind.entity_name(), id))
    }

    fn delete(&self, id: i64) -> RepositoryResult<()> {
        let conn = self.connections.acquire()?;
        let sql = format!(
            "DELETE FROM {} WHERE {} = ?1",
            self.kind.table(),
            self.kind.id_column()
        );
        let affected = conn.execute(&sql, params![id])?;
        if affected == 0 {
            return Err(RepositoryError::not_found(self.kind.entity_name(), id));
        }
        tracing::info!("删除{}: id={}", self.kind.entity_name(), id);
        Ok(())
    }
}

fn to_supplier((s_id, f): (i64, CompanyFields)) -> Supplier {
    Supplier {
        s_id,
        company_name: f.company_name,
        contact_name: f.contact_name,
        phone_no: f.phone_no,
        email: f.email,
        address: f.address,
    }
}

fn to_buyer((b_id, f): (i64, CompanyFields)) -> Buyer {
    Buyer {
        b_id,
        company_name: f.company_name,
        contact_name: f.contact_name,
        phone_no: f.phone_no,
        email: f.email,
        address: f.address,
    }
}

// ==========================================
// SupplierRepository - 供应商仓储
// ==========================================
pub struct SupplierRepository {
    table: CompanyTable,
}

impl SupplierRepository {
    pub fn new(connections: Arc<ConnectionManager>) -> Self {
        Self {
            table: CompanyTable {
                kind: PartyKind::Supplier,
                connections,
            },
        }
    }

    pub fn list(&self) -> RepositoryResult<Vec<Supplier>> {
        Ok(self.table.list()?.into_iter().map(to_supplier).collect())
    }

    pub fn find_by_id(&self, id: i64) -> RepositoryResult<Option<Supplier>> {
        Ok(self.table.find_by_id(id)?.map(to_supplier))
    }

    pub fn insert(&self, fields: &CompanyFields) -> RepositoryResult<Supplier> {
        self.table.insert(fields).map(to_supplier)
    }

    pub fn update(&self, id: i64, fields: &CompanyFields) -> RepositoryResult<Supplier> {
        self.table.update(id, fields).map(to_supplier)
    }

    pub fn delete(&self, id: i64) -> RepositoryResult<()> {
        self.table.delete(id)
    }
}

// ==========================================
// BuyerRepository - 买方仓储
// ==========================================
pub struct BuyerRepository {
    table: CompanyTable,
}

impl BuyerRepository {
    pub fn new(connections: Arc<ConnectionManager>) -> Self {
        Self {
            table: CompanyTable {
                kind: PartyKind::Buyer,
                connections,
            },
        }
    }

    pub fn list(&self) -> RepositoryResult<Vec<Buyer>> {
        Ok(self.table.list()?.into_iter().map(to_buyer).collect())
    }

    pub fn find_by_id(&self, id: i64) -> RepositoryResult<Option<Buyer>> {
        Ok(self.table.find_by_id(id)?.map(to_buyer))
    }

    pub fn insert(&self, fields: &CompanyFields) -> RepositoryResult<Buyer> {
        self.table.insert(fields).map(to_buyer)
    }

    pub fn update(&self, id: i64, fields: &CompanyFields) -> RepositoryResult<Buyer> {
        self.table.update(id, fields).map(to_buyer)
    }

    pub fn delete(&self, id: i64) -> RepositoryResult<()> {
        self.table.delete(id)
    }
}

// ==========================================
// DepartmentRepository - 部门仓储
// ==========================================
pub struct DepartmentRepository {
    connections: Arc<ConnectionManager>,
}

fn map_department(row: &Row<'_>) -> rusqlite::Result<Department> {
    Ok(Department {
        d_id: row.get(0)?,
        department_name: row.get(1)?,
    })
}

impl DepartmentRepository {
    pub fn new(connections: Arc<ConnectionManager>) -> Self {
        Self { connections }
    }

    pub fn list(&self) -> RepositoryResult<Vec<Department>> {
        let conn = self.connections.acquire()?;
        let mut stmt = conn.prepare("SELECT d_id, department_name FROM department ORDER BY d_id")?;
        let rows = stmt
            .query_map([], map_department)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
    }

    /// 新增部门（名称唯一，重复时返回 UniqueConstraintViolation）
    pub fn insert(&self, fields: &DepartmentFields) -> RepositoryResult<Department> {
        let name = fields.department_name.trim();
        if name.is_empty() {
            return Err(RepositoryError::ValidationError("部门名称不能为空".to_string()));
        }
        let conn = self.connections.acquire()?;
        let dept = conn.query_row(
            "INSERT INTO department (department_name) VALUES (?1) RETURNING d_id, department_name",
            params![name],
            map_department,
        )?;
        tracing::info!("新增部门: id={}, name={}", dept.d_id, dept.department_name);
        Ok(dept)
    }

    pub fn update(&self, id: i64, fields: &DepartmentFields) -> RepositoryResult<Department> {
        let name = fields.department_name.trim();
        if name.is_empty() {
            return Err(RepositoryError::ValidationError("部门名称不能为空".to_string()));
        }
        let conn = self.connections.acquire()?;
        conn.query_row(
            "UPDATE department SET department_name = ?1 WHERE d_id = ?2 RETURNING d_id, department_name",
            params![name, id],
            map_department,
        )
        .optional()?
        .ok_or_else(|| RepositoryError::not_found("Department", id))
    }

    pub fn delete(&self, id: i64) -> RepositoryResult<()> {
        let conn = self.connections.acquire()?;
        let affected = conn.execute("DELETE FROM department WHERE d_id = ?1", params![id])?;
        if affected == 0 {
            return Err(RepositoryError::not_found("Department", id));
        }
        Ok(())
    }
}

// ==========================================
// EmployeeRepository - 员工仓储
// ==========================================
pub struct EmployeeRepository {
    connections: Arc<ConnectionManager>,
}

const EMPLOYEE_COLUMNS: &str =
    "e_id, employee_name, age, gender, employee_type, role, salary, phone_no, email, address";

fn map_employee(row: &Row<'_>) -> rusqlite::Result<Employee> {
    Ok(Employee {
        e_id: row.get(0)?,
        employee_name: row.get(1)?,
        age: row.get(2)?,
        gender: row.get(3)?,
        employee_type: row.get(4)?,
        role: row.get(5)?,
        salary: row.get(6)?,
        phone_no: row.get(7)?,
        email: row.get(8)?,
        address: row.get(9)?,
    })
}

fn validate_employee(fields: &EmployeeFields) -> RepositoryResult<()> {
    if fields.employee_name.trim().is_empty() {
        return Err(RepositoryError::ValidationError("员工姓名不能为空".to_string()));
    }
    if !fields.salary.is_finite() || fields.salary < 0.0 {
        return Err(RepositoryError::ValidationError(format!(
            "工资无效: {}",
            fields.salary
        )));
    }
    Ok(())
}

impl EmployeeRepository {
    pub fn new(connections: Arc<ConnectionManager>) -> Self {
        Self { connections }
    }

    /// 查询员工（search 非空时按姓名/岗位/邮箱模糊匹配，不区分大小写）
    pub fn list(&self, search: Option<&str>) -> RepositoryResult<Vec<Employee>> {
        let conn = self.connections.acquire()?;
        let term = search.map(str::trim).filter(|s| !s.is_empty());

        let rows = match term {
            Some(term) => {
                let sql = format!(
                    "SELECT {} FROM employee
                     WHERE employee_name LIKE ?1 OR role LIKE ?1 OR email LIKE ?1
                     ORDER BY e_id",
                    EMPLOYEE_COLUMNS
                );
                let mut stmt = conn.prepare(&sql)?;
                let pattern = format!("%{}%", term);
                let rows = stmt
                    .query_map(params![pattern], map_employee)?
                    .collect::<rusqlite::Result<Vec<_>>>()?;
                rows
            }
            None => {
                let sql = format!("SELECT {} FROM employee ORDER BY e_id", EMPLOYEE_COLUMNS);
                let mut stmt = conn.prepare(&sql)?;
                let rows = stmt
                    .query_map([], map_employee)?
                    .collect::<rusqlite::Result<Vec<_>>>()?;
                rows
            }
        };
        Ok(rows)
    }

    pub fn find_by_id(&self, id: i64) -> RepositoryResult<Option<Employee>> {
        let conn = self.connections.acquire()?;
        let sql = format!("SELECT {} FROM employee WHERE e_id = ?1", EMPLOYEE_COLUMNS);
        Ok(conn.query_row(&sql, params![id], map_employee).optional()?)
    }

    pub fn insert(&self, fields: &EmployeeFields) -> RepositoryResult<Employee> {
        validate_employee(fields)?;
        let conn = self.connections.acquire()?;
        let sql = format!(
            "INSERT INTO employee (employee_name, age, gender, employee_type, role, salary, phone_no, email, address)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9) RETURNING {}",
            EMPLOYEE_COLUMNS
        );
        Ok(conn.query_row(
            &sql,
            params![
                fields.employee_name,
                fields.age,
                fields.gender,
                fields.employee_type,
                fields.role,
                fields.salary,
                fields.phone_no,
                fields.email,
                fields.address
            ],
            map_employee,
        )?)
    }

    pub fn update(&self, id: i64, fields: &EmployeeFields) -> RepositoryResult<Employee> {
        validate_employee(fields)?;
        let conn = self.connections.acquire()?;
        let sql = format!(
            "UPDATE employee SET employee_name = ?1, age = ?2, gender = ?3, employee_type = ?4, role = ?5,
                    salary = ?6, phone_no = ?7, email = ?8, address = ?9
             WHERE e_id = ?10 RETURNING {}",
            EMPLOYEE_COLUMNS
        );
        conn.query_row(
            &sql,
            params![
                fields.employee_name,
                fields.age,
                fields.gender,
                fields.employee_type,
                fields.role,
                fields.salary,
                fields.phone_no,
                fields.email,
                fields.address,
                id
            ],
            map_employee,
        )
        .optional()?
        .ok_or_else(|| RepositoryError::not_found("Employee", id))
    }

    pub fn delete(&self, id: i64) -> RepositoryResult<()> {
        let conn = self.connections.acquire()?;
        let affected = conn.execute("DELETE FROM employee WHERE e_id = ?1", params![id])?;
        if affected == 0 {
            return Err(RepositoryError::not_found("Employee", id));
        }
        Ok(())
    }

    /// 按岗位调薪（在调用方事务内执行）
    ///
    /// # 返回
    /// - Ok(rows): 被调整的员工数
    pub fn apply_raise(&self, conn: &Connection, role: &str, percentage: f64) -> RepositoryResult<usize> {
        let rows = conn.execute(
            "UPDATE employee SET salary = salary * (1.0 + ?1 / 100.0) WHERE role = ?2",
            params![percentage, role],
        )?;
        Ok(rows)
    }
}
