// ==========================================
// 制造台账系统 - 往来单位与人员领域模型
// ==========================================
// 供应商 / 买方 / 部门 / 员工
// 只作为交易的被引用方，单表增删改查
// ==========================================

use serde::{Deserialize, Serialize};

// ==========================================
// Supplier - 供应商
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Supplier {
    pub s_id: i64,
    pub company_name: String,
    pub contact_name: Option<String>,
    pub phone_no: Option<String>,
    pub email: Option<String>,
    pub address: Option<String>,
}

// ==========================================
// Buyer - 买方
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Buyer {
    pub b_id: i64,
    pub company_name: String,
    pub contact_name: Option<String>,
    pub phone_no: Option<String>,
    pub email: Option<String>,
    pub address: Option<String>,
}

/// 供应商/买方的可写字段集
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CompanyFields {
    pub company_name: String,
    #[serde(default)]
    pub contact_name: Option<String>,
    #[serde(default)]
    pub phone_no: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub address: Option<String>,
}

impl CompanyFields {
    pub fn named(company_name: &str) -> Self {
        Self {
            company_name: company_name.to_string(),
            ..Default::default()
        }
    }
}

// ==========================================
// Department - 部门
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Department {
    pub d_id: i64,
    pub department_name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DepartmentFields {
    pub department_name: String,
}

// ==========================================
// Employee - 员工
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Employee {
    pub e_id: i64,
    pub employee_name: String,
    pub age: Option<i64>,
    pub gender: Option<String>,
    pub employee_type: Option<String>,
    pub role: Option<String>,
    pub salary: f64,
    pub phone_no: Option<String>,
    pub email: Option<String>,
    pub address: Option<String>,
}

/// 员工可写字段集
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EmployeeFields {
    pub employee_name: String,
    #[serde(default)]
    pub age: Option<i64>,
    #[serde(default)]
    pub gender: Option<String>,
    #[serde(default, alias = "type")]
    pub employee_type: Option<String>,
    #[serde(default)]
    pub role: Option<String>,
    #[serde(default)]
    pub salary: f64,
    #[serde(default)]
    pub phone_no: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub address: Option<String>,
}
