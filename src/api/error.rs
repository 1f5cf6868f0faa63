// ==========================================
// 制造台账系统 - API层错误类型
// ==========================================
// 职责: 把仓储层的技术错误归并为对外的错误分类
// 约束: 对外只暴露一条可读消息，不含内部标识与堆栈
// ==========================================

use crate::repository::error::RepositoryError;
use thiserror::Error;

/// API层错误类型
#[derive(Error, Debug)]
pub enum ApiError {
    /// 连接池耗尽或重试用尽，操作未执行
    #[error("数据库连接失败: {0}")]
    ConnectionError(String),

    /// 入参不合法，未发出任何语句
    #[error("数据验证失败: {0}")]
    ValidationError(String),

    #[error("资源未找到: {0}")]
    NotFound(String),

    /// 业务规则失败，消息原样透传
    #[error("{0}")]
    BusinessRuleViolation(String),

    /// 存储层唯一键 / 外键 / 检查约束
    #[error("约束冲突: {0}")]
    ConstraintViolation(String),

    #[error("数据库错误: {0}")]
    DatabaseError(String),

    #[error("内部错误: {0}")]
    InternalError(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl ApiError {
    /// 错误分类代码（日志用）
    pub fn code(&self) -> &'static str {
        match self {
            ApiError::ConnectionError(_) => "CONNECTION_ERROR",
            ApiError::ValidationError(_) => "VALIDATION_ERROR",
            ApiError::NotFound(_) => "NOT_FOUND",
            ApiError::BusinessRuleViolation(_) => "BUSINESS_RULE",
            ApiError::ConstraintViolation(_) => "CONSTRAINT_VIOLATION",
            ApiError::DatabaseError(_) => "DATABASE_ERROR",
            ApiError::InternalError(_) | ApiError::Other(_) => "INTERNAL_ERROR",
        }
    }
}

// ==========================================
// 从 RepositoryError 转换
// ==========================================
impl From<RepositoryError> for ApiError {
    fn from(err: RepositoryError) -> Self {
        match err {
            RepositoryError::NotFound { entity, id } => {
                ApiError::NotFound(format!("{}({})不存在", entity, id))
            }

            // 连接层错误
            RepositoryError::DatabaseConnectionError(msg) => ApiError::ConnectionError(msg),
            RepositoryError::PoolExhausted { capacity } => {
                ApiError::ConnectionError(format!("连接池已耗尽(容量={})", capacity))
            }
            RepositoryError::LockError(msg) => {
                ApiError::DatabaseError(format!("数据库繁忙: {}", msg))
            }
            RepositoryError::DatabaseTransactionError(msg)
            | RepositoryError::DatabaseQueryError(msg) => ApiError::DatabaseError(msg),

            // 存储约束
            RepositoryError::UniqueConstraintViolation(msg) => {
                ApiError::ConstraintViolation(format!("唯一约束违反: {}", msg))
            }
            RepositoryError::ForeignKeyViolation(msg) => {
                ApiError::ConstraintViolation(format!("外键约束违反: {}", msg))
            }
            RepositoryError::CheckConstraintViolation(msg) => {
                ApiError::ConstraintViolation(format!("检查约束违反: {}", msg))
            }

            RepositoryError::BusinessRuleViolation(msg) => ApiError::BusinessRuleViolation(msg),
            RepositoryError::ValidationError(msg) => ApiError::ValidationError(msg),

            RepositoryError::InternalError(msg) => ApiError::InternalError(msg),
            RepositoryError::Other(err) => ApiError::Other(err),
        }
    }
}

/// Result 类型别名
pub type ApiResult<T> = Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_business_rule_message_is_verbatim() {
        let reason = "库存不足: 成品 Chair 当前库存 1，需求 3";
        let api_err: ApiError = RepositoryError::BusinessRuleViolation(reason.to_string()).into();
        assert_eq!(api_err.to_string(), reason);
        assert_eq!(api_err.code(), "BUSINESS_RULE");
    }

    #[test]
    fn test_repository_error_conversion() {
        let api_err: ApiError = RepositoryError::not_found("Supplier", 42).into();
        match api_err {
            ApiError::NotFound(msg) => {
                assert!(msg.contains("Supplier"));
                assert!(msg.contains("42"));
            }
            other => panic!("Expected NotFound, got {:?}", other),
        }

        let api_err: ApiError = RepositoryError::PoolExhausted { capacity: 4 }.into();
        assert!(matches!(api_err, ApiError::ConnectionError(_)));

        let api_err: ApiError =
            RepositoryError::UniqueConstraintViolation("department.department_name".to_string())
                .into();
        assert!(matches!(api_err, ApiError::ConstraintViolation(_)));
    }
}
