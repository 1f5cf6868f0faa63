// ==========================================
// 制造台账系统 - 统一返回信封
// ==========================================
// 成功: {"success": true, "data": ...}（无返回值时省略 data）
// 失败: {"success": false, "error": "..."}（失败时绝不携带 data）
// ==========================================

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::api::error::ApiResult;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Envelope {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl Envelope {
    pub fn ok(data: Value) -> Self {
        Self {
            success: true,
            data: if data.is_null() { None } else { Some(data) },
            error: None,
        }
    }

    pub fn fail(error: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(error.into()),
        }
    }

    /// 由 API 结果构造；序列化失败按失败处理
    pub fn from_result<T: Serialize>(result: ApiResult<T>) -> Self {
        match result {
            Ok(value) => match serde_json::to_value(value) {
                Ok(data) => Self::ok(data),
                Err(e) => Self::fail(format!("结果序列化失败: {}", e)),
            },
            Err(err) => Self::fail(err.to_string()),
        }
    }

    pub fn to_value(&self) -> Value {
        serde_json::to_value(self).unwrap_or_else(|_| {
            serde_json::json!({"success": false, "error": "响应序列化失败"})
        })
    }
}
