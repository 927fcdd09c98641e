use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// 失败响应中的 `error` 字段
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ApiError {
    /// 机器可读错误类型，例如 INSUFFICIENT_CAPACITY
    pub code: String,
    pub message: String,
}

impl ApiError {
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
        }
    }
}
