// ==========================================
// 高校课表管理系统 - API层错误类型
// ==========================================
// 职责: 定义API层错误类型, 转换Repository错误为用户友好的错误消息
// 约定: 任何失败路径返回类型化错误, 永不以裸布尔吞掉失败
// ==========================================

use crate::repository::error::RepositoryError;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// 字段级校验错误
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FieldError {
    pub field: String,   // 字段名 (code/name/...)
    pub message: String, // 人类可读的错误描述
}

impl FieldError {
    pub fn new(field: &str, message: impl Into<String>) -> Self {
        Self {
            field: field.to_string(),
            message: message.into(),
        }
    }
}

/// API层错误类型
#[derive(Error, Debug)]
pub enum ApiError {
    // ==========================================
    // 输入校验错误 (写入开始前即检出, 聚合全部字段问题)
    // ==========================================
    #[error("数据校验失败: {}个字段不合法", errors.len())]
    Validation { errors: Vec<FieldError> },

    // ==========================================
    // 业务状态错误
    // ==========================================
    #[error("资源未找到: {0}")]
    NotFound(String),

    /// 操作被当前状态阻止 (如删除仍有依赖的院系);
    /// blocking 列出阻塞依赖名 (users/subjects/classrooms/timetables)
    #[error("前置条件不满足: {message}")]
    Precondition {
        message: String,
        blocking: Vec<&'static str>,
    },

    // ==========================================
    // 数据访问错误
    // ==========================================
    #[error("持久化失败: {0}")]
    Persistence(String),

    // ==========================================
    // 通用错误
    // ==========================================
    #[error("内部错误: {0}")]
    Internal(String),
}

impl ApiError {
    /// 单字段校验错误的便捷构造
    pub fn invalid_field(field: &str, message: impl Into<String>) -> Self {
        ApiError::Validation {
            errors: vec![FieldError::new(field, message)],
        }
    }

    pub fn not_found(entity: &str, id: &str) -> Self {
        ApiError::NotFound(format!("{}(id={})不存在", entity, id))
    }
}

// ==========================================
// 从 RepositoryError 转换
// 目的: 将Repository层的技术错误转换为用户友好的业务错误
// ==========================================
impl From<RepositoryError> for ApiError {
    fn from(err: RepositoryError) -> Self {
        match err {
            RepositoryError::NotFound { entity, id } => {
                ApiError::NotFound(format!("{}(id={})不存在", entity, id))
            }
            // 校验层已做预检, 唯一约束在此兜底并发竞争下的重复写入
            RepositoryError::UniqueConstraintViolation(msg) => ApiError::Validation {
                errors: vec![FieldError::new("code", format!("院系代码已存在: {}", msg))],
            },
            RepositoryError::FieldValueError { field, message } => ApiError::Validation {
                errors: vec![FieldError { field, message }],
            },
            RepositoryError::BusinessRuleViolation(msg) => ApiError::Precondition {
                message: msg,
                blocking: Vec::new(),
            },
            RepositoryError::ForeignKeyViolation(msg)
            | RepositoryError::DatabaseQueryError(msg)
            | RepositoryError::DatabaseTransactionError(msg)
            | RepositoryError::DatabaseConnectionError(msg) => ApiError::Persistence(msg),
            RepositoryError::LockError(msg) => {
                ApiError::Persistence(format!("数据库锁获取失败: {}", msg))
            }
            RepositoryError::InternalError(msg) => ApiError::Internal(msg),
            RepositoryError::Other(e) => ApiError::Internal(e.to_string()),
        }
    }
}

/// Result 类型别名
pub type ApiResult<T> = Result<T, ApiError>;
