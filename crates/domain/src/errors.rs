//! 领域模型错误定义

use thiserror::Error;

/// 值对象与实体校验失败时返回的错误。
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DomainError {
    #[error("invalid argument {field}: {reason}")]
    InvalidArgument { field: &'static str, reason: String },
}

impl DomainError {
    pub fn invalid_argument(field: &'static str, reason: impl Into<String>) -> Self {
        Self::InvalidArgument {
            field,
            reason: reason.into(),
        }
    }

    pub fn field(&self) -> &'static str {
        match self {
            Self::InvalidArgument { field, .. } => field,
        }
    }

    pub fn reason(&self) -> &str {
        match self {
            Self::InvalidArgument { reason, .. } => reason,
        }
    }
}

/// 存储层错误。
///
/// `NotFound` 与其它失败区分开，调用方据此映射为业务上的"不存在"；
/// `Conflict` 表示唯一约束冲突。
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RepositoryError {
    #[error("record not found")]
    NotFound,
    #[error("unique constraint violated")]
    Conflict,
    #[error("storage call timed out after {millis}ms")]
    Timeout { millis: u64 },
    #[error("storage error: {message}")]
    Storage { message: String },
}

impl RepositoryError {
    pub fn storage(message: impl Into<String>) -> Self {
        Self::Storage {
            message: message.into(),
        }
    }
}
