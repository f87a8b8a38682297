use domain::{DomainError, RepositoryError};
use thiserror::Error;

use crate::identity::IdentityError;
use crate::password::PasswordHasherError;

/// 用例层对外暴露的错误分类。
///
/// 存储与哈希等内部故障统一归入 `Internal`，其中的上下文只用于日志，
/// 不返回给客户端。
#[derive(Debug, Error)]
pub enum ApplicationError {
    #[error("validation failed: {0}")]
    Validation(String),
    #[error("{0}")]
    Unauthenticated(String),
    #[error("invalid token")]
    InvalidToken,
    #[error("token expired")]
    ExpiredToken,
    #[error("user already exists")]
    UserAlreadyExists,
    #[error("invalid credentials")]
    InvalidCredentials,
    #[error("user not found")]
    UserNotFound,
    #[error("room not found")]
    RoomNotFound,
    #[error("user is not a member of this room")]
    NotRoomMember,
    #[error("invalid message: {0}")]
    InvalidMessage(String),
    #[error("internal error: {0}")]
    Internal(String),
}

impl ApplicationError {
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal(message.into())
    }
}

impl From<DomainError> for ApplicationError {
    fn from(value: DomainError) -> Self {
        ApplicationError::Validation(format!("{}: {}", value.field(), value.reason()))
    }
}

impl From<RepositoryError> for ApplicationError {
    fn from(value: RepositoryError) -> Self {
        ApplicationError::Internal(format!("repository: {value}"))
    }
}

impl From<IdentityError> for ApplicationError {
    fn from(value: IdentityError) -> Self {
        ApplicationError::Unauthenticated(value.to_string())
    }
}

impl From<PasswordHasherError> for ApplicationError {
    fn from(value: PasswordHasherError) -> Self {
        ApplicationError::Internal(value.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identity_failures_become_unauthenticated() {
        let error = ApplicationError::from(IdentityError::MissingHeader);
        assert!(matches!(
            &error,
            ApplicationError::Unauthenticated(reason) if reason == "authorization header is required"
        ));

        let error = ApplicationError::from(IdentityError::Unauthenticated);
        assert!(matches!(error, ApplicationError::Unauthenticated(_)));
    }
}
