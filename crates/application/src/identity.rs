//! 网关身份识别
//!
//! 从 `Authorization` 头中解析 bearer 令牌并得到调用者身份。
//! 令牌无效与过期对外统一为 `Unauthenticated`，具体原因只写入日志。

use std::sync::Arc;

use domain::UserId;
use thiserror::Error;
use tracing::debug;

use crate::token::{JwtTokenService, TokenError};

/// 已认证的调用者
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    pub user_id: UserId,
    pub username: String,
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum IdentityError {
    #[error("authorization header is required")]
    MissingHeader,
    #[error("authorization header must be 'Bearer <token>'")]
    MalformedHeader,
    #[error("invalid or expired token")]
    Unauthenticated,
}

#[derive(Clone)]
pub struct IdentityVerifier {
    tokens: Arc<JwtTokenService>,
}

impl IdentityVerifier {
    pub fn new(tokens: Arc<JwtTokenService>) -> Self {
        Self { tokens }
    }

    /// 强制认证：头部缺失、格式错误或令牌不可用都会拒绝
    pub fn authenticate(&self, header: Option<&str>) -> Result<Identity, IdentityError> {
        let header = header.ok_or(IdentityError::MissingHeader)?;
        let token = bearer_token(header)?;

        match self.tokens.verify(token) {
            Ok(claims) => Ok(Identity {
                user_id: UserId::from(claims.user_id),
                username: claims.username,
            }),
            Err(TokenError::Expired) => {
                debug!("rejected expired token");
                Err(IdentityError::Unauthenticated)
            }
            Err(err) => {
                debug!(error = %err, "rejected invalid token");
                Err(IdentityError::Unauthenticated)
            }
        }
    }

    /// 非强制认证：任何失败都视为匿名请求
    pub fn authenticate_optional(&self, header: Option<&str>) -> Option<Identity> {
        header?;
        match self.authenticate(header) {
            Ok(identity) => Some(identity),
            Err(err) => {
                debug!(error = %err, "continuing without identity");
                None
            }
        }
    }
}

fn bearer_token(header: &str) -> Result<&str, IdentityError> {
    let mut parts = header.split(' ');
    match (parts.next(), parts.next(), parts.next()) {
        (Some("Bearer"), Some(token), None) => Ok(token),
        _ => {
            debug!("malformed authorization header");
            Err(IdentityError::MalformedHeader)
        }
    }
}
