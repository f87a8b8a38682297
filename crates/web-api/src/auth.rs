//! 网关认证中间件
//!
//! 校验 `Authorization: Bearer <token>`，把调用者身份以
//! `Extension<Identity>` 的形式交给后续处理函数。

use axum::{
    extract::{Request, State},
    http::header::AUTHORIZATION,
    middleware::Next,
    response::Response,
};

use application::ApplicationError;

use crate::{error::ApiError, state::AppState};

fn authorization_header(request: &Request) -> Option<&str> {
    request
        .headers()
        .get(AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
}

/// 必须携带有效令牌
pub async fn require_auth(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let identity = state
        .identity
        .authenticate(authorization_header(&request))
        .map_err(ApplicationError::from)?;

    request.extensions_mut().insert(identity);
    Ok(next.run(request).await)
}

/// 令牌可选，校验失败按匿名请求继续
pub async fn optional_auth(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Response {
    if let Some(identity) = state
        .identity
        .authenticate_optional(authorization_header(&request))
    {
        request.extensions_mut().insert(identity);
    }
    next.run(request).await
}
