//! Web API 层。
//!
//! 提供 Axum 路由与认证中间件，将 HTTP 请求委托给应用层的用例服务。

mod auth;
mod error;
mod routes;
mod state;

pub use auth::{optional_auth, require_auth};
pub use error::{ApiError, ErrorBody};
pub use routes::router;
pub use state::AppState;
