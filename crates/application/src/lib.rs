//! 应用层实现。
//!
//! 围绕领域模型的用例服务：注册登录、令牌签发与校验、身份识别、
//! 房间成员守卫、消息管道，以及对外部适配器（密码哈希、扇出发布）的抽象。

pub mod clock;
pub mod error;
pub mod identity;
pub mod password;
pub mod publisher;
pub mod services;
pub mod token;

pub use clock::{Clock, SystemClock};
pub use error::ApplicationError;
pub use identity::{Identity, IdentityError, IdentityVerifier};
pub use password::{PasswordHasher, PasswordHasherError};
pub use publisher::{FanoutDispatcher, FanoutPublisher, NoopPublisher, PublishError};
pub use services::{
    AuthService, AuthServiceDependencies, AuthSession, ChatService, ChatServiceDependencies,
    LoginRequest, MembershipGuard, MembershipGuardDependencies, RegisterRequest,
    SendMessageRequest,
};
pub use token::{Claims, JwtTokenService, TokenError};
