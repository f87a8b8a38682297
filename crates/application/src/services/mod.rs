mod auth_service;
mod chat_service;
mod membership;

#[cfg(test)]
mod test_support;

pub use auth_service::{
    AuthService, AuthServiceDependencies, AuthSession, LoginRequest, RegisterRequest,
    MIN_PASSWORD_CHARS,
};
pub use chat_service::{
    ChatService, ChatServiceDependencies, SendMessageRequest, DEFAULT_HISTORY_LIMIT,
    MAX_HISTORY_LIMIT,
};
pub use membership::{MembershipGuard, MembershipGuardDependencies};
