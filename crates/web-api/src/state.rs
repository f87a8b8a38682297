use std::sync::Arc;

use application::{AuthService, ChatService, IdentityVerifier};

#[derive(Clone)]
pub struct AppState {
    pub auth_service: Arc<AuthService>,
    pub chat_service: Arc<ChatService>,
    pub identity: IdentityVerifier,
}

impl AppState {
    pub fn new(
        auth_service: Arc<AuthService>,
        chat_service: Arc<ChatService>,
        identity: IdentityVerifier,
    ) -> Self {
        Self {
            auth_service,
            chat_service,
            identity,
        }
    }
}
