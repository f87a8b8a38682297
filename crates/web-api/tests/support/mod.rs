#![allow(dead_code)]

use std::sync::Arc;
use std::time::Duration;

use application::{
    AuthService, AuthServiceDependencies, ChatService, ChatServiceDependencies, Clock,
    FanoutDispatcher, FanoutPublisher, IdentityVerifier, JwtTokenService, MembershipGuard,
    MembershipGuardDependencies, PublishError, SystemClock,
};
use async_trait::async_trait;
use axum::{
    body::{to_bytes, Body},
    http::{header, Method, Request, StatusCode},
    Router,
};
use infrastructure::{BcryptPasswordHasher, InMemoryStorage};
use serde_json::Value;
use tokio::sync::mpsc;
use tower::ServiceExt;

use web_api::{router, AppState};

pub const SECRET: &str = "integration-test-secret-0123456789abcdef";

pub type Published = (String, Value);

struct RecordingPublisher {
    sender: mpsc::UnboundedSender<Published>,
}

#[async_trait]
impl FanoutPublisher for RecordingPublisher {
    async fn publish(&self, channel: &str, payload: Value) -> Result<(), PublishError> {
        let _ = self.sender.send((channel.to_owned(), payload));
        Ok(())
    }
}

pub struct TestApp {
    pub router: Router,
    pub storage: InMemoryStorage,
    pub dispatcher: FanoutDispatcher,
    published: mpsc::UnboundedReceiver<Published>,
}

impl TestApp {
    pub fn new() -> Self {
        let storage = InMemoryStorage::new();
        let clock: Arc<dyn Clock> = Arc::new(SystemClock);
        let tokens = Arc::new(JwtTokenService::new(
            SECRET,
            chrono::Duration::hours(24),
            clock.clone(),
        ));

        let (sender, published) = mpsc::unbounded_channel();
        let dispatcher = FanoutDispatcher::new(
            Arc::new(RecordingPublisher { sender }),
            Duration::from_secs(5),
        );

        let auth_service = Arc::new(AuthService::new(AuthServiceDependencies {
            user_repository: storage.user_repository.clone(),
            password_hasher: Arc::new(BcryptPasswordHasher::new(Some(4))),
            token_service: tokens.clone(),
            clock: clock.clone(),
        }));
        let membership = Arc::new(MembershipGuard::new(MembershipGuardDependencies {
            room_repository: storage.room_repository.clone(),
            member_repository: storage.member_repository.clone(),
            clock: clock.clone(),
        }));
        let chat_service = Arc::new(ChatService::new(ChatServiceDependencies {
            membership,
            message_repository: storage.message_repository.clone(),
            dispatcher: dispatcher.clone(),
            clock,
        }));

        let state = AppState::new(auth_service, chat_service, IdentityVerifier::new(tokens));

        Self {
            router: router(state),
            storage,
            dispatcher,
            published,
        }
    }

    pub async fn request(
        &self,
        method: Method,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
        }
        self.send(builder, body).await
    }

    pub async fn request_with_header(
        &self,
        method: Method,
        uri: &str,
        authorization: &str,
    ) -> (StatusCode, Value) {
        let builder = Request::builder()
            .method(method)
            .uri(uri)
            .header(header::AUTHORIZATION, authorization);
        self.send(builder, None).await
    }

    async fn send(&self, builder: axum::http::request::Builder, body: Option<Value>) -> (StatusCode, Value) {
        let request = match body {
            Some(json) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(json.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };

        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let value = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, value)
    }

    /// 注册并返回 (user_id, token)
    pub async fn register(&self, username: &str) -> (String, String) {
        let (status, body) = self
            .request(
                Method::POST,
                "/api/v1/auth/register",
                None,
                Some(serde_json::json!({
                    "username": username,
                    "email": format!("{username}@example.com"),
                    "password": "secret1",
                })),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED, "{body}");
        (
            body["user"]["id"].as_str().unwrap().to_owned(),
            body["token"].as_str().unwrap().to_owned(),
        )
    }

    pub async fn create_room(&self, token: &str, name: &str) -> String {
        let (status, body) = self
            .request(
                Method::POST,
                "/api/v1/rooms",
                Some(token),
                Some(serde_json::json!({ "name": name })),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED, "{body}");
        body["room"]["id"].as_str().unwrap().to_owned()
    }

    /// 等待下一次扇出发布
    pub async fn next_published(&mut self) -> Option<Published> {
        tokio::time::timeout(Duration::from_secs(2), self.published.recv())
            .await
            .ok()
            .flatten()
    }

    pub fn try_published(&mut self) -> Option<Published> {
        self.published.try_recv().ok()
    }
}
