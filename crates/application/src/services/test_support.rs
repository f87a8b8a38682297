//! 服务测试共用的替身实现

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{TimeZone, Utc};
use domain::{PasswordHash, Timestamp};
use tokio::sync::mpsc;

use crate::{
    clock::Clock,
    password::{PasswordHasher, PasswordHasherError},
    publisher::{FanoutDispatcher, FanoutPublisher, PublishError},
};

pub struct FixedClock(pub Timestamp);

impl Clock for FixedClock {
    fn now(&self) -> Timestamp {
        self.0
    }
}

pub fn fixed_clock() -> Arc<dyn Clock> {
    Arc::new(FixedClock(Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap()))
}

/// 以 `hashed:` 前缀模拟摘要，便于断言
pub struct PlainPasswordHasher;

#[async_trait]
impl PasswordHasher for PlainPasswordHasher {
    async fn hash(&self, plaintext: &str) -> Result<PasswordHash, PasswordHasherError> {
        PasswordHash::new(format!("hashed:{plaintext}"))
            .map_err(|err| PasswordHasherError::Hash(err.to_string()))
    }

    async fn verify(
        &self,
        plaintext: &str,
        digest: &PasswordHash,
    ) -> Result<bool, PasswordHasherError> {
        Ok(digest.as_str() == format!("hashed:{plaintext}"))
    }
}

pub type Published = (String, serde_json::Value);

/// 记录发布调用，测试通过接收端断言"已发布"而不阻塞服务
pub struct RecordingPublisher {
    sender: mpsc::UnboundedSender<Published>,
}

#[async_trait]
impl FanoutPublisher for RecordingPublisher {
    async fn publish(&self, channel: &str, payload: serde_json::Value) -> Result<(), PublishError> {
        let _ = self.sender.send((channel.to_owned(), payload));
        Ok(())
    }
}

pub fn recording_dispatcher() -> (FanoutDispatcher, mpsc::UnboundedReceiver<Published>) {
    let (sender, receiver) = mpsc::unbounded_channel();
    let dispatcher =
        FanoutDispatcher::new(Arc::new(RecordingPublisher { sender }), Duration::from_secs(5));
    (dispatcher, receiver)
}

/// 记录调用后永不返回，模拟挂起的消息中枢
pub struct BlockingPublisher {
    sender: mpsc::UnboundedSender<Published>,
}

#[async_trait]
impl FanoutPublisher for BlockingPublisher {
    async fn publish(&self, channel: &str, payload: serde_json::Value) -> Result<(), PublishError> {
        let _ = self.sender.send((channel.to_owned(), payload));
        std::future::pending().await
    }
}

pub fn blocking_dispatcher(
    timeout: Duration,
) -> (FanoutDispatcher, mpsc::UnboundedReceiver<Published>) {
    let (sender, receiver) = mpsc::unbounded_channel();
    let dispatcher = FanoutDispatcher::new(Arc::new(BlockingPublisher { sender }), timeout);
    (dispatcher, receiver)
}

/// 等待一次发布，超时返回 None
pub async fn next_published(receiver: &mut mpsc::UnboundedReceiver<Published>) -> Option<Published> {
    tokio::time::timeout(Duration::from_secs(1), receiver.recv())
        .await
        .ok()
        .flatten()
}
