//! 扇出发布
//!
//! [`FanoutPublisher`] 是外部消息代理的发布契约；[`FanoutDispatcher`]
//! 把每次发布放进独立任务，带超时执行，失败只记录日志与计数，从不重试，
//! 也不会影响发起请求的结果。

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use domain::RoomEvent;
use thiserror::Error;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum PublishError {
    #[error("broker rejected publish with status {status}: {body}")]
    Rejected { status: u16, body: String },
    #[error("broker returned error: {0}")]
    Broker(String),
    #[error("transport error: {0}")]
    Transport(String),
}

impl PublishError {
    pub fn transport(message: impl Into<String>) -> Self {
        Self::Transport(message.into())
    }
}

#[async_trait]
pub trait FanoutPublisher: Send + Sync {
    async fn publish(&self, channel: &str, payload: serde_json::Value) -> Result<(), PublishError>;
}

/// 不连接任何代理的发布器，只输出调试日志。
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopPublisher;

#[async_trait]
impl FanoutPublisher for NoopPublisher {
    async fn publish(&self, channel: &str, _payload: serde_json::Value) -> Result<(), PublishError> {
        debug!(channel, "fan-out disabled, dropping event");
        Ok(())
    }
}

#[derive(Debug, Default)]
struct DispatchStats {
    published: AtomicU64,
    failed: AtomicU64,
}

#[derive(Clone)]
pub struct FanoutDispatcher {
    publisher: Arc<dyn FanoutPublisher>,
    timeout: Duration,
    stats: Arc<DispatchStats>,
}

impl FanoutDispatcher {
    pub fn new(publisher: Arc<dyn FanoutPublisher>, timeout: Duration) -> Self {
        Self {
            publisher,
            timeout,
            stats: Arc::new(DispatchStats::default()),
        }
    }

    /// 在后台任务中发布事件。
    ///
    /// 返回的句柄可以丢弃；任务不随请求取消，进程退出时可能被丢弃。
    pub fn dispatch(&self, event: RoomEvent) -> JoinHandle<()> {
        let publisher = Arc::clone(&self.publisher);
        let stats = Arc::clone(&self.stats);
        let timeout = self.timeout;
        let channel = event.channel();
        let payload = event.to_payload();

        tokio::spawn(async move {
            match tokio::time::timeout(timeout, publisher.publish(&channel, payload)).await {
                Ok(Ok(())) => {
                    stats.published.fetch_add(1, Ordering::Relaxed);
                    debug!(channel = %channel, "fan-out event published");
                }
                Ok(Err(err)) => {
                    stats.failed.fetch_add(1, Ordering::Relaxed);
                    warn!(channel = %channel, error = %err, "fan-out publish failed");
                }
                Err(_) => {
                    stats.failed.fetch_add(1, Ordering::Relaxed);
                    warn!(
                        channel = %channel,
                        timeout_ms = timeout.as_millis() as u64,
                        "fan-out publish timed out"
                    );
                }
            }
        })
    }

    pub fn published_count(&self) -> u64 {
        self.stats.published.load(Ordering::Relaxed)
    }

    pub fn failure_count(&self) -> u64 {
        self.stats.failed.load(Ordering::Relaxed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use domain::{RoomId, UserId};
    use tokio::sync::mpsc;
    use uuid::Uuid;

    struct RecordingPublisher {
        sender: mpsc::UnboundedSender<(String, serde_json::Value)>,
    }

    #[async_trait]
    impl FanoutPublisher for RecordingPublisher {
        async fn publish(
            &self,
            channel: &str,
            payload: serde_json::Value,
        ) -> Result<(), PublishError> {
            let _ = self.sender.send((channel.to_owned(), payload));
            Ok(())
        }
    }

    struct FailingPublisher;

    #[async_trait]
    impl FanoutPublisher for FailingPublisher {
        async fn publish(&self, _: &str, _: serde_json::Value) -> Result<(), PublishError> {
            Err(PublishError::transport("connection refused"))
        }
    }

    struct HangingPublisher;

    #[async_trait]
    impl FanoutPublisher for HangingPublisher {
        async fn publish(&self, _: &str, _: serde_json::Value) -> Result<(), PublishError> {
            std::future::pending().await
        }
    }

    fn join_event() -> (RoomId, RoomEvent) {
        let room_id = RoomId::from(Uuid::new_v4());
        let event = RoomEvent::user_joined(room_id, UserId::from(Uuid::new_v4()), Utc::now());
        (room_id, event)
    }

    #[tokio::test]
    async fn dispatch_publishes_on_room_channel() {
        let (sender, mut receiver) = mpsc::unbounded_channel();
        let dispatcher =
            FanoutDispatcher::new(Arc::new(RecordingPublisher { sender }), Duration::from_secs(5));
        let (room_id, event) = join_event();

        dispatcher.dispatch(event).await.unwrap();

        let (channel, payload) = receiver.recv().await.unwrap();
        assert_eq!(channel, format!("room:{room_id}"));
        assert_eq!(payload["type"], "user_joined");
        assert_eq!(dispatcher.published_count(), 1);
        assert_eq!(dispatcher.failure_count(), 0);
    }

    #[tokio::test]
    async fn failures_are_counted_not_raised() {
        let dispatcher = FanoutDispatcher::new(Arc::new(FailingPublisher), Duration::from_secs(5));

        dispatcher.dispatch(join_event().1).await.unwrap();
        dispatcher.dispatch(join_event().1).await.unwrap();

        assert_eq!(dispatcher.failure_count(), 2);
        assert_eq!(dispatcher.published_count(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn hanging_broker_is_abandoned_after_timeout() {
        let dispatcher =
            FanoutDispatcher::new(Arc::new(HangingPublisher), Duration::from_millis(50));

        dispatcher.dispatch(join_event().1).await.unwrap();

        assert_eq!(dispatcher.failure_count(), 1);
    }
}
