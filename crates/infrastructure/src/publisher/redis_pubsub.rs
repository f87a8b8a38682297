use application::{FanoutPublisher, PublishError};
use async_trait::async_trait;
use redis::{aio::ConnectionManager, AsyncCommands, Client};
use tracing::{debug, info};

/// 通过 Redis `PUBLISH` 扇出，连接断开时由 ConnectionManager 自动重连
#[derive(Clone)]
pub struct RedisPublisher {
    connection: ConnectionManager,
}

impl RedisPublisher {
    pub async fn connect(url: &str) -> Result<Self, PublishError> {
        let client = Client::open(url).map_err(|err| PublishError::transport(err.to_string()))?;
        let connection = ConnectionManager::new(client)
            .await
            .map_err(|err| PublishError::transport(err.to_string()))?;

        info!("redis publisher connected");
        Ok(Self { connection })
    }
}

#[async_trait]
impl FanoutPublisher for RedisPublisher {
    async fn publish(&self, channel: &str, payload: serde_json::Value) -> Result<(), PublishError> {
        let mut connection = self.connection.clone();
        let receivers: i64 = connection
            .publish(channel, payload.to_string())
            .await
            .map_err(|err| PublishError::transport(err.to_string()))?;

        debug!(channel, receivers, "published to redis");
        Ok(())
    }
}
