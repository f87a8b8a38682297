use std::sync::Arc;

use application::{FanoutPublisher, NoopPublisher, PasswordHasher, PublishError};
use config::{AppConfig, PublisherKind};
use domain::{ChatRoomRepository, MessageRepository, RoomMemberRepository, UserRepository};
use thiserror::Error;
use tracing::{error, info, warn};

use crate::{
    memory::InMemoryStorage,
    migrations::MIGRATOR,
    password::BcryptPasswordHasher,
    publisher::{CentrifugoPublisher, RedisPublisher},
    repository::{create_pg_pool, PgStorage},
};

#[derive(Debug, Error)]
pub enum InfrastructureError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),
}

/// 按配置装配好的外部适配器
#[derive(Clone)]
pub struct Infrastructure {
    pub user_repository: Arc<dyn UserRepository>,
    pub room_repository: Arc<dyn ChatRoomRepository>,
    pub member_repository: Arc<dyn RoomMemberRepository>,
    pub message_repository: Arc<dyn MessageRepository>,
    pub password_hasher: Arc<dyn PasswordHasher>,
    pub publisher: Arc<dyn FanoutPublisher>,
}

impl Infrastructure {
    pub async fn connect(config: &AppConfig) -> Result<Self, InfrastructureError> {
        let password_hasher: Arc<dyn PasswordHasher> =
            Arc::new(BcryptPasswordHasher::new(config.server.bcrypt_cost));
        let publisher = build_publisher(config).await;

        match config.database.url.as_deref() {
            Some(url) => {
                info!(
                    database = config.database.redacted_url().as_deref().unwrap_or_default(),
                    "connecting to postgres"
                );
                let pool =
                    create_pg_pool(url, config.database.max_connections, config.store_timeout())
                        .await?;
                MIGRATOR.run(&pool).await?;

                let storage = PgStorage::new(pool, config.store_timeout());
                Ok(Self {
                    user_repository: storage.user_repository,
                    room_repository: storage.room_repository,
                    member_repository: storage.member_repository,
                    message_repository: storage.message_repository,
                    password_hasher,
                    publisher,
                })
            }
            None => {
                warn!("no database url configured, using in-memory storage");
                Ok(Self::in_memory(InMemoryStorage::new(), password_hasher, publisher))
            }
        }
    }

    pub fn in_memory(
        storage: InMemoryStorage,
        password_hasher: Arc<dyn PasswordHasher>,
        publisher: Arc<dyn FanoutPublisher>,
    ) -> Self {
        Self {
            user_repository: storage.user_repository,
            room_repository: storage.room_repository,
            member_repository: storage.member_repository,
            message_repository: storage.message_repository,
            password_hasher,
            publisher,
        }
    }
}

/// 消息中枢不可用时退化为 NoopPublisher，服务照常启动
async fn build_publisher(config: &AppConfig) -> Arc<dyn FanoutPublisher> {
    match try_build_publisher(config).await {
        Ok(publisher) => publisher,
        Err(err) => {
            error!(
                kind = ?config.publisher.kind,
                error = %err,
                "fan-out publisher unavailable, events will be dropped"
            );
            Arc::new(NoopPublisher)
        }
    }
}

async fn try_build_publisher(
    config: &AppConfig,
) -> Result<Arc<dyn FanoutPublisher>, PublishError> {
    let settings = &config.publisher;
    let publisher: Arc<dyn FanoutPublisher> = match settings.kind {
        PublisherKind::Centrifugo => {
            info!(url = %settings.centrifugo_url, "using centrifugo publisher");
            Arc::new(CentrifugoPublisher::new(
                &settings.centrifugo_url,
                settings.centrifugo_api_key.clone(),
                config.publish_timeout(),
            )?)
        }
        PublisherKind::Redis => Arc::new(RedisPublisher::connect(&settings.redis_url).await?),
        PublisherKind::None => {
            warn!("fan-out publisher disabled");
            Arc::new(NoopPublisher)
        }
    };
    Ok(publisher)
}
