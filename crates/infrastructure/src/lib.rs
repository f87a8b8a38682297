//! 基础设施层实现。
//!
//! 提供数据库仓储、内存仓储、密码哈希与扇出发布器等适配器，
//! 实现应用/领域层定义的接口。

pub mod builder;
pub mod memory;
pub mod migrations;
pub mod password;
pub mod publisher;
pub mod repository;

pub use builder::{Infrastructure, InfrastructureError};
pub use memory::{
    InMemoryChatRoomRepository, InMemoryMessageRepository, InMemoryRoomMemberRepository,
    InMemoryStorage, InMemoryUserRepository,
};
pub use migrations::MIGRATOR;
pub use password::BcryptPasswordHasher;
pub use publisher::{CentrifugoPublisher, RedisPublisher};
pub use repository::{
    create_pg_pool, PgChatRoomRepository, PgMessageRepository, PgRoomMemberRepository, PgStorage,
    PgUserRepository,
};
