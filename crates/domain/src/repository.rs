//! Repository 接口定义
//!
//! 内层定义接口，外层（PostgreSQL、内存实现）实现接口。
//! 启用 `testing` feature 时为每个接口生成 mockall 模拟对象。

use async_trait::async_trait;

use crate::chat_room::ChatRoom;
use crate::errors::RepositoryError;
use crate::message::Message;
use crate::room_member::RoomMember;
use crate::user::User;
use crate::value_objects::{RoomId, UserEmail, UserId, Username};

pub type RepositoryResult<T> = Result<T, RepositoryError>;

#[cfg_attr(feature = "testing", mockall::automock)]
#[async_trait]
pub trait UserRepository: Send + Sync {
    /// 用户名或邮箱冲突时返回 `RepositoryError::Conflict`
    async fn create(&self, user: User) -> RepositoryResult<User>;
    async fn find_by_id(&self, id: UserId) -> RepositoryResult<Option<User>>;
    async fn find_by_email(&self, email: UserEmail) -> RepositoryResult<Option<User>>;
    async fn find_by_username(&self, username: Username) -> RepositoryResult<Option<User>>;
}

#[cfg_attr(feature = "testing", mockall::automock)]
#[async_trait]
pub trait ChatRoomRepository: Send + Sync {
    async fn create(&self, room: ChatRoom) -> RepositoryResult<ChatRoom>;
    async fn find_by_id(&self, id: RoomId) -> RepositoryResult<Option<ChatRoom>>;
    /// 按创建时间升序返回全部房间
    async fn list_all(&self) -> RepositoryResult<Vec<ChatRoom>>;
}

#[cfg_attr(feature = "testing", mockall::automock)]
#[async_trait]
pub trait RoomMemberRepository: Send + Sync {
    /// 插入成员关系，返回是否新建。
    ///
    /// 已存在时返回 `Ok(false)`；并发插入输掉唯一约束竞争的实现
    /// 可以返回 `Ok(false)` 或 `RepositoryError::Conflict`。
    async fn add(&self, member: RoomMember) -> RepositoryResult<bool>;
    async fn exists(&self, room_id: RoomId, user_id: UserId) -> RepositoryResult<bool>;
}

#[cfg_attr(feature = "testing", mockall::automock)]
#[async_trait]
pub trait MessageRepository: Send + Sync {
    async fn create(&self, message: Message) -> RepositoryResult<Message>;
    /// 返回房间最近的 `limit` 条消息，按 created_at 升序排列
    async fn list_recent(&self, room_id: RoomId, limit: u32) -> RepositoryResult<Vec<Message>>;
}
