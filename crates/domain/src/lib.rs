//! 聊天室系统核心领域模型
//!
//! 包含用户、聊天室、成员关系、消息等核心实体，值对象的校验规则，
//! 以及存储层需要实现的 Repository 接口。

pub mod chat_room;
pub mod errors;
pub mod events;
pub mod message;
pub mod repository;
pub mod room_member;
pub mod user;
pub mod value_objects;

// 重新导出常用类型
pub use chat_room::ChatRoom;
pub use errors::{DomainError, RepositoryError};
pub use events::{room_channel, MessagePublished, RoomEvent, UserJoined};
pub use message::Message;
pub use repository::{
    ChatRoomRepository, MessageRepository, RepositoryResult, RoomMemberRepository, UserRepository,
};
pub use room_member::RoomMember;
pub use user::User;
pub use value_objects::{
    MessageContent, MessageId, PasswordHash, RoomId, Timestamp, UserEmail, UserId, Username,
};

#[cfg(feature = "testing")]
pub use repository::{
    MockChatRoomRepository, MockMessageRepository, MockRoomMemberRepository, MockUserRepository,
};
