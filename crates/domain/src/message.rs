use crate::value_objects::{MessageContent, MessageId, RoomId, Timestamp, UserId};

/// 已持久化的聊天消息，创建后不可变。
///
/// `username` 是发送时刻发送者名字的快照，不随用户资料变化。
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Message {
    pub id: MessageId,
    pub room_id: RoomId,
    pub user_id: UserId,
    pub username: String,
    pub content: MessageContent,
    pub created_at: Timestamp,
}

impl Message {
    pub fn new(
        id: MessageId,
        room_id: RoomId,
        user_id: UserId,
        username: impl Into<String>,
        content: MessageContent,
        created_at: Timestamp,
    ) -> Self {
        Self {
            id,
            room_id,
            user_id,
            username: username.into(),
            content,
            created_at,
        }
    }
}
