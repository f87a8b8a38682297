//! 扇出事件
//!
//! 发布到 `room:<room_id>` 频道的负载。字段名与订阅端约定一致，
//! 不直接序列化领域实体。

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::message::Message;
use crate::value_objects::{RoomId, Timestamp, UserId};

pub const ROOM_CHANNEL_PREFIX: &str = "room:";

/// 房间对应的扇出频道名
pub fn room_channel(room_id: RoomId) -> String {
    format!("{ROOM_CHANNEL_PREFIX}{room_id}")
}

/// 新消息事件
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessagePublished {
    pub id: Uuid,
    pub room_id: Uuid,
    pub user_id: Uuid,
    pub username: String,
    pub content: String,
    /// RFC 3339
    pub created_at: String,
}

/// 成员加入事件
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserJoined {
    #[serde(rename = "type")]
    pub kind: String,
    pub room_id: Uuid,
    pub user_id: Uuid,
    /// Unix 秒
    pub timestamp: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RoomEvent {
    UserJoined(UserJoined),
    MessagePublished(MessagePublished),
}

impl RoomEvent {
    pub fn message(message: &Message) -> Self {
        Self::MessagePublished(MessagePublished {
            id: message.id.into(),
            room_id: message.room_id.into(),
            user_id: message.user_id.into(),
            username: message.username.clone(),
            content: message.content.as_str().to_owned(),
            created_at: message.created_at.to_rfc3339(),
        })
    }

    pub fn user_joined(room_id: RoomId, user_id: UserId, at: Timestamp) -> Self {
        Self::UserJoined(UserJoined {
            kind: "user_joined".to_owned(),
            room_id: room_id.into(),
            user_id: user_id.into(),
            timestamp: at.timestamp(),
        })
    }

    pub fn room_id(&self) -> RoomId {
        match self {
            Self::UserJoined(event) => RoomId::from(event.room_id),
            Self::MessagePublished(event) => RoomId::from(event.room_id),
        }
    }

    pub fn channel(&self) -> String {
        room_channel(self.room_id())
    }

    pub fn to_payload(&self) -> serde_json::Value {
        // 只包含字符串与整数字段，序列化不会失败
        serde_json::to_value(self).unwrap_or(serde_json::Value::Null)
    }
}
