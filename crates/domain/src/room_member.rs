use crate::value_objects::{RoomId, Timestamp, UserId};

/// 成员关系：(room_id, user_id) 唯一。
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct RoomMember {
    pub room_id: RoomId,
    pub user_id: UserId,
    pub joined_at: Timestamp,
}

impl RoomMember {
    pub fn new(room_id: RoomId, user_id: UserId, joined_at: Timestamp) -> Self {
        Self {
            room_id,
            user_id,
            joined_at,
        }
    }
}
