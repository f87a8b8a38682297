//! 内存仓储
//!
//! 未配置数据库时使用，也用于集成测试。唯一约束与 PostgreSQL 实现保持一致。

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use async_trait::async_trait;
use domain::{
    ChatRoom, ChatRoomRepository, Message, MessageRepository, RepositoryError, RepositoryResult,
    RoomId, RoomMember, RoomMemberRepository, User, UserEmail, UserId, UserRepository, Username,
};
use tokio::sync::RwLock;

#[derive(Default, Clone)]
pub struct InMemoryUserRepository {
    users: Arc<RwLock<HashMap<UserId, User>>>,
}

impl InMemoryUserRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl UserRepository for InMemoryUserRepository {
    async fn create(&self, user: User) -> RepositoryResult<User> {
        let mut guard = self.users.write().await;
        let taken = guard.contains_key(&user.id)
            || guard
                .values()
                .any(|u| u.email == user.email || u.username == user.username);
        if taken {
            return Err(RepositoryError::Conflict);
        }
        guard.insert(user.id, user.clone());
        Ok(user)
    }

    async fn find_by_id(&self, id: UserId) -> RepositoryResult<Option<User>> {
        Ok(self.users.read().await.get(&id).cloned())
    }

    async fn find_by_email(&self, email: UserEmail) -> RepositoryResult<Option<User>> {
        let guard = self.users.read().await;
        Ok(guard.values().find(|u| u.email == email).cloned())
    }

    async fn find_by_username(&self, username: Username) -> RepositoryResult<Option<User>> {
        let guard = self.users.read().await;
        Ok(guard.values().find(|u| u.username == username).cloned())
    }
}

#[derive(Default, Clone)]
pub struct InMemoryChatRoomRepository {
    rooms: Arc<RwLock<HashMap<RoomId, ChatRoom>>>,
}

impl InMemoryChatRoomRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ChatRoomRepository for InMemoryChatRoomRepository {
    async fn create(&self, room: ChatRoom) -> RepositoryResult<ChatRoom> {
        let mut guard = self.rooms.write().await;
        if guard.contains_key(&room.id) {
            return Err(RepositoryError::Conflict);
        }
        guard.insert(room.id, room.clone());
        Ok(room)
    }

    async fn find_by_id(&self, id: RoomId) -> RepositoryResult<Option<ChatRoom>> {
        Ok(self.rooms.read().await.get(&id).cloned())
    }

    async fn list_all(&self) -> RepositoryResult<Vec<ChatRoom>> {
        let mut rooms: Vec<ChatRoom> = self.rooms.read().await.values().cloned().collect();
        rooms.sort_by_key(|room| room.created_at);
        Ok(rooms)
    }
}

#[derive(Default, Clone)]
pub struct InMemoryRoomMemberRepository {
    members: Arc<RwLock<HashSet<(RoomId, UserId)>>>,
}

impl InMemoryRoomMemberRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// 房间当前的成员数
    pub async fn count(&self, room_id: RoomId) -> usize {
        let guard = self.members.read().await;
        guard.iter().filter(|(room, _)| *room == room_id).count()
    }
}

#[async_trait]
impl RoomMemberRepository for InMemoryRoomMemberRepository {
    async fn add(&self, member: RoomMember) -> RepositoryResult<bool> {
        Ok(self
            .members
            .write()
            .await
            .insert((member.room_id, member.user_id)))
    }

    async fn exists(&self, room_id: RoomId, user_id: UserId) -> RepositoryResult<bool> {
        Ok(self.members.read().await.contains(&(room_id, user_id)))
    }
}

#[derive(Default, Clone)]
pub struct InMemoryMessageRepository {
    messages: Arc<RwLock<HashMap<RoomId, Vec<Message>>>>,
}

impl InMemoryMessageRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl MessageRepository for InMemoryMessageRepository {
    async fn create(&self, message: Message) -> RepositoryResult<Message> {
        let mut guard = self.messages.write().await;
        let room = guard.entry(message.room_id).or_default();
        // 按 created_at 有序插入，相同时间保持写入顺序
        let position = room.partition_point(|m| m.created_at <= message.created_at);
        room.insert(position, message.clone());
        Ok(message)
    }

    async fn list_recent(&self, room_id: RoomId, limit: u32) -> RepositoryResult<Vec<Message>> {
        let guard = self.messages.read().await;
        let Some(room) = guard.get(&room_id) else {
            return Ok(Vec::new());
        };
        let skip = room.len().saturating_sub(limit as usize);
        Ok(room[skip..].to_vec())
    }
}

/// 共享的内存仓储集合
#[derive(Default, Clone)]
pub struct InMemoryStorage {
    pub user_repository: Arc<InMemoryUserRepository>,
    pub room_repository: Arc<InMemoryChatRoomRepository>,
    pub member_repository: Arc<InMemoryRoomMemberRepository>,
    pub message_repository: Arc<InMemoryMessageRepository>,
}

impl InMemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, Utc};
    use domain::{MessageContent, MessageId};
    use uuid::Uuid;

    fn message(room_id: RoomId, content: &str, at: domain::Timestamp) -> Message {
        Message::new(
            MessageId::from(Uuid::new_v4()),
            room_id,
            UserId::from(Uuid::new_v4()),
            "alice",
            MessageContent::new(content).unwrap(),
            at,
        )
    }

    #[tokio::test]
    async fn membership_insert_reports_whether_it_was_new() {
        let repo = InMemoryRoomMemberRepository::new();
        let room_id = RoomId::from(Uuid::new_v4());
        let user_id = UserId::from(Uuid::new_v4());
        let member = RoomMember::new(room_id, user_id, Utc::now());

        assert!(repo.add(member.clone()).await.unwrap());
        assert!(!repo.add(member).await.unwrap());
        assert!(repo.exists(room_id, user_id).await.unwrap());
        assert_eq!(repo.count(room_id).await, 1);
    }

    #[tokio::test]
    async fn recent_messages_are_the_newest_in_ascending_order() {
        let repo = InMemoryMessageRepository::new();
        let room_id = RoomId::from(Uuid::new_v4());
        let start = Utc::now();
        for (offset, content) in [(2, "third"), (0, "first"), (1, "second")] {
            repo.create(message(room_id, content, start + Duration::seconds(offset)))
                .await
                .unwrap();
        }

        let recent = repo.list_recent(room_id, 2).await.unwrap();
        let contents: Vec<&str> = recent.iter().map(|m| m.content.as_str()).collect();
        assert_eq!(contents, ["second", "third"]);

        let all = repo.list_recent(room_id, 50).await.unwrap();
        assert_eq!(all.len(), 3);
        assert!(repo
            .list_recent(RoomId::from(Uuid::new_v4()), 10)
            .await
            .unwrap()
            .is_empty());
    }
}
