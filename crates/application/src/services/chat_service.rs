use std::sync::Arc;

use domain::{
    ChatRoom, Message, MessageContent, MessageId, MessageRepository, RoomEvent, RoomId, UserId,
};
use tracing::debug;
use uuid::Uuid;

use crate::{
    clock::Clock, error::ApplicationError, publisher::FanoutDispatcher,
    services::membership::MembershipGuard,
};
pub const DEFAULT_HISTORY_LIMIT: u32 = 50;
pub const MAX_HISTORY_LIMIT: u32 = 100;

#[derive(Debug, Clone)]
pub struct SendMessageRequest {
    pub room_id: Uuid,
    pub user_id: Uuid,
    /// 发送时刻的用户名快照，由调用方提供
    pub username: String,
    pub content: String,
}

pub struct ChatServiceDependencies {
    pub membership: Arc<MembershipGuard>,
    pub message_repository: Arc<dyn MessageRepository>,
    pub dispatcher: FanoutDispatcher,
    pub clock: Arc<dyn Clock>,
}

/// 消息管道：校验、持久化、异步扇出。
pub struct ChatService {
    deps: ChatServiceDependencies,
}

impl ChatService {
    pub fn new(deps: ChatServiceDependencies) -> Self {
        Self { deps }
    }

    pub async fn create_room(
        &self,
        name: String,
        description: String,
        creator_id: Uuid,
    ) -> Result<ChatRoom, ApplicationError> {
        self.deps
            .membership
            .create_room(name, description, UserId::from(creator_id))
            .await
    }

    pub async fn list_rooms(&self) -> Result<Vec<ChatRoom>, ApplicationError> {
        self.deps.membership.list_rooms().await
    }

    /// 加入房间。只有新建成员关系时才通知房间订阅者
    pub async fn join_room(&self, room_id: Uuid, user_id: Uuid) -> Result<(), ApplicationError> {
        let room_id = RoomId::from(room_id);
        let user_id = UserId::from(user_id);

        let created = self.deps.membership.join(room_id, user_id).await?;
        if created {
            let event = RoomEvent::user_joined(room_id, user_id, self.deps.clock.now());
            self.deps.dispatcher.dispatch(event);
        } else {
            debug!(room_id = %room_id, user_id = %user_id, "already a member");
        }
        Ok(())
    }

    pub async fn send_message(&self, request: SendMessageRequest) -> Result<Message, ApplicationError> {
        let content = MessageContent::new(request.content)
            .map_err(|err| ApplicationError::InvalidMessage(err.reason().to_owned()))?;
        let room_id = RoomId::from(request.room_id);
        let user_id = UserId::from(request.user_id);

        let membership = &self.deps.membership;
        membership.require_room(room_id).await?;
        if !membership.is_member(room_id, user_id).await? {
            return Err(ApplicationError::NotRoomMember);
        }

        let message = Message::new(
            MessageId::from(Uuid::new_v4()),
            room_id,
            user_id,
            request.username,
            content,
            self.deps.clock.now(),
        );
        let stored = self.deps.message_repository.create(message).await?;

        self.deps.dispatcher.dispatch(RoomEvent::message(&stored));
        Ok(stored)
    }

    /// 读取房间最近的消息，按时间升序。读取不检查成员关系
    pub async fn get_room_messages(
        &self,
        room_id: Uuid,
        limit: i64,
    ) -> Result<Vec<Message>, ApplicationError> {
        let room_id = RoomId::from(room_id);
        self.deps.membership.require_room(room_id).await?;

        self.deps
            .message_repository
            .list_recent(room_id, clamp_limit(limit))
            .await
            .map_err(Into::into)
    }
}

pub(crate) fn clamp_limit(limit: i64) -> u32 {
    if limit <= 0 {
        DEFAULT_HISTORY_LIMIT
    } else if limit > i64::from(MAX_HISTORY_LIMIT) {
        MAX_HISTORY_LIMIT
    } else {
        limit as u32
    }
}
