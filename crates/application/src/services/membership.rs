use std::sync::Arc;

use domain::{
    ChatRoom, ChatRoomRepository, RepositoryError, RoomId, RoomMember, RoomMemberRepository,
    UserId,
};
use tracing::{debug, info};
use uuid::Uuid;

use crate::{clock::Clock, error::ApplicationError};

pub struct MembershipGuardDependencies {
    pub room_repository: Arc<dyn ChatRoomRepository>,
    pub member_repository: Arc<dyn RoomMemberRepository>,
    pub clock: Arc<dyn Clock>,
}

/// 房间成员守卫：判断用户能否在房间中读写，并负责幂等加入。
pub struct MembershipGuard {
    deps: MembershipGuardDependencies,
}

impl MembershipGuard {
    pub fn new(deps: MembershipGuardDependencies) -> Self {
        Self { deps }
    }

    /// 确保用户是房间成员，已是成员时同样成功
    pub async fn ensure_member(
        &self,
        room_id: RoomId,
        user_id: UserId,
    ) -> Result<(), ApplicationError> {
        self.join(room_id, user_id).await.map(|_| ())
    }

    pub async fn is_member(&self, room_id: RoomId, user_id: UserId) -> Result<bool, ApplicationError> {
        Ok(self.deps.member_repository.exists(room_id, user_id).await?)
    }

    /// 创建房间并让创建者自动加入
    pub async fn create_room(
        &self,
        name: String,
        description: String,
        creator_id: UserId,
    ) -> Result<ChatRoom, ApplicationError> {
        let room = ChatRoom::new(
            RoomId::from(Uuid::new_v4()),
            name,
            description,
            creator_id,
            self.deps.clock.now(),
        )?;
        let room = self.deps.room_repository.create(room).await?;
        self.add_member(room.id, creator_id).await?;

        info!(room_id = %room.id, created_by = %creator_id, "room created");
        Ok(room)
    }

    pub async fn list_rooms(&self) -> Result<Vec<ChatRoom>, ApplicationError> {
        Ok(self.deps.room_repository.list_all().await?)
    }

    pub async fn require_room(&self, room_id: RoomId) -> Result<ChatRoom, ApplicationError> {
        self.deps
            .room_repository
            .find_by_id(room_id)
            .await?
            .ok_or(ApplicationError::RoomNotFound)
    }

    /// 返回成员关系是否为本次新建
    pub(crate) async fn join(&self, room_id: RoomId, user_id: UserId) -> Result<bool, ApplicationError> {
        self.require_room(room_id).await?;
        self.add_member(room_id, user_id).await
    }

    async fn add_member(&self, room_id: RoomId, user_id: UserId) -> Result<bool, ApplicationError> {
        let member = RoomMember::new(room_id, user_id, self.deps.clock.now());
        match self.deps.member_repository.add(member).await {
            Ok(created) => Ok(created),
            Err(RepositoryError::Conflict) => {
                debug!(room_id = %room_id, user_id = %user_id, "membership insert lost race");
                Ok(false)
            }
            Err(err) => Err(err.into()),
        }
    }
}
