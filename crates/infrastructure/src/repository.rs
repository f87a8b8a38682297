//! PostgreSQL 仓储实现
//!
//! 每次调用都受存储超时约束，超时返回 `RepositoryError::Timeout`。

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use domain::{
    ChatRoom, ChatRoomRepository, Message, MessageContent, MessageId, MessageRepository,
    PasswordHash, RepositoryError, RepositoryResult, RoomId, RoomMember, RoomMemberRepository,
    Timestamp, User, UserEmail, UserId, UserRepository, Username,
};
use sqlx::{postgres::PgPoolOptions, FromRow, PgPool};
use uuid::Uuid;

fn map_sqlx_err(err: sqlx::Error) -> RepositoryError {
    match &err {
        sqlx::Error::Database(db) if db.is_unique_violation() => RepositoryError::Conflict,
        sqlx::Error::RowNotFound => RepositoryError::NotFound,
        _ => RepositoryError::storage(err.to_string()),
    }
}

fn invalid_data(message: impl Into<String>) -> RepositoryError {
    RepositoryError::storage(message)
}

/// 在超时内执行一次存储调用
async fn bounded<T, F>(limit: Duration, call: F) -> RepositoryResult<T>
where
    F: Future<Output = Result<T, sqlx::Error>>,
{
    match tokio::time::timeout(limit, call).await {
        Ok(result) => result.map_err(map_sqlx_err),
        Err(_) => Err(RepositoryError::Timeout {
            millis: limit.as_millis() as u64,
        }),
    }
}

#[derive(Debug, FromRow)]
struct UserRecord {
    id: Uuid,
    username: String,
    email: String,
    password_hash: String,
    created_at: Timestamp,
    updated_at: Timestamp,
}

impl TryFrom<UserRecord> for User {
    type Error = RepositoryError;

    fn try_from(value: UserRecord) -> Result<Self, Self::Error> {
        let username = Username::parse(value.username).map_err(|err| invalid_data(err.to_string()))?;
        let email = UserEmail::parse(value.email).map_err(|err| invalid_data(err.to_string()))?;
        let password =
            PasswordHash::new(value.password_hash).map_err(|err| invalid_data(err.to_string()))?;

        Ok(User {
            id: UserId::from(value.id),
            username,
            email,
            password,
            created_at: value.created_at,
            updated_at: value.updated_at,
        })
    }
}

#[derive(Debug, FromRow)]
struct RoomRecord {
    id: Uuid,
    name: String,
    description: String,
    created_by: Uuid,
    created_at: Timestamp,
    updated_at: Timestamp,
}

impl From<RoomRecord> for ChatRoom {
    fn from(value: RoomRecord) -> Self {
        ChatRoom {
            id: RoomId::from(value.id),
            name: value.name,
            description: value.description,
            created_by: UserId::from(value.created_by),
            created_at: value.created_at,
            updated_at: value.updated_at,
        }
    }
}

#[derive(Debug, FromRow)]
struct MessageRecord {
    id: Uuid,
    room_id: Uuid,
    user_id: Uuid,
    username: String,
    content: String,
    created_at: Timestamp,
}

impl TryFrom<MessageRecord> for Message {
    type Error = RepositoryError;

    fn try_from(value: MessageRecord) -> Result<Self, Self::Error> {
        let content =
            MessageContent::new(value.content).map_err(|err| invalid_data(err.to_string()))?;
        Ok(Message {
            id: MessageId::from(value.id),
            room_id: RoomId::from(value.room_id),
            user_id: UserId::from(value.user_id),
            username: value.username,
            content,
            created_at: value.created_at,
        })
    }
}

const USER_COLUMNS: &str = "id, username, email, password_hash, created_at, updated_at";
const ROOM_COLUMNS: &str = "id, name, description, created_by, created_at, updated_at";
const MESSAGE_COLUMNS: &str = "id, room_id, user_id, username, content, created_at";

#[derive(Clone)]
pub struct PgUserRepository {
    pool: PgPool,
    timeout: Duration,
}

impl PgUserRepository {
    pub fn new(pool: PgPool, timeout: Duration) -> Self {
        Self { pool, timeout }
    }

    async fn find_one(&self, column: &str, value: String) -> RepositoryResult<Option<User>> {
        let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE {column} = $1");
        let record = bounded(
            self.timeout,
            sqlx::query_as::<_, UserRecord>(&sql)
                .bind(value)
                .fetch_optional(&self.pool),
        )
        .await?;

        record.map(User::try_from).transpose()
    }
}

#[async_trait]
impl UserRepository for PgUserRepository {
    async fn create(&self, user: User) -> RepositoryResult<User> {
        let sql = format!(
            "INSERT INTO users ({USER_COLUMNS}) VALUES ($1, $2, $3, $4, $5, $6) RETURNING {USER_COLUMNS}"
        );
        let record = bounded(
            self.timeout,
            sqlx::query_as::<_, UserRecord>(&sql)
                .bind(Uuid::from(user.id))
                .bind(user.username.as_str())
                .bind(user.email.as_str())
                .bind(user.password.as_str())
                .bind(user.created_at)
                .bind(user.updated_at)
                .fetch_one(&self.pool),
        )
        .await?;

        User::try_from(record)
    }

    async fn find_by_id(&self, id: UserId) -> RepositoryResult<Option<User>> {
        let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE id = $1");
        let record = bounded(
            self.timeout,
            sqlx::query_as::<_, UserRecord>(&sql)
                .bind(Uuid::from(id))
                .fetch_optional(&self.pool),
        )
        .await?;

        record.map(User::try_from).transpose()
    }

    async fn find_by_email(&self, email: UserEmail) -> RepositoryResult<Option<User>> {
        self.find_one("email", email.as_str().to_owned()).await
    }

    async fn find_by_username(&self, username: Username) -> RepositoryResult<Option<User>> {
        self.find_one("username", username.as_str().to_owned()).await
    }
}

#[derive(Clone)]
pub struct PgChatRoomRepository {
    pool: PgPool,
    timeout: Duration,
}

impl PgChatRoomRepository {
    pub fn new(pool: PgPool, timeout: Duration) -> Self {
        Self { pool, timeout }
    }
}

#[async_trait]
impl ChatRoomRepository for PgChatRoomRepository {
    async fn create(&self, room: ChatRoom) -> RepositoryResult<ChatRoom> {
        let sql = format!(
            "INSERT INTO chat_rooms ({ROOM_COLUMNS}) VALUES ($1, $2, $3, $4, $5, $6) RETURNING {ROOM_COLUMNS}"
        );
        let record = bounded(
            self.timeout,
            sqlx::query_as::<_, RoomRecord>(&sql)
                .bind(Uuid::from(room.id))
                .bind(&room.name)
                .bind(&room.description)
                .bind(Uuid::from(room.created_by))
                .bind(room.created_at)
                .bind(room.updated_at)
                .fetch_one(&self.pool),
        )
        .await?;

        Ok(record.into())
    }

    async fn find_by_id(&self, id: RoomId) -> RepositoryResult<Option<ChatRoom>> {
        let sql = format!("SELECT {ROOM_COLUMNS} FROM chat_rooms WHERE id = $1");
        let record = bounded(
            self.timeout,
            sqlx::query_as::<_, RoomRecord>(&sql)
                .bind(Uuid::from(id))
                .fetch_optional(&self.pool),
        )
        .await?;

        Ok(record.map(ChatRoom::from))
    }

    async fn list_all(&self) -> RepositoryResult<Vec<ChatRoom>> {
        let sql = format!("SELECT {ROOM_COLUMNS} FROM chat_rooms ORDER BY created_at ASC");
        let records = bounded(
            self.timeout,
            sqlx::query_as::<_, RoomRecord>(&sql).fetch_all(&self.pool),
        )
        .await?;

        Ok(records.into_iter().map(ChatRoom::from).collect())
    }
}

#[derive(Clone)]
pub struct PgRoomMemberRepository {
    pool: PgPool,
    timeout: Duration,
}

impl PgRoomMemberRepository {
    pub fn new(pool: PgPool, timeout: Duration) -> Self {
        Self { pool, timeout }
    }
}

#[async_trait]
impl RoomMemberRepository for PgRoomMemberRepository {
    async fn add(&self, member: RoomMember) -> RepositoryResult<bool> {
        let result = bounded(
            self.timeout,
            sqlx::query(
                r#"
                INSERT INTO room_members (room_id, user_id, joined_at)
                VALUES ($1, $2, $3)
                ON CONFLICT (room_id, user_id) DO NOTHING
                "#,
            )
            .bind(Uuid::from(member.room_id))
            .bind(Uuid::from(member.user_id))
            .bind(member.joined_at)
            .execute(&self.pool),
        )
        .await?;

        Ok(result.rows_affected() == 1)
    }

    async fn exists(&self, room_id: RoomId, user_id: UserId) -> RepositoryResult<bool> {
        bounded(
            self.timeout,
            sqlx::query_scalar::<_, bool>(
                r#"SELECT EXISTS (SELECT 1 FROM room_members WHERE room_id = $1 AND user_id = $2)"#,
            )
            .bind(Uuid::from(room_id))
            .bind(Uuid::from(user_id))
            .fetch_one(&self.pool),
        )
        .await
    }
}

#[derive(Clone)]
pub struct PgMessageRepository {
    pool: PgPool,
    timeout: Duration,
}

impl PgMessageRepository {
    pub fn new(pool: PgPool, timeout: Duration) -> Self {
        Self { pool, timeout }
    }
}

#[async_trait]
impl MessageRepository for PgMessageRepository {
    async fn create(&self, message: Message) -> RepositoryResult<Message> {
        let sql = format!(
            "INSERT INTO messages ({MESSAGE_COLUMNS}) VALUES ($1, $2, $3, $4, $5, $6) RETURNING {MESSAGE_COLUMNS}"
        );
        let record = bounded(
            self.timeout,
            sqlx::query_as::<_, MessageRecord>(&sql)
                .bind(Uuid::from(message.id))
                .bind(Uuid::from(message.room_id))
                .bind(Uuid::from(message.user_id))
                .bind(&message.username)
                .bind(message.content.as_str())
                .bind(message.created_at)
                .fetch_one(&self.pool),
        )
        .await?;

        Message::try_from(record)
    }

    async fn list_recent(&self, room_id: RoomId, limit: u32) -> RepositoryResult<Vec<Message>> {
        // 先取最新的 limit 条，再按时间正序返回
        let sql = format!(
            "SELECT {MESSAGE_COLUMNS} FROM (
                SELECT {MESSAGE_COLUMNS} FROM messages
                WHERE room_id = $1
                ORDER BY created_at DESC, id DESC
                LIMIT $2
            ) recent
            ORDER BY created_at ASC, id ASC"
        );
        let records = bounded(
            self.timeout,
            sqlx::query_as::<_, MessageRecord>(&sql)
                .bind(Uuid::from(room_id))
                .bind(i64::from(limit))
                .fetch_all(&self.pool),
        )
        .await?;

        records.into_iter().map(Message::try_from).collect()
    }
}

/// 共享同一个连接池的全部仓储
#[derive(Clone)]
pub struct PgStorage {
    pub pool: PgPool,
    pub user_repository: Arc<PgUserRepository>,
    pub room_repository: Arc<PgChatRoomRepository>,
    pub member_repository: Arc<PgRoomMemberRepository>,
    pub message_repository: Arc<PgMessageRepository>,
}

impl PgStorage {
    pub fn new(pool: PgPool, timeout: Duration) -> Self {
        Self {
            user_repository: Arc::new(PgUserRepository::new(pool.clone(), timeout)),
            room_repository: Arc::new(PgChatRoomRepository::new(pool.clone(), timeout)),
            member_repository: Arc::new(PgRoomMemberRepository::new(pool.clone(), timeout)),
            message_repository: Arc::new(PgMessageRepository::new(pool.clone(), timeout)),
            pool,
        }
    }
}

pub async fn create_pg_pool(
    database_url: &str,
    max_connections: u32,
    acquire_timeout: Duration,
) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(max_connections)
        .acquire_timeout(acquire_timeout)
        .connect(database_url)
        .await
}
