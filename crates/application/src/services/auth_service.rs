use std::sync::Arc;

use domain::{RepositoryError, User, UserEmail, UserId, UserRepository, Username};
use tracing::{info, warn};
use uuid::Uuid;

use crate::{
    clock::Clock,
    error::ApplicationError,
    identity::Identity,
    password::PasswordHasher,
    token::{JwtTokenService, TokenError},
};
pub const MIN_PASSWORD_CHARS: usize = 6;

#[derive(Debug, Clone)]
pub struct RegisterRequest {
    pub username: String,
    pub email: String,
    pub password: String,
}

#[derive(Debug, Clone)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// 注册或登录成功后的结果
#[derive(Debug, Clone)]
pub struct AuthSession {
    pub user: User,
    pub token: String,
}

pub struct AuthServiceDependencies {
    pub user_repository: Arc<dyn UserRepository>,
    pub password_hasher: Arc<dyn PasswordHasher>,
    pub token_service: Arc<JwtTokenService>,
    pub clock: Arc<dyn Clock>,
}

pub struct AuthService {
    deps: AuthServiceDependencies,
}

impl AuthService {
    pub fn new(deps: AuthServiceDependencies) -> Self {
        Self { deps }
    }

    pub async fn register(&self, request: RegisterRequest) -> Result<AuthSession, ApplicationError> {
        if request.username.trim().is_empty()
            || request.email.trim().is_empty()
            || request.password.is_empty()
        {
            return Err(ApplicationError::validation(
                "username, email and password are required",
            ));
        }
        if request.password.chars().count() < MIN_PASSWORD_CHARS {
            return Err(ApplicationError::validation(format!(
                "password must be at least {MIN_PASSWORD_CHARS} characters"
            )));
        }
        let username = Username::parse(request.username)?;
        let email = UserEmail::parse(request.email)?;

        let repo = &self.deps.user_repository;
        if repo.find_by_email(email.clone()).await?.is_some() {
            return Err(ApplicationError::UserAlreadyExists);
        }
        if repo.find_by_username(username.clone()).await?.is_some() {
            return Err(ApplicationError::UserAlreadyExists);
        }

        let password_hash = self.deps.password_hasher.hash(&request.password).await?;
        let user = User::register(
            UserId::from(Uuid::new_v4()),
            username,
            email,
            password_hash,
            self.deps.clock.now(),
        );

        // 两次查询之间可能有并发注册，唯一约束兜底
        let stored = match repo.create(user).await {
            Ok(user) => user,
            Err(RepositoryError::Conflict) => return Err(ApplicationError::UserAlreadyExists),
            Err(err) => return Err(err.into()),
        };

        let token = self.issue(&stored)?;
        info!(user_id = %stored.id, "user registered");
        Ok(AuthSession {
            user: stored,
            token,
        })
    }

    /// 邮箱不存在与密码错误返回同一个错误
    pub async fn login(&self, request: LoginRequest) -> Result<AuthSession, ApplicationError> {
        if request.email.trim().is_empty() || request.password.is_empty() {
            return Err(ApplicationError::validation("email and password are required"));
        }
        let email =
            UserEmail::parse(request.email).map_err(|_| ApplicationError::InvalidCredentials)?;

        let user = self
            .deps
            .user_repository
            .find_by_email(email)
            .await?
            .ok_or(ApplicationError::InvalidCredentials)?;

        let password_ok = match self
            .deps
            .password_hasher
            .verify(&request.password, &user.password)
            .await
        {
            Ok(ok) => ok,
            Err(err) => {
                warn!(user_id = %user.id, error = %err, "password verification failed");
                false
            }
        };
        if !password_ok {
            return Err(ApplicationError::InvalidCredentials);
        }

        let token = self.issue(&user)?;
        Ok(AuthSession { user, token })
    }

    pub fn validate_token(&self, token: &str) -> Result<Identity, ApplicationError> {
        match self.deps.token_service.verify(token) {
            Ok(claims) => Ok(Identity {
                user_id: UserId::from(claims.user_id),
                username: claims.username,
            }),
            Err(TokenError::Expired) => Err(ApplicationError::ExpiredToken),
            Err(_) => Err(ApplicationError::InvalidToken),
        }
    }

    pub async fn get_user(&self, user_id: UserId) -> Result<User, ApplicationError> {
        self.deps
            .user_repository
            .find_by_id(user_id)
            .await?
            .ok_or(ApplicationError::UserNotFound)
    }

    fn issue(&self, user: &User) -> Result<String, ApplicationError> {
        self.deps
            .token_service
            .issue(user.id, user.username.as_str())
            .map_err(|err| ApplicationError::internal(err.to_string()))
    }
}
