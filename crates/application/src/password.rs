use async_trait::async_trait;
use domain::PasswordHash;
use thiserror::Error;

/// 哈希器内部故障。错误信息中不包含明文或摘要。
#[derive(Debug, Error)]
pub enum PasswordHasherError {
    #[error("failed to hash password: {0}")]
    Hash(String),
    #[error("failed to verify password: {0}")]
    Verify(String),
}

/// 单向密码哈希。
///
/// `hash` 每次调用使用随机盐，同一明文两次哈希的结果不同；
/// `verify` 在摘要不匹配时返回 `Ok(false)`。
#[async_trait]
pub trait PasswordHasher: Send + Sync {
    async fn hash(&self, plaintext: &str) -> Result<PasswordHash, PasswordHasherError>;
    async fn verify(&self, plaintext: &str, digest: &PasswordHash)
        -> Result<bool, PasswordHasherError>;
}
