//! 统一配置中心
//!
//! 配置按以下顺序叠加，后者覆盖前者：
//! - 开发默认值
//! - 兼容旧部署的扁平环境变量（`JWT_SECRET_KEY`、`DATABASE_URL` 等）
//! - `ROOMCAST_` 前缀的嵌套环境变量，层级用 `__` 分隔

use std::time::Duration;

use figment::{
    providers::{Env, Serialized},
    Figment,
};
use serde::{Deserialize, Serialize};

/// 未配置密钥时使用的默认值，只能用于本地开发
pub const DEFAULT_JWT_SECRET: &str = "your-default-secret-key-change-in-production";
pub const MIN_JWT_SECRET_LEN: usize = 32;
pub const ENV_PREFIX: &str = "ROOMCAST_";

/// 旧部署使用的扁平环境变量与配置路径的对应关系
const LEGACY_ENV: &[(&str, &str)] = &[
    ("JWT_SECRET_KEY", "jwt.secret"),
    ("DATABASE_URL", "database.url"),
    ("CENTRIFUGO_URL", "publisher.centrifugo_url"),
    ("CENTRIFUGO_API_KEY", "publisher.centrifugo_api_key"),
    ("REDIS_URL", "publisher.redis_url"),
    ("PORT", "server.port"),
];

/// 全局应用配置
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AppConfig {
    pub database: DatabaseConfig,
    pub jwt: JwtConfig,
    pub publisher: PublisherConfig,
    pub server: ServerConfig,
}

/// 数据库配置。`url` 为空时使用内存存储
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DatabaseConfig {
    pub url: Option<String>,
    pub max_connections: u32,
    pub timeout_secs: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JwtConfig {
    pub secret: String,
    pub expiration_hours: i64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PublisherKind {
    Centrifugo,
    Redis,
    None,
}

/// 扇出发布配置
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PublisherConfig {
    pub kind: PublisherKind,
    pub centrifugo_url: String,
    pub centrifugo_api_key: String,
    pub redis_url: String,
    pub timeout_secs: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// 为 true 时配置校验失败会阻止启动
    pub strict: bool,
    pub bcrypt_cost: Option<u32>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            database: DatabaseConfig {
                url: None,
                max_connections: 5,
                timeout_secs: 5,
            },
            jwt: JwtConfig {
                secret: DEFAULT_JWT_SECRET.to_string(),
                expiration_hours: 24,
            },
            publisher: PublisherConfig {
                kind: PublisherKind::Centrifugo,
                centrifugo_url: "http://localhost:8000".to_string(),
                centrifugo_api_key: String::new(),
                redis_url: "redis://127.0.0.1:6379".to_string(),
                timeout_secs: 5,
            },
            server: ServerConfig {
                host: "0.0.0.0".to_string(),
                port: 8080,
                strict: false,
                bcrypt_cost: None,
            },
        }
    }
}

impl AppConfig {
    /// 组合默认值与环境变量来源
    pub fn figment() -> Figment {
        let mut figment = Figment::new().merge(Serialized::defaults(AppConfig::default()));
        for &(var, path) in LEGACY_ENV {
            figment = figment.merge(Env::raw().only(&[var]).map(move |_| path.into()));
        }
        figment.merge(Env::prefixed(ENV_PREFIX).split("__"))
    }

    /// 从环境加载配置，不做安全校验
    pub fn load() -> Result<Self, ConfigError> {
        Ok(Self::figment().extract()?)
    }

    /// 检查不适合部署的配置
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.jwt.secret == DEFAULT_JWT_SECRET {
            return Err(ConfigError::InvalidJwtSecret(
                "the built-in default secret must not be used outside development".to_string(),
            ));
        }
        if self.jwt.secret.len() < MIN_JWT_SECRET_LEN {
            return Err(ConfigError::InvalidJwtSecret(format!(
                "JWT secret must be at least {MIN_JWT_SECRET_LEN} characters long"
            )));
        }
        if self.jwt.expiration_hours <= 0 {
            return Err(ConfigError::InvalidTokenLifetime(
                "token lifetime must be positive".to_string(),
            ));
        }
        if self.database.timeout_secs == 0 || self.publisher.timeout_secs == 0 {
            return Err(ConfigError::InvalidTimeout(
                "store and publish timeouts must be greater than 0".to_string(),
            ));
        }
        if self.database.max_connections == 0 {
            return Err(ConfigError::InvalidDatabaseConfig(
                "Max connections must be greater than 0".to_string(),
            ));
        }
        if let Some(cost) = self.server.bcrypt_cost {
            if !(10..=14).contains(&cost) {
                return Err(ConfigError::InvalidServerConfig(
                    "bcrypt cost should be between 10-14 for security".to_string(),
                ));
            }
        }
        Ok(())
    }

    pub fn store_timeout(&self) -> Duration {
        Duration::from_secs(self.database.timeout_secs)
    }

    pub fn publish_timeout(&self) -> Duration {
        Duration::from_secs(self.publisher.timeout_secs)
    }
}

impl DatabaseConfig {
    /// 去掉凭据后的连接串，用于日志
    pub fn redacted_url(&self) -> Option<String> {
        self.url.as_deref().map(redact_credentials)
    }
}

fn redact_credentials(url: &str) -> String {
    let Some((scheme, rest)) = url.split_once("://") else {
        return url.to_string();
    };
    match rest.rsplit_once('@') {
        Some((_, host)) => format!("{scheme}://***@{host}"),
        None => url.to_string(),
    }
}

/// 配置错误类型
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to load configuration: {0}")]
    Load(#[from] figment::Error),
    #[error("Invalid JWT secret: {0}")]
    InvalidJwtSecret(String),
    #[error("Invalid token lifetime: {0}")]
    InvalidTokenLifetime(String),
    #[error("Invalid timeout: {0}")]
    InvalidTimeout(String),
    #[error("Invalid database configuration: {0}")]
    InvalidDatabaseConfig(String),
    #[error("Invalid server configuration: {0}")]
    InvalidServerConfig(String),
}

#[cfg(test)]
mod tests {
    use super::*;
    use figment::Jail;

    const STRONG_SECRET: &str = "production-grade-secret-key-with-sufficient-length";

    #[test]
    fn defaults_apply_without_environment() {
        Jail::expect_with(|_jail| {
            let config: AppConfig = AppConfig::figment().extract()?;
            assert_eq!(config, AppConfig::default());
            assert_eq!(config.jwt.secret, DEFAULT_JWT_SECRET);
            assert_eq!(config.jwt.expiration_hours, 24);
            assert_eq!(config.server.port, 8080);
            assert_eq!(config.publisher.centrifugo_url, "http://localhost:8000");
            assert_eq!(config.store_timeout(), Duration::from_secs(5));
            assert!(config.database.url.is_none());
            Ok(())
        });
    }

    #[test]
    fn legacy_variables_are_honoured() {
        Jail::expect_with(|jail| {
            jail.set_env("JWT_SECRET_KEY", STRONG_SECRET);
            jail.set_env("DATABASE_URL", "postgres://chat:pw@db:5432/chat");
            jail.set_env("CENTRIFUGO_URL", "http://centrifugo:8000");
            jail.set_env("CENTRIFUGO_API_KEY", "api-key");
            jail.set_env("PORT", "9090");

            let config: AppConfig = AppConfig::figment().extract()?;
            assert_eq!(config.jwt.secret, STRONG_SECRET);
            assert_eq!(
                config.database.url.as_deref(),
                Some("postgres://chat:pw@db:5432/chat")
            );
            assert_eq!(config.publisher.centrifugo_url, "http://centrifugo:8000");
            assert_eq!(config.publisher.centrifugo_api_key, "api-key");
            assert_eq!(config.server.port, 9090);
            Ok(())
        });
    }

    #[test]
    fn prefixed_variables_override_legacy_ones() {
        Jail::expect_with(|jail| {
            jail.set_env("PORT", "9090");
            jail.set_env("ROOMCAST_SERVER__PORT", "7070");
            jail.set_env("ROOMCAST_PUBLISHER__KIND", "redis");
            jail.set_env("ROOMCAST_SERVER__STRICT", "true");

            let config: AppConfig = AppConfig::figment().extract()?;
            assert_eq!(config.server.port, 7070);
            assert_eq!(config.publisher.kind, PublisherKind::Redis);
            assert!(config.server.strict);
            Ok(())
        });
    }

    #[test]
    fn default_secret_is_a_deployment_error() {
        let config = AppConfig::default();
        let err = config.validate().unwrap_err();
        assert!(matches!(err, ConfigError::InvalidJwtSecret(_)));
    }

    #[test]
    fn validation_rules() {
        let mut config = AppConfig::default();
        config.jwt.secret = STRONG_SECRET.to_string();
        assert!(config.validate().is_ok());

        config.jwt.secret = "short".to_string();
        assert!(config.validate().is_err());
        config.jwt.secret = STRONG_SECRET.to_string();

        config.jwt.expiration_hours = 0;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidTokenLifetime(_))
        ));
        config.jwt.expiration_hours = 24;

        config.database.timeout_secs = 0;
        assert!(matches!(config.validate(), Err(ConfigError::InvalidTimeout(_))));
        config.database.timeout_secs = 5;

        config.publisher.timeout_secs = 0;
        assert!(matches!(config.validate(), Err(ConfigError::InvalidTimeout(_))));
        config.publisher.timeout_secs = 5;

        config.database.max_connections = 0;
        assert!(config.validate().is_err());
        config.database.max_connections = 5;

        config.server.bcrypt_cost = Some(8);
        assert!(config.validate().is_err());
        config.server.bcrypt_cost = Some(12);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn database_url_is_logged_without_credentials() {
        let mut database = AppConfig::default().database;
        assert_eq!(database.redacted_url(), None);

        database.url = Some("postgres://chat:hunter2@db:5432/chat".to_string());
        assert_eq!(
            database.redacted_url().as_deref(),
            Some("postgres://***@db:5432/chat")
        );

        database.url = Some("postgres://db:5432/chat".to_string());
        assert_eq!(
            database.redacted_url().as_deref(),
            Some("postgres://db:5432/chat")
        );
    }
}
