//! 身份令牌签发与校验
//!
//! HS256 对称签名。过期判断使用注入的 [`Clock`]，而不是库内置的
//! 校验逻辑，这样 `now >= exp` 的边界和测试时间都由调用方控制。

use std::sync::Arc;

use chrono::Duration;
use domain::UserId;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use crate::clock::Clock;

/// 令牌声明
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    pub user_id: Uuid,
    pub username: String,
    /// 签发时间 (Unix timestamp)
    pub iat: i64,
    /// 过期时间 (Unix timestamp)
    pub exp: i64,
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TokenError {
    #[error("invalid token: {0}")]
    Invalid(String),
    #[error("token expired")]
    Expired,
    #[error("failed to sign token: {0}")]
    Signing(String),
}

/// JWT 令牌服务，密钥在启动时加载后只读。
#[derive(Clone)]
pub struct JwtTokenService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
    lifetime: Duration,
    clock: Arc<dyn Clock>,
}

impl JwtTokenService {
    pub fn new(secret: &str, lifetime: Duration, clock: Arc<dyn Clock>) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = false;
        validation.set_required_spec_claims(&["exp"]);

        Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            validation,
            lifetime,
            clock,
        }
    }

    /// 签发令牌，有效期从当前时刻开始计算
    pub fn issue(&self, user_id: UserId, username: &str) -> Result<String, TokenError> {
        let issued_at = self.clock.now();
        let claims = Claims {
            user_id: user_id.into(),
            username: username.to_owned(),
            iat: issued_at.timestamp(),
            exp: (issued_at + self.lifetime).timestamp(),
        };

        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)
            .map_err(|err| TokenError::Signing(err.to_string()))
    }

    /// 校验签名与有效期，成功时原样返回声明
    pub fn verify(&self, token: &str) -> Result<Claims, TokenError> {
        let claims = decode::<Claims>(token, &self.decoding_key, &self.validation)
            .map(|data| data.claims)
            .map_err(|err| TokenError::Invalid(err.to_string()))?;

        if self.clock.now().timestamp() >= claims.exp {
            return Err(TokenError::Expired);
        }
        Ok(claims)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use domain::Timestamp;

    const SECRET: &str = "0123456789abcdef0123456789abcdef";

    struct FixedClock(Timestamp);

    impl Clock for FixedClock {
        fn now(&self) -> Timestamp {
            self.0
        }
    }

    fn service_at(now: Timestamp) -> JwtTokenService {
        JwtTokenService::new(SECRET, Duration::hours(24), Arc::new(FixedClock(now)))
    }

    fn noon() -> Timestamp {
        Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap()
    }

    #[test]
    fn issued_token_round_trips_claims() {
        let service = service_at(noon());
        let user_id = UserId::from(Uuid::new_v4());

        let token = service.issue(user_id, "alice").unwrap();
        let claims = service.verify(&token).unwrap();

        assert_eq!(claims.user_id, Uuid::from(user_id));
        assert_eq!(claims.username, "alice");
        assert_eq!(claims.iat, noon().timestamp());
        assert_eq!(claims.exp, (noon() + Duration::hours(24)).timestamp());
    }

    #[test]
    fn token_is_expired_at_exact_expiry() {
        let token = service_at(noon())
            .issue(UserId::from(Uuid::new_v4()), "alice")
            .unwrap();

        let just_before = service_at(noon() + Duration::hours(24) - Duration::seconds(1));
        assert!(just_before.verify(&token).is_ok());

        let at_expiry = service_at(noon() + Duration::hours(24));
        assert_eq!(at_expiry.verify(&token), Err(TokenError::Expired));
    }

    #[test]
    fn wrong_secret_is_invalid() {
        let token = service_at(noon())
            .issue(UserId::from(Uuid::new_v4()), "alice")
            .unwrap();
        let other = JwtTokenService::new(
            "another-secret-another-secret-00",
            Duration::hours(24),
            Arc::new(FixedClock(noon())),
        );

        assert!(matches!(other.verify(&token), Err(TokenError::Invalid(_))));
    }

    #[test]
    fn unexpected_algorithm_is_invalid() {
        let claims = Claims {
            user_id: Uuid::new_v4(),
            username: "mallory".into(),
            iat: noon().timestamp(),
            exp: (noon() + Duration::hours(1)).timestamp(),
        };
        let token = encode(
            &Header::new(Algorithm::HS512),
            &claims,
            &EncodingKey::from_secret(SECRET.as_bytes()),
        )
        .unwrap();

        assert!(matches!(
            service_at(noon()).verify(&token),
            Err(TokenError::Invalid(_))
        ));
    }

    #[test]
    fn malformed_token_is_invalid() {
        let service = service_at(noon());
        assert!(matches!(service.verify("not-a-jwt"), Err(TokenError::Invalid(_))));
        assert!(matches!(service.verify(""), Err(TokenError::Invalid(_))));
    }
}
