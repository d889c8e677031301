use crate::config::AppConfig;
use crate::models::users::entities::UserRole;
use actix_web::cookie::{Cookie, SameSite};
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};

const REFRESH_COOKIE: &str = "refresh_token";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TokenKind {
    Access,
    Refresh,
}

// JWT Claims 结构体
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,          // 用户 ID
    pub role: UserRole,       // 签发时的角色
    pub token_type: TokenKind, // access / refresh
    pub exp: usize,
    pub iat: usize,
}

impl Claims {
    pub fn user_id(&self) -> Option<i64> {
        self.sub.parse().ok()
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
}

type JwtResult<T> = Result<T, jsonwebtoken::errors::Error>;

fn sign(
    user_id: i64,
    role: UserRole,
    kind: TokenKind,
    ttl: chrono::Duration,
    secret: &str,
) -> JwtResult<String> {
    let now = chrono::Utc::now();
    let claims = Claims {
        sub: user_id.to_string(),
        role,
        token_type: kind,
        exp: (now + ttl).timestamp() as usize,
        iat: now.timestamp() as usize,
    };
    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
}

fn verify(token: &str, kind: TokenKind, secret: &str) -> JwtResult<Claims> {
    let claims = decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::default(),
    )?
    .claims;

    if claims.token_type != kind {
        return Err(jsonwebtoken::errors::ErrorKind::InvalidToken.into());
    }
    Ok(claims)
}

pub struct JwtUtils;

impl JwtUtils {
    fn secret() -> &'static str {
        &AppConfig::get().jwt.secret
    }

    pub fn generate_access_token(user_id: i64, role: UserRole) -> JwtResult<String> {
        let minutes = AppConfig::get().jwt.access_token_expiry;
        sign(
            user_id,
            role,
            TokenKind::Access,
            chrono::Duration::minutes(minutes),
            Self::secret(),
        )
    }

    pub fn generate_token_pair(user_id: i64, role: UserRole) -> JwtResult<TokenPair> {
        let days = AppConfig::get().jwt.refresh_token_expiry;
        Ok(TokenPair {
            access_token: Self::generate_access_token(user_id, role)?,
            refresh_token: sign(
                user_id,
                role,
                TokenKind::Refresh,
                chrono::Duration::days(days),
                Self::secret(),
            )?,
        })
    }

    pub fn verify_access_token(token: &str) -> JwtResult<Claims> {
        verify(token, TokenKind::Access, Self::secret())
    }

    pub fn verify_refresh_token(token: &str) -> JwtResult<Claims> {
        verify(token, TokenKind::Refresh, Self::secret())
    }

    /// 创建 Refresh Token Cookie
    pub fn create_refresh_token_cookie(refresh_token: &str) -> Cookie<'static> {
        let config = AppConfig::get();
        Cookie::build(REFRESH_COOKIE, refresh_token.to_string())
            .path("/api/v1/auth")
            .max_age(actix_web::cookie::time::Duration::days(
                config.jwt.refresh_token_expiry,
            ))
            .same_site(SameSite::Strict)
            .http_only(true)
            .secure(config.is_production())
            .finish()
    }

    /// 过期的空 Cookie，用于清除
    pub fn create_empty_refresh_token_cookie() -> Cookie<'static> {
        let config = AppConfig::get();
        Cookie::build(REFRESH_COOKIE, "")
            .path("/api/v1/auth")
            .max_age(actix_web::cookie::time::Duration::seconds(0))
            .same_site(SameSite::Strict)
            .http_only(true)
            .secure(config.is_production())
            .finish()
    }

    pub fn extract_refresh_token_from_cookie(req: &actix_web::HttpRequest) -> Option<String> {
        req.cookie(REFRESH_COOKIE)
            .map(|cookie| cookie.value().to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &str = "unit-test-secret";

    #[test]
    fn test_sign_and_verify() {
        let token = sign(
            42,
            UserRole::Tutor,
            TokenKind::Access,
            chrono::Duration::minutes(5),
            SECRET,
        )
        .unwrap();
        let claims = verify(&token, TokenKind::Access, SECRET).unwrap();
        assert_eq!(claims.user_id(), Some(42));
        assert_eq!(claims.role, UserRole::Tutor);
    }

    #[test]
    fn test_kind_mismatch_rejected() {
        let token = sign(
            1,
            UserRole::Admin,
            TokenKind::Refresh,
            chrono::Duration::days(1),
            SECRET,
        )
        .unwrap();
        assert!(verify(&token, TokenKind::Access, SECRET).is_err());
        assert!(verify(&token, TokenKind::Refresh, "other-secret").is_err());
    }

    #[test]
    fn test_expired_rejected() {
        let token = sign(
            1,
            UserRole::Admin,
            TokenKind::Access,
            chrono::Duration::minutes(-10),
            SECRET,
        )
        .unwrap();
        assert!(verify(&token, TokenKind::Access, SECRET).is_err());
    }
}
