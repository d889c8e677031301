/*!
 * JWT 认证中间件
 *
 * 校验 `Authorization: Bearer <token>`，把当前用户放进请求扩展。
 * 维护模式开启时，非管理员用户在这里直接得到 503。
 *
 * ```rust,ignore
 * web::scope("/api/v1/schedule")
 *     .wrap(RequireJWT)
 *     .route("", web::get().to(week_view))
 * ```
 *
 * 处理函数中通过 `RequireJWT::extract_user_claims(&req)` 取用户。
 */

use crate::cache::{CacheResult, ObjectCache};
use crate::config::AppConfig;
use crate::models::users::entities::{User, UserRole};
use crate::models::ErrorCode;
use crate::services::maintenance;
use crate::storage::Storage;
use actix_service::{Service, Transform};
use actix_web::{
    Error, HttpMessage, HttpResponse,
    body::EitherBody,
    dev::{ServiceRequest, ServiceResponse},
    http::StatusCode,
    web::Data,
};
use futures_util::future::{LocalBoxFuture, Ready, ready};
use std::{rc::Rc, sync::Arc};
use tracing::{debug, info};

use super::create_error_response;

const BEARER_PREFIX: &str = "Bearer ";

#[derive(Clone)]
pub struct RequireJWT;

/// 认证失败的原因
enum AuthFailure {
    Unauthorized(String),
    Internal(&'static str),
}

fn bearer_token(req: &ServiceRequest) -> Option<&str> {
    req.headers()
        .get(actix_web::http::header::AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .and_then(|s| s.strip_prefix(BEARER_PREFIX))
        .map(str::trim)
        .filter(|s| !s.is_empty())
}

fn cache_key(user_id: i64, token: &str) -> String {
    // 令牌末尾的签名段足以区分同一用户的不同令牌
    let signature = token.rsplit('.').next().unwrap_or(token);
    format!("user:{user_id}:{signature}")
}

async fn authenticate(req: &ServiceRequest) -> Result<User, AuthFailure> {
    let token = bearer_token(req).ok_or_else(|| {
        AuthFailure::Unauthorized("Missing or invalid Authorization header".to_string())
    })?;

    let claims = crate::utils::jwt::JwtUtils::verify_access_token(token).map_err(|err| {
        info!("JWT token validation failed: {}", err);
        AuthFailure::Unauthorized("Invalid JWT token".to_string())
    })?;
    let user_id = claims
        .user_id()
        .ok_or_else(|| AuthFailure::Unauthorized("Invalid user ID in JWT".to_string()))?;

    let cache = req
        .app_data::<Data<Arc<dyn ObjectCache>>>()
        .map(|c| c.get_ref().clone())
        .ok_or(AuthFailure::Internal("Cache not configured"))?;
    let key = cache_key(user_id, token);

    match cache.get_json::<User>(&key).await {
        CacheResult::Found(user) => return Ok(user),
        CacheResult::ExistsButNoValue => cache.remove(&key).await,
        CacheResult::NotFound => debug!("User {} not cached", user_id),
    }

    let storage = req
        .app_data::<Data<Arc<dyn Storage>>>()
        .map(|s| s.get_ref().clone())
        .ok_or(AuthFailure::Internal("Storage not configured"))?;

    let user = storage
        .get_user_by_id(user_id)
        .await
        .map_err(|_| AuthFailure::Internal("Failed to retrieve user from storage"))?
        .ok_or_else(|| AuthFailure::Unauthorized("User not found".to_string()))?;

    if !user.is_active() {
        return Err(AuthFailure::Unauthorized("User is not active".to_string()));
    }

    cache
        .insert_json(key, &user, AppConfig::get().cache.default_ttl)
        .await;

    Ok(user)
}

impl<S, B> Transform<S, ServiceRequest> for RequireJWT
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type InitError = ();
    type Transform = RequireJWTMiddleware<S>;
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(RequireJWTMiddleware {
            service: Rc::new(service),
        }))
    }
}

pub struct RequireJWTMiddleware<S> {
    service: Rc<S>,
}

impl<S, B> Service<ServiceRequest> for RequireJWTMiddleware<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    fn poll_ready(
        &self,
        ctx: &mut std::task::Context<'_>,
    ) -> std::task::Poll<Result<(), Self::Error>> {
        self.service.poll_ready(ctx)
    }

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let srv = self.service.clone();
        Box::pin(async move {
            if req.method() == actix_web::http::Method::OPTIONS {
                return Ok(req.into_response(HttpResponse::NoContent().finish().map_into_right_body()));
            }

            let user = match authenticate(&req).await {
                Ok(user) => user,
                Err(AuthFailure::Unauthorized(reason)) => {
                    info!("JWT authentication failed for {}: {}", req.path(), reason);
                    return Ok(req.into_response(
                        create_error_response(
                            StatusCode::UNAUTHORIZED,
                            ErrorCode::Unauthorized,
                            &format!("Unauthorized: {reason}"),
                        )
                        .map_into_right_body(),
                    ));
                }
                Err(AuthFailure::Internal(reason)) => {
                    tracing::error!("JWT middleware misconfigured: {}", reason);
                    return Ok(req.into_response(
                        create_error_response(
                            StatusCode::INTERNAL_SERVER_ERROR,
                            ErrorCode::InternalServerError,
                            reason,
                        )
                        .map_into_right_body(),
                    ));
                }
            };

            if !user.role.is_admin() {
                let status = maintenance::current().await;
                if status.enabled {
                    return Ok(req.into_response(
                        create_error_response(
                            StatusCode::SERVICE_UNAVAILABLE,
                            ErrorCode::MaintenanceMode,
                            &maintenance::display_message(&status),
                        )
                        .map_into_right_body(),
                    ));
                }
            }

            debug!("JWT authentication successful for ID: {}", user.id);
            req.extensions_mut().insert(user);
            let res = srv.call(req).await?.map_into_left_body();
            Ok(res)
        })
    }
}

impl RequireJWT {
    /// 取当前用户，须在 RequireJWT 之后使用
    pub fn extract_user_claims(req: &actix_web::HttpRequest) -> Option<User> {
        req.extensions().get::<User>().cloned()
    }

    pub fn extract_user_id(req: &actix_web::HttpRequest) -> Option<i64> {
        req.extensions().get::<User>().map(|user| user.id)
    }

    pub fn extract_user_role(req: &actix_web::HttpRequest) -> Option<UserRole> {
        req.extensions().get::<User>().map(|user| user.role)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cache_key_uses_signature_segment() {
        assert_eq!(cache_key(3, "aaa.bbb.ccc"), "user:3:ccc");
        assert_ne!(cache_key(3, "aaa.bbb.ccc"), cache_key(4, "aaa.bbb.ccc"));
    }
}
