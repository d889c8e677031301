use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};
use tracing::info;

use super::CalendarService;
use crate::middlewares::RequireJWT;
use crate::models::calendar::CalendarTokenResponse;
use crate::models::{ApiResponse, ErrorCode};
use crate::services::{audit, internal_error};

fn unauthorized() -> HttpResponse {
    HttpResponse::Unauthorized().json(ApiResponse::error_empty(
        ErrorCode::Unauthorized,
        "Unauthorized access, please login",
    ))
}

fn new_token() -> String {
    uuid::Uuid::new_v4().simple().to_string()
}

pub async fn get_token(
    service: &CalendarService,
    request: &HttpRequest,
) -> ActixResult<HttpResponse> {
    let storage = service.get_storage(request)?;
    let Some(user_id) = RequireJWT::extract_user_id(request) else {
        return Ok(unauthorized());
    };

    // 扩展中的用户可能来自缓存，令牌以数据库为准
    match storage.get_user_by_id(user_id).await {
        Ok(Some(user)) => Ok(HttpResponse::Ok().json(ApiResponse::success(
            CalendarTokenResponse::from_token(user.calendar_token),
            "Calendar subscription retrieved",
        ))),
        Ok(None) => Ok(unauthorized()),
        Err(e) => Ok(internal_error("Failed to load user", e)),
    }
}

pub async fn rotate_token(
    service: &CalendarService,
    request: &HttpRequest,
) -> ActixResult<HttpResponse> {
    let storage = service.get_storage(request)?;
    let Some(user_id) = RequireJWT::extract_user_id(request) else {
        return Ok(unauthorized());
    };

    let token = new_token();
    match storage.set_calendar_token(user_id, Some(token.clone())).await {
        Ok(true) => {
            info!("Calendar token rotated for user {}", user_id);
            audit::record(audit::entry_for(request, "rotate_calendar_token").entity("user", user_id));
            Ok(HttpResponse::Ok().json(ApiResponse::success(
                CalendarTokenResponse::from_token(Some(token)),
                "Calendar link created",
            )))
        }
        Ok(false) => Ok(unauthorized()),
        Err(e) => Ok(internal_error("Failed to store calendar token", e)),
    }
}

pub async fn revoke_token(
    service: &CalendarService,
    request: &HttpRequest,
) -> ActixResult<HttpResponse> {
    let storage = service.get_storage(request)?;
    let Some(user_id) = RequireJWT::extract_user_id(request) else {
        return Ok(unauthorized());
    };

    match storage.set_calendar_token(user_id, None).await {
        Ok(true) => {
            info!("Calendar token revoked for user {}", user_id);
            audit::record(audit::entry_for(request, "revoke_calendar_token").entity("user", user_id));
            Ok(HttpResponse::Ok().json(ApiResponse::success(
                CalendarTokenResponse::from_token(None),
                "Calendar link revoked",
            )))
        }
        Ok(false) => Ok(unauthorized()),
        Err(e) => Ok(internal_error("Failed to revoke calendar token", e)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_token_is_unique_hex() {
        let a = new_token();
        let b = new_token();
        assert_eq!(a.len(), 32);
        assert!(a.chars().all(|c| c.is_ascii_hexdigit()));
        assert_ne!(a, b);
    }
}
