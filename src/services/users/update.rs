use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};

use super::{UserService, check_identity_taken};
use crate::middlewares::RequireJWT;
use crate::models::{
    ApiResponse, ErrorCode,
    users::{entities::UserRole, requests::UpdateUserRequest, responses::UserResponse},
};
use crate::services::{audit, permissions};
use crate::utils::validate::{validate_email, validate_password, validate_username};

pub async fn update_user(
    service: &UserService,
    user_id: i64,
    mut update_data: UpdateUserRequest,
    request: &HttpRequest,
) -> ActixResult<HttpResponse> {
    let storage = service.get_storage(request)?;
    let Some(current) = RequireJWT::extract_user_claims(request) else {
        return Ok(HttpResponse::Unauthorized().json(ApiResponse::error_empty(
            ErrorCode::Unauthorized,
            "Unauthorized access, please login",
        )));
    };

    let target = match storage.get_user_by_id(user_id).await {
        Ok(Some(user)) => user,
        Ok(None) => {
            return Ok(HttpResponse::NotFound().json(ApiResponse::error_empty(
                ErrorCode::UserNotFound,
                "User not found",
            )));
        }
        Err(e) => return Ok(crate::services::internal_error("Failed to update user", e)),
    };

    if target.role == UserRole::Creator && current.role != UserRole::Creator {
        return Ok(HttpResponse::Forbidden().json(ApiResponse::error_empty(
            ErrorCode::Forbidden,
            "Creator accounts can only be changed by a creator",
        )));
    }

    if let Some(role) = update_data.role
        && role != target.role
    {
        if role == UserRole::Creator && current.role != UserRole::Creator {
            return Ok(HttpResponse::Forbidden().json(ApiResponse::error_empty(
                ErrorCode::RoleInvalid,
                "Only a creator can grant the creator role",
            )));
        }
        if !permissions::has_permission(&storage, current.role, "user.manage_roles").await {
            return Ok(HttpResponse::Forbidden().json(ApiResponse::error_empty(
                ErrorCode::PermissionDenied,
                "Missing permission: user.manage_roles",
            )));
        }
    }

    if let Some(username) = update_data.username.as_mut() {
        *username = username.trim().to_string();
        if let Err(msg) = validate_username(username) {
            return Ok(HttpResponse::BadRequest()
                .json(ApiResponse::error_empty(ErrorCode::UserNameInvalid, msg)));
        }
    }
    if let Some(email) = update_data.email.as_mut() {
        *email = email.trim().to_lowercase();
        if let Err(msg) = validate_email(email) {
            return Ok(HttpResponse::BadRequest()
                .json(ApiResponse::error_empty(ErrorCode::UserEmailInvalid, msg)));
        }
    }

    match check_identity_taken(
        &storage,
        update_data.username.as_deref(),
        update_data.email.as_deref(),
        Some(user_id),
    )
    .await
    {
        Ok(Some(conflict)) => return Ok(conflict),
        Ok(None) => {}
        Err(e) => return Ok(crate::services::internal_error("Failed to update user", e)),
    }

    if let Some(password) = update_data.password.take() {
        if let Err(msg) = validate_password(&password) {
            return Ok(HttpResponse::BadRequest()
                .json(ApiResponse::error_empty(ErrorCode::UserPasswordInvalid, msg)));
        }
        match crate::utils::password::hash_password(&password) {
            Ok(hash) => update_data.password = Some(hash),
            Err(e) => {
                return Ok(
                    HttpResponse::InternalServerError().json(ApiResponse::error_empty(
                        ErrorCode::InternalServerError,
                        format!("Password hashing failed: {e}"),
                    )),
                );
            }
        }
    }

    match storage.update_user(user_id, update_data).await {
        Ok(Some(user)) => {
            audit::record(audit::entry_for(request, "update_user").entity("user", user.id));
            Ok(HttpResponse::Ok().json(ApiResponse::success(
                UserResponse { user },
                "User information updated successfully",
            )))
        }
        Ok(None) => Ok(HttpResponse::NotFound().json(ApiResponse::error_empty(
            ErrorCode::UserNotFound,
            "User not found",
        ))),
        Err(e) => Ok(HttpResponse::BadRequest().json(ApiResponse::error_empty(
            ErrorCode::UserUpdateFailed,
            format!("Failed to update user information: {e}"),
        ))),
    }
}
