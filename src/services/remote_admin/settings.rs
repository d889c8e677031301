use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};
use tracing::info;

use super::{RemoteAdminService, bad_request};
use crate::models::permissions::UpdateRolePermissionsRequest;
use crate::models::remote_admin::SetMaintenanceRequest;
use crate::models::users::entities::UserRole;
use crate::models::{ApiResponse, ErrorCode};
use crate::services::{audit, internal_error, maintenance, permissions};

pub async fn get_permissions(
    service: &RemoteAdminService,
    request: &HttpRequest,
) -> ActixResult<HttpResponse> {
    let storage = service.get_storage(request)?;
    match permissions::matrix(&storage).await {
        Ok(matrix) => Ok(HttpResponse::Ok().json(ApiResponse::success(
            matrix,
            "Permissions retrieved successfully",
        ))),
        Err(e) => Ok(internal_error("Failed to load permissions", e)),
    }
}

pub async fn update_permissions(
    service: &RemoteAdminService,
    data: UpdateRolePermissionsRequest,
    request: &HttpRequest,
) -> ActixResult<HttpResponse> {
    let storage = service.get_storage(request)?;
    let role = match data.role.trim().parse::<UserRole>() {
        Ok(role) => role,
        Err(msg) => return Ok(bad_request(ErrorCode::RoleInvalid, msg)),
    };

    let ignored: Vec<&str> = data
        .permissions
        .iter()
        .map(String::as_str)
        .filter(|name| !permissions::registry::is_known(name))
        .collect();

    match permissions::replace_for_role(&storage, role, &data.permissions).await {
        Ok(effective) => {
            info!(
                "Permissions for role {} replaced: {} enabled",
                role,
                effective.len()
            );
            audit::record(
                audit::entry_for(request, "update_permissions").metadata(serde_json::json!({
                    "role": role,
                    "permissions": effective,
                    "ignored": ignored,
                })),
            );
            Ok(HttpResponse::Ok().json(ApiResponse::success(
                serde_json::json!({ "role": role, "permissions": effective }),
                "Permissions updated successfully",
            )))
        }
        Err(e) => Ok(internal_error("Failed to update permissions", e)),
    }
}

pub async fn get_maintenance(
    service: &RemoteAdminService,
    request: &HttpRequest,
) -> ActixResult<HttpResponse> {
    // 缓存在启动时已加载，这里以数据库为准
    let storage = service.get_storage(request)?;
    match storage.get_maintenance().await {
        Ok(status) => Ok(HttpResponse::Ok().json(ApiResponse::success(
            status,
            "Maintenance status retrieved",
        ))),
        Err(e) => Ok(internal_error("Failed to load maintenance status", e)),
    }
}

pub async fn set_maintenance(
    service: &RemoteAdminService,
    data: SetMaintenanceRequest,
    request: &HttpRequest,
) -> ActixResult<HttpResponse> {
    let storage = service.get_storage(request)?;
    let message = data
        .message
        .map(|m| m.trim().to_string())
        .filter(|m| !m.is_empty());

    match maintenance::set(&storage, data.enabled, message, None).await {
        Ok(status) => {
            audit::record(
                audit::entry_for(request, "toggle_maintenance").metadata(serde_json::json!({
                    "enabled": status.enabled,
                    "message": status.message,
                })),
            );
            Ok(HttpResponse::Ok().json(ApiResponse::success(
                status,
                "Maintenance status updated",
            )))
        }
        Err(e) => Ok(internal_error("Failed to update maintenance status", e)),
    }
}
