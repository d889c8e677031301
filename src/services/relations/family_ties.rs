use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};

use super::RelationService;
use crate::models::relations::{CreateFamilyTieRequest, UpdateFamilyTieRequest};
use crate::models::users::entities::UserRole;
use crate::models::{ApiResponse, ErrorCode};
use crate::services::{audit, internal_error};

pub async fn create_family_tie(
    service: &RelationService,
    data: CreateFamilyTieRequest,
    request: &HttpRequest,
) -> ActixResult<HttpResponse> {
    let storage = service.get_storage(request)?;

    match storage.get_user_by_id(data.parent_id).await {
        Ok(Some(user)) if user.role == UserRole::Parent => {}
        Ok(Some(_)) => {
            return Ok(HttpResponse::BadRequest().json(ApiResponse::error_empty(
                ErrorCode::RoleInvalid,
                "User is not a parent",
            )));
        }
        Ok(None) => {
            return Ok(HttpResponse::NotFound().json(ApiResponse::error_empty(
                ErrorCode::UserNotFound,
                "Parent not found",
            )));
        }
        Err(e) => return Ok(internal_error("Family tie creation failed", e)),
    }

    match storage.get_student_by_id(data.student_id).await {
        Ok(Some(_)) => {}
        Ok(None) => {
            return Ok(HttpResponse::NotFound().json(ApiResponse::error_empty(
                ErrorCode::StudentNotFound,
                "Student not found",
            )));
        }
        Err(e) => return Ok(internal_error("Family tie creation failed", e)),
    }

    match storage.create_family_tie(data).await {
        Ok(tie) => {
            audit::record(
                audit::entry_for(request, "family_tie_created")
                    .entity("family_tie", tie.id)
                    .metadata(serde_json::json!({
                        "parent_id": tie.parent_id,
                        "student_id": tie.student_id,
                    })),
            );
            Ok(HttpResponse::Created()
                .json(ApiResponse::success(tie, "Family tie created successfully")))
        }
        Err(e) => Ok(internal_error("Family tie creation failed", e)),
    }
}

pub async fn get_family_tie(
    service: &RelationService,
    tie_id: i64,
    request: &HttpRequest,
) -> ActixResult<HttpResponse> {
    let storage = service.get_storage(request)?;

    match storage.get_family_tie_by_id(tie_id).await {
        Ok(Some(tie)) => Ok(HttpResponse::Ok().json(ApiResponse::success(tie, "Family tie retrieved successfully"))),
        Ok(None) => Ok(HttpResponse::NotFound().json(ApiResponse::error_empty(
            ErrorCode::FamilyTieNotFound,
            "Family tie not found",
        ))),
        Err(e) => Ok(internal_error("Failed to load family tie", e)),
    }
}

pub async fn update_family_tie(
    service: &RelationService,
    tie_id: i64,
    data: UpdateFamilyTieRequest,
    request: &HttpRequest,
) -> ActixResult<HttpResponse> {
    let storage = service.get_storage(request)?;

    match storage.update_family_tie(tie_id, data).await {
        Ok(Some(tie)) => {
            audit::record(audit::entry_for(request, "family_tie_updated").entity("family_tie", tie.id));
            Ok(HttpResponse::Ok().json(ApiResponse::success(tie, "Family tie updated successfully")))
        }
        Ok(None) => Ok(HttpResponse::NotFound().json(ApiResponse::error_empty(
            ErrorCode::FamilyTieNotFound,
            "Family tie not found",
        ))),
        Err(e) => Ok(internal_error("Family tie update failed", e)),
    }
}

pub async fn delete_family_tie(
    service: &RelationService,
    tie_id: i64,
    request: &HttpRequest,
) -> ActixResult<HttpResponse> {
    let storage = service.get_storage(request)?;

    match storage.delete_family_tie(tie_id).await {
        Ok(true) => {
            audit::record(audit::entry_for(request, "family_tie_deleted").entity("family_tie", tie_id));
            Ok(HttpResponse::Ok().json(ApiResponse::success_empty("Family tie deleted successfully")))
        }
        Ok(false) => Ok(HttpResponse::NotFound().json(ApiResponse::error_empty(
            ErrorCode::FamilyTieNotFound,
            "Family tie not found",
        ))),
        Err(e) => Ok(internal_error("Family tie deletion failed", e)),
    }
}
