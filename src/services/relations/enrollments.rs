use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};
use std::sync::Arc;

use super::RelationService;
use crate::errors::Result;
use crate::models::relations::{CreateEnrollmentRequest, UpdateEnrollmentRequest};
use crate::models::users::entities::UserRole;
use crate::models::{ApiResponse, ErrorCode};
use crate::services::{audit, internal_error};
use crate::storage::Storage;

fn bad_request(code: ErrorCode, message: &str) -> HttpResponse {
    HttpResponse::BadRequest().json(ApiResponse::error_empty(code, message))
}

/// 导师必须是 tutor 角色的账号
async fn check_tutor(storage: &Arc<dyn Storage>, tutor_id: i64) -> Result<Option<HttpResponse>> {
    Ok(match storage.get_user_by_id(tutor_id).await? {
        None => Some(HttpResponse::NotFound().json(ApiResponse::error_empty(
            ErrorCode::UserNotFound,
            "Tutor not found",
        ))),
        Some(user) if user.role != UserRole::Tutor => {
            Some(bad_request(ErrorCode::RoleInvalid, "User is not a tutor"))
        }
        Some(_) => None,
    })
}

pub async fn create_enrollment(
    service: &RelationService,
    data: CreateEnrollmentRequest,
    request: &HttpRequest,
) -> ActixResult<HttpResponse> {
    let storage = service.get_storage(request)?;

    if data.subject.as_deref().is_some_and(|s| s.trim().is_empty()) {
        return Ok(bad_request(ErrorCode::ValidationFailed, "subject cannot be empty"));
    }

    match storage.get_student_by_id(data.student_id).await {
        Ok(Some(_)) => {}
        Ok(None) => {
            return Ok(HttpResponse::NotFound().json(ApiResponse::error_empty(
                ErrorCode::StudentNotFound,
                "Student not found",
            )));
        }
        Err(e) => return Ok(internal_error("Enrollment creation failed", e)),
    }
    match check_tutor(&storage, data.tutor_id).await {
        Ok(Some(rejected)) => return Ok(rejected),
        Ok(None) => {}
        Err(e) => return Ok(internal_error("Enrollment creation failed", e)),
    }

    match storage.create_enrollment(data).await {
        Ok(enrollment) => {
            audit::record(
                audit::entry_for(request, "enrollment_created")
                    .entity("enrollment", enrollment.id)
                    .metadata(serde_json::json!({
                        "student_id": enrollment.student_id,
                        "tutor_id": enrollment.tutor_id,
                        "subject": enrollment.subject,
                    })),
            );
            Ok(HttpResponse::Created().json(ApiResponse::success(
                enrollment,
                "Enrollment created successfully",
            )))
        }
        Err(e) => Ok(internal_error("Enrollment creation failed", e)),
    }
}

pub async fn get_enrollment(
    service: &RelationService,
    enrollment_id: i64,
    request: &HttpRequest,
) -> ActixResult<HttpResponse> {
    let storage = service.get_storage(request)?;

    match storage.get_enrollment_by_id(enrollment_id).await {
        Ok(Some(enrollment)) => Ok(HttpResponse::Ok().json(ApiResponse::success(
            enrollment,
            "Enrollment retrieved successfully",
        ))),
        Ok(None) => Ok(HttpResponse::NotFound().json(ApiResponse::error_empty(
            ErrorCode::EnrollmentNotFound,
            "Enrollment not found",
        ))),
        Err(e) => Ok(internal_error("Failed to load enrollment", e)),
    }
}

pub async fn update_enrollment(
    service: &RelationService,
    enrollment_id: i64,
    data: UpdateEnrollmentRequest,
    request: &HttpRequest,
) -> ActixResult<HttpResponse> {
    let storage = service.get_storage(request)?;

    if data.subject.as_deref().is_some_and(|s| s.trim().is_empty()) {
        return Ok(bad_request(ErrorCode::ValidationFailed, "subject cannot be empty"));
    }
    if let Some(tutor_id) = data.tutor_id {
        match check_tutor(&storage, tutor_id).await {
            Ok(Some(rejected)) => return Ok(rejected),
            Ok(None) => {}
            Err(e) => return Ok(internal_error("Enrollment update failed", e)),
        }
    }

    match storage.update_enrollment(enrollment_id, data).await {
        Ok(Some(enrollment)) => {
            audit::record(
                audit::entry_for(request, "enrollment_updated").entity("enrollment", enrollment.id),
            );
            Ok(HttpResponse::Ok().json(ApiResponse::success(
                enrollment,
                "Enrollment updated successfully",
            )))
        }
        Ok(None) => Ok(HttpResponse::NotFound().json(ApiResponse::error_empty(
            ErrorCode::EnrollmentNotFound,
            "Enrollment not found",
        ))),
        Err(e) => Ok(internal_error("Enrollment update failed", e)),
    }
}

pub async fn delete_enrollment(
    service: &RelationService,
    enrollment_id: i64,
    request: &HttpRequest,
) -> ActixResult<HttpResponse> {
    let storage = service.get_storage(request)?;

    match storage.delete_enrollment(enrollment_id).await {
        Ok(true) => {
            audit::record(
                audit::entry_for(request, "enrollment_deleted").entity("enrollment", enrollment_id),
            );
            Ok(HttpResponse::Ok().json(ApiResponse::success_empty(
                "Enrollment deleted successfully",
            )))
        }
        Ok(false) => Ok(HttpResponse::NotFound().json(ApiResponse::error_empty(
            ErrorCode::EnrollmentNotFound,
            "Enrollment not found",
        ))),
        Err(e) => Ok(internal_error("Enrollment deletion failed", e)),
    }
}
