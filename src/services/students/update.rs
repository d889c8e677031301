use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};

use super::{StudentService, check_student_fields};
use crate::models::students::{requests::UpdateStudentRequest, responses::StudentResponse};
use crate::models::{ApiResponse, ErrorCode};
use crate::services::audit;

pub async fn update_student(
    service: &StudentService,
    student_id: i64,
    data: UpdateStudentRequest,
    request: &HttpRequest,
) -> ActixResult<HttpResponse> {
    let storage = service.get_storage(request)?;

    if data.name.as_deref().is_some_and(|n| n.trim().is_empty()) {
        return Ok(HttpResponse::BadRequest().json(ApiResponse::error_empty(
            ErrorCode::StudentInvalidField,
            "Student name cannot be empty",
        )));
    }

    match check_student_fields(
        &storage,
        data.school_class,
        data.platform_id.as_deref(),
        Some(student_id),
    )
    .await
    {
        Ok(Some(rejected)) => return Ok(rejected),
        Ok(None) => {}
        Err(e) => return Ok(crate::services::internal_error("Student update failed", e)),
    }

    apply_update(storage, student_id, data, request, "update_student").await
}

pub async fn archive_student(
    service: &StudentService,
    student_id: i64,
    request: &HttpRequest,
) -> ActixResult<HttpResponse> {
    let storage = service.get_storage(request)?;
    let update = UpdateStudentRequest {
        is_active: Some(false),
        ..Default::default()
    };
    apply_update(storage, student_id, update, request, "archive_student").await
}

async fn apply_update(
    storage: std::sync::Arc<dyn crate::storage::Storage>,
    student_id: i64,
    update: UpdateStudentRequest,
    request: &HttpRequest,
    action: &str,
) -> ActixResult<HttpResponse> {
    match storage.update_student(student_id, update).await {
        Ok(Some(student)) => {
            audit::record(audit::entry_for(request, action).entity("student", student.id));
            Ok(HttpResponse::Ok().json(ApiResponse::success(
                StudentResponse { student },
                "Student updated successfully",
            )))
        }
        Ok(None) => Ok(HttpResponse::NotFound().json(ApiResponse::error_empty(
            ErrorCode::StudentNotFound,
            "Student not found",
        ))),
        Err(e) => Ok(HttpResponse::InternalServerError().json(ApiResponse::error_empty(
            ErrorCode::StudentUpdateFailed,
            format!("Student update failed: {e}"),
        ))),
    }
}
