use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};

use super::{StudentService, check_student_fields};
use crate::models::students::{requests::CreateStudentRequest, responses::StudentResponse};
use crate::models::{ApiResponse, ErrorCode};
use crate::services::audit;

pub async fn create_student(
    service: &StudentService,
    data: CreateStudentRequest,
    request: &HttpRequest,
) -> ActixResult<HttpResponse> {
    let storage = service.get_storage(request)?;

    if data.name.trim().is_empty() {
        return Ok(HttpResponse::BadRequest().json(ApiResponse::error_empty(
            ErrorCode::StudentInvalidField,
            "Student name is required",
        )));
    }

    match check_student_fields(
        &storage,
        data.school_class,
        data.platform_id.as_deref(),
        None,
    )
    .await
    {
        Ok(Some(rejected)) => return Ok(rejected),
        Ok(None) => {}
        Err(e) => return Ok(crate::services::internal_error("Student creation failed", e)),
    }

    if let Some(user_id) = data.user_id {
        match storage.get_user_by_id(user_id).await {
            Ok(Some(_)) => {}
            Ok(None) => {
                return Ok(HttpResponse::BadRequest().json(ApiResponse::error_empty(
                    ErrorCode::UserNotFound,
                    "Linked user account not found",
                )));
            }
            Err(e) => return Ok(crate::services::internal_error("Student creation failed", e)),
        }
    }

    match storage.create_student(data).await {
        Ok(student) => {
            audit::record(audit::entry_for(request, "create_student").entity("student", student.id));
            Ok(HttpResponse::Created().json(ApiResponse::success(
                StudentResponse { student },
                "Student created successfully",
            )))
        }
        Err(e) => {
            tracing::error!("Student creation failed: {e}");
            Ok(HttpResponse::InternalServerError().json(ApiResponse::error_empty(
                ErrorCode::StudentCreationFailed,
                format!("Student creation failed: {e}"),
            )))
        }
    }
}
