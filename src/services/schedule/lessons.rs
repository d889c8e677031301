use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};

use super::{ScheduleService, lesson_not_found, load_visible_lesson, request_zone, unauthorized};
use crate::middlewares::RequireJWT;
use crate::models::lessons::requests::LessonViewParams;
use crate::models::lessons::responses::LessonResponse;
use crate::models::ApiResponse;
use crate::services::{audit, internal_error};

pub async fn get_lesson(
    service: &ScheduleService,
    lesson_id: i64,
    params: LessonViewParams,
    request: &HttpRequest,
) -> ActixResult<HttpResponse> {
    let storage = service.get_storage(request)?;
    let Some(user) = RequireJWT::extract_user_claims(request) else {
        return Ok(unauthorized());
    };

    match load_visible_lesson(&storage, &user, lesson_id).await {
        Ok(Some(lesson)) => Ok(HttpResponse::Ok().json(ApiResponse::success(
            LessonResponse::render(lesson, request_zone(params.timezone.as_deref())),
            "Lesson retrieved successfully",
        ))),
        Ok(None) => Ok(lesson_not_found()),
        Err(e) => Ok(internal_error("Failed to load lesson", e)),
    }
}

pub async fn delete_lesson(
    service: &ScheduleService,
    lesson_id: i64,
    request: &HttpRequest,
) -> ActixResult<HttpResponse> {
    let storage = service.get_storage(request)?;
    let Some(user) = RequireJWT::extract_user_claims(request) else {
        return Ok(unauthorized());
    };

    let lesson = match load_visible_lesson(&storage, &user, lesson_id).await {
        Ok(Some(lesson)) => lesson,
        Ok(None) => return Ok(lesson_not_found()),
        Err(e) => return Ok(internal_error("Failed to load lesson", e)),
    };

    match storage.delete_lesson(lesson.id).await {
        Ok(true) => {
            audit::record(
                audit::entry_for(request, "delete_lesson")
                    .entity("lesson", lesson.id)
                    .metadata(serde_json::json!({
                        "student_id": lesson.student_id,
                        "starts_at": lesson.starts_at,
                    })),
            );
            Ok(HttpResponse::Ok().json(ApiResponse::success_empty("Lesson deleted")))
        }
        Ok(false) => Ok(lesson_not_found()),
        Err(e) => Ok(internal_error("Lesson deletion failed", e)),
    }
}
