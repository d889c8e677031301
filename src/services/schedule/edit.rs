use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};
use std::sync::Arc;

use super::conflicts::find_overlap;
use super::{ScheduleService, lesson_not_found, load_visible_lesson, request_zone, unauthorized};
use crate::middlewares::RequireJWT;
use crate::errors::Result;
use crate::models::lessons::entities::{Lesson, LessonPatch, LessonStatus, LessonType};
use crate::models::lessons::requests::{
    RescheduleLessonRequest, SetLessonStatusRequest, UpdateLessonRequest,
};
use crate::models::lessons::responses::{LessonConflict, LessonResponse};
use crate::models::{ApiResponse, ErrorCode};
use crate::schedule::{Interval, timezone};
use crate::services::{audit, internal_error};
use crate::storage::Storage;
use crate::utils::validate::{normalize_topic, validate_lesson_duration};

fn invalid(code: ErrorCode, message: impl Into<String>) -> HttpResponse {
    HttpResponse::BadRequest().json(ApiResponse::error_empty(code, message))
}

fn overlap_response(conflict: LessonConflict) -> HttpResponse {
    HttpResponse::Conflict().json(ApiResponse::error(
        ErrorCode::LessonOverlap,
        conflict,
        "The lesson overlaps another lesson",
    ))
}

fn update_failed(e: crate::errors::TutorHubError) -> HttpResponse {
    tracing::error!("Lesson update failed: {e}");
    HttpResponse::InternalServerError().json(ApiResponse::error_empty(
        ErrorCode::LessonUpdateFailed,
        format!("Lesson update failed: {e}"),
    ))
}

pub async fn reschedule_lesson(
    service: &ScheduleService,
    lesson_id: i64,
    data: RescheduleLessonRequest,
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

    let (Some(date), Some(time)) = (
        data.lesson_date.as_deref().map(str::trim).filter(|s| !s.is_empty()),
        data.lesson_time.as_deref().map(str::trim).filter(|s| !s.is_empty()),
    ) else {
        return Ok(invalid(
            ErrorCode::ValidationFailed,
            "lesson_date and lesson_time are required",
        ));
    };

    let zone = request_zone(data.timezone.as_deref());
    let new_start = match timezone::parse_local_datetime(date, time, zone) {
        Ok(instant) => instant,
        Err(e) => {
            return Ok(invalid(
                ErrorCode::LessonInvalidTime,
                format!("Invalid lesson date or time: {}", e.message()),
            ));
        }
    };

    let candidate = Interval::stored(new_start, Some(lesson.duration_minutes));
    match find_overlap(&storage, lesson.student_id, lesson.tutor_id, &candidate, Some(lesson.id))
        .await
    {
        Ok(Some(conflict)) => return Ok(overlap_response(conflict)),
        Ok(None) => {}
        Err(e) => return Ok(internal_error("Overlap check failed", e)),
    }

    let patch = LessonPatch {
        starts_at: Some(new_start),
        ..Default::default()
    };
    match storage.update_lesson(lesson.id, patch).await {
        Ok(Some(updated)) => {
            audit::record(
                audit::entry_for(request, "reschedule_lesson")
                    .entity("lesson", updated.id)
                    .metadata(serde_json::json!({
                        "student_id": updated.student_id,
                        "old_starts_at": lesson.starts_at,
                        "new_starts_at": updated.starts_at,
                    })),
            );
            Ok(HttpResponse::Ok().json(ApiResponse::success(
                LessonResponse::render(updated, zone),
                "Lesson rescheduled",
            )))
        }
        Ok(None) => Ok(lesson_not_found()),
        Err(e) => Ok(update_failed(e)),
    }
}

pub async fn set_lesson_status(
    service: &ScheduleService,
    lesson_id: i64,
    data: SetLessonStatusRequest,
    request: &HttpRequest,
) -> ActixResult<HttpResponse> {
    let storage = service.get_storage(request)?;
    let Some(user) = RequireJWT::extract_user_claims(request) else {
        return Ok(unauthorized());
    };

    let status = match data.status.parse::<LessonStatus>() {
        Ok(status) => status,
        Err(msg) => return Ok(invalid(ErrorCode::LessonInvalidField, msg)),
    };

    let lesson = match load_visible_lesson(&storage, &user, lesson_id).await {
        Ok(Some(lesson)) => lesson,
        Ok(None) => return Ok(lesson_not_found()),
        Err(e) => return Ok(internal_error("Failed to load lesson", e)),
    };

    let patch = LessonPatch {
        status: Some(status),
        ..Default::default()
    };
    match storage.update_lesson(lesson.id, patch).await {
        Ok(Some(updated)) => {
            audit::record(
                audit::entry_for(request, "set_lesson_status")
                    .entity("lesson", updated.id)
                    .metadata(serde_json::json!({
                        "student_id": updated.student_id,
                        "old_status": lesson.status,
                        "new_status": updated.status,
                    })),
            );
            Ok(HttpResponse::Ok().json(ApiResponse::success(
                LessonResponse::render(updated, request_zone(None)),
                "Lesson status updated",
            )))
        }
        Ok(None) => Ok(lesson_not_found()),
        Err(e) => Ok(update_failed(e)),
    }
}

pub async fn update_lesson(
    service: &ScheduleService,
    lesson_id: i64,
    data: UpdateLessonRequest,
    request: &HttpRequest,
) -> ActixResult<HttpResponse> {
    let storage = service.get_storage(request)?;
    let Some(user) = RequireJWT::extract_user_claims(request) else {
        return Ok(unauthorized());
    };

    let mut patch = LessonPatch::default();

    if let Some(duration) = data.duration {
        if let Err(msg) = validate_lesson_duration(duration) {
            return Ok(invalid(ErrorCode::LessonInvalidField, msg));
        }
        patch.duration_minutes = Some(duration);
    }
    if let Some(raw) = data.lesson_type.as_deref() {
        match raw.parse::<LessonType>() {
            Ok(t) => patch.lesson_type = Some(t),
            Err(msg) => return Ok(invalid(ErrorCode::LessonInvalidField, msg)),
        }
    }
    if let Some(raw) = data.topic.as_deref() {
        match normalize_topic(raw) {
            Ok(topic) => patch.topic = Some(topic),
            Err(msg) => return Ok(invalid(ErrorCode::LessonInvalidField, msg)),
        }
    }

    let lesson = match load_visible_lesson(&storage, &user, lesson_id).await {
        Ok(Some(lesson)) => lesson,
        Ok(None) => return Ok(lesson_not_found()),
        Err(e) => return Ok(internal_error("Failed to load lesson", e)),
    };

    if patch.is_empty() {
        return Ok(HttpResponse::Ok().json(ApiResponse::success(
            LessonResponse::render(lesson, request_zone(None)),
            "Nothing to update",
        )));
    }

    match duration_change_conflict(&storage, &lesson, patch.duration_minutes).await {
        Ok(Some(conflict)) => return Ok(overlap_response(conflict)),
        Ok(None) => {}
        Err(e) => return Ok(internal_error("Overlap check failed", e)),
    }

    match storage.update_lesson(lesson.id, patch).await {
        Ok(Some(updated)) => {
            audit::record(
                audit::entry_for(request, "update_lesson_inline")
                    .entity("lesson", updated.id)
                    .metadata(serde_json::json!({
                        "student_id": updated.student_id,
                        "old": {
                            "duration": lesson.duration_minutes,
                            "lesson_type": lesson.lesson_type,
                            "topic": lesson.topic,
                        },
                        "new": {
                            "duration": updated.duration_minutes,
                            "lesson_type": updated.lesson_type,
                            "topic": updated.topic,
                        },
                    })),
            );
            Ok(HttpResponse::Ok().json(ApiResponse::success(
                LessonResponse::render(updated, request_zone(None)),
                "Lesson updated",
            )))
        }
        Ok(None) => Ok(lesson_not_found()),
        Err(e) => Ok(update_failed(e)),
    }
}

/// 只有时长变化才重新检查冲突
pub(crate) async fn duration_change_conflict(
    storage: &Arc<dyn Storage>,
    lesson: &Lesson,
    new_duration: Option<i32>,
) -> Result<Option<LessonConflict>> {
    match new_duration {
        Some(duration) if duration != lesson.duration_minutes => {
            let candidate = Interval::from_start(lesson.starts_at, i64::from(duration));
            find_overlap(
                storage,
                lesson.student_id,
                lesson.tutor_id,
                &candidate,
                Some(lesson.id),
            )
            .await
        }
        _ => Ok(None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::lessons::entities::NewLesson;
    use crate::models::lessons::responses::SkipReason;
    use crate::schedule::timezone::{DisplayZone, parse_local_datetime};
    use crate::storage::sea_orm_storage::SeaOrmStorage;
    use crate::storage::sea_orm_storage::test_support::seed_student;

    async fn lesson_at(storage: &Arc<dyn Storage>, student_id: i64, time: &str) -> Lesson {
        let starts_at = parse_local_datetime("2025-03-10", time, DisplayZone::Moscow).unwrap();
        storage
            .create_lesson(NewLesson {
                student_id,
                tutor_id: None,
                lesson_type: LessonType::Regular,
                starts_at,
                duration_minutes: 60,
                status: LessonStatus::Planned,
                topic: None,
            })
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_overlap_checked_only_when_duration_changes() {
        let db = SeaOrmStorage::in_memory().await;
        let student = seed_student(&db, "A").await;
        let storage: Arc<dyn Storage> = Arc::new(db);

        let lesson = lesson_at(&storage, student.id, "10:00").await;
        let next = lesson_at(&storage, student.id, "11:00").await;

        // 未改时长时不查冲突
        assert!(
            duration_change_conflict(&storage, &lesson, None)
                .await
                .unwrap()
                .is_none()
        );
        assert!(
            duration_change_conflict(&storage, &lesson, Some(60))
                .await
                .unwrap()
                .is_none()
        );

        // 延长到 90 分钟会压到 11:00 的课
        let conflict = duration_change_conflict(&storage, &lesson, Some(90))
            .await
            .unwrap()
            .expect("longer lesson overlaps the next one");
        assert_eq!(conflict.reason, SkipReason::StudentOverlap);
        assert_eq!(conflict.conflicting_lesson_id, next.id);

        // 缩短不会与自己冲突
        assert!(
            duration_change_conflict(&storage, &lesson, Some(45))
                .await
                .unwrap()
                .is_none()
        );
    }
}
