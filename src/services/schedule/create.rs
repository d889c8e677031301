use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};
use chrono::{DateTime, Utc};
use std::sync::Arc;
use tracing::{info, warn};

use super::conflicts::find_overlap;
use super::{ScheduleService, request_zone, unauthorized};
use crate::config::AppConfig;
use crate::errors::Result;
use crate::middlewares::RequireJWT;
use crate::models::lessons::entities::{Lesson, LessonStatus, LessonType, NewLesson};
use crate::models::lessons::requests::CreateLessonsRequest;
use crate::models::lessons::responses::{
    CreateLessonsResponse, LessonResponse, SkippedOccurrence,
};
use crate::models::users::entities::UserRole;
use crate::models::{ApiResponse, ErrorCode};
use crate::schedule::overlap::DEFAULT_DURATION_MINUTES;
use crate::schedule::{
    DisplayZone, Interval, LessonMode, occurrence_count, timezone, weekly_occurrences,
};
use crate::services::{audit, internal_error, permissions::student_scope};
use crate::storage::Storage;
use crate::utils::validate::normalize_topic;

const MAX_DURATION_MINUTES: i32 = 24 * 60;

fn invalid(code: ErrorCode, message: impl Into<String>) -> HttpResponse {
    HttpResponse::BadRequest().json(ApiResponse::error_empty(code, message))
}

pub async fn create_lessons(
    service: &ScheduleService,
    data: CreateLessonsRequest,
    request: &HttpRequest,
) -> ActixResult<HttpResponse> {
    let storage = service.get_storage(request)?;
    let Some(user) = RequireJWT::extract_user_claims(request) else {
        return Ok(unauthorized());
    };

    // 1. 必填字段
    let (Some(student_id), Some(date), Some(time)) = (
        data.student_id,
        data.lesson_date.as_deref().map(str::trim).filter(|s| !s.is_empty()),
        data.lesson_time.as_deref().map(str::trim).filter(|s| !s.is_empty()),
    ) else {
        return Ok(invalid(
            ErrorCode::ValidationFailed,
            "student_id, lesson_date and lesson_time are required",
        ));
    };

    let duration = data.duration.unwrap_or(DEFAULT_DURATION_MINUTES as i32);
    if !(1..=MAX_DURATION_MINUTES).contains(&duration) {
        return Ok(invalid(
            ErrorCode::LessonInvalidField,
            "Duration must be between 1 and 1440 minutes",
        ));
    }

    let lesson_type = match data.lesson_type.as_deref().map(str::trim) {
        None | Some("") => LessonType::default(),
        Some(raw) => match raw.parse::<LessonType>() {
            Ok(t) => t,
            Err(msg) => return Ok(invalid(ErrorCode::LessonInvalidField, msg)),
        },
    };

    let topic = match data.topic.as_deref().map(normalize_topic).transpose() {
        Ok(topic) => topic.flatten(),
        Err(msg) => return Ok(invalid(ErrorCode::LessonInvalidField, msg)),
    };

    // 2. 时间解析
    let zone = request_zone(data.timezone.as_deref());
    let base = match timezone::parse_local_datetime(date, time, zone) {
        Ok(instant) => instant,
        Err(e) => {
            return Ok(invalid(
                ErrorCode::LessonInvalidTime,
                format!("Invalid lesson date or time: {}", e.message()),
            ));
        }
    };

    // 3. 学生必须存在且在数据范围内
    let student = match storage.get_student_by_id(student_id).await {
        Ok(Some(student)) => student,
        Ok(None) => {
            return Ok(HttpResponse::NotFound().json(ApiResponse::error_empty(
                ErrorCode::StudentNotFound,
                "Student not found",
            )));
        }
        Err(e) => return Ok(internal_error("Lesson creation failed", e)),
    };
    match student_scope(&storage, &user).await {
        Ok(scope) if scope.allows(student.id) => {}
        Ok(_) => {
            return Ok(HttpResponse::NotFound().json(ApiResponse::error_empty(
                ErrorCode::StudentNotFound,
                "Student not found",
            )));
        }
        Err(e) => return Ok(internal_error("Failed to resolve scope", e)),
    }

    // 导师建课时默认记在自己名下
    let tutor_id = match data.tutor_id {
        Some(id) => match storage.get_user_by_id(id).await {
            Ok(Some(_)) => Some(id),
            Ok(None) => {
                return Ok(HttpResponse::NotFound().json(ApiResponse::error_empty(
                    ErrorCode::UserNotFound,
                    "Tutor not found",
                )));
            }
            Err(e) => return Ok(internal_error("Lesson creation failed", e)),
        },
        None => (user.role == UserRole::Tutor).then_some(user.id),
    };

    // 4. 逐周生成，冲突的跳过
    let mode = LessonMode::parse(data.lesson_mode.as_deref());
    let count = occurrence_count(
        mode,
        data.repeat_count,
        AppConfig::get().schedule.max_repeat_count,
    );

    let Some(occurrences) = weekly_occurrences(base, count) else {
        return Ok(invalid(
            ErrorCode::LessonInvalidTime,
            "Lesson date is out of the supported range",
        ));
    };

    let template = NewLesson {
        student_id: student.id,
        tutor_id,
        lesson_type,
        starts_at: base,
        duration_minutes: duration,
        status: LessonStatus::Planned,
        topic,
    };
    let placed = place_occurrences(&storage, &template, &occurrences, zone, |lesson| {
        audit::record(
            audit::entry_for(request, "create_lesson_from_schedule")
                .entity("lesson", lesson.id)
                .metadata(serde_json::json!({
                    "student_id": student.id,
                    "student_name": student.name,
                    "lesson_mode": if mode == LessonMode::Recurring { "recurring" } else { "single" },
                    "repeat_count": count,
                    "starts_at": lesson.starts_at,
                    "duration": duration,
                    "lesson_type": lesson_type,
                })),
        );
    })
    .await;
    let (created, skipped) = match placed {
        Ok(placed) => placed,
        Err(e) => {
            tracing::error!("Lesson creation failed: {e}");
            return Ok(HttpResponse::InternalServerError().json(ApiResponse::error_empty(
                ErrorCode::LessonCreationFailed,
                format!("Lesson creation failed: {e}"),
            )));
        }
    };

    info!(
        "Created {} of {} lessons for student {} starting at {}",
        created.len(),
        count,
        student.id,
        base
    );

    let response = CreateLessonsResponse {
        created_count: created.len(),
        skipped_count: skipped.len(),
        created: created
            .into_iter()
            .map(|lesson| LessonResponse::render(lesson, zone))
            .collect(),
        skipped,
    };
    Ok(creation_response(response))
}

/// 逐个时刻检查冲突并落库；冲突的跳过并记录原因
///
/// 每成功创建一节课调用一次 `on_created`。
pub(crate) async fn place_occurrences(
    storage: &Arc<dyn Storage>,
    template: &NewLesson,
    occurrences: &[DateTime<Utc>],
    zone: DisplayZone,
    mut on_created: impl FnMut(&Lesson),
) -> Result<(Vec<Lesson>, Vec<SkippedOccurrence>)> {
    let mut created = Vec::new();
    let mut skipped = Vec::new();

    for &starts_at in occurrences {
        let candidate = Interval::from_start(starts_at, i64::from(template.duration_minutes));
        if let Some(conflict) =
            find_overlap(storage, template.student_id, template.tutor_id, &candidate, None).await?
        {
            warn!(
                "Lesson overlap for student {} at {} ({:?}), skipped",
                template.student_id, starts_at, conflict.reason
            );
            let (local_date, local_time) = timezone::format_local(starts_at, zone);
            skipped.push(SkippedOccurrence {
                starts_at,
                local_date,
                local_time,
                reason: conflict.reason,
                conflicting_lesson_id: conflict.conflicting_lesson_id,
            });
            continue;
        }

        let lesson = storage
            .create_lesson(NewLesson {
                starts_at,
                ..template.clone()
            })
            .await?;
        on_created(&lesson);
        created.push(lesson);
    }

    Ok((created, skipped))
}

/// 全部冲突时 409（附带跳过列表），否则 201
pub(crate) fn creation_response(response: CreateLessonsResponse) -> HttpResponse {
    if response.created.is_empty() {
        return HttpResponse::Conflict().json(ApiResponse::error(
            ErrorCode::LessonOverlap,
            response,
            "Every requested time overlaps an existing lesson",
        ));
    }

    let message = if response.skipped_count > 0 {
        format!(
            "Created {} lessons, skipped {} overlapping",
            response.created_count, response.skipped_count
        )
    } else {
        format!("Created {} lessons", response.created_count)
    };
    HttpResponse::Created().json(ApiResponse::success(response, message))
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::http::StatusCode;
    use crate::models::lessons::responses::SkipReason;
    use crate::schedule::timezone::parse_local_datetime;
    use crate::storage::sea_orm_storage::SeaOrmStorage;
    use crate::storage::sea_orm_storage::test_support::{seed_student, seed_user};

    fn template(student_id: i64, tutor_id: Option<i64>, starts_at: DateTime<Utc>) -> NewLesson {
        NewLesson {
            student_id,
            tutor_id,
            lesson_type: LessonType::Regular,
            starts_at,
            duration_minutes: 60,
            status: LessonStatus::Planned,
            topic: None,
        }
    }

    fn response(created: Vec<Lesson>, skipped: Vec<SkippedOccurrence>) -> CreateLessonsResponse {
        CreateLessonsResponse {
            created_count: created.len(),
            skipped_count: skipped.len(),
            created: created
                .into_iter()
                .map(|lesson| LessonResponse::render(lesson, DisplayZone::Moscow))
                .collect(),
            skipped,
        }
    }

    #[tokio::test]
    async fn test_recurring_skips_overlapping_week() {
        let db = SeaOrmStorage::in_memory().await;
        let tutor = seed_user(&db, "tutor", UserRole::Tutor).await;
        let student = seed_student(&db, "A").await;
        let storage: Arc<dyn Storage> = Arc::new(db);

        let base = parse_local_datetime("2025-03-10", "10:00", DisplayZone::Moscow).unwrap();
        let occurrences = weekly_occurrences(base, 4).unwrap();
        let blocker = storage
            .create_lesson(template(student.id, None, occurrences[2]))
            .await
            .unwrap();

        let mut seen = Vec::new();
        let (created, skipped) = place_occurrences(
            &storage,
            &template(student.id, Some(tutor.id), base),
            &occurrences,
            DisplayZone::Moscow,
            |lesson| seen.push(lesson.id),
        )
        .await
        .unwrap();

        assert_eq!(created.len(), 3);
        assert_eq!(seen.len(), 3);
        assert_eq!(skipped.len(), 1);
        assert_eq!(skipped[0].starts_at, occurrences[2]);
        assert_eq!(skipped[0].local_date, "2025-03-24");
        assert_eq!(skipped[0].local_time, "10:00");
        assert_eq!(skipped[0].reason, SkipReason::StudentOverlap);
        assert_eq!(skipped[0].conflicting_lesson_id, blocker.id);
        assert!(created.iter().all(|l| l.tutor_id == Some(tutor.id)));

        let status = creation_response(response(created, skipped)).status();
        assert_eq!(status, StatusCode::CREATED);
    }

    #[tokio::test]
    async fn test_all_weeks_overlapping_is_conflict() {
        let db = SeaOrmStorage::in_memory().await;
        let tutor = seed_user(&db, "tutor", UserRole::Tutor).await;
        let a = seed_student(&db, "A").await;
        let b = seed_student(&db, "B").await;
        let storage: Arc<dyn Storage> = Arc::new(db);

        let base = parse_local_datetime("2025-03-10", "10:00", DisplayZone::Moscow).unwrap();
        let occurrences = weekly_occurrences(base, 2).unwrap();
        // 导师在同一时段已给另一名学生上课
        for &at in &occurrences {
            storage
                .create_lesson(template(b.id, Some(tutor.id), at))
                .await
                .unwrap();
        }

        let (created, skipped) = place_occurrences(
            &storage,
            &template(a.id, Some(tutor.id), base),
            &occurrences,
            DisplayZone::Moscow,
            |_| {},
        )
        .await
        .unwrap();

        assert!(created.is_empty());
        assert_eq!(skipped.len(), 2);
        assert!(skipped.iter().all(|s| s.reason == SkipReason::TutorOverlap));

        let status = creation_response(response(created, skipped)).status();
        assert_eq!(status, StatusCode::CONFLICT);
    }
}
