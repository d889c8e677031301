use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};
use std::collections::HashMap;

use super::{ScheduleService, request_zone, unauthorized};
use crate::middlewares::RequireJWT;
use crate::models::lessons::entities::{Lesson, LessonStatus};
use crate::models::lessons::requests::LessonRangeQuery;
use crate::models::schedule::{
    ScheduleDay, ScheduleEvent, WeekScheduleParams, WeekScheduleResponse,
};
use crate::models::students::entities::Student;
use crate::models::{ApiResponse, ErrorCode};
use crate::schedule::{
    GridSpec, LayoutInput, PlacedEvent, WeekWindow, layout_week,
    timezone::{self, DATE_FORMAT},
};
use crate::services::{internal_error, permissions::student_scope};

fn to_event(placed: PlacedEvent<Lesson>, students: &HashMap<i64, Student>) -> ScheduleEvent {
    let lesson = placed.item;
    let student = students.get(&lesson.student_id);
    ScheduleEvent {
        lesson_id: lesson.id,
        student_id: lesson.student_id,
        student_name: student
            .map(|s| s.name.clone())
            .unwrap_or_else(|| format!("#{}", lesson.student_id)),
        grade: student.map(Student::grade_text).unwrap_or_default(),
        status: lesson.status.to_string(),
        status_label: lesson.status.label().to_string(),
        lesson_type: lesson.lesson_type.to_string(),
        topic: lesson.topic,
        start_time: placed.start_time,
        start_total: placed.start_total,
        duration_minutes: placed.duration_minutes,
        column_index: placed.column_index,
        columns_total: placed.columns_total,
        left_percent: placed.left_percent,
        width_percent: placed.width_percent,
    }
}

pub async fn week_view(
    service: &ScheduleService,
    params: WeekScheduleParams,
    request: &HttpRequest,
) -> ActixResult<HttpResponse> {
    let storage = service.get_storage(request)?;
    let Some(user) = RequireJWT::extract_user_claims(request) else {
        return Ok(unauthorized());
    };

    let status = match params.status.as_deref().map(str::trim) {
        None | Some("") => None,
        Some(raw) => match raw.parse::<LessonStatus>() {
            Ok(status) => Some(status),
            Err(msg) => {
                return Ok(HttpResponse::BadRequest()
                    .json(ApiResponse::error_empty(ErrorCode::LessonInvalidField, msg)));
            }
        },
    };

    let zone = request_zone(params.timezone.as_deref());
    let grid = GridSpec::new(params.slot, params.start, params.end);
    let Some(week) = WeekWindow::from_offset(timezone::today(zone), params.week.unwrap_or(0))
    else {
        return Ok(HttpResponse::BadRequest().json(ApiResponse::error_empty(
            ErrorCode::BadRequest,
            "Invalid week offset: out of range",
        )));
    };

    let range = timezone::local_day_bounds(week.start(), zone).and_then(|(from, _)| {
        timezone::local_day_bounds(week.end(), zone).map(|(_, to)| (from, to))
    });
    let (from, to) = match range {
        Ok(range) => range,
        Err(e) => {
            return Ok(HttpResponse::BadRequest().json(ApiResponse::error_empty(
                ErrorCode::BadRequest,
                format!("Invalid week offset: {e}"),
            )));
        }
    };

    let scope = match student_scope(&storage, &user).await {
        Ok(scope) => scope.narrow(params.student_id),
        Err(e) => return Ok(internal_error("Failed to resolve scope", e)),
    };

    let lessons = match storage
        .list_lessons_in_range(LessonRangeQuery {
            from,
            to,
            scope,
            status,
            category: params.category.clone(),
        })
        .await
    {
        Ok(lessons) => lessons,
        Err(e) => return Ok(internal_error("Failed to load lessons", e)),
    };

    let mut student_ids: Vec<i64> = lessons.iter().map(|l| l.student_id).collect();
    student_ids.sort_unstable();
    student_ids.dedup();
    let students: HashMap<i64, Student> = match storage.get_students_by_ids(&student_ids).await {
        Ok(students) => students.into_iter().map(|s| (s.id, s)).collect(),
        Err(e) => return Ok(internal_error("Failed to load students", e)),
    };

    let inputs = lessons
        .into_iter()
        .map(|lesson| LayoutInput {
            starts_at: lesson.starts_at,
            duration_minutes: Some(lesson.duration_minutes),
            item: lesson,
        })
        .collect();
    let placed = layout_week(inputs, zone, &week, grid.slot_minutes);

    let days = placed
        .into_iter()
        .enumerate()
        .map(|(day_index, events)| ScheduleDay {
            date: week.days[day_index].format(DATE_FORMAT).to_string(),
            day_index,
            events: events
                .into_iter()
                .map(|event| to_event(event, &students))
                .collect(),
        })
        .collect();

    let response = WeekScheduleResponse {
        week_offset: week.offset,
        week_label: week.label(),
        timezone: zone,
        slot_minutes: grid.slot_minutes,
        start_hour: grid.start_hour,
        end_hour: grid.end_hour,
        total_slots: grid.total_slots,
        hour_labels: grid.hour_labels,
        days,
    };

    Ok(HttpResponse::Ok().json(ApiResponse::success(
        response,
        "Schedule retrieved successfully",
    )))
}
