use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};
use chrono::{DateTime, TimeDelta, Utc};
use std::collections::HashMap;
use tracing::{debug, info};

use super::CalendarService;
use super::ics::IcsWriter;
use crate::config::AppConfig;
use crate::models::lessons::entities::{Lesson, LessonStatus};
use crate::models::lessons::requests::LessonRangeQuery;
use crate::models::students::entities::Student;
use crate::models::{ApiResponse, ErrorCode};
use crate::services::{internal_error, permissions::student_scope};

const MAX_TOKEN_LEN: usize = 64;

fn token_looks_valid(token: &str) -> bool {
    !token.is_empty()
        && token.len() <= MAX_TOKEN_LEN
        && token.chars().all(|c| c.is_ascii_alphanumeric() || c == '-')
}

fn invalid_token() -> HttpResponse {
    HttpResponse::NotFound().json(ApiResponse::error_empty(
        ErrorCode::CalendarTokenInvalid,
        "Calendar not found",
    ))
}

/// 生成完整的 VCALENDAR 文本
pub fn render_calendar(
    lessons: &[Lesson],
    students: &HashMap<i64, Student>,
    calendar_name: &str,
    product_id: &str,
    now: DateTime<Utc>,
) -> String {
    let mut w = IcsWriter::new();
    w.begin("VCALENDAR")
        .raw("VERSION", "2.0")
        .text("PRODID", product_id)
        .raw("CALSCALE", "GREGORIAN")
        .raw("METHOD", "PUBLISH")
        .text("X-WR-CALNAME", calendar_name);

    for lesson in lessons {
        let student_name = students
            .get(&lesson.student_id)
            .map(|s| s.name.clone())
            .unwrap_or_else(|| format!("#{}", lesson.student_id));
        let interval = lesson.interval();
        let status = if lesson.status == LessonStatus::Cancelled {
            "CANCELLED"
        } else {
            "CONFIRMED"
        };

        w.begin("VEVENT")
            .raw("UID", &format!("lesson-{}@{}", lesson.id, product_id_host(product_id)))
            .time("DTSTAMP", now)
            .time("DTSTART", interval.start)
            .time("DTEND", interval.end)
            .text(
                "SUMMARY",
                &format!("Урок: {} ({})", student_name, lesson.status.label()),
            )
            .raw("STATUS", status)
            .time("LAST-MODIFIED", lesson.updated_at);
        if let Some(topic) = lesson.topic.as_deref().filter(|t| !t.is_empty()) {
            w.text("DESCRIPTION", topic);
        }
        w.end("VEVENT");
    }

    w.end("VCALENDAR");
    w.finish()
}

// UID 的域部分，取 PRODID 中的第一段
fn product_id_host(product_id: &str) -> &str {
    product_id
        .trim_start_matches('-')
        .trim_start_matches("//")
        .split('/')
        .next()
        .filter(|s| !s.is_empty())
        .unwrap_or("tutorhub")
}

pub async fn calendar_feed(
    service: &CalendarService,
    token: &str,
    request: &HttpRequest,
) -> ActixResult<HttpResponse> {
    if !token_looks_valid(token) {
        return Ok(invalid_token());
    }
    let storage = service.get_storage(request)?;

    let user = match storage.get_user_by_calendar_token(token).await {
        Ok(Some(user)) if user.is_active() => user,
        Ok(_) => {
            debug!("Calendar token rejected");
            return Ok(invalid_token());
        }
        Err(e) => return Ok(internal_error("Failed to resolve calendar token", e)),
    };

    let config = &AppConfig::get().calendar;
    let now = Utc::now();
    let from = TimeDelta::try_days(config.past_days)
        .and_then(|d| now.checked_sub_signed(d))
        .unwrap_or(DateTime::<Utc>::MIN_UTC);
    let to = TimeDelta::try_days(config.future_days)
        .and_then(|d| now.checked_add_signed(d))
        .unwrap_or(DateTime::<Utc>::MAX_UTC);

    let scope = match student_scope(&storage, &user).await {
        Ok(scope) => scope,
        Err(e) => return Ok(internal_error("Failed to resolve scope", e)),
    };

    let lessons = match storage
        .list_lessons_in_range(LessonRangeQuery {
            from,
            to,
            scope,
            status: None,
            category: None,
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

    let body = render_calendar(
        &lessons,
        &students,
        &format!("Расписание: {}", user.visible_name()),
        &config.product_id,
        now,
    );
    info!(
        "Calendar feed served for user {} with {} lessons",
        user.id,
        lessons.len()
    );

    Ok(HttpResponse::Ok()
        .content_type("text/calendar; charset=utf-8")
        .insert_header(("Content-Disposition", "inline; filename=\"lessons.ics\""))
        .insert_header(("Cache-Control", "no-cache"))
        .body(body))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::lessons::entities::LessonType;
    use chrono::TimeZone;

    fn lesson(id: i64, status: LessonStatus, topic: Option<&str>) -> Lesson {
        let start = Utc.with_ymd_and_hms(2025, 3, 10, 12, 0, 0).unwrap();
        Lesson {
            id,
            student_id: 7,
            tutor_id: None,
            lesson_type: LessonType::Regular,
            starts_at: start,
            duration_minutes: 90,
            status,
            topic: topic.map(str::to_string),
            notes: None,
            homework: None,
            created_at: start,
            updated_at: start,
        }
    }

    #[test]
    fn test_token_shape() {
        assert!(token_looks_valid("0f8fad5bd9cb469fa16570867728950e"));
        assert!(!token_looks_valid(""));
        assert!(!token_looks_valid("../etc/passwd"));
        assert!(!token_looks_valid(&"a".repeat(65)));
    }

    #[test]
    fn test_render_calendar() {
        let now = Utc.with_ymd_and_hms(2025, 3, 1, 0, 0, 0).unwrap();
        let lessons = vec![
            lesson(1, LessonStatus::Planned, Some("Дроби, проценты")),
            lesson(2, LessonStatus::Cancelled, None),
        ];
        let body = render_calendar(
            &lessons,
            &HashMap::new(),
            "Расписание",
            "-//TutorHub//Lessons//RU",
            now,
        );

        assert!(body.starts_with("BEGIN:VCALENDAR\r\nVERSION:2.0\r\n"));
        assert!(body.ends_with("END:VCALENDAR\r\n"));
        assert_eq!(body.matches("BEGIN:VEVENT").count(), 2);
        assert!(body.contains("UID:lesson-1@TutorHub\r\n"));
        assert!(body.contains("DTSTART:20250310T120000Z\r\n"));
        assert!(body.contains("DTEND:20250310T133000Z\r\n"));
        assert!(body.contains("STATUS:CONFIRMED\r\n"));
        assert!(body.contains("STATUS:CANCELLED\r\n"));
        assert!(body.contains("DESCRIPTION:Дроби\\, проценты\r\n"));
        assert!(body.contains("SUMMARY:Урок: #7"));
        assert!(!body.contains("\n\n"));
    }

    #[test]
    fn test_product_id_host() {
        assert_eq!(product_id_host("-//TutorHub//Lessons//RU"), "TutorHub");
        assert_eq!(product_id_host(""), "tutorhub");
    }
}
