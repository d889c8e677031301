use chrono::{DateTime, Utc};
use serde::Serialize;

use super::entities::Lesson;
use crate::schedule::{DisplayZone, timezone};

/// 课程 + 展示时区下的本地时间
#[derive(Debug, Clone, Serialize)]
pub struct LessonResponse {
    #[serde(flatten)]
    pub lesson: Lesson,
    pub local_date: String,
    pub local_time: String,
    pub timezone: DisplayZone,
}

impl LessonResponse {
    pub fn render(lesson: Lesson, zone: DisplayZone) -> Self {
        let (local_date, local_time) = timezone::format_local(lesson.starts_at, zone);
        Self {
            lesson,
            local_date,
            local_time,
            timezone: zone,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SkipReason {
    StudentOverlap,
    TutorOverlap,
}

/// 因冲突跳过的循环课程
#[derive(Debug, Clone, Serialize)]
pub struct SkippedOccurrence {
    pub starts_at: DateTime<Utc>,
    pub local_date: String,
    pub local_time: String,
    pub reason: SkipReason,
    pub conflicting_lesson_id: i64,
}

#[derive(Debug, Serialize)]
pub struct CreateLessonsResponse {
    pub created: Vec<LessonResponse>,
    pub skipped: Vec<SkippedOccurrence>,
    pub created_count: usize,
    pub skipped_count: usize,
}

/// 409 时返回的冲突详情
#[derive(Debug, Serialize)]
pub struct LessonConflict {
    pub reason: SkipReason,
    pub conflicting_lesson_id: i64,
}
