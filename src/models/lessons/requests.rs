use chrono::{DateTime, Utc};
use serde::Deserialize;

use super::entities::LessonStatus;
use crate::models::students::entities::StudentScope;

/// 从课表创建课程（单次或每周循环）
#[derive(Debug, Clone, Deserialize)]
pub struct CreateLessonsRequest {
    pub student_id: Option<i64>,
    pub lesson_date: Option<String>,
    pub lesson_time: Option<String>,
    pub duration: Option<i32>,
    pub lesson_type: Option<String>,
    pub timezone: Option<String>,
    pub lesson_mode: Option<String>,
    pub repeat_count: Option<u32>,
    pub tutor_id: Option<i64>,
    pub topic: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RescheduleLessonRequest {
    pub lesson_date: Option<String>,
    pub lesson_time: Option<String>,
    pub timezone: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SetLessonStatusRequest {
    pub status: String,
}

/// 课表内联编辑
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateLessonRequest {
    pub duration: Option<i32>,
    pub lesson_type: Option<String>,
    pub topic: Option<String>,
}

/// 单节课查询（展示时区）
#[derive(Debug, Clone, Default, Deserialize)]
pub struct LessonViewParams {
    pub timezone: Option<String>,
}

/// 存储层按时间段取课
#[derive(Debug, Clone)]
pub struct LessonRangeQuery {
    pub from: DateTime<Utc>,
    pub to: DateTime<Utc>,
    pub scope: StudentScope,
    pub status: Option<LessonStatus>,
    /// 学生分类
    pub category: Option<String>,
}
