use serde::{Deserialize, Serialize};

use crate::schedule::{Interval, Scheduled};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum LessonType {
    #[default]
    Regular,
    Exam,
    Introductory,
}

impl LessonType {
    pub fn as_str(&self) -> &'static str {
        match self {
            LessonType::Regular => "regular",
            LessonType::Exam => "exam",
            LessonType::Introductory => "introductory",
        }
    }
}

impl std::fmt::Display for LessonType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for LessonType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "regular" => Ok(LessonType::Regular),
            "exam" => Ok(LessonType::Exam),
            "introductory" => Ok(LessonType::Introductory),
            _ => Err(format!("Invalid lesson type: {s}")),
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum LessonStatus {
    #[default]
    Planned,
    InProgress,
    Completed,
    Cancelled,
}

impl LessonStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            LessonStatus::Planned => "planned",
            LessonStatus::InProgress => "in_progress",
            LessonStatus::Completed => "completed",
            LessonStatus::Cancelled => "cancelled",
        }
    }

    /// 课表上显示的状态文本
    pub fn label(&self) -> &'static str {
        match self {
            LessonStatus::Planned => "Запланирован",
            LessonStatus::InProgress => "Идет сейчас",
            LessonStatus::Completed => "Проведен",
            LessonStatus::Cancelled => "Отменен",
        }
    }
}

impl std::fmt::Display for LessonStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for LessonStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "planned" => Ok(LessonStatus::Planned),
            "in_progress" => Ok(LessonStatus::InProgress),
            "completed" => Ok(LessonStatus::Completed),
            "cancelled" => Ok(LessonStatus::Cancelled),
            _ => Err(format!("Invalid lesson status: {s}")),
        }
    }
}

/// 课程
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Lesson {
    pub id: i64,
    pub student_id: i64,
    pub tutor_id: Option<i64>,
    pub lesson_type: LessonType,
    pub starts_at: chrono::DateTime<chrono::Utc>,
    pub duration_minutes: i32,
    pub status: LessonStatus,
    pub topic: Option<String>,
    pub notes: Option<String>,
    pub homework: Option<String>,
    pub created_at: chrono::DateTime<chrono::Utc>,
    pub updated_at: chrono::DateTime<chrono::Utc>,
}

impl Lesson {
    pub fn interval(&self) -> Interval {
        Interval::stored(self.starts_at, Some(self.duration_minutes))
    }
}

impl Scheduled for Lesson {
    fn schedule_id(&self) -> i64 {
        self.id
    }

    fn schedule_interval(&self) -> Interval {
        self.interval()
    }
}

/// 新建课程（存储层输入）
#[derive(Debug, Clone)]
pub struct NewLesson {
    pub student_id: i64,
    pub tutor_id: Option<i64>,
    pub lesson_type: LessonType,
    pub starts_at: chrono::DateTime<chrono::Utc>,
    pub duration_minutes: i32,
    pub status: LessonStatus,
    pub topic: Option<String>,
}

/// 课程局部更新，外层 None 表示不修改
#[derive(Debug, Clone, Default)]
pub struct LessonPatch {
    pub starts_at: Option<chrono::DateTime<chrono::Utc>>,
    pub duration_minutes: Option<i32>,
    pub status: Option<LessonStatus>,
    pub lesson_type: Option<LessonType>,
    pub topic: Option<Option<String>>,
}

impl LessonPatch {
    pub fn is_empty(&self) -> bool {
        self.starts_at.is_none()
            && self.duration_minutes.is_none()
            && self.status.is_none()
            && self.lesson_type.is_none()
            && self.topic.is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_parse_and_label() {
        let status: LessonStatus = "in_progress".parse().unwrap();
        assert_eq!(status, LessonStatus::InProgress);
        assert_eq!(status.label(), "Идет сейчас");
        assert!("done".parse::<LessonStatus>().is_err());
        assert!("canceled".parse::<LessonStatus>().is_err());
    }

    #[test]
    fn test_lesson_type_parse() {
        assert_eq!("exam".parse::<LessonType>().unwrap(), LessonType::Exam);
        assert!("group".parse::<LessonType>().is_err());
    }

    #[test]
    fn test_patch_is_empty() {
        assert!(LessonPatch::default().is_empty());
        let patch = LessonPatch {
            topic: Some(None),
            ..Default::default()
        };
        assert!(!patch.is_empty());
    }
}
