//! 学生与导师两侧的时间冲突检查
//!
//! 已取消的课程不占用时间。

use std::sync::Arc;

use crate::errors::Result;
use crate::models::lessons::entities::{Lesson, LessonStatus};
use crate::models::lessons::responses::{LessonConflict, SkipReason};
use crate::schedule::{Interval, find_conflict};
use crate::storage::Storage;

/// 在已加载的课程中找第一个冲突
pub(crate) fn first_conflict(
    candidate: &Interval,
    lessons: Vec<Lesson>,
    exclude_id: Option<i64>,
) -> Option<i64> {
    let active: Vec<Lesson> = lessons
        .into_iter()
        .filter(|l| l.status != LessonStatus::Cancelled)
        .collect();
    find_conflict(candidate, &active, exclude_id).map(|l| l.id)
}

/// 先查学生，再查导师
pub(crate) async fn find_overlap(
    storage: &Arc<dyn Storage>,
    student_id: i64,
    tutor_id: Option<i64>,
    candidate: &Interval,
    exclude_id: Option<i64>,
) -> Result<Option<LessonConflict>> {
    let (from, to) = candidate.lookback_window();

    let student_lessons = storage
        .list_student_lessons_between(student_id, from, to)
        .await?;
    if let Some(id) = first_conflict(candidate, student_lessons, exclude_id) {
        return Ok(Some(LessonConflict {
            reason: SkipReason::StudentOverlap,
            conflicting_lesson_id: id,
        }));
    }

    if let Some(tutor_id) = tutor_id {
        let tutor_lessons = storage.list_tutor_lessons_between(tutor_id, from, to).await?;
        if let Some(id) = first_conflict(candidate, tutor_lessons, exclude_id) {
            return Ok(Some(LessonConflict {
                reason: SkipReason::TutorOverlap,
                conflicting_lesson_id: id,
            }));
        }
    }

    Ok(None)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::lessons::entities::LessonType;
    use crate::schedule::timezone::{DisplayZone, parse_local_datetime};

    fn lesson(id: i64, time: &str, minutes: i32, status: LessonStatus) -> Lesson {
        let starts_at = parse_local_datetime("2025-03-10", time, DisplayZone::Moscow).unwrap();
        Lesson {
            id,
            student_id: 1,
            tutor_id: None,
            lesson_type: LessonType::Regular,
            starts_at,
            duration_minutes: minutes,
            status,
            topic: None,
            notes: None,
            homework: None,
            created_at: starts_at,
            updated_at: starts_at,
        }
    }

    fn candidate(time: &str, minutes: i64) -> Interval {
        let start = parse_local_datetime("2025-03-10", time, DisplayZone::Moscow).unwrap();
        Interval::from_start(start, minutes)
    }

    #[test]
    fn test_cancelled_lessons_do_not_block() {
        let lessons = vec![lesson(1, "10:00", 60, LessonStatus::Cancelled)];
        assert_eq!(first_conflict(&candidate("10:30", 60), lessons, None), None);
    }

    #[test]
    fn test_active_lesson_blocks() {
        let lessons = vec![
            lesson(1, "08:00", 60, LessonStatus::Completed),
            lesson(2, "10:00", 60, LessonStatus::Planned),
        ];
        assert_eq!(first_conflict(&candidate("10:30", 60), lessons, None), Some(2));
    }

    #[test]
    fn test_touching_and_excluded() {
        let lessons = vec![lesson(1, "10:00", 60, LessonStatus::Planned)];
        assert_eq!(first_conflict(&candidate("11:00", 60), lessons.clone(), None), None);
        assert_eq!(first_conflict(&candidate("10:00", 90), lessons, Some(1)), None);
    }

    mod with_storage {
        use super::*;
        use crate::models::lessons::entities::NewLesson;
        use crate::models::users::entities::UserRole;
        use crate::storage::sea_orm_storage::SeaOrmStorage;
        use crate::storage::sea_orm_storage::test_support::{seed_student, seed_user};
        use chrono::{DateTime, Utc};

        fn at(date: &str, time: &str) -> DateTime<Utc> {
            parse_local_datetime(date, time, DisplayZone::Moscow).unwrap()
        }

        fn new_lesson(
            student_id: i64,
            tutor_id: Option<i64>,
            starts_at: DateTime<Utc>,
            minutes: i32,
        ) -> NewLesson {
            NewLesson {
                student_id,
                tutor_id,
                lesson_type: LessonType::Regular,
                starts_at,
                duration_minutes: minutes,
                status: LessonStatus::Planned,
                topic: None,
            }
        }

        #[tokio::test]
        async fn test_previous_day_lesson_is_caught() {
            let db = SeaOrmStorage::in_memory().await;
            let student = seed_student(&db, "A").await;
            let storage: Arc<dyn Storage> = Arc::new(db);

            // 前一天 23:30 开始、持续到次日 01:00
            let late = storage
                .create_lesson(new_lesson(student.id, None, at("2025-03-09", "23:30"), 90))
                .await
                .unwrap();

            let candidate = Interval::from_start(at("2025-03-10", "00:30"), 60);
            let conflict = find_overlap(&storage, student.id, None, &candidate, None)
                .await
                .unwrap()
                .expect("overnight lesson overlaps");
            assert_eq!(conflict.reason, SkipReason::StudentOverlap);
            assert_eq!(conflict.conflicting_lesson_id, late.id);

            let after = Interval::from_start(at("2025-03-10", "01:00"), 60);
            assert!(
                find_overlap(&storage, student.id, None, &after, None)
                    .await
                    .unwrap()
                    .is_none()
            );
        }

        #[tokio::test]
        async fn test_tutor_busy_with_other_student() {
            let db = SeaOrmStorage::in_memory().await;
            let tutor = seed_user(&db, "tutor", UserRole::Tutor).await;
            let a = seed_student(&db, "A").await;
            let b = seed_student(&db, "B").await;
            let storage: Arc<dyn Storage> = Arc::new(db);

            let busy = storage
                .create_lesson(new_lesson(b.id, Some(tutor.id), at("2025-03-10", "10:00"), 60))
                .await
                .unwrap();

            let candidate = Interval::from_start(at("2025-03-10", "10:30"), 60);
            let conflict = find_overlap(&storage, a.id, Some(tutor.id), &candidate, None)
                .await
                .unwrap()
                .expect("tutor is busy");
            assert_eq!(conflict.reason, SkipReason::TutorOverlap);
            assert_eq!(conflict.conflicting_lesson_id, busy.id);

            // 不指定导师时只看学生自己的课
            assert!(
                find_overlap(&storage, a.id, None, &candidate, None)
                    .await
                    .unwrap()
                    .is_none()
            );
        }
    }
}
