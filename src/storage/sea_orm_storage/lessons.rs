use super::SeaOrmStorage;
use crate::entity::lessons::{ActiveModel, Column, Entity as Lessons};
use crate::entity::students::{Column as StudentColumn, Entity as Students};
use crate::errors::{Result, TutorHubError};
use crate::models::{
    lessons::{
        entities::{Lesson, LessonPatch, LessonStatus, NewLesson},
        requests::LessonRangeQuery,
    },
    remote_admin::RemoteLesson,
    students::entities::StudentScope,
};
use crate::storage::scope_is_empty;
use chrono::{DateTime, Utc};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder,
    QuerySelect, Set,
};

impl SeaOrmStorage {
    pub async fn create_lesson_impl(&self, lesson: NewLesson) -> Result<Lesson> {
        let now = Utc::now().timestamp();

        let model = ActiveModel {
            student_id: Set(lesson.student_id),
            tutor_id: Set(lesson.tutor_id),
            lesson_type: Set(lesson.lesson_type.to_string()),
            starts_at: Set(lesson.starts_at.timestamp()),
            duration_minutes: Set(lesson.duration_minutes),
            status: Set(lesson.status.to_string()),
            topic: Set(lesson.topic),
            notes: Set(None),
            homework: Set(None),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        };

        let result = model
            .insert(&self.db)
            .await
            .map_err(|e| TutorHubError::database_operation(format!("创建课程失败: {e}")))?;

        Ok(result.into_lesson())
    }

    pub async fn get_lesson_by_id_impl(&self, id: i64) -> Result<Option<Lesson>> {
        let result = Lessons::find_by_id(id)
            .one(&self.db)
            .await
            .map_err(|e| TutorHubError::database_operation(format!("查询课程失败: {e}")))?;

        Ok(result.map(|m| m.into_lesson()))
    }

    pub async fn list_student_lessons_between_impl(
        &self,
        student_id: i64,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<Vec<Lesson>> {
        self.lessons_between(Column::StudentId.eq(student_id), from, to)
            .await
    }

    pub async fn list_tutor_lessons_between_impl(
        &self,
        tutor_id: i64,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<Vec<Lesson>> {
        self.lessons_between(Column::TutorId.eq(tutor_id), from, to)
            .await
    }

    async fn lessons_between<F>(
        &self,
        owner: F,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<Vec<Lesson>>
    where
        F: sea_orm::sea_query::IntoCondition,
    {
        let lessons = Lessons::find()
            .filter(owner)
            .filter(Column::StartsAt.gte(from.timestamp()))
            .filter(Column::StartsAt.lt(to.timestamp()))
            .order_by_asc(Column::StartsAt)
            .all(&self.db)
            .await
            .map_err(|e| TutorHubError::database_operation(format!("查询课程失败: {e}")))?;

        Ok(lessons.into_iter().map(|m| m.into_lesson()).collect())
    }

    /// 按时间段、数据范围、状态和学生分类取课
    pub async fn list_lessons_in_range_impl(&self, query: LessonRangeQuery) -> Result<Vec<Lesson>> {
        if scope_is_empty(&query.scope) {
            return Ok(Vec::new());
        }

        let mut select = Lessons::find()
            .filter(Column::StartsAt.gte(query.from.timestamp()))
            .filter(Column::StartsAt.lt(query.to.timestamp()));

        if let StudentScope::Only(ids) = &query.scope {
            select = select.filter(Column::StudentId.is_in(ids.clone()));
        }

        if let Some(status) = query.status {
            select = select.filter(Column::Status.eq(status.as_str()));
        }

        if let Some(ref category) = query.category
            && !category.trim().is_empty()
        {
            let ids: Vec<i64> = Students::find()
                .select_only()
                .column(StudentColumn::Id)
                .filter(StudentColumn::Category.eq(category.trim()))
                .into_tuple()
                .all(&self.db)
                .await
                .map_err(|e| TutorHubError::database_operation(format!("查询学生失败: {e}")))?;
            if ids.is_empty() {
                return Ok(Vec::new());
            }
            select = select.filter(Column::StudentId.is_in(ids));
        }

        let lessons = select
            .order_by_asc(Column::StartsAt)
            .order_by_asc(Column::Id)
            .all(&self.db)
            .await
            .map_err(|e| TutorHubError::database_operation(format!("查询课程失败: {e}")))?;

        Ok(lessons.into_iter().map(|m| m.into_lesson()).collect())
    }

    pub async fn update_lesson_impl(&self, id: i64, patch: LessonPatch) -> Result<Option<Lesson>> {
        if self.get_lesson_by_id_impl(id).await?.is_none() {
            return Ok(None);
        }
        if patch.is_empty() {
            return self.get_lesson_by_id_impl(id).await;
        }

        let mut model = ActiveModel {
            id: Set(id),
            updated_at: Set(Utc::now().timestamp()),
            ..Default::default()
        };

        if let Some(starts_at) = patch.starts_at {
            model.starts_at = Set(starts_at.timestamp());
        }
        if let Some(duration) = patch.duration_minutes {
            model.duration_minutes = Set(duration);
        }
        if let Some(status) = patch.status {
            model.status = Set(status.to_string());
        }
        if let Some(lesson_type) = patch.lesson_type {
            model.lesson_type = Set(lesson_type.to_string());
        }
        if let Some(topic) = patch.topic {
            model.topic = Set(topic);
        }

        model
            .update(&self.db)
            .await
            .map_err(|e| TutorHubError::database_operation(format!("更新课程失败: {e}")))?;

        self.get_lesson_by_id_impl(id).await
    }

    pub async fn delete_lesson_impl(&self, id: i64) -> Result<bool> {
        let result = Lessons::delete_by_id(id)
            .exec(&self.db)
            .await
            .map_err(|e| TutorHubError::database_operation(format!("删除课程失败: {e}")))?;

        Ok(result.rows_affected > 0)
    }

    pub async fn count_lessons_impl(&self, status: Option<LessonStatus>) -> Result<u64> {
        let mut select = Lessons::find();
        if let Some(status) = status {
            select = select.filter(Column::Status.eq(status.as_str()));
        }

        select
            .count(&self.db)
            .await
            .map_err(|e| TutorHubError::database_operation(format!("统计课程数量失败: {e}")))
    }

    /// 课程连同学生 platform_id 一起取出
    pub async fn list_remote_lessons_impl(
        &self,
        from: Option<DateTime<Utc>>,
        to: Option<DateTime<Utc>>,
    ) -> Result<Vec<RemoteLesson>> {
        let mut select = Lessons::find().find_also_related(Students);
        if let Some(from) = from {
            select = select.filter(Column::StartsAt.gte(from.timestamp()));
        }
        if let Some(to) = to {
            select = select.filter(Column::StartsAt.lt(to.timestamp()));
        }

        let rows = select
            .order_by_asc(Column::StartsAt)
            .all(&self.db)
            .await
            .map_err(|e| TutorHubError::database_operation(format!("查询课程失败: {e}")))?;

        Ok(rows
            .into_iter()
            .map(|(lesson, student)| RemoteLesson {
                id: lesson.id,
                student_id: lesson.student_id,
                platform_id: student.and_then(|s| s.platform_id),
                lesson_type: lesson.lesson_type,
                starts_at: crate::entity::from_ts(lesson.starts_at),
                duration_minutes: lesson.duration_minutes,
                status: lesson.status,
                topic: lesson.topic,
            })
            .collect())
    }

    pub async fn lesson_exists_impl(
        &self,
        student_id: i64,
        starts_at: DateTime<Utc>,
        duration_minutes: i32,
    ) -> Result<bool> {
        let count = Lessons::find()
            .filter(Column::StudentId.eq(student_id))
            .filter(Column::StartsAt.eq(starts_at.timestamp()))
            .filter(Column::DurationMinutes.eq(duration_minutes))
            .count(&self.db)
            .await
            .map_err(|e| TutorHubError::database_operation(format!("查询课程失败: {e}")))?;

        Ok(count > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::lessons::entities::LessonType;
    use crate::models::users::entities::UserRole;
    use crate::storage::sea_orm_storage::test_support::{seed_student, seed_user};
    use chrono::{Duration, TimeZone};

    fn lesson_at(student_id: i64, tutor_id: Option<i64>, starts_at: DateTime<Utc>) -> NewLesson {
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

    #[tokio::test]
    async fn test_lessons_between_is_half_open() {
        let storage = SeaOrmStorage::in_memory().await;
        let s = seed_student(&storage, "S").await;
        let base = Utc.with_ymd_and_hms(2025, 3, 10, 9, 0, 0).unwrap();
        storage
            .create_lesson_impl(lesson_at(s.id, None, base))
            .await
            .unwrap();
        storage
            .create_lesson_impl(lesson_at(s.id, None, base + Duration::hours(2)))
            .await
            .unwrap();

        let found = storage
            .list_student_lessons_between_impl(s.id, base, base + Duration::hours(2))
            .await
            .unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].starts_at, base);
    }

    #[tokio::test]
    async fn test_tutor_lessons_across_students() {
        let storage = SeaOrmStorage::in_memory().await;
        let tutor = seed_user(&storage, "t", UserRole::Tutor).await;
        let a = seed_student(&storage, "A").await;
        let b = seed_student(&storage, "B").await;
        let base = Utc.with_ymd_and_hms(2025, 3, 10, 9, 0, 0).unwrap();
        storage
            .create_lesson_impl(lesson_at(a.id, Some(tutor.id), base))
            .await
            .unwrap();
        storage
            .create_lesson_impl(lesson_at(b.id, Some(tutor.id), base + Duration::hours(1)))
            .await
            .unwrap();
        storage
            .create_lesson_impl(lesson_at(b.id, None, base))
            .await
            .unwrap();

        let found = storage
            .list_tutor_lessons_between_impl(tutor.id, base, base + Duration::days(1))
            .await
            .unwrap();
        assert_eq!(found.len(), 2);
    }

    #[tokio::test]
    async fn test_range_query_scope_and_status() {
        let storage = SeaOrmStorage::in_memory().await;
        let a = seed_student(&storage, "A").await;
        let b = seed_student(&storage, "B").await;
        let base = Utc.with_ymd_and_hms(2025, 3, 10, 9, 0, 0).unwrap();
        let first = storage
            .create_lesson_impl(lesson_at(a.id, None, base))
            .await
            .unwrap();
        storage
            .create_lesson_impl(lesson_at(b.id, None, base))
            .await
            .unwrap();
        storage
            .update_lesson_impl(
                first.id,
                LessonPatch {
                    status: Some(LessonStatus::Completed),
                    ..Default::default()
                },
            )
            .await
            .unwrap();

        let query = |scope, status| LessonRangeQuery {
            from: base - Duration::days(1),
            to: base + Duration::days(1),
            scope,
            status,
            category: None,
        };

        let all = storage
            .list_lessons_in_range_impl(query(StudentScope::All, None))
            .await
            .unwrap();
        assert_eq!(all.len(), 2);

        let only_a = storage
            .list_lessons_in_range_impl(query(StudentScope::Only(vec![a.id]), None))
            .await
            .unwrap();
        assert_eq!(only_a.len(), 1);
        assert_eq!(only_a[0].status, LessonStatus::Completed);

        let planned = storage
            .list_lessons_in_range_impl(query(StudentScope::All, Some(LessonStatus::Planned)))
            .await
            .unwrap();
        assert_eq!(planned.len(), 1);
        assert_eq!(planned[0].student_id, b.id);
    }

    #[tokio::test]
    async fn test_patch_clears_topic_and_exists_check() {
        let storage = SeaOrmStorage::in_memory().await;
        let s = seed_student(&storage, "S").await;
        let base = Utc.with_ymd_and_hms(2025, 3, 10, 9, 0, 0).unwrap();
        let mut new = lesson_at(s.id, None, base);
        new.topic = Some("Логарифмы".into());
        let lesson = storage.create_lesson_impl(new).await.unwrap();

        let updated = storage
            .update_lesson_impl(
                lesson.id,
                LessonPatch {
                    topic: Some(None),
                    duration_minutes: Some(90),
                    ..Default::default()
                },
            )
            .await
            .unwrap()
            .unwrap();
        assert_eq!(updated.topic, None);
        assert_eq!(updated.duration_minutes, 90);

        assert!(storage.lesson_exists_impl(s.id, base, 90).await.unwrap());
        assert!(!storage.lesson_exists_impl(s.id, base, 60).await.unwrap());

        let remote = storage.list_remote_lessons_impl(None, None).await.unwrap();
        assert_eq!(remote.len(), 1);
        assert_eq!(remote[0].platform_id, None);

        assert!(storage.delete_lesson_impl(lesson.id).await.unwrap());
        assert!(storage.get_lesson_by_id_impl(lesson.id).await.unwrap().is_none());
    }
}
