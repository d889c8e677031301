use super::SeaOrmStorage;
use crate::entity::enrollments::{ActiveModel, Column, Entity as Enrollments};
use crate::errors::{Result, TutorHubError};
use crate::models::relations::{
    CreateEnrollmentRequest, Enrollment, EnrollmentStatus, GENERAL_SUBJECT,
    UpdateEnrollmentRequest,
};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, EntityTrait, QueryFilter, QueryOrder, Set, TransactionTrait,
    sea_query::Expr,
};

impl SeaOrmStorage {
    pub async fn create_enrollment_impl(&self, req: CreateEnrollmentRequest) -> Result<Enrollment> {
        let now = chrono::Utc::now().timestamp();
        let subject = req
            .subject
            .map(|s| s.trim().to_uppercase())
            .filter(|s| !s.is_empty())
            .unwrap_or_else(|| GENERAL_SUBJECT.to_string());

        let model = ActiveModel {
            student_id: Set(req.student_id),
            tutor_id: Set(req.tutor_id),
            subject: Set(subject),
            status: Set(req.status.unwrap_or_default().as_str().to_string()),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        };

        let result = model
            .insert(&self.db)
            .await
            .map_err(|e| TutorHubError::database_operation(format!("创建导师关系失败: {e}")))?;

        Ok(result.into_enrollment())
    }

    pub async fn get_enrollment_by_id_impl(&self, id: i64) -> Result<Option<Enrollment>> {
        let result = Enrollments::find_by_id(id)
            .one(&self.db)
            .await
            .map_err(|e| TutorHubError::database_operation(format!("查询导师关系失败: {e}")))?;

        Ok(result.map(|m| m.into_enrollment()))
    }

    pub async fn update_enrollment_impl(
        &self,
        id: i64,
        update: UpdateEnrollmentRequest,
    ) -> Result<Option<Enrollment>> {
        if self.get_enrollment_by_id_impl(id).await?.is_none() {
            return Ok(None);
        }

        let mut model = ActiveModel {
            id: Set(id),
            updated_at: Set(chrono::Utc::now().timestamp()),
            ..Default::default()
        };
        if let Some(tutor_id) = update.tutor_id {
            model.tutor_id = Set(tutor_id);
        }
        if let Some(subject) = update.subject
            && !subject.trim().is_empty()
        {
            model.subject = Set(subject.trim().to_uppercase());
        }
        if let Some(status) = update.status {
            model.status = Set(status.as_str().to_string());
        }

        model
            .update(&self.db)
            .await
            .map_err(|e| TutorHubError::database_operation(format!("更新导师关系失败: {e}")))?;

        self.get_enrollment_by_id_impl(id).await
    }

    pub async fn delete_enrollment_impl(&self, id: i64) -> Result<bool> {
        let result = Enrollments::delete_by_id(id)
            .exec(&self.db)
            .await
            .map_err(|e| TutorHubError::database_operation(format!("删除导师关系失败: {e}")))?;

        Ok(result.rows_affected > 0)
    }

    pub async fn list_student_enrollments_impl(&self, student_id: i64) -> Result<Vec<Enrollment>> {
        let rows = Enrollments::find()
            .filter(Column::StudentId.eq(student_id))
            .order_by_asc(Column::Id)
            .all(&self.db)
            .await
            .map_err(|e| TutorHubError::database_operation(format!("查询导师关系失败: {e}")))?;

        Ok(rows.into_iter().map(|m| m.into_enrollment()).collect())
    }

    /// 全部导师关系；include_archived 为 false 时不含已归档的
    pub async fn list_enrollments_impl(&self, include_archived: bool) -> Result<Vec<Enrollment>> {
        let mut query = Enrollments::find();
        if !include_archived {
            query = query.filter(Column::Status.ne(EnrollmentStatus::Archived.as_str()));
        }
        let rows = query
            .order_by_asc(Column::Id)
            .all(&self.db)
            .await
            .map_err(|e| TutorHubError::database_operation(format!("查询导师关系失败: {e}")))?;

        Ok(rows.into_iter().map(|m| m.into_enrollment()).collect())
    }

    /// 维护 GENERAL 科目的导师
    ///
    /// replace 时先归档其他导师的有效关系；已有关系则重新激活，否则新建。
    pub async fn assign_general_tutor_impl(
        &self,
        student_id: i64,
        tutor_id: Option<i64>,
        replace: bool,
    ) -> Result<()> {
        let now = chrono::Utc::now().timestamp();
        let txn = self
            .db
            .begin()
            .await
            .map_err(|e| TutorHubError::database_operation(format!("开启事务失败: {e}")))?;

        if replace {
            let mut archive = Enrollments::update_many()
                .col_expr(Column::Status, Expr::value(EnrollmentStatus::Archived.as_str()))
                .col_expr(Column::UpdatedAt, Expr::value(now))
                .filter(Column::StudentId.eq(student_id))
                .filter(Column::Subject.eq(GENERAL_SUBJECT))
                .filter(Column::Status.eq(EnrollmentStatus::Active.as_str()));
            if let Some(tutor_id) = tutor_id {
                archive = archive.filter(Column::TutorId.ne(tutor_id));
            }
            archive
                .exec(&txn)
                .await
                .map_err(|e| TutorHubError::database_operation(format!("归档导师关系失败: {e}")))?;
        }

        if let Some(tutor_id) = tutor_id {
            let existing = Enrollments::find()
                .filter(Column::StudentId.eq(student_id))
                .filter(Column::TutorId.eq(tutor_id))
                .filter(Column::Subject.eq(GENERAL_SUBJECT))
                .one(&txn)
                .await
                .map_err(|e| TutorHubError::database_operation(format!("查询导师关系失败: {e}")))?;

            match existing {
                Some(enrollment) if enrollment.status != EnrollmentStatus::Active.as_str() => {
                    let mut model: ActiveModel = enrollment.into();
                    model.status = Set(EnrollmentStatus::Active.as_str().to_string());
                    model.updated_at = Set(now);
                    model.update(&txn).await.map_err(|e| {
                        TutorHubError::database_operation(format!("激活导师关系失败: {e}"))
                    })?;
                }
                Some(_) => {}
                None => {
                    ActiveModel {
                        student_id: Set(student_id),
                        tutor_id: Set(tutor_id),
                        subject: Set(GENERAL_SUBJECT.to_string()),
                        status: Set(EnrollmentStatus::Active.as_str().to_string()),
                        created_at: Set(now),
                        updated_at: Set(now),
                        ..Default::default()
                    }
                    .insert(&txn)
                    .await
                    .map_err(|e| {
                        TutorHubError::database_operation(format!("创建导师关系失败: {e}"))
                    })?;
                }
            }
        }

        txn.commit()
            .await
            .map_err(|e| TutorHubError::database_operation(format!("提交事务失败: {e}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::users::entities::UserRole;
    use crate::storage::sea_orm_storage::test_support::{seed_student, seed_user};

    fn statuses(rows: &[Enrollment]) -> Vec<(i64, EnrollmentStatus)> {
        rows.iter().map(|e| (e.tutor_id, e.status)).collect()
    }

    #[tokio::test]
    async fn test_replace_archives_previous_tutor() {
        let storage = SeaOrmStorage::in_memory().await;
        let t1 = seed_user(&storage, "t1", UserRole::Tutor).await;
        let t2 = seed_user(&storage, "t2", UserRole::Tutor).await;
        let s = seed_student(&storage, "S").await;

        storage
            .assign_general_tutor_impl(s.id, Some(t1.id), false)
            .await
            .unwrap();
        storage
            .assign_general_tutor_impl(s.id, Some(t2.id), true)
            .await
            .unwrap();

        let rows = storage.list_student_enrollments_impl(s.id).await.unwrap();
        assert_eq!(
            statuses(&rows),
            vec![
                (t1.id, EnrollmentStatus::Archived),
                (t2.id, EnrollmentStatus::Active)
            ]
        );

        // 换回原导师时复用旧记录
        storage
            .assign_general_tutor_impl(s.id, Some(t1.id), true)
            .await
            .unwrap();
        let rows = storage.list_student_enrollments_impl(s.id).await.unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(
            statuses(&rows),
            vec![
                (t1.id, EnrollmentStatus::Active),
                (t2.id, EnrollmentStatus::Archived)
            ]
        );
    }

    #[tokio::test]
    async fn test_null_tutor_with_replace_archives_all() {
        let storage = SeaOrmStorage::in_memory().await;
        let t1 = seed_user(&storage, "t1", UserRole::Tutor).await;
        let s = seed_student(&storage, "S").await;
        storage
            .assign_general_tutor_impl(s.id, Some(t1.id), false)
            .await
            .unwrap();

        storage
            .assign_general_tutor_impl(s.id, None, false)
            .await
            .unwrap();
        let rows = storage.list_student_enrollments_impl(s.id).await.unwrap();
        assert_eq!(rows[0].status, EnrollmentStatus::Active);

        storage
            .assign_general_tutor_impl(s.id, None, true)
            .await
            .unwrap();
        let rows = storage.list_student_enrollments_impl(s.id).await.unwrap();
        assert_eq!(rows[0].status, EnrollmentStatus::Archived);
    }

    #[tokio::test]
    async fn test_crud_normalizes_subject() {
        let storage = SeaOrmStorage::in_memory().await;
        let t = seed_user(&storage, "t", UserRole::Tutor).await;
        let s = seed_student(&storage, "S").await;
        let e = storage
            .create_enrollment_impl(CreateEnrollmentRequest {
                student_id: s.id,
                tutor_id: t.id,
                subject: Some(" math ".into()),
                status: None,
            })
            .await
            .unwrap();
        assert_eq!(e.subject, "MATH");
        assert_eq!(e.status, EnrollmentStatus::Active);

        let updated = storage
            .update_enrollment_impl(
                e.id,
                UpdateEnrollmentRequest {
                    status: Some(EnrollmentStatus::Paused),
                    ..Default::default()
                },
            )
            .await
            .unwrap()
            .unwrap();
        assert_eq!(updated.status, EnrollmentStatus::Paused);

        assert!(storage.delete_enrollment_impl(e.id).await.unwrap());
        assert!(storage.get_enrollment_by_id_impl(e.id).await.unwrap().is_none());
    }
}
