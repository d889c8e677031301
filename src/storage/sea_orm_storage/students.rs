use super::SeaOrmStorage;
use crate::entity::enrollments::{Column as EnrollmentColumn, Entity as Enrollments};
use crate::entity::family_ties::{Column as FamilyTieColumn, Entity as FamilyTies};
use crate::entity::students::{ActiveModel, Column, Entity as Students};
use crate::errors::{Result, TutorHubError};
use crate::models::{
    PaginationInfo,
    relations::EnrollmentStatus,
    students::{
        entities::{Student, StudentScope},
        requests::{CreateStudentRequest, StudentListQuery, UpdateStudentRequest},
        responses::StudentListResponse,
    },
};
use crate::storage::scope_is_empty;
use crate::utils::escape_like_pattern;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder,
    QuerySelect, Set,
};

/// 空串视为未填写
fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

impl SeaOrmStorage {
    pub async fn create_student_impl(&self, req: CreateStudentRequest) -> Result<Student> {
        let now = chrono::Utc::now().timestamp();

        let model = ActiveModel {
            user_id: Set(req.user_id),
            platform_id: Set(non_empty(req.platform_id)),
            name: Set(req.name.trim().to_string()),
            phone: Set(non_empty(req.phone)),
            email: Set(non_empty(req.email)),
            telegram: Set(non_empty(req.telegram)),
            category: Set(non_empty(req.category)),
            school_class: Set(req.school_class),
            goal_text: Set(non_empty(req.goal_text)),
            notes: Set(non_empty(req.notes)),
            is_active: Set(true),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        };

        let result = model
            .insert(&self.db)
            .await
            .map_err(|e| TutorHubError::database_operation(format!("创建学生失败: {e}")))?;

        Ok(result.into_student())
    }

    pub async fn get_student_by_id_impl(&self, id: i64) -> Result<Option<Student>> {
        let result = Students::find_by_id(id)
            .one(&self.db)
            .await
            .map_err(|e| TutorHubError::database_operation(format!("查询学生失败: {e}")))?;

        Ok(result.map(|m| m.into_student()))
    }

    pub async fn get_student_by_user_id_impl(&self, user_id: i64) -> Result<Option<Student>> {
        let result = Students::find()
            .filter(Column::UserId.eq(user_id))
            .one(&self.db)
            .await
            .map_err(|e| TutorHubError::database_operation(format!("查询学生失败: {e}")))?;

        Ok(result.map(|m| m.into_student()))
    }

    pub async fn get_student_by_platform_id_impl(
        &self,
        platform_id: &str,
    ) -> Result<Option<Student>> {
        let result = Students::find()
            .filter(Column::PlatformId.eq(platform_id.trim()))
            .one(&self.db)
            .await
            .map_err(|e| TutorHubError::database_operation(format!("查询学生失败: {e}")))?;

        Ok(result.map(|m| m.into_student()))
    }

    /// 分页列出学生（带数据范围）
    pub async fn list_students_with_pagination_impl(
        &self,
        query: StudentListQuery,
    ) -> Result<StudentListResponse> {
        let page = query.page.max(1);
        let size = query.size.clamp(1, 100);

        if scope_is_empty(&query.scope) {
            return Ok(StudentListResponse {
                items: Vec::new(),
                pagination: PaginationInfo::new(page, size, 0),
            });
        }

        let mut select = Students::find();

        if let StudentScope::Only(ids) = &query.scope {
            select = select.filter(Column::Id.is_in(ids.clone()));
        }

        if let Some(ref search) = query.search
            && !search.trim().is_empty()
        {
            let escaped = escape_like_pattern(search.trim());
            select = select.filter(
                Condition::any()
                    .add(Column::Name.contains(&escaped))
                    .add(Column::Email.contains(&escaped))
                    .add(Column::Phone.contains(&escaped))
                    .add(Column::PlatformId.contains(&escaped)),
            );
        }

        if let Some(ref category) = query.category
            && !category.trim().is_empty()
        {
            select = select.filter(Column::Category.eq(category.trim()));
        }

        if let Some(is_active) = query.is_active {
            select = select.filter(Column::IsActive.eq(is_active));
        }

        let paginator = select
            .order_by_asc(Column::Name)
            .order_by_asc(Column::Id)
            .paginate(&self.db, size);

        let total = paginator
            .num_items()
            .await
            .map_err(|e| TutorHubError::database_operation(format!("查询学生总数失败: {e}")))?;

        let students = paginator
            .fetch_page(page - 1)
            .await
            .map_err(|e| TutorHubError::database_operation(format!("查询学生列表失败: {e}")))?;

        Ok(StudentListResponse {
            items: students.into_iter().map(|m| m.into_student()).collect(),
            pagination: PaginationInfo::new(page, size, total),
        })
    }

    pub async fn get_students_by_ids_impl(&self, ids: &[i64]) -> Result<Vec<Student>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let students = Students::find()
            .filter(Column::Id.is_in(ids.to_vec()))
            .all(&self.db)
            .await
            .map_err(|e| TutorHubError::database_operation(format!("查询学生失败: {e}")))?;

        Ok(students.into_iter().map(|m| m.into_student()).collect())
    }

    pub async fn update_student_impl(
        &self,
        id: i64,
        update: UpdateStudentRequest,
    ) -> Result<Option<Student>> {
        if self.get_student_by_id_impl(id).await?.is_none() {
            return Ok(None);
        }

        let mut model = ActiveModel {
            id: Set(id),
            updated_at: Set(chrono::Utc::now().timestamp()),
            ..Default::default()
        };

        if let Some(name) = update.name {
            model.name = Set(name.trim().to_string());
        }
        if let Some(platform_id) = update.platform_id {
            model.platform_id = Set(non_empty(Some(platform_id)));
        }
        if let Some(phone) = update.phone {
            model.phone = Set(non_empty(Some(phone)));
        }
        if let Some(email) = update.email {
            model.email = Set(non_empty(Some(email)));
        }
        if let Some(telegram) = update.telegram {
            model.telegram = Set(non_empty(Some(telegram)));
        }
        if let Some(category) = update.category {
            model.category = Set(non_empty(Some(category)));
        }
        if let Some(school_class) = update.school_class {
            model.school_class = Set(Some(school_class));
        }
        if let Some(goal_text) = update.goal_text {
            model.goal_text = Set(non_empty(Some(goal_text)));
        }
        if let Some(notes) = update.notes {
            model.notes = Set(non_empty(Some(notes)));
        }
        if let Some(is_active) = update.is_active {
            model.is_active = Set(is_active);
        }

        model
            .update(&self.db)
            .await
            .map_err(|e| TutorHubError::database_operation(format!("更新学生失败: {e}")))?;

        self.get_student_by_id_impl(id).await
    }

    pub async fn count_students_impl(&self, is_active: bool) -> Result<u64> {
        Students::find()
            .filter(Column::IsActive.eq(is_active))
            .count(&self.db)
            .await
            .map_err(|e| TutorHubError::database_operation(format!("统计学生数量失败: {e}")))
    }

    /// 导师名下关系未归档的学生
    pub async fn tutor_student_ids_impl(&self, tutor_id: i64) -> Result<Vec<i64>> {
        let ids: Vec<i64> = Enrollments::find()
            .select_only()
            .column(EnrollmentColumn::StudentId)
            .filter(EnrollmentColumn::TutorId.eq(tutor_id))
            .filter(EnrollmentColumn::Status.ne(EnrollmentStatus::Archived.as_str()))
            .distinct()
            .into_tuple()
            .all(&self.db)
            .await
            .map_err(|e| TutorHubError::database_operation(format!("查询导师学生失败: {e}")))?;

        Ok(ids)
    }

    /// 家长已确认关系的学生
    pub async fn parent_student_ids_impl(&self, parent_id: i64) -> Result<Vec<i64>> {
        let ids: Vec<i64> = FamilyTies::find()
            .select_only()
            .column(FamilyTieColumn::StudentId)
            .filter(FamilyTieColumn::ParentId.eq(parent_id))
            .filter(FamilyTieColumn::IsConfirmed.eq(true))
            .distinct()
            .into_tuple()
            .all(&self.db)
            .await
            .map_err(|e| TutorHubError::database_operation(format!("查询家长学生失败: {e}")))?;

        Ok(ids)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::relations::{CreateEnrollmentRequest, CreateFamilyTieRequest};
    use crate::models::users::entities::UserRole;
    use crate::storage::sea_orm_storage::test_support::{seed_student, seed_user};

    #[tokio::test]
    async fn test_create_trims_and_drops_empty_fields() {
        let storage = SeaOrmStorage::in_memory().await;
        let student = storage
            .create_student_impl(CreateStudentRequest {
                name: "  Мария ".into(),
                phone: Some("   ".into()),
                category: Some("ЕГЭ".into()),
                school_class: Some(11),
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(student.name, "Мария");
        assert_eq!(student.phone, None);
        assert!(student.is_active);
        assert_eq!(student.grade_text(), "11 класс");
    }

    #[tokio::test]
    async fn test_scope_filters_list() {
        let storage = SeaOrmStorage::in_memory().await;
        let a = seed_student(&storage, "A").await;
        seed_student(&storage, "B").await;

        let all = storage
            .list_students_with_pagination_impl(StudentListQuery {
                page: 1,
                size: 20,
                scope: StudentScope::All,
                search: None,
                category: None,
                is_active: None,
            })
            .await
            .unwrap();
        assert_eq!(all.pagination.total, 2);

        let only = storage
            .list_students_with_pagination_impl(StudentListQuery {
                page: 1,
                size: 20,
                scope: StudentScope::Only(vec![a.id]),
                search: None,
                category: None,
                is_active: None,
            })
            .await
            .unwrap();
        assert_eq!(only.items.len(), 1);
        assert_eq!(only.items[0].id, a.id);

        let none = storage
            .list_students_with_pagination_impl(StudentListQuery {
                page: 1,
                size: 20,
                scope: StudentScope::Only(vec![]),
                search: None,
                category: None,
                is_active: None,
            })
            .await
            .unwrap();
        assert!(none.items.is_empty());
    }

    #[tokio::test]
    async fn test_tutor_and_parent_visibility() {
        let storage = SeaOrmStorage::in_memory().await;
        let tutor = seed_user(&storage, "tutor", UserRole::Tutor).await;
        let parent = seed_user(&storage, "parent", UserRole::Parent).await;
        let s1 = seed_student(&storage, "S1").await;
        let s2 = seed_student(&storage, "S2").await;

        storage
            .create_enrollment_impl(CreateEnrollmentRequest {
                student_id: s1.id,
                tutor_id: tutor.id,
                subject: None,
                status: None,
            })
            .await
            .unwrap();
        storage
            .create_enrollment_impl(CreateEnrollmentRequest {
                student_id: s2.id,
                tutor_id: tutor.id,
                subject: None,
                status: Some(EnrollmentStatus::Archived),
            })
            .await
            .unwrap();
        assert_eq!(
            storage.tutor_student_ids_impl(tutor.id).await.unwrap(),
            vec![s1.id]
        );

        storage
            .create_family_tie_impl(CreateFamilyTieRequest {
                parent_id: parent.id,
                student_id: s2.id,
                access_level: None,
                is_confirmed: Some(false),
            })
            .await
            .unwrap();
        assert!(
            storage
                .parent_student_ids_impl(parent.id)
                .await
                .unwrap()
                .is_empty()
        );
    }

    #[tokio::test]
    async fn test_archive_and_count() {
        let storage = SeaOrmStorage::in_memory().await;
        let s = seed_student(&storage, "X").await;
        storage
            .update_student_impl(
                s.id,
                UpdateStudentRequest {
                    is_active: Some(false),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(storage.count_students_impl(true).await.unwrap(), 0);
        assert_eq!(storage.count_students_impl(false).await.unwrap(), 1);
    }
}
