use std::sync::Arc;

use chrono::{DateTime, Utc};

use crate::models::{
    audit::{AuditEntry, AuditLogListResponse, AuditLogQuery},
    lessons::{
        entities::{Lesson, LessonPatch, LessonStatus, NewLesson},
        requests::LessonRangeQuery,
    },
    permissions::RolePermission,
    relations::{
        CreateEnrollmentRequest, CreateFamilyTieRequest, Enrollment, FamilyTie,
        UpdateEnrollmentRequest, UpdateFamilyTieRequest,
    },
    remote_admin::{MaintenanceStatus, RemoteLesson},
    students::{
        entities::{Student, StudentScope},
        requests::{CreateStudentRequest, StudentListQuery, UpdateStudentRequest},
        responses::StudentListResponse,
    },
    users::{
        entities::{User, UserRole},
        requests::{CreateUserRequest, UpdateUserRequest, UserListQuery},
        responses::UserListResponse,
    },
};

use crate::errors::Result;

pub mod sea_orm_storage;

/// 家庭关系同步时以哪一方为准
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FamilySide {
    /// 学生档案 id，关联的是家长用户
    Student(i64),
    /// 家长用户 id，关联的是学生档案
    Parent(i64),
}

#[async_trait::async_trait]
pub trait Storage: Send + Sync {
    /// 用户管理方法
    // 创建用户（password 字段已是哈希）
    async fn create_user(&self, user: CreateUserRequest) -> Result<User>;
    // 通过ID获取用户信息
    async fn get_user_by_id(&self, id: i64) -> Result<Option<User>>;
    // 通过用户名获取用户信息
    async fn get_user_by_username(&self, username: &str) -> Result<Option<User>>;
    // 通过邮箱获取用户信息
    async fn get_user_by_email(&self, email: &str) -> Result<Option<User>>;
    // 通过用户名或邮箱获取用户信息
    async fn get_user_by_username_or_email(&self, identifier: &str) -> Result<Option<User>>;
    // 通过日历令牌获取用户
    async fn get_user_by_calendar_token(&self, token: &str) -> Result<Option<User>>;
    // 分页列出用户
    async fn list_users_with_pagination(&self, query: UserListQuery) -> Result<UserListResponse>;
    // 不分页列出用户（远程管理）
    async fn list_users(
        &self,
        role: Option<UserRole>,
        is_active: Option<bool>,
    ) -> Result<Vec<User>>;
    // 更新用户信息
    async fn update_user(&self, id: i64, update: UpdateUserRequest) -> Result<Option<User>>;
    // 删除用户
    async fn delete_user(&self, id: i64) -> Result<bool>;
    // 更新用户最后登录时间
    async fn update_last_login(&self, id: i64) -> Result<bool>;
    // 设置或撤销日历令牌
    async fn set_calendar_token(&self, id: i64, token: Option<String>) -> Result<bool>;
    // 统计用户
    async fn count_users(&self, role: Option<UserRole>, active_only: bool) -> Result<u64>;

    /// 学生管理方法
    async fn create_student(&self, student: CreateStudentRequest) -> Result<Student>;
    async fn get_student_by_id(&self, id: i64) -> Result<Option<Student>>;
    async fn get_student_by_user_id(&self, user_id: i64) -> Result<Option<Student>>;
    async fn get_student_by_platform_id(&self, platform_id: &str) -> Result<Option<Student>>;
    async fn list_students_with_pagination(
        &self,
        query: StudentListQuery,
    ) -> Result<StudentListResponse>;
    // 按 id 批量取学生（课表渲染）
    async fn get_students_by_ids(&self, ids: &[i64]) -> Result<Vec<Student>>;
    async fn update_student(
        &self,
        id: i64,
        update: UpdateStudentRequest,
    ) -> Result<Option<Student>>;
    async fn count_students(&self, is_active: bool) -> Result<u64>;
    // 导师名下未归档的学生
    async fn tutor_student_ids(&self, tutor_id: i64) -> Result<Vec<i64>>;
    // 家长已确认关系的学生
    async fn parent_student_ids(&self, parent_id: i64) -> Result<Vec<i64>>;

    /// 课程管理方法
    async fn create_lesson(&self, lesson: NewLesson) -> Result<Lesson>;
    async fn get_lesson_by_id(&self, id: i64) -> Result<Option<Lesson>>;
    // 学生在 [from, to) 内开始的课程
    async fn list_student_lessons_between(
        &self,
        student_id: i64,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<Vec<Lesson>>;
    // 导师在 [from, to) 内开始的课程
    async fn list_tutor_lessons_between(
        &self,
        tutor_id: i64,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<Vec<Lesson>>;
    async fn list_lessons_in_range(&self, query: LessonRangeQuery) -> Result<Vec<Lesson>>;
    async fn update_lesson(&self, id: i64, patch: LessonPatch) -> Result<Option<Lesson>>;
    async fn delete_lesson(&self, id: i64) -> Result<bool>;
    async fn count_lessons(&self, status: Option<LessonStatus>) -> Result<u64>;
    // 同步用：课程附带学生 platform_id
    async fn list_remote_lessons(
        &self,
        from: Option<DateTime<Utc>>,
        to: Option<DateTime<Utc>>,
    ) -> Result<Vec<RemoteLesson>>;
    // 同一学生、同一开始时间和时长的课程是否已存在
    async fn lesson_exists(
        &self,
        student_id: i64,
        starts_at: DateTime<Utc>,
        duration_minutes: i32,
    ) -> Result<bool>;

    /// 导师关系
    async fn create_enrollment(&self, req: CreateEnrollmentRequest) -> Result<Enrollment>;
    async fn get_enrollment_by_id(&self, id: i64) -> Result<Option<Enrollment>>;
    async fn update_enrollment(
        &self,
        id: i64,
        update: UpdateEnrollmentRequest,
    ) -> Result<Option<Enrollment>>;
    async fn delete_enrollment(&self, id: i64) -> Result<bool>;
    async fn list_student_enrollments(&self, student_id: i64) -> Result<Vec<Enrollment>>;
    // 全部导师关系（关系图）
    async fn list_enrollments(&self, include_archived: bool) -> Result<Vec<Enrollment>>;
    // 管理 GENERAL 科目的导师；tutor_id 为 None 时仅在 replace 下归档
    async fn assign_general_tutor(
        &self,
        student_id: i64,
        tutor_id: Option<i64>,
        replace: bool,
    ) -> Result<()>;

    /// 家庭关系
    async fn create_family_tie(&self, req: CreateFamilyTieRequest) -> Result<FamilyTie>;
    async fn get_family_tie_by_id(&self, id: i64) -> Result<Option<FamilyTie>>;
    async fn update_family_tie(
        &self,
        id: i64,
        update: UpdateFamilyTieRequest,
    ) -> Result<Option<FamilyTie>>;
    async fn delete_family_tie(&self, id: i64) -> Result<bool>;
    async fn list_family_ties(&self, side: FamilySide) -> Result<Vec<FamilyTie>>;
    async fn list_all_family_ties(&self) -> Result<Vec<FamilyTie>>;
    async fn sync_family_ties(
        &self,
        side: FamilySide,
        related_ids: &[i64],
        replace: bool,
    ) -> Result<()>;

    /// 角色权限
    async fn list_role_permissions(&self) -> Result<Vec<RolePermission>>;
    // 整体替换某角色的权限行
    async fn replace_role_permissions(&self, role: &str, rows: Vec<(String, bool)>) -> Result<()>;
    // 仅插入不存在的 (role, permission) 行，返回插入条数
    async fn insert_missing_role_permissions(&self, rows: Vec<RolePermission>) -> Result<u64>;

    /// 审计日志
    async fn insert_audit_log(&self, entry: AuditEntry) -> Result<()>;
    async fn list_audit_logs(&self, query: AuditLogQuery) -> Result<AuditLogListResponse>;
    async fn count_audit_logs(&self, since: Option<DateTime<Utc>>) -> Result<u64>;
    async fn delete_user_audit_logs(&self, user_id: i64) -> Result<u64>;

    /// 维护模式
    async fn get_maintenance(&self) -> Result<MaintenanceStatus>;
    async fn set_maintenance(
        &self,
        enabled: bool,
        message: Option<String>,
        updated_by: Option<i64>,
    ) -> Result<MaintenanceStatus>;
}

/// 数据范围为空集合时可以跳过查询
pub(crate) fn scope_is_empty(scope: &StudentScope) -> bool {
    matches!(scope, StudentScope::Only(ids) if ids.is_empty())
}

pub async fn create_storage() -> Result<Arc<dyn Storage>> {
    let storage = sea_orm_storage::SeaOrmStorage::new_async().await?;
    Ok(Arc::new(storage))
}
