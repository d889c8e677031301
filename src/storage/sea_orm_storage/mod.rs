//! SeaORM 存储实现
//!
//! 统一的数据库存储层，支持 SQLite、PostgreSQL 和 MySQL。

mod audit_logs;
mod enrollments;
mod family_ties;
mod lessons;
mod maintenance;
mod role_permissions;
mod students;
mod users;

use crate::config::AppConfig;
use crate::errors::{Result, TutorHubError};
use migration::{Migrator, MigratorTrait};
use sea_orm::{ConnectOptions, Database, DatabaseConnection};
use std::time::Duration;
use tracing::info;

/// SeaORM 存储实现
#[derive(Clone)]
pub struct SeaOrmStorage {
    pub(crate) db: DatabaseConnection,
}

impl SeaOrmStorage {
    /// 创建新的 SeaORM 存储实例
    pub async fn new_async() -> Result<Self> {
        let config = AppConfig::get();
        let db_url = Self::build_database_url(&config.database.url)?;

        let db = if db_url.starts_with("sqlite:") {
            Self::connect_sqlite(&db_url, config).await?
        } else {
            Self::connect_generic(&db_url, config).await?
        };

        Self::migrate(&db).await?;

        info!("SeaORM 存储初始化完成，数据库: {}", db_url);

        Ok(Self { db })
    }

    async fn migrate(db: &DatabaseConnection) -> Result<()> {
        Migrator::up(db, None)
            .await
            .map_err(|e| TutorHubError::database_operation(format!("数据库迁移失败: {e}")))
    }

    /// SQLite 专用连接（WAL + pragma 优化）
    async fn connect_sqlite(url: &str, config: &AppConfig) -> Result<DatabaseConnection> {
        use sea_orm::SqlxSqliteConnector;
        use sea_orm::sqlx::sqlite::{
            SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions, SqliteSynchronous,
        };
        use std::str::FromStr;

        let opt = SqliteConnectOptions::from_str(url)
            .map_err(|e| TutorHubError::database_config(format!("SQLite URL 解析失败: {e}")))?
            .create_if_missing(true)
            .journal_mode(SqliteJournalMode::Wal)
            .synchronous(SqliteSynchronous::Normal)
            .busy_timeout(Duration::from_secs(5))
            .foreign_keys(true)
            .pragma("cache_size", "-64000")
            .pragma("temp_store", "memory");

        let pool = SqlitePoolOptions::new()
            .max_connections(config.database.pool_size)
            .min_connections(1)
            .acquire_timeout(Duration::from_secs(config.database.timeout))
            .idle_timeout(Duration::from_secs(300))
            .connect_with(opt)
            .await
            .map_err(|e| TutorHubError::database_connection(format!("SQLite 连接失败: {e}")))?;

        Ok(SqlxSqliteConnector::from_sqlx_sqlite_pool(pool))
    }

    /// 通用连接（PostgreSQL、MySQL 等）
    async fn connect_generic(url: &str, config: &AppConfig) -> Result<DatabaseConnection> {
        let mut opt = ConnectOptions::new(url);
        opt.max_connections(config.database.pool_size)
            .min_connections(2)
            .connect_timeout(Duration::from_secs(config.database.timeout))
            .acquire_timeout(Duration::from_secs(config.database.timeout))
            .idle_timeout(Duration::from_secs(600))
            .max_lifetime(Duration::from_secs(1800))
            .sqlx_logging(false);

        Database::connect(opt)
            .await
            .map_err(|e| TutorHubError::database_connection(format!("无法连接到数据库: {e}")))
    }

    /// 从 URL 推断数据库类型并构建连接 URL
    fn build_database_url(url: &str) -> Result<String> {
        if url.starts_with("sqlite:") {
            Ok(url.to_string())
        } else if url.ends_with(".db") || url.ends_with(".sqlite") {
            Ok(format!("sqlite://{url}?mode=rwc"))
        } else if url.starts_with("postgres://")
            || url.starts_with("postgresql://")
            || url.starts_with("mysql://")
            || url.starts_with("mariadb://")
        {
            Ok(url.to_string())
        } else {
            Err(TutorHubError::database_config(format!(
                "无法从 URL 推断数据库类型: {url}. 支持: sqlite://, postgres://, mysql://, 或 .db/.sqlite 文件路径"
            )))
        }
    }

    /// 测试用内存库：单连接保证所有查询落在同一个库上
    #[cfg(test)]
    pub(crate) async fn in_memory() -> Self {
        let mut opt = ConnectOptions::new("sqlite::memory:");
        opt.max_connections(1).min_connections(1).sqlx_logging(false);
        let db = Database::connect(opt).await.expect("connect in-memory sqlite");
        Self::migrate(&db).await.expect("run migrations");
        Self { db }
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::SeaOrmStorage;
    use crate::models::students::{entities::Student, requests::CreateStudentRequest};
    use crate::models::users::{
        entities::{User, UserRole},
        requests::CreateUserRequest,
    };

    pub fn new_user(username: &str, role: UserRole) -> CreateUserRequest {
        CreateUserRequest {
            username: username.to_string(),
            email: format!("{username}@example.com"),
            password: "hash".to_string(),
            role,
            display_name: None,
        }
    }

    pub async fn seed_user(storage: &SeaOrmStorage, username: &str, role: UserRole) -> User {
        storage
            .create_user_impl(new_user(username, role))
            .await
            .expect("seed user")
    }

    pub async fn seed_student(storage: &SeaOrmStorage, name: &str) -> Student {
        storage
            .create_student_impl(CreateStudentRequest {
                name: name.to_string(),
                ..Default::default()
            })
            .await
            .expect("seed student")
    }
}

// Storage trait 实现
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
        entities::Student,
        requests::{CreateStudentRequest, StudentListQuery, UpdateStudentRequest},
        responses::StudentListResponse,
    },
    users::{
        entities::{User, UserRole},
        requests::{CreateUserRequest, UpdateUserRequest, UserListQuery},
        responses::UserListResponse,
    },
};
use crate::storage::{FamilySide, Storage};
use async_trait::async_trait;
use chrono::{DateTime, Utc};

#[async_trait]
impl Storage for SeaOrmStorage {
    // 用户模块
    async fn create_user(&self, user: CreateUserRequest) -> Result<User> {
        self.create_user_impl(user).await
    }

    async fn get_user_by_id(&self, id: i64) -> Result<Option<User>> {
        self.get_user_by_id_impl(id).await
    }

    async fn get_user_by_username(&self, username: &str) -> Result<Option<User>> {
        self.get_user_by_username_impl(username).await
    }

    async fn get_user_by_email(&self, email: &str) -> Result<Option<User>> {
        self.get_user_by_email_impl(email).await
    }

    async fn get_user_by_username_or_email(&self, identifier: &str) -> Result<Option<User>> {
        self.get_user_by_username_or_email_impl(identifier).await
    }

    async fn get_user_by_calendar_token(&self, token: &str) -> Result<Option<User>> {
        self.get_user_by_calendar_token_impl(token).await
    }

    async fn list_users_with_pagination(&self, query: UserListQuery) -> Result<UserListResponse> {
        self.list_users_with_pagination_impl(query).await
    }

    async fn list_users(
        &self,
        role: Option<UserRole>,
        is_active: Option<bool>,
    ) -> Result<Vec<User>> {
        self.list_users_impl(role, is_active).await
    }

    async fn update_user(&self, id: i64, update: UpdateUserRequest) -> Result<Option<User>> {
        self.update_user_impl(id, update).await
    }

    async fn delete_user(&self, id: i64) -> Result<bool> {
        self.delete_user_impl(id).await
    }

    async fn update_last_login(&self, id: i64) -> Result<bool> {
        self.update_last_login_impl(id).await
    }

    async fn set_calendar_token(&self, id: i64, token: Option<String>) -> Result<bool> {
        self.set_calendar_token_impl(id, token).await
    }

    async fn count_users(&self, role: Option<UserRole>, active_only: bool) -> Result<u64> {
        self.count_users_impl(role, active_only).await
    }

    // 学生模块
    async fn create_student(&self, student: CreateStudentRequest) -> Result<Student> {
        self.create_student_impl(student).await
    }

    async fn get_student_by_id(&self, id: i64) -> Result<Option<Student>> {
        self.get_student_by_id_impl(id).await
    }

    async fn get_student_by_user_id(&self, user_id: i64) -> Result<Option<Student>> {
        self.get_student_by_user_id_impl(user_id).await
    }

    async fn get_student_by_platform_id(&self, platform_id: &str) -> Result<Option<Student>> {
        self.get_student_by_platform_id_impl(platform_id).await
    }

    async fn list_students_with_pagination(
        &self,
        query: StudentListQuery,
    ) -> Result<StudentListResponse> {
        self.list_students_with_pagination_impl(query).await
    }

    async fn get_students_by_ids(&self, ids: &[i64]) -> Result<Vec<Student>> {
        self.get_students_by_ids_impl(ids).await
    }

    async fn update_student(
        &self,
        id: i64,
        update: UpdateStudentRequest,
    ) -> Result<Option<Student>> {
        self.update_student_impl(id, update).await
    }

    async fn count_students(&self, is_active: bool) -> Result<u64> {
        self.count_students_impl(is_active).await
    }

    async fn tutor_student_ids(&self, tutor_id: i64) -> Result<Vec<i64>> {
        self.tutor_student_ids_impl(tutor_id).await
    }

    async fn parent_student_ids(&self, parent_id: i64) -> Result<Vec<i64>> {
        self.parent_student_ids_impl(parent_id).await
    }

    // 课程模块
    async fn create_lesson(&self, lesson: NewLesson) -> Result<Lesson> {
        self.create_lesson_impl(lesson).await
    }

    async fn get_lesson_by_id(&self, id: i64) -> Result<Option<Lesson>> {
        self.get_lesson_by_id_impl(id).await
    }

    async fn list_student_lessons_between(
        &self,
        student_id: i64,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<Vec<Lesson>> {
        self.list_student_lessons_between_impl(student_id, from, to)
            .await
    }

    async fn list_tutor_lessons_between(
        &self,
        tutor_id: i64,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<Vec<Lesson>> {
        self.list_tutor_lessons_between_impl(tutor_id, from, to).await
    }

    async fn list_lessons_in_range(&self, query: LessonRangeQuery) -> Result<Vec<Lesson>> {
        self.list_lessons_in_range_impl(query).await
    }

    async fn update_lesson(&self, id: i64, patch: LessonPatch) -> Result<Option<Lesson>> {
        self.update_lesson_impl(id, patch).await
    }

    async fn delete_lesson(&self, id: i64) -> Result<bool> {
        self.delete_lesson_impl(id).await
    }

    async fn count_lessons(&self, status: Option<LessonStatus>) -> Result<u64> {
        self.count_lessons_impl(status).await
    }

    async fn list_remote_lessons(
        &self,
        from: Option<DateTime<Utc>>,
        to: Option<DateTime<Utc>>,
    ) -> Result<Vec<RemoteLesson>> {
        self.list_remote_lessons_impl(from, to).await
    }

    async fn lesson_exists(
        &self,
        student_id: i64,
        starts_at: DateTime<Utc>,
        duration_minutes: i32,
    ) -> Result<bool> {
        self.lesson_exists_impl(student_id, starts_at, duration_minutes)
            .await
    }

    // 导师关系模块
    async fn create_enrollment(&self, req: CreateEnrollmentRequest) -> Result<Enrollment> {
        self.create_enrollment_impl(req).await
    }

    async fn get_enrollment_by_id(&self, id: i64) -> Result<Option<Enrollment>> {
        self.get_enrollment_by_id_impl(id).await
    }

    async fn update_enrollment(
        &self,
        id: i64,
        update: UpdateEnrollmentRequest,
    ) -> Result<Option<Enrollment>> {
        self.update_enrollment_impl(id, update).await
    }

    async fn delete_enrollment(&self, id: i64) -> Result<bool> {
        self.delete_enrollment_impl(id).await
    }

    async fn list_student_enrollments(&self, student_id: i64) -> Result<Vec<Enrollment>> {
        self.list_student_enrollments_impl(student_id).await
    }

    async fn list_enrollments(&self, include_archived: bool) -> Result<Vec<Enrollment>> {
        self.list_enrollments_impl(include_archived).await
    }

    async fn assign_general_tutor(
        &self,
        student_id: i64,
        tutor_id: Option<i64>,
        replace: bool,
    ) -> Result<()> {
        self.assign_general_tutor_impl(student_id, tutor_id, replace)
            .await
    }

    // 家庭关系模块
    async fn create_family_tie(&self, req: CreateFamilyTieRequest) -> Result<FamilyTie> {
        self.create_family_tie_impl(req).await
    }

    async fn get_family_tie_by_id(&self, id: i64) -> Result<Option<FamilyTie>> {
        self.get_family_tie_by_id_impl(id).await
    }

    async fn update_family_tie(
        &self,
        id: i64,
        update: UpdateFamilyTieRequest,
    ) -> Result<Option<FamilyTie>> {
        self.update_family_tie_impl(id, update).await
    }

    async fn delete_family_tie(&self, id: i64) -> Result<bool> {
        self.delete_family_tie_impl(id).await
    }

    async fn list_family_ties(&self, side: FamilySide) -> Result<Vec<FamilyTie>> {
        self.list_family_ties_impl(side).await
    }

    async fn list_all_family_ties(&self) -> Result<Vec<FamilyTie>> {
        self.list_all_family_ties_impl().await
    }

    async fn sync_family_ties(
        &self,
        side: FamilySide,
        related_ids: &[i64],
        replace: bool,
    ) -> Result<()> {
        self.sync_family_ties_impl(side, related_ids, replace).await
    }

    // 权限模块
    async fn list_role_permissions(&self) -> Result<Vec<RolePermission>> {
        self.list_role_permissions_impl().await
    }

    async fn replace_role_permissions(&self, role: &str, rows: Vec<(String, bool)>) -> Result<()> {
        self.replace_role_permissions_impl(role, rows).await
    }

    async fn insert_missing_role_permissions(&self, rows: Vec<RolePermission>) -> Result<u64> {
        self.insert_missing_role_permissions_impl(rows).await
    }

    // 审计模块
    async fn insert_audit_log(&self, entry: AuditEntry) -> Result<()> {
        self.insert_audit_log_impl(entry).await
    }

    async fn list_audit_logs(&self, query: AuditLogQuery) -> Result<AuditLogListResponse> {
        self.list_audit_logs_impl(query).await
    }

    async fn count_audit_logs(&self, since: Option<DateTime<Utc>>) -> Result<u64> {
        self.count_audit_logs_impl(since).await
    }

    async fn delete_user_audit_logs(&self, user_id: i64) -> Result<u64> {
        self.delete_user_audit_logs_impl(user_id).await
    }

    // 维护模式
    async fn get_maintenance(&self) -> Result<MaintenanceStatus> {
        self.get_maintenance_impl().await
    }

    async fn set_maintenance(
        &self,
        enabled: bool,
        message: Option<String>,
        updated_by: Option<i64>,
    ) -> Result<MaintenanceStatus> {
        self.set_maintenance_impl(enabled, message, updated_by).await
    }
}
