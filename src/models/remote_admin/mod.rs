//! 远程管理 API 的数据结构，服务端与出站客户端共用

use std::collections::BTreeMap;

use serde::{Deserialize, Deserializer, Serialize};

use crate::models::relations::{AccessLevel, EnrollmentStatus};
use crate::models::students::entities::Student;
use crate::models::users::entities::{User, UserRole};

/// 区分“字段缺失”与“显式 null”
fn double_option<'de, T, D>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    T: Deserialize<'de>,
    D: Deserializer<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RemoteStatus {
    pub status: String,
    pub stats: RemoteStatusStats,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RemoteStatusStats {
    pub total_users: u64,
    pub active_users: u64,
    pub total_logs: u64,
    pub today_logs: u64,
    pub maintenance_enabled: bool,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EnvironmentStats {
    pub users: UserStats,
    pub students: StudentStats,
    pub lessons: LessonStats,
    pub audit_logs: AuditLogStats,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UserStats {
    pub total: u64,
    pub active: u64,
    pub by_role: BTreeMap<String, u64>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StudentStats {
    /// 在读学生
    pub total: u64,
    pub archived: u64,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LessonStats {
    pub total: u64,
    pub completed: u64,
    pub planned: u64,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AuditLogStats {
    pub total: u64,
    pub today: u64,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RemoteUserListParams {
    pub role: Option<String>,
    pub is_active: Option<bool>,
}

/// 关系图查询参数
///
/// `roles` 为逗号分隔的角色列表，未知角色忽略，留空时取导师、学生和家长。
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UserGraphParams {
    pub roles: Option<String>,
    pub include_inactive: Option<bool>,
    pub all_enrollments: Option<bool>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserGraphNode {
    pub id: i64,
    pub username: String,
    pub email: String,
    pub role: UserRole,
    pub is_active: bool,
    pub display_name: Option<String>,
    /// 学生账号对应的学生档案
    pub student_id: Option<i64>,
}

/// 导师 → 学生账号
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EnrollmentEdge {
    pub enrollment_id: i64,
    pub from_id: i64,
    pub to_id: i64,
    pub student_id: i64,
    pub subject: String,
    pub status: EnrollmentStatus,
}

/// 家长 → 学生账号
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FamilyTieEdge {
    pub tie_id: i64,
    pub from_id: i64,
    pub to_id: i64,
    pub student_id: i64,
    pub access_level: AccessLevel,
    pub is_confirmed: bool,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UserGraph {
    pub nodes: Vec<UserGraphNode>,
    pub enrollments: Vec<EnrollmentEdge>,
    pub family_ties: Vec<FamilyTieEdge>,
}

/// 远程创建/更新用户
///
/// `tutor_id` 缺失表示不改动导师关系，显式 `null` 表示归档现有关系。
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RemoteUserUpsertRequest {
    pub username: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
    pub role: Option<String>,
    pub is_active: Option<bool>,
    pub display_name: Option<String>,
    pub platform_id: Option<String>,
    #[serde(
        default,
        deserialize_with = "double_option",
        skip_serializing_if = "Option::is_none"
    )]
    pub tutor_id: Option<Option<i64>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_ids: Option<Vec<i64>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub child_ids: Option<Vec<i64>>,
}

/// 用户详情，附带学生档案和关系
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RemoteUserDetail {
    pub user: User,
    pub student: Option<Student>,
    pub tutor_id: Option<i64>,
    #[serde(default)]
    pub parent_ids: Vec<i64>,
    #[serde(default)]
    pub child_ids: Vec<i64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RemoteUserDeleted {
    pub user_id: i64,
    pub deleted_logs: u64,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MaintenanceStatus {
    pub enabled: bool,
    pub message: Option<String>,
    pub updated_by: Option<i64>,
    pub updated_at: Option<chrono::DateTime<chrono::Utc>>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SetMaintenanceRequest {
    #[serde(default)]
    pub enabled: bool,
    pub message: Option<String>,
}

/// 同步用的课程，带学生的 platform_id
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RemoteLesson {
    pub id: i64,
    pub student_id: i64,
    pub platform_id: Option<String>,
    pub lesson_type: String,
    pub starts_at: chrono::DateTime<chrono::Utc>,
    pub duration_minutes: i32,
    pub status: String,
    pub topic: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RemoteLessonParams {
    /// YYYY-MM-DD，UTC
    pub from: Option<String>,
    pub to: Option<String>,
}

/// 远端实例状态
#[derive(Debug, Clone, Serialize)]
pub struct EnvironmentStatus {
    pub name: String,
    pub display_name: String,
    pub configured: bool,
    pub available: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<RemoteStatus>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SyncLessonsRequest {
    pub source: String,
    #[serde(default)]
    pub dry_run: bool,
}

/// 课程同步任务进度
#[derive(Debug, Clone, Default, Serialize)]
pub struct SyncStatus {
    pub running: bool,
    pub source: Option<String>,
    pub dry_run: bool,
    pub started_at: Option<chrono::DateTime<chrono::Utc>>,
    pub finished_at: Option<chrono::DateTime<chrono::Utc>>,
    pub processed: u64,
    pub created: u64,
    pub skipped_existing: u64,
    pub unmatched: u64,
    pub last_error: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tutor_id_missing_vs_null() {
        let missing: RemoteUserUpsertRequest = serde_json::from_str("{}").unwrap();
        assert_eq!(missing.tutor_id, None);

        let null: RemoteUserUpsertRequest = serde_json::from_str(r#"{"tutor_id":null}"#).unwrap();
        assert_eq!(null.tutor_id, Some(None));

        let set: RemoteUserUpsertRequest = serde_json::from_str(r#"{"tutor_id":7}"#).unwrap();
        assert_eq!(set.tutor_id, Some(Some(7)));
    }

    #[test]
    fn test_sync_request_defaults() {
        let req: SyncLessonsRequest = serde_json::from_str(r#"{"source":"production"}"#).unwrap();
        assert!(!req.dry_run);
    }
}
