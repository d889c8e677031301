use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};
use std::sync::Arc;
use tracing::{info, warn};

use super::{RemoteAdminService, bad_request};
use crate::errors::Result;
use crate::models::relations::{EnrollmentStatus, GENERAL_SUBJECT};
use crate::models::remote_admin::{
    RemoteUserDeleted, RemoteUserDetail, RemoteUserListParams, RemoteUserUpsertRequest,
};
use crate::models::students::requests::{CreateStudentRequest, UpdateStudentRequest};
use crate::models::users::entities::{User, UserRole, UserStatus};
use crate::models::users::requests::{CreateUserRequest, UpdateUserRequest};
use crate::models::{ApiResponse, ErrorCode};
use crate::services::users::check_identity_taken;
use crate::services::{audit, internal_error};
use crate::storage::{FamilySide, Storage};
use crate::utils::password::hash_password;
use crate::utils::validate::{
    validate_email, validate_password, validate_platform_id, validate_username,
};

fn user_not_found() -> HttpResponse {
    HttpResponse::NotFound().json(ApiResponse::error_empty(
        ErrorCode::UserNotFound,
        "User not found",
    ))
}

fn creator_protected() -> HttpResponse {
    HttpResponse::Forbidden().json(ApiResponse::error_empty(
        ErrorCode::Forbidden,
        "The creator account cannot be managed remotely",
    ))
}

fn status_of(is_active: bool) -> UserStatus {
    if is_active {
        UserStatus::Active
    } else {
        UserStatus::Inactive
    }
}

fn parse_role(raw: Option<&str>) -> std::result::Result<Option<UserRole>, HttpResponse> {
    match raw.map(str::trim).filter(|s| !s.is_empty()) {
        None => Ok(None),
        Some(raw) => raw
            .parse::<UserRole>()
            .map(Some)
            .map_err(|msg| bad_request(ErrorCode::RoleInvalid, msg)),
    }
}

/// 用户及其学生档案、导师和家庭关系
async fn load_detail(storage: &Arc<dyn Storage>, user: User) -> Result<RemoteUserDetail> {
    let student = storage.get_student_by_user_id(user.id).await?;

    let mut tutor_id = None;
    let mut parent_ids = Vec::new();
    if let Some(ref student) = student {
        tutor_id = storage
            .list_student_enrollments(student.id)
            .await?
            .into_iter()
            .find(|e| e.subject == GENERAL_SUBJECT && e.status == EnrollmentStatus::Active)
            .map(|e| e.tutor_id);
        parent_ids = storage
            .list_family_ties(FamilySide::Student(student.id))
            .await?
            .into_iter()
            .map(|t| t.parent_id)
            .collect();
    }

    let child_ids = if user.role == UserRole::Parent {
        storage
            .list_family_ties(FamilySide::Parent(user.id))
            .await?
            .into_iter()
            .map(|t| t.student_id)
            .collect()
    } else {
        Vec::new()
    };

    Ok(RemoteUserDetail {
        user,
        student,
        tutor_id,
        parent_ids,
        child_ids,
    })
}

/// 学生账号保证有对应的学生档案，并按请求维护导师与家庭关系
async fn apply_relations(
    storage: &Arc<dyn Storage>,
    user: &User,
    data: &RemoteUserUpsertRequest,
) -> Result<()> {
    if user.role == UserRole::Student {
        let student = match storage.get_student_by_user_id(user.id).await? {
            Some(student) => {
                if let Some(ref platform_id) = data.platform_id
                    && student.platform_id.as_deref() != Some(platform_id.as_str())
                {
                    storage
                        .update_student(
                            student.id,
                            UpdateStudentRequest {
                                platform_id: Some(platform_id.clone()),
                                ..Default::default()
                            },
                        )
                        .await?;
                }
                student
            }
            None => {
                storage
                    .create_student(CreateStudentRequest {
                        name: user.visible_name().to_string(),
                        user_id: Some(user.id),
                        platform_id: data.platform_id.clone(),
                        email: Some(user.email.clone()),
                        ..Default::default()
                    })
                    .await?
            }
        };

        if let Some(tutor_id) = data.tutor_id {
            storage
                .assign_general_tutor(student.id, tutor_id, true)
                .await?;
        }
        if let Some(ref parent_ids) = data.parent_ids {
            storage
                .sync_family_ties(FamilySide::Student(student.id), parent_ids, true)
                .await?;
        }
    }

    if user.role == UserRole::Parent
        && let Some(ref child_ids) = data.child_ids
    {
        storage
            .sync_family_ties(FamilySide::Parent(user.id), child_ids, true)
            .await?;
    }
    Ok(())
}

pub async fn list_users(
    service: &RemoteAdminService,
    params: RemoteUserListParams,
    request: &HttpRequest,
) -> ActixResult<HttpResponse> {
    let storage = service.get_storage(request)?;
    let role = match parse_role(params.role.as_deref()) {
        Ok(role) => role,
        Err(resp) => return Ok(resp),
    };

    match storage.list_users(role, params.is_active).await {
        Ok(users) => Ok(HttpResponse::Ok().json(ApiResponse::success(
            users,
            "Users retrieved successfully",
        ))),
        Err(e) => Ok(internal_error("Failed to list users", e)),
    }
}

pub async fn get_user(
    service: &RemoteAdminService,
    user_id: i64,
    request: &HttpRequest,
) -> ActixResult<HttpResponse> {
    let storage = service.get_storage(request)?;
    let user = match storage.get_user_by_id(user_id).await {
        Ok(Some(user)) => user,
        Ok(None) => return Ok(user_not_found()),
        Err(e) => return Ok(internal_error("Failed to load user", e)),
    };

    match load_detail(&storage, user).await {
        Ok(detail) => Ok(HttpResponse::Ok().json(ApiResponse::success(
            detail,
            "User retrieved successfully",
        ))),
        Err(e) => Ok(internal_error("Failed to load user relations", e)),
    }
}

pub async fn create_user(
    service: &RemoteAdminService,
    data: RemoteUserUpsertRequest,
    request: &HttpRequest,
) -> ActixResult<HttpResponse> {
    let storage = service.get_storage(request)?;

    let (Some(username), Some(email), Some(password)) = (
        data.username.as_deref().map(str::trim),
        data.email.as_deref().map(|e| e.trim().to_lowercase()),
        data.password.as_deref(),
    ) else {
        return Ok(bad_request(
            ErrorCode::ValidationFailed,
            "username, email and password are required",
        ));
    };
    let role = match parse_role(data.role.as_deref()) {
        Ok(Some(role)) => role,
        Ok(None) => return Ok(bad_request(ErrorCode::RoleInvalid, "role is required")),
        Err(resp) => return Ok(resp),
    };
    if role == UserRole::Creator {
        return Ok(creator_protected());
    }

    if let Err(msg) = validate_username(username) {
        return Ok(bad_request(ErrorCode::UserNameInvalid, msg));
    }
    if let Err(msg) = validate_email(&email) {
        return Ok(bad_request(ErrorCode::UserEmailInvalid, msg));
    }
    if let Err(msg) = validate_password(password) {
        return Ok(bad_request(ErrorCode::UserPasswordInvalid, msg));
    }
    if let Some(ref platform_id) = data.platform_id
        && let Err(msg) = validate_platform_id(platform_id)
    {
        return Ok(bad_request(ErrorCode::StudentInvalidField, msg));
    }

    match check_identity_taken(&storage, Some(username), Some(&email), None).await {
        Ok(Some(conflict)) => return Ok(conflict),
        Ok(None) => {}
        Err(e) => return Ok(internal_error("User creation failed", e)),
    }

    let password_hash = match hash_password(password) {
        Ok(hash) => hash,
        Err(e) => return Ok(internal_error("Password hashing failed", e)),
    };

    let user = match storage
        .create_user(CreateUserRequest {
            username: username.to_string(),
            email,
            password: password_hash,
            role,
            display_name: data.display_name.clone(),
        })
        .await
    {
        Ok(user) => user,
        Err(e) => return Ok(internal_error("User creation failed", e)),
    };

    let user = if data.is_active == Some(false) {
        match storage
            .update_user(
                user.id,
                UpdateUserRequest {
                    status: Some(UserStatus::Inactive),
                    ..Default::default()
                },
            )
            .await
        {
            Ok(Some(updated)) => updated,
            Ok(None) => user,
            Err(e) => return Ok(internal_error("User creation failed", e)),
        }
    } else {
        user
    };

    if let Err(e) = apply_relations(&storage, &user, &data).await {
        warn!("Remote user {} created but relations failed: {}", user.id, e);
        return Ok(internal_error("Failed to apply user relations", e));
    }

    info!("Remote user created: {} ({})", user.username, user.role);
    audit::record(
        audit::entry_for(request, "remote_create_user")
            .entity("user", user.id)
            .metadata(serde_json::json!({
                "username": user.username,
                "role": user.role,
            })),
    );

    match load_detail(&storage, user).await {
        Ok(detail) => Ok(HttpResponse::Created().json(ApiResponse::success(
            detail,
            "User created successfully",
        ))),
        Err(e) => Ok(internal_error("Failed to load user relations", e)),
    }
}

pub async fn update_user(
    service: &RemoteAdminService,
    user_id: i64,
    data: RemoteUserUpsertRequest,
    request: &HttpRequest,
) -> ActixResult<HttpResponse> {
    let storage = service.get_storage(request)?;

    let existing = match storage.get_user_by_id(user_id).await {
        Ok(Some(user)) => user,
        Ok(None) => return Ok(user_not_found()),
        Err(e) => return Ok(internal_error("Failed to load user", e)),
    };
    if existing.role == UserRole::Creator {
        return Ok(creator_protected());
    }

    let role = match parse_role(data.role.as_deref()) {
        Ok(role) => role,
        Err(resp) => return Ok(resp),
    };
    if role == Some(UserRole::Creator) {
        return Ok(creator_protected());
    }

    let username = data.username.as_deref().map(str::trim);
    let email = data.email.as_deref().map(|e| e.trim().to_lowercase());
    if let Some(username) = username
        && let Err(msg) = validate_username(username)
    {
        return Ok(bad_request(ErrorCode::UserNameInvalid, msg));
    }
    if let Some(ref email) = email
        && let Err(msg) = validate_email(email)
    {
        return Ok(bad_request(ErrorCode::UserEmailInvalid, msg));
    }
    if let Some(ref platform_id) = data.platform_id
        && let Err(msg) = validate_platform_id(platform_id)
    {
        return Ok(bad_request(ErrorCode::StudentInvalidField, msg));
    }

    match check_identity_taken(&storage, username, email.as_deref(), Some(user_id)).await {
        Ok(Some(conflict)) => return Ok(conflict),
        Ok(None) => {}
        Err(e) => return Ok(internal_error("User update failed", e)),
    }

    let password = match data.password.as_deref() {
        Some(password) => {
            if let Err(msg) = validate_password(password) {
                return Ok(bad_request(ErrorCode::UserPasswordInvalid, msg));
            }
            match hash_password(password) {
                Ok(hash) => Some(hash),
                Err(e) => return Ok(internal_error("Password hashing failed", e)),
            }
        }
        None => None,
    };

    let update = UpdateUserRequest {
        username: username.map(str::to_string),
        email,
        password,
        role,
        status: data.is_active.map(status_of),
        display_name: data.display_name.clone(),
    };

    let user = match storage.update_user(user_id, update).await {
        Ok(Some(user)) => user,
        Ok(None) => return Ok(user_not_found()),
        Err(e) => return Ok(internal_error("User update failed", e)),
    };

    if let Err(e) = apply_relations(&storage, &user, &data).await {
        return Ok(internal_error("Failed to apply user relations", e));
    }

    audit::record(
        audit::entry_for(request, "remote_update_user")
            .entity("user", user.id)
            .metadata(serde_json::json!({
                "old_role": existing.role,
                "new_role": user.role,
                "tutor_changed": data.tutor_id.is_some(),
                "parents_changed": data.parent_ids.is_some(),
                "children_changed": data.child_ids.is_some(),
            })),
    );

    match load_detail(&storage, user).await {
        Ok(detail) => Ok(HttpResponse::Ok().json(ApiResponse::success(
            detail,
            "User updated successfully",
        ))),
        Err(e) => Ok(internal_error("Failed to load user relations", e)),
    }
}

pub async fn delete_user(
    service: &RemoteAdminService,
    user_id: i64,
    request: &HttpRequest,
) -> ActixResult<HttpResponse> {
    let storage = service.get_storage(request)?;

    let user = match storage.get_user_by_id(user_id).await {
        Ok(Some(user)) => user,
        Ok(None) => return Ok(user_not_found()),
        Err(e) => return Ok(internal_error("Failed to load user", e)),
    };
    if user.role == UserRole::Creator {
        return Ok(creator_protected());
    }

    // 先删该用户的审计日志，再删用户
    let deleted_logs = match storage.delete_user_audit_logs(user_id).await {
        Ok(n) => n,
        Err(e) => return Ok(internal_error("Failed to delete user audit logs", e)),
    };

    match storage.delete_user(user_id).await {
        Ok(true) => {
            info!(
                "Remote user deleted: {} ({} audit logs removed)",
                user.username, deleted_logs
            );
            audit::record(
                audit::entry_for(request, "remote_delete_user")
                    .entity("user", user_id)
                    .metadata(serde_json::json!({
                        "username": user.username,
                        "deleted_logs": deleted_logs,
                    })),
            );
            Ok(HttpResponse::Ok().json(ApiResponse::success(
                RemoteUserDeleted {
                    user_id,
                    deleted_logs,
                },
                "User deleted successfully",
            )))
        }
        Ok(false) => Ok(user_not_found()),
        Err(e) => Ok(internal_error("User deletion failed", e)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::sea_orm_storage::SeaOrmStorage;
    use crate::storage::sea_orm_storage::test_support::{seed_student, seed_user};

    #[test]
    fn test_parse_role() {
        assert_eq!(parse_role(None).ok(), Some(None));
        assert_eq!(parse_role(Some(" ")).ok(), Some(None));
        assert_eq!(parse_role(Some("tutor")).ok(), Some(Some(UserRole::Tutor)));
        assert!(parse_role(Some("janitor")).is_err());
    }

    #[tokio::test]
    async fn test_apply_relations_for_student_account() {
        let db = SeaOrmStorage::in_memory().await;
        let tutor = seed_user(&db, "tutor", UserRole::Tutor).await;
        let mom = seed_user(&db, "mom", UserRole::Parent).await;
        let kid = seed_user(&db, "kid", UserRole::Student).await;
        let storage: Arc<dyn Storage> = Arc::new(db);

        let data: RemoteUserUpsertRequest = serde_json::from_value(serde_json::json!({
            "platform_id": "123",
            "tutor_id": tutor.id,
            "parent_ids": [mom.id],
        }))
        .unwrap();
        apply_relations(&storage, &kid, &data).await.unwrap();

        let detail = load_detail(&storage, kid.clone()).await.unwrap();
        let student = detail.student.expect("student profile created");
        assert_eq!(student.platform_id.as_deref(), Some("123"));
        assert_eq!(detail.tutor_id, Some(tutor.id));
        assert_eq!(detail.parent_ids, vec![mom.id]);

        // 显式 null 归档导师关系，缺失的字段不动
        let data: RemoteUserUpsertRequest =
            serde_json::from_value(serde_json::json!({ "tutor_id": null })).unwrap();
        apply_relations(&storage, &kid, &data).await.unwrap();
        let detail = load_detail(&storage, kid).await.unwrap();
        assert_eq!(detail.tutor_id, None);
        assert_eq!(detail.parent_ids, vec![mom.id]);
    }

    #[tokio::test]
    async fn test_parent_child_ids() {
        let db = SeaOrmStorage::in_memory().await;
        let mom = seed_user(&db, "mom", UserRole::Parent).await;
        let a = seed_student(&db, "A").await;
        let b = seed_student(&db, "B").await;
        let storage: Arc<dyn Storage> = Arc::new(db);

        let data: RemoteUserUpsertRequest =
            serde_json::from_value(serde_json::json!({ "child_ids": [a.id, b.id] })).unwrap();
        apply_relations(&storage, &mom, &data).await.unwrap();
        let mut children = load_detail(&storage, mom.clone()).await.unwrap().child_ids;
        children.sort_unstable();
        assert_eq!(children, vec![a.id, b.id]);

        let data: RemoteUserUpsertRequest =
            serde_json::from_value(serde_json::json!({ "child_ids": [b.id] })).unwrap();
        apply_relations(&storage, &mom, &data).await.unwrap();
        assert_eq!(load_detail(&storage, mom).await.unwrap().child_ids, vec![b.id]);
    }
}
