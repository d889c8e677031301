use actix_web::{HttpRequest, HttpResponse, Result as ActixResult, web};
use once_cell::sync::Lazy;

use super::relations::RELATION_SERVICE;
use crate::middlewares::{RateLimit, RequireAdminToken};
use crate::models::audit::AuditLogParams;
use crate::models::permissions::UpdateRolePermissionsRequest;
use crate::models::relations::{
    CreateEnrollmentRequest, CreateFamilyTieRequest, UpdateEnrollmentRequest,
    UpdateFamilyTieRequest,
};
use crate::models::remote_admin::{
    RemoteLessonParams, RemoteUserListParams, RemoteUserUpsertRequest, SetMaintenanceRequest,
    UserGraphParams,
};
use crate::services::RemoteAdminService;
use crate::utils::SafeIDI64;

static REMOTE_ADMIN_SERVICE: Lazy<RemoteAdminService> = Lazy::new(RemoteAdminService::new_lazy);

pub async fn status(req: HttpRequest) -> ActixResult<HttpResponse> {
    REMOTE_ADMIN_SERVICE.status(&req).await
}

pub async fn stats(req: HttpRequest) -> ActixResult<HttpResponse> {
    REMOTE_ADMIN_SERVICE.stats(&req).await
}

pub async fn list_users(
    req: HttpRequest,
    query: web::Query<RemoteUserListParams>,
) -> ActixResult<HttpResponse> {
    REMOTE_ADMIN_SERVICE.list_users(query.into_inner(), &req).await
}

pub async fn create_user(
    req: HttpRequest,
    data: web::Json<RemoteUserUpsertRequest>,
) -> ActixResult<HttpResponse> {
    REMOTE_ADMIN_SERVICE.create_user(data.into_inner(), &req).await
}

pub async fn users_graph(
    req: HttpRequest,
    query: web::Query<UserGraphParams>,
) -> ActixResult<HttpResponse> {
    REMOTE_ADMIN_SERVICE.users_graph(query.into_inner(), &req).await
}

pub async fn get_user(req: HttpRequest, user_id: SafeIDI64) -> ActixResult<HttpResponse> {
    REMOTE_ADMIN_SERVICE.get_user(user_id.0, &req).await
}

pub async fn update_user(
    req: HttpRequest,
    user_id: SafeIDI64,
    data: web::Json<RemoteUserUpsertRequest>,
) -> ActixResult<HttpResponse> {
    REMOTE_ADMIN_SERVICE
        .update_user(user_id.0, data.into_inner(), &req)
        .await
}

pub async fn delete_user(req: HttpRequest, user_id: SafeIDI64) -> ActixResult<HttpResponse> {
    REMOTE_ADMIN_SERVICE.delete_user(user_id.0, &req).await
}

pub async fn create_family_tie(
    req: HttpRequest,
    data: web::Json<CreateFamilyTieRequest>,
) -> ActixResult<HttpResponse> {
    RELATION_SERVICE.create_family_tie(data.into_inner(), &req).await
}

pub async fn update_family_tie(
    req: HttpRequest,
    tie_id: SafeIDI64,
    data: web::Json<UpdateFamilyTieRequest>,
) -> ActixResult<HttpResponse> {
    RELATION_SERVICE
        .update_family_tie(tie_id.0, data.into_inner(), &req)
        .await
}

pub async fn delete_family_tie(req: HttpRequest, tie_id: SafeIDI64) -> ActixResult<HttpResponse> {
    RELATION_SERVICE.delete_family_tie(tie_id.0, &req).await
}

pub async fn create_enrollment(
    req: HttpRequest,
    data: web::Json<CreateEnrollmentRequest>,
) -> ActixResult<HttpResponse> {
    RELATION_SERVICE.create_enrollment(data.into_inner(), &req).await
}

pub async fn update_enrollment(
    req: HttpRequest,
    enrollment_id: SafeIDI64,
    data: web::Json<UpdateEnrollmentRequest>,
) -> ActixResult<HttpResponse> {
    RELATION_SERVICE
        .update_enrollment(enrollment_id.0, data.into_inner(), &req)
        .await
}

pub async fn delete_enrollment(
    req: HttpRequest,
    enrollment_id: SafeIDI64,
) -> ActixResult<HttpResponse> {
    RELATION_SERVICE.delete_enrollment(enrollment_id.0, &req).await
}

pub async fn get_permissions(req: HttpRequest) -> ActixResult<HttpResponse> {
    REMOTE_ADMIN_SERVICE.get_permissions(&req).await
}

pub async fn update_permissions(
    req: HttpRequest,
    data: web::Json<UpdateRolePermissionsRequest>,
) -> ActixResult<HttpResponse> {
    REMOTE_ADMIN_SERVICE
        .update_permissions(data.into_inner(), &req)
        .await
}

pub async fn get_maintenance(req: HttpRequest) -> ActixResult<HttpResponse> {
    REMOTE_ADMIN_SERVICE.get_maintenance(&req).await
}

pub async fn set_maintenance(
    req: HttpRequest,
    data: web::Json<SetMaintenanceRequest>,
) -> ActixResult<HttpResponse> {
    REMOTE_ADMIN_SERVICE.set_maintenance(data.into_inner(), &req).await
}

pub async fn audit_logs(
    req: HttpRequest,
    query: web::Query<AuditLogParams>,
) -> ActixResult<HttpResponse> {
    REMOTE_ADMIN_SERVICE.audit_logs(query.into_inner(), &req).await
}

pub async fn lessons(
    req: HttpRequest,
    query: web::Query<RemoteLessonParams>,
) -> ActixResult<HttpResponse> {
    REMOTE_ADMIN_SERVICE.lessons(query.into_inner(), &req).await
}

// 令牌鉴权的服务端接口
pub fn configure_remote_admin_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/internal/remote-admin")
            .wrap(RequireAdminToken)
            .wrap(RateLimit::remote_admin())
            .route("/status", web::get().to(status))
            .route("/api/stats", web::get().to(stats))
            .route("/api/users", web::get().to(list_users))
            .route("/api/users", web::post().to(create_user))
            .route("/api/users/graph", web::get().to(users_graph))
            .route("/api/users/{id}", web::get().to(get_user))
            .route("/api/users/{id}", web::post().to(update_user))
            .route("/api/users/{id}", web::delete().to(delete_user))
            .route("/api/family-ties", web::post().to(create_family_tie))
            .route("/api/family-ties/{id}", web::post().to(update_family_tie))
            .route("/api/family-ties/{id}", web::delete().to(delete_family_tie))
            .route("/api/enrollments", web::post().to(create_enrollment))
            .route("/api/enrollments/{id}", web::post().to(update_enrollment))
            .route("/api/enrollments/{id}", web::delete().to(delete_enrollment))
            .route("/api/permissions", web::get().to(get_permissions))
            .route("/api/permissions", web::post().to(update_permissions))
            .route("/api/maintenance", web::get().to(get_maintenance))
            .route("/api/maintenance", web::post().to(set_maintenance))
            .route("/api/audit-logs", web::get().to(audit_logs))
            .route("/api/lessons", web::get().to(lessons)),
    );
}
