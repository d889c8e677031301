use actix_web::{HttpRequest, HttpResponse, Result as ActixResult, web};
use once_cell::sync::Lazy;

use crate::middlewares::{self, RequireRole};
use crate::models::remote_admin::SyncLessonsRequest;
use crate::models::users::entities::UserRole;
use crate::services::EnvironmentService;
use crate::services::environments::proxy::ProxyCall;
use crate::utils::{SafeEnvName, SafeIDI64};

static ENVIRONMENT_SERVICE: Lazy<EnvironmentService> = Lazy::new(EnvironmentService::new_lazy);

pub async fn environments() -> ActixResult<HttpResponse> {
    ENVIRONMENT_SERVICE.environments().await
}

pub async fn list_users(
    req: HttpRequest,
    env: SafeEnvName,
    query: web::Query<Vec<(String, String)>>,
) -> ActixResult<HttpResponse> {
    ENVIRONMENT_SERVICE
        .proxy(&env.0, ProxyCall::ListUsers(query.into_inner()), &req)
        .await
}

pub async fn create_user(
    req: HttpRequest,
    env: SafeEnvName,
    body: web::Json<serde_json::Value>,
) -> ActixResult<HttpResponse> {
    ENVIRONMENT_SERVICE
        .proxy(&env.0, ProxyCall::CreateUser(body.into_inner()), &req)
        .await
}

pub async fn get_user(
    req: HttpRequest,
    env: SafeEnvName,
    user_id: SafeIDI64,
) -> ActixResult<HttpResponse> {
    ENVIRONMENT_SERVICE
        .proxy(&env.0, ProxyCall::GetUser(user_id.0), &req)
        .await
}

pub async fn update_user(
    req: HttpRequest,
    env: SafeEnvName,
    user_id: SafeIDI64,
    body: web::Json<serde_json::Value>,
) -> ActixResult<HttpResponse> {
    ENVIRONMENT_SERVICE
        .proxy(&env.0, ProxyCall::UpdateUser(user_id.0, body.into_inner()), &req)
        .await
}

pub async fn delete_user(
    req: HttpRequest,
    env: SafeEnvName,
    user_id: SafeIDI64,
) -> ActixResult<HttpResponse> {
    ENVIRONMENT_SERVICE
        .proxy(&env.0, ProxyCall::DeleteUser(user_id.0), &req)
        .await
}

pub async fn stats(req: HttpRequest, env: SafeEnvName) -> ActixResult<HttpResponse> {
    ENVIRONMENT_SERVICE.proxy(&env.0, ProxyCall::Stats, &req).await
}

pub async fn start_sync(
    req: HttpRequest,
    data: web::Json<SyncLessonsRequest>,
) -> ActixResult<HttpResponse> {
    ENVIRONMENT_SERVICE.start_sync(data.into_inner(), &req).await
}

pub async fn sync_status() -> ActixResult<HttpResponse> {
    ENVIRONMENT_SERVICE.sync_status().await
}

// creator 专用的出站管理接口
pub fn configure_remote_admin_proxy_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api/v1/remote-admin")
            .wrap(RequireRole::new_any(UserRole::creator_roles()))
            .wrap(middlewares::RequireJWT)
            .route("/environments", web::get().to(environments))
            .route("/sync/lessons", web::post().to(start_sync))
            .route("/sync/status", web::get().to(sync_status))
            .route("/{env}/users", web::get().to(list_users))
            .route("/{env}/users", web::post().to(create_user))
            .route("/{env}/users/{id}", web::get().to(get_user))
            .route("/{env}/users/{id}", web::post().to(update_user))
            .route("/{env}/users/{id}", web::delete().to(delete_user))
            .route("/{env}/stats", web::get().to(stats)),
    );
}
