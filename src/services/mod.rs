pub mod audit;
pub mod auth;
pub mod calendar;
pub mod environments;
pub mod maintenance;
pub mod permissions;
pub mod relations;
pub mod remote_admin;
pub mod schedule;
pub mod students;
pub mod users;

pub use auth::AuthService;
pub use calendar::CalendarService;
pub use environments::EnvironmentService;
pub use relations::RelationService;
pub use remote_admin::RemoteAdminService;
pub use schedule::ScheduleService;
pub use students::StudentService;
pub use users::UserService;

use actix_web::{HttpRequest, HttpResponse, web::Data};
use std::sync::Arc;

use crate::errors::TutorHubError;
use crate::models::{ApiResponse, ErrorCode};
use crate::storage::Storage;

/// 从 app_data 取存储句柄，缺失时返回 500
pub(crate) fn storage_from_request(
    cached: &Option<Arc<dyn Storage>>,
    request: &HttpRequest,
) -> actix_web::Result<Arc<dyn Storage>> {
    if let Some(storage) = cached {
        return Ok(storage.clone());
    }
    request
        .app_data::<Data<Arc<dyn Storage>>>()
        .map(|data| data.get_ref().clone())
        .ok_or_else(|| actix_web::error::ErrorInternalServerError("Storage not found in app data"))
}

/// 存储层错误统一转为 500 响应
pub(crate) fn internal_error(context: &str, err: TutorHubError) -> HttpResponse {
    tracing::error!("{}: {}", context, err);
    HttpResponse::InternalServerError().json(ApiResponse::error_empty(
        ErrorCode::InternalServerError,
        format!("{context}: {err}"),
    ))
}
