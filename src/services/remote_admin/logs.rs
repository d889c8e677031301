use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};

use super::{RemoteAdminService, bad_request, parse_utc_day};
use crate::models::audit::{AuditLogParams, AuditLogQuery};
use crate::models::remote_admin::RemoteLessonParams;
use crate::models::{ApiResponse, ErrorCode};
use crate::services::internal_error;

const MAX_AUDIT_PAGE_SIZE: i64 = 200;

pub async fn audit_logs(
    service: &RemoteAdminService,
    params: AuditLogParams,
    request: &HttpRequest,
) -> ActixResult<HttpResponse> {
    let storage = service.get_storage(request)?;

    let range = parse_utc_day(params.date_from.as_deref(), false)
        .and_then(|from| parse_utc_day(params.date_to.as_deref(), true).map(|to| (from, to)));
    let (from, to) = match range {
        Ok(range) => range,
        Err(e) => {
            return Ok(bad_request(
                ErrorCode::ValidationFailed,
                format!("Invalid date filter: {}", e.message()),
            ));
        }
    };

    let query = AuditLogQuery {
        page: params.pagination.page.max(1) as u64,
        size: params.pagination.size.clamp(1, MAX_AUDIT_PAGE_SIZE) as u64,
        action: params.action,
        status: params.status,
        from: from.map(|d| d.timestamp()),
        to: to.map(|d| d.timestamp()),
    };

    match storage.list_audit_logs(query).await {
        Ok(logs) => Ok(HttpResponse::Ok().json(ApiResponse::success(
            logs,
            "Audit logs retrieved successfully",
        ))),
        Err(e) => Ok(internal_error("Failed to list audit logs", e)),
    }
}

// 同步用
pub async fn lessons(
    service: &RemoteAdminService,
    params: RemoteLessonParams,
    request: &HttpRequest,
) -> ActixResult<HttpResponse> {
    let storage = service.get_storage(request)?;

    let range = parse_utc_day(params.from.as_deref(), false)
        .and_then(|from| parse_utc_day(params.to.as_deref(), true).map(|to| (from, to)));
    let (from, to) = match range {
        Ok(range) => range,
        Err(e) => {
            return Ok(bad_request(
                ErrorCode::ValidationFailed,
                format!("Invalid date filter: {}", e.message()),
            ));
        }
    };

    match storage.list_remote_lessons(from, to).await {
        Ok(lessons) => Ok(HttpResponse::Ok().json(ApiResponse::success(
            lessons,
            "Lessons retrieved successfully",
        ))),
        Err(e) => Ok(internal_error("Failed to list lessons", e)),
    }
}
