use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};
use std::collections::BTreeMap;
use std::sync::Arc;

use super::RemoteAdminService;
use crate::config::AppConfig;
use crate::errors::Result;
use crate::models::ApiResponse;
use crate::models::lessons::entities::LessonStatus;
use crate::models::remote_admin::{
    AuditLogStats, EnvironmentStats, LessonStats, RemoteStatus, RemoteStatusStats, StudentStats,
    UserStats,
};
use crate::models::users::entities::UserRole;
use crate::schedule::{DisplayZone, timezone};
use crate::services::{internal_error, maintenance};
use crate::storage::Storage;

/// 本地“今天”零点，按默认时区
fn today_start() -> Result<chrono::DateTime<chrono::Utc>> {
    let zone = DisplayZone::parse(Some(&AppConfig::get().schedule.default_timezone));
    timezone::local_day_bounds(timezone::today(zone), zone).map(|(from, _)| from)
}

async fn collect_status(storage: &Arc<dyn Storage>) -> Result<RemoteStatusStats> {
    Ok(RemoteStatusStats {
        total_users: storage.count_users(None, false).await?,
        active_users: storage.count_users(None, true).await?,
        total_logs: storage.count_audit_logs(None).await?,
        today_logs: storage.count_audit_logs(Some(today_start()?)).await?,
        maintenance_enabled: maintenance::is_enabled().await,
    })
}

pub async fn collect_stats(storage: &Arc<dyn Storage>) -> Result<EnvironmentStats> {
    let mut by_role = BTreeMap::new();
    for role in UserRole::ALL {
        by_role.insert(
            role.as_str().to_string(),
            storage.count_users(Some(role), false).await?,
        );
    }

    Ok(EnvironmentStats {
        users: UserStats {
            total: storage.count_users(None, false).await?,
            active: storage.count_users(None, true).await?,
            by_role,
        },
        students: StudentStats {
            total: storage.count_students(true).await?,
            archived: storage.count_students(false).await?,
        },
        lessons: LessonStats {
            total: storage.count_lessons(None).await?,
            completed: storage.count_lessons(Some(LessonStatus::Completed)).await?,
            planned: storage.count_lessons(Some(LessonStatus::Planned)).await?,
        },
        audit_logs: AuditLogStats {
            total: storage.count_audit_logs(None).await?,
            today: storage.count_audit_logs(Some(today_start()?)).await?,
        },
    })
}

pub async fn status(
    service: &RemoteAdminService,
    request: &HttpRequest,
) -> ActixResult<HttpResponse> {
    let storage = service.get_storage(request)?;
    match collect_status(&storage).await {
        Ok(stats) => Ok(HttpResponse::Ok().json(ApiResponse::success(
            RemoteStatus {
                status: "ok".to_string(),
                stats,
            },
            "ok",
        ))),
        Err(e) => Ok(internal_error("Failed to collect status", e)),
    }
}

pub async fn stats(
    service: &RemoteAdminService,
    request: &HttpRequest,
) -> ActixResult<HttpResponse> {
    let storage = service.get_storage(request)?;
    match collect_stats(&storage).await {
        Ok(stats) => Ok(HttpResponse::Ok().json(ApiResponse::success(
            stats,
            "Statistics retrieved successfully",
        ))),
        Err(e) => Ok(internal_error("Failed to collect statistics", e)),
    }
}
