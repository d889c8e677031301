//! 远程管理（服务端）
//!
//! 供另一套部署通过 `X-Admin-Token` 调用，请求中没有登录用户，审计记录的 user_id 为空。

pub mod graph;
pub mod logs;
pub mod settings;
pub mod stats;
pub mod users;

use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};
use chrono::{DateTime, NaiveTime, TimeDelta, Utc};
use std::sync::Arc;

use crate::errors::{Result, TutorHubError};
use crate::models::audit::AuditLogParams;
use crate::models::permissions::UpdateRolePermissionsRequest;
use crate::models::remote_admin::{
    RemoteLessonParams, RemoteUserListParams, RemoteUserUpsertRequest, SetMaintenanceRequest,
    UserGraphParams,
};
use crate::models::{ApiResponse, ErrorCode};
use crate::schedule::timezone;
use crate::storage::Storage;

pub struct RemoteAdminService {
    storage: Option<Arc<dyn Storage>>,
}

impl RemoteAdminService {
    pub fn new_lazy() -> Self {
        Self { storage: None }
    }

    pub(crate) fn get_storage(&self, request: &HttpRequest) -> ActixResult<Arc<dyn Storage>> {
        super::storage_from_request(&self.storage, request)
    }

    // 健康检查 + 简要统计
    pub async fn status(&self, request: &HttpRequest) -> ActixResult<HttpResponse> {
        stats::status(self, request).await
    }

    pub async fn stats(&self, request: &HttpRequest) -> ActixResult<HttpResponse> {
        stats::stats(self, request).await
    }

    pub async fn list_users(
        &self,
        params: RemoteUserListParams,
        request: &HttpRequest,
    ) -> ActixResult<HttpResponse> {
        users::list_users(self, params, request).await
    }

    // 用户关系图：用户节点，导师关系和家庭关系作为边
    pub async fn users_graph(
        &self,
        params: UserGraphParams,
        request: &HttpRequest,
    ) -> ActixResult<HttpResponse> {
        graph::users_graph(self, params, request).await
    }

    pub async fn get_user(&self, user_id: i64, request: &HttpRequest) -> ActixResult<HttpResponse> {
        users::get_user(self, user_id, request).await
    }

    pub async fn create_user(
        &self,
        data: RemoteUserUpsertRequest,
        request: &HttpRequest,
    ) -> ActixResult<HttpResponse> {
        users::create_user(self, data, request).await
    }

    pub async fn update_user(
        &self,
        user_id: i64,
        data: RemoteUserUpsertRequest,
        request: &HttpRequest,
    ) -> ActixResult<HttpResponse> {
        users::update_user(self, user_id, data, request).await
    }

    pub async fn delete_user(
        &self,
        user_id: i64,
        request: &HttpRequest,
    ) -> ActixResult<HttpResponse> {
        users::delete_user(self, user_id, request).await
    }

    pub async fn get_permissions(&self, request: &HttpRequest) -> ActixResult<HttpResponse> {
        settings::get_permissions(self, request).await
    }

    pub async fn update_permissions(
        &self,
        data: UpdateRolePermissionsRequest,
        request: &HttpRequest,
    ) -> ActixResult<HttpResponse> {
        settings::update_permissions(self, data, request).await
    }

    pub async fn get_maintenance(&self, request: &HttpRequest) -> ActixResult<HttpResponse> {
        settings::get_maintenance(self, request).await
    }

    pub async fn set_maintenance(
        &self,
        data: SetMaintenanceRequest,
        request: &HttpRequest,
    ) -> ActixResult<HttpResponse> {
        settings::set_maintenance(self, data, request).await
    }

    pub async fn audit_logs(
        &self,
        params: AuditLogParams,
        request: &HttpRequest,
    ) -> ActixResult<HttpResponse> {
        logs::audit_logs(self, params, request).await
    }

    pub async fn lessons(
        &self,
        params: RemoteLessonParams,
        request: &HttpRequest,
    ) -> ActixResult<HttpResponse> {
        logs::lessons(self, params, request).await
    }
}

/// `YYYY-MM-DD` 按 UTC 解析；`end_of_day` 时取次日零点（半开区间上界）
pub(crate) fn parse_utc_day(value: Option<&str>, end_of_day: bool) -> Result<Option<DateTime<Utc>>> {
    let Some(raw) = value.map(str::trim).filter(|s| !s.is_empty()) else {
        return Ok(None);
    };
    let date = timezone::parse_date(raw)?;
    let start = date.and_time(NaiveTime::MIN).and_utc();
    if !end_of_day {
        return Ok(Some(start));
    }
    start
        .checked_add_signed(TimeDelta::days(1))
        .map(Some)
        .ok_or_else(|| TutorHubError::date_parse(format!("Date out of range: {raw}")))
}

pub(crate) fn bad_request(code: ErrorCode, message: impl Into<String>) -> HttpResponse {
    HttpResponse::BadRequest().json(ApiResponse::error_empty(code, message))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_parse_utc_day() {
        assert_eq!(parse_utc_day(None, false).unwrap(), None);
        assert_eq!(parse_utc_day(Some("  "), true).unwrap(), None);
        assert_eq!(
            parse_utc_day(Some("2025-03-10"), false).unwrap(),
            Some(Utc.with_ymd_and_hms(2025, 3, 10, 0, 0, 0).unwrap())
        );
        assert_eq!(
            parse_utc_day(Some("2025-03-10"), true).unwrap(),
            Some(Utc.with_ymd_and_hms(2025, 3, 11, 0, 0, 0).unwrap())
        );
        assert!(parse_utc_day(Some("10.03.2025"), false).is_err());
    }
}
