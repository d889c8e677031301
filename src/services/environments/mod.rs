//! 远程管理（客户端）：环境状态、用户代理、课程同步
//!
//! 只有 creator 可以使用这些接口，路由层负责鉴权。

pub mod client;
pub mod proxy;
pub mod sync;

use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};
use futures_util::future::join_all;
use std::sync::Arc;

use crate::config::AppConfig;
use crate::errors::TutorHubError;
use crate::models::remote_admin::{EnvironmentStatus, RemoteStatus, SyncLessonsRequest};
use crate::models::{ApiResponse, ErrorCode};
use crate::storage::Storage;

pub use client::RemoteClient;

/// 已知的环境名称
pub const ENVIRONMENTS: [&str; 2] = ["production", "sandbox"];

pub struct EnvironmentService {
    storage: Option<Arc<dyn Storage>>,
}

impl EnvironmentService {
    pub fn new_lazy() -> Self {
        Self { storage: None }
    }

    pub(crate) fn get_storage(&self, request: &HttpRequest) -> ActixResult<Arc<dyn Storage>> {
        super::storage_from_request(&self.storage, request)
    }

    // 所有环境的可用性
    pub async fn environments(&self) -> ActixResult<HttpResponse> {
        let statuses = join_all(ENVIRONMENTS.iter().map(|name| environment_status(name))).await;
        Ok(HttpResponse::Ok().json(ApiResponse::success(
            statuses,
            "Environments retrieved successfully",
        )))
    }

    pub async fn proxy(
        &self,
        env: &str,
        call: proxy::ProxyCall,
        request: &HttpRequest,
    ) -> ActixResult<HttpResponse> {
        proxy::forward(env, call, request).await
    }

    pub async fn start_sync(
        &self,
        data: SyncLessonsRequest,
        request: &HttpRequest,
    ) -> ActixResult<HttpResponse> {
        let storage = self.get_storage(request)?;
        sync::start(storage, data, request).await
    }

    pub async fn sync_status(&self) -> ActixResult<HttpResponse> {
        Ok(HttpResponse::Ok().json(ApiResponse::success(
            sync::status().await,
            "Sync status retrieved",
        )))
    }
}

async fn environment_status(name: &str) -> EnvironmentStatus {
    let display_name = AppConfig::get()
        .environment(name)
        .map(|e| e.name.clone())
        .filter(|n| !n.is_empty())
        .unwrap_or_else(|| name.to_string());

    let mut status = EnvironmentStatus {
        name: name.to_string(),
        display_name,
        configured: false,
        available: false,
        status: None,
        error: None,
    };

    let client = match RemoteClient::for_environment(name) {
        Ok(client) => client,
        Err(e) => {
            status.error = Some(e.message().to_string());
            return status;
        }
    };
    status.configured = true;

    match client.get::<RemoteStatus>("/status").await {
        Ok(remote) => {
            status.available = true;
            status.status = Some(remote);
        }
        Err(e) => {
            tracing::warn!("Environment {} unavailable: {}", name, e);
            status.error = Some(e.message().to_string());
        }
    }
    status
}

/// 远端相关错误转为响应
pub(crate) fn remote_error(err: TutorHubError) -> HttpResponse {
    match err {
        TutorHubError::EnvironmentNotConfigured(msg) => HttpResponse::BadRequest()
            .json(ApiResponse::error_empty(ErrorCode::EnvironmentNotConfigured, msg)),
        other => {
            tracing::error!("Remote admin request failed: {}", other);
            HttpResponse::BadGateway().json(ApiResponse::error_empty(
                ErrorCode::RemoteRequestFailed,
                other.message(),
            ))
        }
    }
}
