//! 审计日志后台写入
//!
//! 请求处理只负责把记录投进无界通道，由单个后台任务顺序落库。

use std::sync::{Arc, OnceLock};

use actix_web::{HttpMessage, HttpRequest};
use tokio::sync::mpsc;
use tracing::{debug, warn};

use crate::models::audit::AuditEntry;
use crate::models::users::entities::User;
use crate::storage::Storage;
use crate::utils::client_ip;

static AUDIT_SENDER: OnceLock<mpsc::UnboundedSender<AuditEntry>> = OnceLock::new();

/// 启动写入任务，重复调用时忽略
pub fn start_writer(storage: Arc<dyn Storage>) {
    let (tx, mut rx) = mpsc::unbounded_channel::<AuditEntry>();
    if AUDIT_SENDER.set(tx).is_err() {
        debug!("Audit writer already running");
        return;
    }

    tokio::spawn(async move {
        while let Some(entry) = rx.recv().await {
            let action = entry.action.clone();
            if let Err(e) = storage.insert_audit_log(entry).await {
                warn!("Failed to write audit log '{}': {}", action, e);
            }
        }
        debug!("Audit writer stopped");
    });
}

/// 投递一条审计记录
pub fn record(entry: AuditEntry) {
    match AUDIT_SENDER.get() {
        Some(tx) => {
            if tx.send(entry).is_err() {
                warn!("Audit channel closed, entry dropped");
            }
        }
        None => debug!("Audit writer not started, dropping '{}'", entry.action),
    }
}

/// 以当前请求的用户、IP、方法和路径为底创建记录
pub fn entry_for(request: &HttpRequest, action: &str) -> AuditEntry {
    let mut entry = AuditEntry::new(action).request(
        client_ip(request),
        request.method().as_str(),
        &request.uri().to_string(),
    );
    if let Some(user) = request.extensions().get::<User>() {
        entry = entry.user(user.id);
    }
    entry
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::test::TestRequest;

    #[test]
    fn test_entry_for_captures_request() {
        let req = TestRequest::post()
            .uri("/api/v1/schedule/lessons/5/status")
            .peer_addr("10.0.0.7:5555".parse().unwrap())
            .to_http_request();
        let entry = entry_for(&req, "set_lesson_status");
        assert_eq!(entry.action, "set_lesson_status");
        assert_eq!(entry.method.as_deref(), Some("POST"));
        assert_eq!(entry.url.as_deref(), Some("/api/v1/schedule/lessons/5/status"));
        assert_eq!(entry.ip_address.as_deref(), Some("10.0.0.7"));
        assert_eq!(entry.user_id, None);
    }
}
