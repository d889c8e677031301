//! 维护模式缓存
//!
//! 启动时从数据库加载，修改时同时写库和刷新内存。

use std::sync::{Arc, OnceLock};

use tokio::sync::RwLock;
use tracing::{info, warn};

use crate::errors::Result;
use crate::models::remote_admin::MaintenanceStatus;
use crate::storage::Storage;

static MAINTENANCE: OnceLock<RwLock<MaintenanceStatus>> = OnceLock::new();

fn cell() -> &'static RwLock<MaintenanceStatus> {
    MAINTENANCE.get_or_init(|| RwLock::new(MaintenanceStatus::default()))
}

pub async fn init(storage: &Arc<dyn Storage>) {
    match storage.get_maintenance().await {
        Ok(status) => {
            if status.enabled {
                warn!("Maintenance mode is enabled");
            }
            *cell().write().await = status;
        }
        Err(e) => warn!("Failed to load maintenance status: {}, assuming disabled", e),
    }
}

pub async fn current() -> MaintenanceStatus {
    cell().read().await.clone()
}

pub async fn is_enabled() -> bool {
    cell().read().await.enabled
}

pub async fn set(
    storage: &Arc<dyn Storage>,
    enabled: bool,
    message: Option<String>,
    updated_by: Option<i64>,
) -> Result<MaintenanceStatus> {
    let status = storage.set_maintenance(enabled, message, updated_by).await?;
    *cell().write().await = status.clone();
    info!("Maintenance mode set to {}", enabled);
    Ok(status)
}

/// 503 响应里展示的文本
pub fn display_message(status: &MaintenanceStatus) -> String {
    status
        .message
        .clone()
        .unwrap_or_else(|| "Ведутся технические работы. Попробуйте позже.".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_message_fallback() {
        let mut status = MaintenanceStatus::default();
        assert!(display_message(&status).starts_with("Ведутся"));
        status.message = Some("Обновление до 18:00".into());
        assert_eq!(display_message(&status), "Обновление до 18:00");
    }
}
