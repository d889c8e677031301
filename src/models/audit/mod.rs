use serde::{Deserialize, Serialize};

use crate::models::common::{PaginationInfo, PaginationQuery};

/// 待写入的审计记录
#[derive(Debug, Clone, Default)]
pub struct AuditEntry {
    pub user_id: Option<i64>,
    pub action: String,
    pub entity: Option<String>,
    pub entity_id: Option<i64>,
    pub status: String,
    pub metadata: Option<serde_json::Value>,
    pub ip_address: Option<String>,
    pub method: Option<String>,
    pub url: Option<String>,
}

impl AuditEntry {
    pub fn new(action: impl Into<String>) -> Self {
        Self {
            action: action.into(),
            status: "success".to_string(),
            ..Default::default()
        }
    }

    pub fn user(mut self, user_id: i64) -> Self {
        self.user_id = Some(user_id);
        self
    }

    pub fn entity(mut self, entity: &str, entity_id: i64) -> Self {
        self.entity = Some(entity.to_string());
        self.entity_id = Some(entity_id);
        self
    }

    pub fn status(mut self, status: &str) -> Self {
        self.status = status.to_string();
        self
    }

    pub fn metadata(mut self, metadata: serde_json::Value) -> Self {
        self.metadata = Some(metadata);
        self
    }

    pub fn request(mut self, ip: Option<String>, method: &str, url: &str) -> Self {
        self.ip_address = ip;
        self.method = Some(method.to_string());
        self.url = Some(url.to_string());
        self
    }
}

/// 已持久化的审计记录
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditLog {
    pub id: i64,
    pub user_id: Option<i64>,
    pub action: String,
    pub entity: Option<String>,
    pub entity_id: Option<i64>,
    pub status: String,
    pub metadata: Option<serde_json::Value>,
    pub ip_address: Option<String>,
    pub method: Option<String>,
    pub url: Option<String>,
    pub created_at: chrono::DateTime<chrono::Utc>,
}

#[derive(Debug, Deserialize)]
pub struct AuditLogParams {
    #[serde(flatten)]
    pub pagination: PaginationQuery,
    pub action: Option<String>,
    pub status: Option<String>,
    /// YYYY-MM-DD（含）
    pub date_from: Option<String>,
    pub date_to: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct AuditLogQuery {
    pub page: u64,
    pub size: u64,
    pub action: Option<String>,
    pub status: Option<String>,
    pub from: Option<i64>,
    pub to: Option<i64>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct AuditLogListResponse {
    pub items: Vec<AuditLog>,
    pub pagination: PaginationInfo,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_entry_builder() {
        let entry = AuditEntry::new("delete_lesson")
            .user(3)
            .entity("lesson", 42)
            .status("failed");
        assert_eq!(entry.action, "delete_lesson");
        assert_eq!(entry.user_id, Some(3));
        assert_eq!(entry.entity.as_deref(), Some("lesson"));
        assert_eq!(entry.entity_id, Some(42));
        assert_eq!(entry.status, "failed");
    }

    #[test]
    fn test_default_status_is_success() {
        assert_eq!(AuditEntry::new("x").status, "success");
    }
}
