//! 审计日志实体

use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "audit_logs")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub user_id: Option<i64>,
    pub action: String,
    pub entity: Option<String>,
    pub entity_id: Option<i64>,
    pub status: String,
    /// JSON 文本
    #[sea_orm(column_type = "Text", nullable)]
    pub metadata: Option<String>,
    pub ip_address: Option<String>,
    pub method: Option<String>,
    pub url: Option<String>,
    pub created_at: i64,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

impl Model {
    pub fn into_audit_log(self) -> crate::models::audit::AuditLog {
        crate::models::audit::AuditLog {
            id: self.id,
            user_id: self.user_id,
            action: self.action,
            entity: self.entity,
            entity_id: self.entity_id,
            status: self.status,
            metadata: self
                .metadata
                .and_then(|raw| serde_json::from_str(&raw).ok()),
            ip_address: self.ip_address,
            method: self.method,
            url: self.url,
            created_at: super::from_ts(self.created_at),
        }
    }
}
