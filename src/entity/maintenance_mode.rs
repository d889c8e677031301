//! 维护模式（单行）

use sea_orm::entity::prelude::*;

/// 唯一一行的主键
pub const SINGLETON_ID: i64 = 1;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "maintenance_mode")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: i64,
    pub is_enabled: bool,
    #[sea_orm(column_type = "Text", nullable)]
    pub message: Option<String>,
    pub updated_by: Option<i64>,
    pub updated_at: i64,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

impl Model {
    pub fn into_status(self) -> crate::models::remote_admin::MaintenanceStatus {
        crate::models::remote_admin::MaintenanceStatus {
            enabled: self.is_enabled,
            message: self.message,
            updated_by: self.updated_by,
            updated_at: Some(super::from_ts(self.updated_at)),
        }
    }
}
