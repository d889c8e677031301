//! 角色权限实体

use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "role_permissions")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub role: String,
    pub permission_name: String,
    pub is_enabled: bool,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

impl Model {
    pub fn into_role_permission(self) -> crate::models::permissions::RolePermission {
        crate::models::permissions::RolePermission {
            role: self.role,
            permission_name: self.permission_name,
            is_enabled: self.is_enabled,
        }
    }
}
