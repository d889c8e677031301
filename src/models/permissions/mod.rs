use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// 权限注册表中的一项
#[derive(Debug, Clone, Serialize)]
pub struct PermissionInfo {
    pub name: &'static str,
    pub description: &'static str,
    pub category: &'static str,
}

/// 权限分类
#[derive(Debug, Clone, Serialize)]
pub struct PermissionCategory {
    pub key: &'static str,
    pub title: &'static str,
}

/// 数据库中的一行授权
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RolePermission {
    pub role: String,
    pub permission_name: String,
    pub is_enabled: bool,
}

#[derive(Debug, Serialize)]
pub struct PermissionMatrixResponse {
    /// 角色 -> 已启用的权限
    pub roles_permissions: BTreeMap<String, Vec<String>>,
    pub all_permissions: Vec<PermissionInfo>,
    pub permission_categories: Vec<PermissionCategory>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct UpdateRolePermissionsRequest {
    pub role: String,
    #[serde(default)]
    pub permissions: Vec<String>,
}
