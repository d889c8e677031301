//! 角色权限
//!
//! creator 永远放行；其余角色若数据库中有任何行，以启用的行为准，否则使用默认授权。
//! 数据库的行缓存在内存中，每次修改后整体刷新。

pub mod registry;
pub mod scope;

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use dashmap::DashMap;
use once_cell::sync::Lazy;
use tracing::{info, warn};

use crate::errors::Result;
use crate::models::permissions::{PermissionMatrixResponse, RolePermission};
use crate::models::users::entities::UserRole;
use crate::storage::Storage;

pub use scope::student_scope;

/// role -> (permission -> enabled)
static ROLE_ROWS: Lazy<DashMap<String, HashMap<String, bool>>> = Lazy::new(DashMap::new);
static LOADED: AtomicBool = AtomicBool::new(false);

/// 纯判定逻辑，`rows` 为该角色在数据库中的全部行
pub fn resolve(role: UserRole, rows: Option<&HashMap<String, bool>>, permission: &str) -> bool {
    if role == UserRole::Creator {
        return true;
    }
    match rows {
        Some(rows) if !rows.is_empty() => rows.get(permission).copied().unwrap_or(false),
        _ => registry::default_grants(role).contains(&permission),
    }
}

fn effective_from(role: UserRole, rows: Option<&HashMap<String, bool>>) -> Vec<String> {
    registry::all_names()
        .filter(|name| resolve(role, rows, name))
        .map(str::to_string)
        .collect()
}

/// 从数据库重新加载缓存
pub async fn reload(storage: &Arc<dyn Storage>) -> Result<()> {
    let rows = storage.list_role_permissions().await?;
    ROLE_ROWS.clear();
    for row in rows {
        ROLE_ROWS
            .entry(row.role)
            .or_default()
            .insert(row.permission_name, row.is_enabled);
    }
    LOADED.store(true, Ordering::Release);
    Ok(())
}

async fn ensure_loaded(storage: &Arc<dyn Storage>) {
    if !LOADED.load(Ordering::Acquire)
        && let Err(e) = reload(storage).await
    {
        warn!("Failed to load role permissions, using defaults: {}", e);
    }
}

pub async fn has_permission(storage: &Arc<dyn Storage>, role: UserRole, permission: &str) -> bool {
    if role == UserRole::Creator {
        return true;
    }
    ensure_loaded(storage).await;
    let rows = ROLE_ROWS.get(role.as_str());
    resolve(role, rows.as_deref(), permission)
}

/// 角色当前生效的全部权限
pub async fn effective_permissions(storage: &Arc<dyn Storage>, role: UserRole) -> Vec<String> {
    ensure_loaded(storage).await;
    let rows = ROLE_ROWS.get(role.as_str());
    effective_from(role, rows.as_deref())
}

/// 空表填入默认授权；非空表只补齐缺失的默认授权
pub async fn seed_defaults(storage: &Arc<dyn Storage>) -> Result<u64> {
    let rows: Vec<RolePermission> = UserRole::ALL
        .into_iter()
        .flat_map(|role| {
            registry::default_grants(role)
                .into_iter()
                .map(move |name| RolePermission {
                    role: role.as_str().to_string(),
                    permission_name: name.to_string(),
                    is_enabled: true,
                })
        })
        .collect();

    let inserted = storage.insert_missing_role_permissions(rows).await?;
    if inserted > 0 {
        info!("Seeded {} default role permission(s)", inserted);
    }
    reload(storage).await?;
    Ok(inserted)
}

/// 权限矩阵，每个角色都会出现
pub async fn matrix(storage: &Arc<dyn Storage>) -> Result<PermissionMatrixResponse> {
    seed_defaults(storage).await?;

    let mut roles_permissions = BTreeMap::new();
    for role in UserRole::ALL {
        let rows = ROLE_ROWS.get(role.as_str());
        roles_permissions.insert(role.as_str().to_string(), effective_from(role, rows.as_deref()));
    }

    Ok(PermissionMatrixResponse {
        roles_permissions,
        all_permissions: registry::PERMISSIONS.to_vec(),
        permission_categories: registry::CATEGORIES.to_vec(),
    })
}

/// 整体重写某角色的权限：注册表中每一项都写一行，未知名称忽略
pub async fn replace_for_role(
    storage: &Arc<dyn Storage>,
    role: UserRole,
    enabled: &[String],
) -> Result<Vec<String>> {
    let rows: Vec<(String, bool)> = registry::all_names()
        .map(|name| (name.to_string(), enabled.iter().any(|e| e == name)))
        .collect();
    storage.replace_role_permissions(role.as_str(), rows).await?;
    reload(storage).await?;
    Ok(effective_permissions(storage, role).await)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rows(pairs: &[(&str, bool)]) -> HashMap<String, bool> {
        pairs.iter().map(|(k, v)| (k.to_string(), *v)).collect()
    }

    #[test]
    fn test_creator_always_passes() {
        let denied = rows(&[("user.delete", false)]);
        assert!(resolve(UserRole::Creator, Some(&denied), "user.delete"));
    }

    #[test]
    fn test_defaults_without_rows() {
        assert!(resolve(UserRole::Tutor, None, "lesson.create"));
        assert!(!resolve(UserRole::Tutor, None, "lesson.delete"));
        assert!(resolve(UserRole::Admin, Some(&HashMap::new()), "system.logs"));
        assert!(!resolve(UserRole::Student, None, "user.view_list"));
    }

    #[test]
    fn test_rows_override_defaults() {
        let tutor = rows(&[("lesson.delete", true), ("lesson.create", false)]);
        assert!(resolve(UserRole::Tutor, Some(&tutor), "lesson.delete"));
        assert!(!resolve(UserRole::Tutor, Some(&tutor), "lesson.create"));
        // 行存在但未列出的权限视为未授权
        assert!(!resolve(UserRole::Tutor, Some(&tutor), "tools.schedule"));
    }

    #[test]
    fn test_effective_list_follows_registry_order() {
        let perms = effective_from(UserRole::Designer, None);
        assert_eq!(perms, vec!["assets.manage".to_string()]);
    }
}
