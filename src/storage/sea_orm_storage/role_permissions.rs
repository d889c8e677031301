use std::collections::HashSet;

use super::SeaOrmStorage;
use crate::entity::role_permissions::{ActiveModel, Column, Entity as RolePermissions};
use crate::errors::{Result, TutorHubError};
use crate::models::permissions::RolePermission;
use sea_orm::{ActiveModelTrait, ColumnTrait, EntityTrait, QueryFilter, QueryOrder, Set, TransactionTrait};

impl SeaOrmStorage {
    pub async fn list_role_permissions_impl(&self) -> Result<Vec<RolePermission>> {
        let rows = RolePermissions::find()
            .order_by_asc(Column::Role)
            .order_by_asc(Column::PermissionName)
            .all(&self.db)
            .await
            .map_err(|e| TutorHubError::database_operation(format!("查询角色权限失败: {e}")))?;

        Ok(rows.into_iter().map(|m| m.into_role_permission()).collect())
    }

    /// 删除角色的全部权限行后按给定列表重建
    pub async fn replace_role_permissions_impl(
        &self,
        role: &str,
        rows: Vec<(String, bool)>,
    ) -> Result<()> {
        let txn = self
            .db
            .begin()
            .await
            .map_err(|e| TutorHubError::database_operation(format!("开启事务失败: {e}")))?;

        RolePermissions::delete_many()
            .filter(Column::Role.eq(role))
            .exec(&txn)
            .await
            .map_err(|e| TutorHubError::database_operation(format!("删除角色权限失败: {e}")))?;

        for (name, enabled) in rows {
            ActiveModel {
                role: Set(role.to_string()),
                permission_name: Set(name),
                is_enabled: Set(enabled),
                ..Default::default()
            }
            .insert(&txn)
            .await
            .map_err(|e| TutorHubError::database_operation(format!("写入角色权限失败: {e}")))?;
        }

        txn.commit()
            .await
            .map_err(|e| TutorHubError::database_operation(format!("提交事务失败: {e}")))
    }

    /// 插入表中尚不存在的 (role, permission) 组合
    pub async fn insert_missing_role_permissions_impl(
        &self,
        rows: Vec<RolePermission>,
    ) -> Result<u64> {
        let existing: HashSet<(String, String)> = self
            .list_role_permissions_impl()
            .await?
            .into_iter()
            .map(|r| (r.role, r.permission_name))
            .collect();

        let mut inserted = 0;
        for row in rows {
            if existing.contains(&(row.role.clone(), row.permission_name.clone())) {
                continue;
            }
            ActiveModel {
                role: Set(row.role),
                permission_name: Set(row.permission_name),
                is_enabled: Set(row.is_enabled),
                ..Default::default()
            }
            .insert(&self.db)
            .await
            .map_err(|e| TutorHubError::database_operation(format!("写入角色权限失败: {e}")))?;
            inserted += 1;
        }

        Ok(inserted)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn grant(role: &str, name: &str) -> RolePermission {
        RolePermission {
            role: role.into(),
            permission_name: name.into(),
            is_enabled: true,
        }
    }

    #[tokio::test]
    async fn test_insert_missing_skips_existing() {
        let storage = SeaOrmStorage::in_memory().await;
        let n = storage
            .insert_missing_role_permissions_impl(vec![grant("tutor", "lesson.create")])
            .await
            .unwrap();
        assert_eq!(n, 1);

        let n = storage
            .insert_missing_role_permissions_impl(vec![
                grant("tutor", "lesson.create"),
                grant("tutor", "lesson.edit"),
            ])
            .await
            .unwrap();
        assert_eq!(n, 1);
        assert_eq!(storage.list_role_permissions_impl().await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_replace_rewrites_role_only() {
        let storage = SeaOrmStorage::in_memory().await;
        storage
            .insert_missing_role_permissions_impl(vec![
                grant("tutor", "lesson.create"),
                grant("designer", "assets.manage"),
            ])
            .await
            .unwrap();

        storage
            .replace_role_permissions_impl(
                "tutor",
                vec![
                    ("lesson.create".into(), false),
                    ("lesson.delete".into(), true),
                ],
            )
            .await
            .unwrap();

        let rows = storage.list_role_permissions_impl().await.unwrap();
        assert_eq!(rows.len(), 3);
        assert!(rows.contains(&grant("designer", "assets.manage")));
        assert!(rows.contains(&RolePermission {
            role: "tutor".into(),
            permission_name: "lesson.create".into(),
            is_enabled: false,
        }));
    }
}
