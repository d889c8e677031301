use std::collections::HashSet;

use super::SeaOrmStorage;
use crate::entity::family_ties::{ActiveModel, Column, Entity as FamilyTies};
use crate::errors::{Result, TutorHubError};
use crate::models::relations::{
    AccessLevel, CreateFamilyTieRequest, FamilyTie, UpdateFamilyTieRequest,
};
use crate::storage::FamilySide;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, EntityTrait, QueryFilter, QueryOrder, Set, TransactionTrait,
};

impl FamilySide {
    fn owner_filter(&self) -> sea_orm::Condition {
        match *self {
            FamilySide::Student(id) => sea_orm::Condition::all().add(Column::StudentId.eq(id)),
            FamilySide::Parent(id) => sea_orm::Condition::all().add(Column::ParentId.eq(id)),
        }
    }

    /// 对端 id
    fn counterpart(&self, tie: &crate::entity::family_ties::Model) -> i64 {
        match self {
            FamilySide::Student(_) => tie.parent_id,
            FamilySide::Parent(_) => tie.student_id,
        }
    }

    /// (parent_id, student_id)
    fn pair(&self, related: i64) -> (i64, i64) {
        match *self {
            FamilySide::Student(student_id) => (related, student_id),
            FamilySide::Parent(parent_id) => (parent_id, related),
        }
    }
}

impl SeaOrmStorage {
    pub async fn create_family_tie_impl(&self, req: CreateFamilyTieRequest) -> Result<FamilyTie> {
        let model = ActiveModel {
            parent_id: Set(req.parent_id),
            student_id: Set(req.student_id),
            access_level: Set(req.access_level.unwrap_or_default().as_str().to_string()),
            is_confirmed: Set(req.is_confirmed.unwrap_or(true)),
            created_at: Set(chrono::Utc::now().timestamp()),
            ..Default::default()
        };

        let result = model
            .insert(&self.db)
            .await
            .map_err(|e| TutorHubError::database_operation(format!("创建家庭关系失败: {e}")))?;

        Ok(result.into_family_tie())
    }

    pub async fn get_family_tie_by_id_impl(&self, id: i64) -> Result<Option<FamilyTie>> {
        let result = FamilyTies::find_by_id(id)
            .one(&self.db)
            .await
            .map_err(|e| TutorHubError::database_operation(format!("查询家庭关系失败: {e}")))?;

        Ok(result.map(|m| m.into_family_tie()))
    }

    pub async fn update_family_tie_impl(
        &self,
        id: i64,
        update: UpdateFamilyTieRequest,
    ) -> Result<Option<FamilyTie>> {
        let Some(existing) = FamilyTies::find_by_id(id)
            .one(&self.db)
            .await
            .map_err(|e| TutorHubError::database_operation(format!("查询家庭关系失败: {e}")))?
        else {
            return Ok(None);
        };

        let mut model: ActiveModel = existing.into();
        if let Some(level) = update.access_level {
            model.access_level = Set(level.as_str().to_string());
        }
        if let Some(confirmed) = update.is_confirmed {
            model.is_confirmed = Set(confirmed);
        }

        let result = model
            .update(&self.db)
            .await
            .map_err(|e| TutorHubError::database_operation(format!("更新家庭关系失败: {e}")))?;

        Ok(Some(result.into_family_tie()))
    }

    pub async fn delete_family_tie_impl(&self, id: i64) -> Result<bool> {
        let result = FamilyTies::delete_by_id(id)
            .exec(&self.db)
            .await
            .map_err(|e| TutorHubError::database_operation(format!("删除家庭关系失败: {e}")))?;

        Ok(result.rows_affected > 0)
    }

    pub async fn list_family_ties_impl(&self, side: FamilySide) -> Result<Vec<FamilyTie>> {
        let rows = FamilyTies::find()
            .filter(side.owner_filter())
            .order_by_asc(Column::Id)
            .all(&self.db)
            .await
            .map_err(|e| TutorHubError::database_operation(format!("查询家庭关系失败: {e}")))?;

        Ok(rows.into_iter().map(|m| m.into_family_tie()).collect())
    }

    pub async fn list_all_family_ties_impl(&self) -> Result<Vec<FamilyTie>> {
        let rows = FamilyTies::find()
            .order_by_asc(Column::Id)
            .all(&self.db)
            .await
            .map_err(|e| TutorHubError::database_operation(format!("查询家庭关系失败: {e}")))?;

        Ok(rows.into_iter().map(|m| m.into_family_tie()).collect())
    }

    /// 按给定的对端 id 补齐关系；replace 时删除不在列表中的关系
    pub async fn sync_family_ties_impl(
        &self,
        side: FamilySide,
        related_ids: &[i64],
        replace: bool,
    ) -> Result<()> {
        let wanted: HashSet<i64> = related_ids.iter().copied().filter(|id| *id > 0).collect();
        let now = chrono::Utc::now().timestamp();

        let txn = self
            .db
            .begin()
            .await
            .map_err(|e| TutorHubError::database_operation(format!("开启事务失败: {e}")))?;

        let current = FamilyTies::find()
            .filter(side.owner_filter())
            .all(&txn)
            .await
            .map_err(|e| TutorHubError::database_operation(format!("查询家庭关系失败: {e}")))?;

        let mut present = HashSet::new();
        for tie in current {
            let other = side.counterpart(&tie);
            if replace && !wanted.contains(&other) {
                FamilyTies::delete_by_id(tie.id)
                    .exec(&txn)
                    .await
                    .map_err(|e| {
                        TutorHubError::database_operation(format!("删除家庭关系失败: {e}"))
                    })?;
            } else {
                present.insert(other);
            }
        }

        for related in wanted.difference(&present) {
            let (parent_id, student_id) = side.pair(*related);
            ActiveModel {
                parent_id: Set(parent_id),
                student_id: Set(student_id),
                access_level: Set(AccessLevel::Full.as_str().to_string()),
                is_confirmed: Set(true),
                created_at: Set(now),
                ..Default::default()
            }
            .insert(&txn)
            .await
            .map_err(|e| TutorHubError::database_operation(format!("创建家庭关系失败: {e}")))?;
        }

        txn.commit()
            .await
            .map_err(|e| TutorHubError::database_operation(format!("提交事务失败: {e}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::users::entities::UserRole;
    use crate::storage::sea_orm_storage::test_support::{seed_student, seed_user};

    fn parents(ties: &[FamilyTie]) -> Vec<i64> {
        let mut ids: Vec<i64> = ties.iter().map(|t| t.parent_id).collect();
        ids.sort();
        ids
    }

    #[tokio::test]
    async fn test_sync_adds_and_replaces() {
        let storage = SeaOrmStorage::in_memory().await;
        let p1 = seed_user(&storage, "p1", UserRole::Parent).await;
        let p2 = seed_user(&storage, "p2", UserRole::Parent).await;
        let s = seed_student(&storage, "S").await;
        let side = FamilySide::Student(s.id);

        storage
            .sync_family_ties_impl(side, &[p1.id], false)
            .await
            .unwrap();
        storage
            .sync_family_ties_impl(side, &[p2.id], false)
            .await
            .unwrap();
        let ties = storage.list_family_ties_impl(side).await.unwrap();
        assert_eq!(parents(&ties), vec![p1.id, p2.id]);
        assert!(ties.iter().all(|t| t.is_confirmed));
        assert!(ties.iter().all(|t| t.access_level == AccessLevel::Full));

        storage
            .sync_family_ties_impl(side, &[p2.id], true)
            .await
            .unwrap();
        let ties = storage.list_family_ties_impl(side).await.unwrap();
        assert_eq!(parents(&ties), vec![p2.id]);
    }

    #[tokio::test]
    async fn test_sync_from_parent_side() {
        let storage = SeaOrmStorage::in_memory().await;
        let p = seed_user(&storage, "p", UserRole::Parent).await;
        let a = seed_student(&storage, "A").await;
        let b = seed_student(&storage, "B").await;
        let side = FamilySide::Parent(p.id);

        storage
            .sync_family_ties_impl(side, &[a.id, b.id, a.id], true)
            .await
            .unwrap();
        let ties = storage.list_family_ties_impl(side).await.unwrap();
        assert_eq!(ties.len(), 2);

        storage.sync_family_ties_impl(side, &[], true).await.unwrap();
        assert!(storage.list_family_ties_impl(side).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_update_access_level() {
        let storage = SeaOrmStorage::in_memory().await;
        let p = seed_user(&storage, "p", UserRole::Parent).await;
        let s = seed_student(&storage, "S").await;
        let tie = storage
            .create_family_tie_impl(CreateFamilyTieRequest {
                parent_id: p.id,
                student_id: s.id,
                access_level: None,
                is_confirmed: None,
            })
            .await
            .unwrap();
        let updated = storage
            .update_family_tie_impl(
                tie.id,
                UpdateFamilyTieRequest {
                    access_level: Some(AccessLevel::ScheduleOnly),
                    is_confirmed: Some(false),
                },
            )
            .await
            .unwrap()
            .unwrap();
        assert_eq!(updated.access_level, AccessLevel::ScheduleOnly);
        assert!(!updated.is_confirmed);
        assert!(
            storage
                .update_family_tie_impl(tie.id + 100, UpdateFamilyTieRequest::default())
                .await
                .unwrap()
                .is_none()
        );
    }
}
