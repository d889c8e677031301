use super::SeaOrmStorage;
use crate::entity::audit_logs::{ActiveModel, Column, Entity as AuditLogs};
use crate::errors::{Result, TutorHubError};
use crate::models::{
    PaginationInfo,
    audit::{AuditEntry, AuditLogListResponse, AuditLogQuery},
};
use chrono::{DateTime, Utc};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder, Set,
};

impl SeaOrmStorage {
    pub async fn insert_audit_log_impl(&self, entry: AuditEntry) -> Result<()> {
        let metadata = entry
            .metadata
            .map(|value| serde_json::to_string(&value))
            .transpose()?;

        ActiveModel {
            user_id: Set(entry.user_id),
            action: Set(entry.action),
            entity: Set(entry.entity),
            entity_id: Set(entry.entity_id),
            status: Set(entry.status),
            metadata: Set(metadata),
            ip_address: Set(entry.ip_address),
            method: Set(entry.method),
            url: Set(entry.url),
            created_at: Set(Utc::now().timestamp()),
            ..Default::default()
        }
        .insert(&self.db)
        .await
        .map_err(|e| TutorHubError::database_operation(format!("写入审计日志失败: {e}")))?;

        Ok(())
    }

    pub async fn list_audit_logs_impl(&self, query: AuditLogQuery) -> Result<AuditLogListResponse> {
        let page = query.page.max(1);
        let size = query.size.clamp(1, 200);

        let mut select = AuditLogs::find();
        if let Some(ref action) = query.action
            && !action.trim().is_empty()
        {
            select = select.filter(Column::Action.eq(action.trim()));
        }
        if let Some(ref status) = query.status
            && !status.trim().is_empty()
        {
            select = select.filter(Column::Status.eq(status.trim()));
        }
        if let Some(from) = query.from {
            select = select.filter(Column::CreatedAt.gte(from));
        }
        if let Some(to) = query.to {
            select = select.filter(Column::CreatedAt.lt(to));
        }

        let paginator = select
            .order_by_desc(Column::CreatedAt)
            .order_by_desc(Column::Id)
            .paginate(&self.db, size);

        let total = paginator
            .num_items()
            .await
            .map_err(|e| TutorHubError::database_operation(format!("查询审计日志总数失败: {e}")))?;

        let logs = paginator
            .fetch_page(page - 1)
            .await
            .map_err(|e| TutorHubError::database_operation(format!("查询审计日志失败: {e}")))?;

        Ok(AuditLogListResponse {
            items: logs.into_iter().map(|m| m.into_audit_log()).collect(),
            pagination: PaginationInfo::new(page, size, total),
        })
    }

    pub async fn count_audit_logs_impl(&self, since: Option<DateTime<Utc>>) -> Result<u64> {
        let mut select = AuditLogs::find();
        if let Some(since) = since {
            select = select.filter(Column::CreatedAt.gte(since.timestamp()));
        }

        select
            .count(&self.db)
            .await
            .map_err(|e| TutorHubError::database_operation(format!("统计审计日志失败: {e}")))
    }

    pub async fn delete_user_audit_logs_impl(&self, user_id: i64) -> Result<u64> {
        let result = AuditLogs::delete_many()
            .filter(Column::UserId.eq(user_id))
            .exec(&self.db)
            .await
            .map_err(|e| TutorHubError::database_operation(format!("删除审计日志失败: {e}")))?;

        Ok(result.rows_affected)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_insert_filter_and_delete() {
        let storage = SeaOrmStorage::in_memory().await;
        storage
            .insert_audit_log_impl(
                AuditEntry::new("delete_lesson")
                    .user(7)
                    .entity("lesson", 1)
                    .metadata(serde_json::json!({"student_id": 3})),
            )
            .await
            .unwrap();
        storage
            .insert_audit_log_impl(AuditEntry::new("reschedule_lesson").status("failed"))
            .await
            .unwrap();

        let page = storage
            .list_audit_logs_impl(AuditLogQuery {
                page: 1,
                size: 50,
                action: Some("delete_lesson".into()),
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(page.items.len(), 1);
        assert_eq!(page.items[0].metadata.as_ref().unwrap()["student_id"], 3);

        let failed = storage
            .list_audit_logs_impl(AuditLogQuery {
                page: 1,
                size: 50,
                status: Some("failed".into()),
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(failed.pagination.total, 1);

        assert_eq!(storage.count_audit_logs_impl(None).await.unwrap(), 2);
        assert_eq!(storage.delete_user_audit_logs_impl(7).await.unwrap(), 1);
        assert_eq!(storage.count_audit_logs_impl(None).await.unwrap(), 1);
    }
}
