use super::SeaOrmStorage;
use crate::entity::maintenance_mode::{ActiveModel, Entity as MaintenanceMode, SINGLETON_ID};
use crate::errors::{Result, TutorHubError};
use crate::models::remote_admin::MaintenanceStatus;
use sea_orm::{ActiveModelTrait, EntityTrait, Set};

impl SeaOrmStorage {
    /// 读取维护状态，行不存在视为关闭
    pub async fn get_maintenance_impl(&self) -> Result<MaintenanceStatus> {
        let row = MaintenanceMode::find_by_id(SINGLETON_ID)
            .one(&self.db)
            .await
            .map_err(|e| TutorHubError::database_operation(format!("查询维护状态失败: {e}")))?;

        Ok(row.map(|m| m.into_status()).unwrap_or_default())
    }

    pub async fn set_maintenance_impl(
        &self,
        enabled: bool,
        message: Option<String>,
        updated_by: Option<i64>,
    ) -> Result<MaintenanceStatus> {
        let existing = MaintenanceMode::find_by_id(SINGLETON_ID)
            .one(&self.db)
            .await
            .map_err(|e| TutorHubError::database_operation(format!("查询维护状态失败: {e}")))?;

        let message = message
            .map(|m| m.trim().to_string())
            .filter(|m| !m.is_empty());
        let now = chrono::Utc::now().timestamp();

        let saved = match existing {
            Some(row) => {
                let mut model: ActiveModel = row.into();
                model.is_enabled = Set(enabled);
                model.message = Set(message);
                model.updated_by = Set(updated_by);
                model.updated_at = Set(now);
                model.update(&self.db).await
            }
            None => {
                ActiveModel {
                    id: Set(SINGLETON_ID),
                    is_enabled: Set(enabled),
                    message: Set(message),
                    updated_by: Set(updated_by),
                    updated_at: Set(now),
                }
                .insert(&self.db)
                .await
            }
        }
        .map_err(|e| TutorHubError::database_operation(format!("更新维护状态失败: {e}")))?;

        Ok(saved.into_status())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_default_and_toggle() {
        let storage = SeaOrmStorage::in_memory().await;
        assert!(!storage.get_maintenance_impl().await.unwrap().enabled);

        let on = storage
            .set_maintenance_impl(true, Some(" Технические работы ".into()), None)
            .await
            .unwrap();
        assert!(on.enabled);
        assert_eq!(on.message.as_deref(), Some("Технические работы"));

        let off = storage
            .set_maintenance_impl(false, Some(String::new()), Some(1))
            .await
            .unwrap();
        assert!(!off.enabled);
        assert_eq!(off.message, None);
        assert_eq!(off.updated_by, Some(1));
        assert!(!storage.get_maintenance_impl().await.unwrap().enabled);
    }
}
