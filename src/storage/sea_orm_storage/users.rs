use super::SeaOrmStorage;
use crate::entity::users::{ActiveModel, Column, Entity as Users};
use crate::errors::{Result, TutorHubError};
use crate::models::{
    PaginationInfo,
    users::{
        entities::{User, UserRole, UserStatus},
        requests::{CreateUserRequest, UpdateUserRequest, UserListQuery},
        responses::UserListResponse,
    },
};
use crate::utils::escape_like_pattern;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder,
    Set, sea_query::Expr,
};

impl SeaOrmStorage {
    /// 创建用户
    pub async fn create_user_impl(&self, req: CreateUserRequest) -> Result<User> {
        let now = chrono::Utc::now().timestamp();

        let model = ActiveModel {
            username: Set(req.username),
            email: Set(req.email),
            password_hash: Set(req.password),
            role: Set(req.role.to_string()),
            status: Set(UserStatus::Active.to_string()),
            display_name: Set(req.display_name),
            calendar_token: Set(None),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        };

        let result = model
            .insert(&self.db)
            .await
            .map_err(|e| TutorHubError::database_operation(format!("创建用户失败: {e}")))?;

        Ok(result.into_user())
    }

    /// 通过 ID 获取用户
    pub async fn get_user_by_id_impl(&self, id: i64) -> Result<Option<User>> {
        let result = Users::find_by_id(id)
            .one(&self.db)
            .await
            .map_err(|e| TutorHubError::database_operation(format!("查询用户失败: {e}")))?;

        Ok(result.map(|m| m.into_user()))
    }

    /// 通过用户名获取用户
    pub async fn get_user_by_username_impl(&self, username: &str) -> Result<Option<User>> {
        self.find_user_by(Column::Username.eq(username)).await
    }

    /// 通过邮箱获取用户
    pub async fn get_user_by_email_impl(&self, email: &str) -> Result<Option<User>> {
        self.find_user_by(Column::Email.eq(email)).await
    }

    /// 通过用户名或邮箱获取用户
    pub async fn get_user_by_username_or_email_impl(
        &self,
        identifier: &str,
    ) -> Result<Option<User>> {
        self.find_user_by(
            Condition::any()
                .add(Column::Username.eq(identifier))
                .add(Column::Email.eq(identifier)),
        )
        .await
    }

    pub async fn get_user_by_calendar_token_impl(&self, token: &str) -> Result<Option<User>> {
        self.find_user_by(Column::CalendarToken.eq(token)).await
    }

    async fn find_user_by<F>(&self, filter: F) -> Result<Option<User>>
    where
        F: sea_orm::sea_query::IntoCondition,
    {
        let result = Users::find()
            .filter(filter)
            .one(&self.db)
            .await
            .map_err(|e| TutorHubError::database_operation(format!("查询用户失败: {e}")))?;

        Ok(result.map(|m| m.into_user()))
    }

    /// 分页列出用户
    pub async fn list_users_with_pagination_impl(
        &self,
        query: UserListQuery,
    ) -> Result<UserListResponse> {
        let page = query.page.max(1);
        let size = query.size.clamp(1, 100);

        let mut select = Users::find();

        if let Some(ref search) = query.search
            && !search.trim().is_empty()
        {
            let escaped = escape_like_pattern(search.trim());
            select = select.filter(
                Condition::any()
                    .add(Column::Username.contains(&escaped))
                    .add(Column::Email.contains(&escaped))
                    .add(Column::DisplayName.contains(&escaped)),
            );
        }

        if let Some(role) = query.role {
            select = select.filter(Column::Role.eq(role.as_str()));
        }

        if let Some(status) = query.status {
            select = select.filter(Column::Status.eq(status.to_string()));
        }

        let paginator = select
            .order_by_desc(Column::CreatedAt)
            .order_by_desc(Column::Id)
            .paginate(&self.db, size);

        let total = paginator
            .num_items()
            .await
            .map_err(|e| TutorHubError::database_operation(format!("查询用户总数失败: {e}")))?;

        let users = paginator
            .fetch_page(page - 1)
            .await
            .map_err(|e| TutorHubError::database_operation(format!("查询用户列表失败: {e}")))?;

        Ok(UserListResponse {
            items: users.into_iter().map(|m| m.into_user()).collect(),
            pagination: PaginationInfo::new(page, size, total),
        })
    }

    /// 按角色和激活状态列出全部用户
    pub async fn list_users_impl(
        &self,
        role: Option<UserRole>,
        is_active: Option<bool>,
    ) -> Result<Vec<User>> {
        let mut select = Users::find();
        if let Some(role) = role {
            select = select.filter(Column::Role.eq(role.as_str()));
        }
        match is_active {
            Some(true) => select = select.filter(Column::Status.eq(UserStatus::Active.to_string())),
            Some(false) => {
                select = select.filter(Column::Status.ne(UserStatus::Active.to_string()))
            }
            None => {}
        }

        let users = select
            .order_by_desc(Column::CreatedAt)
            .all(&self.db)
            .await
            .map_err(|e| TutorHubError::database_operation(format!("查询用户列表失败: {e}")))?;

        Ok(users.into_iter().map(|m| m.into_user()).collect())
    }

    /// 更新用户最后登录时间
    pub async fn update_last_login_impl(&self, id: i64) -> Result<bool> {
        let now = chrono::Utc::now().timestamp();

        let result = Users::update_many()
            .col_expr(Column::LastLogin, Expr::value(now))
            .filter(Column::Id.eq(id))
            .exec(&self.db)
            .await
            .map_err(|e| {
                TutorHubError::database_operation(format!("更新最后登录时间失败: {e}"))
            })?;

        Ok(result.rows_affected > 0)
    }

    pub async fn set_calendar_token_impl(&self, id: i64, token: Option<String>) -> Result<bool> {
        let now = chrono::Utc::now().timestamp();

        let result = Users::update_many()
            .col_expr(Column::CalendarToken, Expr::value(token))
            .col_expr(Column::UpdatedAt, Expr::value(now))
            .filter(Column::Id.eq(id))
            .exec(&self.db)
            .await
            .map_err(|e| TutorHubError::database_operation(format!("更新日历令牌失败: {e}")))?;

        Ok(result.rows_affected > 0)
    }

    /// 更新用户信息
    pub async fn update_user_impl(
        &self,
        id: i64,
        update: UpdateUserRequest,
    ) -> Result<Option<User>> {
        if self.get_user_by_id_impl(id).await?.is_none() {
            return Ok(None);
        }

        let mut model = ActiveModel {
            id: Set(id),
            updated_at: Set(chrono::Utc::now().timestamp()),
            ..Default::default()
        };

        if let Some(username) = update.username {
            model.username = Set(username);
        }
        if let Some(email) = update.email {
            model.email = Set(email);
        }
        if let Some(password) = update.password {
            model.password_hash = Set(password);
        }
        if let Some(role) = update.role {
            model.role = Set(role.to_string());
        }
        if let Some(status) = update.status {
            model.status = Set(status.to_string());
        }
        if let Some(display_name) = update.display_name {
            let trimmed = display_name.trim().to_string();
            model.display_name = Set((!trimmed.is_empty()).then_some(trimmed));
        }

        model
            .update(&self.db)
            .await
            .map_err(|e| TutorHubError::database_operation(format!("更新用户失败: {e}")))?;

        self.get_user_by_id_impl(id).await
    }

    /// 删除用户
    pub async fn delete_user_impl(&self, id: i64) -> Result<bool> {
        let result = Users::delete_by_id(id)
            .exec(&self.db)
            .await
            .map_err(|e| TutorHubError::database_operation(format!("删除用户失败: {e}")))?;

        Ok(result.rows_affected > 0)
    }

    /// 统计用户数量
    pub async fn count_users_impl(&self, role: Option<UserRole>, active_only: bool) -> Result<u64> {
        let mut select = Users::find();
        if let Some(role) = role {
            select = select.filter(Column::Role.eq(role.as_str()));
        }
        if active_only {
            select = select.filter(Column::Status.eq(UserStatus::Active.to_string()));
        }

        select
            .count(&self.db)
            .await
            .map_err(|e| TutorHubError::database_operation(format!("统计用户数量失败: {e}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::sea_orm_storage::test_support::new_user;

    #[tokio::test]
    async fn test_create_and_lookup() {
        let storage = SeaOrmStorage::in_memory().await;
        let user = storage
            .create_user_impl(new_user("anna", UserRole::Tutor))
            .await
            .unwrap();
        assert!(user.is_active());

        let by_login = storage
            .get_user_by_username_or_email_impl("anna@example.com")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(by_login.id, user.id);
        assert_eq!(by_login.role, UserRole::Tutor);
    }

    #[tokio::test]
    async fn test_calendar_token_lookup_and_revoke() {
        let storage = SeaOrmStorage::in_memory().await;
        let user = storage
            .create_user_impl(new_user("boris", UserRole::Admin))
            .await
            .unwrap();

        assert!(
            storage
                .set_calendar_token_impl(user.id, Some("tok".into()))
                .await
                .unwrap()
        );
        let found = storage.get_user_by_calendar_token_impl("tok").await.unwrap();
        assert_eq!(found.map(|u| u.id), Some(user.id));

        storage.set_calendar_token_impl(user.id, None).await.unwrap();
        assert!(
            storage
                .get_user_by_calendar_token_impl("tok")
                .await
                .unwrap()
                .is_none()
        );
    }

    #[tokio::test]
    async fn test_count_and_filter() {
        let storage = SeaOrmStorage::in_memory().await;
        storage
            .create_user_impl(new_user("t1", UserRole::Tutor))
            .await
            .unwrap();
        let s = storage
            .create_user_impl(new_user("s1", UserRole::Student))
            .await
            .unwrap();
        storage
            .update_user_impl(
                s.id,
                UpdateUserRequest {
                    status: Some(UserStatus::Inactive),
                    ..Default::default()
                },
            )
            .await
            .unwrap();

        assert_eq!(storage.count_users_impl(None, false).await.unwrap(), 2);
        assert_eq!(storage.count_users_impl(None, true).await.unwrap(), 1);
        assert_eq!(
            storage
                .count_users_impl(Some(UserRole::Student), false)
                .await
                .unwrap(),
            1
        );
        let inactive = storage.list_users_impl(None, Some(false)).await.unwrap();
        assert_eq!(inactive.len(), 1);
        assert_eq!(inactive[0].username, "s1");
    }

    #[tokio::test]
    async fn test_pagination() {
        let storage = SeaOrmStorage::in_memory().await;
        for i in 0..5 {
            storage
                .create_user_impl(new_user(&format!("u{i}"), UserRole::Parent))
                .await
                .unwrap();
        }
        let page = storage
            .list_users_with_pagination_impl(UserListQuery {
                page: 2,
                size: 2,
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(page.items.len(), 2);
        assert_eq!(page.pagination.total, 5);
        assert_eq!(page.pagination.total_pages, 3);
    }
}
