//! 数据范围：当前用户能看到哪些学生

use std::sync::Arc;

use crate::errors::Result;
use crate::models::students::entities::StudentScope;
use crate::models::users::entities::{User, UserRole};
use crate::storage::Storage;

pub async fn student_scope(storage: &Arc<dyn Storage>, user: &User) -> Result<StudentScope> {
    if user.role.sees_all_students() {
        return Ok(StudentScope::All);
    }

    let ids = match user.role {
        UserRole::Tutor => storage.tutor_student_ids(user.id).await?,
        UserRole::Parent => storage.parent_student_ids(user.id).await?,
        UserRole::Student => storage
            .get_student_by_user_id(user.id)
            .await?
            .map(|s| vec![s.id])
            .unwrap_or_default(),
        _ => Vec::new(),
    };
    Ok(StudentScope::Only(ids))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::relations::CreateFamilyTieRequest;
    use crate::storage::sea_orm_storage::SeaOrmStorage;
    use crate::storage::sea_orm_storage::test_support::{seed_student, seed_user};

    #[tokio::test]
    async fn test_scope_by_role() {
        let db = SeaOrmStorage::in_memory().await;
        let admin = seed_user(&db, "boss", UserRole::Admin).await;
        let tutor = seed_user(&db, "tutor", UserRole::Tutor).await;
        let parent = seed_user(&db, "mom", UserRole::Parent).await;
        let a = seed_student(&db, "A").await;
        let b = seed_student(&db, "B").await;
        db.assign_general_tutor_impl(a.id, Some(tutor.id), false)
            .await
            .unwrap();
        db.create_family_tie_impl(CreateFamilyTieRequest {
            parent_id: parent.id,
            student_id: b.id,
            access_level: None,
            is_confirmed: Some(false),
        })
        .await
        .unwrap();

        let storage: Arc<dyn Storage> = Arc::new(db);
        assert_eq!(student_scope(&storage, &admin).await.unwrap(), StudentScope::All);
        assert_eq!(
            student_scope(&storage, &tutor).await.unwrap(),
            StudentScope::Only(vec![a.id])
        );
        // 未确认的家庭关系不可见
        assert_eq!(
            student_scope(&storage, &parent).await.unwrap(),
            StudentScope::Only(vec![])
        );
    }
}
