//! 权限注册表与各角色的默认授权

use crate::models::permissions::{PermissionCategory, PermissionInfo};
use crate::models::users::entities::UserRole;

const fn perm(
    name: &'static str,
    description: &'static str,
    category: &'static str,
) -> PermissionInfo {
    PermissionInfo {
        name,
        description,
        category,
    }
}

pub const PERMISSIONS: [PermissionInfo; 15] = [
    perm("user.view_list", "Просмотр списка пользователей", "users"),
    perm("user.create", "Создание пользователей", "users"),
    perm("user.edit", "Редактирование пользователей", "users"),
    perm("user.delete", "Удаление пользователей", "users"),
    perm("user.manage_roles", "Изменение ролей", "users"),
    perm("lesson.create", "Создание уроков", "content"),
    perm("lesson.edit", "Редактирование уроков", "content"),
    perm("lesson.delete", "Удаление уроков", "content"),
    perm("task.manage", "Управление банком заданий", "content"),
    perm("finance.view_stats", "Просмотр общей статистики", "finance"),
    perm("assets.manage", "Управление графикой и иконками", "design"),
    perm("tools.testers", "Управление тестировщиками", "tools"),
    perm("tools.schedule", "Управление расписанием", "tools"),
    perm("system.logs", "Просмотр логов", "system"),
    perm("system.settings", "Настройки системы", "system"),
];

pub const CATEGORIES: [PermissionCategory; 6] = [
    PermissionCategory {
        key: "users",
        title: "Управление пользователями",
    },
    PermissionCategory {
        key: "content",
        title: "Управление контентом",
    },
    PermissionCategory {
        key: "system",
        title: "Системные настройки",
    },
    PermissionCategory {
        key: "finance",
        title: "Финансы и статистика",
    },
    PermissionCategory {
        key: "tools",
        title: "Инструменты",
    },
    PermissionCategory {
        key: "design",
        title: "Дизайн и ассеты",
    },
];

pub fn is_known(name: &str) -> bool {
    PERMISSIONS.iter().any(|p| p.name == name)
}

pub fn all_names() -> impl Iterator<Item = &'static str> {
    PERMISSIONS.iter().map(|p| p.name)
}

/// 数据库里没有该角色的行时使用的授权
pub fn default_grants(role: UserRole) -> Vec<&'static str> {
    match role {
        UserRole::Creator | UserRole::Admin => all_names().collect(),
        UserRole::ChiefTester => vec!["tools.testers", "task.manage", "user.view_list"],
        UserRole::Designer => vec!["assets.manage"],
        UserRole::Tutor => vec![
            "lesson.create",
            "lesson.edit",
            "user.view_list",
            "tools.schedule",
            "task.manage",
        ],
        UserRole::Student | UserRole::Parent | UserRole::Tester => Vec::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_registry_names_unique_and_categorized() {
        let names: HashSet<_> = all_names().collect();
        assert_eq!(names.len(), PERMISSIONS.len());
        let keys: HashSet<_> = CATEGORIES.iter().map(|c| c.key).collect();
        assert!(PERMISSIONS.iter().all(|p| keys.contains(p.category)));
    }

    #[test]
    fn test_defaults_only_reference_registry() {
        for role in UserRole::ALL {
            assert!(default_grants(role).into_iter().all(is_known), "{role}");
        }
        assert_eq!(default_grants(UserRole::Admin).len(), PERMISSIONS.len());
        assert!(default_grants(UserRole::Parent).is_empty());
        assert!(!default_grants(UserRole::Tutor).contains(&"lesson.delete"));
    }
}
