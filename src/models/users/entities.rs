use serde::{Deserialize, Serialize};

/// 用户角色
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "snake_case")]
pub enum UserRole {
    Creator,
    Admin,
    Tutor,
    Student,
    Parent,
    Tester,
    ChiefTester,
    Designer,
}

impl UserRole {
    pub const ALL: [UserRole; 8] = [
        UserRole::Creator,
        UserRole::Admin,
        UserRole::Tutor,
        UserRole::Student,
        UserRole::Parent,
        UserRole::Tester,
        UserRole::ChiefTester,
        UserRole::Designer,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            UserRole::Creator => "creator",
            UserRole::Admin => "admin",
            UserRole::Tutor => "tutor",
            UserRole::Student => "student",
            UserRole::Parent => "parent",
            UserRole::Tester => "tester",
            UserRole::ChiefTester => "chief_tester",
            UserRole::Designer => "designer",
        }
    }

    pub fn admin_roles() -> &'static [UserRole] {
        &[UserRole::Creator, UserRole::Admin]
    }

    pub fn creator_roles() -> &'static [UserRole] {
        &[UserRole::Creator]
    }

    pub fn is_admin(&self) -> bool {
        matches!(self, UserRole::Creator | UserRole::Admin)
    }

    /// 不受数据范围限制的角色（管理员及历史遗留的内部角色）
    pub fn sees_all_students(&self) -> bool {
        matches!(
            self,
            UserRole::Creator
                | UserRole::Admin
                | UserRole::Tester
                | UserRole::ChiefTester
                | UserRole::Designer
        )
    }
}

impl std::fmt::Display for UserRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for UserRole {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        UserRole::ALL
            .into_iter()
            .find(|r| r.as_str() == s)
            .ok_or_else(|| format!("Invalid user role: {s}"))
    }
}

/// 用户状态
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum UserStatus {
    Active,
    Inactive,
    Suspended,
}

impl std::fmt::Display for UserStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            UserStatus::Active => write!(f, "active"),
            UserStatus::Inactive => write!(f, "inactive"),
            UserStatus::Suspended => write!(f, "suspended"),
        }
    }
}

impl std::str::FromStr for UserStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "active" => Ok(UserStatus::Active),
            "inactive" => Ok(UserStatus::Inactive),
            "suspended" => Ok(UserStatus::Suspended),
            _ => Err(format!("Invalid user status: {s}")),
        }
    }
}

/// 用户实体
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: i64,
    pub username: String,
    pub email: String,
    #[serde(skip_serializing, default)]
    pub password_hash: String,
    pub role: UserRole,
    pub status: UserStatus,
    pub display_name: Option<String>,
    #[serde(skip_serializing, default)]
    pub calendar_token: Option<String>,
    pub last_login: Option<chrono::DateTime<chrono::Utc>>,
    pub created_at: chrono::DateTime<chrono::Utc>,
    pub updated_at: chrono::DateTime<chrono::Utc>,
}

impl User {
    pub fn is_active(&self) -> bool {
        self.status == UserStatus::Active
    }

    /// 展示名，未设置时回退到用户名
    pub fn visible_name(&self) -> &str {
        self.display_name
            .as_deref()
            .filter(|n| !n.trim().is_empty())
            .unwrap_or(&self.username)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_parse_roundtrip() {
        for role in UserRole::ALL {
            assert_eq!(role.as_str().parse::<UserRole>().unwrap(), role);
        }
        assert!("teacher".parse::<UserRole>().is_err());
    }

    #[test]
    fn test_role_serde_snake_case() {
        let json = serde_json::to_string(&UserRole::ChiefTester).unwrap();
        assert_eq!(json, "\"chief_tester\"");
    }

    #[test]
    fn test_scope_roles() {
        assert!(UserRole::Designer.sees_all_students());
        assert!(!UserRole::Designer.is_admin());
        assert!(!UserRole::Tutor.sees_all_students());
        assert!(!UserRole::Parent.sees_all_students());
    }
}
