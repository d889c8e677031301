use serde::{Deserialize, Serialize};

/// 学生档案
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Student {
    pub id: i64,
    /// 学生自己的登录账号
    pub user_id: Option<i64>,
    /// 跨实例同步用的外部标识
    pub platform_id: Option<String>,
    pub name: String,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub telegram: Option<String>,
    pub category: Option<String>,
    pub school_class: Option<i32>,
    pub goal_text: Option<String>,
    pub notes: Option<String>,
    pub is_active: bool,
    pub created_at: chrono::DateTime<chrono::Utc>,
    pub updated_at: chrono::DateTime<chrono::Utc>,
}

impl Student {
    /// 课表上显示的年级文本
    pub fn grade_text(&self) -> String {
        match (self.school_class, self.category.as_deref()) {
            (Some(class), _) => format!("{class} класс"),
            (None, Some(category)) if !category.trim().is_empty() => category.to_string(),
            _ => "Не указано".to_string(),
        }
    }
}

/// 数据范围：当前用户能看到哪些学生
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StudentScope {
    All,
    Only(Vec<i64>),
}

impl StudentScope {
    pub fn allows(&self, student_id: i64) -> bool {
        match self {
            StudentScope::All => true,
            StudentScope::Only(ids) => ids.contains(&student_id),
        }
    }

    /// 与显式筛选条件求交
    pub fn narrow(self, student_id: Option<i64>) -> StudentScope {
        match (self, student_id) {
            (scope, None) => scope,
            (StudentScope::All, Some(id)) => StudentScope::Only(vec![id]),
            (StudentScope::Only(ids), Some(id)) => {
                StudentScope::Only(ids.into_iter().filter(|x| *x == id).collect())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn student(class: Option<i32>, category: Option<&str>) -> Student {
        let now = chrono::Utc::now();
        Student {
            id: 1,
            user_id: None,
            platform_id: None,
            name: "Иван".into(),
            phone: None,
            email: None,
            telegram: None,
            category: category.map(str::to_string),
            school_class: class,
            goal_text: None,
            notes: None,
            is_active: true,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn test_grade_text() {
        assert_eq!(student(Some(10), Some("ЕГЭ")).grade_text(), "10 класс");
        assert_eq!(student(None, Some("ОГЭ")).grade_text(), "ОГЭ");
        assert_eq!(student(None, None).grade_text(), "Не указано");
    }

    #[test]
    fn test_scope_narrow() {
        assert_eq!(StudentScope::All.narrow(Some(3)), StudentScope::Only(vec![3]));
        assert_eq!(
            StudentScope::Only(vec![1, 2]).narrow(Some(3)),
            StudentScope::Only(vec![])
        );
        assert!(StudentScope::Only(vec![1, 2]).narrow(None).allows(2));
    }
}
