use super::entities::StudentScope;
use crate::models::common::PaginationQuery;
use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub struct StudentListParams {
    #[serde(flatten)]
    pub pagination: PaginationQuery,
    pub search: Option<String>,
    pub category: Option<String>,
    pub is_active: Option<bool>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct CreateStudentRequest {
    pub name: String,
    pub user_id: Option<i64>,
    pub platform_id: Option<String>,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub telegram: Option<String>,
    pub category: Option<String>,
    pub school_class: Option<i32>,
    pub goal_text: Option<String>,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateStudentRequest {
    pub name: Option<String>,
    pub platform_id: Option<String>,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub telegram: Option<String>,
    pub category: Option<String>,
    pub school_class: Option<i32>,
    pub goal_text: Option<String>,
    pub notes: Option<String>,
    pub is_active: Option<bool>,
}

/// 存储层查询
#[derive(Debug, Clone)]
pub struct StudentListQuery {
    pub page: u64,
    pub size: u64,
    pub scope: StudentScope,
    pub search: Option<String>,
    pub category: Option<String>,
    pub is_active: Option<bool>,
}
