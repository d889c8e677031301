pub mod create;
pub mod get;
pub mod list;
pub mod update;

use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};
use std::sync::Arc;

use crate::errors::Result;
use crate::models::students::requests::{
    CreateStudentRequest, StudentListParams, UpdateStudentRequest,
};
use crate::models::{ApiResponse, ErrorCode};
use crate::storage::Storage;
use crate::utils::validate::{validate_platform_id, validate_school_class};

pub struct StudentService {
    storage: Option<Arc<dyn Storage>>,
}

impl StudentService {
    pub fn new_lazy() -> Self {
        Self { storage: None }
    }

    pub(crate) fn get_storage(&self, request: &HttpRequest) -> ActixResult<Arc<dyn Storage>> {
        super::storage_from_request(&self.storage, request)
    }

    // 学生列表（按数据范围过滤）
    pub async fn list_students(
        &self,
        query: StudentListParams,
        request: &HttpRequest,
    ) -> ActixResult<HttpResponse> {
        list::list_students(self, query, request).await
    }

    pub async fn create_student(
        &self,
        data: CreateStudentRequest,
        request: &HttpRequest,
    ) -> ActixResult<HttpResponse> {
        create::create_student(self, data, request).await
    }

    pub async fn get_student(
        &self,
        student_id: i64,
        request: &HttpRequest,
    ) -> ActixResult<HttpResponse> {
        get::get_student(self, student_id, request).await
    }

    pub async fn update_student(
        &self,
        student_id: i64,
        data: UpdateStudentRequest,
        request: &HttpRequest,
    ) -> ActixResult<HttpResponse> {
        update::update_student(self, student_id, data, request).await
    }

    // 归档：is_active = false，历史课程保留
    pub async fn archive_student(
        &self,
        student_id: i64,
        request: &HttpRequest,
    ) -> ActixResult<HttpResponse> {
        update::archive_student(self, student_id, request).await
    }
}

fn invalid_field(message: &str) -> HttpResponse {
    HttpResponse::BadRequest().json(ApiResponse::error_empty(
        ErrorCode::StudentInvalidField,
        message,
    ))
}

/// 校验年级与 platform_id；platform_id 已被其他学生占用时返回 409
pub(crate) async fn check_student_fields(
    storage: &Arc<dyn Storage>,
    school_class: Option<i32>,
    platform_id: Option<&str>,
    exclude_id: Option<i64>,
) -> Result<Option<HttpResponse>> {
    if let Some(class) = school_class
        && let Err(msg) = validate_school_class(class)
    {
        return Ok(Some(invalid_field(msg)));
    }

    let Some(platform_id) = platform_id.map(str::trim).filter(|p| !p.is_empty()) else {
        return Ok(None);
    };
    if let Err(msg) = validate_platform_id(platform_id) {
        return Ok(Some(invalid_field(msg)));
    }
    if let Some(existing) = storage.get_student_by_platform_id(platform_id).await?
        && Some(existing.id) != exclude_id
    {
        return Ok(Some(HttpResponse::Conflict().json(ApiResponse::error_empty(
            ErrorCode::StudentInvalidField,
            format!("Platform ID {platform_id} is already taken by another student"),
        ))));
    }
    Ok(None)
}
