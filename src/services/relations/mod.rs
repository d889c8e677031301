//! 学生与导师、家长的关系维护（仅管理员）

pub mod enrollments;
pub mod family_ties;

use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};
use serde::Serialize;
use std::sync::Arc;

use crate::models::relations::{
    CreateEnrollmentRequest, CreateFamilyTieRequest, Enrollment, FamilyTie,
    UpdateEnrollmentRequest, UpdateFamilyTieRequest,
};
use crate::models::{ApiResponse, ErrorCode};
use crate::storage::{FamilySide, Storage};

pub struct RelationService {
    storage: Option<Arc<dyn Storage>>,
}

#[derive(Debug, Serialize)]
pub struct StudentRelationsResponse {
    pub student_id: i64,
    pub enrollments: Vec<Enrollment>,
    pub family_ties: Vec<FamilyTie>,
}

impl RelationService {
    pub fn new_lazy() -> Self {
        Self { storage: None }
    }

    pub(crate) fn get_storage(&self, request: &HttpRequest) -> ActixResult<Arc<dyn Storage>> {
        super::storage_from_request(&self.storage, request)
    }

    /// 某个学生的全部导师关系与家庭关系
    pub async fn student_relations(
        &self,
        student_id: i64,
        request: &HttpRequest,
    ) -> ActixResult<HttpResponse> {
        let storage = self.get_storage(request)?;

        match storage.get_student_by_id(student_id).await {
            Ok(Some(_)) => {}
            Ok(None) => {
                return Ok(HttpResponse::NotFound().json(ApiResponse::error_empty(
                    ErrorCode::StudentNotFound,
                    "Student not found",
                )));
            }
            Err(e) => return Ok(super::internal_error("Failed to load relations", e)),
        }

        let enrollments = storage.list_student_enrollments(student_id).await;
        let family_ties = storage
            .list_family_ties(FamilySide::Student(student_id))
            .await;
        match (enrollments, family_ties) {
            (Ok(enrollments), Ok(family_ties)) => Ok(HttpResponse::Ok().json(
                ApiResponse::success(
                    StudentRelationsResponse {
                        student_id,
                        enrollments,
                        family_ties,
                    },
                    "Relations retrieved successfully",
                ),
            )),
            (Err(e), _) | (_, Err(e)) => Ok(super::internal_error("Failed to load relations", e)),
        }
    }

    pub async fn create_enrollment(
        &self,
        data: CreateEnrollmentRequest,
        request: &HttpRequest,
    ) -> ActixResult<HttpResponse> {
        enrollments::create_enrollment(self, data, request).await
    }

    pub async fn get_enrollment(
        &self,
        enrollment_id: i64,
        request: &HttpRequest,
    ) -> ActixResult<HttpResponse> {
        enrollments::get_enrollment(self, enrollment_id, request).await
    }

    pub async fn update_enrollment(
        &self,
        enrollment_id: i64,
        data: UpdateEnrollmentRequest,
        request: &HttpRequest,
    ) -> ActixResult<HttpResponse> {
        enrollments::update_enrollment(self, enrollment_id, data, request).await
    }

    pub async fn delete_enrollment(
        &self,
        enrollment_id: i64,
        request: &HttpRequest,
    ) -> ActixResult<HttpResponse> {
        enrollments::delete_enrollment(self, enrollment_id, request).await
    }

    pub async fn create_family_tie(
        &self,
        data: CreateFamilyTieRequest,
        request: &HttpRequest,
    ) -> ActixResult<HttpResponse> {
        family_ties::create_family_tie(self, data, request).await
    }

    pub async fn get_family_tie(&self, tie_id: i64, request: &HttpRequest) -> ActixResult<HttpResponse> {
        family_ties::get_family_tie(self, tie_id, request).await
    }

    pub async fn update_family_tie(
        &self,
        tie_id: i64,
        data: UpdateFamilyTieRequest,
        request: &HttpRequest,
    ) -> ActixResult<HttpResponse> {
        family_ties::update_family_tie(self, tie_id, data, request).await
    }

    pub async fn delete_family_tie(
        &self,
        tie_id: i64,
        request: &HttpRequest,
    ) -> ActixResult<HttpResponse> {
        family_ties::delete_family_tie(self, tie_id, request).await
    }
}
