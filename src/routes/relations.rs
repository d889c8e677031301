use actix_web::{HttpRequest, HttpResponse, Result as ActixResult, web};
use once_cell::sync::Lazy;

use crate::middlewares;
use crate::models::relations::{
    CreateEnrollmentRequest, CreateFamilyTieRequest, UpdateEnrollmentRequest,
    UpdateFamilyTieRequest,
};
use crate::models::users::entities::UserRole;
use crate::services::RelationService;
use crate::utils::SafeIDI64;

pub(crate) static RELATION_SERVICE: Lazy<RelationService> = Lazy::new(RelationService::new_lazy);

pub async fn student_relations(
    req: HttpRequest,
    student_id: SafeIDI64,
) -> ActixResult<HttpResponse> {
    RELATION_SERVICE.student_relations(student_id.0, &req).await
}

pub async fn create_enrollment(
    req: HttpRequest,
    data: web::Json<CreateEnrollmentRequest>,
) -> ActixResult<HttpResponse> {
    RELATION_SERVICE.create_enrollment(data.into_inner(), &req).await
}

pub async fn get_enrollment(req: HttpRequest, enrollment_id: SafeIDI64) -> ActixResult<HttpResponse> {
    RELATION_SERVICE.get_enrollment(enrollment_id.0, &req).await
}

pub async fn update_enrollment(
    req: HttpRequest,
    enrollment_id: SafeIDI64,
    data: web::Json<UpdateEnrollmentRequest>,
) -> ActixResult<HttpResponse> {
    RELATION_SERVICE
        .update_enrollment(enrollment_id.0, data.into_inner(), &req)
        .await
}

pub async fn delete_enrollment(
    req: HttpRequest,
    enrollment_id: SafeIDI64,
) -> ActixResult<HttpResponse> {
    RELATION_SERVICE.delete_enrollment(enrollment_id.0, &req).await
}

pub async fn create_family_tie(
    req: HttpRequest,
    data: web::Json<CreateFamilyTieRequest>,
) -> ActixResult<HttpResponse> {
    RELATION_SERVICE.create_family_tie(data.into_inner(), &req).await
}

pub async fn get_family_tie(req: HttpRequest, tie_id: SafeIDI64) -> ActixResult<HttpResponse> {
    RELATION_SERVICE.get_family_tie(tie_id.0, &req).await
}

pub async fn update_family_tie(
    req: HttpRequest,
    tie_id: SafeIDI64,
    data: web::Json<UpdateFamilyTieRequest>,
) -> ActixResult<HttpResponse> {
    RELATION_SERVICE
        .update_family_tie(tie_id.0, data.into_inner(), &req)
        .await
}

pub async fn delete_family_tie(req: HttpRequest, tie_id: SafeIDI64) -> ActixResult<HttpResponse> {
    RELATION_SERVICE.delete_family_tie(tie_id.0, &req).await
}

pub fn configure_relation_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api/v1/relations")
            .wrap(middlewares::RequireRole::new_any(UserRole::admin_roles()))
            .wrap(middlewares::RequireJWT)
            .route("/students/{id}", web::get().to(student_relations))
            .route("/enrollments", web::post().to(create_enrollment))
            .route("/enrollments/{id}", web::get().to(get_enrollment))
            .route("/enrollments/{id}", web::put().to(update_enrollment))
            .route("/enrollments/{id}", web::delete().to(delete_enrollment))
            .route("/family-ties", web::post().to(create_family_tie))
            .route("/family-ties/{id}", web::get().to(get_family_tie))
            .route("/family-ties/{id}", web::put().to(update_family_tie))
            .route("/family-ties/{id}", web::delete().to(delete_family_tie)),
    );
}
