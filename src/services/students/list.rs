use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};

use super::StudentService;
use crate::middlewares::RequireJWT;
use crate::models::{
    ApiResponse, ErrorCode,
    students::requests::{StudentListParams, StudentListQuery},
};
use crate::services::permissions::student_scope;

pub async fn list_students(
    service: &StudentService,
    query: StudentListParams,
    request: &HttpRequest,
) -> ActixResult<HttpResponse> {
    let storage = service.get_storage(request)?;
    let Some(user) = RequireJWT::extract_user_claims(request) else {
        return Ok(HttpResponse::Unauthorized().json(ApiResponse::error_empty(
            ErrorCode::Unauthorized,
            "Unauthorized access, please login",
        )));
    };

    let scope = match student_scope(&storage, &user).await {
        Ok(scope) => scope,
        Err(e) => return Ok(crate::services::internal_error("Failed to resolve scope", e)),
    };

    let (page, size) = query.pagination.normalized();
    let list_query = StudentListQuery {
        page,
        size,
        scope,
        search: query.search,
        category: query.category,
        is_active: query.is_active,
    };

    match storage.list_students_with_pagination(list_query).await {
        Ok(response) => Ok(HttpResponse::Ok().json(ApiResponse::success(
            response,
            "Student list retrieved successfully",
        ))),
        Err(e) => Ok(crate::services::internal_error(
            "Failed to retrieve student list",
            e,
        )),
    }
}
