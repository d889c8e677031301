use actix_web::{HttpRequest, HttpResponse, Result as ActixResult, guard, web};
use once_cell::sync::Lazy;

use crate::middlewares::{self, RequirePermission};
use crate::models::students::requests::{
    CreateStudentRequest, StudentListParams, UpdateStudentRequest,
};
use crate::services::StudentService;
use crate::utils::SafeIDI64;

static STUDENT_SERVICE: Lazy<StudentService> = Lazy::new(StudentService::new_lazy);

pub async fn list_students(
    req: HttpRequest,
    query: web::Query<StudentListParams>,
) -> ActixResult<HttpResponse> {
    STUDENT_SERVICE.list_students(query.into_inner(), &req).await
}

pub async fn create_student(
    req: HttpRequest,
    data: web::Json<CreateStudentRequest>,
) -> ActixResult<HttpResponse> {
    STUDENT_SERVICE.create_student(data.into_inner(), &req).await
}

pub async fn get_student(req: HttpRequest, student_id: SafeIDI64) -> ActixResult<HttpResponse> {
    STUDENT_SERVICE.get_student(student_id.0, &req).await
}

pub async fn update_student(
    req: HttpRequest,
    student_id: SafeIDI64,
    data: web::Json<UpdateStudentRequest>,
) -> ActixResult<HttpResponse> {
    STUDENT_SERVICE
        .update_student(student_id.0, data.into_inner(), &req)
        .await
}

pub async fn archive_student(req: HttpRequest, student_id: SafeIDI64) -> ActixResult<HttpResponse> {
    STUDENT_SERVICE.archive_student(student_id.0, &req).await
}

// 读取只看数据范围，写入需要权限
pub fn configure_student_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api/v1/students")
            .wrap(middlewares::RequireJWT)
            .service(
                web::resource("/{id}/archive")
                    .wrap(RequirePermission::new("user.edit"))
                    .route(web::post().to(archive_student)),
            )
            .service(
                web::scope("")
                    .guard(guard::Get())
                    .route("", web::get().to(list_students))
                    .route("/{id}", web::get().to(get_student)),
            )
            .service(
                web::scope("")
                    .guard(guard::Post())
                    .wrap(RequirePermission::new("user.create"))
                    .route("", web::post().to(create_student)),
            )
            .service(
                web::scope("")
                    .guard(guard::Put())
                    .wrap(RequirePermission::new("user.edit"))
                    .route("/{id}", web::put().to(update_student)),
            ),
    );
}
