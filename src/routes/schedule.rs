use actix_web::{HttpRequest, HttpResponse, Result as ActixResult, guard, web};
use once_cell::sync::Lazy;

use crate::middlewares::{self, RequirePermission};
use crate::models::lessons::requests::{
    CreateLessonsRequest, LessonViewParams, RescheduleLessonRequest, SetLessonStatusRequest,
    UpdateLessonRequest,
};
use crate::models::schedule::WeekScheduleParams;
use crate::services::ScheduleService;
use crate::utils::SafeIDI64;

static SCHEDULE_SERVICE: Lazy<ScheduleService> = Lazy::new(ScheduleService::new_lazy);

pub async fn week_view(
    req: HttpRequest,
    query: web::Query<WeekScheduleParams>,
) -> ActixResult<HttpResponse> {
    SCHEDULE_SERVICE.week_view(query.into_inner(), &req).await
}

pub async fn create_lessons(
    req: HttpRequest,
    data: web::Json<CreateLessonsRequest>,
) -> ActixResult<HttpResponse> {
    SCHEDULE_SERVICE.create_lessons(data.into_inner(), &req).await
}

pub async fn reschedule_lesson(
    req: HttpRequest,
    lesson_id: SafeIDI64,
    data: web::Json<RescheduleLessonRequest>,
) -> ActixResult<HttpResponse> {
    SCHEDULE_SERVICE
        .reschedule_lesson(lesson_id.0, data.into_inner(), &req)
        .await
}

pub async fn set_lesson_status(
    req: HttpRequest,
    lesson_id: SafeIDI64,
    data: web::Json<SetLessonStatusRequest>,
) -> ActixResult<HttpResponse> {
    SCHEDULE_SERVICE
        .set_lesson_status(lesson_id.0, data.into_inner(), &req)
        .await
}

pub async fn update_lesson(
    req: HttpRequest,
    lesson_id: SafeIDI64,
    data: web::Json<UpdateLessonRequest>,
) -> ActixResult<HttpResponse> {
    SCHEDULE_SERVICE
        .update_lesson(lesson_id.0, data.into_inner(), &req)
        .await
}

pub async fn get_lesson(
    req: HttpRequest,
    lesson_id: SafeIDI64,
    query: web::Query<LessonViewParams>,
) -> ActixResult<HttpResponse> {
    SCHEDULE_SERVICE
        .get_lesson(lesson_id.0, query.into_inner(), &req)
        .await
}

pub async fn delete_lesson(req: HttpRequest, lesson_id: SafeIDI64) -> ActixResult<HttpResponse> {
    SCHEDULE_SERVICE.delete_lesson(lesson_id.0, &req).await
}

pub fn configure_schedule_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api/v1/schedule")
            .wrap(middlewares::RequireJWT)
            .route("", web::get().to(week_view))
            .service(
                web::resource("/lessons")
                    .wrap(RequirePermission::new("lesson.create"))
                    .route(web::post().to(create_lessons)),
            )
            .service(
                web::scope("/lessons/{id}")
                    .wrap(RequirePermission::new("lesson.edit"))
                    .route("/reschedule", web::post().to(reschedule_lesson))
                    .route("/status", web::post().to(set_lesson_status))
                    .route("/update", web::post().to(update_lesson)),
            ),
    );
}

pub fn configure_lesson_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api/v1/lessons")
            .wrap(middlewares::RequireJWT)
            .service(
                web::scope("")
                    .guard(guard::Delete())
                    .wrap(RequirePermission::new("lesson.delete"))
                    .route("/{id}", web::delete().to(delete_lesson)),
            )
            .route("/{id}", web::get().to(get_lesson)),
    );
}
