//! 课表与课程操作
//!
//! 读操作按当前用户的数据范围过滤，超出范围的课程一律按不存在处理。

pub mod conflicts;
pub mod create;
pub mod edit;
pub mod lessons;
pub mod week;

use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};
use std::sync::Arc;

use crate::config::AppConfig;
use crate::errors::Result;
use crate::models::lessons::entities::Lesson;
use crate::models::lessons::requests::{
    CreateLessonsRequest, LessonViewParams, RescheduleLessonRequest, SetLessonStatusRequest,
    UpdateLessonRequest,
};
use crate::models::schedule::WeekScheduleParams;
use crate::models::users::entities::User;
use crate::models::{ApiResponse, ErrorCode};
use crate::schedule::DisplayZone;
use crate::services::permissions::student_scope;
use crate::storage::Storage;

pub struct ScheduleService {
    storage: Option<Arc<dyn Storage>>,
}

impl ScheduleService {
    pub fn new_lazy() -> Self {
        Self { storage: None }
    }

    pub(crate) fn get_storage(&self, request: &HttpRequest) -> ActixResult<Arc<dyn Storage>> {
        super::storage_from_request(&self.storage, request)
    }

    // 周课表
    pub async fn week_view(
        &self,
        params: WeekScheduleParams,
        request: &HttpRequest,
    ) -> ActixResult<HttpResponse> {
        week::week_view(self, params, request).await
    }

    // 单次或每周循环建课
    pub async fn create_lessons(
        &self,
        data: CreateLessonsRequest,
        request: &HttpRequest,
    ) -> ActixResult<HttpResponse> {
        create::create_lessons(self, data, request).await
    }

    pub async fn reschedule_lesson(
        &self,
        lesson_id: i64,
        data: RescheduleLessonRequest,
        request: &HttpRequest,
    ) -> ActixResult<HttpResponse> {
        edit::reschedule_lesson(self, lesson_id, data, request).await
    }

    pub async fn set_lesson_status(
        &self,
        lesson_id: i64,
        data: SetLessonStatusRequest,
        request: &HttpRequest,
    ) -> ActixResult<HttpResponse> {
        edit::set_lesson_status(self, lesson_id, data, request).await
    }

    pub async fn update_lesson(
        &self,
        lesson_id: i64,
        data: UpdateLessonRequest,
        request: &HttpRequest,
    ) -> ActixResult<HttpResponse> {
        edit::update_lesson(self, lesson_id, data, request).await
    }

    pub async fn get_lesson(
        &self,
        lesson_id: i64,
        params: LessonViewParams,
        request: &HttpRequest,
    ) -> ActixResult<HttpResponse> {
        lessons::get_lesson(self, lesson_id, params, request).await
    }

    pub async fn delete_lesson(
        &self,
        lesson_id: i64,
        request: &HttpRequest,
    ) -> ActixResult<HttpResponse> {
        lessons::delete_lesson(self, lesson_id, request).await
    }
}

/// 请求里的时区，缺省时取配置的默认值
pub(crate) fn request_zone(value: Option<&str>) -> DisplayZone {
    DisplayZone::parse(value.or(Some(AppConfig::get().schedule.default_timezone.as_str())))
}

pub(crate) fn unauthorized() -> HttpResponse {
    HttpResponse::Unauthorized().json(ApiResponse::error_empty(
        ErrorCode::Unauthorized,
        "Unauthorized access, please login",
    ))
}

pub(crate) fn lesson_not_found() -> HttpResponse {
    HttpResponse::NotFound().json(ApiResponse::error_empty(
        ErrorCode::LessonNotFound,
        "Lesson not found",
    ))
}

/// 取课程，不存在或不在数据范围内时返回 None
pub(crate) async fn load_visible_lesson(
    storage: &Arc<dyn Storage>,
    user: &User,
    lesson_id: i64,
) -> Result<Option<Lesson>> {
    let Some(lesson) = storage.get_lesson_by_id(lesson_id).await? else {
        return Ok(None);
    };
    let scope = student_scope(storage, user).await?;
    Ok(scope.allows(lesson.student_id).then_some(lesson))
}
