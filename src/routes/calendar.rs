use actix_web::{HttpRequest, HttpResponse, Result as ActixResult, web};
use once_cell::sync::Lazy;

use crate::middlewares::{self, RateLimit};
use crate::services::CalendarService;

static CALENDAR_SERVICE: Lazy<CalendarService> = Lazy::new(CalendarService::new_lazy);

pub async fn feed(req: HttpRequest, token: web::Path<String>) -> ActixResult<HttpResponse> {
    CALENDAR_SERVICE.feed(&token, &req).await
}

pub async fn get_token(req: HttpRequest) -> ActixResult<HttpResponse> {
    CALENDAR_SERVICE.get_token(&req).await
}

pub async fn rotate_token(req: HttpRequest) -> ActixResult<HttpResponse> {
    CALENDAR_SERVICE.rotate_token(&req).await
}

pub async fn revoke_token(req: HttpRequest) -> ActixResult<HttpResponse> {
    CALENDAR_SERVICE.revoke_token(&req).await
}

pub fn configure_calendar_routes(cfg: &mut web::ServiceConfig) {
    // 订阅地址不需要登录，令牌即凭证
    cfg.service(
        web::resource("/calendar/{token}.ics")
            .wrap(RateLimit::calendar_feed())
            .route(web::get().to(feed)),
    );
    cfg.service(
        web::scope("/api/v1/calendar")
            .wrap(middlewares::RequireJWT)
            .route("/token", web::get().to(get_token))
            .route("/token", web::post().to(rotate_token))
            .route("/token", web::delete().to(revoke_token)),
    );
}
