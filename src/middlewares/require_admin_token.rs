/*!
 * 远程管理令牌中间件
 *
 * 服务端远程管理接口不走 JWT，而是校验 `X-Admin-Token` 头。
 * 可接受的令牌来自配置中的 production / sandbox / admin 令牌以及 `ENV_*_TOKEN` 环境变量。
 */

use actix_service::{Service, Transform};
use actix_web::{
    Error,
    body::EitherBody,
    dev::{ServiceRequest, ServiceResponse},
    http::StatusCode,
};
use futures_util::future::{LocalBoxFuture, Ready, ready};
use std::rc::Rc;
use tracing::{debug, warn};

use crate::{config::AppConfig, models::ErrorCode, utils::admin_token};

use super::create_error_response;

pub const ADMIN_TOKEN_HEADER: &str = "X-Admin-Token";

#[derive(Clone)]
pub struct RequireAdminToken;

fn provided_token(req: &ServiceRequest) -> Option<&str> {
    req.headers()
        .get(ADMIN_TOKEN_HEADER)
        .and_then(|h| h.to_str().ok())
        .map(str::trim)
        .filter(|s| !s.is_empty())
}

impl<S, B> Transform<S, ServiceRequest> for RequireAdminToken
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type InitError = ();
    type Transform = RequireAdminTokenMiddleware<S>;
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(RequireAdminTokenMiddleware {
            service: Rc::new(service),
        }))
    }
}

pub struct RequireAdminTokenMiddleware<S> {
    service: Rc<S>,
}

impl<S, B> Service<ServiceRequest> for RequireAdminTokenMiddleware<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    fn poll_ready(
        &self,
        ctx: &mut std::task::Context<'_>,
    ) -> std::task::Poll<Result<(), Self::Error>> {
        self.service.poll_ready(ctx)
    }

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let srv = self.service.clone();

        Box::pin(async move {
            let accepted = AppConfig::get().accepted_admin_tokens();
            let authorized = match provided_token(&req) {
                Some(token) => {
                    let ok = admin_token::is_accepted(token, &accepted);
                    if !ok {
                        warn!(
                            "Rejected admin token {} on {}",
                            admin_token::fingerprint(token),
                            req.path()
                        );
                    }
                    ok
                }
                None => false,
            };

            if !authorized {
                return Ok(req.into_response(
                    create_error_response(
                        StatusCode::UNAUTHORIZED,
                        ErrorCode::Unauthorized,
                        "Invalid or missing admin token",
                    )
                    .map_into_right_body(),
                ));
            }

            debug!("Admin token accepted for {}", req.path());
            let res = srv.call(req).await?.map_into_left_body();
            Ok(res)
        })
    }
}
