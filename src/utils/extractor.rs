//! 路径参数提取器
//!
//! 解析失败时直接返回统一格式的 400 响应，处理函数里不用再判断。

use actix_web::{FromRequest, HttpRequest, HttpResponse, dev::Payload, error::InternalError};
use futures_util::future::{Ready, ready};

use crate::models::{ApiResponse, ErrorCode};

fn bad_path(message: &str) -> actix_web::Error {
    InternalError::from_response(
        message.to_string(),
        HttpResponse::BadRequest().json(ApiResponse::error_empty(ErrorCode::BadRequest, message)),
    )
    .into()
}

/// `{id}` 路径参数，必须是正整数
#[derive(Debug, Clone, Copy)]
pub struct SafeIDI64(pub i64);

impl FromRequest for SafeIDI64 {
    type Error = actix_web::Error;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _: &mut Payload) -> Self::Future {
        let parsed = req
            .match_info()
            .get("id")
            .and_then(|raw| raw.parse::<i64>().ok())
            .filter(|id| *id > 0);

        ready(match parsed {
            Some(id) => Ok(SafeIDI64(id)),
            None => Err(bad_path("Invalid id in path")),
        })
    }
}

/// `{env}` 路径参数：production / sandbox
#[derive(Debug, Clone)]
pub struct SafeEnvName(pub String);

impl FromRequest for SafeEnvName {
    type Error = actix_web::Error;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _: &mut Payload) -> Self::Future {
        let name = req.match_info().get("env").unwrap_or_default();
        ready(match name {
            "production" | "sandbox" => Ok(SafeEnvName(name.to_string())),
            _ => Err(bad_path("Unknown environment")),
        })
    }
}
