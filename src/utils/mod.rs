pub mod admin_token;
pub mod extractor;
pub mod jwt;
pub mod parameter_error_handler;
pub mod password;
pub mod sql;
pub mod validate;

pub use extractor::{SafeEnvName, SafeIDI64};
pub use parameter_error_handler::json_error_handler;
pub use parameter_error_handler::query_error_handler;
pub use sql::escape_like_pattern;

/// 客户端 IP（审计日志用）
pub fn client_ip(request: &actix_web::HttpRequest) -> Option<String> {
    request
        .connection_info()
        .realip_remote_addr()
        .map(|s| s.to_string())
}
