//! 调用另一套部署的远程管理 API

use once_cell::sync::OnceCell;
use reqwest::{Client, Method, StatusCode};
use serde::de::DeserializeOwned;
use std::time::Duration;
use tracing::debug;

use crate::config::{AppConfig, EnvironmentEndpoint};
use crate::errors::{Result, TutorHubError};
use crate::middlewares::ADMIN_TOKEN_HEADER;
use crate::models::ApiResponse;

const USER_AGENT: &str = "Remote-Admin/1.0";
const API_PREFIX: &str = "/internal/remote-admin";

static HTTP_CLIENT: OnceCell<Client> = OnceCell::new();

fn http_client() -> Result<&'static Client> {
    HTTP_CLIENT.get_or_try_init(|| {
        Client::builder()
            .timeout(Duration::from_secs(
                AppConfig::get().remote_admin.request_timeout,
            ))
            .user_agent(USER_AGENT)
            .build()
            .map_err(|e| TutorHubError::remote_request(format!("Failed to create HTTP client: {e}")))
    })
}

/// 远端的原始响应，代理接口原样转发
#[derive(Debug)]
pub struct RemoteReply {
    pub status: StatusCode,
    pub body: serde_json::Value,
}

#[derive(Debug, Clone)]
pub struct RemoteClient {
    endpoint: EnvironmentEndpoint,
}

impl RemoteClient {
    /// 按名称取已配置的环境
    pub fn for_environment(name: &str) -> Result<Self> {
        let endpoint = AppConfig::get().environment(name).ok_or_else(|| {
            TutorHubError::environment_not_configured(format!("Unknown environment: {name}"))
        })?;
        if !endpoint.is_configured() {
            return Err(TutorHubError::environment_not_configured(format!(
                "Environment {name} is not configured"
            )));
        }
        Ok(Self {
            endpoint: endpoint.clone(),
        })
    }

    pub fn display_name(&self) -> &str {
        &self.endpoint.name
    }

    fn url(&self, path: &str) -> String {
        join_url(&self.endpoint.url, path)
    }

    /// 发送请求并返回状态码与 JSON 正文
    pub async fn send(
        &self,
        method: Method,
        path: &str,
        query: &[(String, String)],
        body: Option<&serde_json::Value>,
    ) -> Result<RemoteReply> {
        let url = self.url(path);
        debug!("Remote admin request: {} {}", method, url);

        let mut builder = http_client()?
            .request(method, &url)
            .header(ADMIN_TOKEN_HEADER, &self.endpoint.token)
            .query(query);
        if let Some(body) = body {
            builder = builder.json(body);
        }

        let response = builder.send().await?;
        let status = response.status();
        let text = response.text().await?;
        let body = if text.trim().is_empty() {
            serde_json::Value::Null
        } else {
            serde_json::from_str(&text).unwrap_or(serde_json::Value::String(text))
        };
        Ok(RemoteReply { status, body })
    }

    /// GET 并取出 `data`
    pub async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        let reply = self.send(Method::GET, path, &[], None).await?;
        unwrap_data(reply)
    }
}

fn join_url(base: &str, path: &str) -> String {
    format!("{}{}{}", base.trim_end_matches('/'), API_PREFIX, path)
}

/// 非 2xx 或业务码非 0 都视为失败
fn unwrap_data<T: DeserializeOwned>(reply: RemoteReply) -> Result<T> {
    let message = reply
        .body
        .get("message")
        .and_then(|m| m.as_str())
        .unwrap_or_default()
        .to_string();
    if !reply.status.is_success() {
        return Err(TutorHubError::remote_request(format!(
            "Remote responded {}: {}",
            reply.status, message
        )));
    }

    let envelope: ApiResponse<T> = serde_json::from_value(reply.body)?;
    if !envelope.is_success() {
        return Err(TutorHubError::remote_request(format!(
            "Remote error {}: {}",
            envelope.code, envelope.message
        )));
    }
    envelope
        .data
        .ok_or_else(|| TutorHubError::remote_request("Remote response has no data"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_join_url() {
        assert_eq!(
            join_url("https://sandbox.example.ru/", "/status"),
            "https://sandbox.example.ru/internal/remote-admin/status"
        );
        assert_eq!(
            join_url("http://127.0.0.1:8080", "/api/users/3"),
            "http://127.0.0.1:8080/internal/remote-admin/api/users/3"
        );
    }

    #[test]
    fn test_unwrap_data_success() {
        let reply = RemoteReply {
            status: StatusCode::OK,
            body: json!({
                "code": 0,
                "message": "ok",
                "data": [1, 2, 3],
                "timestamp": "2025-03-10T12:00:00Z"
            }),
        };
        let data: Vec<i32> = unwrap_data(reply).unwrap();
        assert_eq!(data, vec![1, 2, 3]);
    }

    #[test]
    fn test_unwrap_data_http_error() {
        let reply = RemoteReply {
            status: StatusCode::UNAUTHORIZED,
            body: json!({ "code": 1002, "message": "Invalid or missing admin token" }),
        };
        let err = unwrap_data::<Vec<i32>>(reply).unwrap_err();
        assert_eq!(err.code(), "E014");
        assert!(err.message().contains("Invalid or missing admin token"));
    }

    #[test]
    fn test_unwrap_data_business_error() {
        let reply = RemoteReply {
            status: StatusCode::OK,
            body: json!({
                "code": 9000,
                "message": "boom",
                "timestamp": "2025-03-10T12:00:00Z"
            }),
        };
        assert!(unwrap_data::<Vec<i32>>(reply).is_err());
    }
}
