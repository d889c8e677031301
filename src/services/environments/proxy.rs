//! 把请求转发到指定环境，远端的状态码和正文原样返回

use actix_web::http::StatusCode;
use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};
use reqwest::Method;

use super::{RemoteClient, remote_error};
use crate::services::audit;

/// 允许代理的远端调用
#[derive(Debug, Clone)]
pub enum ProxyCall {
    ListUsers(Vec<(String, String)>),
    GetUser(i64),
    CreateUser(serde_json::Value),
    UpdateUser(i64, serde_json::Value),
    DeleteUser(i64),
    Stats,
}

impl ProxyCall {
    fn method(&self) -> Method {
        match self {
            ProxyCall::ListUsers(_) | ProxyCall::GetUser(_) | ProxyCall::Stats => Method::GET,
            ProxyCall::CreateUser(_) | ProxyCall::UpdateUser(..) => Method::POST,
            ProxyCall::DeleteUser(_) => Method::DELETE,
        }
    }

    fn path(&self) -> String {
        match self {
            ProxyCall::ListUsers(_) | ProxyCall::CreateUser(_) => "/api/users".to_string(),
            ProxyCall::GetUser(id) | ProxyCall::UpdateUser(id, _) | ProxyCall::DeleteUser(id) => {
                format!("/api/users/{id}")
            }
            ProxyCall::Stats => "/api/stats".to_string(),
        }
    }

    fn query(&self) -> &[(String, String)] {
        match self {
            ProxyCall::ListUsers(query) => query,
            _ => &[],
        }
    }

    fn body(&self) -> Option<&serde_json::Value> {
        match self {
            ProxyCall::CreateUser(body) | ProxyCall::UpdateUser(_, body) => Some(body),
            _ => None,
        }
    }

    /// 写操作需要审计
    fn audit_action(&self) -> Option<&'static str> {
        match self {
            ProxyCall::CreateUser(_) => Some("proxy_create_user"),
            ProxyCall::UpdateUser(..) => Some("proxy_update_user"),
            ProxyCall::DeleteUser(_) => Some("proxy_delete_user"),
            _ => None,
        }
    }
}

pub async fn forward(env: &str, call: ProxyCall, request: &HttpRequest) -> ActixResult<HttpResponse> {
    let client = match RemoteClient::for_environment(env) {
        Ok(client) => client,
        Err(e) => return Ok(remote_error(e)),
    };

    let reply = match client
        .send(call.method(), &call.path(), call.query(), call.body())
        .await
    {
        Ok(reply) => reply,
        Err(e) => return Ok(remote_error(e)),
    };

    if let Some(action) = call.audit_action() {
        let entry = audit::entry_for(request, action).metadata(serde_json::json!({
            "environment": env,
            "path": call.path(),
            "remote_status": reply.status.as_u16(),
        }));
        audit::record(if reply.status.is_success() {
            entry
        } else {
            entry.status("failed")
        });
    }

    let status = StatusCode::from_u16(reply.status.as_u16()).unwrap_or(StatusCode::BAD_GATEWAY);
    Ok(HttpResponse::build(status).json(reply.body))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_call_routing() {
        let call = ProxyCall::UpdateUser(5, serde_json::json!({"is_active": false}));
        assert_eq!(call.method(), Method::POST);
        assert_eq!(call.path(), "/api/users/5");
        assert!(call.body().is_some());
        assert_eq!(call.audit_action(), Some("proxy_update_user"));

        let call = ProxyCall::ListUsers(vec![("role".into(), "tutor".into())]);
        assert_eq!(call.method(), Method::GET);
        assert_eq!(call.path(), "/api/users");
        assert_eq!(call.query().len(), 1);
        assert_eq!(call.audit_action(), None);

        assert_eq!(ProxyCall::Stats.path(), "/api/stats");
        assert_eq!(ProxyCall::DeleteUser(9).method(), Method::DELETE);
    }
}
