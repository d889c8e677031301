//! iCalendar 订阅源
//!
//! 每个用户可持有一个随机令牌，凭令牌即可拉取自己数据范围内的课程，不需要 JWT。

pub mod feed;
pub mod ics;
pub mod token;

use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};
use std::sync::Arc;

use crate::storage::Storage;

pub struct CalendarService {
    storage: Option<Arc<dyn Storage>>,
}

impl CalendarService {
    pub fn new_lazy() -> Self {
        Self { storage: None }
    }

    pub(crate) fn get_storage(&self, request: &HttpRequest) -> ActixResult<Arc<dyn Storage>> {
        super::storage_from_request(&self.storage, request)
    }

    // .ics 订阅
    pub async fn feed(&self, token: &str, request: &HttpRequest) -> ActixResult<HttpResponse> {
        feed::calendar_feed(self, token, request).await
    }

    pub async fn get_token(&self, request: &HttpRequest) -> ActixResult<HttpResponse> {
        token::get_token(self, request).await
    }

    pub async fn rotate_token(&self, request: &HttpRequest) -> ActixResult<HttpResponse> {
        token::rotate_token(self, request).await
    }

    pub async fn revoke_token(&self, request: &HttpRequest) -> ActixResult<HttpResponse> {
        token::revoke_token(self, request).await
    }
}
