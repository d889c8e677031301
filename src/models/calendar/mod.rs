use serde::Serialize;

/// 当前用户的日历订阅
#[derive(Debug, Clone, Serialize)]
pub struct CalendarTokenResponse {
    pub enabled: bool,
    pub token: Option<String>,
    pub feed_path: Option<String>,
}

impl CalendarTokenResponse {
    pub fn from_token(token: Option<String>) -> Self {
        let feed_path = token.as_deref().map(feed_path);
        Self {
            enabled: token.is_some(),
            token,
            feed_path,
        }
    }
}

pub fn feed_path(token: &str) -> String {
    format!("/calendar/{token}.ics")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_token_response() {
        let on = CalendarTokenResponse::from_token(Some("abc".into()));
        assert!(on.enabled);
        assert_eq!(on.feed_path.as_deref(), Some("/calendar/abc.ics"));

        let off = CalendarTokenResponse::from_token(None);
        assert!(!off.enabled);
        assert!(off.feed_path.is_none());
    }
}
