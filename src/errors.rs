//! 统一错误处理模块
//!
//! 使用宏生成错误枚举，每个变体带错误代码与类型名称。

use std::fmt;

/// 定义错误类型的宏
///
/// 生成内容：
/// - enum 定义
/// - code() / error_type() / message()
/// - snake_case 便捷构造函数
macro_rules! define_tutorhub_errors {
    ($(
        $variant:ident($code:literal, $type_name:literal)
    ),* $(,)?) => {
        #[derive(Debug, Clone)]
        pub enum TutorHubError {
            $($variant(String),)*
        }

        impl TutorHubError {
            pub fn code(&self) -> &'static str {
                match self {
                    $(TutorHubError::$variant(_) => $code,)*
                }
            }

            pub fn error_type(&self) -> &'static str {
                match self {
                    $(TutorHubError::$variant(_) => $type_name,)*
                }
            }

            pub fn message(&self) -> &str {
                match self {
                    $(TutorHubError::$variant(msg) => msg,)*
                }
            }
        }

        paste::paste! {
            impl TutorHubError {
                $(
                    pub fn [<$variant:snake>]<T: Into<String>>(msg: T) -> Self {
                        TutorHubError::$variant(msg.into())
                    }
                )*
            }
        }
    };
}

define_tutorhub_errors! {
    CacheConnection("E001", "Cache Connection Error"),
    CachePluginNotFound("E002", "Cache Plugin Not Found"),
    DatabaseConfig("E003", "Database Configuration Error"),
    DatabaseConnection("E004", "Database Connection Error"),
    DatabaseOperation("E005", "Database Operation Error"),
    Io("E006", "IO Error"),
    Validation("E007", "Validation Error"),
    NotFound("E008", "Resource Not Found"),
    Serialization("E009", "Serialization Error"),
    DateParse("E010", "Date Parse Error"),
    Authentication("E011", "Authentication Error"),
    Authorization("E012", "Authorization Error"),
    Conflict("E013", "Resource Conflict"),
    RemoteRequest("E014", "Remote Request Error"),
    EnvironmentNotConfigured("E015", "Environment Not Configured"),
}

impl TutorHubError {
    pub fn format_simple(&self) -> String {
        format!("{}: {}", self.error_type(), self.message())
    }

    /// 是否属于调用方可修正的输入错误
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            TutorHubError::Validation(_)
                | TutorHubError::NotFound(_)
                | TutorHubError::DateParse(_)
                | TutorHubError::Conflict(_)
        )
    }
}

impl fmt::Display for TutorHubError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.format_simple())
    }
}

impl std::error::Error for TutorHubError {}

impl From<sea_orm::DbErr> for TutorHubError {
    fn from(err: sea_orm::DbErr) -> Self {
        TutorHubError::DatabaseOperation(err.to_string())
    }
}

impl From<std::io::Error> for TutorHubError {
    fn from(err: std::io::Error) -> Self {
        TutorHubError::Io(err.to_string())
    }
}

impl From<serde_json::Error> for TutorHubError {
    fn from(err: serde_json::Error) -> Self {
        TutorHubError::Serialization(err.to_string())
    }
}

impl From<chrono::ParseError> for TutorHubError {
    fn from(err: chrono::ParseError) -> Self {
        TutorHubError::DateParse(err.to_string())
    }
}

impl From<reqwest::Error> for TutorHubError {
    fn from(err: reqwest::Error) -> Self {
        TutorHubError::RemoteRequest(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, TutorHubError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_codes() {
        assert_eq!(TutorHubError::cache_connection("x").code(), "E001");
        assert_eq!(TutorHubError::validation("x").code(), "E007");
        assert_eq!(TutorHubError::conflict("x").code(), "E013");
        assert_eq!(TutorHubError::environment_not_configured("x").code(), "E015");
    }

    #[test]
    fn test_error_message_and_format() {
        let err = TutorHubError::date_parse("bad date 2025-13-01");
        assert_eq!(err.message(), "bad date 2025-13-01");
        assert_eq!(err.error_type(), "Date Parse Error");
        assert!(err.to_string().starts_with("Date Parse Error: "));
    }

    #[test]
    fn test_client_error_classification() {
        assert!(TutorHubError::conflict("overlap").is_client_error());
        assert!(TutorHubError::not_found("lesson").is_client_error());
        assert!(!TutorHubError::database_operation("boom").is_client_error());
        assert!(!TutorHubError::remote_request("timeout").is_client_error());
    }

    #[test]
    fn test_from_serde_error() {
        let err: TutorHubError = serde_json::from_str::<i32>("nope").unwrap_err().into();
        assert_eq!(err.code(), "E009");
    }
}
