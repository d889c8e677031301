//! 数据模型
//!
//! 按业务域拆分，每个域下分 entities / requests / responses。

pub mod audit;
pub mod auth;
pub mod calendar;
pub mod common;
pub mod lessons;
pub mod permissions;
pub mod relations;
pub mod remote_admin;
pub mod schedule;
pub mod students;
pub mod users;

pub use common::{ApiResponse, PaginatedResponse, PaginationInfo, PaginationQuery};

/// 程序启动时间
#[derive(Debug, Clone)]
pub struct AppStartTime {
    pub start_datetime: chrono::DateTime<chrono::Utc>,
}

/// API 业务错误码
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(i32)]
pub enum ErrorCode {
    Success = 0,

    // 通用
    BadRequest = 1000,
    ValidationFailed = 1001,
    Unauthorized = 1002,
    Forbidden = 1003,
    NotFound = 1004,
    RateLimitExceeded = 1029,

    // 认证
    AuthFailed = 2000,
    UserInactive = 2001,
    RefreshTokenInvalid = 2002,

    // 用户
    UserNotFound = 3000,
    UserAlreadyExists = 3001,
    UserNameInvalid = 3002,
    UserEmailInvalid = 3003,
    UserPasswordInvalid = 3004,
    UserCreationFailed = 3005,
    UserUpdateFailed = 3006,
    UserDeleteFailed = 3007,

    // 学生
    StudentNotFound = 4000,
    StudentInvalidField = 4001,
    StudentCreationFailed = 4002,
    StudentUpdateFailed = 4003,

    // 课程
    LessonNotFound = 5000,
    LessonOverlap = 5001,
    LessonInvalidTime = 5002,
    LessonInvalidField = 5003,
    LessonCreationFailed = 5004,
    LessonUpdateFailed = 5005,

    // 日历
    CalendarTokenInvalid = 6000,

    // 权限
    PermissionDenied = 7000,
    RoleInvalid = 7001,

    // 远程管理
    EnvironmentNotConfigured = 8000,
    RemoteRequestFailed = 8001,
    SyncAlreadyRunning = 8002,
    EnrollmentNotFound = 8003,
    FamilyTieNotFound = 8004,
    MaintenanceMode = 8005,

    InternalServerError = 9000,
}
