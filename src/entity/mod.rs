//! SeaORM 实体定义
//!
//! 与 models 中的业务实体分离：存储层用这些实体读写数据库，再转换为业务实体。

pub mod prelude;

pub mod audit_logs;
pub mod enrollments;
pub mod family_ties;
pub mod lessons;
pub mod maintenance_mode;
pub mod role_permissions;
pub mod students;
pub mod users;

use chrono::{DateTime, Utc};

/// Unix 秒转 UTC 时间，非法值回落到纪元
pub(crate) fn from_ts(ts: i64) -> DateTime<Utc> {
    DateTime::<Utc>::from_timestamp(ts, 0).unwrap_or_default()
}
