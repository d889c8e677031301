//! 周课表视图

use serde::{Deserialize, Serialize};

use crate::models::common::pagination::deserialize_string_to_i64;
use crate::schedule::DisplayZone;

fn deserialize_opt_i64<'de, D>(deserializer: D) -> Result<Option<i64>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    deserialize_string_to_i64(deserializer).map(Some)
}

/// 周视图查询参数
#[derive(Debug, Clone, Default, Deserialize)]
pub struct WeekScheduleParams {
    #[serde(default, deserialize_with = "deserialize_opt_i64")]
    pub week: Option<i64>,
    pub status: Option<String>,
    pub category: Option<String>,
    pub timezone: Option<String>,
    #[serde(default, deserialize_with = "deserialize_opt_i64")]
    pub student_id: Option<i64>,
    #[serde(default, deserialize_with = "deserialize_opt_i64")]
    pub slot: Option<i64>,
    #[serde(default, deserialize_with = "deserialize_opt_i64")]
    pub start: Option<i64>,
    #[serde(default, deserialize_with = "deserialize_opt_i64")]
    pub end: Option<i64>,
}

/// 课表上的一节课
#[derive(Debug, Clone, Serialize)]
pub struct ScheduleEvent {
    pub lesson_id: i64,
    pub student_id: i64,
    pub student_name: String,
    pub grade: String,
    pub status: String,
    pub status_label: String,
    pub lesson_type: String,
    pub topic: Option<String>,
    pub start_time: String,
    pub start_total: i64,
    pub duration_minutes: i64,
    pub column_index: usize,
    pub columns_total: usize,
    pub left_percent: f64,
    pub width_percent: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct ScheduleDay {
    pub date: String,
    pub day_index: usize,
    pub events: Vec<ScheduleEvent>,
}

#[derive(Debug, Serialize)]
pub struct WeekScheduleResponse {
    pub week_offset: i64,
    pub week_label: String,
    pub timezone: DisplayZone,
    pub slot_minutes: u32,
    pub start_hour: i32,
    pub end_hour: i32,
    pub total_slots: u32,
    pub hour_labels: Vec<String>,
    pub days: Vec<ScheduleDay>,
}
