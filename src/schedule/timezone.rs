//! 展示时区与本地时间换算
//!
//! 课程开始时间统一以 UTC 存储，只在输入解析和展示时换算到莫斯科或托木斯克时间。

use chrono::{DateTime, LocalResult, NaiveDate, NaiveDateTime, NaiveTime, TimeZone, Utc};
use chrono_tz::Tz;
use serde::Serialize;

use crate::errors::{Result, TutorHubError};

pub const DATE_FORMAT: &str = "%Y-%m-%d";
pub const TIME_FORMAT: &str = "%H:%M";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DisplayZone {
    #[default]
    Moscow,
    Tomsk,
}

impl DisplayZone {
    /// `"tomsk"` 之外的任何值（包括缺省）都按莫斯科处理
    pub fn parse(value: Option<&str>) -> Self {
        match value.map(|v| v.trim().to_ascii_lowercase()) {
            Some(v) if v == "tomsk" => DisplayZone::Tomsk,
            _ => DisplayZone::Moscow,
        }
    }

    pub fn tz(&self) -> Tz {
        match self {
            DisplayZone::Moscow => chrono_tz::Europe::Moscow,
            DisplayZone::Tomsk => chrono_tz::Asia::Tomsk,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            DisplayZone::Moscow => "moscow",
            DisplayZone::Tomsk => "tomsk",
        }
    }
}

pub fn parse_date(date: &str) -> Result<NaiveDate> {
    Ok(NaiveDate::parse_from_str(date.trim(), DATE_FORMAT)?)
}

pub fn parse_time(time: &str) -> Result<NaiveTime> {
    Ok(NaiveTime::parse_from_str(time.trim(), TIME_FORMAT)?)
}

/// 把某时区下的本地日期与时间换算为 UTC 时刻
pub fn parse_local_datetime(date: &str, time: &str, zone: DisplayZone) -> Result<DateTime<Utc>> {
    let naive = NaiveDateTime::new(parse_date(date)?, parse_time(time)?);
    local_to_utc(naive, zone)
}

pub fn local_to_utc(naive: NaiveDateTime, zone: DisplayZone) -> Result<DateTime<Utc>> {
    match zone.tz().from_local_datetime(&naive) {
        LocalResult::Single(dt) => Ok(dt.with_timezone(&Utc)),
        LocalResult::Ambiguous(_, _) => Err(TutorHubError::date_parse(format!(
            "Ambiguous local time {naive} in {}",
            zone.as_str()
        ))),
        LocalResult::None => Err(TutorHubError::date_parse(format!(
            "Local time {naive} does not exist in {}",
            zone.as_str()
        ))),
    }
}

pub fn to_local(instant: DateTime<Utc>, zone: DisplayZone) -> DateTime<Tz> {
    instant.with_timezone(&zone.tz())
}

/// 一个本地日历日对应的 UTC 半开区间
pub fn local_day_bounds(date: NaiveDate, zone: DisplayZone) -> Result<(DateTime<Utc>, DateTime<Utc>)> {
    let start = local_to_utc(date.and_time(NaiveTime::MIN), zone)?;
    let next = date
        .succ_opt()
        .ok_or_else(|| TutorHubError::date_parse(format!("Date out of range: {date}")))?;
    let end = local_to_utc(next.and_time(NaiveTime::MIN), zone)?;
    Ok((start, end))
}

pub fn today(zone: DisplayZone) -> NaiveDate {
    to_local(Utc::now(), zone).date_naive()
}

/// (日期, 时间) 两段本地文本
pub fn format_local(instant: DateTime<Utc>, zone: DisplayZone) -> (String, String) {
    let local = to_local(instant, zone);
    (
        local.format(DATE_FORMAT).to_string(),
        local.format(TIME_FORMAT).to_string(),
    )
}

/// 本地零点起算的分钟数
pub fn minutes_since_midnight(local: &DateTime<Tz>) -> i64 {
    let midnight = local.date_naive().and_time(NaiveTime::MIN);
    (local.naive_local() - midnight).num_minutes()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, Timelike};

    #[test]
    fn test_zone_parse_defaults_to_moscow() {
        assert_eq!(DisplayZone::parse(Some("tomsk")), DisplayZone::Tomsk);
        assert_eq!(DisplayZone::parse(Some(" Tomsk ")), DisplayZone::Tomsk);
        assert_eq!(DisplayZone::parse(Some("novosibirsk")), DisplayZone::Moscow);
        assert_eq!(DisplayZone::parse(None), DisplayZone::Moscow);
    }

    #[test]
    fn test_tomsk_input_shown_in_moscow() {
        // 托木斯克 UTC+7，莫斯科 UTC+3
        let utc = parse_local_datetime("2025-03-10", "10:00", DisplayZone::Tomsk).unwrap();
        assert_eq!(utc.hour(), 3);
        let (date, time) = format_local(utc, DisplayZone::Moscow);
        assert_eq!(date, "2025-03-10");
        assert_eq!(time, "06:00");
    }

    #[test]
    fn test_local_date_can_differ_between_zones() {
        let utc = parse_local_datetime("2025-03-10", "23:30", DisplayZone::Moscow).unwrap();
        let (date, time) = format_local(utc, DisplayZone::Tomsk);
        assert_eq!(date, "2025-03-11");
        assert_eq!(time, "03:30");
    }

    #[test]
    fn test_malformed_input() {
        assert!(parse_local_datetime("2025-02-30", "10:00", DisplayZone::Moscow).is_err());
        assert!(parse_local_datetime("2025-03-10", "25:00", DisplayZone::Moscow).is_err());
        assert!(parse_local_datetime("10.03.2025", "10:00", DisplayZone::Moscow).is_err());
    }

    #[test]
    fn test_day_bounds() {
        let date = NaiveDate::from_ymd_opt(2025, 3, 10).unwrap();
        let (start, end) = local_day_bounds(date, DisplayZone::Moscow).unwrap();
        assert_eq!(start.hour(), 21);
        assert_eq!(end - start, Duration::hours(24));
    }

    #[test]
    fn test_minutes_since_midnight() {
        let utc = parse_local_datetime("2025-03-10", "14:45", DisplayZone::Tomsk).unwrap();
        let local = to_local(utc, DisplayZone::Tomsk);
        assert_eq!(minutes_since_midnight(&local), 14 * 60 + 45);
    }
}
