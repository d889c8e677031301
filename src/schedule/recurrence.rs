//! 每周循环课程

use chrono::{DateTime, TimeDelta, Utc};

/// 单次请求最多生成的周数
pub const MAX_REPEAT_COUNT: u32 = 52;

/// 创建模式
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LessonMode {
    #[default]
    Single,
    Recurring,
}

impl LessonMode {
    pub fn parse(value: Option<&str>) -> Self {
        match value.map(str::trim) {
            Some("recurring") => LessonMode::Recurring,
            _ => LessonMode::Single,
        }
    }
}

/// 实际生成的次数：只有循环模式才使用 repeat_count，并按上限截断
pub fn occurrence_count(mode: LessonMode, repeat_count: Option<u32>, cap: u32) -> u32 {
    match (mode, repeat_count) {
        (LessonMode::Recurring, Some(n)) if n > 1 => n.min(cap.min(MAX_REPEAT_COUNT)),
        _ => 1,
    }
}

/// `base + k 周`，k 取 0..count；count <= 1 时只有 base
///
/// 以 UTC 时刻逐周相加；莫斯科与托木斯克都没有夏令时，本地钟点保持不变。
/// 任一周超出可表示的时间范围时返回 None。
pub fn weekly_occurrences(base: DateTime<Utc>, count: u32) -> Option<Vec<DateTime<Utc>>> {
    (0..count.max(1))
        .map(|k| base.checked_add_signed(TimeDelta::weeks(i64::from(k))))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_single_occurrence() {
        let base = Utc.with_ymd_and_hms(2025, 3, 10, 7, 0, 0).unwrap();
        assert_eq!(weekly_occurrences(base, 0), Some(vec![base]));
        assert_eq!(weekly_occurrences(base, 1), Some(vec![base]));
    }

    #[test]
    fn test_weekly_steps() {
        let base = Utc.with_ymd_and_hms(2025, 3, 10, 7, 0, 0).unwrap();
        let all = weekly_occurrences(base, 4).unwrap();
        assert_eq!(all.len(), 4);
        assert_eq!(all[3], Utc.with_ymd_and_hms(2025, 3, 31, 7, 0, 0).unwrap());
    }

    #[test]
    fn test_far_future_base_does_not_overflow() {
        let last = DateTime::<Utc>::MAX_UTC - TimeDelta::days(10);
        assert_eq!(weekly_occurrences(last, 1), Some(vec![last]));
        assert_eq!(weekly_occurrences(last, 3), None);
    }

    #[test]
    fn test_repeat_count_only_in_recurring_mode() {
        assert_eq!(occurrence_count(LessonMode::Single, Some(10), 52), 1);
        assert_eq!(occurrence_count(LessonMode::Recurring, Some(10), 52), 10);
        assert_eq!(occurrence_count(LessonMode::Recurring, None, 52), 1);
        assert_eq!(occurrence_count(LessonMode::Recurring, Some(1), 52), 1);
    }

    #[test]
    fn test_repeat_count_capped() {
        assert_eq!(occurrence_count(LessonMode::Recurring, Some(500), 52), 52);
        assert_eq!(occurrence_count(LessonMode::Recurring, Some(500), 12), 12);
        assert_eq!(occurrence_count(LessonMode::Recurring, Some(500), 1000), 52);
    }

    #[test]
    fn test_mode_parse() {
        assert_eq!(LessonMode::parse(Some("recurring")), LessonMode::Recurring);
        assert_eq!(LessonMode::parse(Some("weekly")), LessonMode::Single);
        assert_eq!(LessonMode::parse(None), LessonMode::Single);
    }
}
