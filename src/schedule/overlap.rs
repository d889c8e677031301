//! 课程时间冲突检测
//!
//! 区间一律按 `[start, start + duration)` 处理，首尾相接不算冲突。

use chrono::{DateTime, TimeDelta, Utc};

/// 历史数据里缺失或为 0 的时长按 60 分钟计
pub const DEFAULT_DURATION_MINUTES: i64 = 60;

/// 查询候选课程时向前回看的时长，覆盖前一天开始、跨过零点的课程
pub const LOOKBACK_HOURS: i64 = 24;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Interval {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl Interval {
    /// 结束时刻超出可表示范围时截到最大值
    pub fn from_start(start: DateTime<Utc>, duration_minutes: i64) -> Self {
        let end = TimeDelta::try_minutes(duration_minutes.max(0))
            .and_then(|d| start.checked_add_signed(d))
            .unwrap_or(DateTime::<Utc>::MAX_UTC);
        Self { start, end }
    }

    /// 已存储课程的区间
    pub fn stored(start: DateTime<Utc>, duration_minutes: Option<i32>) -> Self {
        let minutes = match duration_minutes {
            Some(m) if m > 0 => i64::from(m),
            _ => DEFAULT_DURATION_MINUTES,
        };
        Self::from_start(start, minutes)
    }

    pub fn is_empty(&self) -> bool {
        self.end <= self.start
    }

    pub fn overlaps(&self, other: &Interval) -> bool {
        self.start < other.end && other.start < self.end
    }

    /// 候选课程的查询窗口 `[start - 24h, end)`，下界不早于最小时刻
    pub fn lookback_window(&self) -> (DateTime<Utc>, DateTime<Utc>) {
        let from = self
            .start
            .checked_sub_signed(TimeDelta::hours(LOOKBACK_HOURS))
            .unwrap_or(DateTime::<Utc>::MIN_UTC);
        (from, self.end)
    }
}

/// 可参与冲突检测的对象
pub trait Scheduled {
    fn schedule_id(&self) -> i64;
    fn schedule_interval(&self) -> Interval;
}

/// 返回第一个与候选区间相交的已有课程
///
/// 时长为 0 的候选永远不冲突；`exclude_id` 用于改期时排除自身。
pub fn find_conflict<'a, T: Scheduled>(
    candidate: &Interval,
    existing: &'a [T],
    exclude_id: Option<i64>,
) -> Option<&'a T> {
    if candidate.is_empty() {
        return None;
    }
    existing
        .iter()
        .filter(|item| Some(item.schedule_id()) != exclude_id)
        .find(|item| item.schedule_interval().overlaps(candidate))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    struct Slot(i64, DateTime<Utc>, Option<i32>);

    impl Scheduled for Slot {
        fn schedule_id(&self) -> i64 {
            self.0
        }
        fn schedule_interval(&self) -> Interval {
            Interval::stored(self.1, self.2)
        }
    }

    fn at(h: u32, m: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 3, 10, h, m, 0).unwrap()
    }

    #[test]
    fn test_touching_intervals_do_not_overlap() {
        let a = Interval::from_start(at(10, 0), 60);
        let b = Interval::from_start(at(11, 0), 60);
        assert!(!a.overlaps(&b));
        assert!(!b.overlaps(&a));
    }

    #[test]
    fn test_partial_and_contained_overlap() {
        let a = Interval::from_start(at(10, 0), 90);
        assert!(a.overlaps(&Interval::from_start(at(11, 0), 60)));
        assert!(a.overlaps(&Interval::from_start(at(10, 15), 30)));
        assert!(Interval::from_start(at(9, 0), 240).overlaps(&a));
    }

    #[test]
    fn test_missing_duration_counts_as_hour() {
        let existing = [Slot(1, at(10, 0), None), Slot(2, at(14, 0), Some(0))];
        let candidate = Interval::from_start(at(10, 59), 30);
        assert_eq!(find_conflict(&candidate, &existing, None).map(|s| s.0), Some(1));
        let candidate = Interval::from_start(at(11, 0), 30);
        assert!(find_conflict(&candidate, &existing, None).is_none());
        let candidate = Interval::from_start(at(14, 30), 15);
        assert_eq!(find_conflict(&candidate, &existing, None).map(|s| s.0), Some(2));
    }

    #[test]
    fn test_exclude_self_on_reschedule() {
        let existing = [Slot(7, at(10, 0), Some(60))];
        let candidate = Interval::from_start(at(10, 30), 60);
        assert!(find_conflict(&candidate, &existing, Some(7)).is_none());
        assert!(find_conflict(&candidate, &existing, Some(8)).is_some());
    }

    #[test]
    fn test_zero_duration_candidate_never_conflicts() {
        let existing = [Slot(1, at(10, 0), Some(60))];
        let candidate = Interval::from_start(at(10, 30), 0);
        assert!(find_conflict(&candidate, &existing, None).is_none());
    }

    #[test]
    fn test_range_edges_saturate() {
        let near_max = DateTime::<Utc>::MAX_UTC - TimeDelta::minutes(10);
        let slot = Interval::from_start(near_max, 60);
        assert_eq!(slot.end, DateTime::<Utc>::MAX_UTC);
        assert!(!slot.is_empty());

        let near_min = DateTime::<Utc>::MIN_UTC + TimeDelta::hours(1);
        let (from, to) = Interval::from_start(near_min, 30).lookback_window();
        assert_eq!(from, DateTime::<Utc>::MIN_UTC);
        assert_eq!(to, near_min + TimeDelta::minutes(30));
    }

    #[test]
    fn test_cross_midnight_lesson_caught_by_lookback() {
        // 前一天 23:30 开始的 90 分钟课程
        let late = Slot(3, Utc.with_ymd_and_hms(2025, 3, 9, 23, 30, 0).unwrap(), Some(90));
        let candidate = Interval::from_start(at(0, 30), 60);
        let (from, to) = candidate.lookback_window();
        assert!(late.1 >= from && late.1 < to);
        assert_eq!(find_conflict(&candidate, &[late], None).map(|s| s.0), Some(3));
    }
}
