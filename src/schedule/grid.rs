//! 周视图网格参数

use chrono::{Datelike, NaiveDate, TimeDelta};
use serde::Serialize;

pub const ALLOWED_SLOTS: [u32; 3] = [15, 30, 60];
pub const DEFAULT_SLOT_MINUTES: u32 = 30;
const FALLBACK_HOURS: (i64, i64) = (7, 22);

/// 纵轴：可见小时范围与时间格大小
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GridSpec {
    pub slot_minutes: u32,
    pub start_hour: i32,
    pub end_hour: i32,
    pub total_slots: u32,
    pub hour_labels: Vec<String>,
}

impl GridSpec {
    pub fn new(slot: Option<i64>, start: Option<i64>, end: Option<i64>) -> Self {
        let slot_minutes = slot
            .and_then(|s| u32::try_from(s).ok())
            .filter(|s| ALLOWED_SLOTS.contains(s))
            .unwrap_or(DEFAULT_SLOT_MINUTES);

        let mut start_hour = start.unwrap_or(0).max(0);
        let mut end_hour = end.unwrap_or(23).min(23);
        if end_hour < start_hour {
            (start_hour, end_hour) = FALLBACK_HOURS;
        }
        // 此时两端都落在 0..=23
        let (start_hour, end_hour) = (start_hour as i32, end_hour as i32);

        let total_minutes = ((end_hour - start_hour + 1) * 60) as u32;
        Self {
            slot_minutes,
            start_hour,
            end_hour,
            total_slots: total_minutes / slot_minutes,
            hour_labels: (start_hour..=end_hour).map(|h| format!("{h:02}:00")).collect(),
        }
    }
}

/// 周一起算的七天
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WeekWindow {
    pub offset: i64,
    pub days: [NaiveDate; 7],
}

impl WeekWindow {
    /// 偏移后超出日期范围时返回 None
    pub fn from_offset(today: NaiveDate, offset: i64) -> Option<Self> {
        let back = TimeDelta::days(i64::from(today.weekday().num_days_from_monday()));
        let monday = today
            .checked_sub_signed(back)?
            .checked_add_signed(TimeDelta::try_weeks(offset)?)?;

        let mut days = [monday; 7];
        for (i, day) in days.iter_mut().enumerate().skip(1) {
            *day = monday.checked_add_signed(TimeDelta::days(i as i64))?;
        }
        Some(Self { offset, days })
    }

    pub fn start(&self) -> NaiveDate {
        self.days[0]
    }

    pub fn end(&self) -> NaiveDate {
        self.days[6]
    }

    /// "dd.mm.YYYY — dd.mm.YYYY"
    pub fn label(&self) -> String {
        format!(
            "{} — {}",
            self.start().format("%d.%m.%Y"),
            self.end().format("%d.%m.%Y")
        )
    }

    /// 日期在本周的下标，不在本周返回 None
    pub fn day_index(&self, date: NaiveDate) -> Option<usize> {
        let diff = (date - self.start()).num_days();
        (0..7).contains(&diff).then_some(diff as usize)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_slot_normalization() {
        assert_eq!(GridSpec::new(Some(15), None, None).slot_minutes, 15);
        assert_eq!(GridSpec::new(Some(60), None, None).slot_minutes, 60);
        assert_eq!(GridSpec::new(Some(45), None, None).slot_minutes, 30);
        assert_eq!(GridSpec::new(Some(-15), None, None).slot_minutes, 30);
        assert_eq!(GridSpec::new(None, None, None).slot_minutes, 30);
    }

    #[test]
    fn test_default_full_day() {
        let grid = GridSpec::new(None, None, None);
        assert_eq!((grid.start_hour, grid.end_hour), (0, 23));
        assert_eq!(grid.total_slots, 48);
        assert_eq!(grid.hour_labels.len(), 24);
        assert_eq!(grid.hour_labels[9], "09:00");
    }

    #[test]
    fn test_hour_clamping() {
        let grid = GridSpec::new(Some(60), Some(-3), Some(30));
        assert_eq!((grid.start_hour, grid.end_hour), (0, 23));
        assert_eq!(grid.total_slots, 24);
    }

    #[test]
    fn test_inverted_range_resets() {
        let grid = GridSpec::new(Some(15), Some(20), Some(8));
        assert_eq!((grid.start_hour, grid.end_hour), (7, 22));
        assert_eq!(grid.total_slots, 16 * 4);
        assert_eq!(grid.hour_labels.first().map(String::as_str), Some("07:00"));
    }

    #[test]
    fn test_week_window() {
        // 2025-03-12 是周三
        let today = NaiveDate::from_ymd_opt(2025, 3, 12).unwrap();
        let week = WeekWindow::from_offset(today, 0).unwrap();
        assert_eq!(week.start(), NaiveDate::from_ymd_opt(2025, 3, 10).unwrap());
        assert_eq!(week.label(), "10.03.2025 — 16.03.2025");

        let prev = WeekWindow::from_offset(today, -1).unwrap();
        assert_eq!(prev.label(), "03.03.2025 — 09.03.2025");

        assert_eq!(week.day_index(NaiveDate::from_ymd_opt(2025, 3, 16).unwrap()), Some(6));
        assert_eq!(week.day_index(NaiveDate::from_ymd_opt(2025, 3, 17).unwrap()), None);
        assert_eq!(week.day_index(NaiveDate::from_ymd_opt(2025, 3, 9).unwrap()), None);
    }

    #[test]
    fn test_week_window_from_sunday() {
        let sunday = NaiveDate::from_ymd_opt(2025, 3, 16).unwrap();
        let week = WeekWindow::from_offset(sunday, 1).unwrap();
        assert_eq!(week.start(), NaiveDate::from_ymd_opt(2025, 3, 17).unwrap());
    }

    #[test]
    fn test_week_offset_out_of_range() {
        let today = NaiveDate::from_ymd_opt(2025, 3, 12).unwrap();
        assert!(WeekWindow::from_offset(today, 20_000_000).is_none());
        assert!(WeekWindow::from_offset(today, -20_000_000).is_none());
        assert!(WeekWindow::from_offset(today, 100_000_000_000).is_none());
        assert!(WeekWindow::from_offset(today, i64::MAX).is_none());
        assert!(WeekWindow::from_offset(today, i64::MIN).is_none());
        // 最后一周的周日已越界
        assert!(WeekWindow::from_offset(NaiveDate::MAX, 0).is_none());
        assert!(WeekWindow::from_offset(today, 52).is_some());
    }
}
