//! 单日内重叠课程的分列排布
//!
//! 每天独立处理：按开始时间贪心分配最小可用列号，
//! 当天所有事件共享同一个列数（同时活跃的最大数量）。

use chrono::{DateTime, TimeDelta, Utc};

use super::grid::WeekWindow;
use super::overlap::DEFAULT_DURATION_MINUTES;
use super::timezone::{self, DisplayZone};

pub const MINUTES_PER_DAY: i64 = 1440;
const MIN_WIDTH_PERCENT: f64 = 8.0;
const COLUMN_GAP_PERCENT: f64 = 1.5;

/// 待排布的课程
#[derive(Debug, Clone)]
pub struct LayoutInput<T> {
    pub item: T,
    pub starts_at: DateTime<Utc>,
    pub duration_minutes: Option<i32>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PlacedEvent<T> {
    pub item: T,
    pub day_index: usize,
    pub start_time: String,
    pub start_total: i64,
    pub end_total: i64,
    /// 展示时长，不小于一个时间格
    pub duration_minutes: i64,
    pub column_index: usize,
    pub columns_total: usize,
    pub left_percent: f64,
    pub width_percent: f64,
}

/// 把一周的课程换算到展示时区并逐日分列
pub fn layout_week<T>(
    inputs: Vec<LayoutInput<T>>,
    zone: DisplayZone,
    week: &WeekWindow,
    slot_minutes: u32,
) -> [Vec<PlacedEvent<T>>; 7] {
    let mut days: [Vec<PlacedEvent<T>>; 7] = Default::default();

    for input in inputs {
        let local = timezone::to_local(input.starts_at, zone);
        let Some(day_index) = week.day_index(local.date_naive()) else {
            continue;
        };

        let stored = match input.duration_minutes {
            Some(m) if m > 0 => i64::from(m),
            _ => DEFAULT_DURATION_MINUTES,
        };
        let start_total = timezone::minutes_since_midnight(&local);
        // 跨过零点的课程在当天截止到 24:00
        let end_total = match local.checked_add_signed(TimeDelta::minutes(stored)) {
            Some(local_end) if local_end.date_naive() == local.date_naive() => {
                timezone::minutes_since_midnight(&local_end)
            }
            _ => MINUTES_PER_DAY,
        };

        days[day_index].push(PlacedEvent {
            item: input.item,
            day_index,
            start_time: local.format(timezone::TIME_FORMAT).to_string(),
            start_total,
            end_total,
            duration_minutes: stored.max(i64::from(slot_minutes)),
            column_index: 0,
            columns_total: 1,
            left_percent: 0.0,
            width_percent: 0.0,
        });
    }

    for events in days.iter_mut() {
        assign_columns(events);
    }
    days
}

/// 贪心分列，结果写回每个事件
pub fn assign_columns<T>(events: &mut [PlacedEvent<T>]) {
    events.sort_by_key(|e| (e.start_total, e.end_total));

    let mut active: Vec<(i64, usize)> = Vec::new(); // (end_total, column)
    let mut max_columns = 1usize;

    for event in events.iter_mut() {
        active.retain(|(end, _)| *end > event.start_total);
        let mut column = 0;
        while active.iter().any(|(_, c)| *c == column) {
            column += 1;
        }
        event.column_index = column;
        active.push((event.end_total, column));
        max_columns = max_columns.max(active.len());
    }

    let column_width = 100.0 / max_columns as f64;
    for event in events.iter_mut() {
        event.columns_total = max_columns;
        event.left_percent = column_width * event.column_index as f64;
        event.width_percent = (column_width - COLUMN_GAP_PERCENT).max(MIN_WIDTH_PERCENT);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn week() -> WeekWindow {
        WeekWindow::from_offset(NaiveDate::from_ymd_opt(2025, 3, 10).unwrap(), 0).unwrap()
    }

    fn lesson(id: i32, date: &str, time: &str, minutes: Option<i32>) -> LayoutInput<i32> {
        LayoutInput {
            item: id,
            starts_at: timezone::parse_local_datetime(date, time, DisplayZone::Moscow).unwrap(),
            duration_minutes: minutes,
        }
    }

    fn place(inputs: Vec<LayoutInput<i32>>) -> [Vec<PlacedEvent<i32>>; 7] {
        layout_week(inputs, DisplayZone::Moscow, &week(), 30)
    }

    #[test]
    fn test_non_overlapping_use_one_column() {
        let days = place(vec![
            lesson(1, "2025-03-10", "10:00", Some(60)),
            lesson(2, "2025-03-10", "11:00", Some(60)),
        ]);
        assert_eq!(days[0].len(), 2);
        for e in &days[0] {
            assert_eq!(e.column_index, 0);
            assert_eq!(e.columns_total, 1);
            assert_eq!(e.left_percent, 0.0);
            assert_eq!(e.width_percent, 98.5);
        }
    }

    #[test]
    fn test_triple_overlap() {
        let days = place(vec![
            lesson(1, "2025-03-11", "10:00", Some(120)),
            lesson(2, "2025-03-11", "10:30", Some(60)),
            lesson(3, "2025-03-11", "11:00", Some(60)),
        ]);
        let day = &days[1];
        let cols: Vec<usize> = day.iter().map(|e| e.column_index).collect();
        assert_eq!(cols, vec![0, 1, 2]);
        assert!(day.iter().all(|e| e.columns_total == 3));
        let third = 100.0 / 3.0;
        assert!((day[2].left_percent - 2.0 * third).abs() < 1e-9);
        assert!((day[0].width_percent - (third - 1.5)).abs() < 1e-9);
    }

    #[test]
    fn test_freed_column_is_reused() {
        let days = place(vec![
            lesson(1, "2025-03-12", "10:00", Some(60)),
            lesson(2, "2025-03-12", "10:30", Some(90)),
            lesson(3, "2025-03-12", "11:00", Some(30)),
        ]);
        let day = &days[2];
        assert_eq!(day[0].item, 1);
        assert_eq!(day[2].item, 3);
        // 第 1 节 11:00 结束，第 3 节接回第 0 列
        assert_eq!(day[2].column_index, 0);
        assert!(day.iter().all(|e| e.columns_total == 2));
    }

    #[test]
    fn test_midnight_clamp() {
        let days = place(vec![lesson(1, "2025-03-13", "23:30", Some(90))]);
        let e = &days[3][0];
        assert_eq!(e.start_total, 23 * 60 + 30);
        assert_eq!(e.end_total, MINUTES_PER_DAY);
        assert_eq!(e.duration_minutes, 90);
    }

    #[test]
    fn test_short_lesson_stretched_to_slot() {
        let days = layout_week(
            vec![lesson(1, "2025-03-10", "09:00", Some(15))],
            DisplayZone::Moscow,
            &week(),
            60,
        );
        assert_eq!(days[0][0].duration_minutes, 60);
        assert_eq!(days[0][0].end_total, 9 * 60 + 15);
    }

    #[test]
    fn test_min_width_with_many_columns() {
        let inputs = (0..20)
            .map(|i| lesson(i, "2025-03-14", "12:00", Some(60)))
            .collect();
        let days = place(inputs);
        assert!(days[4].iter().all(|e| e.width_percent == 8.0));
        assert_eq!(days[4][19].columns_total, 20);
    }

    #[test]
    fn test_outside_week_dropped_and_zone_shift() {
        let inputs = vec![
            lesson(1, "2025-03-09", "12:00", None),
            lesson(2, "2025-03-16", "22:00", None),
        ];
        let moscow = layout_week(inputs.clone(), DisplayZone::Moscow, &week(), 30);
        assert_eq!(moscow.iter().map(Vec::len).sum::<usize>(), 1);
        assert_eq!(moscow[6][0].item, 2);

        // 托木斯克时间已是周一 02:00，落在下一周
        let tomsk = layout_week(inputs, DisplayZone::Tomsk, &week(), 30);
        assert_eq!(tomsk.iter().map(Vec::len).sum::<usize>(), 0);
    }
}
