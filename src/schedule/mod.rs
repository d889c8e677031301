//! 课表核心算法
//!
//! 不依赖数据库与 HTTP：
//! - `timezone`: 莫斯科/托木斯克本地时间换算
//! - `overlap`: 区间冲突检测
//! - `grid`: 周视图网格参数
//! - `layout`: 单日重叠课程分列
//! - `recurrence`: 每周循环

pub mod grid;
pub mod layout;
pub mod overlap;
pub mod recurrence;
pub mod timezone;

pub use grid::{GridSpec, WeekWindow};
pub use layout::{LayoutInput, PlacedEvent, layout_week};
pub use overlap::{Interval, Scheduled, find_conflict};
pub use recurrence::{LessonMode, occurrence_count, weekly_occurrences};
pub use timezone::DisplayZone;
