/// Year-long calendar grid for the open-time heatmap.
///
/// The grid is 53 week columns by 7 weekday rows (Sunday first). Week 0
/// starts on the Sunday on or before `today - 52 weeks`, so the last column
/// always holds today.
use chrono::{Datelike, Duration, NaiveDate};
use serde::Serialize;

use crate::history::{day_key, DailyDurations};

pub const WEEKS: usize = 53;
pub const DAYS_PER_WEEK: usize = 7;

/// Row labels, Sunday first; only every other weekday is labelled.
pub const WEEKDAY_LABELS: [&str; DAYS_PER_WEEK] = ["", "Mon", "", "Wed", "", "Fri", ""];

const MONTH_NAMES: [&str; 12] = [
    "January",
    "February",
    "March",
    "April",
    "May",
    "June",
    "July",
    "August",
    "September",
    "October",
    "November",
    "December",
];

/// One day of the heatmap.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CalendarCell {
    pub week_index: usize,
    /// 0 = Sunday
    pub day_of_week: usize,
    pub date: String,
    pub duration_ms: u64,
    /// `duration_ms / max(max_daily_ms, 1)`, in `0.0..=1.0`
    pub intensity: f64,
}

/// Header over the week columns where a month starts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MonthLabel {
    /// 1-based month number
    pub month: u32,
    pub name: &'static str,
    pub year: i32,
    /// Column holding the 1st of the month, clamped to the grid
    pub week_index: usize,
    /// Exclusive end column of this header
    pub end_week: usize,
    /// Year shown on the first header and on every January
    pub show_year: bool,
}

impl MonthLabel {
    pub fn short_name(&self) -> &'static str {
        let name: &'static str = self.name;
        &name[..3]
    }
}

/// Grid coordinates of a cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CellPosition {
    pub week_index: usize,
    pub day_of_week: usize,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CalendarGrid {
    pub today: NaiveDate,
    pub anchor: NaiveDate,
    pub max_daily_ms: u64,
    /// `weeks[week_index][day_of_week]`
    pub weeks: Vec<Vec<CalendarCell>>,
    pub months: Vec<MonthLabel>,
    pub today_position: CellPosition,
}

impl CalendarGrid {
    /// First day of the grid: the Sunday on or before `today - 52 weeks`.
    pub fn anchor_for(today: NaiveDate) -> NaiveDate {
        let year_ago = today - Duration::days((WEEKS as i64 - 1) * DAYS_PER_WEEK as i64);
        year_ago - Duration::days(year_ago.weekday().num_days_from_sunday() as i64)
    }

    /// First and last day covered by the grid ending in `today`'s week.
    pub fn span_for(today: NaiveDate) -> (NaiveDate, NaiveDate) {
        let anchor = Self::anchor_for(today);
        (anchor, anchor + Duration::days((WEEKS * DAYS_PER_WEEK) as i64 - 1))
    }

    pub fn build(today: NaiveDate, durations: &DailyDurations) -> Self {
        let (anchor, last_day) = Self::span_for(today);
        // Days outside the grid never set the scale
        let max_daily_ms = durations.within(anchor, last_day).max();
        let scale = max_daily_ms.max(1) as f64;

        let weeks = (0..WEEKS)
            .map(|week_index| {
                (0..DAYS_PER_WEEK)
                    .map(|day_of_week| {
                        let date = anchor
                            + Duration::days((week_index * DAYS_PER_WEEK + day_of_week) as i64);
                        let duration_ms = durations.on(date);
                        CalendarCell {
                            week_index,
                            day_of_week,
                            date: day_key(date),
                            duration_ms,
                            intensity: duration_ms as f64 / scale,
                        }
                    })
                    .collect()
            })
            .collect();

        let months = month_labels(anchor, last_day);

        // `anchor_for` guarantees today lands in the final column.
        let today_position = position_in(anchor, today).unwrap_or(CellPosition {
            week_index: WEEKS - 1,
            day_of_week: today.weekday().num_days_from_sunday() as usize,
        });

        tracing::debug!(%anchor, %today, max_daily_ms, "built calendar grid");

        Self {
            today,
            anchor,
            max_daily_ms,
            weeks,
            months,
            today_position,
        }
    }

    /// Last date covered by the grid (may be a few days after today).
    pub fn last_day(&self) -> NaiveDate {
        Self::span_for(self.today).1
    }

    pub fn cell(&self, week_index: usize, day_of_week: usize) -> Option<&CalendarCell> {
        self.weeks.get(week_index)?.get(day_of_week)
    }

    /// Coordinates of `date`, if it falls inside the grid.
    pub fn position_of(&self, date: NaiveDate) -> Option<CellPosition> {
        position_in(self.anchor, date)
    }

    pub fn today_cell(&self) -> Option<&CalendarCell> {
        self.cell(
            self.today_position.week_index,
            self.today_position.day_of_week,
        )
    }

    /// All cells, week by week.
    pub fn cells(&self) -> impl Iterator<Item = &CalendarCell> {
        self.weeks.iter().flatten()
    }

    /// One row of the heatmap: the same weekday across all weeks.
    pub fn row(&self, day_of_week: usize) -> impl Iterator<Item = &CalendarCell> {
        self.weeks.iter().filter_map(move |week| week.get(day_of_week))
    }
}

fn position_in(anchor: NaiveDate, date: NaiveDate) -> Option<CellPosition> {
    let offset = (date - anchor).num_days();
    if offset < 0 {
        return None;
    }
    let offset = offset as usize;
    let week_index = offset / DAYS_PER_WEEK;
    (week_index < WEEKS).then_some(CellPosition {
        week_index,
        day_of_week: offset % DAYS_PER_WEEK,
    })
}

/// Headers for every month whose 1st is on or before `last_day`, starting with the anchor's month.
fn month_labels(anchor: NaiveDate, last_day: NaiveDate) -> Vec<MonthLabel> {
    let mut labels: Vec<MonthLabel> = Vec::new();
    let mut cursor = NaiveDate::from_ymd_opt(anchor.year(), anchor.month(), 1);

    while let Some(first) = cursor.filter(|first| *first <= last_day) {
        let offset = (first - anchor).num_days();
        let week_index = if offset < 0 {
            0
        } else {
            (offset as usize / DAYS_PER_WEEK).min(WEEKS - 1)
        };

        labels.push(MonthLabel {
            month: first.month(),
            name: MONTH_NAMES[first.month0() as usize],
            year: first.year(),
            week_index,
            end_week: WEEKS,
            show_year: labels.is_empty() || first.month() == 1,
        });

        cursor = first.checked_add_months(chrono::Months::new(1));
    }

    for i in 0..labels.len().saturating_sub(1) {
        labels[i].end_week = labels[i + 1].week_index;
    }

    labels
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::door::{DoorStatus, StatusEvent};
    use crate::history::aggregate;
    use chrono::{TimeZone, Utc, Weekday};

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_anchor_is_sunday_a_year_back() {
        // 2025-03-14 is a Friday.
        let today = date(2025, 3, 14);
        let anchor = CalendarGrid::anchor_for(today);
        assert_eq!(anchor.weekday(), Weekday::Sun);
        assert_eq!(anchor, date(2024, 3, 10));

        // Already a Sunday: stays put.
        let sunday = date(2025, 3, 16);
        assert_eq!(CalendarGrid::anchor_for(sunday), date(2024, 3, 17));
    }

    #[test]
    fn test_grid_has_371_cells_and_contains_today() {
        let mut today = date(2024, 1, 1);
        for _ in 0..14 {
            let grid = CalendarGrid::build(today, &DailyDurations::new());
            assert_eq!(grid.cells().count(), WEEKS * DAYS_PER_WEEK);
            assert_eq!(grid.weeks.len(), 53);
            assert!(grid.weeks.iter().all(|w| w.len() == 7));

            let cell = grid.today_cell().unwrap();
            assert_eq!(cell.date, day_key(today));
            assert_eq!(grid.today_position.week_index, WEEKS - 1);
            today = today.succ_opt().unwrap();
        }
    }

    #[test]
    fn test_cells_are_consecutive_days() {
        let grid = CalendarGrid::build(date(2025, 3, 14), &DailyDurations::new());
        let first = grid.cell(0, 0).unwrap();
        assert_eq!(first.date, "2024-03-10");
        assert_eq!(grid.cell(1, 3).unwrap().date, "2024-03-20");
        assert_eq!(grid.cell(52, 6).unwrap().date, "2025-03-15");
        assert_eq!(grid.last_day(), date(2025, 3, 15));
        assert!(grid.cell(53, 0).is_none());
        assert_eq!(grid.position_of(date(2024, 3, 9)), None);
    }

    #[test]
    fn test_empty_history_has_zero_intensity() {
        let grid = CalendarGrid::build(date(2025, 3, 14), &DailyDurations::new());
        assert_eq!(grid.max_daily_ms, 0);
        assert!(grid.cells().all(|c| c.duration_ms == 0 && c.intensity == 0.0));
    }

    #[test]
    fn test_intensity_is_relative_to_busiest_day() {
        let at = |d, h| Utc.with_ymd_and_hms(2025, 3, d, h, 0, 0).unwrap();
        let events = vec![
            StatusEvent::new(DoorStatus::Open, at(10, 8), at(10, 8)),
            StatusEvent::new(DoorStatus::Closed, at(10, 16), at(10, 16)),
            StatusEvent::new(DoorStatus::Open, at(12, 8), at(12, 8)),
            StatusEvent::new(DoorStatus::Closed, at(12, 12), at(12, 12)),
        ];
        let durations = aggregate(&events, &Utc).unwrap();
        let grid = CalendarGrid::build(date(2025, 3, 14), &durations);

        let busiest = grid.position_of(date(2025, 3, 10)).unwrap();
        let half = grid.position_of(date(2025, 3, 12)).unwrap();
        let busiest = grid.cell(busiest.week_index, busiest.day_of_week).unwrap();
        let half = grid.cell(half.week_index, half.day_of_week).unwrap();

        assert_eq!(busiest.intensity, 1.0);
        assert_eq!(half.intensity, 0.5);
        assert_eq!(half.duration_ms, 4 * 3_600_000);
    }

    #[test]
    fn test_days_outside_grid_do_not_set_scale() {
        let at = |y, m, d, h| Utc.with_ymd_and_hms(y, m, d, h, 0, 0).unwrap();
        let events = vec![
            StatusEvent::new(DoorStatus::Open, at(2023, 6, 1, 0), at(2023, 6, 1, 0)),
            StatusEvent::new(DoorStatus::Closed, at(2023, 6, 1, 20), at(2023, 6, 1, 20)),
            StatusEvent::new(DoorStatus::Open, at(2025, 3, 12, 8), at(2025, 3, 12, 8)),
            StatusEvent::new(DoorStatus::Closed, at(2025, 3, 12, 10), at(2025, 3, 12, 10)),
        ];
        let durations = aggregate(&events, &Utc).unwrap();
        let grid = CalendarGrid::build(date(2025, 3, 14), &durations);

        assert_eq!(grid.max_daily_ms, 2 * 3_600_000);
        let pos = grid.position_of(date(2025, 3, 12)).unwrap();
        assert_eq!(grid.cell(pos.week_index, pos.day_of_week).unwrap().intensity, 1.0);
    }

    #[test]
    fn test_month_labels() {
        let grid = CalendarGrid::build(date(2025, 3, 14), &DailyDurations::new());
        let months = &grid.months;

        // Anchor 2024-03-10 through 2025-03-15: March 2024 .. March 2025.
        assert_eq!(months.len(), 13);
        assert_eq!(months[0].name, "March");
        assert_eq!(months[0].year, 2024);
        assert_eq!(months[0].week_index, 0);
        assert!(months[0].show_year);

        let april = &months[1];
        assert_eq!(april.short_name(), "Apr");
        assert_eq!(april.week_index, 3);
        assert!(!april.show_year);
        assert_eq!(months[0].end_week, 3);

        let january = months.iter().find(|m| m.month == 1).unwrap();
        assert_eq!(january.year, 2025);
        assert!(january.show_year);

        assert_eq!(months.last().unwrap().end_week, WEEKS);
        assert!(months.windows(2).all(|w| w[0].week_index <= w[1].week_index));
        assert!(months.iter().all(|m| m.week_index < WEEKS));
    }

    #[test]
    fn test_month_labels_monotonic_all_year() {
        let mut today = date(2025, 1, 1);
        while today.year() == 2025 {
            let grid = CalendarGrid::build(today, &DailyDurations::new());
            assert!(grid
                .months
                .windows(2)
                .all(|w| w[0].week_index <= w[1].week_index && w[0].end_week == w[1].week_index));
            today = today + Duration::days(5);
        }
    }
}
