/// Door history aggregation.
///
/// Turns a sparse list of state-change events into open milliseconds per
/// local calendar day. Only intervals that start with the door opening and
/// end with it closing (or going unknown) count; each interval is split at
/// local midnight so that every day gets exactly its share.
use chrono::{DateTime, Duration, Local, NaiveDate, NaiveTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::door::{DoorStatus, StatusEvent};
use crate::error::HistoryError;

/// One day in milliseconds; the most any single day can accumulate.
pub const DAY_MS: u64 = 86_400_000;

/// Zero-padded `YYYY-MM-DD` key for a calendar day.
pub fn day_key(date: NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}

/// Open milliseconds per day key.
///
/// Days without any open interval are simply absent; read through
/// [`DailyDurations::lookup`] to get an explicit default.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DailyDurations(BTreeMap<String, u64>);

impl DailyDurations {
    pub fn new() -> Self {
        Self::default()
    }

    /// Value for `key`, or `default` when the day was never touched.
    pub fn lookup(&self, key: &str, default: u64) -> u64 {
        self.0.get(key).copied().unwrap_or(default)
    }

    /// Open milliseconds on `date`, 0 when absent.
    pub fn on(&self, date: NaiveDate) -> u64 {
        self.lookup(&day_key(date), 0)
    }

    fn add(&mut self, date: NaiveDate, ms: u64) {
        let slot = self.0.entry(day_key(date)).or_insert(0);
        // A 25-hour DST day could otherwise exceed a day's worth of milliseconds.
        *slot = (*slot + ms).min(DAY_MS);
    }

    /// Insert an explicit 0 for every day in `from..=to` that has no entry yet.
    pub fn densify(&mut self, from: NaiveDate, to: NaiveDate) {
        for date in from.iter_days().take_while(|d| *d <= to) {
            self.0.entry(day_key(date)).or_insert(0);
        }
    }

    /// Only the days in `from..=to`.
    pub fn within(&self, from: NaiveDate, to: NaiveDate) -> Self {
        if from > to {
            return Self::new();
        }
        Self(
            self.0
                .range(day_key(from)..=day_key(to))
                .map(|(day, &ms)| (day.clone(), ms))
                .collect(),
        )
    }

    /// Total open milliseconds across all days.
    pub fn total(&self) -> u64 {
        self.0.values().sum()
    }

    /// Largest single-day value, 0 for an empty map.
    pub fn max(&self) -> u64 {
        self.0.values().copied().max().unwrap_or(0)
    }

    /// Day with the most open time. Ties go to the earliest day; days with 0 never win.
    pub fn most_open_day(&self) -> Option<(&str, u64)> {
        self.0
            .iter()
            .filter(|(_, ms)| **ms > 0)
            .fold(None, |best: Option<(&str, u64)>, (day, &ms)| match best {
                Some((_, best_ms)) if best_ms >= ms => best,
                _ => Some((day.as_str(), ms)),
            })
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, u64)> {
        self.0.iter().map(|(day, &ms)| (day.as_str(), ms))
    }
}

/// What to do with a trailing Open event that has no closing event yet.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum OngoingInterval {
    /// Only closed intervals count; a door that is still open adds nothing.
    #[default]
    Exclude,
    /// Treat the door as closing at the given instant.
    CloseAt(DateTime<Utc>),
}

/// Aggregate using the process's local timezone for day boundaries.
pub fn aggregate_local(events: &[StatusEvent]) -> Result<DailyDurations, HistoryError> {
    aggregate(events, &Local)
}

/// Aggregate events into open milliseconds per day in `tz`, excluding a still-open door.
pub fn aggregate<Tz: TimeZone>(
    events: &[StatusEvent],
    tz: &Tz,
) -> Result<DailyDurations, HistoryError> {
    aggregate_with(events, tz, OngoingInterval::Exclude)
}

/// Aggregate events into open milliseconds per day in `tz`.
///
/// Fails on the first event whose `since` cannot be parsed.
pub fn aggregate_with<Tz: TimeZone>(
    events: &[StatusEvent],
    tz: &Tz,
    ongoing: OngoingInterval,
) -> Result<DailyDurations, HistoryError> {
    let mut timeline = events
        .iter()
        .enumerate()
        .map(|(index, event)| event.since_instant(index).map(|at| (at, event.status)))
        .collect::<Result<Vec<_>, _>>()?;
    // Stable: events at the same instant keep their input order.
    timeline.sort_by_key(|(at, _)| *at);

    let mut durations = DailyDurations::new();
    for pair in timeline.windows(2) {
        let (opened, prev) = pair[0];
        let (closed, curr) = pair[1];
        if prev == DoorStatus::Open && curr != DoorStatus::Open {
            split_into_days(&mut durations, tz, opened, closed);
        }
    }

    if let (OngoingInterval::CloseAt(now), Some(&(opened, DoorStatus::Open))) =
        (ongoing, timeline.last())
    {
        if now > opened {
            split_into_days(&mut durations, tz, opened, now);
        }
    }

    tracing::debug!(
        events = events.len(),
        days = durations.len(),
        total_ms = durations.total(),
        "aggregated door history"
    );

    Ok(durations)
}

/// Add `[opened, closed)` to every local day it overlaps.
fn split_into_days<Tz: TimeZone>(
    durations: &mut DailyDurations,
    tz: &Tz,
    opened: DateTime<Utc>,
    closed: DateTime<Utc>,
) {
    let first_day = opened.with_timezone(tz).date_naive();
    let last_day = closed.with_timezone(tz).date_naive();

    for day in first_day.iter_days().take_while(|d| *d <= last_day) {
        let start = start_of_day(tz, day).max(opened);
        let end = day
            .succ_opt()
            .map(|next| start_of_day(tz, next))
            .unwrap_or(closed)
            .min(closed);
        let ms = (end - start).num_milliseconds().max(0) as u64;
        if ms > 0 {
            durations.add(day, ms);
        }
    }
}

/// First instant of `date` in `tz`.
fn start_of_day<Tz: TimeZone>(tz: &Tz, date: NaiveDate) -> DateTime<Utc> {
    let midnight = date.and_time(NaiveTime::MIN);
    // Some zones skip midnight on DST changes; the day then starts at the first valid local time.
    (0..=16)
        .map(|step| midnight + Duration::minutes(step * 15))
        .find_map(|local| tz.from_local_datetime(&local).earliest())
        .map(|dt| dt.with_timezone(&Utc))
        .unwrap_or_else(|| Utc.from_utc_datetime(&midnight))
}
