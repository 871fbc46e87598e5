/// Door status data model shared by the store, the monitor and the history views.
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::HistoryError;
use crate::timefmt;

/// Observed state of the door.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DoorStatus {
    Open,
    Closed,
    Unknown,
}

impl DoorStatus {
    /// Convert to the wire/database string representation
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Open => "open",
            Self::Closed => "closed",
            Self::Unknown => "unknown",
        }
    }
}

impl fmt::Display for DoorStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DoorStatus {
    type Err = HistoryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "open" => Ok(Self::Open),
            "closed" => Ok(Self::Closed),
            "unknown" => Ok(Self::Unknown),
            other => Err(HistoryError::UnknownStatus(other.to_string())),
        }
    }
}

/// One observed state change, as exchanged with the presentation layer.
///
/// `since` is when the door entered `status`; `fetched_at` is when this record
/// was read from the store. Both are ISO-8601 strings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusEvent {
    pub status: DoorStatus,
    pub since: String,
    pub fetched_at: String,
}

impl StatusEvent {
    pub fn new(status: DoorStatus, since: DateTime<Utc>, fetched_at: DateTime<Utc>) -> Self {
        Self {
            status,
            since: timefmt::to_iso8601(since),
            fetched_at: timefmt::to_iso8601(fetched_at),
        }
    }

    /// Parse `since` into an instant. `index` is only used for error reporting.
    pub fn since_instant(&self, index: usize) -> Result<DateTime<Utc>, HistoryError> {
        timefmt::parse_iso8601(&self.since).map_err(|source| HistoryError::MalformedTimestamp {
            index,
            field: "since",
            value: self.since.clone(),
            source,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_status_round_trips_through_str() {
        for status in [DoorStatus::Open, DoorStatus::Closed, DoorStatus::Unknown] {
            assert_eq!(status.as_str().parse::<DoorStatus>().unwrap(), status);
        }
        assert!(matches!(
            "ajar".parse::<DoorStatus>(),
            Err(HistoryError::UnknownStatus(s)) if s == "ajar"
        ));
    }

    #[test]
    fn test_event_wire_format() {
        let since = Utc.with_ymd_and_hms(2025, 3, 14, 9, 30, 0).unwrap();
        let event = StatusEvent::new(DoorStatus::Open, since, since);
        let json = serde_json::to_value(&event).unwrap();

        assert_eq!(json["status"], "open");
        assert_eq!(json["since"], "2025-03-14T09:30:00.000Z");
        assert_eq!(json["fetchedAt"], "2025-03-14T09:30:00.000Z");
    }

    #[test]
    fn test_since_instant_reports_malformed_value() {
        let event = StatusEvent {
            status: DoorStatus::Closed,
            since: "yesterday-ish".to_string(),
            fetched_at: "2025-03-14T09:30:00.000Z".to_string(),
        };

        let err = event.since_instant(4).unwrap_err();
        let msg = err.to_string();
        assert!(msg.contains("#4"), "{}", msg);
        assert!(msg.contains("yesterday-ish"), "{}", msg);
    }
}
