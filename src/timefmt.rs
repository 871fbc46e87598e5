use chrono::{DateTime, Local, SecondsFormat, TimeZone, Utc};

/// Format an instant as an ISO-8601 string with millisecond precision (`2025-03-14T09:30:00.000Z`).
pub fn to_iso8601(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Parse an ISO-8601 / RFC 3339 timestamp into UTC.
pub fn parse_iso8601(value: &str) -> Result<DateTime<Utc>, chrono::ParseError> {
    DateTime::parse_from_rfc3339(value.trim()).map(|dt| dt.with_timezone(&Utc))
}

/// Format a millisecond timestamp as local wall-clock time, or return a placeholder on error.
pub fn format_timestamp(ts_millis: i64) -> String {
    match Local.timestamp_millis_opt(ts_millis) {
        chrono::LocalResult::Single(datetime) => datetime.format("%Y-%m-%d %H:%M:%S").to_string(),
        _ => "invalid timestamp".to_string(),
    }
}

/// Format an ISO-8601 string for display in local time, echoing it back when unparseable.
pub fn format_iso_local(value: &str) -> String {
    parse_iso8601(value)
        .map(|dt| format_timestamp(dt.timestamp_millis()))
        .unwrap_or_else(|_| value.to_string())
}
