/// History report handed to the presentation layer.
///
/// Everything is recomputed from the raw events on each build: aggregation,
/// calendar grid and summary.
use anyhow::{Context, Result};
use chrono::{DateTime, TimeZone, Utc};
use serde::Serialize;
use std::path::Path;

#[cfg(test)]
use anyhow::{anyhow, bail};
#[cfg(test)]
use jsonschema::{Draft, JSONSchema};

use crate::calendar::CalendarGrid;
use crate::door::StatusEvent;
use crate::history::{aggregate, DailyDurations};
use crate::summary::{FunUnit, HistorySummary};

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryReport {
    pub schema_version: i32,
    pub generated_at: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub current: Option<StatusEvent>,
    /// Every day of the calendar grid, 0 where the door never opened
    pub daily_open_ms: DailyDurations,
    pub calendar: CalendarGrid,
    pub summary: HistorySummary,
}

impl HistoryReport {
    /// Build a report as of `now`, bucketing days in `tz`.
    ///
    /// `seed` picks the fun unit used in the summary sentence.
    pub fn build<Tz: TimeZone>(
        events: &[StatusEvent],
        current: Option<StatusEvent>,
        now: DateTime<Utc>,
        tz: &Tz,
        seed: u64,
    ) -> Result<Self> {
        let today = now.with_timezone(tz).date_naive();
        let (first_day, last_day) = CalendarGrid::span_for(today);

        // Only days the grid shows count towards the year's figures
        let durations = aggregate(events, tz)
            .context("Door history failed a data-integrity check")?
            .within(first_day, last_day);

        let calendar = CalendarGrid::build(today, &durations);
        let summary = HistorySummary::from_durations(&durations, FunUnit::choose(seed));

        let mut daily_open_ms = durations;
        daily_open_ms.densify(calendar.anchor, calendar.last_day());

        tracing::info!(
            events = events.len(),
            total_open_ms = summary.total_open_ms,
            "Built door history report"
        );

        Ok(Self {
            schema_version: 1,
            generated_at: crate::timefmt::to_iso8601(now),
            current,
            daily_open_ms,
            calendar,
            summary,
        })
    }

    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string_pretty(self).context("Failed to serialize history report")
    }

    #[cfg(test)]
    /// Validate report JSON against the JSON schema
    pub fn validate_with_schema(report_json: &serde_json::Value, schema: &JSONSchema) -> Result<()> {
        match schema.validate(report_json) {
            Ok(_) => Ok(()),
            Err(errors) => {
                let error_messages: Vec<String> = errors
                    .map(|e| format!("  - {}: {}", e.instance_path, e))
                    .collect();
                bail!("Report validation failed:\n{}", error_messages.join("\n"))
            }
        }
    }

    #[cfg(test)]
    /// Load and compile the JSON schema
    pub fn load_schema(schema_path: &Path) -> Result<JSONSchema> {
        let schema_content = std::fs::read_to_string(schema_path)
            .with_context(|| format!("Failed to read schema file: {}", schema_path.display()))?;

        let schema_json: serde_json::Value =
            serde_json::from_str(&schema_content).with_context(|| {
                format!(
                    "Failed to parse schema JSON from: {}",
                    schema_path.display()
                )
            })?;

        JSONSchema::options()
            .with_draft(Draft::Draft7)
            .compile(&schema_json)
            .map_err(|e| anyhow!("Failed to compile JSON schema: {}", e))
    }
}

/// Load a JSON array of status events, e.g. a saved history API response.
pub fn load_events_from_file(path: &Path) -> Result<Vec<StatusEvent>> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read events file: {}", path.display()))?;

    let events: Vec<StatusEvent> = serde_json::from_str(&content)
        .with_context(|| format!("Failed to parse JSON from: {}", path.display()))?;

    Ok(events)
}
