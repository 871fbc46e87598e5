use anyhow::Result;
use chrono::{Duration, TimeZone, Utc};

use doorwatch::door::DoorStatus;
use doorwatch::renderer;
use doorwatch::report::HistoryReport;
use doorwatch::store::DoorDb;

/// Record transitions into an on-disk store, reopen it, and build the report.
#[test]
fn test_store_to_report() -> Result<()> {
    let data_dir = tempfile::tempdir()?;
    let now = Utc.with_ymd_and_hms(2025, 3, 14, 12, 0, 0).unwrap();
    let at = |d: u32, h: u32| Utc.with_ymd_and_hms(2025, 3, d, h, 0, 0).unwrap();

    {
        let db = DoorDb::init(data_dir.path())?;
        assert!(db.record_if_changed(DoorStatus::Open, at(12, 9))?.is_some());
        // Repeats are not transitions
        assert!(db.record_if_changed(DoorStatus::Open, at(12, 10))?.is_none());
        db.record_if_changed(DoorStatus::Closed, at(12, 17))?;
        db.record_if_changed(DoorStatus::Open, at(13, 23))?;
        db.record_if_changed(DoorStatus::Closed, at(14, 1))?;
        // Older than a year, outside the history window
        db.append(DoorStatus::Open, now - Duration::days(400))?;
    }
    assert!(data_dir.path().join("door.sqlite").exists());

    let db = DoorDb::init(data_dir.path())?;
    let events = db.history_events(now)?;
    assert_eq!(events.len(), 4);

    let current = db.current_status(now)?;
    assert_eq!(current.status, DoorStatus::Closed);

    let report = HistoryReport::build(&events, Some(current), now, &Utc, 42)?;
    assert_eq!(report.summary.total_open_ms, 10 * 3_600_000);
    assert_eq!(report.daily_open_ms.lookup("2025-03-12", 0), 8 * 3_600_000);
    assert_eq!(report.daily_open_ms.lookup("2025-03-13", 0), 3_600_000);
    assert_eq!(report.daily_open_ms.lookup("2025-03-14", 0), 3_600_000);
    assert_eq!(report.summary.days_open, 3);

    let json: serde_json::Value = serde_json::from_str(&report.to_json()?)?;
    assert_eq!(json["current"]["status"], "closed");
    assert_eq!(json["calendar"]["weeks"].as_array().map(Vec::len), Some(53));

    let markdown = renderer::md::render(&report, "common room")?;
    assert!(markdown.contains("- 📍 **Most open day:** 2025-03-12 (8h 0m)"));
    assert!(markdown.contains("or 10h 0m."));

    Ok(())
}

#[test]
fn test_empty_store_report() -> Result<()> {
    let data_dir = tempfile::tempdir()?;
    let db = DoorDb::init(data_dir.path())?;
    let now = Utc.with_ymd_and_hms(2025, 3, 14, 12, 0, 0).unwrap();

    let current = db.current_status(now)?;
    assert_eq!(current.status, DoorStatus::Unknown);

    let report = HistoryReport::build(&db.history_events(now)?, Some(current), now, &Utc, 0)?;
    assert_eq!(report.summary.total_open_ms, 0);
    assert!(report.summary.most_open_day.is_none());
    assert!(report.calendar.cells().all(|cell| cell.intensity == 0.0));

    Ok(())
}
