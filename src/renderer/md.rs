use crate::calendar::{CalendarGrid, WEEKDAY_LABELS, WEEKS};
use crate::door::{DoorStatus, StatusEvent};
use crate::history::day_key;
use crate::report::HistoryReport;
use crate::summary::{format_hm, HistorySummary};
use crate::timefmt::format_iso_local;
use anyhow::Result;

/// Width of the weekday label column in the heatmap.
const LABEL_WIDTH: usize = 4;

/// Render the history report to Markdown with a text heatmap
pub fn render(report: &HistoryReport, place: &str) -> Result<String> {
    let mut output = String::new();

    output.push_str(&format!("# 🚪 {} status\n\n", place));

    // 1. Current status
    if let Some(ref current) = report.current {
        render_current(&mut output, current);
    }

    // 2. Summary
    render_summary(&mut output, &report.summary, place);

    // 3. Heatmap
    render_heatmap(&mut output, &report.calendar);

    // 4. Legend
    render_legend(&mut output, &report.summary);

    Ok(output)
}

/// Render just the current status block
pub fn render_current_only(current: &StatusEvent) -> String {
    let mut output = String::new();
    render_current(&mut output, current);
    output
}

fn render_current(output: &mut String, current: &StatusEvent) {
    output.push_str("### 🔔 Current\n");
    output.push_str(&format!(
        "- **Status:** {} {}\n",
        status_marker(current.status),
        current.status
    ));
    output.push_str(&format!("- **Since:** {}\n", format_iso_local(&current.since)));
    output.push_str(&format!(
        "- **Last updated:** {}\n",
        format_iso_local(&current.fetched_at)
    ));
    output.push('\n');
}

fn render_summary(output: &mut String, summary: &HistorySummary, place: &str) {
    output.push_str("### 📊 Last year\n");
    output.push_str(&summary.sentence(&format!("The {}", place)));
    output.push_str("\n\n");

    if let Some(ref day) = summary.most_open_day {
        output.push_str(&format!(
            "- 📍 **Most open day:** {} ({})\n",
            day.date,
            format_hm(day.duration_ms)
        ));
    }
    output.push_str(&format!("- 🔥 **Days open:** {}\n", summary.days_open));
    output.push('\n');
}

fn render_heatmap(output: &mut String, grid: &CalendarGrid) {
    output.push_str("### 🗓️ Heatmap\n");
    output.push_str("```text\n");

    // Year line, then month line, each placed over the column where the month starts
    let mut years = vec![' '; WEEKS];
    let mut months = vec![' '; WEEKS];
    let mut year_free_from = 0;
    for label in &grid.months {
        if label.end_week <= label.week_index {
            continue;
        }
        let span = label.end_week - label.week_index;
        place_text(&mut months, label.week_index, &label.short_name()[..span.min(3)]);
        // Years may run past their month but never over an earlier year
        if label.show_year && label.week_index >= year_free_from {
            let year = label.year.to_string();
            place_text(&mut years, label.week_index, &year);
            year_free_from = label.week_index + year.len() + 1;
        }
    }
    push_header_line(output, &years);
    push_header_line(output, &months);

    // Days after today are left blank
    let today_key = day_key(grid.today);
    for (day_of_week, label) in WEEKDAY_LABELS.iter().enumerate() {
        output.push_str(&format!("{:<width$}", label, width = LABEL_WIDTH));
        for cell in grid.row(day_of_week) {
            if cell.date > today_key {
                output.push(' ');
            } else {
                output.push(intensity_glyph(cell.intensity));
            }
        }
        output.push('\n');
    }

    // Marker under today's column
    let mut marker = vec![' '; WEEKS];
    marker[grid.today_position.week_index] = '^';
    push_header_line(output, &marker);

    output.push_str("```\n");
    output.push_str(&format!(
        "*Today ({}) is week {}, {}.*\n\n",
        grid.today.format("%Y-%m-%d"),
        grid.today_position.week_index + 1,
        grid.today.format("%A")
    ));
}

fn render_legend(output: &mut String, summary: &HistorySummary) {
    output.push_str("Mostly closed ");
    for step in &summary.legend {
        output.push(intensity_glyph(step.intensity));
    }
    output.push_str(" Mostly open\n\n");

    let steps: Vec<String> = summary
        .legend
        .iter()
        .map(|step| {
            format!(
                "`{}` {}",
                intensity_glyph(step.intensity),
                format_hm(step.duration_ms)
            )
        })
        .collect();
    output.push_str(&steps.join(" · "));
    output.push('\n');
}

fn push_header_line(output: &mut String, columns: &[char]) {
    let line: String = columns.iter().collect();
    let line = format!("{:width$}{}", "", line, width = LABEL_WIDTH);
    output.push_str(line.trim_end());
    output.push('\n');
}

/// Write `text` into `columns` starting at `start`, never past the end.
fn place_text(columns: &mut [char], start: usize, text: &str) {
    for (offset, ch) in text.chars().enumerate() {
        if let Some(slot) = columns.get_mut(start + offset) {
            *slot = ch;
        }
    }
}

/// Heatmap glyph for an intensity in `0.0..=1.0`.
fn intensity_glyph(intensity: f64) -> char {
    match intensity {
        i if i <= 0.0 => '·',
        i if i <= 0.25 => '░',
        i if i <= 0.5 => '▒',
        i if i <= 0.75 => '▓',
        _ => '█',
    }
}

fn status_marker(status: DoorStatus) -> &'static str {
    match status {
        DoorStatus::Open => "🟢",
        DoorStatus::Closed => "🔴",
        DoorStatus::Unknown => "⚪",
    }
}
