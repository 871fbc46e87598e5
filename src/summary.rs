/// Summary figures and display helpers for the history view.
use rand::{rngs::StdRng, Rng, SeedableRng};
use serde::Serialize;

use crate::history::DailyDurations;

const SECOND: f64 = 1000.0;
const MINUTE: f64 = 60.0 * SECOND;
const HOUR: f64 = 60.0 * MINUTE;

/// A whimsical unit the yearly total can be expressed in.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FunUnit {
    pub name: &'static str,
    pub duration_ms: f64,
}

pub const FUN_UNITS: [FunUnit; 11] = [
    FunUnit {
        name: "Shrek viewings",
        duration_ms: HOUR + 29.0 * MINUTE,
    },
    FunUnit {
        name: "rick rolls",
        duration_ms: 3.0 * MINUTE + 33.0 * SECOND,
    },
    FunUnit {
        name: "Minecraft days",
        duration_ms: 20.0 * MINUTE,
    },
    FunUnit {
        name: "Lord of the Rings (Extended Edition) viewings",
        duration_ms: 11.0 * HOUR + 20.0 * MINUTE,
    },
    FunUnit {
        name: "francium 221 Half-Lives",
        duration_ms: 4.8 * MINUTE,
    },
    FunUnit {
        name: "default Linux TCP keepalive intervals",
        duration_ms: 2.0 * HOUR,
    },
    FunUnit {
        name: "frames at 60 FPS",
        duration_ms: 16.67,
    },
    FunUnit {
        name: "Windows XP startup sounds",
        duration_ms: 3.0 * SECOND,
    },
    FunUnit {
        name: "iOS alarm snoozes",
        duration_ms: 9.0 * MINUTE,
    },
    FunUnit {
        name: "un-skippable youtube ads",
        duration_ms: 15.0 * SECOND,
    },
    FunUnit {
        name: "Portal speedruns",
        duration_ms: 5.0 * MINUTE + 39.0 * SECOND + 960.0,
    },
];

impl FunUnit {
    /// Pick a unit deterministically from `seed`.
    pub fn choose(seed: u64) -> &'static FunUnit {
        let mut rng = StdRng::seed_from_u64(seed);
        &FUN_UNITS[rng.gen_range(0..FUN_UNITS.len())]
    }

    /// How many of this unit fit into `total_ms`.
    pub fn quantity(&self, total_ms: u64) -> f64 {
        total_ms as f64 / self.duration_ms
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MostOpenDay {
    pub date: String,
    pub duration_ms: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FunTotal {
    pub unit: FunUnit,
    pub amount: f64,
}

/// One swatch of the heatmap legend.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LegendStep {
    pub intensity: f64,
    pub duration_ms: u64,
}

/// Totals over the whole history window.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HistorySummary {
    pub total_open_ms: u64,
    pub most_open_day: Option<MostOpenDay>,
    pub days_open: usize,
    pub fun: FunTotal,
    pub legend: Vec<LegendStep>,
}

impl HistorySummary {
    pub fn from_durations(durations: &DailyDurations, unit: &FunUnit) -> Self {
        let total_open_ms = durations.total();
        let most_open_day = durations.most_open_day().map(|(date, duration_ms)| MostOpenDay {
            date: date.to_string(),
            duration_ms,
        });

        Self {
            total_open_ms,
            most_open_day,
            days_open: durations.iter().filter(|(_, ms)| *ms > 0).count(),
            fun: FunTotal {
                unit: *unit,
                amount: unit.quantity(total_open_ms),
            },
            legend: legend(durations.max()),
        }
    }

    /// "The door was open for 3.5 Shrek viewings in the last year, or 5h 11m."
    pub fn sentence(&self, place: &str) -> String {
        format!(
            "{} was open for {} {} in the last year, or {}.",
            place,
            format_quantity(self.fun.amount),
            self.fun.unit.name,
            format_hm(self.total_open_ms)
        )
    }
}

/// Six swatches from empty to the busiest day.
pub fn legend(max_daily_ms: u64) -> Vec<LegendStep> {
    (0..=5u64)
        .map(|step| LegendStep {
            intensity: step as f64 / 5.0,
            duration_ms: max_daily_ms * step / 5,
        })
        .collect()
}

/// Whole hours and minutes, e.g. `4h 0m`.
pub fn format_hm(duration_ms: u64) -> String {
    let hours = duration_ms / 3_600_000;
    let minutes = (duration_ms % 3_600_000) / 60_000;
    format!("{}h {}m", hours, minutes)
}

/// Up to two fraction digits with thousand separators, e.g. `1,234.5`.
pub fn format_quantity(value: f64) -> String {
    if !value.is_finite() {
        return "0".to_string();
    }
    let hundredths = (value.abs() * 100.0).round() as u64;
    let whole = group_thousands(hundredths / 100);
    let frac = hundredths % 100;

    let mut formatted = match frac {
        0 => whole,
        f if f % 10 == 0 => format!("{}.{}", whole, f / 10),
        f => format!("{}.{:02}", whole, f),
    };
    if value < 0.0 && hundredths > 0 {
        formatted.insert(0, '-');
    }
    formatted
}

fn group_thousands(n: u64) -> String {
    let digits = n.to_string();
    let mut grouped_rev = String::new();

    for (count, ch) in digits.chars().rev().enumerate() {
        if count > 0 && count % 3 == 0 {
            grouped_rev.push(',');
        }
        grouped_rev.push(ch);
    }

    grouped_rev.chars().rev().collect()
}
