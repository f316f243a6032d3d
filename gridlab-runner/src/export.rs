//! Result export: CSV probability table and JSON batch dump.

use std::fs;
use std::path::Path;

use serde::Serialize;
use thiserror::Error;

use gridlab_core::sim::AggregateStats;
use gridlab_core::stats::{confidence_bands, win_probability_interval};

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),
    #[error("serialization error: {0}")]
    Json(#[from] serde_json::Error),
}

/// One row of the exported probability table.
#[derive(Debug, Clone, Serialize)]
struct ProbabilityRow {
    driver: String,
    team: String,
    wins: u32,
    win_pct: f64,
    win_pct_lower: f64,
    win_pct_upper: f64,
    podium_pct: f64,
    expected_finish: f64,
    dnf_pct: f64,
}

fn rows(stats: &AggregateStats) -> Vec<ProbabilityRow> {
    stats
        .ranked()
        .into_iter()
        .map(|d| {
            let win_rate = d.win_rate(stats.trials);
            let interval = win_probability_interval(win_rate, stats.trials);
            ProbabilityRow {
                driver: d.driver.to_string(),
                team: d.team.to_string(),
                wins: d.wins,
                win_pct: 100.0 * win_rate,
                win_pct_lower: 100.0 * interval.map_or(0.0, |b| b.lower),
                win_pct_upper: 100.0 * interval.map_or(0.0, |b| b.upper),
                podium_pct: 100.0 * d.podium_rate(stats.trials),
                expected_finish: d.expected_finish(stats.trials),
                dnf_pct: 100.0 * d.dnf_rate(stats.trials),
            }
        })
        .collect()
}

/// Write the ranked per-driver probability table as CSV.
pub fn write_csv(path: impl AsRef<Path>, stats: &AggregateStats) -> Result<(), ExportError> {
    if let Some(parent) = path.as_ref().parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }
    let mut writer = csv::Writer::from_path(path.as_ref())?;
    for row in rows(stats) {
        writer.serialize(row)?;
    }
    writer.flush()?;
    Ok(())
}

/// Everything a reporting consumer needs, as one JSON document: the raw
/// aggregate plus the validated confidence summary of the winning-time
/// sample (absent when the sample was empty or too small).
#[derive(Debug, Clone, Serialize)]
struct JsonReport<'a> {
    stats: &'a AggregateStats,
    confidence: Option<gridlab_core::stats::BandReport>,
}

/// Render the full batch result as pretty-printed JSON.
pub fn to_json_string(stats: &AggregateStats) -> Result<String, ExportError> {
    let report = JsonReport {
        stats,
        confidence: confidence_bands(&stats.winning_times),
    };
    Ok(serde_json::to_string_pretty(&report)?)
}

/// Write the full batch result as pretty-printed JSON.
pub fn write_json(path: impl AsRef<Path>, stats: &AggregateStats) -> Result<(), ExportError> {
    if let Some(parent) = path.as_ref().parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }
    fs::write(path, to_json_string(stats)?)?;
    Ok(())
}
