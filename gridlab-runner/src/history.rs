//! Prediction history — JSONL append-only persistence.
//!
//! One JSON object per line: the config fingerprint, seed, trial count, and
//! the per-driver probability summary of a completed batch. The format is
//! resilient to partial writes and easy to stream; it enables season-level
//! meta-analysis ("how did the win probability for this driver move from
//! round to round?").

use std::fs::{self, OpenOptions};
use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use gridlab_core::sim::AggregateStats;

/// Per-driver summary persisted with each prediction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DriverSummary {
    pub driver: String,
    pub team: String,
    pub win_pct: f64,
    pub podium_pct: f64,
    pub expected_finish: f64,
    pub dnf_pct: f64,
}

/// A single history entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictionRecord {
    pub timestamp: NaiveDateTime,
    pub race_id: String,
    pub config_fingerprint: String,
    pub master_seed: u64,
    pub trials: u32,
    pub drivers: Vec<DriverSummary>,
}

impl PredictionRecord {
    /// Build a record from a completed batch.
    pub fn from_stats(
        stats: &AggregateStats,
        config_fingerprint: &str,
        timestamp: NaiveDateTime,
    ) -> Self {
        let drivers = stats
            .ranked()
            .into_iter()
            .map(|d| DriverSummary {
                driver: d.driver.to_string(),
                team: d.team.to_string(),
                win_pct: 100.0 * d.win_rate(stats.trials),
                podium_pct: 100.0 * d.podium_rate(stats.trials),
                expected_finish: d.expected_finish(stats.trials),
                dnf_pct: 100.0 * d.dnf_rate(stats.trials),
            })
            .collect();
        Self {
            timestamp,
            race_id: stats.race_id.to_string(),
            config_fingerprint: config_fingerprint.to_string(),
            master_seed: stats.master_seed,
            trials: stats.trials,
            drivers,
        }
    }
}

/// JSONL history file manager.
pub struct PredictionHistory {
    path: PathBuf,
}

impl PredictionHistory {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Append one record.
    pub fn append(&self, record: &PredictionRecord) -> io::Result<()> {
        let json = serde_json::to_string(record)
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;

        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;
        writeln!(file, "{json}")
    }

    /// Read every parseable record; malformed lines are skipped rather than
    /// failing the whole read (partial writes must not poison the history).
    pub fn read_all(&self) -> io::Result<Vec<PredictionRecord>> {
        if !self.path.exists() {
            return Ok(Vec::new());
        }
        let file = fs::File::open(&self.path)?;
        let reader = io::BufReader::new(file);
        let mut records = Vec::new();
        for line in reader.lines() {
            let line = line?;
            if line.trim().is_empty() {
                continue;
            }
            if let Ok(record) = serde_json::from_str::<PredictionRecord>(&line) {
                records.push(record);
            }
        }
        Ok(records)
    }
}
