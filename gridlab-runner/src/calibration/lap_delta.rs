//! Bayesian lap-delta learner.
//!
//! On every completed lap with both an actual and a predicted time, the
//! learner accumulates running error sums per driver and recomputes a
//! posterior pace adjustment: a precision-weighted blend of a zero prior
//! (fixed pseudo-count) and the observed mean error, normalized by the
//! driver's own mean predicted lap time. Adjustments are clamped to ±3%
//! per race regardless of how large the observed error is; positive error
//! (slower than predicted) drives the adjustment negative.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use gridlab_core::domain::{DriverId, TeamId};

/// Hard ceiling on adjustment magnitude.
pub const ADJUSTMENT_CEILING: f64 = 0.03;

/// Pseudo-count of the zero prior: the first observations barely move the
/// posterior, and it takes a couple of stints to approach the ceiling.
pub const PRIOR_PSEUDO_COUNT: f64 = 15.0;

/// Rolling telemetry for one driver.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct DriverTelemetry {
    /// Sum of (actual - predicted) lap times, seconds.
    error_sum: f64,
    /// Sum of predicted lap times, seconds.
    predicted_sum: f64,
    laps: u32,
    /// Current posterior adjustment, always within ±`ADJUSTMENT_CEILING`.
    adjustment: f64,
}

/// Season-scoped learner state. Owned by the calibration session; the
/// session serializes writes, so no interior locking is needed here.
#[derive(Debug, Clone, Default)]
pub struct LapDeltaLearner {
    drivers: HashMap<DriverId, DriverTelemetry>,
    driver_teams: HashMap<DriverId, TeamId>,
}

impl LapDeltaLearner {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record one completed lap.
    ///
    /// Missing or non-positive times make the call a no-op: absent data is
    /// never substituted with a fabricated value.
    pub fn record_lap(
        &mut self,
        driver: &DriverId,
        team: &TeamId,
        actual_s: Option<f64>,
        predicted_s: Option<f64>,
    ) {
        let (Some(actual), Some(predicted)) = (actual_s, predicted_s) else {
            return;
        };
        if actual <= 0.0 || predicted <= 0.0 {
            return;
        }

        self.driver_teams
            .entry(driver.clone())
            .or_insert_with(|| team.clone());
        let telemetry = self.drivers.entry(driver.clone()).or_default();
        telemetry.error_sum += actual - predicted;
        telemetry.predicted_sum += predicted;
        telemetry.laps += 1;

        let laps = telemetry.laps as f64;
        let mean_error = telemetry.error_sum / laps;
        let mean_predicted = telemetry.predicted_sum / laps;
        // Relative error against the driver's own predicted pace, not a
        // hardcoded reference lap.
        let relative_error = mean_error / mean_predicted;
        let posterior = relative_error * (laps / (laps + PRIOR_PSEUDO_COUNT));
        // Running slower than predicted means the pace model was too
        // optimistic: push the adjustment down.
        telemetry.adjustment = (-posterior).clamp(-ADJUSTMENT_CEILING, ADJUSTMENT_CEILING);
    }

    /// Current adjustment for a driver; 0.0 when nothing was observed.
    pub fn driver_adjustment(&self, driver: &DriverId) -> f64 {
        self.drivers.get(driver).map_or(0.0, |t| t.adjustment)
    }

    /// Laps observed for a driver.
    pub fn lap_count(&self, driver: &DriverId) -> u32 {
        self.drivers.get(driver).map_or(0, |t| t.laps)
    }

    /// Team-level adjustment: the mean across the team's observed drivers;
    /// 0.0 when the team has no observations.
    pub fn team_adjustment(&self, team: &TeamId) -> f64 {
        let mut sum = 0.0;
        let mut count = 0u32;
        for (driver, driver_team) in &self.driver_teams {
            if driver_team == team {
                if let Some(t) = self.drivers.get(driver) {
                    sum += t.adjustment;
                    count += 1;
                }
            }
        }
        if count == 0 {
            0.0
        } else {
            sum / count as f64
        }
    }

    /// Per-team adjustment map, as consumed by the batch snapshot.
    pub fn team_snapshot(&self) -> HashMap<TeamId, f64> {
        let mut teams: Vec<&TeamId> = self.driver_teams.values().collect();
        teams.sort();
        teams.dedup();
        teams
            .into_iter()
            .map(|team| (team.clone(), self.team_adjustment(team)))
            .collect()
    }
}
