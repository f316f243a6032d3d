//! Season-scoped calibration session.
//!
//! Owns every mutable learner store — the lap-delta telemetry and the
//! regression window — so nothing lives in ambient global state. The caller
//! owns the session for the season and serializes writes: one observed lap
//! or race result is recorded at a time. Reads produce an immutable
//! snapshot that batches consume by value.

use std::collections::{HashMap, VecDeque};

use tracing::debug;

use gridlab_core::domain::{DriverId, RaceContext, Roster, TeamId};
use gridlab_core::models::PaceWeights;
use gridlab_core::sim::CalibrationSnapshot;

use super::lap_delta::LapDeltaLearner;
use super::regression::{FeatureBounds, PaceRegression, RaceExample, WeightStatus};

/// Finishes remembered per driver for the form-momentum feature.
const FORM_MEMORY: usize = 5;

/// One classified driver in an observed race result.
#[derive(Debug, Clone, PartialEq)]
pub struct ResultEntry {
    pub driver: DriverId,
    /// Grid slot the driver started from, 1-based.
    pub grid: u32,
    /// Final classified position, 1-based.
    pub position: u32,
}

/// Owned calibration state for one season.
#[derive(Debug, Default)]
pub struct CalibrationSession {
    lap_delta: LapDeltaLearner,
    regression: PaceRegression,
    recent_finishes: HashMap<DriverId, VecDeque<u32>>,
}

impl CalibrationSession {
    pub fn new() -> Self {
        Self::default()
    }

    /// Session with custom feature-normalization bounds for the regression
    /// learner.
    pub fn with_bounds(bounds: FeatureBounds) -> Self {
        Self {
            lap_delta: LapDeltaLearner::new(),
            regression: PaceRegression::with_bounds(bounds),
            recent_finishes: HashMap::new(),
        }
    }

    /// Record one observed lap.
    ///
    /// Lap times may be absent; when both are missing but full sector
    /// splits exist on both sides, lap times are derived from the sector
    /// sums. Anything still missing makes the call a no-op.
    #[allow(clippy::too_many_arguments)]
    pub fn record_observed_lap(
        &mut self,
        driver: &DriverId,
        team: &TeamId,
        actual_s: Option<f64>,
        predicted_s: Option<f64>,
        actual_sectors: Option<&[f64]>,
        predicted_sectors: Option<&[f64]>,
    ) {
        let actual = actual_s.or_else(|| sector_sum(actual_sectors, predicted_sectors.map(|s| s.len())));
        let predicted =
            predicted_s.or_else(|| sector_sum(predicted_sectors, actual_sectors.map(|s| s.len())));
        self.lap_delta.record_lap(driver, team, actual, predicted);
    }

    /// Record a real race result: feeds the regression learner one example
    /// per classified driver present in the roster, then updates the form
    /// memory.
    pub fn record_observed_race_result(
        &mut self,
        ctx: &RaceContext,
        finishing_order: &[ResultEntry],
        roster: &Roster,
    ) {
        let field = finishing_order.len();
        if field == 0 {
            return;
        }
        let team_index = roster.team_index();

        for entry in finishing_order {
            let Some(driver) = roster.driver(&entry.driver) else {
                // Result rows for drivers outside the roster snapshot are
                // skipped, never synthesized.
                continue;
            };
            let Some(team) = team_index.get(&driver.team) else {
                continue;
            };

            let target = if field > 1 {
                1.0 - (entry.position.saturating_sub(1)) as f64 / (field - 1) as f64
            } else {
                1.0
            };
            let example = RaceExample {
                driver_rating: driver.effective_rating(ctx.round),
                team_rating: team.car_rating,
                track_affinity: driver
                    .track_affinity
                    .unwrap_or(gridlab_core::models::pace::NEUTRAL_AFFINITY),
                grid_position: entry.grid as f64,
                weather_skill: driver.wet_skill,
                tire_management: driver.traits.tire_smoothness,
                form_momentum: self.form_momentum(&entry.driver, field),
                rating_score: rating_score(driver.rating),
                target,
            };
            self.regression.record_result(&example);
        }

        for entry in finishing_order {
            let finishes = self.recent_finishes.entry(entry.driver.clone()).or_default();
            finishes.push_back(entry.position);
            while finishes.len() > FORM_MEMORY {
                finishes.pop_front();
            }
        }

        debug!(
            race = %ctx.race_id,
            examples = self.regression.example_count(),
            "recorded race result"
        );
    }

    /// Position trend over the remembered finishes, scaled to roughly
    /// [-1, 1]: positive means the driver has been gaining places.
    fn form_momentum(&self, driver: &DriverId, field: usize) -> f64 {
        let Some(finishes) = self.recent_finishes.get(driver) else {
            return 0.0;
        };
        if finishes.len() < 2 {
            return 0.0;
        }
        let first = *finishes.front().unwrap() as f64;
        let last = *finishes.back().unwrap() as f64;
        ((first - last) / field.max(1) as f64).clamp(-1.0, 1.0)
    }

    pub fn team_adjustment(&self, team: &TeamId) -> f64 {
        self.lap_delta.team_adjustment(team)
    }

    pub fn driver_adjustment(&self, driver: &DriverId) -> f64 {
        self.lap_delta.driver_adjustment(driver)
    }

    pub fn learned_weights(&self) -> WeightStatus {
        self.regression.learned_weights()
    }

    /// The split the next batch should use: learned once enough data has
    /// accumulated, the default split before that.
    pub fn pace_weights(&self) -> PaceWeights {
        match self.regression.learned_weights() {
            WeightStatus::Learned(weights) => weights,
            WeightStatus::InsufficientData { .. } => PaceWeights::default(),
        }
    }

    /// Immutable snapshot handed to `simulate_batch`.
    pub fn snapshot(&self) -> CalibrationSnapshot {
        let pace_weights = match self.regression.learned_weights() {
            WeightStatus::Learned(weights) => Some(weights),
            WeightStatus::InsufficientData { .. } => None,
        };
        CalibrationSnapshot::new(self.lap_delta.team_snapshot(), pace_weights)
    }
}

/// Sum a sector array, but only when the other side has the same shape:
/// comparing a 3-sector actual against a 2-sector prediction would bias the
/// error sums.
fn sector_sum(sectors: Option<&[f64]>, other_len: Option<usize>) -> Option<f64> {
    let sectors = sectors?;
    if sectors.is_empty() || other_len != Some(sectors.len()) {
        return None;
    }
    if sectors.iter().any(|&s| s <= 0.0) {
        return None;
    }
    Some(sectors.iter().sum())
}

/// Map a 0–100 rating onto the external rating-system score window.
fn rating_score(rating: f64) -> f64 {
    1200.0 + rating.clamp(0.0, 100.0) * 6.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use gridlab_core::domain::{
        DegradationCategory, DevelopmentProfile, Driver, DriverTraits, EngineSupplier, RaceId,
        Team, TrackCategory,
    };

    fn roster() -> Roster {
        let teams: Vec<Team> = (0..5)
            .map(|i| Team {
                id: TeamId::new(format!("team-{i}")),
                car_rating: 75.0 + i as f64 * 4.0,
                reliability: 0.05,
                supplier: EngineSupplier::Meridian,
            })
            .collect();
        let drivers: Vec<Driver> = (0..10)
            .map(|i| Driver {
                id: DriverId::new(format!("driver-{i}")),
                team: TeamId::new(format!("team-{}", i / 2)),
                rating: 70.0 + i as f64 * 2.0,
                wet_skill: 1.0,
                traits: DriverTraits::default(),
                development: DevelopmentProfile::Prime,
                track_affinity: Some(0.6),
            })
            .collect();
        Roster::new(drivers, teams)
    }

    fn context() -> RaceContext {
        RaceContext {
            race_id: RaceId::new("session-ring"),
            round: 4,
            total_laps: 52,
            category: TrackCategory::Permanent,
            safety_car_probability: 0.3,
            rain_probability: 0.1,
            track_temp_c: 31.0,
            degradation: DegradationCategory::Medium,
            drs_zones: 2,
        }
    }

    fn full_result() -> Vec<ResultEntry> {
        (0..10)
            .map(|i| ResultEntry {
                driver: DriverId::new(format!("driver-{i}")),
                grid: (10 - i) as u32,
                position: (10 - i) as u32,
            })
            .collect()
    }

    #[test]
    fn laps_feed_team_adjustments() {
        let mut session = CalibrationSession::new();
        let driver = DriverId::new("driver-0");
        let team = TeamId::new("team-0");
        for _ in 0..10 {
            session.record_observed_lap(&driver, &team, Some(91.0), Some(90.0), None, None);
        }
        assert!(session.team_adjustment(&team) < 0.0);
        assert!(session.driver_adjustment(&driver) < 0.0);
    }

    #[test]
    fn sector_splits_substitute_for_missing_lap_times() {
        let mut session = CalibrationSession::new();
        let driver = DriverId::new("driver-1");
        let team = TeamId::new("team-0");
        let actual = [30.5, 30.5, 30.0];
        let predicted = [30.0, 30.0, 30.0];
        for _ in 0..8 {
            session.record_observed_lap(&driver, &team, None, None, Some(&actual), Some(&predicted));
        }
        assert!(session.driver_adjustment(&driver) < 0.0);
    }

    #[test]
    fn mismatched_sector_counts_are_ignored() {
        let mut session = CalibrationSession::new();
        let driver = DriverId::new("driver-2");
        let team = TeamId::new("team-1");
        let actual = [45.0, 46.0];
        let predicted = [30.0, 30.0, 30.0];
        session.record_observed_lap(&driver, &team, None, None, Some(&actual), Some(&predicted));
        assert_eq!(session.driver_adjustment(&driver), 0.0);
    }

    #[test]
    fn snapshot_is_empty_before_any_observation() {
        let session = CalibrationSession::new();
        let snapshot = session.snapshot();
        assert!(snapshot.team_adjustments.is_empty());
        assert!(snapshot.pace_weights.is_none());
    }

    #[test]
    fn race_results_accumulate_regression_examples() {
        let mut session = CalibrationSession::new();
        let ctx = context();
        let roster = roster();
        // Two full races: 20 examples, exactly the learning threshold.
        session.record_observed_race_result(&ctx, &full_result(), &roster);
        assert!(matches!(
            session.learned_weights(),
            WeightStatus::InsufficientData { have: 10, need: 20 }
        ));
        session.record_observed_race_result(&ctx, &full_result(), &roster);
        assert!(matches!(session.learned_weights(), WeightStatus::Learned(_)));
        assert!(session.snapshot().pace_weights.is_some());
    }

    #[test]
    fn default_split_until_enough_data() {
        let session = CalibrationSession::new();
        assert_eq!(session.pace_weights(), PaceWeights::default());
    }

    #[test]
    fn result_rows_outside_the_roster_are_skipped() {
        let mut session = CalibrationSession::new();
        let ctx = context();
        let roster = roster();
        let order = vec![ResultEntry {
            driver: DriverId::new("interloper"),
            grid: 1,
            position: 1,
        }];
        session.record_observed_race_result(&ctx, &order, &roster);
        assert!(matches!(
            session.learned_weights(),
            WeightStatus::InsufficientData { have: 0, .. }
        ));
    }

    #[test]
    fn form_momentum_rewards_improving_drivers() {
        let mut session = CalibrationSession::new();
        let driver = DriverId::new("driver-0");
        for position in [8u32, 6, 4, 2] {
            let finishes = session.recent_finishes.entry(driver.clone()).or_default();
            finishes.push_back(position);
        }
        let momentum = session.form_momentum(&driver, 10);
        assert!(momentum > 0.0);

        let fading = DriverId::new("driver-1");
        for position in [2u32, 5, 9] {
            let finishes = session.recent_finishes.entry(fading.clone()).or_default();
            finishes.push_back(position);
        }
        assert!(session.form_momentum(&fading, 10) < 0.0);
    }

    #[test]
    fn empty_result_is_a_no_op() {
        let mut session = CalibrationSession::new();
        session.record_observed_race_result(&context(), &[], &roster());
        assert!(matches!(
            session.learned_weights(),
            WeightStatus::InsufficientData { have: 0, .. }
        ));
    }
}
