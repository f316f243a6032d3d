//! Monte Carlo batch aggregation.
//!
//! Runs N independent trials with seeds derived deterministically from
//! (master seed, race id, trial index) and accumulates per-driver outcome
//! counts. Seeds are pre-derived, so trials may run sequentially or across
//! the rayon pool with bit-identical results; a batch either completes in
//! full or reports a typed error.

use std::collections::HashMap;

use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::{DriverId, RaceContext, RaceId, Roster, TeamId};
use crate::models::WeatherScenario;
use crate::rng::SeedHierarchy;
use crate::sim::trial::{run_trial, TrialError, TrialOutcome};
use crate::sim::CalibrationSnapshot;

/// Podium depth.
const PODIUM_POSITIONS: u32 = 3;

#[derive(Debug, Error, PartialEq)]
pub enum BatchError {
    #[error("empty roster")]
    EmptyRoster,
    #[error("trial count must be greater than zero")]
    ZeroTrials,
    #[error(transparent)]
    Trial(#[from] TrialError),
}

/// Outcome counts for one driver across a batch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DriverStats {
    pub driver: DriverId,
    pub team: TeamId,
    pub wins: u32,
    pub podiums: u32,
    /// Sum of finishing positions across all trials (DNFs included at their
    /// back-of-field classification).
    pub position_sum: u64,
    pub dnf_count: u32,
}

impl DriverStats {
    fn new(driver: DriverId, team: TeamId) -> Self {
        Self {
            driver,
            team,
            wins: 0,
            podiums: 0,
            position_sum: 0,
            dnf_count: 0,
        }
    }

    pub fn win_rate(&self, trials: u32) -> f64 {
        if trials == 0 {
            return 0.0;
        }
        self.wins as f64 / trials as f64
    }

    pub fn podium_rate(&self, trials: u32) -> f64 {
        if trials == 0 {
            return 0.0;
        }
        self.podiums as f64 / trials as f64
    }

    pub fn expected_finish(&self, trials: u32) -> f64 {
        if trials == 0 {
            return 0.0;
        }
        self.position_sum as f64 / trials as f64
    }

    pub fn dnf_rate(&self, trials: u32) -> f64 {
        if trials == 0 {
            return 0.0;
        }
        self.dnf_count as f64 / trials as f64
    }
}

/// How often each weather scenario was realized across a batch.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct ScenarioCounts {
    pub dry: u32,
    pub light_rain: u32,
    pub wet: u32,
    pub heavy_rain: u32,
}

impl ScenarioCounts {
    fn record(&mut self, weather: WeatherScenario) {
        match weather {
            WeatherScenario::Dry => self.dry += 1,
            WeatherScenario::LightRain => self.light_rain += 1,
            WeatherScenario::Wet => self.wet += 1,
            WeatherScenario::HeavyRain => self.heavy_rain += 1,
        }
    }
}

/// Aggregated result of one batch. Accumulators are reset for every batch;
/// nothing carries over between batches.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AggregateStats {
    pub race_id: RaceId,
    pub trials: u32,
    pub master_seed: u64,
    /// Per-driver counts, in roster order.
    pub drivers: Vec<DriverStats>,
    /// Winner's race time per trial (all-DNF trials contribute nothing);
    /// the sample fed to the distribution validator and confidence bands.
    pub winning_times: Vec<f64>,
    pub scenarios: ScenarioCounts,
    pub safety_car_trials: u32,
}

impl AggregateStats {
    /// Drivers ranked by win rate, ties broken by expected finish.
    pub fn ranked(&self) -> Vec<&DriverStats> {
        let mut ranked: Vec<&DriverStats> = self.drivers.iter().collect();
        ranked.sort_by(|a, b| {
            b.wins
                .cmp(&a.wins)
                .then_with(|| a.position_sum.cmp(&b.position_sum))
        });
        ranked
    }
}

/// Run a full Monte Carlo batch.
///
/// Pure function of its arguments: invoking it twice with identical inputs
/// produces identical `AggregateStats`, including the winning-time sample.
pub fn simulate_batch(
    roster: &Roster,
    ctx: &RaceContext,
    snapshot: &CalibrationSnapshot,
    trials: u32,
    master_seed: u64,
) -> Result<AggregateStats, BatchError> {
    if roster.is_empty() {
        return Err(BatchError::EmptyRoster);
    }
    if trials == 0 {
        return Err(BatchError::ZeroTrials);
    }
    if let Some((driver, team)) = roster.find_unknown_team() {
        return Err(BatchError::Trial(TrialError::UnknownTeam {
            driver: driver.clone(),
            team: team.clone(),
        }));
    }

    let hierarchy = SeedHierarchy::new(master_seed);
    let seeds: Vec<u64> = (0..trials as u64)
        .map(|i| hierarchy.trial_seed(&ctx.race_id, i))
        .collect();

    // Trials are fully independent; the parallel map preserves index order,
    // so accumulation below is deterministic.
    let outcomes: Result<Vec<TrialOutcome>, TrialError> = seeds
        .par_iter()
        .map(|&seed| run_trial(roster, ctx, snapshot, seed))
        .collect();
    let outcomes = outcomes?;

    let mut drivers: Vec<DriverStats> = roster
        .drivers
        .iter()
        .map(|d| DriverStats::new(d.id.clone(), d.team.clone()))
        .collect();
    let index: HashMap<&DriverId, usize> = roster
        .drivers
        .iter()
        .enumerate()
        .map(|(i, d)| (&d.id, i))
        .collect();

    let mut winning_times = Vec::with_capacity(outcomes.len());
    let mut scenarios = ScenarioCounts::default();
    let mut safety_car_trials = 0;

    for outcome in &outcomes {
        scenarios.record(outcome.weather);
        if outcome.safety_car {
            safety_car_trials += 1;
        }
        if let Some(t) = outcome.winning_time {
            winning_times.push(t);
        }
        for (driver, position) in &outcome.classification {
            let stats = &mut drivers[index[driver]];
            stats.position_sum += u64::from(*position);
            if *position == 1 && !outcome.dnfs.contains(driver) {
                stats.wins += 1;
            }
            if *position <= PODIUM_POSITIONS && !outcome.dnfs.contains(driver) {
                stats.podiums += 1;
            }
        }
        for dnf in &outcome.dnfs {
            drivers[index[dnf]].dnf_count += 1;
        }
    }

    Ok(AggregateStats {
        race_id: ctx.race_id.clone(),
        trials,
        master_seed,
        drivers,
        winning_times,
        scenarios,
        safety_car_trials,
    })
}
