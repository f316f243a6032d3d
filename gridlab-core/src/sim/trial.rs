//! One complete randomized race realization from one seed.
//!
//! A trial is a pure function of (roster, context, calibration snapshot,
//! seed): it owns its RNG, reads no state written by any other trial, and
//! produces a finishing order plus the DNF set. All per-driver working data
//! lives only for the duration of the trial.

use std::cmp::Ordering;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::{DriverId, RaceContext, Roster, TeamId};
use crate::models::pace::{self, PaceInputs};
use crate::models::weather::WeatherScenario;
use crate::models::{fuel, reliability, tire, TireCompound};
use crate::rng::TrialRng;
use crate::sim::CalibrationSnapshot;

/// Sentinel race time assigned to retirements; ranks after any finisher.
pub const DNF_TIME: f64 = 1.0e9;

/// Width of the qualifying noise added on top of race pace, seconds.
const QUALI_NOISE_STD: f64 = 0.15;

/// Deterministic time penalty per grid slot, seconds. Models traffic and
/// track-position disadvantage without simulating individual laps.
const GRID_SLOT_PENALTY: f64 = 0.8;

/// Per-car compression range applied when the field bunches behind the
/// safety car, scaled by the trial's chaos magnitude.
const SC_COMPRESSION_MIN: f64 = 0.2;
const SC_COMPRESSION_MAX: f64 = 0.7;

/// Working row for one driver, discarded once the outcome is assembled.
#[derive(Debug, Clone)]
struct TrialEntry {
    driver: DriverId,
    pace: f64,
    qualifying_pace: f64,
    grid_slot: u32,
    dnf: bool,
    race_time: f64,
}

/// Terminal state of one trial.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrialOutcome {
    pub weather: WeatherScenario,
    pub safety_car: bool,
    /// Drivers in finishing order with positions 1..N; DNFs rank last.
    pub classification: Vec<(DriverId, u32)>,
    pub dnfs: Vec<DriverId>,
    /// Winner's simulated race time; `None` when the whole field retired.
    pub winning_time: Option<f64>,
}

#[derive(Debug, Error, PartialEq)]
pub enum TrialError {
    #[error("driver '{driver}' references unknown team '{team}'")]
    UnknownTeam { driver: DriverId, team: TeamId },
}

/// Race compound dictated by the trial's weather scenario.
fn representative_compound(weather: WeatherScenario) -> TireCompound {
    match weather {
        WeatherScenario::Dry => TireCompound::Medium,
        WeatherScenario::LightRain => TireCompound::Intermediate,
        WeatherScenario::Wet | WeatherScenario::HeavyRain => TireCompound::Wet,
    }
}

/// Run one full race trial.
///
/// Draw order is fixed — weather, safety car, then per driver in roster
/// order (pace noise, DNF roll, qualifying noise), then per-car bunching —
/// so a seed always reproduces the same realization.
pub fn run_trial(
    roster: &Roster,
    ctx: &RaceContext,
    snapshot: &CalibrationSnapshot,
    seed: u64,
) -> Result<TrialOutcome, TrialError> {
    let mut rng = TrialRng::new(seed);

    let weather = WeatherScenario::draw(ctx.rain_probability, &mut rng);
    let safety_car = rng.chance(ctx.safety_car_probability.clamp(0.0, 1.0));
    let chaos = if safety_car { rng.range(0.25, 1.0) } else { 0.0 };

    let weights = snapshot.pace_weights.unwrap_or_default();
    let team_index = roster.team_index();

    let wet = weather.is_wet();
    let compound = representative_compound(weather);
    let representative_lap = ctx.total_laps / 2;
    let stint_age = (ctx.total_laps / 4).max(1);
    let fuel_mass = fuel::remaining_fuel(representative_lap, ctx.total_laps, 0, wet);
    let fuel_delta = fuel::pace_gain(representative_lap, ctx.total_laps, 0, wet);

    let mut entries: Vec<TrialEntry> = Vec::with_capacity(roster.len());
    for driver in &roster.drivers {
        let team = team_index
            .get(&driver.team)
            .ok_or_else(|| TrialError::UnknownTeam {
                driver: driver.id.clone(),
                team: driver.team.clone(),
            })?;

        let tire_delta = tire::pace_loss(
            compound,
            stint_age,
            ctx.track_temp_c,
            driver.traits.tire_smoothness,
            ctx.degradation,
            fuel_mass,
        );
        let weather_skill = 1.0 + (driver.wet_skill - 1.0) * weather.wet_skill_exposure();
        let adjustment = snapshot
            .team_adjustments
            .get(&driver.team)
            .copied()
            .unwrap_or(0.0);

        let inputs = PaceInputs {
            driver_rating: driver.effective_rating(ctx.round),
            car_rating: team.car_rating,
            track_affinity: driver.track_affinity,
            weather_skill,
            calibration_adjustment: adjustment,
            tire_delta,
            fuel_delta,
            aero_delta: 0.0,
            noise_scale: weather.pace_noise_factor(),
        };
        let pace = pace::compose(&inputs, &weights, &mut rng);

        let dnf_p = reliability::dnf_probability(team, weather, driver.traits.mistake_rate);
        let dnf = rng.chance(dnf_p);
        let qualifying_pace = pace + rng.normal(0.0, QUALI_NOISE_STD);

        entries.push(TrialEntry {
            driver: driver.id.clone(),
            pace,
            qualifying_pace,
            grid_slot: 0,
            dnf,
            race_time: 0.0,
        });
    }

    // Grid order from qualifying pace; ties resolve in roster order.
    let mut grid: Vec<usize> = (0..entries.len()).collect();
    grid.sort_by(|&a, &b| {
        entries[a]
            .qualifying_pace
            .partial_cmp(&entries[b].qualifying_pace)
            .unwrap_or(Ordering::Equal)
    });
    for (slot, &idx) in grid.iter().enumerate() {
        entries[idx].grid_slot = slot as u32 + 1;
    }

    let laps = ctx.total_laps.max(1) as f64;
    for entry in &mut entries {
        entry.race_time = if entry.dnf {
            DNF_TIME
        } else {
            entry.pace * laps + (entry.grid_slot - 1) as f64 * GRID_SLOT_PENALTY
        };
    }

    // Safety-car bunching: pull every running car toward the leader by a
    // randomized fraction of its deficit, scaled by the chaos magnitude.
    if safety_car {
        let leader_time = entries
            .iter()
            .filter(|e| !e.dnf)
            .map(|e| e.race_time)
            .fold(f64::INFINITY, f64::min);
        if leader_time.is_finite() {
            for entry in &mut entries {
                let compression = chaos * rng.range(SC_COMPRESSION_MIN, SC_COMPRESSION_MAX);
                if !entry.dnf {
                    entry.race_time =
                        leader_time + (entry.race_time - leader_time) * (1.0 - compression);
                }
            }
        }
    }

    // Classification: ascending race time; the DNF sentinel ranks last and
    // the stable sort keeps roster order among retirements.
    let mut order: Vec<usize> = (0..entries.len()).collect();
    order.sort_by(|&a, &b| {
        entries[a]
            .race_time
            .partial_cmp(&entries[b].race_time)
            .unwrap_or(Ordering::Equal)
    });

    let classification: Vec<(DriverId, u32)> = order
        .iter()
        .enumerate()
        .map(|(pos, &idx)| (entries[idx].driver.clone(), pos as u32 + 1))
        .collect();
    let winning_time = order
        .first()
        .filter(|&&idx| !entries[idx].dnf)
        .map(|&idx| entries[idx].race_time);
    let dnfs: Vec<DriverId> = entries
        .iter()
        .filter(|e| e.dnf)
        .map(|e| e.driver.clone())
        .collect();

    Ok(TrialOutcome {
        weather,
        safety_car,
        classification,
        dnfs,
        winning_time,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{
        DegradationCategory, DevelopmentProfile, Driver, DriverTraits, EngineSupplier, RaceId,
        Team, TrackCategory,
    };

    fn roster(n: usize) -> Roster {
        let teams: Vec<Team> = (0..n)
            .map(|i| Team {
                id: TeamId::new(format!("team-{i}")),
                car_rating: 70.0 + i as f64 * 2.5,
                reliability: 0.05,
                supplier: EngineSupplier::Meridian,
            })
            .collect();
        let drivers: Vec<Driver> = (0..n)
            .map(|i| Driver {
                id: DriverId::new(format!("driver-{i}")),
                team: TeamId::new(format!("team-{i}")),
                rating: 70.0 + i as f64 * 2.5,
                wet_skill: 1.0,
                traits: DriverTraits::default(),
                development: DevelopmentProfile::Prime,
                track_affinity: None,
            })
            .collect();
        Roster::new(drivers, teams)
    }

    fn context() -> RaceContext {
        RaceContext {
            race_id: RaceId::new("testring-2025"),
            round: 5,
            total_laps: 50,
            category: TrackCategory::Permanent,
            safety_car_probability: 0.3,
            rain_probability: 0.1,
            track_temp_c: 32.0,
            degradation: DegradationCategory::Medium,
            drs_zones: 2,
        }
    }

    #[test]
    fn same_seed_reproduces_the_trial() {
        let roster = roster(10);
        let ctx = context();
        let snapshot = CalibrationSnapshot::default();
        let a = run_trial(&roster, &ctx, &snapshot, 42).unwrap();
        let b = run_trial(&roster, &ctx, &snapshot, 42).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn different_seeds_differ() {
        let roster = roster(10);
        let ctx = context();
        let snapshot = CalibrationSnapshot::default();
        let a = run_trial(&roster, &ctx, &snapshot, 1).unwrap();
        let b = run_trial(&roster, &ctx, &snapshot, 2).unwrap();
        // Pace noise makes identical classifications across two seeds
        // vanishingly unlikely for a 10-car field.
        assert!(a != b);
    }

    #[test]
    fn positions_are_a_permutation() {
        let roster = roster(12);
        let ctx = context();
        let snapshot = CalibrationSnapshot::default();
        let outcome = run_trial(&roster, &ctx, &snapshot, 7).unwrap();
        let mut positions: Vec<u32> = outcome.classification.iter().map(|(_, p)| *p).collect();
        positions.sort_unstable();
        assert_eq!(positions, (1..=12).collect::<Vec<u32>>());
    }

    #[test]
    fn dnfs_rank_behind_every_finisher() {
        let mut roster = roster(10);
        // Make retirements near-certain for one team.
        roster.teams[0].reliability = 1.0;
        roster.teams[0].supplier = EngineSupplier::Kestrel;
        let ctx = context();
        let snapshot = CalibrationSnapshot::default();

        for seed in 0..50 {
            let outcome = run_trial(&roster, &ctx, &snapshot, seed).unwrap();
            let n = outcome.classification.len() as u32;
            for dnf in &outcome.dnfs {
                let (_, pos) = outcome
                    .classification
                    .iter()
                    .find(|(d, _)| d == dnf)
                    .unwrap();
                let finishers = n - outcome.dnfs.len() as u32;
                assert!(*pos > finishers, "DNF {dnf} classified P{pos}");
            }
        }
    }

    #[test]
    fn unknown_team_is_a_typed_error() {
        let mut roster = roster(4);
        roster.drivers[2].team = TeamId::new("phantom");
        let err = run_trial(&roster, &context(), &CalibrationSnapshot::default(), 1).unwrap_err();
        assert!(matches!(err, TrialError::UnknownTeam { .. }));
    }

    #[test]
    fn winning_time_absent_when_field_retires() {
        let mut roster = roster(3);
        for team in &mut roster.teams {
            team.reliability = 1.0;
            team.supplier = EngineSupplier::Kestrel;
        }
        let mut ctx = context();
        ctx.rain_probability = 1.0; // max DNF multiplier
        // Scan seeds for a trial where everyone retired.
        let snapshot = CalibrationSnapshot::default();
        let all_out = (0..400).find_map(|seed| {
            let o = run_trial(&roster, &ctx, &snapshot, seed).unwrap();
            (o.dnfs.len() == 3).then_some(o)
        });
        let outcome = all_out.expect("expected at least one all-DNF trial");
        assert_eq!(outcome.winning_time, None);
    }

    #[test]
    fn dominant_package_wins_most_trials() {
        let mut roster = roster(10);
        roster.drivers[0].rating = 99.0;
        roster.teams[0].car_rating = 99.0;
        for i in 1..10 {
            roster.drivers[i].rating = 70.0;
            roster.teams[i].car_rating = 70.0;
        }
        let ctx = context();
        let snapshot = CalibrationSnapshot::default();
        let star = roster.drivers[0].id.clone();

        let trials: u64 = 300;
        let star_wins = (0..trials)
            .filter(|&seed| {
                let outcome = run_trial(&roster, &ctx, &snapshot, seed).unwrap();
                outcome.classification[0].0 == star
            })
            .count();
        // A ~30s race-pace advantage should convert far more often than a
        // flat field's 10% baseline.
        assert!(
            star_wins * 3 > trials as usize,
            "dominant driver won only {star_wins}/{trials}"
        );
    }
}
