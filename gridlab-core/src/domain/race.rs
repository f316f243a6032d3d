//! Race context and roster snapshot.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use super::driver::Driver;
use super::ids::{DriverId, RaceId, TeamId};
use super::team::Team;

/// Track archetype, driving the overtake-difficulty damping.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TrackCategory {
    /// Narrow, walls close, passing very hard.
    Street,
    /// Conventional permanent circuit.
    Permanent,
    /// Long straights, heavy slipstream traffic.
    HighSpeed,
    /// Twisty, aero-sensitive, hard to follow.
    Technical,
}

impl TrackCategory {
    /// Damping multiplier on overtake probability.
    pub fn overtake_factor(&self) -> f64 {
        match self {
            TrackCategory::Street => 0.55,
            TrackCategory::Permanent => 1.0,
            TrackCategory::HighSpeed => 1.15,
            TrackCategory::Technical => 0.80,
        }
    }
}

/// Track surface abrasiveness band.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DegradationCategory {
    Low,
    Medium,
    High,
    Severe,
}

impl DegradationCategory {
    /// Multiplier on tire pace loss. Bounds 0.70–1.35 are part of the tire
    /// model contract.
    pub fn tire_multiplier(&self) -> f64 {
        match self {
            DegradationCategory::Low => 0.70,
            DegradationCategory::Medium => 0.95,
            DegradationCategory::High => 1.15,
            DegradationCategory::Severe => 1.35,
        }
    }
}

/// Everything the simulator needs to know about one race weekend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RaceContext {
    pub race_id: RaceId,
    /// Season round, 1-based. Feeds the development curve.
    pub round: u32,
    pub total_laps: u32,
    pub category: TrackCategory,
    /// Probability of at least one safety-car period, 0–1.
    pub safety_car_probability: f64,
    /// Probability the race is affected by rain, 0–1.
    pub rain_probability: f64,
    pub track_temp_c: f64,
    pub degradation: DegradationCategory,
    pub drs_zones: u8,
}

/// Roster snapshot: the drivers and teams entered for one race.
///
/// Ratings come from external collaborators; the core never invents a value
/// for a missing one.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Roster {
    pub drivers: Vec<Driver>,
    pub teams: Vec<Team>,
}

impl Roster {
    pub fn new(drivers: Vec<Driver>, teams: Vec<Team>) -> Self {
        Self { drivers, teams }
    }

    pub fn is_empty(&self) -> bool {
        self.drivers.is_empty()
    }

    pub fn len(&self) -> usize {
        self.drivers.len()
    }

    /// Team lookup keyed by id. Built once per batch, not per trial.
    pub fn team_index(&self) -> HashMap<&TeamId, &Team> {
        self.teams.iter().map(|t| (&t.id, t)).collect()
    }

    pub fn driver(&self, id: &DriverId) -> Option<&Driver> {
        self.drivers.iter().find(|d| &d.id == id)
    }

    /// First driver whose team is missing from the team list, if any.
    pub fn find_unknown_team(&self) -> Option<(&DriverId, &TeamId)> {
        let index = self.team_index();
        self.drivers
            .iter()
            .find(|d| !index.contains_key(&d.team))
            .map(|d| (&d.id, &d.team))
    }
}
