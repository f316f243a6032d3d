//! Serializable run configuration.
//!
//! A TOML file describes one prediction run: race context, roster tables,
//! trial count, and master seed. The content fingerprint ties exported
//! results back to the exact configuration that produced them.

use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use gridlab_core::domain::{
    DegradationCategory, DevelopmentProfile, Driver, DriverId, DriverTraits, EngineSupplier,
    RaceContext, RaceId, Roster, Team, TeamId, TrackCategory,
};

use crate::worker::BatchRequest;
use gridlab_core::sim::CalibrationSnapshot;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("invalid config: {0}")]
    Validation(String),
}

/// Complete configuration for one simulation run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimConfig {
    pub race: RaceSection,
    #[serde(default)]
    pub simulation: SimulationSection,
    pub teams: Vec<TeamSection>,
    pub drivers: Vec<DriverSection>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RaceSection {
    pub id: String,
    pub round: u32,
    pub laps: u32,
    pub category: TrackCategory,
    pub safety_car_probability: f64,
    pub rain_probability: f64,
    pub track_temp_c: f64,
    pub degradation: DegradationCategory,
    pub drs_zones: u8,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimulationSection {
    #[serde(default = "default_trials")]
    pub trials: u32,
    #[serde(default = "default_master_seed")]
    pub master_seed: u64,
}

impl Default for SimulationSection {
    fn default() -> Self {
        Self {
            trials: default_trials(),
            master_seed: default_master_seed(),
        }
    }
}

fn default_trials() -> u32 {
    2_000
}

fn default_master_seed() -> u64 {
    42
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TeamSection {
    pub id: String,
    pub car_rating: f64,
    pub reliability: f64,
    #[serde(default = "default_supplier")]
    pub supplier: EngineSupplier,
}

fn default_supplier() -> EngineSupplier {
    EngineSupplier::Other
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DriverSection {
    pub id: String,
    pub team: String,
    pub rating: f64,
    #[serde(default = "default_multiplier")]
    pub wet_skill: f64,
    #[serde(default = "default_multiplier")]
    pub aggression: f64,
    #[serde(default = "default_multiplier")]
    pub tire_smoothness: f64,
    #[serde(default = "default_multiplier")]
    pub mistake_rate: f64,
    #[serde(default = "default_multiplier")]
    pub defence: f64,
    #[serde(default = "default_development")]
    pub development: DevelopmentProfile,
    #[serde(default)]
    pub track_affinity: Option<f64>,
}

fn default_multiplier() -> f64 {
    1.0
}

fn default_development() -> DevelopmentProfile {
    DevelopmentProfile::Prime
}

impl SimConfig {
    /// Load and validate a TOML config file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path)?;
        Self::parse(&text)
    }

    /// Parse and validate TOML text.
    pub fn parse(text: &str) -> Result<Self, ConfigError> {
        let config: SimConfig = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.race.laps == 0 {
            return Err(ConfigError::Validation("race.laps must be > 0".into()));
        }
        if self.drivers.is_empty() {
            return Err(ConfigError::Validation("no drivers configured".into()));
        }
        if self.teams.is_empty() {
            return Err(ConfigError::Validation("no teams configured".into()));
        }
        for p in [
            self.race.safety_car_probability,
            self.race.rain_probability,
        ] {
            if !(0.0..=1.0).contains(&p) {
                return Err(ConfigError::Validation(format!(
                    "probability {p} outside [0, 1]"
                )));
            }
        }
        for team in &self.teams {
            if !(0.0..=100.0).contains(&team.car_rating) {
                return Err(ConfigError::Validation(format!(
                    "team '{}' car_rating outside 0-100",
                    team.id
                )));
            }
        }
        for driver in &self.drivers {
            if !(0.0..=100.0).contains(&driver.rating) {
                return Err(ConfigError::Validation(format!(
                    "driver '{}' rating outside 0-100",
                    driver.id
                )));
            }
            if !self.teams.iter().any(|t| t.id == driver.team) {
                return Err(ConfigError::Validation(format!(
                    "driver '{}' references unknown team '{}'",
                    driver.id, driver.team
                )));
            }
        }
        Ok(())
    }

    /// Deterministic content fingerprint (hex BLAKE3 of the canonical JSON
    /// serialization).
    pub fn fingerprint(&self) -> String {
        let json = serde_json::to_string(self).expect("SimConfig must serialize");
        blake3::hash(json.as_bytes()).to_hex().to_string()
    }

    pub fn race_context(&self) -> RaceContext {
        RaceContext {
            race_id: RaceId::new(self.race.id.clone()),
            round: self.race.round,
            total_laps: self.race.laps,
            category: self.race.category,
            safety_car_probability: self.race.safety_car_probability,
            rain_probability: self.race.rain_probability,
            track_temp_c: self.race.track_temp_c,
            degradation: self.race.degradation,
            drs_zones: self.race.drs_zones,
        }
    }

    pub fn roster(&self) -> Roster {
        let teams = self
            .teams
            .iter()
            .map(|t| Team {
                id: TeamId::new(t.id.clone()),
                car_rating: t.car_rating,
                reliability: t.reliability,
                supplier: t.supplier,
            })
            .collect();
        let drivers = self
            .drivers
            .iter()
            .map(|d| Driver {
                id: DriverId::new(d.id.clone()),
                team: TeamId::new(d.team.clone()),
                rating: d.rating,
                wet_skill: d.wet_skill,
                traits: DriverTraits {
                    aggression: d.aggression,
                    tire_smoothness: d.tire_smoothness,
                    mistake_rate: d.mistake_rate,
                    defence: d.defence,
                },
                development: d.development,
                track_affinity: d.track_affinity,
            })
            .collect();
        Roster::new(drivers, teams)
    }

    /// Assemble the worker request for this config with the given
    /// calibration snapshot.
    pub fn to_request(&self, snapshot: CalibrationSnapshot) -> BatchRequest {
        BatchRequest {
            roster: self.roster(),
            context: self.race_context(),
            snapshot,
            trials: self.simulation.trials,
            master_seed: self.simulation.master_seed,
        }
    }
}
