//! Tire degradation model.
//!
//! Soft compounds fall off exponentially with stint age; every other
//! compound degrades linearly. The raw curve is then scaled by track
//! temperature, surface abrasiveness, driver smoothness, a fixed
//! narrow-tire overheating factor, and fuel load. The final clamp to
//! [0, 0.4] s/lap is a realism ceiling and part of the model contract,
//! not a consequence of the formula.

use serde::{Deserialize, Serialize};

use crate::domain::DegradationCategory;

/// Hard ceiling on per-lap pace loss, seconds.
pub const MAX_PACE_LOSS: f64 = 0.4;

/// A stint is over once pace loss crosses this threshold, seconds.
pub const STINT_LOSS_THRESHOLD: f64 = 0.35;

/// Upper bound for the stint-length scan.
pub const MAX_STINT_LAPS: u32 = 60;

/// Sensitivity of degradation to track-temperature deviation, per °C.
const TEMP_SENSITIVITY: f64 = 0.015;

/// Current-generation tires run narrow shoulders and overheat readily;
/// applied uniformly to all compounds.
const NARROW_TIRE_OVERHEAT: f64 = 1.08;

/// Fuel mass divisor: a full tank roughly +20% wear.
const FUEL_LOAD_DIVISOR: f64 = 500.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TireCompound {
    Soft,
    Medium,
    Hard,
    Intermediate,
    Wet,
}

impl TireCompound {
    /// Pace loss on the out-lap, seconds.
    fn base_loss(&self) -> f64 {
        match self {
            TireCompound::Soft => 0.08,
            TireCompound::Medium => 0.05,
            TireCompound::Hard => 0.035,
            TireCompound::Intermediate => 0.06,
            TireCompound::Wet => 0.07,
        }
    }

    /// Exponential decay constant in laps (soft only).
    fn decay_constant(&self) -> f64 {
        12.0
    }

    /// Linear wear per lap, seconds (all non-soft compounds).
    fn linear_factor(&self) -> f64 {
        match self {
            TireCompound::Soft => 0.0,
            TireCompound::Medium => 0.012,
            TireCompound::Hard => 0.008,
            TireCompound::Intermediate => 0.015,
            TireCompound::Wet => 0.018,
        }
    }

    /// Track temperature at which the compound works best, °C.
    fn optimal_temp(&self) -> f64 {
        match self {
            TireCompound::Soft => 30.0,
            TireCompound::Medium => 35.0,
            TireCompound::Hard => 40.0,
            TireCompound::Intermediate => 22.0,
            TireCompound::Wet => 18.0,
        }
    }
}

/// Per-lap pace loss in seconds for a tire of the given stint age.
///
/// Out-of-range inputs clamp rather than error: negative fuel is treated as
/// an empty tank, smoothness is pinned to its physical band, and the result
/// always lands in [0, `MAX_PACE_LOSS`].
pub fn pace_loss(
    compound: TireCompound,
    laps_on_tire: u32,
    track_temp_c: f64,
    smoothness: f64,
    degradation: DegradationCategory,
    fuel_mass_kg: f64,
) -> f64 {
    let laps = laps_on_tire as f64;
    let raw = match compound {
        TireCompound::Soft => compound.base_loss() * (laps / compound.decay_constant()).exp(),
        _ => compound.base_loss() + laps * compound.linear_factor(),
    };

    let temp_factor = (1.0 + (track_temp_c - compound.optimal_temp()) * TEMP_SENSITIVITY).max(0.2);
    let smoothness = smoothness.clamp(0.85, 1.15);
    let fuel_factor = 1.0 + fuel_mass_kg.max(0.0) / FUEL_LOAD_DIVISOR;

    let loss = raw
        * temp_factor
        * degradation.tire_multiplier()
        * (1.0 / smoothness)
        * NARROW_TIRE_OVERHEAT
        * fuel_factor;

    loss.clamp(0.0, MAX_PACE_LOSS)
}

/// Longest stint before pace loss crosses `STINT_LOSS_THRESHOLD`.
///
/// Scans increasing lap counts and returns the last lap still under the
/// threshold, capped at `MAX_STINT_LAPS`.
pub fn optimal_stint_length(
    compound: TireCompound,
    track_temp_c: f64,
    smoothness: f64,
    degradation: DegradationCategory,
    fuel_mass_kg: f64,
) -> u32 {
    for laps in 1..=MAX_STINT_LAPS {
        let loss = pace_loss(
            compound,
            laps,
            track_temp_c,
            smoothness,
            degradation,
            fuel_mass_kg,
        );
        if loss > STINT_LOSS_THRESHOLD {
            return laps.saturating_sub(1).max(1);
        }
    }
    MAX_STINT_LAPS
}
