//! Pace composition: one lap-time-like scalar per driver per trial.
//!
//! Combines driver/car/track strength under an injected weight split with
//! the sub-model deltas and a Gaussian noise term. Weights come either from
//! the fixed default split or from the regression learner once it has seen
//! enough races; the model itself never reaches for ambient calibration
//! state.

use serde::{Deserialize, Serialize};

use crate::rng::TrialRng;

/// Reference lap time the composed strength is spread around, seconds.
const BASE_LAP_TIME: f64 = 90.0;

/// Lap-time spread between a 0-rated and a 100-rated package, seconds.
const PERFORMANCE_SPREAD: f64 = 2.5;

/// Width of the per-trial Gaussian pace noise in dry conditions, seconds.
const PACE_NOISE_STD: f64 = 0.25;

/// Neutral prior for an unspecified track affinity (0–1 scale).
pub const NEUTRAL_AFFINITY: f64 = 0.5;

/// Ceiling on the calibration adjustment magnitude.
pub const ADJUSTMENT_CEILING: f64 = 0.03;

/// Relative importance of driver, car, and track strength.
///
/// Always normalized so the three components sum to 1.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PaceWeights {
    pub driver: f64,
    pub car: f64,
    pub track: f64,
}

impl PaceWeights {
    /// Build a weight split, normalizing to sum 1. Non-positive totals fall
    /// back to the default split.
    pub fn new(driver: f64, car: f64, track: f64) -> Self {
        let total = driver + car + track;
        if !(total > 0.0) || !total.is_finite() {
            return Self::default();
        }
        Self {
            driver: driver / total,
            car: car / total,
            track: track / total,
        }
    }
}

impl Default for PaceWeights {
    /// The hand-tuned default split used until the regression learner has
    /// enough data to override it.
    fn default() -> Self {
        Self {
            driver: 0.40,
            car: 0.42,
            track: 0.18,
        }
    }
}

/// Everything the composition needs for one driver in one trial.
///
/// Callers supply valid ratings; the model does not invent values for
/// missing ones, except for the documented neutral affinity prior.
#[derive(Debug, Clone, Copy)]
pub struct PaceInputs {
    /// Driver rating, 0–100 (development curve already applied).
    pub driver_rating: f64,
    /// Car rating, 0–100.
    pub car_rating: f64,
    /// Track affinity, 0–1. `None` uses `NEUTRAL_AFFINITY`.
    pub track_affinity: Option<f64>,
    /// Weather-adjusted skill multiplier (1.0 in the dry).
    pub weather_skill: f64,
    /// Calibration adjustment from observed results, clamped to ±3%.
    pub calibration_adjustment: f64,
    /// Tire pace loss at the representative stint age, s/lap.
    pub tire_delta: f64,
    /// Fuel-burn pace gain at the representative lap, s/lap.
    pub fuel_delta: f64,
    /// Aerodynamic penalty/benefit, s/lap.
    pub aero_delta: f64,
    /// Noise width multiplier from the weather scenario.
    pub noise_scale: f64,
}

/// Compose one pace scalar. Lower is faster; the result is finite for every
/// valid input (all terms are clamped before they combine).
pub fn compose(inputs: &PaceInputs, weights: &PaceWeights, rng: &mut TrialRng) -> f64 {
    let driver = (inputs.driver_rating / 100.0).clamp(0.0, 1.0);
    let car = (inputs.car_rating / 100.0).clamp(0.0, 1.0);
    let track = inputs
        .track_affinity
        .unwrap_or(NEUTRAL_AFFINITY)
        .clamp(0.0, 1.0);

    let strength = weights.driver * driver + weights.car * car + weights.track * track;
    let skill = strength * inputs.weather_skill.clamp(0.5, 1.5);
    let adjusted = skill
        * (1.0
            + inputs
                .calibration_adjustment
                .clamp(-ADJUSTMENT_CEILING, ADJUSTMENT_CEILING));

    let noise = rng.normal(0.0, PACE_NOISE_STD * inputs.noise_scale.clamp(0.0, 10.0));

    BASE_LAP_TIME - adjusted * PERFORMANCE_SPREAD + inputs.tire_delta - inputs.fuel_delta
        + inputs.aero_delta
        + noise
}
