//! Weather scenarios and wet-pace modifiers.
//!
//! A trial draws exactly one scenario from the race-level rain probability;
//! the scenario then widens pace noise, inflates DNF risk, and tilts
//! overtaking for the whole trial.

use serde::{Deserialize, Serialize};

use crate::rng::TrialRng;

/// Share of the rain budget that resolves as light rain / full wet.
/// Whatever remains is a heavy-rain race.
const LIGHT_RAIN_SHARE: f64 = 0.50;
const WET_SHARE: f64 = 0.35;

/// Weather realization for one trial.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum WeatherScenario {
    Dry,
    LightRain,
    Wet,
    HeavyRain,
}

impl WeatherScenario {
    /// Draw a scenario from the race-level rain probability with a single
    /// uniform draw.
    pub fn draw(rain_probability: f64, rng: &mut TrialRng) -> Self {
        let p = rain_probability.clamp(0.0, 1.0);
        let roll = rng.uniform();
        if roll >= p {
            return WeatherScenario::Dry;
        }
        // Position within the rain budget decides severity.
        let severity = roll / p.max(1e-12);
        if severity < LIGHT_RAIN_SHARE {
            WeatherScenario::LightRain
        } else if severity < LIGHT_RAIN_SHARE + WET_SHARE {
            WeatherScenario::Wet
        } else {
            WeatherScenario::HeavyRain
        }
    }

    /// Multiplier on the Gaussian pace-noise width.
    pub fn pace_noise_factor(&self) -> f64 {
        match self {
            WeatherScenario::Dry => 1.0,
            WeatherScenario::LightRain => 1.4,
            WeatherScenario::Wet => 1.8,
            WeatherScenario::HeavyRain => 2.4,
        }
    }

    /// Multiplier on DNF probability.
    pub fn dnf_factor(&self) -> f64 {
        match self {
            WeatherScenario::Dry => 1.0,
            WeatherScenario::LightRain => 1.3,
            WeatherScenario::Wet => 1.6,
            WeatherScenario::HeavyRain => 2.2,
        }
    }

    /// Damping/boost on overtake probability. Light rain opens up grip
    /// offsets between cars; standing water shuts passing down.
    pub fn overtake_factor(&self) -> f64 {
        match self {
            WeatherScenario::Dry => 1.0,
            WeatherScenario::LightRain => 1.10,
            WeatherScenario::Wet => 0.85,
            WeatherScenario::HeavyRain => 0.70,
        }
    }

    /// Multiplier on lap-to-lap gap evolution: spray and grip variance make
    /// gaps move faster in the rain.
    pub fn gap_evolution_factor(&self) -> f64 {
        match self {
            WeatherScenario::Dry => 1.0,
            WeatherScenario::LightRain => 1.05,
            WeatherScenario::Wet => 1.15,
            WeatherScenario::HeavyRain => 1.25,
        }
    }

    pub fn is_wet(&self) -> bool {
        !matches!(self, WeatherScenario::Dry)
    }

    /// How much of the driver's wet skill applies under this scenario,
    /// 0 (dry, irrelevant) to 1 (fully wet).
    pub fn wet_skill_exposure(&self) -> f64 {
        match self {
            WeatherScenario::Dry => 0.0,
            WeatherScenario::LightRain => 0.5,
            WeatherScenario::Wet => 1.0,
            WeatherScenario::HeavyRain => 1.0,
        }
    }
}

/// Composite wet-pace boost from live weather parameters.
///
/// Cold track, wind, and high humidity all reward a strong wet-weather
/// driver beyond the raw skill number: the returned boost for a skilled
/// driver in genuinely bad conditions exceeds the wet skill itself.
pub fn wet_pace_boost(
    track_temp_c: f64,
    wind_kph: f64,
    humidity_pct: f64,
    rain_intensity: f64,
    wet_skill: f64,
) -> f64 {
    let cold_bonus = (25.0 - track_temp_c).max(0.0) * 0.002;
    let wind_bonus = wind_kph.max(0.0) * 0.0005;
    let humidity_bonus = (humidity_pct - 60.0).max(0.0) * 0.0004;
    let intensity_gain = rain_intensity.clamp(0.0, 1.0) * 0.04;
    wet_skill * (1.0 + intensity_gain) + cold_bonus + wind_bonus + humidity_bonus
}
