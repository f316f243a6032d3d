//! Component failure / retirement probability.

use crate::domain::Team;
use crate::models::weather::WeatherScenario;

/// Ceiling on per-race DNF probability; even a fragile car in a monsoon
/// usually finishes.
pub const MAX_DNF_PROBABILITY: f64 = 0.35;

/// Per-race probability that the car does not finish.
///
/// Base team reliability × supplier failure multiplier × weather multiplier
/// × driver mistake-rate trait, clamped to [0, `MAX_DNF_PROBABILITY`].
pub fn dnf_probability(team: &Team, weather: WeatherScenario, mistake_rate: f64) -> f64 {
    let base = team.reliability.clamp(0.0, 1.0);
    let p = base
        * team.supplier.failure_multiplier()
        * weather.dnf_factor()
        * mistake_rate.clamp(0.5, 2.0);
    p.clamp(0.0, MAX_DNF_PROBABILITY)
}
