//! Aerodynamic interaction models: DRS, dirty air, slipstream, overtaking.
//!
//! Every effect is a pure function of the gap (in seconds) to the car
//! ahead. The combined overtake probability stacks several adjustments;
//! the final clamp to [0.005, 0.65] is the authoritative contract — the
//! intermediate terms are tuning, not guarantees.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::domain::{DriverId, TrackCategory};
use crate::models::weather::WeatherScenario;

// ─── DRS ─────────────────────────────────────────────────────────────

/// DRS arms only within this gap at the detection point, seconds.
pub const DRS_ACTIVATION_GAP: f64 = 1.0;

/// Ceiling on the total DRS-derived overtake probability.
pub const DRS_MAX_PROBABILITY: f64 = 0.55;

/// Top speed without the wing open, km/h.
const BASE_TOP_SPEED: f64 = 315.0;

/// Speed delta with DRS open, km/h.
const DRS_SPEED_BOOST: f64 = 15.0;

/// Probability contribution per km/h of closing speed, per zone.
const PER_ZONE_SPEED_FACTOR: f64 = 0.012;

/// Ceiling on a single zone's contribution.
const PER_ZONE_CAP: f64 = 0.20;

/// Extra probability for being right on the gearbox at the detection line.
const PROXIMITY_BONUS: f64 = 0.08;

/// Overtake probability contributed by DRS alone.
///
/// Zero outside the activation window. Within it, each zone contributes
/// proportionally to the attacker's closing speed (boosted top speed vs the
/// defender's unboosted one), plus a proximity bonus; the total is capped at
/// `DRS_MAX_PROBABILITY`.
pub fn drs_probability(gap_s: f64, drs_zones: u8) -> f64 {
    let gap = gap_s.max(0.0);
    if gap > DRS_ACTIVATION_GAP || drs_zones == 0 {
        return 0.0;
    }
    let attacker = BASE_TOP_SPEED + DRS_SPEED_BOOST;
    let closing_speed = attacker - BASE_TOP_SPEED;
    let per_zone = (closing_speed * PER_ZONE_SPEED_FACTOR).min(PER_ZONE_CAP);
    let proximity = (1.0 - gap / DRS_ACTIVATION_GAP) * PROXIMITY_BONUS;
    (drs_zones as f64 * per_zone + proximity).min(DRS_MAX_PROBABILITY)
}

// ─── Dirty air ───────────────────────────────────────────────────────

/// Full dirty-air penalty applies below this gap, seconds.
pub const DIRTY_AIR_NEAR: f64 = 0.5;

/// No dirty-air penalty beyond this gap, seconds.
pub const DIRTY_AIR_FAR: f64 = 2.5;

/// Maximum dirty-air pace penalty, s/lap.
pub const DIRTY_AIR_MAX_PENALTY: f64 = 0.35;

/// Pace penalty from running in turbulent air, s/lap.
///
/// Maximal inside `DIRTY_AIR_NEAR`, linear falloff to zero at
/// `DIRTY_AIR_FAR`.
pub fn dirty_air_penalty(gap_s: f64) -> f64 {
    let gap = gap_s.max(0.0);
    if gap <= DIRTY_AIR_NEAR {
        DIRTY_AIR_MAX_PENALTY
    } else if gap >= DIRTY_AIR_FAR {
        0.0
    } else {
        DIRTY_AIR_MAX_PENALTY * (DIRTY_AIR_FAR - gap) / (DIRTY_AIR_FAR - DIRTY_AIR_NEAR)
    }
}

// ─── Slipstream ──────────────────────────────────────────────────────

/// Gap at which the tow is strongest, seconds.
pub const SLIPSTREAM_PEAK_GAP: f64 = 0.8;

/// No tow beyond this gap, seconds.
pub const SLIPSTREAM_OUTER: f64 = 1.5;

/// Maximum straight-line pace benefit, s/lap.
pub const SLIPSTREAM_MAX_GAIN: f64 = 0.25;

/// Straight-line pace benefit from the tow, s/lap.
///
/// Rises linearly from zero gap to the peak at `SLIPSTREAM_PEAK_GAP`, then
/// falls back to zero at `SLIPSTREAM_OUTER`.
pub fn slipstream_gain(gap_s: f64) -> f64 {
    let gap = gap_s.max(0.0);
    if gap <= SLIPSTREAM_PEAK_GAP {
        SLIPSTREAM_MAX_GAIN * gap / SLIPSTREAM_PEAK_GAP
    } else if gap >= SLIPSTREAM_OUTER {
        0.0
    } else {
        SLIPSTREAM_MAX_GAIN * (SLIPSTREAM_OUTER - gap) / (SLIPSTREAM_OUTER - SLIPSTREAM_PEAK_GAP)
    }
}

// ─── Combined overtake probability ───────────────────────────────────

/// Floor on per-lap overtake probability: nothing is impossible.
pub const OVERTAKE_MIN: f64 = 0.005;

/// Ceiling on per-lap overtake probability.
pub const OVERTAKE_MAX: f64 = 0.65;

/// Attacker advantage per second of pace delta.
const PACE_DELTA_FACTOR: f64 = 0.30;

/// Cap on the pace-delta term before the multiplicative stack.
const PACE_DELTA_CAP: f64 = 0.25;

/// Gap inside which a flat proximity bonus applies, seconds.
const CLOSE_COMBAT_GAP: f64 = 0.3;
const CLOSE_COMBAT_BONUS: f64 = 0.05;

/// Probability per lap of tire-age advantage, capped.
const TIRE_AGE_FACTOR: f64 = 0.004;
const TIRE_AGE_CAP: f64 = 0.08;

/// Fraction of the race distance that counts as the closing laps.
const DESPERATION_WINDOW: f64 = 0.1;
const DESPERATION_BOOST: f64 = 1.15;

/// Inputs to the combined overtake-probability model.
#[derive(Debug, Clone, Copy)]
pub struct OvertakeInputs {
    /// Attacker's pace advantage over the defender, s/lap. Negative values
    /// contribute nothing.
    pub pace_delta: f64,
    /// Gap to the defender, seconds.
    pub gap_s: f64,
    pub drs_zones: u8,
    pub track: TrackCategory,
    /// Defender tire age minus attacker tire age, laps. Positive means the
    /// attacker is on fresher rubber.
    pub tire_age_advantage: i32,
    pub weather: WeatherScenario,
    /// Defender's current position, 1-based. Leaders defend harder.
    pub defender_position: u32,
    /// Attacker aggression trait, clamped to 0.7–1.3.
    pub attacker_aggression: f64,
    /// Defender defensive-strength trait, clamped to 0.8–1.2.
    pub defender_defence: f64,
    pub laps_remaining: u32,
    pub total_laps: u32,
}

/// Position-importance weighting: leaders defend hardest, backmarkers
/// yield more readily.
fn position_importance(defender_position: u32) -> f64 {
    match defender_position {
        0 | 1 => 0.85,
        2..=3 => 0.92,
        4..=10 => 1.0,
        _ => 1.08,
    }
}

/// Per-lap probability that the attacker gets past.
///
/// Additive terms (pace delta, DRS, close-combat bonus, tire age) feed a
/// multiplicative stack (track, weather, position importance, aggression,
/// defence, desperation). The result is clamped to
/// [`OVERTAKE_MIN`, `OVERTAKE_MAX`].
pub fn overtake_probability(i: &OvertakeInputs) -> f64 {
    let mut p = (i.pace_delta.max(0.0) * PACE_DELTA_FACTOR).min(PACE_DELTA_CAP);
    p += drs_probability(i.gap_s, i.drs_zones);
    if i.gap_s.max(0.0) < CLOSE_COMBAT_GAP {
        p += CLOSE_COMBAT_BONUS;
    }
    p += (i.tire_age_advantage.max(0) as f64 * TIRE_AGE_FACTOR).min(TIRE_AGE_CAP);

    p *= i.track.overtake_factor();
    p *= i.weather.overtake_factor();
    p *= position_importance(i.defender_position);
    p *= i.attacker_aggression.clamp(0.7, 1.3);
    p /= i.defender_defence.clamp(0.8, 1.2);

    if i.total_laps > 0 {
        let remaining_frac = i.laps_remaining as f64 / i.total_laps as f64;
        if remaining_frac <= DESPERATION_WINDOW {
            p *= DESPERATION_BOOST;
        }
    }

    p.clamp(OVERTAKE_MIN, OVERTAKE_MAX)
}

/// Change in the gap to the car ahead over one lap, seconds.
///
/// `pace_delta` is the follower's pace advantage (positive = closing).
/// Dirty air pushes the follower back, the tow pulls it forward; weather
/// amplifies gap movement.
pub fn gap_delta_per_lap(pace_delta: f64, gap_s: f64, weather: WeatherScenario) -> f64 {
    (-pace_delta + dirty_air_penalty(gap_s) - slipstream_gain(gap_s)) * weather.gap_evolution_factor()
}

// ─── Battle tracker ──────────────────────────────────────────────────

/// Proximity window for counting a lap as "in battle", seconds.
pub const BATTLE_PROXIMITY: f64 = 1.5;

/// Running statistics for one driver pair.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BattleStats {
    pub laps_in_proximity: u32,
    pub closest_gap: f64,
}

/// Observability aid: per unordered driver pair, how long they ran in
/// proximity and how close they got. Not consulted by the simulation
/// itself.
#[derive(Debug, Clone, Default)]
pub struct BattleTracker {
    battles: HashMap<(DriverId, DriverId), BattleStats>,
}

impl BattleTracker {
    pub fn new() -> Self {
        Self::default()
    }

    fn key(a: &DriverId, b: &DriverId) -> (DriverId, DriverId) {
        if a <= b {
            (a.clone(), b.clone())
        } else {
            (b.clone(), a.clone())
        }
    }

    /// Record one lap's gap between two drivers.
    pub fn observe(&mut self, a: &DriverId, b: &DriverId, gap_s: f64) {
        let gap = gap_s.abs();
        let entry = self.battles.entry(Self::key(a, b)).or_insert(BattleStats {
            laps_in_proximity: 0,
            closest_gap: f64::INFINITY,
        });
        if gap <= BATTLE_PROXIMITY {
            entry.laps_in_proximity += 1;
        }
        if gap < entry.closest_gap {
            entry.closest_gap = gap;
        }
    }

    /// Stats for a pair, in either order.
    pub fn stats(&self, a: &DriverId, b: &DriverId) -> Option<&BattleStats> {
        self.battles.get(&Self::key(a, b))
    }

    pub fn iter(&self) -> impl Iterator<Item = (&(DriverId, DriverId), &BattleStats)> {
        self.battles.iter()
    }
}
