//! Property tests for model clamp invariants.
//!
//! The documented clamp ranges are the authoritative contract of the
//! sub-models: whatever the inputs, outputs must land inside them.

use proptest::prelude::*;

use gridlab_core::domain::{DegradationCategory, TrackCategory};
use gridlab_core::models::aero::{
    dirty_air_penalty, drs_probability, overtake_probability, slipstream_gain,
    DIRTY_AIR_MAX_PENALTY, DRS_MAX_PROBABILITY, OVERTAKE_MAX, OVERTAKE_MIN, SLIPSTREAM_MAX_GAIN,
};
use gridlab_core::models::fuel::{pace_gain, remaining_fuel, MAX_LAP_GAIN};
use gridlab_core::models::tire::{optimal_stint_length, pace_loss, MAX_PACE_LOSS, MAX_STINT_LAPS};
use gridlab_core::models::{OvertakeInputs, TireCompound, WeatherScenario};
use gridlab_core::rng::TrialRng;
use gridlab_core::stats::{confidence_bands, validate_distribution, win_probability_interval};

// ── Strategies ───────────────────────────────────────────────────────

fn arb_compound() -> impl Strategy<Value = TireCompound> {
    prop_oneof![
        Just(TireCompound::Soft),
        Just(TireCompound::Medium),
        Just(TireCompound::Hard),
        Just(TireCompound::Intermediate),
        Just(TireCompound::Wet),
    ]
}

fn arb_degradation() -> impl Strategy<Value = DegradationCategory> {
    prop_oneof![
        Just(DegradationCategory::Low),
        Just(DegradationCategory::Medium),
        Just(DegradationCategory::High),
        Just(DegradationCategory::Severe),
    ]
}

fn arb_track() -> impl Strategy<Value = TrackCategory> {
    prop_oneof![
        Just(TrackCategory::Street),
        Just(TrackCategory::Permanent),
        Just(TrackCategory::HighSpeed),
        Just(TrackCategory::Technical),
    ]
}

fn arb_weather() -> impl Strategy<Value = WeatherScenario> {
    prop_oneof![
        Just(WeatherScenario::Dry),
        Just(WeatherScenario::LightRain),
        Just(WeatherScenario::Wet),
        Just(WeatherScenario::HeavyRain),
    ]
}

// ── Tire model ───────────────────────────────────────────────────────

proptest! {
    /// Tire pace loss stays in [0, 0.4] s/lap for any input, including
    /// hostile temperatures and negative fuel.
    #[test]
    fn tire_loss_respects_ceiling(
        compound in arb_compound(),
        laps in 0u32..300,
        temp in -100.0..150.0f64,
        smoothness in 0.0..5.0f64,
        degradation in arb_degradation(),
        fuel in -200.0..500.0f64,
    ) {
        let loss = pace_loss(compound, laps, temp, smoothness, degradation, fuel);
        prop_assert!((0.0..=MAX_PACE_LOSS).contains(&loss), "loss {loss}");
    }

    /// The stint scan always lands in 1..=60.
    #[test]
    fn stint_length_is_bounded(
        compound in arb_compound(),
        temp in -20.0..70.0f64,
        smoothness in 0.5..1.5f64,
        degradation in arb_degradation(),
        fuel in 0.0..120.0f64,
    ) {
        let stint = optimal_stint_length(compound, temp, smoothness, degradation, fuel);
        prop_assert!((1..=MAX_STINT_LAPS).contains(&stint));
    }
}

// ── Fuel model ───────────────────────────────────────────────────────

proptest! {
    /// Fuel never goes negative and pace gain never exceeds its cap.
    #[test]
    fn fuel_state_is_bounded(
        lap in 0u32..400,
        total in 1u32..100,
        sc_laps in 0u32..400,
        wet in any::<bool>(),
    ) {
        let fuel = remaining_fuel(lap, total, sc_laps, wet);
        prop_assert!(fuel >= 0.0);
        let gain = pace_gain(lap, total, sc_laps, wet);
        prop_assert!((0.0..=MAX_LAP_GAIN).contains(&gain));
    }

    /// More laps at equal conditions never reduces the fuel-burn gain.
    #[test]
    fn fuel_gain_is_monotonic(
        lap in 0u32..99,
        total in 1u32..100,
        wet in any::<bool>(),
    ) {
        let now = pace_gain(lap, total, 0, wet);
        let later = pace_gain(lap + 1, total, 0, wet);
        prop_assert!(later >= now);
    }
}

// ── Aero / overtaking ────────────────────────────────────────────────

proptest! {
    /// DRS probability never exceeds 0.55, for any gap and zone count.
    #[test]
    fn drs_respects_cap(gap in -2.0..10.0f64, zones in 0u8..12) {
        let p = drs_probability(gap, zones);
        prop_assert!((0.0..=DRS_MAX_PROBABILITY).contains(&p));
    }

    /// Dirty air and slipstream stay inside their documented maxima.
    #[test]
    fn gap_effects_are_bounded(gap in -5.0..20.0f64) {
        let dirty = dirty_air_penalty(gap);
        prop_assert!((0.0..=DIRTY_AIR_MAX_PENALTY).contains(&dirty));
        let tow = slipstream_gain(gap);
        prop_assert!((0.0..=SLIPSTREAM_MAX_GAIN).contains(&tow));
    }

    /// The combined overtake probability lands in [0.005, 0.65] no matter
    /// how hostile the multiplicative stack's inputs are.
    #[test]
    fn overtake_probability_respects_contract(
        pace_delta in -20.0..20.0f64,
        gap in -1.0..15.0f64,
        zones in 0u8..6,
        track in arb_track(),
        tire_age in -60i32..60,
        weather in arb_weather(),
        position in 0u32..25,
        aggression in 0.0..5.0f64,
        defence in 0.0..5.0f64,
        laps_remaining in 0u32..80,
        total_laps in 1u32..80,
    ) {
        let p = overtake_probability(&OvertakeInputs {
            pace_delta,
            gap_s: gap,
            drs_zones: zones,
            track,
            tire_age_advantage: tire_age,
            weather,
            defender_position: position,
            attacker_aggression: aggression,
            defender_defence: defence,
            laps_remaining,
            total_laps,
        });
        prop_assert!((OVERTAKE_MIN..=OVERTAKE_MAX).contains(&p), "p {p}");
    }
}

// ── RNG ──────────────────────────────────────────────────────────────

proptest! {
    /// Gaussian draws are finite for every seed and width.
    #[test]
    fn normal_draws_are_finite(seed in any::<u64>(), std_dev in 0.0..100.0f64) {
        let mut rng = TrialRng::new(seed);
        for _ in 0..64 {
            prop_assert!(rng.normal(0.0, std_dev).is_finite());
        }
    }

    /// Uniform draws stay in [0, 1) for every seed.
    #[test]
    fn uniform_draws_stay_in_unit_interval(seed in any::<u64>()) {
        let mut rng = TrialRng::new(seed);
        for _ in 0..64 {
            let u = rng.uniform();
            prop_assert!((0.0..1.0).contains(&u));
        }
    }
}

// ── Statistics ───────────────────────────────────────────────────────

proptest! {
    /// Confidence bands are always nested around the mean.
    #[test]
    fn bands_are_nested(values in prop::collection::vec(-1000.0..1000.0f64, 1..200)) {
        let report = confidence_bands(&values).unwrap();
        prop_assert!(report.band_95.contains(&report.band_68));
        prop_assert!(report.band_99.contains(&report.band_95));
    }

    /// Validator moments are finite for any non-empty bounded sample.
    #[test]
    fn validator_moments_are_finite(values in prop::collection::vec(-1e6..1e6f64, 1..200)) {
        let stats = validate_distribution(&values).unwrap();
        prop_assert!(stats.mean.is_finite());
        prop_assert!(stats.variance.is_finite() && stats.variance >= 0.0);
        prop_assert!(stats.skewness.is_finite());
        prop_assert!(stats.kurtosis.is_finite());
    }

    /// Win-probability intervals always live inside [0, 1].
    #[test]
    fn win_interval_stays_in_probability_space(p in -1.0..2.0f64, n in 1u32..100_000) {
        let band = win_probability_interval(p, n).unwrap();
        prop_assert!(band.lower >= 0.0);
        prop_assert!(band.upper <= 1.0);
        prop_assert!(band.lower <= band.upper);
    }
}
