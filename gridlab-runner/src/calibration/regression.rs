//! Online gradient-descent pace-weight learner.
//!
//! Maintains a fixed eight-feature vector per race result, normalized to
//! [0, 1] with configurable bounds, and a weight vector + bias trained by
//! shuffled-epoch stochastic gradient descent with L2 regularization over a
//! rolling window of the most recent results. Once enough examples have
//! accumulated, the learned driver/car/track importance ratios override the
//! pace model's default weight split; below the threshold the learner
//! reports an explicit insufficient-data status instead.

use std::collections::VecDeque;

use rand::seq::SliceRandom;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};

use gridlab_core::models::PaceWeights;

pub const FEATURE_COUNT: usize = 8;

/// Rolling training window: the most recent examples only.
pub const MAX_WINDOW: usize = 500;

/// Minimum examples before the learned split overrides the default.
pub const MIN_EXAMPLES: usize = 20;

const EPOCHS: usize = 30;
const LEARNING_RATE: f64 = 0.05;
const L2_PENALTY: f64 = 1e-4;

/// Feature names, in vector order.
pub const FEATURE_NAMES: [&str; FEATURE_COUNT] = [
    "driver_rating",
    "team_rating",
    "track_affinity",
    "grid_position",
    "weather_skill",
    "tire_management",
    "form_momentum",
    "rating_score",
];

/// Normalization bounds for the raw feature values.
///
/// The ranges are empirically chosen (notably the 1200–1800 rating-system
/// window) and unverified against ground truth, so they are configuration
/// rather than constants.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FeatureBounds {
    pub rating_min: f64,
    pub rating_max: f64,
    /// Deepest grid slot expected; slot 1 normalizes to 1.0, this to 0.0.
    pub grid_max: f64,
    /// Band for the skill-multiplier features (weather, tire management).
    pub skill_min: f64,
    pub skill_max: f64,
    /// Band for the form-momentum trend.
    pub form_min: f64,
    pub form_max: f64,
    /// Rating-system score window.
    pub score_min: f64,
    pub score_max: f64,
}

impl Default for FeatureBounds {
    fn default() -> Self {
        Self {
            rating_min: 0.0,
            rating_max: 100.0,
            grid_max: 20.0,
            skill_min: 0.8,
            skill_max: 1.3,
            form_min: -1.0,
            form_max: 1.0,
            score_min: 1200.0,
            score_max: 1800.0,
        }
    }
}

impl FeatureBounds {
    fn unit(value: f64, lo: f64, hi: f64) -> f64 {
        if hi <= lo {
            return 0.5;
        }
        ((value - lo) / (hi - lo)).clamp(0.0, 1.0)
    }

    /// Map a raw example onto the [0, 1] feature vector.
    pub fn normalize(&self, e: &RaceExample) -> [f64; FEATURE_COUNT] {
        [
            Self::unit(e.driver_rating, self.rating_min, self.rating_max),
            Self::unit(e.team_rating, self.rating_min, self.rating_max),
            e.track_affinity.clamp(0.0, 1.0),
            // Pole position is the strongest signal: invert the slot.
            1.0 - Self::unit(e.grid_position, 1.0, self.grid_max),
            Self::unit(e.weather_skill, self.skill_min, self.skill_max),
            Self::unit(e.tire_management, self.skill_min, self.skill_max),
            Self::unit(e.form_momentum, self.form_min, self.form_max),
            Self::unit(e.rating_score, self.score_min, self.score_max),
        ]
    }
}

/// One observed race result for one driver, in raw (unnormalized) units.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RaceExample {
    pub driver_rating: f64,
    pub team_rating: f64,
    pub track_affinity: f64,
    pub grid_position: f64,
    pub weather_skill: f64,
    pub tire_management: f64,
    pub form_momentum: f64,
    pub rating_score: f64,
    /// Normalized finishing result: 1.0 = win, 0.0 = last place.
    pub target: f64,
}

/// Learned-weights accessor result.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum WeightStatus {
    /// Enough data: driver/car/track importance ratios, normalized to sum 1.
    Learned(PaceWeights),
    /// Not enough examples yet; callers keep the default split.
    InsufficientData { have: usize, need: usize },
}

#[derive(Debug, Clone)]
struct TrainingRow {
    features: [f64; FEATURE_COUNT],
    target: f64,
}

/// Season-scoped online regression state.
#[derive(Debug, Clone)]
pub struct PaceRegression {
    bounds: FeatureBounds,
    weights: [f64; FEATURE_COUNT],
    bias: f64,
    window: VecDeque<TrainingRow>,
    shuffle_seed: u64,
}

impl Default for PaceRegression {
    fn default() -> Self {
        Self::new()
    }
}

impl PaceRegression {
    pub fn new() -> Self {
        Self::with_bounds(FeatureBounds::default())
    }

    pub fn with_bounds(bounds: FeatureBounds) -> Self {
        Self {
            bounds,
            weights: [0.0; FEATURE_COUNT],
            bias: 0.0,
            window: VecDeque::new(),
            shuffle_seed: 0x6c61_7073, // stable: epoch shuffles must reproduce
        }
    }

    pub fn example_count(&self) -> usize {
        self.window.len()
    }

    /// Record one race result and retrain on the rolling window.
    pub fn record_result(&mut self, example: &RaceExample) {
        let row = TrainingRow {
            features: self.bounds.normalize(example),
            target: example.target.clamp(0.0, 1.0),
        };
        self.window.push_back(row);
        while self.window.len() > MAX_WINDOW {
            self.window.pop_front();
        }
        self.retrain();
    }

    /// Full retrain from zero weights over the current window.
    ///
    /// The epoch shuffles are seeded from (learner seed, window length), so
    /// the same sequence of recorded results always reproduces the same
    /// weights.
    fn retrain(&mut self) {
        self.weights = [0.0; FEATURE_COUNT];
        self.bias = 0.0;
        if self.window.is_empty() {
            return;
        }

        let rows: Vec<&TrainingRow> = self.window.iter().collect();
        let mut order: Vec<usize> = (0..rows.len()).collect();
        let mut rng = ChaCha8Rng::seed_from_u64(self.shuffle_seed ^ rows.len() as u64);

        for _ in 0..EPOCHS {
            order.shuffle(&mut rng);
            for &i in &order {
                let row = rows[i];
                let prediction = self.linear(&row.features);
                let error = prediction - row.target;
                for k in 0..FEATURE_COUNT {
                    self.weights[k] -=
                        LEARNING_RATE * (error * row.features[k] + L2_PENALTY * self.weights[k]);
                }
                self.bias -= LEARNING_RATE * error;
            }
        }
    }

    fn linear(&self, features: &[f64; FEATURE_COUNT]) -> f64 {
        let mut sum = self.bias;
        for k in 0..FEATURE_COUNT {
            sum += self.weights[k] * features[k];
        }
        sum
    }

    /// Predicted finishing result for a raw example, clamped to [0, 1].
    pub fn predict(&self, example: &RaceExample) -> f64 {
        self.linear(&self.bounds.normalize(example)).clamp(0.0, 1.0)
    }

    /// Mean squared error over the training window; `None` when empty.
    pub fn training_mse(&self) -> Option<f64> {
        if self.window.is_empty() {
            return None;
        }
        let sum: f64 = self
            .window
            .iter()
            .map(|row| {
                let err = self.linear(&row.features).clamp(0.0, 1.0) - row.target;
                err * err
            })
            .sum();
        Some(sum / self.window.len() as f64)
    }

    /// Driver/car/track importance ratios from the learned weights.
    ///
    /// Derived from the magnitudes of the driver-rating, team-rating, and
    /// track-affinity weights; the remaining features refine prediction but
    /// do not enter the split. Below `MIN_EXAMPLES` the status is explicit
    /// rather than a fabricated split.
    pub fn learned_weights(&self) -> WeightStatus {
        if self.window.len() < MIN_EXAMPLES {
            return WeightStatus::InsufficientData {
                have: self.window.len(),
                need: MIN_EXAMPLES,
            };
        }
        let driver = self.weights[0].abs();
        let car = self.weights[1].abs();
        let track = self.weights[2].abs();
        // PaceWeights::new normalizes to unit sum and falls back to the
        // default split on a degenerate (all-zero) vector.
        WeightStatus::Learned(PaceWeights::new(driver, car, track))
    }
}
