//! Adaptive calibration engines.
//!
//! Two learners adjust the pace model from observed reality:
//! - the Bayesian lap-delta learner turns lap-time errors into bounded
//!   per-team pace adjustments;
//! - the online regression learner turns race results into a learned
//!   driver/car/track weight split.
//!
//! Both live inside an owned, season-scoped `CalibrationSession` rather
//! than ambient globals; batches receive its state as an immutable
//! snapshot.

pub mod lap_delta;
pub mod regression;
pub mod session;

pub use lap_delta::{LapDeltaLearner, ADJUSTMENT_CEILING, PRIOR_PSEUDO_COUNT};
pub use regression::{
    FeatureBounds, PaceRegression, RaceExample, WeightStatus, FEATURE_COUNT, FEATURE_NAMES,
    MAX_WINDOW, MIN_EXAMPLES,
};
pub use session::{CalibrationSession, ResultEntry};
