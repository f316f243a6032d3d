//! Race trial simulator and Monte Carlo batch aggregation.

pub mod batch;
pub mod trial;

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::domain::TeamId;
use crate::models::PaceWeights;

pub use batch::{simulate_batch, AggregateStats, BatchError, DriverStats, ScenarioCounts};
pub use trial::{run_trial, TrialError, TrialOutcome, DNF_TIME};

/// Calibration state handed to a batch: explicit dependency injection
/// instead of the simulator reaching for ambient learner state.
///
/// The owning calibration session produces one snapshot per batch; the
/// snapshot is immutable for the batch's lifetime.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CalibrationSnapshot {
    /// Bounded per-team pace adjustments (±3%).
    pub team_adjustments: HashMap<TeamId, f64>,
    /// Learned weight split, or `None` to use the default.
    pub pace_weights: Option<PaceWeights>,
}

impl CalibrationSnapshot {
    pub fn new(team_adjustments: HashMap<TeamId, f64>, pace_weights: Option<PaceWeights>) -> Self {
        Self {
            team_adjustments,
            pace_weights,
        }
    }
}
