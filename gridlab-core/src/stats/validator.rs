//! Distribution integrity validation.
//!
//! Computes the first four moments of a trial-result sample and flags
//! distributions too skewed or heavy-tailed to trust. An empty sample
//! yields no statistics at all — never a fabricated zero.

use serde::{Deserialize, Serialize};

/// A batch is flagged unstable beyond this absolute skewness.
pub const SKEWNESS_LIMIT: f64 = 1.5;

/// A batch is flagged unstable beyond this excess kurtosis.
pub const KURTOSIS_LIMIT: f64 = 4.0;

/// Variance below this is treated as degenerate (all values equal).
const DEGENERATE_VARIANCE: f64 = 1e-18;

/// Read-only moment summary of a completed result sample.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DistributionStats {
    pub mean: f64,
    /// Population variance (divides by n).
    pub variance: f64,
    pub skewness: f64,
    /// Excess kurtosis (normal = 0).
    pub kurtosis: f64,
    /// False when the sample is too skewed or heavy-tailed to trust.
    pub stable: bool,
    pub sample_size: usize,
}

/// Compute distribution statistics, or `None` for an empty sample.
///
/// Degenerate samples (all values identical) report zero variance with
/// zero skewness/kurtosis and count as stable.
pub fn validate_distribution(values: &[f64]) -> Option<DistributionStats> {
    if values.is_empty() {
        return None;
    }

    let n = values.len() as f64;
    let mean = values.iter().sum::<f64>() / n;

    let mut m2 = 0.0;
    let mut m3 = 0.0;
    let mut m4 = 0.0;
    for &v in values {
        let d = v - mean;
        let d2 = d * d;
        m2 += d2;
        m3 += d2 * d;
        m4 += d2 * d2;
    }
    let variance = m2 / n;

    let (skewness, kurtosis) = if variance <= DEGENERATE_VARIANCE {
        (0.0, 0.0)
    } else {
        let std = variance.sqrt();
        let skew = (m3 / n) / std.powi(3);
        let kurt = (m4 / n) / variance.powi(2) - 3.0;
        (skew, kurt)
    };

    let stable = skewness.abs() <= SKEWNESS_LIMIT && kurtosis <= KURTOSIS_LIMIT;

    Some(DistributionStats {
        mean,
        variance,
        skewness,
        kurtosis,
        stable,
        sample_size: values.len(),
    })
}
