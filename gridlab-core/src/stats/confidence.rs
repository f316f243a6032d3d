//! Confidence bands and interval estimates over validated batch output.

use serde::{Deserialize, Serialize};

use super::validator::{validate_distribution, DistributionStats};

/// z-score for the 95% normal-approximation interval.
const Z_95: f64 = 1.96;

/// Divisor in the heuristic confidence score: a 20-second spread maps to
/// zero confidence.
const CONFIDENCE_SPREAD_DIVISOR: f64 = 20.0;

/// A symmetric interval around the mean.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Band {
    pub lower: f64,
    pub upper: f64,
}

impl Band {
    pub fn width(&self) -> f64 {
        self.upper - self.lower
    }

    pub fn contains(&self, other: &Band) -> bool {
        self.lower <= other.lower && self.upper >= other.upper
    }
}

/// Confidence summary for a batch result sample.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BandReport {
    pub stats: DistributionStats,
    pub std_dev: f64,
    /// `sqrt(variance) / sqrt(n)`.
    pub standard_error: f64,
    /// Heuristic in [0, 1]: `max(0, 1 - stddev / 20)`.
    pub confidence_score: f64,
    /// Mean ± 1σ.
    pub band_68: Band,
    /// Mean ± 2σ.
    pub band_95: Band,
    /// Mean ± 3σ.
    pub band_99: Band,
}

/// Derive confidence bands from a result sample, or `None` when the sample
/// is empty.
pub fn confidence_bands(values: &[f64]) -> Option<BandReport> {
    let stats = validate_distribution(values)?;
    let std_dev = stats.variance.sqrt();
    let standard_error = std_dev / (stats.sample_size as f64).sqrt();
    let confidence_score = (1.0 - std_dev / CONFIDENCE_SPREAD_DIVISOR).max(0.0);

    let band = |k: f64| Band {
        lower: stats.mean - k * std_dev,
        upper: stats.mean + k * std_dev,
    };

    Some(BandReport {
        stats,
        std_dev,
        standard_error,
        confidence_score,
        band_68: band(1.0),
        band_95: band(2.0),
        band_99: band(3.0),
    })
}

/// Normal-approximation confidence interval for an observed win rate:
/// `p ± 1.96 * sqrt(p(1-p)/n)`, clamped to [0, 1].
///
/// Returns `None` when no trials were run.
pub fn win_probability_interval(p: f64, trials: u32) -> Option<Band> {
    if trials == 0 {
        return None;
    }
    let p = p.clamp(0.0, 1.0);
    let half_width = Z_95 * (p * (1.0 - p) / trials as f64).sqrt();
    Some(Band {
        lower: (p - half_width).max(0.0),
        upper: (p + half_width).min(1.0),
    })
}
