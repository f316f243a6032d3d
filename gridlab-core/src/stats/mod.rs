//! Statistical integrity validation and confidence estimation.

pub mod confidence;
pub mod validator;

pub use confidence::{confidence_bands, win_probability_interval, Band, BandReport};
pub use validator::{validate_distribution, DistributionStats};
