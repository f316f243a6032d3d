//! GridLab Runner — orchestration around the simulation core.
//!
//! This crate builds on `gridlab-core` to provide:
//! - The season-scoped calibration session (Bayesian lap-delta learner and
//!   online regression pace-weight learner)
//! - The background simulation worker (one request in, one response out)
//! - The lap-refresh debounce gate
//! - TOML run configuration with content fingerprinting
//! - CSV/JSON result export and the JSONL prediction history

pub mod calibration;
pub mod config;
pub mod export;
pub mod history;
pub mod scheduler;
pub mod worker;

pub use calibration::{
    CalibrationSession, FeatureBounds, LapDeltaLearner, PaceRegression, RaceExample, ResultEntry,
    WeightStatus,
};
pub use config::{ConfigError, SimConfig};
pub use export::{to_json_string, write_csv, write_json, ExportError};
pub use history::{DriverSummary, PredictionHistory, PredictionRecord};
pub use scheduler::RefreshGate;
pub use worker::{spawn_worker, BatchRequest, SimCommand, SimResponse};
