//! GridLab Core — the stochastic race outcome simulation engine.
//!
//! This crate contains the heart of the prediction system:
//! - Domain types (drivers, teams, race context, identifiers)
//! - Deterministic RNG with BLAKE3 seed derivation
//! - Stateless physical sub-models (tire, fuel, aero/overtaking, weather,
//!   reliability)
//! - Pace composition under an injected weight split
//! - The single-race trial simulator and the Monte Carlo batch aggregator
//! - Distribution validation and confidence bands
//!
//! Everything here is pure computation over passed-in parameters: no I/O,
//! no ambient state, no trial ever observing another trial's outcome.

pub mod domain;
pub mod models;
pub mod rng;
pub mod sim;
pub mod stats;
